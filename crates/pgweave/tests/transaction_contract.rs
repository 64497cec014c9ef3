//! Compile-level checks for the transaction surface, plus live contract
//! tests that only run when DATABASE_URL is set.

#![allow(dead_code)]

use pgweave::{ColumnDef, Database, DbError, DbResult, FromRow, Patch, RowExt, Schema, TableDef};

#[derive(Debug)]
struct Account {
    owner: String,
    balance: i64,
}

impl FromRow for Account {
    fn from_row(row: &tokio_postgres::Row) -> DbResult<Self> {
        Ok(Self {
            owner: row.try_get_column("owner")?,
            balance: row.try_get_column("balance")?,
        })
    }
}

fn accounts_schema() -> Schema {
    Schema::new().table(
        "pgweave_tx_accounts",
        TableDef::new()
            .column("id", ColumnDef::new("id").read_only())
            .column("owner", ColumnDef::new("owner"))
            .column("balance", ColumnDef::new("balance")),
    )
}

async fn _transaction_scoped_builders_compile(db: &Database<'_>) -> DbResult<u64> {
    db.transaction(|tx| {
        Box::pin(async move {
            let accounts = tx.table("pgweave_tx_accounts")?;
            let id = accounts.column("id")?.clone();
            let balance = accounts.column("balance")?.clone();
            tx.update(&accounts)
                .set(Patch::new().set_expr("balance", balance.minus(100i64)))
                .where_(id.eq(1i64))
                .execute()
                .await
        })
    })
    .await
}

async fn _transaction_result_type_is_callers(db: &Database<'_>) -> DbResult<String> {
    db.transaction(|tx| {
        Box::pin(async move {
            let row = tx.raw("SELECT owner FROM pgweave_tx_accounts LIMIT 1").fetch_one().await?;
            Ok(row.get::<_, String>(0))
        })
    })
    .await
}

#[tokio::test]
async fn transaction_commits_and_returns_the_callback_result() {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        return;
    };
    let db = Database::connect(url, accounts_schema()).unwrap();

    let value = db
        .transaction(|tx| {
            Box::pin(async move {
                let row = tx.raw("SELECT 21 * 2").fetch_one().await?;
                Ok(row.get::<_, i32>(0))
            })
        })
        .await
        .unwrap();
    assert_eq!(value, 42);
    db.destroy().unwrap();
}

#[tokio::test]
async fn transaction_rolls_back_and_releases_the_connection() {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        return;
    };
    let db = Database::connect(url, accounts_schema()).unwrap();

    db.execute_raw("DROP TABLE IF EXISTS pgweave_tx_accounts", &[])
        .await
        .unwrap();
    db.execute_raw(
        "CREATE TABLE pgweave_tx_accounts \
         (id BIGSERIAL PRIMARY KEY, owner TEXT NOT NULL, balance BIGINT NOT NULL)",
        &[],
    )
    .await
    .unwrap();

    let accounts = db.table("pgweave_tx_accounts").unwrap();
    db.insert_into(&accounts)
        .values(Patch::new().set("owner", "ann").set("balance", 500i64))
        .execute()
        .await
        .unwrap();

    let result: DbResult<()> = db
        .transaction(|tx| {
            Box::pin(async move {
                let accounts = tx.table("pgweave_tx_accounts")?;
                let owner = accounts.column("owner")?.clone();
                tx.update(&accounts)
                    .set(Patch::new().set("balance", 0i64))
                    .where_(owner.eq("ann"))
                    .execute()
                    .await?;

                // The pinned connection refuses to nest or be destroyed.
                let nested: DbResult<()> = tx
                    .transaction(|_inner| Box::pin(async move { Ok::<(), DbError>(()) }))
                    .await;
                assert!(nested.unwrap_err().is_build());
                assert!(tx.destroy().unwrap_err().is_build());

                Err(DbError::Other("forced failure".to_string()))
            })
        })
        .await;
    assert!(result.is_err());

    // The update was rolled back: nothing outside the transaction saw it.
    let row = db
        .raw("SELECT balance FROM pgweave_tx_accounts WHERE owner = $1")
        .bind("ann")
        .fetch_one()
        .await
        .unwrap();
    assert_eq!(row.get::<_, i64>(0), 500);

    let owner = accounts.column("owner").unwrap().clone();
    let balance = accounts.column("balance").unwrap().clone();
    let all: Vec<Account> = db
        .select(&[&owner, &balance])
        .from(&accounts)
        .fetch_all_as()
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].owner, "ann");
    assert_eq!(all[0].balance, 500);

    // The pinned connection went back to the pool.
    let status = db.pool().expect("pool-backed facade").status();
    assert_eq!(status.available, status.size);

    db.execute_raw("DROP TABLE pgweave_tx_accounts", &[])
        .await
        .unwrap();
    db.destroy().unwrap();
}
