//! Statement builders for the four statement kinds.
//!
//! Builders are inert values: each chained call consumes the builder and
//! returns a new one with the clause's tokens appended, and nothing touches
//! the database until a terminal `execute`/`fetch_*` call renders the token
//! tree and hands it to the backend. Grammar order is enforced by shape
//! where possible (`select(...)` only continues with `.from(...)`, `update`
//! only continues with `.set(...)`); everything else that would produce
//! malformed SQL is recorded as a build error and surfaces at the terminal
//! call instead of reaching the server.

mod delete;
mod insert;
mod patch;
mod select;
mod update;

pub use delete::Delete;
pub use insert::Insert;
pub use patch::{Patch, SetValue};
pub use select::{Order, Projection, Select};
pub use update::{Update, UpdateSeed};

use crate::column::Column;
use crate::token::Token;

/// One projection or RETURNING item. Aliases the physical name to the
/// logical name whenever the two differ (or the name is qualified), so
/// result rows are always keyed by logical names.
pub(crate) fn projection_item(column: &Column, qualify: bool) -> Token {
    let name = if qualify {
        column.qualified_name()
    } else {
        column.physical_name().to_string()
    };
    if qualify || column.logical_name() != column.physical_name() {
        Token::group(vec![
            Token::literal(name),
            Token::literal("AS"),
            Token::literal(format!("\"{}\"", column.logical_name())),
        ])
    } else {
        Token::literal(name)
    }
}

/// `RETURNING a,b,c` clause tokens.
pub(crate) fn returning_clause(columns: &[&Column]) -> Token {
    let items = columns.iter().map(|c| projection_item(c, false)).collect();
    Token::group(vec![
        Token::literal("RETURNING"),
        Token::separated(",", items),
    ])
}

#[cfg(test)]
mod tests;
