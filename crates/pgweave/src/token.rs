//! SQL token tree: the intermediate representation every statement renders from.
//!
//! A statement is assembled as a tree of [`Token`]s and rendered in a single
//! depth-first, left-to-right traversal. Placeholder indices (`$1`, `$2`, ...)
//! are assigned *during that final traversal*, never when a sub-tree is built,
//! so a tree with parameters can be spliced into a larger tree (a sub-select,
//! an expression value in a SET clause) and its placeholders come out
//! renumbered after the parent's.

use std::fmt::Write as _;
use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// A clone-friendly parameter wrapper using Arc.
///
/// Token trees are cloned freely while composing builders; wrapping values in
/// `Arc` keeps that cheap and keeps them usable as `ToSql` references at
/// execution time.
#[derive(Clone)]
pub struct Param(pub(crate) Arc<dyn ToSql + Send + Sync>);

impl Param {
    /// Create a new parameter from any ToSql value.
    pub fn new<T: ToSql + Send + Sync + 'static>(value: T) -> Self {
        Param(Arc::new(value))
    }

    /// Get a reference to the inner value as a ToSql trait object.
    pub fn as_ref(&self) -> &(dyn ToSql + Sync) {
        &*self.0 as &(dyn ToSql + Sync)
    }
}

impl std::fmt::Debug for Param {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Param").field(&"<dyn ToSql>").finish()
    }
}

/// An ordered parameter list; `push` returns the 1-based placeholder index.
#[derive(Clone, Debug, Default)]
pub struct ParamList {
    params: Vec<Param>,
}

impl ParamList {
    /// Create a new empty parameter list.
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Add a parameter and return its 1-based index.
    pub fn push<T: ToSql + Send + Sync + 'static>(&mut self, value: T) -> usize {
        self.params.push(Param::new(value));
        self.params.len()
    }

    /// Add a pre-wrapped Param and return its 1-based index.
    pub fn push_param(&mut self, param: Param) -> usize {
        self.params.push(param);
        self.params.len()
    }

    /// Get the current parameter count.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Get all parameters as references for tokio-postgres.
    pub fn as_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(|p| p.as_ref()).collect()
    }

    /// Extend this list with another list's parameters.
    pub fn extend(&mut self, other: &ParamList) {
        self.params.extend(other.params.iter().cloned());
    }
}

/// A node in the SQL intermediate representation.
#[derive(Clone, Debug)]
pub enum Token {
    /// An opaque SQL fragment with no parameters.
    Literal(String),

    /// A runtime value bound as a positional placeholder. The index is
    /// resolved only during the top-level render traversal.
    Parameter(Param),

    /// Children rendered joined by `separator`.
    Separated {
        separator: String,
        children: Vec<Token>,
    },

    /// Children rendered joined by a single space.
    Group(Vec<Token>),
}

impl Token {
    /// Create a literal token.
    pub fn literal(text: impl Into<String>) -> Self {
        Token::Literal(text.into())
    }

    /// Create a parameter token from a value.
    pub fn parameter<T: ToSql + Send + Sync + 'static>(value: T) -> Self {
        Token::Parameter(Param::new(value))
    }

    /// Create a parameter token from a pre-wrapped Param.
    pub fn param(param: Param) -> Self {
        Token::Parameter(param)
    }

    /// Create a separator-joined token.
    pub fn separated(separator: impl Into<String>, children: Vec<Token>) -> Self {
        Token::Separated {
            separator: separator.into(),
            children,
        }
    }

    /// Create a space-joined token.
    pub fn group(children: Vec<Token>) -> Self {
        Token::Group(children)
    }

    /// Wrap `children` in parentheses with no inner padding: `(...)`.
    ///
    /// Used for sub-selects, IN lists, and VALUES tuples.
    pub fn parenthesized(children: Vec<Token>) -> Self {
        Token::separated(
            "",
            vec![
                Token::literal("("),
                Token::group(children),
                Token::literal(")"),
            ],
        )
    }

    /// Append this node's text to `out`, assigning placeholder indices from
    /// `params` as `Parameter` nodes are encountered.
    fn write(&self, out: &mut String, params: &mut ParamList) {
        match self {
            Token::Literal(text) => out.push_str(text),
            Token::Parameter(value) => {
                let idx = params.push_param(value.clone());
                let _ = write!(out, "${idx}");
            }
            Token::Separated {
                separator,
                children,
            } => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        out.push_str(separator);
                    }
                    child.write(out, params);
                }
            }
            Token::Group(children) => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        out.push(' ');
                    }
                    child.write(out, params);
                }
            }
        }
    }

    /// Render this tree to SQL text plus its ordered parameter list.
    pub fn render(&self) -> Rendered {
        render_statement(std::slice::from_ref(self))
    }
}

/// Render a clause sequence as a statement: clauses joined by single spaces,
/// placeholders numbered across the whole sequence in traversal order.
pub fn render_statement(tokens: &[Token]) -> Rendered {
    let mut sql = String::new();
    let mut params = ParamList::new();
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 {
            sql.push(' ');
        }
        token.write(&mut sql, &mut params);
    }
    Rendered { sql, params }
}

/// The output of rendering a token tree.
#[derive(Clone, Debug)]
pub struct Rendered {
    pub sql: String,
    pub params: ParamList,
}

/// Anything that exposes its own token tree and can be spliced into a larger
/// statement: columns, expressions, whole sub-selects.
pub trait ToTokens {
    fn to_tokens(&self) -> Vec<Token>;
}

impl ToTokens for Token {
    fn to_tokens(&self) -> Vec<Token> {
        vec![self.clone()]
    }
}

impl<T: ToTokens + ?Sized> ToTokens for &T {
    fn to_tokens(&self) -> Vec<Token> {
        (*self).to_tokens()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_renders_verbatim() {
        let rendered = Token::literal("SELECT 1").render();
        assert_eq!(rendered.sql, "SELECT 1");
        assert!(rendered.params.is_empty());
    }

    #[test]
    fn test_parameters_number_in_traversal_order() {
        let tree = Token::group(vec![
            Token::literal("a ="),
            Token::parameter(1i32),
            Token::literal("AND b ="),
            Token::parameter(2i32),
        ]);
        let rendered = tree.render();
        assert_eq!(rendered.sql, "a = $1 AND b = $2");
        assert_eq!(rendered.params.len(), 2);
    }

    #[test]
    fn test_separated_joins_children() {
        let tree = Token::separated(
            ",",
            vec![
                Token::literal("id"),
                Token::literal("name"),
                Token::literal("email"),
            ],
        );
        assert_eq!(tree.render().sql, "id,name,email");
    }

    #[test]
    fn test_parenthesized_has_no_inner_padding() {
        let tree = Token::parenthesized(vec![Token::separated(
            ", ",
            vec![Token::parameter(1i32), Token::parameter(2i32)],
        )]);
        assert_eq!(tree.render().sql, "($1, $2)");
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let tree = Token::group(vec![
            Token::literal("x IN"),
            Token::parenthesized(vec![Token::separated(
                ", ",
                vec![Token::parameter("a"), Token::parameter("b")],
            )]),
        ]);
        let first = tree.render();
        let second = tree.render();
        assert_eq!(first.sql, second.sql);
        assert_eq!(first.params.len(), second.params.len());
    }

    #[test]
    fn test_spliced_subtree_is_renumbered() {
        // A sub-tree with its own parameters...
        let sub = Token::group(vec![Token::literal("y ="), Token::parameter(10i32)]);
        // ...spliced into a parent that already binds two parameters.
        let parent = Token::group(vec![
            Token::literal("a ="),
            Token::parameter(1i32),
            Token::literal("AND b ="),
            Token::parameter(2i32),
            Token::literal("AND"),
            sub,
        ]);
        let rendered = parent.render();
        assert_eq!(rendered.sql, "a = $1 AND b = $2 AND y = $3");
        assert_eq!(rendered.params.len(), 3);
    }

    #[test]
    fn test_render_statement_numbers_across_clauses() {
        let clauses = vec![
            Token::group(vec![Token::literal("SET name ="), Token::parameter("Ann")]),
            Token::group(vec![Token::literal("WHERE id ="), Token::parameter(7i64)]),
        ];
        let rendered = render_statement(&clauses);
        assert_eq!(rendered.sql, "SET name = $1 WHERE id = $2");
        assert_eq!(rendered.params.len(), 2);
    }
}
