//! Boolean predicate trees rendered into parameterized WHERE clauses.
//!
//! Rendering threads a running placeholder index through the tree left to
//! right, so the Nth parameter always matches the Nth placeholder in the text.

use std::fmt;

use crate::dialect::Dialect;
use crate::error::SqlResult;
use crate::ident::validate_identifier;

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Equal,
    LessThan,
    GreaterThan,
    /// Regular-expression match.
    Pattern,
    /// Wildcard match (`LIKE`).
    Substring,
}

impl CompareOp {
    /// Token inserted verbatim between column reference and placeholder.
    pub fn token(&self) -> &'static str {
        match self {
            CompareOp::Equal => "=",
            CompareOp::LessThan => "<",
            CompareOp::GreaterThan => ">",
            CompareOp::Pattern => " REGEXP ",
            CompareOp::Substring => " LIKE ",
        }
    }
}

/// Logical operators joining the children of a composite node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    fn joiner(&self) -> &'static str {
        match self {
            LogicalOp::And => " AND ",
            LogicalOp::Or => " OR ",
        }
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOp::And => write!(f, "AND"),
            LogicalOp::Or => write!(f, "OR"),
        }
    }
}

/// A column, optionally qualified by its table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub column: String,
}

impl ColumnRef {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            table: None,
            column: column.into(),
        }
    }

    pub fn qualified(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            column: column.into(),
        }
    }

    /// Validated `[table.]column` text.
    fn to_sql(&self) -> SqlResult<String> {
        let column = validate_identifier(&self.column)?;
        match &self.table {
            Some(table) => Ok(format!("{}.{}", validate_identifier(table)?, column)),
            None => Ok(column.to_string()),
        }
    }
}

impl From<&str> for ColumnRef {
    fn from(column: &str) -> Self {
        ColumnRef::new(column)
    }
}

impl From<String> for ColumnRef {
    fn from(column: String) -> Self {
        ColumnRef::new(column)
    }
}

impl From<(&str, &str)> for ColumnRef {
    fn from((table, column): (&str, &str)) -> Self {
        ColumnRef::qualified(table, column)
    }
}

/// A node in a predicate tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `[table.]column <op> <placeholder>` with one parameter.
    Comparison {
        column: ColumnRef,
        op: CompareOp,
        value: String,
    },
    /// `lt.lc=rt.rc`, used for joins. Carries no parameters.
    ColumnEquality {
        left_table: String,
        left_column: String,
        right_table: String,
        right_column: String,
    },
    /// Children joined by AND / OR.
    Composite {
        op: LogicalOp,
        children: Vec<Predicate>,
    },
}

/// Output of [`Predicate::render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub sql: String,
    pub params: Vec<String>,
    /// Placeholder index the next sibling should start from.
    pub next_index: i64,
}

impl Predicate {
    pub fn eq(column: impl Into<ColumnRef>, value: impl Into<String>) -> Self {
        Predicate::Comparison {
            column: column.into(),
            op: CompareOp::Equal,
            value: value.into(),
        }
    }

    /// Numeric values are carried with two decimal places.
    pub fn less_than(column: impl Into<ColumnRef>, value: f64) -> Self {
        Predicate::Comparison {
            column: column.into(),
            op: CompareOp::LessThan,
            value: format!("{:.2}", value),
        }
    }

    pub fn greater_than(column: impl Into<ColumnRef>, value: f64) -> Self {
        Predicate::Comparison {
            column: column.into(),
            op: CompareOp::GreaterThan,
            value: format!("{:.2}", value),
        }
    }

    pub fn regex(column: impl Into<ColumnRef>, pattern: impl Into<String>) -> Self {
        Predicate::Comparison {
            column: column.into(),
            op: CompareOp::Pattern,
            value: pattern.into(),
        }
    }

    pub fn substring(column: impl Into<ColumnRef>, substr: impl Into<String>) -> Self {
        Predicate::Comparison {
            column: column.into(),
            op: CompareOp::Substring,
            value: substr.into(),
        }
    }

    pub fn columns_equal(left: (&str, &str), right: (&str, &str)) -> Self {
        Predicate::ColumnEquality {
            left_table: left.0.to_string(),
            left_column: left.1.to_string(),
            right_table: right.0.to_string(),
            right_column: right.1.to_string(),
        }
    }

    pub fn and(children: impl IntoIterator<Item = Predicate>) -> Self {
        Predicate::Composite {
            op: LogicalOp::And,
            children: children.into_iter().collect(),
        }
    }

    pub fn or(children: impl IntoIterator<Item = Predicate>) -> Self {
        Predicate::Composite {
            op: LogicalOp::Or,
            children: children.into_iter().collect(),
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, Predicate::Composite { .. })
    }

    /// Render this subtree for `dialect`, numbering placeholders from `start_index`.
    ///
    /// Any invalid identifier aborts the whole render.
    pub fn render(&self, dialect: Dialect, start_index: i64) -> SqlResult<Clause> {
        match self {
            Predicate::Comparison { column, op, value } => {
                let column = column.to_sql()?;
                let placeholder = dialect.placeholder(start_index)?;
                Ok(Clause {
                    sql: format!("{}{}{}", column, op.token(), placeholder),
                    params: vec![value.clone()],
                    next_index: start_index + 1,
                })
            }
            Predicate::ColumnEquality {
                left_table,
                left_column,
                right_table,
                right_column,
            } => Ok(Clause {
                sql: format!(
                    "{}.{}={}.{}",
                    validate_identifier(left_table)?,
                    validate_identifier(left_column)?,
                    validate_identifier(right_table)?,
                    validate_identifier(right_column)?,
                ),
                params: Vec::new(),
                next_index: start_index,
            }),
            Predicate::Composite { op, children } => {
                let mut parts = Vec::with_capacity(children.len());
                let mut params = Vec::new();
                let mut index = start_index;

                for child in children {
                    let clause = child.render(dialect, index)?;
                    index = clause.next_index;
                    // Only nested composites are parenthesized.
                    if child.is_composite() {
                        parts.push(format!("({})", clause.sql));
                    } else {
                        parts.push(clause.sql);
                    }
                    params.extend(clause.params);
                }

                Ok(Clause {
                    sql: parts.join(op.joiner()),
                    params,
                    next_index: index,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SqlError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_simple_comparison() {
        let clause = Predicate::eq("id", "5").render(Dialect::Postgres, 1).unwrap();
        assert_eq!(clause.sql, "id=$1");
        assert_eq!(clause.params, vec!["5"]);
        assert_eq!(clause.next_index, 2);
    }

    #[test]
    fn test_qualified_comparison() {
        let clause = Predicate::eq(("books", "id"), "7")
            .render(Dialect::SqlServer, 4)
            .unwrap();
        assert_eq!(clause.sql, "books.id=@p4");
        assert_eq!(clause.next_index, 5);
    }

    #[test]
    fn test_numeric_values_two_decimals() {
        let lt = Predicate::less_than("price", 123.345)
            .render(Dialect::MySql, 1)
            .unwrap();
        assert_eq!(lt.sql, "price<?");
        assert_eq!(lt.params, vec!["123.34"]);

        let gt = Predicate::greater_than("age", 145.0)
            .render(Dialect::Sqlite, 1)
            .unwrap();
        assert_eq!(gt.sql, "age>?");
        assert_eq!(gt.params, vec!["145.00"]);
    }

    #[test]
    fn test_keyword_operators() {
        let like = Predicate::substring("name", "%ann%")
            .render(Dialect::Postgres, 1)
            .unwrap();
        assert_eq!(like.sql, "name LIKE $1");
        assert_eq!(like.params, vec!["%ann%"]);

        let re = Predicate::regex("code", "^A[0-9]+$")
            .render(Dialect::MySql, 1)
            .unwrap();
        assert_eq!(re.sql, "code REGEXP ?");
    }

    #[test]
    fn test_column_equality_has_no_params() {
        let clause = Predicate::columns_equal(("orders", "userid"), ("users", "id"))
            .render(Dialect::Postgres, 3)
            .unwrap();
        assert_eq!(clause.sql, "orders.userid=users.id");
        assert!(clause.params.is_empty());
        assert_eq!(clause.next_index, 3);
    }

    #[test]
    fn test_and_threads_indices() {
        let clause = Predicate::and([Predicate::eq("a", "1"), Predicate::eq("b", "2")])
            .render(Dialect::Postgres, 1)
            .unwrap();
        assert_eq!(clause.sql, "a=$1 AND b=$2");
        assert_eq!(clause.params, vec!["1", "2"]);
        assert_eq!(clause.next_index, 3);
    }

    #[test]
    fn test_nested_tree() {
        let tree = Predicate::or([
            Predicate::eq("id", "1659"),
            Predicate::columns_equal(("joe", "id"), ("books", "id")),
            Predicate::and([
                Predicate::eq(("book", "idb"), "1234"),
                Predicate::or([
                    Predicate::less_than("joe", 123.345),
                    Predicate::greater_than("kate", 145.0),
                ]),
                Predicate::eq(("bookid", "abc"), "123456"),
            ]),
        ]);

        let clause = tree.render(Dialect::Postgres, 1).unwrap();
        assert_eq!(
            clause.sql,
            "id=$1 OR joe.id=books.id OR (book.idb=$2 AND (joe<$3 OR kate>$4) AND bookid.abc=$5)"
        );
        assert_eq!(
            clause.params,
            vec!["1659", "1234", "123.34", "145.00", "123456"]
        );
        assert_eq!(clause.next_index, 6);

        let sqlite = tree.render(Dialect::Sqlite, 1).unwrap();
        assert_eq!(
            sqlite.sql,
            "id=? OR joe.id=books.id OR (book.idb=? AND (joe<? OR kate>?) AND bookid.abc=?)"
        );
        assert_eq!(sqlite.params, clause.params);
    }

    #[test]
    fn test_sibling_after_column_equality_keeps_index() {
        let clause = Predicate::and([
            Predicate::columns_equal(("a", "x"), ("b", "y")),
            Predicate::eq("z", "1"),
        ])
        .render(Dialect::SqlServer, 1)
        .unwrap();
        assert_eq!(clause.sql, "a.x=b.y AND z=@p1");
    }

    #[test]
    fn test_invalid_identifier_anywhere_aborts() {
        let tree = Predicate::and([
            Predicate::eq("ok", "1"),
            Predicate::or([
                Predicate::eq("fine", "2"),
                Predicate::eq("bad;col", "3"),
            ]),
        ]);
        let err = tree.render(Dialect::Postgres, 1).unwrap_err();
        assert!(matches!(
            err,
            SqlError::IdentifierValidation { ref token } if token == "bad;col"
        ));

        let bad_table = Predicate::eq(("drop table", "id"), "1");
        assert!(bad_table.render(Dialect::MySql, 1).is_err());

        let bad_join = Predicate::columns_equal(("a", "x"), ("b", "y'"));
        assert!(bad_join.render(Dialect::MySql, 1).is_err());
    }

    #[test]
    fn test_invalid_start_index() {
        let err = Predicate::eq("id", "1")
            .render(Dialect::Postgres, 0)
            .unwrap_err();
        assert!(matches!(err, SqlError::InvalidPlaceholderIndex { .. }));
        assert!(Predicate::eq("id", "1").render(Dialect::MySql, 0).is_ok());
    }

    #[test]
    fn test_empty_composite() {
        let clause = Predicate::and([]).render(Dialect::Postgres, 1).unwrap();
        assert_eq!(clause.sql, "");
        assert!(clause.params.is_empty());
        assert_eq!(clause.next_index, 1);
    }
}
