//! Statement builders.
//!
//! Builders turn a [`TableSchema`] or a column/table list plus an optional
//! [`Predicate`] into an immutable [`Statement`]. Layout (tabs, newlines,
//! terminators) is part of the output contract.

use crate::dialect::Dialect;
use crate::error::{SqlError, SqlResult};
use crate::ident::validate_identifier;
use crate::predicate::Predicate;
use crate::types::TableSchema;

/// Rendered SQL text plus its ordered parameters.
///
/// The Nth parameter binds to the Nth placeholder in the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    sql: String,
    params: Vec<String>,
}

impl Statement {
    pub(crate) fn new(sql: String, params: Vec<String>) -> Self {
        Self { sql, params }
    }

    /// A statement with no parameters, for hand-written SQL.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::new(sql.into(), Vec::new())
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }
}

/// Trait for builders that render to a [`Statement`].
pub trait ToStatement {
    fn to_statement(&self) -> SqlResult<Statement>;
}

/// `CREATE TABLE` generator.
#[derive(Debug, Clone)]
pub struct CreateTable {
    pub dialect: Dialect,
    pub schema: TableSchema,
}

impl CreateTable {
    pub fn new(dialect: Dialect, schema: TableSchema) -> Self {
        Self { dialect, schema }
    }
}

impl ToStatement for CreateTable {
    fn to_statement(&self) -> SqlResult<Statement> {
        let mut sql = String::from("CREATE TABLE ");
        sql.push_str(validate_identifier(&self.schema.name)?);
        sql.push_str(" (\n\t");

        let mut columns = Vec::with_capacity(self.schema.columns.len());
        for (name, ty) in &self.schema.columns {
            let name = validate_identifier(name)?;
            columns.push(format!("{} {}", name, ty.to_sql(self.dialect)?));
        }
        sql.push_str(&columns.join(",\n\t"));
        sql.push_str("\n);");

        Ok(Statement::new(sql, Vec::new()))
    }
}

/// `SELECT` generator.
///
/// ```
/// use sqlweave::prelude::*;
///
/// let stmt = Select::new(Dialect::Postgres)
///     .columns(["id", "title"])
///     .from(["books"])
///     .filter(Predicate::eq("id", "5"))
///     .to_statement()
///     .unwrap();
/// assert_eq!(stmt.sql(), "SELECT id, title\nFROM books\nWHERE id=$1;");
/// assert_eq!(stmt.params(), ["5"]);
/// ```
#[derive(Debug, Clone)]
pub struct Select {
    pub dialect: Dialect,
    pub columns: Vec<String>,
    pub tables: Vec<String>,
    pub filter: Option<Predicate>,
}

impl Select {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            columns: Vec::new(),
            tables: Vec::new(),
            filter: None,
        }
    }

    /// Columns to project. Empty means `*`.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn from<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tables.extend(tables.into_iter().map(Into::into));
        self
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filter = Some(predicate);
        self
    }

    fn select_clause(&self) -> SqlResult<String> {
        if self.columns.is_empty() {
            return Ok("*".to_string());
        }
        let cols = self
            .columns
            .iter()
            .map(|c| validate_identifier(c))
            .collect::<SqlResult<Vec<_>>>()?;
        Ok(cols.join(", "))
    }

    fn from_clause(&self) -> SqlResult<String> {
        if self.tables.is_empty() {
            return Err(SqlError::EmptyTableList);
        }
        let tables = self
            .tables
            .iter()
            .map(|t| validate_identifier(t))
            .collect::<SqlResult<Vec<_>>>()?;
        Ok(tables.join(", "))
    }
}

impl ToStatement for Select {
    fn to_statement(&self) -> SqlResult<Statement> {
        let mut sql = String::from("SELECT ");
        sql.push_str(&self.select_clause()?);
        sql.push_str("\nFROM ");
        sql.push_str(&self.from_clause()?);

        let Some(filter) = &self.filter else {
            return Ok(Statement::new(sql, Vec::new()));
        };

        let clause = filter.render(self.dialect, 1)?;
        sql.push_str("\nWHERE ");
        sql.push_str(&clause.sql);
        sql.push(';');
        Ok(Statement::new(sql, clause.params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ColumnType;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_create_table() {
        let schema = TableSchema::new("books")
            .column("id", ColumnType::integer().not_null())
            .column("title", ColumnType::varchar(120))
            .column("price", ColumnType::float())
            .column("published", ColumnType::datetime().not_null());

        let stmt = CreateTable::new(Dialect::Postgres, schema.clone())
            .to_statement()
            .unwrap();
        assert_eq!(
            stmt.sql(),
            "CREATE TABLE books (\n\tid INTEGER NOT NULL,\n\ttitle VARCHAR(120),\n\t\
             price FLOAT,\n\tpublished TIMESTAMP NOT NULL\n);"
        );
        assert!(stmt.params().is_empty());

        let sqlite = CreateTable::new(Dialect::Sqlite, schema).to_statement().unwrap();
        assert_eq!(
            sqlite.sql(),
            "CREATE TABLE books (\n\tid INTEGER NOT NULL,\n\ttitle TEXT,\n\tprice FLOAT,\n\t\
             published TEXT NOT NULL\n);"
        );
    }

    #[test]
    fn test_create_table_without_columns() {
        let stmt = CreateTable::new(Dialect::MySql, TableSchema::new("t"))
            .to_statement()
            .unwrap();
        assert_eq!(stmt.sql(), "CREATE TABLE t (\n\t\n);");
    }

    #[test]
    fn test_create_table_rejects_bad_names() {
        let bad_table = CreateTable::new(Dialect::Postgres, TableSchema::new("my table"));
        assert!(matches!(
            bad_table.to_statement(),
            Err(SqlError::IdentifierValidation { .. })
        ));

        let bad_column = CreateTable::new(
            Dialect::Postgres,
            TableSchema::new("t")
                .column("ok", ColumnType::integer())
                .column("bad-col", ColumnType::integer()),
        );
        assert!(matches!(
            bad_column.to_statement(),
            Err(SqlError::IdentifierValidation { ref token }) if token == "bad-col"
        ));
    }

    #[test]
    fn test_select_star_without_where() {
        let stmt = Select::new(Dialect::Postgres)
            .from(["t1", "t2"])
            .to_statement()
            .unwrap();
        assert_eq!(stmt.sql(), "SELECT *\nFROM t1, t2");
        assert!(stmt.params().is_empty());
    }

    #[test]
    fn test_select_with_where() {
        let stmt = Select::new(Dialect::SqlServer)
            .columns(["id", "name", "author"])
            .from(["books", "john"])
            .filter(Predicate::or([
                Predicate::eq("id", "1659"),
                Predicate::columns_equal(("john", "id"), ("books", "id")),
                Predicate::and([
                    Predicate::eq("name", "dune"),
                    Predicate::greater_than("price", 9.5),
                ]),
            ]))
            .to_statement()
            .unwrap();
        assert_eq!(
            stmt.sql(),
            "SELECT id, name, author\nFROM books, john\n\
             WHERE id=@p1 OR john.id=books.id OR (name=@p2 AND price>@p3);"
        );
        assert_eq!(stmt.params(), ["1659", "dune", "9.50"]);
    }

    #[test]
    fn test_select_requires_table() {
        let err = Select::new(Dialect::Postgres)
            .columns(["id"])
            .to_statement()
            .unwrap_err();
        assert!(matches!(err, SqlError::EmptyTableList));
    }

    #[test]
    fn test_select_rejects_bad_identifiers() {
        let bad_col = Select::new(Dialect::MySql)
            .columns(["id", "name;--"])
            .from(["users"])
            .to_statement();
        assert!(matches!(bad_col, Err(SqlError::IdentifierValidation { .. })));

        let bad_table = Select::new(Dialect::MySql)
            .from(["users", "x y"])
            .to_statement();
        assert!(matches!(bad_table, Err(SqlError::IdentifierValidation { .. })));

        let bad_filter = Select::new(Dialect::MySql)
            .from(["users"])
            .filter(Predicate::eq("a'b", "1"))
            .to_statement();
        assert!(matches!(bad_filter, Err(SqlError::IdentifierValidation { .. })));
    }
}
