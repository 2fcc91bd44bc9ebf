//! Filter expression parser using nom.
//!
//! Turns the compact filter syntax accepted by the CLI into a [`Predicate`].
//!
//! # Syntax Overview
//!
//! ```text
//! active=1 & (name~'%ann%' | age>30) & users.id==orders.userid
//! ───┬────   ─────┬─────    ──┬───    ───────────┬────────────
//!    │            │           │                  └── Column equality (join)
//!    │            │           └── Numeric comparison
//!    │            └── Substring match (LIKE)
//!    └── Equality
//! ```
//!
//! `&` binds tighter than `|`. `=~` is a regular-expression match.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit1, multispace0},
    combinator::{map, opt, recognize},
    multi::many0,
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};

use crate::error::{SqlError, SqlResult};
use crate::predicate::{ColumnRef, CompareOp, LogicalOp, Predicate};

/// Parse a complete filter expression.
pub fn parse_filter(input: &str) -> SqlResult<Predicate> {
    let input = input.trim();

    match parse_or(input) {
        Ok(("", predicate)) => Ok(predicate),
        Ok((remaining, _)) => Err(SqlError::parse(
            input.len() - remaining.len(),
            format!("Unexpected trailing content: '{}'", remaining),
        )),
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => Err(SqlError::parse(
            input.len() - e.input.len(),
            format!("Expected a condition near '{}'", e.input),
        )),
        Err(nom::Err::Incomplete(_)) => Err(SqlError::parse(input.len(), "Incomplete input")),
    }
}

/// `and_expr ('|' and_expr)*`
fn parse_or(input: &str) -> IResult<&str, Predicate> {
    let (input, first) = parse_and(input)?;
    let (input, rest) = many0(preceded(ws(char('|')), parse_and))(input)?;
    Ok((input, group(LogicalOp::Or, first, rest)))
}

/// `term ('&' term)*`
fn parse_and(input: &str) -> IResult<&str, Predicate> {
    let (input, first) = parse_term(input)?;
    let (input, rest) = many0(preceded(ws(char('&')), parse_term))(input)?;
    Ok((input, group(LogicalOp::And, first, rest)))
}

/// A single term collapses to itself; more become one composite.
fn group(op: LogicalOp, first: Predicate, rest: Vec<Predicate>) -> Predicate {
    if rest.is_empty() {
        return first;
    }
    let mut children = Vec::with_capacity(rest.len() + 1);
    children.push(first);
    children.extend(rest);
    Predicate::Composite { op, children }
}

fn parse_term(input: &str) -> IResult<&str, Predicate> {
    let (input, _) = multispace0(input)?;
    alt((
        delimited(char('('), parse_or, ws(char(')'))),
        parse_column_equality,
        parse_comparison,
    ))(input)
}

/// `lt.lc==rt.rc`
fn parse_column_equality(input: &str) -> IResult<&str, Predicate> {
    let (input, (lt, _, lc)) = tuple((parse_identifier, char('.'), parse_identifier))(input)?;
    let (input, _) = ws(tag("=="))(input)?;
    let (input, (rt, _, rc)) = tuple((parse_identifier, char('.'), parse_identifier))(input)?;
    Ok((input, Predicate::columns_equal((lt, lc), (rt, rc))))
}

fn parse_comparison(input: &str) -> IResult<&str, Predicate> {
    let (input, column) = parse_column(input)?;
    let (input, _) = multispace0(input)?;
    let (input, op) = parse_operator(input)?;
    let (input, _) = multispace0(input)?;

    match op {
        CompareOp::LessThan => {
            map(parse_number, |n| Predicate::less_than(column.clone(), n))(input)
        }
        CompareOp::GreaterThan => {
            map(parse_number, |n| Predicate::greater_than(column.clone(), n))(input)
        }
        op => {
            let (input, value) = parse_value(input)?;
            Ok((input, Predicate::Comparison { column, op, value }))
        }
    }
}

/// `column` or `table.column`.
fn parse_column(input: &str) -> IResult<&str, ColumnRef> {
    let (input, first) = parse_identifier(input)?;
    let (input, second) = opt(preceded(char('.'), parse_identifier))(input)?;
    let column = match second {
        Some(col) => ColumnRef::qualified(first, col),
        None => ColumnRef::new(first),
    };
    Ok((input, column))
}

fn parse_operator(input: &str) -> IResult<&str, CompareOp> {
    alt((
        map(tag("=~"), |_| CompareOp::Pattern),
        map(char('~'), |_| CompareOp::Substring),
        map(char('<'), |_| CompareOp::LessThan),
        map(char('>'), |_| CompareOp::GreaterThan),
        map(char('='), |_| CompareOp::Equal),
    ))(input)
}

/// Identifiers are checked again at render time; the parser is lenient so
/// the renderer can report the offending token.
fn parse_identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)
}

fn parse_number(input: &str) -> IResult<&str, f64> {
    let (input, num_str) = recognize(tuple((
        opt(char('-')),
        digit1,
        opt(pair(char('.'), digit1)),
    )))(input)?;
    match num_str.parse() {
        Ok(n) => Ok((input, n)),
        Err(_) => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Float,
        ))),
    }
}

/// Quoted string or bare token.
fn parse_value(input: &str) -> IResult<&str, String> {
    alt((
        map(parse_quoted_string, str::to_string),
        map(
            take_while1(|c: char| !c.is_whitespace() && !"&|()'".contains(c)),
            str::to_string,
        ),
    ))(input)
}

fn parse_quoted_string(input: &str) -> IResult<&str, &str> {
    let (input, _) = char('\'')(input)?;
    let (input, content) = take_while(|c| c != '\'')(input)?;
    let (input, _) = char('\'')(input)?;
    Ok((input, content))
}

/// Surround a parser with optional whitespace.
fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_equality() {
        let p = parse_filter("id=5").unwrap();
        assert_eq!(p, Predicate::eq("id", "5"));
    }

    #[test]
    fn test_qualified_and_quoted() {
        let p = parse_filter("books.title = 'Dune Messiah'").unwrap();
        assert_eq!(p, Predicate::eq(("books", "title"), "Dune Messiah"));
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            parse_filter("price<12.5").unwrap(),
            Predicate::less_than("price", 12.5)
        );
        assert_eq!(
            parse_filter("age > 30").unwrap(),
            Predicate::greater_than("age", 30.0)
        );
        assert_eq!(
            parse_filter("name~'%ann%'").unwrap(),
            Predicate::substring("name", "%ann%")
        );
        assert_eq!(
            parse_filter("code=~^A.*").unwrap(),
            Predicate::regex("code", "^A.*")
        );
    }

    #[test]
    fn test_column_equality() {
        let p = parse_filter("users.id==orders.userid").unwrap();
        assert_eq!(p, Predicate::columns_equal(("users", "id"), ("orders", "userid")));
    }

    #[test]
    fn test_precedence_and_grouping() {
        let p = parse_filter("a=1 | b=2 & c=3").unwrap();
        assert_eq!(
            p,
            Predicate::or([
                Predicate::eq("a", "1"),
                Predicate::and([Predicate::eq("b", "2"), Predicate::eq("c", "3")]),
            ])
        );

        let grouped = parse_filter("(a=1 | b=2) & c=3").unwrap();
        let clause = grouped.render(Dialect::Postgres, 1).unwrap();
        assert_eq!(clause.sql, "(a=$1 OR b=$2) AND c=$3");
        assert_eq!(clause.params, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_numeric_operator_requires_number() {
        assert!(parse_filter("age>old").is_err());
    }

    #[test]
    fn test_trailing_content() {
        let err = parse_filter("a=1 )").unwrap_err();
        assert!(matches!(err, SqlError::Parse { position: 3, .. }));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(parse_filter("   "), Err(SqlError::Parse { .. })));
    }
}
