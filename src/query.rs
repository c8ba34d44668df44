use std::fmt;

use crate::error::{Error, Result};
use crate::record::Value;

/// Column-list sentinel for `SELECT COUNT(*)`.
pub const COUNT_STAR: &str = "count(*)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equal,
    GreaterThan,
    LessThan,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operator::Equal => "=",
            Operator::GreaterThan => ">",
            Operator::LessThan => "<",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub column: String,
    pub operator: Operator,
    pub value: String,
}

impl Predicate {
    pub fn parse(clause: &str) -> Result<Self> {
        let clause = clause.trim();
        let (pos, op) = clause
            .char_indices()
            .find(|(_, c)| matches!(c, '=' | '>' | '<' | '!'))
            .ok_or_else(|| Error::InvalidQuery(format!("no operator in WHERE clause {clause:?}")))?;

        let operator = match (op, clause[pos + 1..].chars().next()) {
            ('=', _) => Operator::Equal,
            ('>', Some(c)) if c != '=' => Operator::GreaterThan,
            ('<', Some(c)) if c != '=' && c != '>' => Operator::LessThan,
            (op, next) => {
                let symbol: String = std::iter::once(op).chain(next).collect();
                return Err(Error::UnsupportedOperator(symbol));
            }
        };

        let column = unquote_identifier(clause[..pos].trim());
        if column.is_empty() {
            return Err(Error::InvalidQuery(format!("no column in WHERE clause {clause:?}")));
        }

        Ok(Predicate {
            column: column.to_string(),
            operator,
            value: parse_literal(clause[pos + 1..].trim())?,
        })
    }

    /// Evaluate against one decoded column value. Only equality is evaluated.
    pub fn matches(&self, value: &Value) -> Result<bool> {
        if self.operator != Operator::Equal {
            return Err(Error::UnsupportedOperator(self.operator.to_string()));
        }

        let matched = match (value.as_integer(), self.value.parse::<i64>()) {
            (Some(actual), Ok(expected)) => actual == expected,
            _ if value.is_null() => false,
            _ => value.to_string() == self.value,
        };
        Ok(matched)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub table: String,
    pub columns: Vec<String>,
    pub predicate: Option<Predicate>,
}

impl Query {
    /// Parse `SELECT <columns> FROM <table> [WHERE <column> <op> <value>]`.
    pub fn parse(sql: &str) -> Result<Self> {
        let sql = sql.trim().trim_end_matches(';').trim_end();
        let lower = sql.to_ascii_lowercase();

        let (_, select_end) = find_keyword(&lower, "select")
            .filter(|(start, _)| *start == 0)
            .ok_or_else(|| Error::InvalidQuery(format!("expected SELECT: {sql:?}")))?;
        let (from_start, from_end) = find_keyword(&lower[select_end..], "from")
            .map(|(s, e)| (s + select_end, e + select_end))
            .ok_or_else(|| Error::InvalidQuery(format!("missing FROM clause: {sql:?}")))?;

        let columns: Vec<String> = sql[select_end..from_start]
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(|c| {
                let compact: String = c.chars().filter(|ch| !ch.is_whitespace()).collect();
                if compact.eq_ignore_ascii_case(COUNT_STAR) {
                    COUNT_STAR.to_string()
                } else {
                    unquote_identifier(c).to_string()
                }
            })
            .collect();
        if columns.is_empty() {
            return Err(Error::InvalidQuery(format!("no columns selected: {sql:?}")));
        }

        let rest = &sql[from_end..];
        let (table, predicate) = match find_keyword(&lower[from_end..], "where") {
            Some((where_start, where_end)) => (
                rest[..where_start].trim(),
                Some(Predicate::parse(&rest[where_end..])?),
            ),
            None => (rest.trim(), None),
        };

        let table = unquote_identifier(table);
        if table.is_empty() || table.contains(char::is_whitespace) {
            return Err(Error::InvalidQuery(format!("expected one table name: {sql:?}")));
        }

        Ok(Query {
            table: table.to_string(),
            columns,
            predicate,
        })
    }

    pub fn is_count(&self) -> bool {
        self.columns.len() == 1 && self.columns[0] == COUNT_STAR
    }

    pub fn where_column(&self) -> Option<&str> {
        self.predicate.as_ref().map(|p| p.column.as_str())
    }

    pub fn where_value(&self) -> Option<&str> {
        self.predicate.as_ref().map(|p| p.value.as_str())
    }
}

/// Byte range of `keyword` in `lower` where it stands as a whole word.
fn find_keyword(lower: &str, keyword: &str) -> Option<(usize, usize)> {
    lower.match_indices(keyword).map(|(start, _)| (start, start + keyword.len())).find(|&(start, end)| {
        let before = lower[..start].chars().next_back();
        let after = lower[end..].chars().next();
        before.map_or(true, char::is_whitespace) && after.map_or(true, char::is_whitespace)
    })
}

/// A single-quoted string (`''` escapes a quote) or one bare token.
/// Anything left over, such as a trailing `AND ...`, is rejected.
fn parse_literal(raw: &str) -> Result<String> {
    let Some(quoted) = raw.strip_prefix('\'') else {
        if raw.is_empty() || raw.contains(char::is_whitespace) || raw.contains('\'') {
            return Err(Error::InvalidQuery(format!("expected a single literal, found {raw:?}")));
        }
        return Ok(raw.to_string());
    };

    let mut value = String::new();
    let mut chars = quoted.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c != '\'' {
            value.push(c);
        } else if chars.next_if(|&(_, next)| next == '\'').is_some() {
            value.push('\'');
        } else {
            let rest = quoted[i + 1..].trim();
            if !rest.is_empty() {
                return Err(Error::InvalidQuery(format!("unexpected {rest:?} after literal")));
            }
            return Ok(value);
        }
    }
    Err(Error::InvalidQuery(format!("unterminated literal {raw:?}")))
}

fn unquote_identifier(name: &str) -> &str {
    let stripped = match name.chars().next() {
        Some('"') => name.strip_prefix('"').and_then(|n| n.strip_suffix('"')),
        Some('`') => name.strip_prefix('`').and_then(|n| n.strip_suffix('`')),
        Some('[') => name.strip_prefix('[').and_then(|n| n.strip_suffix(']')),
        _ => None,
    };
    stripped.unwrap_or(name)
}
