//! Query compilation: templates with `?` placeholders to canonical SQL.
//!
//! A [`Template`] is parsed once (placeholder normalization) and rendered with bound values
//! into the canonical SQL string that is used as the matching key everywhere else:
//!
//! ```
//! use fakedb::{params, template::compile};
//!
//! let sql = compile("SELECT * FROM t WHERE name=? AND note='why?'", &params!["it's"]).unwrap();
//! assert_eq!(sql, r"SELECT * FROM t WHERE name='it\'s' AND note='why?'");
//! ```
//!
//! INSERT and UPDATE templates may carry a `%s` assignment marker that is expanded from an
//! associative map:
//!
//! ```
//! use fakedb::template::Template;
//! use serde_json::json;
//!
//! let mut tpl = Template::parse("UPDATE tl_member %s WHERE id=?");
//! tpl.set(json!({"firstname": "Leo"}).as_object().unwrap());
//! assert_eq!(tpl.render(&[json!(1)]).unwrap(), "UPDATE tl_member SET firstname='Leo' WHERE id=1");
//! ```

use crate::error::{DbError, DbResult};
use crate::monitor::QueryType;
use crate::value::{Row, Value, escape, escape_all};
use std::fmt;


/// Rendered in place of an assignment marker that was never expanded.
const UNEXPANDED_ASSIGNMENT: &str = "%p";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Raw(String),
    Param,
    Assignment,
}

/// A parsed query template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    parts: Vec<Part>,
    query_type: QueryType,
}

/// Compile a template with positional values into canonical SQL.
pub fn compile(template: &str, values: &[Value]) -> DbResult<String> {
    Template::parse(template).render(values)
}

/// Compile an INSERT/UPDATE template, expanding its assignment marker from `assignments`.
pub fn compile_with_assignments(
    template: &str,
    values: &[Value],
    assignments: &Row,
) -> DbResult<String> {
    let mut tpl = Template::parse(template);
    tpl.set(assignments);
    tpl.render(values)
}

/// Split SQL into unquoted and single-quoted chunks (`'...'`, shortest match).
///
/// An unterminated quote leaves the remainder unquoted.
fn split_quoted(sql: &str) -> Vec<(&str, bool)> {
    let mut chunks = Vec::new();
    let mut rest = sql;

    while let Some(start) = rest.find('\'') {
        let Some(len) = rest[start + 1..].find('\'') else {
            break;
        };
        let end = start + len + 2;
        if start > 0 {
            chunks.push((&rest[..start], false));
        }
        chunks.push((&rest[start..end], true));
        rest = &rest[end..];
    }

    if !rest.is_empty() {
        chunks.push((rest, false));
    }
    chunks
}

impl Template {
    /// Parse a template, normalizing its placeholders.
    ///
    /// - `?` outside single-quoted literals is a positional placeholder.
    /// - `%s` is the assignment marker in INSERT/UPDATE statements and a positional
    ///   placeholder otherwise.
    /// - `%%` is a literal `%`; any other `%` is kept as is.
    pub fn parse(sql: &str) -> Self {
        let sql = sql.trim();
        let query_type = QueryType::from_sql(sql);
        let assignable = matches!(query_type, QueryType::Insert | QueryType::Update);

        let mut tpl = Self {
            parts: Vec::new(),
            query_type,
        };

        for (chunk, quoted) in split_quoted(sql) {
            let mut chars = chunk.chars().peekable();
            while let Some(c) = chars.next() {
                match c {
                    '?' if !quoted => tpl.parts.push(Part::Param),
                    '%' => match chars.peek() {
                        Some('s') => {
                            chars.next();
                            tpl.parts.push(if assignable {
                                Part::Assignment
                            } else {
                                Part::Param
                            });
                        }
                        Some('%') => {
                            chars.next();
                            tpl.push_char('%');
                        }
                        _ => tpl.push_char('%'),
                    },
                    c => tpl.push_char(c),
                }
            }
        }

        tpl
    }

    fn push_char(&mut self, c: char) {
        match self.parts.last_mut() {
            Some(Part::Raw(last)) => last.push(c),
            _ => self.parts.push(Part::Raw(c.to_string())),
        }
    }

    fn push_str(&mut self, s: &str) {
        match self.parts.last_mut() {
            Some(Part::Raw(last)) => last.push_str(s),
            _ => self.parts.push(Part::Raw(s.to_string())),
        }
    }

    /// The statement type detected from the leading keyword.
    pub fn query_type(&self) -> QueryType {
        self.query_type
    }

    /// Number of positional placeholders.
    pub fn param_count(&self) -> usize {
        self.parts.iter().filter(|p| matches!(p, Part::Param)).count()
    }

    /// Whether an assignment marker is still waiting for [`Template::set`].
    pub fn has_assignment_marker(&self) -> bool {
        self.parts.iter().any(|p| matches!(p, Part::Assignment))
    }

    /// Expand the assignment marker from an associative map.
    ///
    /// INSERT gets `(c1, c2) VALUES (v1, v2)`, UPDATE gets `SET c1=v1, c2=v2`. The expansion is
    /// literal text: placeholders or `%` inside the values are never substituted again. Other
    /// statement types have no marker and are left untouched.
    pub fn set(&mut self, assignments: &Row) -> &mut Self {
        let expansion = match self.query_type {
            QueryType::Insert => {
                let columns: Vec<&str> = assignments.keys().map(String::as_str).collect();
                let values: Vec<String> = assignments.values().map(escape).collect();
                format!("({}) VALUES ({})", columns.join(", "), values.join(", "))
            }
            QueryType::Update => {
                let pairs: Vec<String> = assignments
                    .iter()
                    .map(|(column, value)| format!("{}={}", column, escape(value)))
                    .collect();
                format!("SET {}", pairs.join(", "))
            }
            _ => return self,
        };

        let parts = std::mem::take(&mut self.parts);
        for part in parts {
            match part {
                Part::Assignment => self.push_str(&expansion),
                Part::Raw(s) => self.push_str(&s),
                Part::Param => self.parts.push(Part::Param),
            }
        }
        self
    }

    /// Append a LIMIT clause: `LIMIT offset,rows` for SELECT, `LIMIT rows` otherwise.
    pub fn limit(&mut self, rows: u64, offset: u64) -> &mut Self {
        let clause = if self.query_type == QueryType::Select {
            format!(" LIMIT {},{}", offset, rows)
        } else {
            format!(" LIMIT {}", rows)
        };
        self.push_str(&clause);
        self
    }

    /// Substitute the placeholders with escaped values, left to right.
    ///
    /// Extra values are ignored; too few values is a [`DbError::Compile`].
    pub fn render(&self, values: &[Value]) -> DbResult<String> {
        let escaped = escape_all(values);
        let mut escaped = escaped.iter();
        let mut out = String::new();

        for part in &self.parts {
            match part {
                Part::Raw(s) => out.push_str(s),
                Part::Param => match escaped.next() {
                    Some(v) => out.push_str(v),
                    None => {
                        return Err(DbError::compile(
                            "Too few arguments to build the query string",
                        ));
                    }
                },
                Part::Assignment => out.push_str(UNEXPANDED_ASSIGNMENT),
            }
        }

        Ok(out)
    }
}

impl fmt::Display for Template {
    /// The partially compiled text: placeholders as `?`, a pending assignment marker as `%s`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.parts {
            match part {
                Part::Raw(s) => f.write_str(s)?,
                Part::Param => f.write_str("?")?,
                Part::Assignment => f.write_str("%s")?,
            }
        }
        Ok(())
    }
}
