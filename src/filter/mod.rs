//! Tagged filter expression tree rendered to parameterized SQL.
//!
//! Query filters are built as explicit `And`/`Or`/field-match nodes instead of
//! an ad-hoc condition map, so composite filters keep their grouping: a search
//! OR-group nested inside an access-restriction AND can never flatten into a
//! single OR and widen the result set.

mod error;

pub use error::FilterError;

use uuid::Uuid;

/// A single bind parameter produced while rendering an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Uuid(Uuid),
}

/// Rendered SQL fragment plus its bind parameters, `$1`-indexed in order.
#[derive(Debug, Clone)]
pub struct SqlResult {
    pub clause: String,
    pub params: Vec<SqlParam>,
}

/// Filter expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// All children must match. Children render in their own parentheses.
    And(Vec<Expr>),
    /// Any child must match.
    Or(Vec<Expr>),
    /// Column equality.
    Eq(String, SqlParam),
    /// Case-insensitive substring match (ILIKE with escaped needle).
    Contains(String, String),
}

impl Expr {
    pub fn eq(column: impl Into<String>, value: impl Into<SqlParam>) -> Self {
        Expr::Eq(column.into(), value.into())
    }

    pub fn contains(column: impl Into<String>, needle: impl Into<String>) -> Self {
        Expr::Contains(column.into(), needle.into())
    }

    /// Render the expression to a WHERE-clause fragment with `$n` placeholders
    /// starting at `$1`.
    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        let mut params = Vec::new();
        let clause = self.render(&mut params)?;
        Ok(SqlResult { clause, params })
    }

    fn render(&self, params: &mut Vec<SqlParam>) -> Result<String, FilterError> {
        match self {
            Expr::And(children) => Self::render_group(children, " AND ", params),
            Expr::Or(children) => Self::render_group(children, " OR ", params),
            Expr::Eq(column, value) => {
                validate_column(column)?;
                Ok(format!("{} = {}", column, push_param(params, value.clone())))
            }
            Expr::Contains(column, needle) => {
                validate_column(column)?;
                let pattern = format!("%{}%", escape_like(needle));
                Ok(format!(
                    "{} ILIKE {}",
                    column,
                    push_param(params, SqlParam::Text(pattern))
                ))
            }
        }
    }

    fn render_group(
        children: &[Expr],
        joiner: &str,
        params: &mut Vec<SqlParam>,
    ) -> Result<String, FilterError> {
        if children.is_empty() {
            return Err(FilterError::EmptyGroup);
        }
        let mut parts = Vec::with_capacity(children.len());
        for child in children {
            parts.push(format!("({})", child.render(params)?));
        }
        Ok(parts.join(joiner))
    }
}

impl From<String> for SqlParam {
    fn from(v: String) -> Self {
        SqlParam::Text(v)
    }
}

impl From<&str> for SqlParam {
    fn from(v: &str) -> Self {
        SqlParam::Text(v.to_string())
    }
}

impl From<Uuid> for SqlParam {
    fn from(v: Uuid) -> Self {
        SqlParam::Uuid(v)
    }
}

fn push_param(params: &mut Vec<SqlParam>, value: SqlParam) -> String {
    params.push(value);
    format!("${}", params.len())
}

/// Columns may be table-qualified (`tasks.title`) but are otherwise restricted
/// to identifier characters. Column names never come from clients; this guards
/// against a careless caller.
fn validate_column(column: &str) -> Result<(), FilterError> {
    let valid = !column.is_empty()
        && column
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        && column
            .chars()
            .next()
            .map(|c| c.is_ascii_alphabetic() || c == '_')
            .unwrap_or(false);
    if valid {
        Ok(())
    } else {
        Err(FilterError::InvalidColumn(column.to_string()))
    }
}

/// Escape LIKE metacharacters so a search term matches literally.
fn escape_like(needle: &str) -> String {
    needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn eq_renders_single_param() {
        let sql = Expr::eq("tasks.status", "pending").to_sql().unwrap();
        assert_eq!(sql.clause, "tasks.status = $1");
        assert_eq!(sql.params, vec![SqlParam::Text("pending".to_string())]);
    }

    #[test]
    fn contains_wraps_and_escapes_needle() {
        let sql = Expr::contains("tasks.title", "50%_done").to_sql().unwrap();
        assert_eq!(sql.clause, "tasks.title ILIKE $1");
        assert_eq!(
            sql.params,
            vec![SqlParam::Text("%50\\%\\_done%".to_string())]
        );
    }

    #[test]
    fn or_inside_and_keeps_grouping() {
        let user_id = Uuid::new_v4();
        let expr = Expr::And(vec![
            Expr::Or(vec![
                Expr::eq("tasks.assigned_to", "a@example.com"),
                Expr::eq("tasks.created_by", user_id),
            ]),
            Expr::Or(vec![
                Expr::contains("tasks.title", "audit"),
                Expr::contains("tasks.assigned_to", "audit"),
            ]),
        ]);
        let sql = expr.to_sql().unwrap();
        assert_eq!(
            sql.clause,
            "((tasks.assigned_to = $1) OR (tasks.created_by = $2)) AND ((tasks.title ILIKE $3) OR (tasks.assigned_to ILIKE $4))"
        );
        assert_eq!(sql.params.len(), 4);
        assert_eq!(sql.params[1], SqlParam::Uuid(user_id));
    }

    #[test]
    fn params_number_left_to_right() {
        let expr = Expr::And(vec![
            Expr::eq("a", "1"),
            Expr::eq("b", "2"),
            Expr::eq("c", "3"),
        ]);
        let sql = expr.to_sql().unwrap();
        assert_eq!(sql.clause, "(a = $1) AND (b = $2) AND (c = $3)");
    }

    #[test]
    fn empty_group_is_rejected() {
        assert!(matches!(
            Expr::And(vec![]).to_sql(),
            Err(FilterError::EmptyGroup)
        ));
        assert!(matches!(
            Expr::Or(vec![]).to_sql(),
            Err(FilterError::EmptyGroup)
        ));
    }

    #[test]
    fn bad_column_is_rejected() {
        let err = Expr::eq("tasks.title; DROP TABLE", "x").to_sql();
        assert!(matches!(err, Err(FilterError::InvalidColumn(_))));
        assert!(Expr::eq("1st_column", "x").to_sql().is_err());
    }
}
