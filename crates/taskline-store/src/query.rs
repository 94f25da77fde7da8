//! Structured `WHERE` construction for task listings.
//!
//! Each filter field that is present becomes one [`Predicate`]; predicates are
//! joined with `AND` and every value is bound as a `?` parameter. Column names
//! and operators come only from the fixed clause strings below, never from
//! caller input.

use rusqlite::types::ToSql;
use taskline_core::TaskFilter;

use crate::schema::TASK_COLUMNS;

/// One condition on the task table.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Predicate {
    Completed(bool),
    DueOnOrAfter(String),
    DueOnOrBefore(String),
    DueBetween(String, String),
}

impl Predicate {
    fn clause(&self) -> &'static str {
        match self {
            Self::Completed(_) => "is_completed = ?",
            Self::DueOnOrAfter(_) => "due_date >= ?",
            Self::DueOnOrBefore(_) => "due_date <= ?",
            Self::DueBetween(..) => "due_date BETWEEN ? AND ?",
        }
    }

    fn bind<'a>(&'a self, out: &mut Vec<&'a dyn ToSql>) {
        match self {
            Self::Completed(flag) => out.push(flag),
            Self::DueOnOrAfter(date) | Self::DueOnOrBefore(date) => out.push(date),
            Self::DueBetween(from, to) => {
                out.push(from);
                out.push(to);
            }
        }
    }
}

/// A parameterized `SELECT` over the task table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskQuery {
    predicates: Vec<Predicate>,
}

impl TaskQuery {
    /// A query matching every task.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the query for a filter. Dates are expected to be validated.
    pub fn from_filter(filter: &TaskFilter) -> Self {
        let mut query = Self::new();
        if let Some(flag) = filter.is_completed {
            query = query.completed(flag);
        }
        query.due_range(filter.from_date.as_deref(), filter.to_date.as_deref())
    }

    /// Restrict to one completion state.
    #[must_use]
    pub fn completed(mut self, flag: bool) -> Self {
        self.predicates.push(Predicate::Completed(flag));
        self
    }

    /// Restrict the due date to an inclusive range; either end may be open.
    #[must_use]
    pub fn due_range(mut self, from: Option<&str>, to: Option<&str>) -> Self {
        let predicate = match (from, to) {
            (Some(from), Some(to)) => Predicate::DueBetween(from.to_owned(), to.to_owned()),
            (Some(from), None) => Predicate::DueOnOrAfter(from.to_owned()),
            (None, Some(to)) => Predicate::DueOnOrBefore(to.to_owned()),
            (None, None) => return self,
        };
        self.predicates.push(predicate);
        self
    }

    /// Render the statement, in insertion (id) order.
    pub fn sql(&self) -> String {
        let mut sql = format!("SELECT {TASK_COLUMNS} FROM tasks");
        if !self.predicates.is_empty() {
            let clauses: Vec<&str> = self.predicates.iter().map(Predicate::clause).collect();
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY id");
        sql
    }

    /// Bound values, in placeholder order.
    pub fn params(&self) -> Vec<&dyn ToSql> {
        let mut out = Vec::new();
        for predicate in &self.predicates {
            predicate.bind(&mut out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_filter_selects_everything() {
        let query = TaskQuery::from_filter(&TaskFilter::default());
        assert_eq!(
            query.sql(),
            "SELECT id, title, description, due_date, is_completed FROM tasks ORDER BY id"
        );
        assert!(query.params().is_empty());
    }

    #[test]
    fn completion_only() {
        let query = TaskQuery::from_filter(&TaskFilter::by_status(false));
        assert!(query.sql().ends_with("FROM tasks WHERE is_completed = ? ORDER BY id"));
        assert_eq!(query.params().len(), 1);
    }

    #[test]
    fn from_date_only_is_lower_bound() {
        let query = TaskQuery::new().due_range(Some("2025-01-10"), None);
        assert!(query.sql().contains("WHERE due_date >= ?"));
        assert_eq!(query.params().len(), 1);
    }

    #[test]
    fn to_date_only_is_upper_bound() {
        let query = TaskQuery::new().due_range(None, Some("2025-01-31"));
        assert!(query.sql().contains("WHERE due_date <= ?"));
    }

    #[test]
    fn both_dates_use_between() {
        let query = TaskQuery::new().due_range(Some("2025-01-10"), Some("2025-01-31"));
        assert!(query.sql().contains("WHERE due_date BETWEEN ? AND ?"));
        assert_eq!(query.params().len(), 2);
    }

    #[test]
    fn completion_and_range_are_conjoined() {
        let filter = TaskFilter {
            is_completed: Some(true),
            from_date: Some("2025-01-10".into()),
            to_date: Some("2025-01-31".into()),
        };
        let query = TaskQuery::from_filter(&filter);
        assert_eq!(
            query.sql(),
            "SELECT id, title, description, due_date, is_completed FROM tasks \
             WHERE is_completed = ? AND due_date BETWEEN ? AND ? ORDER BY id"
        );
        assert!(!query.sql().contains(" OR "));
        assert_eq!(query.params().len(), 3);
    }

    #[test]
    fn values_never_reach_sql_text() {
        let filter = TaskFilter::due_between(Some("2025-01-01' OR '1'='1"), None);
        let query = TaskQuery::from_filter(&filter);
        assert!(!query.sql().contains("OR '1'"));
    }
}
