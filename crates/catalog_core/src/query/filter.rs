//! Bulk-update predicates.

use crate::model::entity::{Entity, EntityId};
use crate::repo::{RepoError, RepoResult};
use rusqlite::types::Value;

/// One column condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq { column: String, value: Value },
    In { column: String, values: Vec<Value> },
}

impl Condition {
    fn column(&self) -> &str {
        match self {
            Self::Eq { column, .. } | Self::In { column, .. } => column,
        }
    }
}

/// AND-combined column conditions.
///
/// An empty filter renders no clause; `bulk_soft_delete` refuses it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `column = value`.
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    /// `column = id`, for reference columns.
    pub fn eq_id(self, column: impl Into<String>, id: EntityId) -> Self {
        self.eq(column, id.to_string())
    }

    /// `column IN (values)`; an empty set matches nothing.
    pub fn any_of<V: Into<Value>>(
        mut self,
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.conditions.push(Condition::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Renders ` AND ...` clauses with anonymous placeholders for `T`'s table.
    pub(crate) fn to_sql<T: Entity>(&self) -> RepoResult<(String, Vec<Value>)> {
        let mut clause = String::new();
        let mut params = Vec::new();

        for condition in &self.conditions {
            let column = condition.column();
            if !T::has_column(column) {
                return Err(RepoError::UnknownColumn {
                    table: T::TABLE,
                    column: column.to_string(),
                });
            }

            match condition {
                Condition::Eq { value, .. } => {
                    clause.push_str(&format!(" AND {column} = ?"));
                    params.push(value.clone());
                }
                Condition::In { values, .. } if values.is_empty() => {
                    clause.push_str(" AND 0");
                }
                Condition::In { values, .. } => {
                    let placeholders = vec!["?"; values.len()].join(", ");
                    clause.push_str(&format!(" AND {column} IN ({placeholders})"));
                    params.extend(values.iter().cloned());
                }
            }
        }

        Ok((clause, params))
    }
}
