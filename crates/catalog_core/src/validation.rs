//! Structural validation run before anything is staged.
//!
//! # Responsibility
//! - Define the validator contract services call on every candidate entity.
//! - Ship default rule sets for the four catalog entities.
//!
//! # Invariants
//! - A validator reports every violation it finds, not just the first.
//! - Validators are pure; they never touch storage.

use crate::model::category::Category;
use crate::model::grouping::Grouping;
use crate::model::item::Item;
use crate::model::sub_unit::SubUnit;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// One failed field rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: &'static str,
    pub message: String,
}

impl Violation {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl Display for Violation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every violation found on one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    pub entity: &'static str,
    pub violations: Vec<Violation>,
}

impl ValidationErrors {
    /// `Ok` when `violations` is empty.
    pub fn check(entity: &'static str, violations: Vec<Violation>) -> Result<(), Self> {
        if violations.is_empty() {
            Ok(())
        } else {
            Err(Self { entity, violations })
        }
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.violations
            .iter()
            .any(|violation| violation.field == field)
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {}:", self.entity)?;
        for (index, violation) in self.violations.iter().enumerate() {
            let separator = if index == 0 { " " } else { "; " };
            write!(f, "{separator}{violation}")?;
        }
        Ok(())
    }
}

impl Error for ValidationErrors {}

/// Field-level rules for a candidate `T`.
pub trait Validator<T> {
    fn validate(&self, candidate: &T) -> Vec<Violation>;
}

impl<T, F> Validator<T> for F
where
    F: Fn(&T) -> Vec<Violation>,
{
    fn validate(&self, candidate: &T) -> Vec<Violation> {
        self(candidate)
    }
}

fn require_text(violations: &mut Vec<Violation>, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        violations.push(Violation::new(field, "must not be empty"));
    }
}

fn require_id(violations: &mut Vec<Violation>, field: &'static str, value: Uuid) {
    if value.is_nil() {
        violations.push(Violation::new(field, "must reference an entity"));
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryRules;

impl Validator<Category> for CategoryRules {
    fn validate(&self, candidate: &Category) -> Vec<Violation> {
        let mut violations = Vec::new();
        require_text(&mut violations, "name", &candidate.name);
        require_text(&mut violations, "description", &candidate.description);
        require_text(&mut violations, "display_color", &candidate.display_color);
        violations
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ItemRules;

impl Validator<Item> for ItemRules {
    fn validate(&self, candidate: &Item) -> Vec<Violation> {
        let mut violations = Vec::new();
        require_text(&mut violations, "name", &candidate.name);
        require_text(&mut violations, "description", &candidate.description);
        require_text(&mut violations, "media_ref", &candidate.media_ref);
        require_id(&mut violations, "category_id", candidate.category_id);
        violations
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GroupingRules;

impl Validator<Grouping> for GroupingRules {
    fn validate(&self, candidate: &Grouping) -> Vec<Violation> {
        let mut violations = Vec::new();
        require_text(&mut violations, "name", &candidate.name);
        require_text(&mut violations, "description", &candidate.description);
        if candidate.core_capacity <= 0 {
            violations.push(Violation::new("core_capacity", "must be greater than 0"));
        }
        if candidate.total_capacity <= 0 {
            violations.push(Violation::new("total_capacity", "must be greater than 0"));
        }
        if candidate.core_capacity > candidate.total_capacity {
            violations.push(Violation::new(
                "core_capacity",
                "must be less than or equal to total_capacity",
            ));
        }
        violations
    }
}

/// Sub-unit rules; an empty item list is allowed.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubUnitRules;

impl Validator<SubUnit> for SubUnitRules {
    fn validate(&self, candidate: &SubUnit) -> Vec<Violation> {
        let mut violations = Vec::new();
        require_text(&mut violations, "name", &candidate.name);
        require_text(&mut violations, "content", &candidate.content);
        require_text(&mut violations, "classification", &candidate.classification);
        require_id(&mut violations, "grouping_id", candidate.grouping_id);
        if candidate.item_ids.iter().any(Uuid::is_nil) {
            violations.push(Violation::new("item_ids", "must not contain a nil id"));
        }
        violations
    }
}
