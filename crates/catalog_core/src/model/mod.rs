//! Catalog domain model.
//!
//! # Responsibility
//! - Define the shared entity contract every stored type satisfies.
//! - Define the four catalog entities and their eager-loaded detail shapes.
//!
//! # Invariants
//! - Every entity is identified by a stable `EntityId`.
//! - Deletion is a soft-delete flag, never a physical delete.

pub mod category;
pub mod entity;
pub mod grouping;
pub mod item;
pub mod sub_unit;
