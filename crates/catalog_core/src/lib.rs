//! Catalog persistence core.
//! Generic repositories, a unit of work and the domain services that enforce
//! soft-delete integrity and cascades on top of them.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod query;
pub mod repo;
pub mod service;
pub mod validation;

pub use config::{ConfigError, CoreConfig, DatabaseConfig, LoggingConfig, NotifyConfig};
pub use db::{open_db, open_db_in_memory, open_with_config, DbError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::category::Category;
pub use model::entity::{Entity, EntityId, EntityMeta, NestedEntity};
pub use model::grouping::Grouping;
pub use model::item::{Item, ItemDetail};
pub use model::sub_unit::{SubUnit, SubUnitDetail};
pub use query::{Filter, Page, QueryError, QueryOptions, QuerySpec};
pub use repo::{NestedRepository, RepoError, RepoRegistry, RepoResult, Repository, UnitOfWork};
pub use service::{
    CategoryService, GroupingService, ItemService, MissingDependency, ServiceError,
    ServiceResult, SubUnitService,
};
pub use validation::{ValidationErrors, Validator, Violation};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
