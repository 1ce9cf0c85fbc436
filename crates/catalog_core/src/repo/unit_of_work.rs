//! Unit of work: one storage session, one transaction, one commit.
//!
//! # Responsibility
//! - Own the connection for the lifetime of one logical operation.
//! - Hand out one cached repository per entity type, all sharing the session.
//! - Commit or discard everything staged through those repositories at once.
//!
//! # Invariants
//! - Nothing staged is persisted unless `save_changes` succeeds.
//! - Dropping or disposing the scope rolls back uncommitted writes.
//! - Repositories held past `dispose` fail with `RepoError::SessionClosed`.

use crate::model::entity::{Entity, NestedEntity};
use crate::repo::registry::RepoSlot;
use crate::repo::{NestedRepository, RepoError, RepoRegistry, RepoResult, Repository, Session};
use log::{error, info, warn};
use rusqlite::Connection;
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Instant;

pub struct UnitOfWork {
    session: Rc<Session>,
    registry: RepoRegistry,
    repos: RefCell<HashMap<TypeId, Box<dyn Any>>>,
}

impl UnitOfWork {
    /// Takes ownership of `conn` with the standard repository registry.
    pub fn new(conn: Connection) -> Self {
        Self::with_registry(conn, RepoRegistry::standard())
    }

    pub fn with_registry(conn: Connection, registry: RepoRegistry) -> Self {
        Self {
            session: Rc::new(Session::new(conn)),
            registry,
            repos: RefCell::new(HashMap::new()),
        }
    }

    /// Repository for `T`, specialized when registered, generic otherwise.
    ///
    /// Repeated calls return the same instance for the scope.
    pub fn repo<T: Entity>(&self) -> RepoResult<Rc<dyn Repository<T>>> {
        self.with_slot::<T, _, _>(|slot| Ok(Rc::clone(&slot.base)))
    }

    /// Eager-loading view of `T`'s cached repository.
    pub fn nested_repo<T: NestedEntity>(&self) -> RepoResult<Rc<dyn NestedRepository<T>>> {
        self.with_slot::<T, _, _>(|slot| {
            slot.nested
                .as_ref()
                .and_then(|nested| nested.downcast_ref::<Rc<dyn NestedRepository<T>>>())
                .cloned()
                .ok_or(RepoError::NoNestedRepository(T::TABLE))
        })
    }

    /// Commits every staged write; returns rows affected, 0 when nothing was staged.
    pub fn save_changes(&self) -> RepoResult<usize> {
        let started_at = Instant::now();
        match self.session.commit() {
            Ok(rows) => {
                info!(
                    "event=uow_commit module=repo status=ok rows={rows} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(rows)
            }
            Err(err) => {
                error!(
                    "event=uow_commit module=repo status=error duration_ms={} error={err}",
                    started_at.elapsed().as_millis()
                );
                Err(err)
            }
        }
    }

    /// Rolls back every staged write; returns how many staged rows were dropped.
    pub fn discard_changes(&self) -> RepoResult<usize> {
        let discarded = self.session.rollback()?;
        if discarded > 0 {
            info!("event=uow_rollback module=repo status=ok rows={discarded}");
        }
        Ok(discarded)
    }

    pub fn has_pending_changes(&self) -> bool {
        self.session.staged_rows() > 0
    }

    /// Rolls back anything uncommitted and closes the session.
    pub fn dispose(self) -> RepoResult<()> {
        let discarded = self.session.close()?;
        info!("event=uow_dispose module=repo status=ok discarded_rows={discarded}");
        Ok(())
    }

    fn with_slot<T, R, F>(&self, read: F) -> RepoResult<R>
    where
        T: Entity,
        F: FnOnce(&RepoSlot<T>) -> RepoResult<R>,
    {
        if self.session.is_closed() {
            return Err(RepoError::SessionClosed);
        }

        let type_id = TypeId::of::<T>();
        if !self.repos.borrow().contains_key(&type_id) {
            let slot = self.registry.build::<T>(Rc::clone(&self.session))?;
            self.repos.borrow_mut().insert(type_id, Box::new(slot));
        }

        let repos = self.repos.borrow();
        let slot = repos
            .get(&type_id)
            .and_then(|slot| slot.downcast_ref::<RepoSlot<T>>())
            .ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "cached repository for {} has the wrong entity type",
                    T::TABLE
                ))
            })?;
        read(slot)
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        if self.session.is_closed() {
            return;
        }
        match self.session.close() {
            Ok(0) => {}
            Ok(discarded) => {
                warn!("event=uow_drop module=repo status=ok discarded_rows={discarded}");
            }
            Err(err) => {
                error!("event=uow_drop module=repo status=error error={err}");
            }
        }
    }
}
