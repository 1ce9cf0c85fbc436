//! Storage session shared by every repository of one unit of work.
//!
//! # Invariants
//! - At most one write transaction is open; it starts lazily on the first
//!   staged write and ends only in `commit`, `rollback` or `close`.
//! - After `close` every access fails with `RepoError::SessionClosed`.

use crate::repo::{RepoError, RepoResult};
use log::warn;
use rusqlite::Connection;
use std::cell::{Cell, RefCell};

/// Connection and write transaction of one unit of work.
///
/// Repositories receive it from the registry; only this crate drives it.
pub struct Session {
    conn: RefCell<Option<Connection>>,
    staged_rows: Cell<usize>,
}

impl Session {
    pub(crate) fn new(conn: Connection) -> Self {
        Self {
            conn: RefCell::new(Some(conn)),
            staged_rows: Cell::new(0),
        }
    }

    /// Runs `f` against the open connection.
    pub(crate) fn with_conn<R>(
        &self,
        f: impl FnOnce(&Connection) -> RepoResult<R>,
    ) -> RepoResult<R> {
        let guard = self.conn.borrow();
        let conn = guard.as_ref().ok_or(RepoError::SessionClosed)?;
        f(conn)
    }

    /// Runs a write inside the scope transaction and records its row count.
    pub(crate) fn stage(&self, f: impl FnOnce(&Connection) -> RepoResult<usize>) -> RepoResult<usize> {
        self.with_conn(|conn| {
            if conn.is_autocommit() {
                self.staged_rows.set(0);
                conn.execute_batch("BEGIN IMMEDIATE")?;
            }
            let rows = f(conn)?;
            self.staged_rows.set(self.staged_rows.get() + rows);
            Ok(rows)
        })
    }

    /// Like `stage`, but undoes every statement `f` ran when it fails.
    pub(crate) fn stage_all(
        &self,
        f: impl FnOnce(&Connection) -> RepoResult<usize>,
    ) -> RepoResult<usize> {
        self.stage(|conn| {
            conn.execute_batch("SAVEPOINT stage_all")?;
            match f(conn) {
                Ok(rows) => {
                    conn.execute_batch("RELEASE stage_all")?;
                    Ok(rows)
                }
                Err(err) => {
                    if let Err(undo_err) =
                        conn.execute_batch("ROLLBACK TO stage_all; RELEASE stage_all")
                    {
                        warn!(
                            "event=stage_all_undo module=repo status=error error={undo_err}"
                        );
                    }
                    Err(err)
                }
            }
        })
    }

    pub(crate) fn staged_rows(&self) -> usize {
        self.staged_rows.get()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.conn.borrow().is_none()
    }

    /// Commits the open transaction; returns staged rows, 0 when none is open.
    pub(crate) fn commit(&self) -> RepoResult<usize> {
        self.with_conn(|conn| {
            if conn.is_autocommit() {
                self.staged_rows.set(0);
                return Ok(0);
            }

            let rows = self.staged_rows.replace(0);
            if let Err(err) = conn.execute_batch("COMMIT") {
                if !conn.is_autocommit() {
                    if let Err(undo_err) = conn.execute_batch("ROLLBACK") {
                        warn!("event=commit_undo module=repo status=error error={undo_err}");
                    }
                }
                return Err(err.into());
            }
            Ok(rows)
        })
    }

    /// Rolls back the open transaction; returns how many staged rows were dropped.
    pub(crate) fn rollback(&self) -> RepoResult<usize> {
        self.with_conn(|conn| {
            let rows = self.staged_rows.replace(0);
            if !conn.is_autocommit() {
                conn.execute_batch("ROLLBACK")?;
            }
            Ok(rows)
        })
    }

    /// Rolls back and releases the connection. Closing twice is a no-op.
    pub(crate) fn close(&self) -> RepoResult<usize> {
        if self.is_closed() {
            return Ok(0);
        }
        let discarded = self.rollback();
        let conn = self.conn.borrow_mut().take();
        if let Some(conn) = conn {
            conn.close().map_err(|(_, err)| RepoError::from(err))?;
        }
        discarded
    }
}
