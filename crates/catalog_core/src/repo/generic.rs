//! Generic SQLite repository driven by the entity descriptor.
//!
//! # Responsibility
//! - Provide CRUD, paging, sorting and soft delete for any `Entity`.
//! - Keep SQL text inside the repository boundary.
//!
//! # Invariants
//! - Only descriptor column names are interpolated into SQL; every value is
//!   bound as a parameter.
//! - Paged reads order before slicing and tie-break by `id`.
//! - Writes only touch live rows (`is_deleted = 0`).

use crate::model::entity::{now_epoch_ms, read_meta, Entity, EntityId, META_COLUMNS};
use crate::query::{Filter, Page, QuerySpec};
use crate::repo::{RepoError, RepoResult, Repository, Session};
use log::{debug, info};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::marker::PhantomData;
use std::rc::Rc;

/// Repository any entity gets without writing SQL.
pub struct GenericRepository<T: Entity> {
    session: Rc<Session>,
    sql: EntitySql,
    _entity: PhantomData<fn() -> T>,
}

/// Statements derived once from the descriptor.
struct EntitySql {
    select: String,
    insert: String,
    update: String,
}

impl EntitySql {
    fn for_entity<T: Entity>() -> Self {
        let columns: Vec<&str> = META_COLUMNS
            .iter()
            .copied()
            .chain(T::COLUMNS.iter().copied())
            .collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|n| format!("?{n}")).collect();
        // ?1 = id, ?2 = updated_at, data columns from ?3.
        let assignments: Vec<String> = T::COLUMNS
            .iter()
            .enumerate()
            .map(|(index, column)| format!("{column} = ?{}", index + 3))
            .collect();
        let set_clause = std::iter::once("updated_at = ?2".to_string())
            .chain(assignments)
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            select: format!("SELECT {} FROM {}", columns.join(", "), T::TABLE),
            insert: format!(
                "INSERT INTO {} ({}) VALUES ({})",
                T::TABLE,
                columns.join(", "),
                placeholders.join(", ")
            ),
            update: format!(
                "UPDATE {} SET {set_clause} WHERE id = ?1 AND is_deleted = 0",
                T::TABLE
            ),
        }
    }
}

impl<T: Entity> GenericRepository<T> {
    /// Binds a repository to a unit-of-work session, typically inside a
    /// constructor passed to `RepoRegistry::register_nested`.
    pub fn new(session: Rc<Session>) -> Self {
        Self {
            session,
            sql: EntitySql::for_entity::<T>(),
            _entity: PhantomData,
        }
    }

    /// Live rows among `ids`, in no particular order.
    pub fn fetch_live_by_ids(&self, ids: &[EntityId]) -> RepoResult<Vec<T>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids_json = ids_to_json(ids)?;
        let sql = format!(
            "{} WHERE is_deleted = 0 AND id IN (SELECT value FROM json_each(?1))",
            self.sql.select
        );
        self.session.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(params![ids_json])?;
            let mut entities = Vec::new();
            while let Some(row) = rows.next()? {
                entities.push(decode_row::<T>(row)?);
            }
            Ok(entities)
        })
    }

    fn insert_one(&self, conn: &Connection, entity: &T) -> RepoResult<usize> {
        let values = insert_values(entity)?;
        conn.prepare_cached(&self.sql.insert)?
            .execute(params_from_iter(values))
            .map_err(|err| RepoError::from_write(T::TABLE, err))
    }
}

impl<T: Entity> Repository<T> for GenericRepository<T> {
    fn get_by_id(&self, id: EntityId, include_inactive: bool) -> RepoResult<Option<T>> {
        let sql = format!(
            "{} WHERE id = ?1 AND (?2 = 1 OR is_deleted = 0)",
            self.sql.select
        );
        self.session.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(&sql)?;
            let mut rows = stmt.query(params![id.to_string(), include_inactive])?;
            let entity = match rows.next()? {
                Some(row) => Some(decode_row::<T>(row)?),
                None => None,
            };
            Ok(entity)
        })
    }

    fn is_exist(&self, id: EntityId) -> RepoResult<bool> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1 AND is_deleted = 0)",
            T::TABLE
        );
        self.session.with_conn(|conn| {
            let exists: i64 = conn.query_row(&sql, params![id.to_string()], |row| row.get(0))?;
            Ok(exists == 1)
        })
    }

    fn count_exist(&self, ids: &[EntityId]) -> RepoResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let ids_json = ids_to_json(ids)?;
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE is_deleted = 0
             AND id IN (SELECT DISTINCT value FROM json_each(?1))",
            T::TABLE
        );
        self.session.with_conn(|conn| {
            let count: i64 = conn.query_row(&sql, params![ids_json], |row| row.get(0))?;
            Ok(to_usize(count))
        })
    }

    fn get_all(&self, query: &QuerySpec, include_inactive: bool) -> RepoResult<Page<T>> {
        let resolved = query.resolve::<T>()?;
        let sql = format!(
            "{} WHERE (?1 = 1 OR is_deleted = 0) ORDER BY {} LIMIT ?2 OFFSET ?3",
            self.sql.select,
            resolved.order_by_sql()
        );
        let count_sql = format!(
            "SELECT COUNT(*) FROM {} WHERE (?1 = 1 OR is_deleted = 0)",
            T::TABLE
        );

        self.session.with_conn(|conn| {
            let total: i64 =
                conn.query_row(&count_sql, params![include_inactive], |row| row.get(0))?;

            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(params![
                include_inactive,
                resolved.limit(),
                resolved.offset()
            ])?;
            let mut items = Vec::new();
            while let Some(row) = rows.next()? {
                items.push(decode_row::<T>(row)?);
            }

            Ok(Page {
                items,
                page: resolved.page,
                size: resolved.size,
                total: u64::try_from(total).unwrap_or_default(),
            })
        })
    }

    fn create(&self, entity: &T) -> RepoResult<()> {
        ensure_live(entity)?;
        self.session.stage(|conn| self.insert_one(conn, entity))?;
        debug!(
            "event=repo_write module=repo status=ok op=create table={} id={}",
            T::TABLE,
            entity.id()
        );
        Ok(())
    }

    fn create_batch(&self, entities: &[T]) -> RepoResult<usize> {
        if entities.is_empty() {
            return Ok(0);
        }
        entities.iter().try_for_each(ensure_live)?;
        let inserted = self.session.stage_all(|conn| {
            let mut inserted = 0;
            for entity in entities {
                inserted += self.insert_one(conn, entity)?;
            }
            Ok(inserted)
        })?;
        debug!(
            "event=repo_write module=repo status=ok op=create_batch table={} rows={inserted}",
            T::TABLE
        );
        Ok(inserted)
    }

    fn update(&self, entity: &mut T) -> RepoResult<()> {
        let previous_updated_at = entity.meta().updated_at;
        entity.meta_mut().touch();

        let mut values = vec![
            Value::Text(entity.id().to_string()),
            Value::Integer(entity.meta().updated_at),
        ];
        values.extend(entity.column_values()?);

        let changed = self.session.stage(|conn| {
            conn.prepare_cached(&self.sql.update)?
                .execute(params_from_iter(values))
                .map_err(|err| RepoError::from_write(T::TABLE, err))
        });

        match changed {
            Ok(0) => {
                entity.meta_mut().updated_at = previous_updated_at;
                Err(RepoError::NotFound(entity.id()))
            }
            Ok(_) => {
                debug!(
                    "event=repo_write module=repo status=ok op=update table={} id={}",
                    T::TABLE,
                    entity.id()
                );
                Ok(())
            }
            Err(err) => {
                entity.meta_mut().updated_at = previous_updated_at;
                Err(err)
            }
        }
    }

    fn soft_delete(&self, id: EntityId) -> RepoResult<bool> {
        let sql = format!(
            "UPDATE {} SET is_deleted = 1, updated_at = ?2 WHERE id = ?1 AND is_deleted = 0",
            T::TABLE
        );
        let changed = self.session.stage(|conn| {
            Ok(conn.execute(&sql, params![id.to_string(), now_epoch_ms()])?)
        })?;
        debug!(
            "event=repo_write module=repo status=ok op=soft_delete table={} id={id} changed={changed}",
            T::TABLE
        );
        Ok(changed > 0)
    }

    fn bulk_soft_delete(&self, filter: &Filter) -> RepoResult<usize> {
        if filter.is_empty() {
            return Err(RepoError::EmptyFilter { table: T::TABLE });
        }
        let (clause, filter_params) = filter.to_sql::<T>()?;
        let sql = format!(
            "UPDATE {} SET is_deleted = 1, updated_at = ? WHERE is_deleted = 0{clause}",
            T::TABLE
        );
        let mut values = vec![Value::Integer(now_epoch_ms())];
        values.extend(filter_params);

        let changed = self
            .session
            .stage(|conn| Ok(conn.execute(&sql, params_from_iter(values))?))?;
        info!(
            "event=bulk_soft_delete module=repo status=ok table={} rows={changed}",
            T::TABLE
        );
        Ok(changed)
    }

    fn count(&self, include_inactive: bool) -> RepoResult<usize> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE (?1 = 1 OR is_deleted = 0)",
            T::TABLE
        );
        self.session.with_conn(|conn| {
            let count: i64 = conn.query_row(&sql, params![include_inactive], |row| row.get(0))?;
            Ok(to_usize(count))
        })
    }
}

pub(crate) fn decode_row<T: Entity>(row: &Row<'_>) -> RepoResult<T> {
    let meta = read_meta(row, T::TABLE)?;
    T::from_row(meta, row)
}

fn ensure_live<T: Entity>(entity: &T) -> RepoResult<()> {
    if entity.meta().is_deleted {
        return Err(RepoError::DeletedOnCreate(entity.id()));
    }
    Ok(())
}

fn insert_values<T: Entity>(entity: &T) -> RepoResult<Vec<Value>> {
    let meta = entity.meta();
    let mut values = vec![
        Value::Text(meta.id.to_string()),
        Value::Integer(meta.created_at),
        Value::Integer(meta.updated_at),
        Value::Integer(i64::from(meta.is_deleted)),
    ];
    values.extend(entity.column_values()?);
    Ok(values)
}

fn ids_to_json(ids: &[EntityId]) -> RepoResult<String> {
    serde_json::to_string(ids)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode id list: {err}")))
}

fn to_usize(count: i64) -> usize {
    usize::try_from(count).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::EntitySql;
    use crate::model::category::Category;

    #[test]
    fn statements_follow_descriptor_order() {
        let sql = EntitySql::for_entity::<Category>();
        assert_eq!(
            sql.select,
            "SELECT id, created_at, updated_at, is_deleted, name, description, display_color FROM categories"
        );
        assert_eq!(
            sql.insert,
            "INSERT INTO categories (id, created_at, updated_at, is_deleted, name, description, display_color) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
        );
        assert_eq!(
            sql.update,
            "UPDATE categories SET updated_at = ?2, name = ?3, description = ?4, display_color = ?5 WHERE id = ?1 AND is_deleted = 0"
        );
    }
}
