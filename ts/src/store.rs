//! SQLite-backed store
//!
//! Layout: one `records` table holding the JSON payload of every record, keyed
//! by an AUTOINCREMENT id, plus a `record_indexes` table with one row per
//! indexed field. Filters are evaluated against the index table.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};

use crate::error::StoreError;
use crate::record::{Filter, Record};

/// Database file name used when the store is opened on a directory
pub const DB_FILE_NAME: &str = "tripstore.db";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS records (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        collection TEXT NOT NULL,
        data TEXT NOT NULL,
        updated_at INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_records_collection ON records(collection);
    CREATE TABLE IF NOT EXISTS record_indexes (
        record_id INTEGER NOT NULL,
        field TEXT NOT NULL,
        value,
        PRIMARY KEY (record_id, field)
    );
    CREATE INDEX IF NOT EXISTS idx_record_indexes_field ON record_indexes(field, value);
";

/// Persistent record store
pub struct Store {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Store {
    /// Open (or create) a store
    ///
    /// A path ending in `.db`/`.sqlite` is used as the database file; any
    /// other path is treated as a directory holding `tripstore.db`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        debug!("Store::open: called path={}", path.display());
        let db_path = match path.extension().and_then(|e| e.to_str()) {
            Some("db") | Some("sqlite") => {
                if let Some(parent) = path.parent()
                    && !parent.as_os_str().is_empty()
                {
                    fs::create_dir_all(parent)?;
                }
                path.to_path_buf()
            }
            _ => {
                fs::create_dir_all(path)?;
                path.join(DB_FILE_NAME)
            }
        };

        let conn = Connection::open(&db_path)?;
        conn.execute_batch(SCHEMA)?;
        info!("Opened store at {}", db_path.display());
        Ok(Self {
            conn,
            path: Some(db_path),
        })
    }

    /// Open a throwaway in-memory store
    pub fn open_in_memory() -> Result<Self, StoreError> {
        debug!("Store::open_in_memory: called");
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn, path: None })
    }

    /// Database file path (None for in-memory stores)
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Insert a new record, returning the assigned id
    pub fn create<T: Record>(&mut self, mut record: T) -> Result<i64, StoreError> {
        debug!("Store::create: called collection={}", T::collection_name());
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO records (collection, data, updated_at) VALUES (?1, '{}', ?2)",
            params![T::collection_name(), record.updated_at()],
        )?;
        let id = tx.last_insert_rowid();
        record.set_id(id);

        let data = serde_json::to_string(&record)?;
        tx.execute("UPDATE records SET data = ?1 WHERE id = ?2", params![data, id])?;
        write_indexes(&tx, id, &record)?;
        tx.commit()?;

        debug!("Store::create: assigned id={}", id);
        Ok(id)
    }

    /// Fetch a record by id
    pub fn get<T: Record>(&self, id: i64) -> Result<Option<T>, StoreError> {
        debug!("Store::get: called collection={} id={}", T::collection_name(), id);
        let data: Option<String> = self
            .conn
            .query_row(
                "SELECT data FROM records WHERE id = ?1 AND collection = ?2",
                params![id, T::collection_name()],
                |row| row.get(0),
            )
            .optional()?;

        match data {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => {
                debug!("Store::get: not found");
                Ok(None)
            }
        }
    }

    /// Replace an existing record
    pub fn update<T: Record>(&mut self, record: T) -> Result<(), StoreError> {
        let id = record.id();
        debug!("Store::update: called collection={} id={}", T::collection_name(), id);
        if id == 0 {
            return Err(StoreError::MissingId);
        }

        let data = serde_json::to_string(&record)?;
        let tx = self.conn.transaction()?;
        let changed = tx.execute(
            "UPDATE records SET data = ?1, updated_at = ?2 WHERE id = ?3 AND collection = ?4",
            params![data, record.updated_at(), id, T::collection_name()],
        )?;
        if changed == 0 {
            debug!("Store::update: no such record");
            return Err(StoreError::NotFound {
                collection: T::collection_name().to_string(),
                id,
            });
        }
        tx.execute("DELETE FROM record_indexes WHERE record_id = ?1", params![id])?;
        write_indexes(&tx, id, &record)?;
        tx.commit()?;
        Ok(())
    }

    /// Delete a record; returns whether anything was removed
    pub fn delete<T: Record>(&mut self, id: i64) -> Result<bool, StoreError> {
        debug!("Store::delete: called collection={} id={}", T::collection_name(), id);
        let tx = self.conn.transaction()?;
        let removed = tx.execute(
            "DELETE FROM records WHERE id = ?1 AND collection = ?2",
            params![id, T::collection_name()],
        )?;
        if removed > 0 {
            tx.execute("DELETE FROM record_indexes WHERE record_id = ?1", params![id])?;
        }
        tx.commit()?;
        Ok(removed > 0)
    }

    /// List records matching all filters, in ascending id order
    pub fn list<T: Record>(&self, filters: &[Filter]) -> Result<Vec<T>, StoreError> {
        debug!(
            "Store::list: called collection={} filters={}",
            T::collection_name(),
            filters.len()
        );
        let (sql, values) = build_query("r.data", T::collection_name(), filters);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), |row| row.get::<_, String>(0))?;

        let mut records = Vec::new();
        for row in rows {
            records.push(serde_json::from_str(&row?)?);
        }
        debug!("Store::list: found {} records", records.len());
        Ok(records)
    }

    /// Delete every record matching the filters; returns the number removed
    pub fn delete_matching<T: Record>(&mut self, filters: &[Filter]) -> Result<usize, StoreError> {
        debug!("Store::delete_matching: called collection={}", T::collection_name());
        let ids = self.list_ids(T::collection_name(), filters)?;
        let tx = self.conn.transaction()?;
        for id in &ids {
            tx.execute("DELETE FROM record_indexes WHERE record_id = ?1", params![id])?;
            tx.execute("DELETE FROM records WHERE id = ?1", params![id])?;
        }
        tx.commit()?;
        debug!("Store::delete_matching: removed {}", ids.len());
        Ok(ids.len())
    }

    /// Recompute index rows for every record of a collection
    pub fn rebuild_indexes<T: Record>(&mut self) -> Result<usize, StoreError> {
        debug!("Store::rebuild_indexes: called collection={}", T::collection_name());
        let records: Vec<T> = self.list(&[])?;
        let tx = self.conn.transaction()?;
        for record in &records {
            tx.execute("DELETE FROM record_indexes WHERE record_id = ?1", params![record.id()])?;
            write_indexes(&tx, record.id(), record)?;
        }
        tx.commit()?;
        Ok(records.len())
    }

    /// Collection names with their record counts
    pub fn collections(&self) -> Result<Vec<(String, i64)>, StoreError> {
        debug!("Store::collections: called");
        let mut stmt = self
            .conn
            .prepare("SELECT collection, COUNT(*) FROM records GROUP BY collection ORDER BY collection")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }

    /// Untyped listing of a collection, for inspection tools
    pub fn list_raw(&self, collection: &str) -> Result<Vec<(i64, serde_json::Value)>, StoreError> {
        debug!("Store::list_raw: called collection={}", collection);
        let mut stmt = self
            .conn
            .prepare("SELECT id, data FROM records WHERE collection = ?1 ORDER BY id ASC")?;
        let rows = stmt.query_map(params![collection], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (id, data) = row?;
            out.push((id, serde_json::from_str(&data)?));
        }
        Ok(out)
    }

    /// Untyped fetch of one record, for inspection tools
    pub fn get_raw(&self, collection: &str, id: i64) -> Result<Option<serde_json::Value>, StoreError> {
        debug!("Store::get_raw: called collection={} id={}", collection, id);
        let data: Option<String> = self
            .conn
            .query_row(
                "SELECT data FROM records WHERE id = ?1 AND collection = ?2",
                params![id, collection],
                |row| row.get(0),
            )
            .optional()?;
        data.map(|d| serde_json::from_str(&d).map_err(StoreError::from)).transpose()
    }

    fn list_ids(&self, collection: &str, filters: &[Filter]) -> Result<Vec<i64>, StoreError> {
        let (sql, values) = build_query("r.id", collection, filters);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), |row| row.get::<_, i64>(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }
}

fn write_indexes<T: Record>(conn: &Connection, id: i64, record: &T) -> Result<(), StoreError> {
    for (field, value) in record.indexed_fields() {
        conn.execute(
            "INSERT INTO record_indexes (record_id, field, value) VALUES (?1, ?2, ?3)",
            params![id, field, value.to_sql()],
        )?;
    }
    Ok(())
}

fn build_query(column: &str, collection: &str, filters: &[Filter]) -> (String, Vec<rusqlite::types::Value>) {
    let mut sql = format!("SELECT {} FROM records r WHERE r.collection = ?1", column);
    let mut values = vec![rusqlite::types::Value::Text(collection.to_string())];

    for filter in filters {
        let field_idx = values.len() + 1;
        let value_idx = values.len() + 2;
        sql.push_str(&format!(
            " AND EXISTS (SELECT 1 FROM record_indexes i WHERE i.record_id = r.id AND i.field = ?{} AND i.value {} ?{})",
            field_idx,
            filter.op.as_sql(),
            value_idx
        ));
        values.push(rusqlite::types::Value::Text(filter.field.clone()));
        values.push(filter.value.to_sql());
    }

    sql.push_str(" ORDER BY r.id ASC");
    (sql, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{FilterOp, IndexValue, now_ms};
    use serde::{Deserialize, Serialize};
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Note {
        id: i64,
        owner: i64,
        tag: String,
        updated_at: i64,
    }

    impl Note {
        fn new(owner: i64, tag: &str) -> Self {
            Self {
                id: 0,
                owner,
                tag: tag.to_string(),
                updated_at: now_ms(),
            }
        }
    }

    impl Record for Note {
        fn id(&self) -> i64 {
            self.id
        }

        fn set_id(&mut self, id: i64) {
            self.id = id;
        }

        fn updated_at(&self) -> i64 {
            self.updated_at
        }

        fn collection_name() -> &'static str {
            "notes"
        }

        fn indexed_fields(&self) -> HashMap<String, IndexValue> {
            let mut fields = HashMap::new();
            fields.insert("owner".to_string(), IndexValue::Int(self.owner));
            fields.insert("tag".to_string(), IndexValue::String(self.tag.clone()));
            fields
        }
    }

    #[test]
    fn test_create_assigns_increasing_ids() {
        let mut store = Store::open_in_memory().unwrap();
        let a = store.create(Note::new(1, "x")).unwrap();
        let b = store.create(Note::new(1, "y")).unwrap();
        assert!(a > 0);
        assert!(b > a);

        let fetched: Note = store.get(a).unwrap().unwrap();
        assert_eq!(fetched.id, a);
        assert_eq!(fetched.tag, "x");
    }

    #[test]
    fn test_get_missing_returns_none() {
        let store = Store::open_in_memory().unwrap();
        let fetched: Option<Note> = store.get(99).unwrap();
        assert!(fetched.is_none());
    }

    #[test]
    fn test_update_rewrites_indexes() {
        let mut store = Store::open_in_memory().unwrap();
        let id = store.create(Note::new(1, "old")).unwrap();

        let mut note: Note = store.get(id).unwrap().unwrap();
        note.tag = "new".to_string();
        store.update(note).unwrap();

        let old: Vec<Note> = store.list(&[Filter::eq("tag", "old")]).unwrap();
        let new: Vec<Note> = store.list(&[Filter::eq("tag", "new")]).unwrap();
        assert!(old.is_empty());
        assert_eq!(new.len(), 1);
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let mut store = Store::open_in_memory().unwrap();
        let mut note = Note::new(1, "x");
        note.id = 7;
        let err = store.update(note).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { id: 7, .. }));
    }

    #[test]
    fn test_update_without_id_fails() {
        let mut store = Store::open_in_memory().unwrap();
        let err = store.update(Note::new(1, "x")).unwrap_err();
        assert!(matches!(err, StoreError::MissingId));
    }

    #[test]
    fn test_list_with_filters_in_id_order() {
        let mut store = Store::open_in_memory().unwrap();
        store.create(Note::new(1, "a")).unwrap();
        store.create(Note::new(2, "a")).unwrap();
        store.create(Note::new(1, "b")).unwrap();
        store.create(Note::new(1, "a")).unwrap();

        let notes: Vec<Note> = store
            .list(&[Filter::eq("owner", 1i64), Filter::eq("tag", "a")])
            .unwrap();
        assert_eq!(notes.len(), 2);
        assert!(notes[0].id < notes[1].id);

        let others: Vec<Note> = store
            .list(&[Filter {
                field: "owner".to_string(),
                op: FilterOp::Ne,
                value: IndexValue::Int(1),
            }])
            .unwrap();
        assert_eq!(others.len(), 1);
        assert_eq!(others[0].owner, 2);
    }

    #[test]
    fn test_delete_and_delete_matching() {
        let mut store = Store::open_in_memory().unwrap();
        let id = store.create(Note::new(1, "a")).unwrap();
        store.create(Note::new(1, "b")).unwrap();
        store.create(Note::new(2, "c")).unwrap();

        assert!(store.delete::<Note>(id).unwrap());
        assert!(!store.delete::<Note>(id).unwrap());

        let removed = store.delete_matching::<Note>(&[Filter::eq("owner", 1i64)]).unwrap();
        assert_eq!(removed, 1);

        let rest: Vec<Note> = store.list(&[]).unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].owner, 2);
    }

    #[test]
    fn test_persists_across_reopen() {
        let temp = tempdir().unwrap();
        let id = {
            let mut store = Store::open(temp.path()).unwrap();
            store.create(Note::new(5, "kept")).unwrap()
        };

        let mut store = Store::open(temp.path()).unwrap();
        assert_eq!(store.rebuild_indexes::<Note>().unwrap(), 1);
        let note: Note = store.get(id).unwrap().unwrap();
        assert_eq!(note.tag, "kept");
        assert!(temp.path().join(DB_FILE_NAME).exists());
    }

    #[test]
    fn test_open_file_path() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("nested").join("data.db");
        let store = Store::open(&file).unwrap();
        assert_eq!(store.path(), Some(file.as_path()));
        assert!(file.exists());
    }

    #[test]
    fn test_raw_access() {
        let mut store = Store::open_in_memory().unwrap();
        let id = store.create(Note::new(3, "raw")).unwrap();

        let collections = store.collections().unwrap();
        assert_eq!(collections, vec![("notes".to_string(), 1)]);

        let raw = store.get_raw("notes", id).unwrap().unwrap();
        assert_eq!(raw["tag"], "raw");
        assert_eq!(store.list_raw("notes").unwrap().len(), 1);
        assert!(store.get_raw("other", id).unwrap().is_none());
    }
}
