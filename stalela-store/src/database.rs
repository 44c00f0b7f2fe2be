//! SQLite connection handle and statement execution.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use rusqlite::{Connection, params_from_iter, types::Value};
use stalela_fs::prepare_database_dir;

use crate::query::{Changes, Filter, Page, Select};
use crate::row::{FromRow, RowReader};
use crate::{StoreError, schema};

/// How long a statement waits on a locked database file by default.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings for [`Database::with_config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// SQLite file location. Missing parent directories are created.
    pub path: Utf8PathBuf,
    /// Time to wait for a lock held by another connection.
    pub busy_timeout: Duration,
}

impl DatabaseConfig {
    /// Configuration for `path` with [`DEFAULT_BUSY_TIMEOUT`].
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }
}

/// A SQLite connection shared by the table facades.
///
/// The connection sits behind a mutex, so a `Database` is `Send + Sync`
/// and concurrent calls run one after another.
///
/// # Examples
/// ```
/// use stalela_store::{Companies, Database};
///
/// let db = Database::open_in_memory().expect("open database");
/// db.bootstrap().expect("create tables");
/// assert_eq!(Companies::new(&db).stats().expect("stats").total_companies, 0);
/// ```
pub struct Database {
    connection: Mutex<Connection>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

impl Database {
    /// Open (or create) the SQLite file at `path` with default settings.
    ///
    /// # Errors
    ///
    /// See [`Database::with_config`].
    pub fn open(path: impl AsRef<Utf8Path>) -> Result<Self, StoreError> {
        Self::with_config(&DatabaseConfig::new(path.as_ref()))
    }

    /// Open (or create) the SQLite file described by `config`.
    ///
    /// Foreign-key enforcement is switched on for the connection.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::CreateDirectory`] when the parent directory
    /// cannot be created and [`StoreError::Open`] when SQLite refuses the
    /// file or its settings.
    pub fn with_config(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let path = &config.path;
        prepare_database_dir(path).map_err(|source| StoreError::CreateDirectory {
            path: path.clone(),
            source,
        })?;
        let open_error = |source| StoreError::Open {
            path: path.clone(),
            source,
        };
        let connection = Connection::open(path.as_std_path()).map_err(open_error)?;
        connection
            .busy_timeout(config.busy_timeout)
            .map_err(open_error)?;
        Self::configure(connection).map_err(open_error)
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Open`] when SQLite cannot allocate it.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let open_error = |source| StoreError::Open {
            path: Utf8PathBuf::from(":memory:"),
            source,
        };
        let connection = Connection::open_in_memory().map_err(open_error)?;
        Self::configure(connection).map_err(open_error)
    }

    fn configure(connection: Connection) -> Result<Self, rusqlite::Error> {
        connection.pragma_update(None, "foreign_keys", true)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    /// Create every table and index that does not exist yet.
    ///
    /// Existing tables are never altered.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Bootstrap`] naming the failing step.
    pub fn bootstrap(&self) -> Result<(), StoreError> {
        let mut connection = self.lock()?;
        schema::bootstrap(&mut connection)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.connection
            .lock()
            .map_err(|_| StoreError::ConnectionPoisoned)
    }

    /// Run `select` and decode every row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Query`] when SQLite rejects the statement and
    /// decoding errors from [`FromRow`].
    pub fn fetch<R: FromRow>(&self, select: &Select) -> Result<Vec<R>, StoreError> {
        let (sql, params) = select.to_sql();
        let connection = self.lock()?;
        collect_rows(&connection, select.table(), &sql, &params)
    }

    /// Run `select` and decode the first row, if any.
    ///
    /// # Errors
    ///
    /// As [`Database::fetch`].
    pub fn fetch_optional<R: FromRow>(&self, select: &Select) -> Result<Option<R>, StoreError> {
        Ok(self.fetch(&select.clone().limit(1))?.into_iter().next())
    }

    /// Run `select` and decode exactly one row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] carrying `key` when nothing matches.
    pub fn fetch_one<R: FromRow>(
        &self,
        select: &Select,
        key: impl ToString,
    ) -> Result<R, StoreError> {
        self.fetch_optional(select)?
            .ok_or_else(|| StoreError::not_found(select.table(), key))
    }

    /// Count rows matching the filter of `select`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Query`] when SQLite rejects the statement.
    pub fn count(&self, select: &Select) -> Result<u64, StoreError> {
        let (sql, params) = select.to_count_sql();
        let table = select.table();
        debug!("{table}: {sql}");
        let connection = self.lock()?;
        let count: i64 = connection
            .query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))
            .map_err(StoreError::query(table))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Fetch one page of `select` together with the unpaged total.
    ///
    /// # Errors
    ///
    /// As [`Database::fetch`].
    pub fn page<R: FromRow>(&self, select: &Select) -> Result<Page<R>, StoreError> {
        let items = self.fetch(select)?;
        let total = self.count(select)?;
        Ok(Page { items, total })
    }

    /// Count rows per non-null value of `column`, largest group first and
    /// ties broken by value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Query`] when SQLite rejects the statement.
    pub fn group_counts(
        &self,
        table: &'static str,
        column: &'static str,
        filter: Filter,
    ) -> Result<Vec<(String, u64)>, StoreError> {
        let (filter_sql, params) = filter.not_null(column).to_sql();
        let sql = format!(
            "SELECT {column}, COUNT(*) AS n FROM {table}{filter_sql} \
             GROUP BY {column} ORDER BY n DESC, {column} ASC"
        );
        debug!("{table}: {sql}");
        let connection = self.lock()?;
        let mut statement = connection
            .prepare_cached(&sql)
            .map_err(StoreError::query(table))?;
        let mut rows = statement
            .query(params_from_iter(params.iter()))
            .map_err(StoreError::query(table))?;
        let mut groups = Vec::new();
        while let Some(row) = rows.next().map_err(StoreError::query(table))? {
            let key: String = row.get(0).map_err(StoreError::query(table))?;
            let count: i64 = row.get(1).map_err(StoreError::query(table))?;
            groups.push((key, u64::try_from(count).unwrap_or_default()));
        }
        Ok(groups)
    }

    /// Insert one row and return it as stored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Query`] on constraint violations and other
    /// SQLite failures.
    pub fn insert<R: FromRow>(&self, table: &'static str, changes: &Changes) -> Result<R, StoreError> {
        let (sql, params) = insert_sql(table, changes, None);
        let connection = self.lock()?;
        first_row(&connection, table, &sql, &params)
    }

    /// Insert every row in one transaction and return them as stored.
    ///
    /// Nothing is written when any insert fails.
    ///
    /// # Errors
    ///
    /// As [`Database::insert`].
    pub fn insert_many<R: FromRow>(
        &self,
        table: &'static str,
        rows: &[Changes],
    ) -> Result<Vec<R>, StoreError> {
        let mut connection = self.lock()?;
        let transaction = connection.transaction().map_err(StoreError::query(table))?;
        let mut stored = Vec::with_capacity(rows.len());
        for changes in rows {
            let (sql, params) = insert_sql(table, changes, None);
            stored.push(first_row(&transaction, table, &sql, &params)?);
        }
        transaction.commit().map_err(StoreError::query(table))?;
        Ok(stored)
    }

    /// Insert a row, or update the existing row sharing `conflict` columns.
    ///
    /// On conflict every assigned column except `id`, `created_at` and the
    /// conflict columns is overwritten, so the existing identifier is kept.
    ///
    /// # Errors
    ///
    /// As [`Database::insert`].
    pub fn upsert<R: FromRow>(
        &self,
        table: &'static str,
        changes: &Changes,
        conflict: &[&'static str],
    ) -> Result<R, StoreError> {
        let (sql, params) = insert_sql(table, changes, Some(conflict));
        let connection = self.lock()?;
        first_row(&connection, table, &sql, &params)
    }

    /// Apply `changes` to the row matching `filter` and return it.
    ///
    /// Empty `changes` re-read the row unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] carrying `key` when no row matches.
    pub fn update<R: FromRow>(
        &self,
        table: &'static str,
        filter: &Filter,
        changes: &Changes,
        key: impl ToString,
    ) -> Result<R, StoreError> {
        if changes.is_empty() {
            return self.fetch_one(&Select::from(table).filter(filter.clone()), key);
        }
        let (sql, params) = update_sql(table, filter, changes, " RETURNING *");
        let connection = self.lock()?;
        collect_rows(&connection, table, &sql, &params)?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::not_found(table, key))
    }

    /// Apply `changes` to every row matching `filter`.
    ///
    /// Returns the number of rows changed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Query`] when SQLite rejects the statement.
    pub fn update_all(
        &self,
        table: &'static str,
        filter: &Filter,
        changes: &Changes,
    ) -> Result<usize, StoreError> {
        if changes.is_empty() {
            return Ok(0);
        }
        let (sql, params) = update_sql(table, filter, changes, "");
        self.execute(table, &sql, &params)
    }

    /// Delete every row matching `filter`.
    ///
    /// Returns the number of rows removed; zero is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Query`] when SQLite rejects the statement.
    pub fn delete(&self, table: &'static str, filter: &Filter) -> Result<usize, StoreError> {
        let (filter_sql, params) = filter.to_sql();
        let sql = format!("DELETE FROM {table}{filter_sql}");
        self.execute(table, &sql, &params)
    }

    /// Run each `(table, filter)` delete in order inside one transaction.
    ///
    /// Returns the rows removed by each step. Nothing is removed when any
    /// step fails.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Query`] naming the table of the failing step.
    pub fn delete_in_order(&self, steps: &[(&'static str, Filter)]) -> Result<Vec<usize>, StoreError> {
        let Some(&(first, _)) = steps.first() else {
            return Ok(Vec::new());
        };
        let mut connection = self.lock()?;
        let transaction = connection.transaction().map_err(StoreError::query(first))?;
        let mut removed = Vec::with_capacity(steps.len());
        for &(table, ref filter) in steps {
            let (filter_sql, params) = filter.to_sql();
            let sql = format!("DELETE FROM {table}{filter_sql}");
            debug!("{table}: {sql}");
            let count = transaction
                .execute(&sql, params_from_iter(params.iter()))
                .map_err(StoreError::query(table))?;
            removed.push(count);
        }
        transaction.commit().map_err(StoreError::query(first))?;
        Ok(removed)
    }

    fn execute(&self, table: &'static str, sql: &str, params: &[Value]) -> Result<usize, StoreError> {
        debug!("{table}: {sql}");
        let connection = self.lock()?;
        connection
            .execute(sql, params_from_iter(params.iter()))
            .map_err(StoreError::query(table))
    }
}

fn collect_rows<R: FromRow>(
    connection: &Connection,
    table: &'static str,
    sql: &str,
    params: &[Value],
) -> Result<Vec<R>, StoreError> {
    debug!("{table}: {sql}");
    let mut statement = connection
        .prepare_cached(sql)
        .map_err(StoreError::query(table))?;
    let mut rows = statement
        .query(params_from_iter(params.iter()))
        .map_err(StoreError::query(table))?;
    let mut records = Vec::new();
    while let Some(row) = rows.next().map_err(StoreError::query(table))? {
        records.push(R::from_row(&RowReader::new(table, row))?);
    }
    Ok(records)
}

fn first_row<R: FromRow>(
    connection: &Connection,
    table: &'static str,
    sql: &str,
    params: &[Value],
) -> Result<R, StoreError> {
    collect_rows(connection, table, sql, params)?
        .into_iter()
        .next()
        .ok_or_else(|| StoreError::not_found(table, "inserted row"))
}

fn insert_sql(
    table: &'static str,
    changes: &Changes,
    conflict: Option<&[&'static str]>,
) -> (String, Vec<Value>) {
    let columns: Vec<&'static str> = changes.columns().collect();
    let placeholders = vec!["?"; columns.len()].join(", ");
    let mut sql = format!(
        "INSERT INTO {table} ({}) VALUES ({placeholders})",
        columns.join(", ")
    );
    if let Some(conflict) = conflict {
        let mut assignments: Vec<String> = columns
            .iter()
            .filter(|column| !matches!(**column, "id" | "created_at") && !conflict.contains(*column))
            .map(|column| format!("{column} = excluded.{column}"))
            .collect();
        if assignments.is_empty() {
            // `DO NOTHING` would suppress `RETURNING` for the existing row.
            assignments.extend(conflict.first().map(|column| format!("{column} = excluded.{column}")));
        }
        sql.push_str(&format!(
            " ON CONFLICT ({}) DO UPDATE SET {}",
            conflict.join(", "),
            assignments.join(", ")
        ));
    }
    sql.push_str(" RETURNING *");
    (sql, changes.values().cloned().collect())
}

fn update_sql(
    table: &'static str,
    filter: &Filter,
    changes: &Changes,
    returning: &str,
) -> (String, Vec<Value>) {
    let assignments: Vec<String> = changes.columns().map(|column| format!("{column} = ?")).collect();
    let (filter_sql, filter_params) = filter.to_sql();
    let mut params: Vec<Value> = changes.values().cloned().collect();
    params.extend(filter_params);
    (
        format!(
            "UPDATE {table} SET {}{filter_sql}{returning}",
            assignments.join(", ")
        ),
        params,
    )
}
