//! Pet repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD over the `pets` table with caller-supplied selections.
//! - Hand out lazily consumed cursors for queries.
//! - Keep SQL details inside the storage boundary.
//!
//! # Invariants
//! - Write paths do not validate field semantics; that is the provider's job.
//! - Read paths reject invalid persisted rows instead of masking them.
//! - Repository writes never raise change notifications.

use crate::db::schema::{current_user_version, missing_pet_column, table_exists, TABLE_NAME};
use crate::db::{DbError, DATABASE_VERSION};
use crate::model::pet::{Gender, Pet, PetColumn, PetId, PetValues};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row, Rows, Statement};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage-level error for pet persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Connection has never had the schema applied.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema is not initialized (expected version {expected_version}, found {actual_version})"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table missing: {table}"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column missing: {table}.{column}")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted pet data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Filter predicate with positional `?` arguments.
///
/// The predicate is raw SQL appended after `WHERE`. An empty predicate
/// matches every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub predicate: String,
    pub args: Vec<Value>,
}

impl Selection {
    pub fn new(predicate: impl Into<String>) -> Self {
        Self {
            predicate: predicate.into(),
            args: Vec::new(),
        }
    }

    /// Appends one positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Selection matching exactly one row id.
    pub fn by_id(id: PetId) -> Self {
        Self::new(format!("{} = ?", PetColumn::Id.as_str())).arg(id)
    }

    fn where_clause(selection: Option<&Selection>) -> Option<&str> {
        selection
            .map(|selection| selection.predicate.trim())
            .filter(|predicate| !predicate.is_empty())
    }
}

/// Query options: projection, selection and sort order.
#[derive(Debug, Clone, Default)]
pub struct PetQuery {
    /// Columns to return. `None` (or empty) returns every column.
    pub projection: Option<Vec<PetColumn>>,
    pub selection: Option<Selection>,
    /// Raw `ORDER BY` expression.
    pub sort_order: Option<String>,
}

impl PetQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_projection(mut self, columns: impl Into<Vec<PetColumn>>) -> Self {
        self.projection = Some(columns.into());
        self
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = Some(selection);
        self
    }

    pub fn sorted_by(mut self, sort_order: impl Into<String>) -> Self {
        self.sort_order = Some(sort_order.into());
        self
    }

    fn columns(&self) -> Vec<PetColumn> {
        let mut columns = Vec::new();
        for column in self.projection.iter().flatten() {
            if !columns.contains(column) {
                columns.push(*column);
            }
        }
        if columns.is_empty() {
            columns.extend(PetColumn::ALL);
        }
        columns
    }
}

/// One (possibly projected) result row.
#[derive(Debug, Clone, PartialEq)]
pub struct PetRow {
    values: Vec<(PetColumn, Value)>,
}

impl PetRow {
    pub fn get(&self, column: PetColumn) -> Option<&Value> {
        self.values
            .iter()
            .find(|(current, _)| *current == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = PetColumn> + '_ {
        self.values.iter().map(|(column, _)| *column)
    }

    pub fn id(&self) -> Option<PetId> {
        match self.get(PetColumn::Id) {
            Some(Value::Integer(id)) => Some(*id),
            _ => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self.get(PetColumn::Name) {
            Some(Value::Text(name)) => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn breed(&self) -> Option<&str> {
        match self.get(PetColumn::Breed) {
            Some(Value::Text(breed)) => Some(breed.as_str()),
            _ => None,
        }
    }

    /// Converts a full-projection row into a validated `Pet`.
    pub fn into_pet(self) -> RepoResult<Pet> {
        let id = match self.required(PetColumn::Id)? {
            Value::Integer(id) => *id,
            other => return Err(invalid_column(PetColumn::Id, other)),
        };

        let name = match self.required(PetColumn::Name)? {
            Value::Text(name) if !name.is_empty() => name.clone(),
            other => return Err(invalid_column(PetColumn::Name, other)),
        };

        let breed = match self.required(PetColumn::Breed)? {
            Value::Null => None,
            Value::Text(breed) => Some(breed.clone()),
            other => return Err(invalid_column(PetColumn::Breed, other)),
        };

        let gender = match self.required(PetColumn::Gender)? {
            Value::Integer(code) => Gender::from_code(*code)
                .ok_or_else(|| invalid_column(PetColumn::Gender, &Value::Integer(*code)))?,
            other => return Err(invalid_column(PetColumn::Gender, other)),
        };

        let weight = match self.required(PetColumn::Weight)? {
            Value::Integer(weight) if *weight >= 0 => *weight,
            other => return Err(invalid_column(PetColumn::Weight, other)),
        };

        Ok(Pet {
            id,
            name,
            breed,
            gender,
            weight,
        })
    }

    fn required(&self, column: PetColumn) -> RepoResult<&Value> {
        self.get(column).ok_or_else(|| {
            RepoError::InvalidData(format!("column `{column}` is not in the projection"))
        })
    }
}

/// Prepared query over the `pets` table.
///
/// Holds the statement (and therefore a borrow of the connection) until
/// dropped. Each call to [`PetCursor::rows`] re-issues the query.
pub struct PetCursor<'conn> {
    stmt: Statement<'conn>,
    columns: Vec<PetColumn>,
    bind_values: Vec<Value>,
}

impl<'conn> PetCursor<'conn> {
    /// Columns returned by every row, in projection order.
    pub fn columns(&self) -> &[PetColumn] {
        &self.columns
    }

    /// Executes the query and returns a single-pass row iterator.
    pub fn rows(&mut self) -> RepoResult<PetRows<'_>> {
        let Self {
            stmt,
            columns,
            bind_values,
        } = self;
        let rows = stmt.query(params_from_iter(bind_values.iter()))?;
        Ok(PetRows {
            rows,
            columns: columns.as_slice(),
        })
    }

    pub fn collect_rows(&mut self) -> RepoResult<Vec<PetRow>> {
        self.rows()?.collect()
    }

    /// Collects full pets; fails when the projection omits a column.
    pub fn collect_pets(&mut self) -> RepoResult<Vec<Pet>> {
        self.rows()?
            .map(|row| row.and_then(PetRow::into_pet))
            .collect()
    }
}

/// Lazy iterator over one execution of a [`PetCursor`].
pub struct PetRows<'stmt> {
    rows: Rows<'stmt>,
    columns: &'stmt [PetColumn],
}

impl Iterator for PetRows<'_> {
    type Item = RepoResult<PetRow>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.rows.next() {
            Ok(Some(row)) => Some(read_row(row, self.columns)),
            Ok(None) => None,
            Err(err) => Some(Err(err.into())),
        }
    }
}

/// Repository interface for pet storage.
pub trait PetRepository {
    fn query(&self, query: &PetQuery) -> RepoResult<PetCursor<'_>>;
    fn query_by_id(&self, id: PetId) -> RepoResult<Option<Pet>>;
    fn insert(&self, values: &PetValues) -> RepoResult<PetId>;
    fn update(&self, values: &PetValues, selection: Option<&Selection>) -> RepoResult<usize>;
    fn delete(&self, selection: Option<&Selection>) -> RepoResult<usize>;
}

/// SQLite-backed pet repository.
pub struct SqlitePetRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePetRepository<'conn> {
    /// Wraps a connection whose schema has already been applied.
    ///
    /// # Errors
    /// - `UninitializedConnection` when `user_version` is still 0.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the table
    ///   shape does not match.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_pet_connection_ready(conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &'conn Connection {
        self.conn
    }
}

impl PetRepository for SqlitePetRepository<'_> {
    fn query(&self, query: &PetQuery) -> RepoResult<PetCursor<'_>> {
        let columns = query.columns();
        let column_list = columns
            .iter()
            .map(|column| column.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let mut sql = format!("SELECT {column_list} FROM {TABLE_NAME}");
        let mut bind_values = Vec::new();
        if let Some(predicate) = Selection::where_clause(query.selection.as_ref()) {
            sql.push_str(" WHERE ");
            sql.push_str(predicate);
        }
        if let Some(selection) = query.selection.as_ref() {
            bind_values.extend(selection.args.iter().cloned());
        }
        if let Some(sort_order) = query
            .sort_order
            .as_deref()
            .map(str::trim)
            .filter(|sort_order| !sort_order.is_empty())
        {
            sql.push_str(" ORDER BY ");
            sql.push_str(sort_order);
        }

        debug!(
            "event=pet_query module=repo status=prepare columns={} bind_count={}",
            columns.len(),
            bind_values.len()
        );
        let stmt = self.conn.prepare(&sql)?;
        Ok(PetCursor {
            stmt,
            columns,
            bind_values,
        })
    }

    fn query_by_id(&self, id: PetId) -> RepoResult<Option<Pet>> {
        let mut cursor = self.query(&PetQuery::all().with_selection(Selection::by_id(id)))?;
        let first = cursor.rows()?.next();
        match first {
            Some(row) => Ok(Some(row?.into_pet()?)),
            None => Ok(None),
        }
    }

    fn insert(&self, values: &PetValues) -> RepoResult<PetId> {
        if values.is_empty() {
            self.conn
                .execute(&format!("INSERT INTO {TABLE_NAME} DEFAULT VALUES;"), [])?;
        } else {
            let column_list = values
                .iter()
                .map(|(column, _)| column.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            let placeholders = vec!["?"; values.len()].join(", ");
            self.conn.execute(
                &format!("INSERT INTO {TABLE_NAME} ({column_list}) VALUES ({placeholders});"),
                params_from_iter(values.iter().map(|(_, value)| value)),
            )?;
        }

        let id = self.conn.last_insert_rowid();
        debug!("event=pet_insert module=repo status=ok id={id}");
        Ok(id)
    }

    fn update(&self, values: &PetValues, selection: Option<&Selection>) -> RepoResult<usize> {
        if values.is_empty() {
            debug!("event=pet_update module=repo status=skipped reason=empty_values");
            return Ok(0);
        }

        let assignments = values
            .iter()
            .map(|(column, _)| format!("{} = ?", column.as_str()))
            .collect::<Vec<_>>()
            .join(", ");
        let mut sql = format!("UPDATE {TABLE_NAME} SET {assignments}");
        if let Some(predicate) = Selection::where_clause(selection) {
            sql.push_str(" WHERE ");
            sql.push_str(predicate);
        }

        let selection_args = selection.map(|selection| selection.args.as_slice()).unwrap_or(&[]);
        let changed = self.conn.execute(
            &sql,
            params_from_iter(
                values
                    .iter()
                    .map(|(_, value)| value)
                    .chain(selection_args.iter()),
            ),
        )?;

        debug!("event=pet_update module=repo status=ok rows={changed}");
        Ok(changed)
    }

    fn delete(&self, selection: Option<&Selection>) -> RepoResult<usize> {
        let mut sql = format!("DELETE FROM {TABLE_NAME}");
        if let Some(predicate) = Selection::where_clause(selection) {
            sql.push_str(" WHERE ");
            sql.push_str(predicate);
        }

        let selection_args = selection.map(|selection| selection.args.as_slice()).unwrap_or(&[]);
        let changed = self
            .conn
            .execute(&sql, params_from_iter(selection_args.iter()))?;

        debug!("event=pet_delete module=repo status=ok rows={changed}");
        Ok(changed)
    }
}

fn read_row(row: &Row<'_>, columns: &[PetColumn]) -> RepoResult<PetRow> {
    let mut values = Vec::with_capacity(columns.len());
    for (index, column) in columns.iter().enumerate() {
        values.push((*column, row.get::<_, Value>(index)?));
    }
    Ok(PetRow { values })
}

fn invalid_column(column: PetColumn, value: &Value) -> RepoError {
    RepoError::InvalidData(format!("invalid value {value:?} in {TABLE_NAME}.{column}"))
}

fn ensure_pet_connection_ready(conn: &Connection) -> RepoResult<()> {
    let actual_version = current_user_version(conn)?;
    if actual_version == 0 {
        return Err(RepoError::UninitializedConnection {
            expected_version: DATABASE_VERSION,
            actual_version,
        });
    }

    if !table_exists(conn, TABLE_NAME)? {
        return Err(RepoError::MissingRequiredTable(TABLE_NAME));
    }

    if let Some(column) = missing_pet_column(conn)? {
        return Err(RepoError::MissingRequiredColumn {
            table: TABLE_NAME,
            column: column.as_str(),
        });
    }

    Ok(())
}
