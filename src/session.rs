use crate::{UploaderError, UploaderResult};

use duckdb::Connection;
use std::{
    path::Path,
    sync::{Mutex, MutexGuard},
};
use tracing::debug;

/// Path value that opens a throw-away, in-memory database.
pub const IN_MEMORY_PATH: &str = ":memory:";

/// The fixed target database.
///
/// Holds the root connection and the catalog name it was opened under.
/// Work never runs on the root connection: every request acquires its own
/// [`Session`] with [`Database::session`] and drops it when done, so the
/// schema context of one request cannot leak into another.
pub struct Database {
    root: Mutex<Connection>,
    name: String,
}

impl Database {
    /// Opens (or creates) the DuckDB file at `path`. `:memory:` opens an in-memory database.
    pub fn open(path: &Path) -> UploaderResult<Self> {
        let connection = if path.as_os_str() == IN_MEMORY_PATH {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };
        Self::from_connection(connection)
    }

    /// Opens an empty in-memory database.
    pub fn open_in_memory() -> UploaderResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(connection: Connection) -> UploaderResult<Self> {
        let name: String =
            connection.query_row("SELECT current_database()", [], |row| row.get(0))?;

        tracing::info!("Opened database '{name}'");

        Ok(Database {
            root: Mutex::new(connection),
            name,
        })
    }

    /// Catalog name of the database (`table_catalog` in `information_schema`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Acquires a new session on the database.
    ///
    /// The session owns its own connection, released when the session is dropped.
    pub fn session(&self) -> UploaderResult<Session> {
        let connection = self.lock_root()?.try_clone()?;
        debug!("Acquired a session on '{}'", self.name);

        Ok(Session {
            connection,
            database: self.name.clone(),
        })
    }

    fn lock_root(&self) -> UploaderResult<MutexGuard<'_, Connection>> {
        self.root
            .lock()
            .map_err(|e| UploaderError::Other(format!("Database handle poisoned: {e}")))
    }
}

/// One connection on the target database, with its own active schema.
pub struct Session {
    connection: Connection,
    database: String,
}

impl Session {
    /// Catalog name of the database this session is connected to.
    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub(crate) fn connection_mut(&mut self) -> &mut Connection {
        &mut self.connection
    }

    /// Makes `schema` the active schema of this session.
    ///
    /// The setting outlives the call and stays in effect until the session is dropped
    /// or switched again. Fails if the schema does not exist.
    pub fn use_schema(&self, schema: &str) -> duckdb::Result<()> {
        let statement = format!("SET schema = {}", quote_literal(schema));
        debug!("{statement}");
        self.connection.execute_batch(&statement)
    }

    /// Name of the active schema.
    pub fn current_schema(&self) -> duckdb::Result<String> {
        self.connection
            .query_row("SELECT current_schema()", [], |row| row.get(0))
    }

    /// Fully-qualified, quoted name of `table` in `schema`: `"db"."schema"."table"`.
    pub fn qualified_table(&self, schema: &str, table: &str) -> String {
        format!(
            "{}.{}.{}",
            quote_identifier(&self.database),
            quote_identifier(schema),
            quote_identifier(table)
        )
    }
}

/// Quotes an identifier, doubling embedded quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quotes a string literal, doubling embedded single quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//
