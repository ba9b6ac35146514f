//! Reads the database's own metadata: which schemas exist and which tables they hold.
//!
//! Both queries go through `information_schema.tables`, scoped to the fixed target
//! database. Failures are not handled here; they surface as
//! [`UploaderError::CatalogUnavailable`] for the caller to deal with.

use crate::{Session, UploaderError, UploaderResult, quote_literal};

use duckdb::params;
use tracing::debug;

/// System namespaces never offered as upload destinations (compared case-insensitively).
pub const RESERVED_SCHEMAS: [&str; 2] = ["information_schema", "pg_catalog"];

/// Returns `true` if `schema` names a reserved system namespace.
pub fn is_reserved_schema(schema: &str) -> bool {
    RESERVED_SCHEMAS
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(schema))
}

/// Lists the distinct schemas holding at least one table in the target database.
///
/// Reserved schemas are excluded. Order is whatever the catalog query returns.
pub fn list_schemas(session: &Session) -> UploaderResult<Vec<String>> {
    let reserved = RESERVED_SCHEMAS
        .iter()
        .map(|schema| quote_literal(schema))
        .collect::<Vec<_>>()
        .join(", ");

    let query = format!(
        "SELECT DISTINCT table_schema \
         FROM information_schema.tables \
         WHERE table_catalog = ? AND lower(table_schema) NOT IN ({reserved})"
    );
    debug!("fn list_schemas()\nquery: {query}");

    let mut statement = session
        .connection()
        .prepare(&query)
        .map_err(catalog_unavailable)?;

    let schemas = statement
        .query_map(params![session.database()], |row| row.get::<_, String>(0))
        .map_err(catalog_unavailable)?
        .collect::<Result<Vec<String>, _>>()
        .map_err(catalog_unavailable)?;

    debug!("Found {} schemas: {schemas:?}", schemas.len());
    Ok(schemas)
}

/// Lists the tables of `schema`, in catalog order.
///
/// An unknown schema yields an empty list, not an error.
pub fn list_tables(session: &Session, schema: &str) -> UploaderResult<Vec<String>> {
    const QUERY: &str = "SELECT table_name, table_schema \
                         FROM information_schema.tables \
                         WHERE table_catalog = ? AND table_schema = ?";
    debug!("fn list_tables()\nschema: {schema}");

    let mut statement = session
        .connection()
        .prepare(QUERY)
        .map_err(catalog_unavailable)?;

    let tables = statement
        .query_map(params![session.database(), schema], |row| {
            row.get::<_, String>(0)
        })
        .map_err(catalog_unavailable)?
        .collect::<Result<Vec<String>, _>>()
        .map_err(catalog_unavailable)?;

    debug!("Schema '{schema}' has {} tables", tables.len());
    Ok(tables)
}

fn catalog_unavailable(error: duckdb::Error) -> UploaderError {
    UploaderError::CatalogUnavailable(error.to_string())
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//
