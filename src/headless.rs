//! Command-line mode: list the catalog or upload one file, without a window.

use crate::{
    Arguments, CsvOptions, Database, UploadError, UploadOutcome, UploadTarget, UploaderError,
    UploaderResult, list_schemas, list_tables, upload,
};

use std::{fs, io::Write};

/// Writes every schema of the database with its tables, one schema per block.
pub fn write_catalog(database: &Database, out: &mut impl Write) -> UploaderResult<()> {
    let session = database.session()?;
    let mut schemas = list_schemas(&session)?;
    schemas.sort();

    for schema in schemas {
        writeln!(out, "{schema}")?;
        for table in list_tables(&session, &schema)? {
            writeln!(out, "  {table}")?;
        }
    }
    Ok(())
}

/// Uploads `args.file` into `args.schema`.`args.table`.
///
/// An unreadable file is reported as a parse failure, like any other bad input.
pub fn upload_file(database: &Database, args: &Arguments) -> UploaderResult<UploadOutcome> {
    let (Some(schema), Some(table)) = (&args.schema, &args.table) else {
        return Err(UploaderError::InvalidArgument {
            arg_name: "--file".to_string(),
            reason: "a destination --schema and --table are required".to_string(),
        });
    };

    let options = CsvOptions::new(args)?;
    let target = UploadTarget::new(schema.as_str(), table.as_str());

    let bytes = match &args.file {
        Some(path) => match fs::read(path) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                let message = format!("{}: {err}", path.display());
                return Ok(UploadOutcome::Failed(UploadError::Parse(message)));
            }
        },
        None => None,
    };

    let mut session = match database.session() {
        Ok(session) => session,
        Err(err) => return Ok(UploadOutcome::Failed(UploadError::Connectivity(err.to_string()))),
    };

    Ok(upload(&mut session, &target, bytes.as_deref(), &options))
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//

#[cfg(test)]
mod tests_headless {
    use super::*;
    use clap::Parser;
    use std::path::Path;
    use tempfile::NamedTempFile;

    fn database_with_orders() -> UploaderResult<Database> {
        let database = Database::open_in_memory()?;
        database.session()?.connection().execute_batch(
            "CREATE SCHEMA sales;
             CREATE TABLE sales.orders (id INTEGER, amount DOUBLE);
             CREATE TABLE main.notes (body VARCHAR);",
        )?;
        Ok(database)
    }

    fn args_for(file: &Path) -> Arguments {
        let file = file.to_string_lossy().to_string();
        Arguments::parse_from([
            "csv-uploader",
            "-s",
            "sales",
            "-t",
            "orders",
            "-f",
            file.as_str(),
            ":memory:",
        ])
    }

    #[test]
    fn writes_catalog_sorted_by_schema() -> UploaderResult<()> {
        let database = database_with_orders()?;
        let mut out = Vec::new();
        write_catalog(&database, &mut out)?;

        let text = String::from_utf8_lossy(&out);
        assert_eq!(text, "main\n  notes\nsales\n  orders\n");
        Ok(())
    }

    #[test]
    fn uploads_a_file_from_disk() -> UploaderResult<()> {
        let database = database_with_orders()?;
        let mut file = NamedTempFile::new()?;
        file.write_all(b"id,amount\n1,9.5\n2,10.25\n")?;
        file.flush()?;

        let outcome = upload_file(&database, &args_for(file.path()))?;
        assert_eq!(
            outcome.to_string(),
            "Your upload was a success. You uploaded 2 rows."
        );
        Ok(())
    }

    #[test]
    fn missing_file_is_a_failed_upload() -> UploaderResult<()> {
        let database = database_with_orders()?;
        let dir = tempfile::tempdir()?;

        let outcome = upload_file(&database, &args_for(&dir.path().join("absent.csv")))?;
        assert!(matches!(
            outcome,
            UploadOutcome::Failed(UploadError::Parse(_))
        ));
        Ok(())
    }
}
