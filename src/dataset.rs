use crate::{Arguments, UploaderError, UploaderResult};

use duckdb::types::Value;
use polars::prelude::*;
use std::io::Cursor;

// --- Constants ---

/// Values treated as null while parsing, as a comma-separated list.
/// The empty field plus the usual spellings of a missing value.
pub static NULL_VALUES: &str = r#""", #N/A, #N/A N/A, #NA, -1.#IND, -1.#QNAN, -NaN, -nan, 1.#IND, 1.#QNAN, <NA>, N/A, NA, NULL, NaN, None, n/a, nan, null"#;

/// Default delimiter used for CSV parsing.
pub static DEFAULT_CSV_DELIMITER: &str = ",";

/// Settings used to turn an uploaded byte stream into rows.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvOptions {
    /// The character used to separate columns.
    pub csv_delimiter: String,
    /// Comma-separated string of values to interpret as nulls.
    pub null_values: String,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions {
            csv_delimiter: DEFAULT_CSV_DELIMITER.to_string(),
            null_values: NULL_VALUES.to_string(),
        }
    }
}

impl CsvOptions {
    /// Builds the options from command-line `Arguments`.
    pub fn new(args: &Arguments) -> UploaderResult<Self> {
        let options = CsvOptions {
            csv_delimiter: args.delimiter.clone(),
            null_values: args.null_values.clone(),
        };
        // Reject a bad delimiter at startup rather than on the first upload.
        options.get_csv_separator()?;
        Ok(options)
    }

    /// Retrieves the separator byte from the `csv_delimiter` configuration.
    ///
    /// ### Returns
    /// `Ok(u8)` for a single-byte delimiter, or `Err(UploaderError::InvalidDelimiter)`
    /// if the string is empty or longer than one byte.
    pub fn get_csv_separator(&self) -> UploaderResult<u8> {
        match self.csv_delimiter.as_bytes() {
            [byte] => Ok(*byte),
            _ => Err(UploaderError::InvalidDelimiter(self.csv_delimiter.clone())),
        }
    }

    /// Parses the comma-separated `null_values` string into a `Vec<&str>`,
    /// removing surrounding double quotes if present.
    ///
    /// Example Input: `"\"\", \" \", <N/D>, NA "`
    /// Example Output: `vec!["", "", "<N/D>", "NA"]`
    pub fn parse_null_values(&self) -> Vec<&str> {
        self.null_values
            .split(',')
            .map(|s| {
                let trimmed = s.trim();
                if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
                    trimmed[1..trimmed.len() - 1].trim()
                } else {
                    trimmed
                }
            })
            .collect()
    }
}

/// Parses CSV bytes into a DataFrame.
///
/// The first line is the header; its names are kept exactly as written, since they
/// are matched against the destination table's columns later on.
/// Every column is read as text: `"007"` stays `"007"` and a late `2.5` in a column of
/// integers is kept, leaving the cast to the destination column type.
/// Empty input is an error. Missing fields and configured null markers become nulls.
pub fn read_csv_bytes(bytes: &[u8], options: &CsvOptions) -> UploaderResult<DataFrame> {
    let separator = options.get_csv_separator()?;

    let null_values: Vec<PlSmallStr> = options
        .parse_null_values()
        .into_iter()
        .map(PlSmallStr::from)
        .collect();

    let csv_parse_options = CsvParseOptions::default()
        .with_separator(separator)
        .with_missing_is_null(true)
        .with_null_values(Some(NullValues::AllColumns(null_values)));

    let df = CsvReadOptions::default()
        .with_parse_options(csv_parse_options)
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
        .finish()?;

    tracing::debug!("fn read_csv_bytes()\nshape: {:?}", df.shape());
    Ok(df)
}

/// Converts one DataFrame cell into a DuckDB parameter.
///
/// Types read from a CSV map directly; anything else is handed over as text and
/// left to the destination column type to cast.
pub fn to_duckdb_value(value: AnyValue<'_>) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Boolean(b),
        AnyValue::Int32(i) => Value::Int(i),
        AnyValue::Int64(i) => Value::BigInt(i),
        AnyValue::UInt32(u) => Value::UInt(u),
        AnyValue::UInt64(u) => Value::UBigInt(u),
        AnyValue::Float32(f) => Value::Float(f),
        AnyValue::Float64(f) => Value::Double(f),
        AnyValue::String(s) => Value::Text(s.to_string()),
        AnyValue::StringOwned(s) => Value::Text(s.to_string()),
        other => Value::Text(other.to_string()),
    }
}

/// Collects row `index` of `df` as DuckDB parameters, in column order.
pub fn row_values(df: &DataFrame, index: usize) -> UploaderResult<Vec<Value>> {
    df.columns()
        .iter()
        .map(|column| Ok(to_duckdb_value(column.get(index)?)))
        .collect()
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//

/// Run tests with:
/// cargo test -- --show-output tests_read_csv
#[cfg(test)]
mod tests_read_csv {
    use super::*;

    #[test]
    fn reads_header_and_rows_in_order() -> UploaderResult<()> {
        let csv = "a,b\n1,x\n2,y\n3,z\n";
        let df = read_csv_bytes(csv.as_bytes(), &CsvOptions::default())?;

        let expected = df!(
            "a" => &["1", "2", "3"],
            "b" => &["x", "y", "z"]
        )?;
        assert_eq!(df, expected);
        Ok(())
    }

    #[test]
    fn keeps_values_as_written() -> UploaderResult<()> {
        let mut csv = String::from("amount,code\n");
        for _ in 0..300 {
            csv.push_str("1,10\n");
        }
        csv.push_str("2.5,007\n");

        let df = read_csv_bytes(csv.as_bytes(), &CsvOptions::default())?;

        assert_eq!(df.height(), 301);
        assert_eq!(df.column("amount")?.dtype(), &DataType::String);
        assert_eq!(df.column("amount")?.get(300)?, AnyValue::String("2.5"));
        assert_eq!(df.column("code")?.get(300)?, AnyValue::String("007"));
        Ok(())
    }

    #[test]
    fn default_null_markers_become_nulls() -> UploaderResult<()> {
        let csv = "a,b\nNA,x\nN/A,NULL\nnull,NaN\n,keep\n";
        let df = read_csv_bytes(csv.as_bytes(), &CsvOptions::default())?;

        assert_eq!(df.column("a")?.null_count(), 4);
        assert_eq!(df.column("b")?.null_count(), 2);
        assert_eq!(df.column("b")?.get(3)?, AnyValue::String("keep"));
        Ok(())
    }

    #[test]
    fn header_only_yields_no_rows() -> UploaderResult<()> {
        let df = read_csv_bytes(b"a,b\n", &CsvOptions::default())?;
        assert_eq!(df.height(), 0);
        assert_eq!(df.get_column_names().iter().map(|name| name.as_str()).collect::<Vec<_>>(), ["a", "b"]);
        Ok(())
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(read_csv_bytes(b"", &CsvOptions::default()).is_err());
    }

    #[test]
    fn honours_delimiter_and_null_markers() -> UploaderResult<()> {
        let options = CsvOptions {
            csv_delimiter: ";".to_string(),
            null_values: r#""", NA"#.to_string(),
            ..Default::default()
        };
        let df = read_csv_bytes(b"id;name\n1;NA\n2;bob\n", &options)?;

        assert_eq!(df.shape(), (2, 2));
        assert_eq!(df.column("name")?.null_count(), 1);
        Ok(())
    }

    #[test]
    fn separator_must_be_a_single_byte() {
        let empty = CsvOptions {
            csv_delimiter: String::new(),
            ..Default::default()
        };
        let long = CsvOptions {
            csv_delimiter: ";;".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            empty.get_csv_separator(),
            Err(UploaderError::InvalidDelimiter(_))
        ));
        assert!(long.get_csv_separator().is_err());
    }

    #[test]
    fn parse_null_values_strips_quotes() {
        let options = CsvOptions {
            null_values: r#""", " ", <N/D>, NA "#.to_string(),
            ..Default::default()
        };
        assert_eq!(options.parse_null_values(), ["", "", "<N/D>", "NA"]);
    }

    #[test]
    fn cells_convert_to_duckdb_values() -> UploaderResult<()> {
        let df = df!(
            "i" => &[Some(7i64), None],
            "f" => &[1.5f64, 2.5],
            "s" => &["x", "y"],
            "b" => &[true, false]
        )?;

        assert_eq!(
            row_values(&df, 0)?,
            [
                Value::BigInt(7),
                Value::Double(1.5),
                Value::Text("x".to_string()),
                Value::Boolean(true)
            ]
        );
        assert_eq!(row_values(&df, 1)?[0], Value::Null);
        Ok(())
    }
}
