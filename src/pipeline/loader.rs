//! Dataset loader for CSV and Parquet uploads
//!
//! Both loaders work on in-memory bytes plus the original file name, so the
//! same code serves a file on disk and an upload buffer.

use std::borrow::Cow;
use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::str::FromStr;

use encoding_rs::{UTF_8, WINDOWS_1252};
use polars::prelude::*;

use super::error::{PipelineError, Result};

/// Columns the site reference table must provide.
pub const REFERENCE_ID: &str = "id";
pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";

/// Character encoding assumed for CSV input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CsvEncoding {
    /// UTF-8, falling back to Latin-1 when the bytes are not valid UTF-8.
    #[default]
    Auto,
    Utf8,
    Latin1,
}

impl fmt::Display for CsvEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CsvEncoding::Auto => write!(f, "auto"),
            CsvEncoding::Utf8 => write!(f, "utf-8"),
            CsvEncoding::Latin1 => write!(f, "latin-1"),
        }
    }
}

impl FromStr for CsvEncoding {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "auto" => Ok(CsvEncoding::Auto),
            "utf8" | "utf-8" => Ok(CsvEncoding::Utf8),
            "latin1" | "latin-1" | "iso-8859-1" | "windows-1252" | "cp1252" => {
                Ok(CsvEncoding::Latin1)
            }
            other => Err(format!(
                "Unknown encoding '{}'. Use 'auto', 'utf8' or 'latin1'",
                other
            )),
        }
    }
}

/// Options for loading an impressions dataset.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub encoding: CsvEncoding,
}

/// Shape and size of a loaded table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatasetStats {
    pub rows: usize,
    pub columns: usize,
    pub memory_mb: f64,
}

impl DatasetStats {
    pub fn of(df: &DataFrame) -> Self {
        let (rows, columns) = df.shape();
        Self {
            rows,
            columns,
            memory_mb: df.estimated_size() as f64 / (1024.0 * 1024.0),
        }
    }
}

/// Decode CSV bytes to text under the given encoding.
pub fn decode_csv_bytes<'a>(bytes: &'a [u8], encoding: CsvEncoding, file_name: &str) -> Result<Cow<'a, str>> {
    match encoding {
        CsvEncoding::Latin1 => Ok(WINDOWS_1252.decode_without_bom_handling(bytes).0),
        CsvEncoding::Utf8 => {
            let (text, had_errors) = UTF_8.decode_with_bom_removal(bytes);
            if had_errors {
                let message = std::str::from_utf8(bytes)
                    .err()
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "invalid byte sequence".to_string());
                return Err(PipelineError::Decode {
                    file: file_name.to_string(),
                    encoding: encoding.to_string(),
                    message,
                });
            }
            Ok(text)
        }
        CsvEncoding::Auto => match decode_csv_bytes(bytes, CsvEncoding::Utf8, file_name) {
            Ok(text) => Ok(text),
            Err(_) => decode_csv_bytes(bytes, CsvEncoding::Latin1, file_name),
        },
    }
}

/// Parse decoded CSV text, reading every column as text.
///
/// Identifiers such as "00123" keep their leading zeros; numeric columns are
/// cast where the pipeline needs them. Empty fields become null.
fn parse_csv_text(text: &str, file_name: &str, encoding: CsvEncoding) -> Result<DataFrame> {
    let cursor = Cursor::new(text.as_bytes().to_vec());
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(cursor)
        .finish()
        .map_err(|e| PipelineError::Decode {
            file: file_name.to_string(),
            encoding: encoding.to_string(),
            message: e.to_string(),
        })
}

fn file_extension(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Load an impressions table from uploaded bytes, dispatching on the extension.
pub fn load_table(bytes: &[u8], file_name: &str, options: &LoadOptions) -> Result<DataFrame> {
    match file_extension(file_name).as_str() {
        "csv" => {
            let text = decode_csv_bytes(bytes, options.encoding, file_name)?;
            parse_csv_text(&text, file_name, options.encoding)
        }
        "parquet" => ParquetReader::new(Cursor::new(bytes.to_vec()))
            .finish()
            .map_err(|e| PipelineError::Decode {
                file: file_name.to_string(),
                encoding: "parquet".to_string(),
                message: e.to_string(),
            }),
        other => Err(PipelineError::UnsupportedFormat(other.to_string())),
    }
}

/// Load the site reference table (always Latin-1 CSV).
///
/// Returns `location_id` (text), `latitude` and `longitude` (Float64).
pub fn load_reference(bytes: &[u8], file_name: &str) -> Result<DataFrame> {
    let text = decode_csv_bytes(bytes, CsvEncoding::Latin1, file_name)?;
    let df = parse_csv_text(&text, file_name, CsvEncoding::Latin1)?;
    prepare_reference(df)
}

/// Rename `id` to `location_id` and keep only the join columns.
pub fn prepare_reference(mut df: DataFrame) -> Result<DataFrame> {
    for required in [REFERENCE_ID, LATITUDE, LONGITUDE] {
        if df.column(required).is_err() {
            return Err(PipelineError::missing_column(required, "site reference table"));
        }
    }

    df.rename(REFERENCE_ID, "location_id".into())?;
    let mut df = df.select(["location_id", LATITUDE, LONGITUDE])?;

    let id = df.column("location_id")?.cast(&DataType::String)?;
    df.with_column(id)?;
    for coordinate in [LATITUDE, LONGITUDE] {
        let cast = df.column(coordinate)?.cast(&DataType::Float64)?;
        df.with_column(cast)?;
    }

    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latin1_decoding() {
        let bytes = b"name\nS\xe3o Paulo\n";
        let text = decode_csv_bytes(bytes, CsvEncoding::Latin1, "x.csv").unwrap();
        assert!(text.contains("São Paulo"));
    }

    #[test]
    fn test_strict_utf8_rejects_latin1_bytes() {
        let bytes = b"name\nS\xe3o Paulo\n";
        let err = decode_csv_bytes(bytes, CsvEncoding::Utf8, "x.csv").unwrap_err();
        assert!(matches!(err, PipelineError::Decode { .. }));
    }

    #[test]
    fn test_auto_falls_back_to_latin1() {
        let bytes = b"name\nS\xe3o Paulo\n";
        let text = decode_csv_bytes(bytes, CsvEncoding::Auto, "x.csv").unwrap();
        assert!(text.contains("São Paulo"));
    }

    #[test]
    fn test_encoding_parsing() {
        assert_eq!("UTF8".parse::<CsvEncoding>().unwrap(), CsvEncoding::Utf8);
        assert_eq!("iso_8859_1".parse::<CsvEncoding>().unwrap(), CsvEncoding::Latin1);
        assert!("ebcdic".parse::<CsvEncoding>().is_err());
    }

    #[test]
    fn test_csv_keeps_leading_zeros() {
        let df = load_table(b"location_id,impressions\n00123,10\n", "d.csv", &LoadOptions::default()).unwrap();
        let ids = df.column("location_id").unwrap().str().unwrap();
        assert_eq!(ids.get(0), Some("00123"));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load_table(b"", "data.xlsx", &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedFormat(ext) if ext == "xlsx"));
    }
}
