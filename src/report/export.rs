//! Download artifacts built as in-memory buffers
//!
//! Nothing here touches the file system: every function returns the bytes a
//! caller can offer for download or write wherever it likes.

use std::io::{Cursor, Write};
use std::path::Path;

use chrono::Utc;
use polars::prelude::*;
use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;
use ::zip::write::SimpleFileOptions;
use ::zip::{CompressionMethod, ZipWriter};

use crate::pipeline::{
    Composition, DatasetPeriod, JoinStats, PipelineError, ProcessedUpload, ReachBreakdowns,
    Result,
};

/// Sheet name used for workbook exports.
pub const SHEET_NAME: &str = "dados";

/// Table formats a processed table can be exported to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Xlsx,
    Parquet,
}

impl OutputFormat {
    /// Format implied by a path's extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "xlsx" => Ok(OutputFormat::Xlsx),
            "parquet" => Ok(OutputFormat::Parquet),
            other => Err(PipelineError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Xlsx => "xlsx",
            OutputFormat::Parquet => "parquet",
        }
    }
}

/// Encode a table in the requested format.
pub fn encode_table(df: &DataFrame, format: OutputFormat) -> Result<Vec<u8>> {
    match format {
        OutputFormat::Csv => to_csv_bytes(df),
        OutputFormat::Xlsx => to_xlsx_bytes(df, SHEET_NAME),
        OutputFormat::Parquet => to_parquet_bytes(df),
    }
}

/// Comma-delimited UTF-8 CSV with a header row and no index column.
pub fn to_csv_bytes(df: &DataFrame) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut df = df.clone();
    CsvWriter::new(&mut buffer)
        .include_header(true)
        .with_separator(b',')
        .finish(&mut df)?;
    Ok(buffer)
}

/// Parquet file contents.
pub fn to_parquet_bytes(df: &DataFrame) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut df = df.clone();
    ParquetWriter::new(&mut buffer).finish(&mut df)?;
    Ok(buffer)
}

fn xlsx_error(e: rust_xlsxwriter::XlsxError) -> PipelineError {
    PipelineError::export("xlsx", e)
}

/// Single-sheet workbook with a bold header row.
///
/// Numeric columns are written as numbers, everything else as text; nulls and
/// non-finite values leave the cell empty.
pub fn to_xlsx_bytes(df: &DataFrame, sheet_name: &str) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name).map_err(xlsx_error)?;

    for (idx, column) in df.get_columns().iter().enumerate() {
        let col = u16::try_from(idx).map_err(|_| PipelineError::export("xlsx", "too many columns"))?;
        worksheet
            .write_string_with_format(0, col, column.name().as_str(), &header)
            .map_err(xlsx_error)?;

        if column.dtype().is_primitive_numeric() {
            let values = column.cast(&DataType::Float64)?;
            for (row, value) in values.f64()?.into_iter().enumerate() {
                if let Some(v) = value.filter(|v| v.is_finite()) {
                    worksheet
                        .write_number(row as u32 + 1, col, v)
                        .map_err(xlsx_error)?;
                }
            }
        } else {
            let values = column.cast(&DataType::String)?;
            for (row, value) in values.str()?.into_iter().enumerate() {
                if let Some(text) = value {
                    worksheet
                        .write_string(row as u32 + 1, col, text)
                        .map_err(xlsx_error)?;
                }
            }
        }
    }

    workbook.save_to_buffer().map_err(xlsx_error)
}

/// Metadata about the run that produced a statistics export.
#[derive(Serialize)]
pub struct ExportMetadata {
    /// Timestamp of the export (RFC 3339)
    pub timestamp: String,
    pub reachmap_version: String,
    pub input_file: String,
    /// Column convention detected in the input
    pub convention: String,
    pub id_rule: String,
}

/// Statistics of one processed upload, as written to JSON.
#[derive(Serialize)]
pub struct StatsExport<'a> {
    pub metadata: ExportMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<&'a DatasetPeriod>,
    pub join: &'a JoinStats,
    pub breakdowns: &'a ReachBreakdowns,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composition: Option<&'a Composition>,
}

/// Pretty-printed JSON with the join counts, breakdowns and composition.
pub fn stats_to_json(upload: &ProcessedUpload, input_file: &str, id_rule: &str) -> Result<Vec<u8>> {
    let export = StatsExport {
        metadata: ExportMetadata {
            timestamp: Utc::now().to_rfc3339(),
            reachmap_version: env!("CARGO_PKG_VERSION").to_string(),
            input_file: input_file.to_string(),
            convention: upload.output.convention.name.to_string(),
            id_rule: id_rule.to_string(),
        },
        period: upload.period.as_ref(),
        join: &upload.output.stats,
        breakdowns: &upload.breakdowns,
        composition: upload.composition.as_ref(),
    };

    serde_json::to_vec_pretty(&export).map_err(|e| PipelineError::export("json", e))
}

/// Zip archive holding `(file name, contents)` entries.
pub fn bundle_reports(entries: &[(&str, &[u8])]) -> Result<Vec<u8>> {
    let zip_error = |e: ::zip::result::ZipError| PipelineError::export("zip", e);

    let mut archive = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);

    for (name, contents) in entries {
        archive.start_file(*name, options).map_err(zip_error)?;
        archive
            .write_all(contents)
            .map_err(|e| PipelineError::export("zip", e))?;
    }

    let cursor = archive.finish().map_err(zip_error)?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_from_path() {
        assert_eq!(OutputFormat::from_path(Path::new("a/b.CSV")).unwrap(), OutputFormat::Csv);
        assert_eq!(OutputFormat::from_path(Path::new("b.xlsx")).unwrap(), OutputFormat::Xlsx);
        assert!(OutputFormat::from_path(Path::new("b.json")).is_err());
    }

    #[test]
    fn test_csv_bytes_have_header_and_no_index() {
        let df = df! {
            "location_id" => ["00123"],
            "impressions" => [100i64],
        }
        .unwrap();
        let text = String::from_utf8(to_csv_bytes(&df).unwrap()).unwrap();
        assert_eq!(text.lines().next(), Some("location_id,impressions"));
        assert_eq!(text.lines().nth(1), Some("00123,100"));
    }

    #[test]
    fn test_xlsx_bytes_are_a_zip_container() {
        let df = df! {
            "location_id" => ["1", "2"],
            "frequencia" => [Some(5.0f64), None],
        }
        .unwrap();
        let bytes = to_xlsx_bytes(&df, SHEET_NAME).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_bundle_contains_entries() {
        let bytes = bundle_reports(&[("a.csv", b"x\n1\n".as_slice()), ("b.json", b"{}".as_slice())]).unwrap();
        let archive = ::zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        assert!(names.contains(&"a.csv"));
        assert!(names.contains(&"b.json"));
    }
}
