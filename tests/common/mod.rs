//! Shared test utilities and fixture generators
#![allow(dead_code)]

use polars::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

use reachmap::pipeline::{load_reference, load_table, LoadOptions};

/// Header of a convention A export, plus the reporting period columns.
pub const HEADER_A: &str = "location_id,class,gender_group,country,date,age_group,impression_hour,num_total_impressions,home,impressions,uniques,start_date,end_date";

/// Header of a convention B export, plus the reporting period columns.
pub const HEADER_B: &str = "location_id,social_class,gender,nationality,date,age,impression_hour,num_total_impressions,residence_name,impressions,uniques,start_date,end_date";

/// One export line in the shared column layout; the remaining control
/// columns and the period columns stay empty.
pub fn line(location: &str, class: &str, gender: &str, date: &str, age: &str, impressions: &str, uniques: &str) -> String {
    format!(
        "{},{},{},,{},{},,,,{},{},,",
        location, class, gender, date, age, impressions, uniques
    )
}

/// Convention A export mixing every record kind.
///
/// - totals: 60 uniques, 6000 impressions, January 2024
/// - locations: LOC00456 (300/50), LOC00123 (100/20), LOC99999 (50/10, no site)
/// - classes: A 10, B 20, C 30
/// - gender/age: F/20 12, F/30 18, M/20 30
/// - date series: three (site, day) rows
/// - one row with both a site and a class, which is no known kind
pub fn raw_csv() -> String {
    let lines = vec![
        HEADER_A.to_string(),
        ",,,,,,,,,6000,60,2024-01-01,2024-01-31".to_string(),
        line("LOC00123", "", "", "", "", "100", "20"),
        line("LOC00456", "", "", "", "", "300", "50"),
        line("LOC99999", "", "", "", "", "50", "10"),
        line("", "A", "", "", "", "1000", "10"),
        line("", "B", "", "", "", "2000", "20"),
        line("", "C", "", "", "", "3000", "30"),
        line("", "", "F", "", "20", "1200", "12"),
        line("", "", "F", "", "30", "1800", "18"),
        line("", "", "M", "", "20", "3000", "30"),
        line("LOC00123", "", "", "2024-01-02", "", "40", "10"),
        line("LOC00123", "", "", "2024-01-01", "", "60", "12"),
        line("LOC00456", "", "", "2024-01-01", "", "300", "50"),
        line("LOC00123", "A", "", "", "", "5", "1"),
    ];
    lines.join("\n") + "\n"
}

/// Convention B export with a totals row, one site and one class.
pub fn raw_csv_b() -> String {
    let lines = vec![
        HEADER_B.to_string(),
        ",,,,,,,,,500,100,,".to_string(),
        line("SITE-00123", "", "", "", "", "90", "30"),
        line("", "B1", "", "", "", "100", "25"),
        line("", "", "M", "", "40", "100", "40"),
    ];
    lines.join("\n") + "\n"
}

/// Convention A export without the `home` column, so neither convention is
/// complete. Carries a totals row and one matching site.
pub fn raw_csv_without_home() -> String {
    let header = HEADER_A.replace(",home", "");
    format!(
        "{}\n,,,,,,,,6000,60,2024-01-01,2024-01-31\nLOC00123,,,,,,,,100,20,,\n",
        header
    )
}

/// Convention A export whose only location-like rows are gone: just totals.
pub fn raw_csv_totals_only() -> String {
    format!("{}\n,,,,,,,,,6000,60,2024-01-01,2024-01-31\n", HEADER_A)
}

/// Site table as Latin-1 bytes ("Rebouças" carries a 0xE7 byte).
pub fn reference_bytes() -> Vec<u8> {
    let mut bytes = b"id,name,latitude,longitude\n00123,Paulista,-23.5,-46.6\n00456,Rebou".to_vec();
    bytes.push(0xE7);
    bytes.extend_from_slice(b"as,-23.56,-46.67\n");
    bytes
}

/// The convention A fixture loaded the way the binary loads it.
pub fn raw_fixture() -> DataFrame {
    load_table(raw_csv().as_bytes(), "raw.csv", &LoadOptions::default()).unwrap()
}

/// The site fixture after `load_reference`.
pub fn reference_fixture() -> DataFrame {
    load_reference(&reference_bytes(), "sites.csv").unwrap()
}

/// Write the export and site fixtures into a temporary directory.
pub fn write_fixture_files() -> (TempDir, PathBuf, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let raw_path = temp_dir.path().join("raw.csv");
    let reference_path = temp_dir.path().join("sites.csv");

    std::fs::write(&raw_path, raw_csv()).unwrap();
    std::fs::write(&reference_path, reference_bytes()).unwrap();

    (temp_dir, raw_path, reference_path)
}

/// Create a temporary directory with a Parquet copy of a DataFrame
pub fn create_temp_parquet(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let parquet_path = temp_dir.path().join("raw.parquet");

    let file = std::fs::File::create(&parquet_path).unwrap();
    ParquetWriter::new(file).finish(df).unwrap();

    (temp_dir, parquet_path)
}

/// Assert that a DataFrame has expected shape
pub fn assert_shape(df: &DataFrame, expected_rows: usize, expected_cols: usize) {
    let (rows, cols) = df.shape();
    assert_eq!(rows, expected_rows, "Row count mismatch: expected {}, got {}", expected_rows, rows);
    assert_eq!(cols, expected_cols, "Column count mismatch: expected {}, got {}", expected_cols, cols);
}

/// Assert that a DataFrame has exactly these columns, in order
pub fn assert_columns(df: &DataFrame, expected_cols: &[&str]) {
    let actual_cols: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    assert_eq!(actual_cols, expected_cols, "Column mismatch");
}

/// Text values of a column
pub fn str_values(df: &DataFrame, name: &str) -> Vec<Option<String>> {
    df.column(name)
        .unwrap()
        .cast(&DataType::String)
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect()
}

/// Float values of a column
pub fn f64_column(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
    df.column(name)
        .unwrap()
        .cast(&DataType::Float64)
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .collect()
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {}, got {}",
        expected,
        actual
    );
}
