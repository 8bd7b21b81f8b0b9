//! CSV to Parquet conversion for impressions exports

use std::path::Path;

use anyhow::{Context, Result};
use console::style;

use crate::pipeline::{load_table, CsvEncoding, DatasetStats, LoadOptions};
use crate::report::to_parquet_bytes;
use crate::utils::create_spinner;

/// Default output path: the input with a `.parquet` extension.
pub fn default_parquet_path(input: &Path) -> std::path::PathBuf {
    let parent = input.parent().unwrap_or_else(|| Path::new("."));
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    parent.join(format!("{}.parquet", stem))
}

/// Convert a CSV export to Parquet.
///
/// The CSV is decoded under `encoding` and read with every column as text,
/// so identifiers keep their leading zeros in the Parquet file as well.
pub fn run_convert(input: &Path, output: Option<&Path>, encoding: CsvEncoding) -> Result<()> {
    let output_path = output
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| default_parquet_path(input));

    println!(
        "\n {} Converting CSV to Parquet",
        style("◆").cyan().bold()
    );
    println!("   Input:    {}", style(input.display()).dim());
    println!("   Output:   {}", style(output_path.display()).dim());
    println!("   Encoding: {}", style(encoding).dim());
    println!();

    let spinner = create_spinner("Reading CSV...");
    let bytes = std::fs::read(input)
        .with_context(|| format!("Failed to read CSV file: {}", input.display()))?;
    let file_name = input.display().to_string();
    let df = load_table(&bytes, &file_name, &LoadOptions { encoding })
        .with_context(|| format!("Failed to load CSV file: {}", input.display()))?;
    let stats = DatasetStats::of(&df);
    spinner.finish_with_message(format!(
        "{} CSV loaded ({} columns)",
        style("✓").green(),
        stats.columns
    ));

    let spinner = create_spinner("Writing Parquet...");
    let parquet = to_parquet_bytes(&df)?;
    std::fs::write(&output_path, &parquet)
        .with_context(|| format!("Failed to write Parquet file: {}", output_path.display()))?;
    spinner.finish_with_message(format!("{} Parquet written", style("✓").green()));

    let input_size = bytes.len() as f64 / (1024.0 * 1024.0);
    let output_size = parquet.len() as f64 / (1024.0 * 1024.0);

    println!();
    println!(
        "   {} rows × {} columns",
        style(stats.rows).yellow(),
        style(stats.columns).yellow()
    );
    println!("   {} File sizes:", style("✧").cyan());
    println!("      CSV:     {:.2} MB", input_size);
    println!("      Parquet: {:.2} MB", output_size);

    if output_size < input_size {
        let reduction = ((input_size - output_size) / input_size) * 100.0;
        println!(
            "      {}",
            style(format!("↓ {:.1}% smaller", reduction)).green()
        );
    }

    println!();
    println!(" {} Conversion complete!", style("✓").green().bold());

    Ok(())
}
