//! Reachmap CLI
//!
//! Loads an impressions export and the site table, joins them, prints the
//! reach breakdowns and writes the download artifacts.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;

use reachmap::cli::{prompt_target_selection, run_convert, Cli, Commands};
use reachmap::pipeline::{
    compose, load_reference, load_table, DatasetStats, Pipeline, ProcessedUpload, TransformOutput,
};
use reachmap::report::{
    bundle_reports, display_breakdowns, display_composition, encode_table, stats_to_json,
    to_csv_bytes, to_xlsx_bytes, OutputFormat, RunSummary, SHEET_NAME,
};
use reachmap::utils::{
    create_spinner, finish_with_success, finish_with_warning, print_banner, print_completion,
    print_config, print_count, print_info, print_step_header, print_step_time, print_success,
    print_warning,
};

/// What the transform step produced.
enum Upload {
    SitesOnly(TransformOutput),
    Full(Box<ProcessedUpload>),
}

use Upload::{Full, SitesOnly};

impl Upload {
    fn output(&self) -> &TransformOutput {
        match self {
            SitesOnly(output) => output,
            Full(processed) => &processed.output,
        }
    }
}

/// File name used for format dispatch and error messages.
fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(command) = &cli.command {
        return match command {
            Commands::Convert {
                input,
                output,
                encoding,
            } => run_convert(input, output.as_deref(), *encoding),
        };
    }

    let input = cli.input().ok_or_else(|| {
        anyhow::anyhow!("Input file is required. Use -i/--input to specify a file.")
    })?;
    let output_path = cli
        .output_path()
        .ok_or_else(|| anyhow::anyhow!("Could not derive an output path"))?;
    let output_format = OutputFormat::from_path(&output_path)?;

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(input, &cli.reference, &output_path, cli.encoding, cli.id_rule);

    // Step 1: Load the export and the site table
    print_step_header(1, "Load Files");
    let step_start = Instant::now();
    let spinner = create_spinner("Reading input files...");

    let input_bytes = std::fs::read(input)
        .with_context(|| format!("Failed to read input file: {}", input.display()))?;
    let raw = load_table(&input_bytes, &file_name(input), &cli.load_options())
        .with_context(|| format!("Failed to load dataset: {}", input.display()))?;

    let reference_bytes = std::fs::read(&cli.reference).with_context(|| {
        format!("Failed to read site reference table: {}", cli.reference.display())
    })?;
    let reference = load_reference(&reference_bytes, &file_name(&cli.reference))
        .with_context(|| format!("Failed to load site reference table: {}", cli.reference.display()))?;
    finish_with_success(&spinner, "Files loaded");

    let dataset = DatasetStats::of(&raw);
    println!("\n    {} Dataset Statistics:", style("✧").cyan());
    println!("      Rows: {}", dataset.rows);
    println!("      Columns: {}", dataset.columns);
    println!("      Estimated memory: {:.2} MB", dataset.memory_mb);
    println!("      Reference sites: {}", reference.height());

    let load_elapsed = step_start.elapsed();
    print_step_time(load_elapsed);

    // Step 2: Transform and aggregate
    print_step_header(2, "Join Sites and Aggregate Reach");
    let step_start = Instant::now();
    let pipeline = Pipeline::new(reference, cli.transform_options());

    let mut upload = if cli.sites_only {
        let spinner = create_spinner("Joining sites...");
        let output = pipeline.transform(&raw)?;
        finish_with_success(&spinner, "Sites joined");
        SitesOnly(output)
    } else {
        let spinner = create_spinner("Joining sites and computing breakdowns...");
        let processed = pipeline
            .process(&raw, cli.target_selection().as_ref())
            .context("Processing failed (files without a totals row can be joined with --sites-only)")?;
        finish_with_success(&spinner, "Sites joined and breakdowns computed");
        Full(Box::new(processed))
    };

    if let Full(processed) = &mut upload {
        match &processed.period {
            Some(period) => print_info(&format!("Period: {} to {}", period.start, period.end)),
            None => print_info("No start_date/end_date columns; period unavailable"),
        }
        print_info(&format!("Detected {}", processed.output.convention));

        if processed.composition.is_none() && !cli.no_confirm {
            if let Some(selection) = prompt_target_selection(&processed.breakdowns)? {
                processed.composition = Some(compose(&processed.breakdowns, &selection)?);
            }
        }
    }

    let output = upload.output();
    print_count("location row(s)", output.stats.location_rows, None);
    if output.stats.location_rows == 0 {
        print_warning("No location rows found in this file; the site table is empty");
    } else if output.stats.unmatched_rows > 0 {
        print_warning(&format!(
            "{} location row(s) found no site and were dropped",
            output.stats.unmatched_rows
        ));
    } else {
        print_success("Every location row matched a site");
    }

    if cli.preview_rows > 0 && output.table.height() > 0 {
        println!();
        println!("{}", output.table.head(Some(cli.preview_rows)));
    }

    let transform_elapsed = step_start.elapsed();
    print_step_time(transform_elapsed);

    // Step 3: Write artifacts
    print_step_header(3, "Save Results");
    let step_start = Instant::now();

    let spinner = create_spinner("Writing site table...");
    let table_bytes = encode_table(&output.table, output_format)?;
    std::fs::write(&output_path, &table_bytes)
        .with_context(|| format!("Failed to write output file: {}", output_path.display()))?;
    finish_with_success(&spinner, &format!("Saved to {}", output_path.display()));

    if let Some(series_path) = &cli.date_series {
        let spinner = create_spinner("Writing date series...");
        let series = pipeline.date_series(&raw)?;
        if series.height() == 0 {
            finish_with_warning(&spinner, "No date-series rows in this file");
        } else {
            let bytes = encode_table(&series, OutputFormat::from_path(series_path)?)?;
            std::fs::write(series_path, bytes)
                .with_context(|| format!("Failed to write date series: {}", series_path.display()))?;
            finish_with_success(&spinner, &format!("Saved to {}", series_path.display()));
        }
    }

    let stats_json = match &upload {
        Full(processed) => Some(stats_to_json(
            processed,
            &input.display().to_string(),
            &cli.id_rule.to_string(),
        )?),
        SitesOnly(_) => None,
    };

    if let (Some(stats_path), Some(json)) = (&cli.stats_output, &stats_json) {
        std::fs::write(stats_path, json)
            .with_context(|| format!("Failed to write statistics: {}", stats_path.display()))?;
        print_success(&format!("Statistics saved to {}", stats_path.display()));
    }

    if let Some(bundle_path) = &cli.bundle {
        let spinner = create_spinner("Packaging reports...");
        let csv = to_csv_bytes(&output.table)?;
        let xlsx = to_xlsx_bytes(&output.table, SHEET_NAME)?;
        let mut entries: Vec<(&str, &[u8])> = vec![("sites.csv", csv.as_slice()), ("sites.xlsx", xlsx.as_slice())];
        if let Some(json) = &stats_json {
            entries.push(("reach_statistics.json", json.as_slice()));
        }
        let archive = bundle_reports(&entries)?;
        std::fs::write(bundle_path, archive)
            .with_context(|| format!("Failed to write bundle: {}", bundle_path.display()))?;
        finish_with_success(&spinner, &format!("Bundle saved to {}", bundle_path.display()));
    }

    let export_elapsed = step_start.elapsed();
    print_step_time(export_elapsed);

    // Summary
    let mut summary = RunSummary::new(output.stats.clone());
    summary.dataset = Some(dataset);
    summary.set_load_time(load_elapsed);
    summary.set_transform_time(transform_elapsed);
    summary.set_export_time(export_elapsed);

    if let Full(processed) = &upload {
        summary.kinds = Some(processed.kinds.clone());
        summary.totals = Some(processed.breakdowns.totals);
    }
    summary.display();

    if let Full(processed) = &upload {
        let breakdowns = &processed.breakdowns;
        display_breakdowns(&[&breakdowns.social_class, &breakdowns.gender, &breakdowns.age]);
        if let Some(composition) = &processed.composition {
            display_composition(composition);
        }
    }

    print_completion();

    Ok(())
}
