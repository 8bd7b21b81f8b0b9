//! Command-line argument definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::pipeline::{CsvEncoding, IdRule, LoadOptions, TargetSelection, TransformOptions};

/// Reachmap - Merge an impressions export with the site table and report reach breakdowns
#[derive(Parser, Debug)]
#[command(name = "reachmap")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Impressions dataset (CSV or Parquet)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Site reference table (CSV with id, latitude, longitude; read as Latin-1)
    #[arg(short, long, default_value = "sites.csv")]
    pub reference: PathBuf,

    /// Output file for the joined site table (CSV, XLSX or Parquet, by extension).
    /// Defaults to the input directory with a '_processed.csv' suffix.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Character encoding of CSV input: "auto" (UTF-8, falling back to Latin-1), "utf8" or "latin1"
    #[arg(long, default_value = "auto", value_parser = parse_encoding)]
    pub encoding: CsvEncoding,

    /// How site codes are turned into join keys.
    /// "first-run" takes the first run of digits; "five-digit" joins all digit
    /// runs and keeps the result only when it is exactly five digits long.
    #[arg(long, default_value = "first-run", value_parser = parse_id_rule)]
    pub id_rule: IdRule,

    /// Target social classes (comma-separated codes)
    #[arg(long, value_delimiter = ',')]
    pub classes: Vec<String>,

    /// Target genders (comma-separated codes or labels, e.g. F,M or Feminino)
    #[arg(long, value_delimiter = ',')]
    pub genders: Vec<String>,

    /// Target age buckets (comma-separated codes or labels, e.g. 20,30 or 20-29)
    #[arg(long, value_delimiter = ',')]
    pub ages: Vec<String>,

    /// Write breakdowns, join counts and composition as JSON to this path
    #[arg(long, conflicts_with = "sites_only")]
    pub stats_output: Option<PathBuf>,

    /// Write a zip with the site table (CSV and XLSX) and the JSON statistics
    #[arg(long)]
    pub bundle: Option<PathBuf>,

    /// Write the per-day site series (CSV, XLSX or Parquet) to this path
    #[arg(long)]
    pub date_series: Option<PathBuf>,

    /// Only join sites; skip the reach breakdowns (files without a totals row)
    #[arg(long, default_value = "false")]
    pub sites_only: bool,

    /// Number of joined rows to preview in the terminal
    #[arg(long, default_value = "5")]
    pub preview_rows: usize,

    /// Skip interactive prompts
    #[arg(long, default_value = "false")]
    pub no_confirm: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert a CSV impressions export to Parquet
    Convert {
        /// Input CSV file
        input: PathBuf,

        /// Output file path (optional, defaults to input with .parquet extension)
        output: Option<PathBuf>,

        /// Character encoding of the CSV: "auto", "utf8" or "latin1"
        #[arg(long, default_value = "auto", value_parser = parse_encoding)]
        encoding: CsvEncoding,
    },
}

impl Cli {
    pub fn input(&self) -> Option<&PathBuf> {
        self.input.as_ref()
    }

    /// Get the output path, deriving it from the input if not explicitly provided.
    pub fn output_path(&self) -> Option<PathBuf> {
        let input = self.input.as_ref()?;
        Some(self.output.clone().unwrap_or_else(|| {
            let parent = input.parent().unwrap_or_else(|| std::path::Path::new("."));
            let stem = input
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("output");
            parent.join(format!("{}_processed.csv", stem))
        }))
    }

    /// Target selection from the command line, if any dimension was given.
    pub fn target_selection(&self) -> Option<TargetSelection> {
        if self.classes.is_empty() && self.genders.is_empty() && self.ages.is_empty() {
            return None;
        }
        Some(TargetSelection {
            social_classes: self.classes.clone(),
            genders: self.genders.clone(),
            ages: self.ages.clone(),
        })
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            encoding: self.encoding,
        }
    }

    pub fn transform_options(&self) -> TransformOptions {
        TransformOptions {
            id_rule: self.id_rule,
        }
    }
}

fn parse_encoding(s: &str) -> Result<CsvEncoding, String> {
    s.parse()
}

fn parse_id_rule(s: &str) -> Result<IdRule, String> {
    s.parse()
}
