//! Run summary and breakdown tables for the terminal

use std::time::Duration;

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use console::style;

use crate::pipeline::{Breakdown, Composition, DatasetStats, JoinStats, KindCounts, ReachTotals};

/// Number of unmatched identifiers listed before truncating.
const MAX_LISTED_IDS: usize = 10;

fn print_indented(table: &Table) {
    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}

fn print_section(icon: &str, title: &str) {
    println!();
    println!("    {} {}", style(icon).cyan(), style(title).white().bold());
    println!("    {}", style("─".repeat(50)).dim());
    println!();
}

/// Counts and timings of one run
#[derive(Debug, Default)]
pub struct RunSummary {
    pub dataset: Option<DatasetStats>,
    pub kinds: Option<KindCounts>,
    pub join: JoinStats,
    pub totals: Option<ReachTotals>,
    pub load_time: Option<Duration>,
    pub transform_time: Option<Duration>,
    pub export_time: Option<Duration>,
}

impl RunSummary {
    pub fn new(join: JoinStats) -> Self {
        Self {
            join,
            ..Default::default()
        }
    }

    pub fn set_load_time(&mut self, elapsed: Duration) {
        self.load_time = Some(elapsed);
    }

    pub fn set_transform_time(&mut self, elapsed: Duration) {
        self.transform_time = Some(elapsed);
    }

    pub fn set_export_time(&mut self, elapsed: Duration) {
        self.export_time = Some(elapsed);
    }

    /// Share of location rows that found a site, in percent.
    pub fn match_rate(&self) -> f64 {
        if self.join.location_rows == 0 {
            0.0
        } else {
            (self.join.location_rows - self.join.unmatched_rows) as f64
                / self.join.location_rows as f64
                * 100.0
        }
    }

    pub fn display(&self) {
        print_section("📋", "RUN SUMMARY");

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        if let Some(dataset) = &self.dataset {
            table.add_row(vec![
                Cell::new("📁 Raw rows"),
                Cell::new(dataset.rows),
            ]);
        }

        if let Some(kinds) = &self.kinds {
            for (kind, count) in &kinds.counts {
                table.add_row(vec![
                    Cell::new(format!("   {} rows", kind)),
                    Cell::new(count),
                ]);
            }
            table.add_row(vec![
                Cell::new("   unclassified rows"),
                Cell::new(kinds.unclassified).fg(Color::DarkGrey),
            ]);
        }

        table.add_row(vec![
            Cell::new("🗺️  Reference sites"),
            Cell::new(self.join.reference_rows),
        ]);
        table.add_row(vec![
            Cell::new("🗑️  Unmatched location rows"),
            Cell::new(self.join.unmatched_rows).fg(if self.join.unmatched_rows == 0 {
                Color::White
            } else {
                Color::Red
            }),
        ]);
        table.add_row(vec![
            Cell::new("✅ Joined rows"),
            Cell::new(self.join.joined_rows)
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
        ]);

        let rate = self.match_rate();
        let color = if rate >= 95.0 {
            Color::Green
        } else if rate >= 75.0 {
            Color::Yellow
        } else {
            Color::Red
        };
        table.add_row(vec![
            Cell::new("🔗 Match rate"),
            Cell::new(format!("{:.1}%", rate))
                .fg(color)
                .add_attribute(Attribute::Bold),
        ]);

        if let Some(totals) = &self.totals {
            table.add_row(vec![
                Cell::new("👥 Total reach"),
                Cell::new(format!("{:.0}", totals.reach)),
            ]);
            table.add_row(vec![
                Cell::new("📣 Total impacts"),
                Cell::new(format!("{:.0}", totals.impacts)),
            ]);
        }

        for (label, time) in [
            ("⏱️  Load", self.load_time),
            ("⏱️  Transform", self.transform_time),
            ("⏱️  Export", self.export_time),
        ] {
            if let Some(t) = time {
                table.add_row(vec![
                    Cell::new(label),
                    Cell::new(format!("{:.2}s", t.as_secs_f64())).fg(Color::DarkGrey),
                ]);
            }
        }

        print_indented(&table);

        if !self.join.unmatched_ids.is_empty() {
            println!();
            println!(
                "      {} {}:",
                style("Identifiers without a site").yellow(),
                style(format!("({})", self.join.unmatched_ids.len())).dim()
            );
            for id in self.join.unmatched_ids.iter().take(MAX_LISTED_IDS) {
                println!("        {} {}", style("•").dim(), id);
            }
            if self.join.unmatched_ids.len() > MAX_LISTED_IDS {
                println!(
                    "        {}",
                    style(format!(
                        "... and {} more",
                        self.join.unmatched_ids.len() - MAX_LISTED_IDS
                    ))
                    .dim()
                );
            }
        }
    }
}

/// Render one breakdown as a table of category, reach and percentage.
pub fn breakdown_table(breakdown: &Breakdown) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new(breakdown.dimension.to_string()).add_attribute(Attribute::Bold),
        Cell::new("Reach").add_attribute(Attribute::Bold),
        Cell::new("%").add_attribute(Attribute::Bold),
    ]);

    for share in &breakdown.shares {
        table.add_row(vec![
            Cell::new(&share.label),
            Cell::new(format!("{:.0}", share.uniques)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.2}%", share.percentage)).set_alignment(CellAlignment::Right),
        ]);
    }

    table
}

/// Print all three breakdowns.
pub fn display_breakdowns(breakdowns: &[&Breakdown]) {
    print_section("📊", "REACH BREAKDOWNS");

    for breakdown in breakdowns {
        if breakdown.shares.is_empty() {
            println!(
                "    {} no {} breakdown rows in this file",
                style("ℹ").cyan(),
                breakdown.dimension
            );
            continue;
        }
        print_indented(&breakdown_table(breakdown));
        println!();
    }
}

/// Print a target composition.
pub fn display_composition(composition: &Composition) {
    print_section("🎯", "TARGET COMPOSITION");

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.add_row(vec![
        Cell::new("Class share"),
        Cell::new(format!("{:.2}%", composition.class_share)),
    ]);
    table.add_row(vec![
        Cell::new("Gender share"),
        Cell::new(format!("{:.2}%", composition.gender_share)),
    ]);
    table.add_row(vec![
        Cell::new("Age share"),
        Cell::new(format!("{:.2}%", composition.age_share)),
    ]);
    table.add_row(vec![
        Cell::new("Composition").add_attribute(Attribute::Bold),
        Cell::new(format!("{:.2}%", composition.composition))
            .fg(Color::Green)
            .add_attribute(Attribute::Bold),
    ]);
    table.add_row(vec![
        Cell::new("Reach in target"),
        Cell::new(format!("{:.0}", composition.reach_in_target)),
    ]);
    table.add_row(vec![
        Cell::new("Impacts in target"),
        Cell::new(format!("{:.0}", composition.impacts_in_target)),
    ]);

    print_indented(&table);
    println!(
        "    {}",
        style("Shares are multiplied as if class, gender and age were independent.").dim()
    );
}
