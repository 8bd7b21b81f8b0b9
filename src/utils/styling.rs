//! Terminal styling utilities

use console::{style, Emoji};
use std::path::Path;

use crate::pipeline::{CsvEncoding, IdRule};

// Emoji icons with fallbacks for terminals that don't support them
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[*] ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[!] ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", ">> ");
pub static FOLDER: Emoji<'_, '_> = Emoji("📂 ", "");
pub static MAP: Emoji<'_, '_> = Emoji("🗺️  ", "");
pub static SAVE: Emoji<'_, '_> = Emoji("💾 ", "");
pub static KEY: Emoji<'_, '_> = Emoji("🔑 ", "");

/// Print the application banner
pub fn print_banner(version: &str) {
    let banner = r#"
    ┏━┓┏━╸┏━┓┏━╸╻ ╻┏┳┓┏━┓┏━┓
    ┣┳┛┣╸ ┣━┫┃  ┣━┫┃┃┃┣━┫┣━┛
    ╹┗╸┗━╸╹ ╹┗━╸╹ ╹╹ ╹╹ ╹╹
    "#;

    println!();
    println!("{}", style(banner).cyan().bold());
    println!(
        "    {}",
        style("Impressions, sites and reach in one pass").dim()
    );
    println!("    {}", style(format!("v{}", version)).dim());
    println!("    {}", style("━".repeat(50)).dim());
    println!();
}

/// Print configuration card
pub fn print_config(input: &Path, reference: &Path, output: &Path, encoding: CsvEncoding, id_rule: IdRule) {
    let box_width = 56;
    let line = "─".repeat(box_width - 2);

    println!("    ┌{}┐", line);
    println!(
        "    │ {}{}│",
        style("⚙️  Configuration").cyan().bold(),
        " ".repeat(box_width - 20)
    );
    println!("    ├{}┤", line);
    println!("    │  {} Input:     {:<36}│", FOLDER, truncate_path(input, 35));
    println!("    │  {} Sites:     {:<36}│", MAP, truncate_path(reference, 35));
    println!("    │  {} Output:    {:<36}│", SAVE, truncate_path(output, 35));
    println!("    ├{}┤", line);
    println!(
        "    │  {} Encoding:  {:<36}│",
        KEY,
        style(encoding.to_string()).yellow()
    );
    println!(
        "    │  {} Id rule:   {:<36}│",
        KEY,
        style(id_rule.to_string()).yellow()
    );
    println!("    └{}┘", line);
    println!();
}

/// Print a step header with styling
pub fn print_step_header(step_num: u8, title: &str) {
    println!();
    println!(
        "    {} {} {}",
        style(format!("STEP {}", step_num)).cyan().bold(),
        style("│").dim(),
        style(title).white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("    {} {}", style("✓").green().bold(), style(message).green());
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("    {} {}", INFO, message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("    {} {}", WARN, style(message).yellow());
}

/// Print elapsed time of a step
pub fn print_step_time(elapsed: std::time::Duration) {
    println!(
        "    {}",
        style(format!("({:.2}s)", elapsed.as_secs_f64())).dim()
    );
}

/// Print the final completion message
pub fn print_completion() {
    println!();
    println!(
        "    {} {}",
        ROCKET,
        style("Reachmap processing complete!").green().bold()
    );
    println!();
}

/// Print a styled count message
pub fn print_count(description: &str, count: usize, detail: Option<&str>) {
    if let Some(info) = detail {
        println!(
            "      Found {} {} {}",
            style(count).yellow().bold(),
            description,
            style(info).dim()
        );
    } else {
        println!("      Found {} {}", style(count).yellow().bold(), description);
    }
}

// Helper functions

fn truncate_path(path: &Path, max_len: usize) -> String {
    let path_str = path.display().to_string();
    truncate_string(&path_str, max_len)
}

/// Keep the tail of a string that is longer than `max_len` characters.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_len {
        s.to_string()
    } else {
        let tail: String = chars[chars.len() - (max_len - 3)..].iter().collect();
        format!("...{}", tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_string_keeps_tail() {
        assert_eq!(truncate_string("short", 10), "short");
        assert_eq!(truncate_string("/very/long/path/data.csv", 12), ".../data.csv");
    }

    #[test]
    fn test_truncate_string_multibyte() {
        assert_eq!(truncate_string("São Paulo São Paulo", 8), "...Paulo");
    }
}
