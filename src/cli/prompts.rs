//! Interactive prompts using dialoguer

use anyhow::Result;
use dialoguer::{Confirm, MultiSelect};

use crate::pipeline::{Breakdown, ReachBreakdowns, TargetSelection};

/// Prompt user to confirm proceeding with an action
pub fn confirm_step(message: &str) -> Result<bool> {
    let confirmed = Confirm::new()
        .with_prompt(message)
        .default(true)
        .interact()?;
    Ok(confirmed)
}

/// Let the user tick categories of one breakdown; returns their raw codes.
fn select_categories(breakdown: &Breakdown) -> Result<Vec<String>> {
    if breakdown.shares.is_empty() {
        return Ok(Vec::new());
    }

    let items: Vec<String> = breakdown
        .shares
        .iter()
        .map(|s| format!("{} ({:.2}%)", s.label, s.percentage))
        .collect();

    let chosen = MultiSelect::new()
        .with_prompt(format!("Target {} (space to toggle, enter to confirm)", breakdown.dimension))
        .items(&items)
        .interact()?;

    Ok(chosen
        .into_iter()
        .map(|idx| breakdown.shares[idx].category.clone())
        .collect())
}

/// Ask whether to compute a target composition and, if so, which categories.
pub fn prompt_target_selection(breakdowns: &ReachBreakdowns) -> Result<Option<TargetSelection>> {
    if !confirm_step("Compute a target composition?")? {
        return Ok(None);
    }

    Ok(Some(TargetSelection {
        social_classes: select_categories(&breakdowns.social_class)?,
        genders: select_categories(&breakdowns.gender)?,
        ages: select_categories(&breakdowns.age)?,
    }))
}
