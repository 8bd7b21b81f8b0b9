//! Reachmap: impressions-to-sites library
//!
//! Selects the site rows of an advertising-impressions export, joins them with
//! a site reference table and derives reach breakdowns and target estimates.

pub mod cli;
pub mod pipeline;
pub mod report;
pub mod utils;
