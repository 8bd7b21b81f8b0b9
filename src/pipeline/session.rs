//! One upload, processed end to end
//!
//! `Pipeline` holds the site table for the session; each upload runs through
//! `process` and either every derived view is produced or none is.

use polars::prelude::*;

use super::aggregate::{aggregate, ReachBreakdowns};
use super::composition::{compose, Composition, TargetSelection};
use super::convention::ColumnConvention;
use super::error::Result;
use super::period::{dataset_period, DatasetPeriod};
use super::selector::{classify_rows, count_kinds, RecordKind};
use super::transform::{column_names, date_series, transform, TransformOptions, TransformOutput};

/// Row counts per record kind in a raw upload.
#[derive(Debug, Clone, PartialEq)]
pub struct KindCounts {
    pub counts: Vec<(RecordKind, usize)>,
    pub unclassified: usize,
}

/// Everything derived from one upload.
#[derive(Debug, Clone)]
pub struct ProcessedUpload {
    pub period: Option<DatasetPeriod>,
    pub kinds: KindCounts,
    pub output: TransformOutput,
    pub breakdowns: ReachBreakdowns,
    pub composition: Option<Composition>,
}

/// Session-scoped pipeline over a fixed site reference table.
#[derive(Debug, Clone)]
pub struct Pipeline {
    reference: DataFrame,
    options: TransformOptions,
}

impl Pipeline {
    /// `reference` as returned by `load_reference` / `prepare_reference`.
    pub fn new(reference: DataFrame, options: TransformOptions) -> Self {
        Self { reference, options }
    }

    pub fn reference(&self) -> &DataFrame {
        &self.reference
    }

    pub fn options(&self) -> &TransformOptions {
        &self.options
    }

    /// Joined site table for one upload.
    pub fn transform(&self, raw: &DataFrame) -> Result<TransformOutput> {
        transform(raw, &self.reference, &self.options)
    }

    /// Per-day site rows for one upload.
    pub fn date_series(&self, raw: &DataFrame) -> Result<DataFrame> {
        date_series(raw, &self.options)
    }

    /// Record kind of every raw row, tallied.
    pub fn kind_counts(&self, raw: &DataFrame) -> Result<KindCounts> {
        let convention = ColumnConvention::resolve(&column_names(raw))?;
        let (counts, unclassified) = count_kinds(&classify_rows(raw, convention));
        Ok(KindCounts {
            counts,
            unclassified,
        })
    }

    /// Transform, breakdowns and (if a target is given) its composition.
    pub fn process(&self, raw: &DataFrame, selection: Option<&TargetSelection>) -> Result<ProcessedUpload> {
        let period = dataset_period(raw)?;
        let kinds = self.kind_counts(raw)?;
        let output = self.transform(raw)?;
        let breakdowns = aggregate(raw)?;
        let composition = selection
            .map(|selection| compose(&breakdowns, selection))
            .transpose()?;

        Ok(ProcessedUpload {
            period,
            kinds,
            output,
            breakdowns,
            composition,
        })
    }
}
