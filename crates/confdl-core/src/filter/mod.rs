//! Session filters.
//!
//! A run selects sessions with exactly one [`FilterCriterion`]. Every value of
//! the criterion is matched against the whole catalog in turn and the hits are
//! appended, so a session matching two values shows up twice.

mod matcher;

use std::fmt;

use crate::catalog::{Catalog, SessionRecord};
use matcher::ValueMatcher;

/// The single active filter of a run, with its values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterCriterion {
    /// Session codes; `*` and `?` wildcards, case-insensitive.
    ByCode(Vec<String>),
    /// Regular expression matched against the title.
    ByTitle(String),
    ByTopic(Vec<String>),
    /// Exact session levels (100, 200, 300, 400).
    ByLevel(Vec<u32>),
    ByProduct(Vec<String>),
    BySpeakerName(Vec<String>),
    BySpeakerCompany(Vec<String>),
}

impl FilterCriterion {
    /// Name of the session field this criterion inspects.
    pub fn field_name(&self) -> &'static str {
        match self {
            FilterCriterion::ByCode(_) => "session code",
            FilterCriterion::ByTitle(_) => "title",
            FilterCriterion::ByTopic(_) => "topic",
            FilterCriterion::ByLevel(_) => "level",
            FilterCriterion::ByProduct(_) => "product",
            FilterCriterion::BySpeakerName(_) => "speaker name",
            FilterCriterion::BySpeakerCompany(_) => "speaker company",
        }
    }
}

impl fmt::Display for FilterCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values = match self {
            FilterCriterion::ByTitle(pattern) => pattern.clone(),
            FilterCriterion::ByLevel(levels) => levels
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(", "),
            FilterCriterion::ByCode(values)
            | FilterCriterion::ByTopic(values)
            | FilterCriterion::ByProduct(values)
            | FilterCriterion::BySpeakerName(values)
            | FilterCriterion::BySpeakerCompany(values) => values.join(", "),
        };
        write!(f, "{} matching [{}]", self.field_name(), values)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("invalid filter pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Select sessions matching `criterion`, in criterion-value order then catalog order.
///
/// Duplicates are kept: the result length is the sum of the per-value match
/// counts. An empty result is not an error.
pub fn filter_sessions<'a>(
    catalog: &'a Catalog,
    criterion: &FilterCriterion,
) -> Result<Vec<&'a SessionRecord>, FilterError> {
    let matchers = ValueMatcher::compile(criterion)?;
    let mut matched = Vec::new();
    for m in &matchers {
        matched.extend(catalog.iter().filter(|s| m.matches(s)));
    }
    tracing::debug!(
        filter = %criterion,
        catalog = catalog.len(),
        matched = matched.len(),
        "filter applied"
    );
    Ok(matched)
}
