//! Per-value matchers compiled from a filter criterion.

use glob::{MatchOptions, Pattern};
use regex::{Regex, RegexBuilder};

use super::{FilterCriterion, FilterError};
use crate::catalog::SessionRecord;

const CODE_MATCH: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// One compiled criterion value, bound to the field it inspects.
#[derive(Debug)]
pub(super) enum ValueMatcher {
    Code(Pattern),
    Title(Regex),
    Topic(Regex),
    Level(u32),
    Product(Regex),
    SpeakerName(Regex),
    SpeakerCompany(Regex),
}

fn wildcard(value: &str) -> Result<Pattern, FilterError> {
    Pattern::new(value.trim()).map_err(|e| FilterError::InvalidPattern {
        pattern: value.to_string(),
        reason: e.to_string(),
    })
}

fn regex(value: &str) -> Result<Regex, FilterError> {
    RegexBuilder::new(value)
        .case_insensitive(true)
        .build()
        .map_err(|e| FilterError::InvalidPattern {
            pattern: value.to_string(),
            reason: e.to_string(),
        })
}

fn compile_all<F>(values: &[String], f: F) -> Result<Vec<ValueMatcher>, FilterError>
where
    F: Fn(Regex) -> ValueMatcher,
{
    values.iter().map(|v| regex(v).map(&f)).collect()
}

impl ValueMatcher {
    /// One matcher per criterion value, in criterion order.
    pub(super) fn compile(criterion: &FilterCriterion) -> Result<Vec<Self>, FilterError> {
        match criterion {
            FilterCriterion::ByCode(codes) => codes
                .iter()
                .map(|c| wildcard(c).map(ValueMatcher::Code))
                .collect(),
            FilterCriterion::ByTitle(pattern) => Ok(vec![ValueMatcher::Title(regex(pattern)?)]),
            FilterCriterion::ByTopic(values) => compile_all(values, ValueMatcher::Topic),
            FilterCriterion::ByLevel(levels) => {
                Ok(levels.iter().copied().map(ValueMatcher::Level).collect())
            }
            FilterCriterion::ByProduct(values) => compile_all(values, ValueMatcher::Product),
            FilterCriterion::BySpeakerName(values) => {
                compile_all(values, ValueMatcher::SpeakerName)
            }
            FilterCriterion::BySpeakerCompany(values) => {
                compile_all(values, ValueMatcher::SpeakerCompany)
            }
        }
    }

    pub(super) fn matches(&self, session: &SessionRecord) -> bool {
        match self {
            ValueMatcher::Code(p) => p.matches_with(session.session_code.trim(), CODE_MATCH),
            ValueMatcher::Title(re) => re.is_match(&session.title),
            ValueMatcher::Topic(re) => re.is_match(&session.topic),
            ValueMatcher::Level(level) => session.level == Some(*level),
            ValueMatcher::Product(re) => any_match(re, &session.products),
            ValueMatcher::SpeakerName(re) => any_match(re, &session.speaker_names),
            ValueMatcher::SpeakerCompany(re) => any_match(re, &session.speaker_companies),
        }
    }
}

fn any_match(re: &Regex, values: &[String]) -> bool {
    values.iter().any(|v| re.is_match(v))
}
