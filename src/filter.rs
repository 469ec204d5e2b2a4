use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use thiserror::Error;

use crate::types::TestType;

// ---------------------------------------------------------------------------
// Combinator
// ---------------------------------------------------------------------------

/// How multiple comma-separated terms combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combinator {
    /// Every term must match.
    And,
    /// At least one term must match.
    #[default]
    Or,
}

impl Combinator {
    pub fn toggled(self) -> Self {
        match self {
            Self::And => Self::Or,
            Self::Or => Self::And,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }

    fn combine(self, terms: &[Regex], name: &str) -> bool {
        match self {
            Self::And => terms.iter().all(|re| re.is_match(name)),
            Self::Or => terms.iter().any(|re| re.is_match(name)),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("invalid filter term {term:?}: {source}")]
    InvalidPattern {
        term: String,
        #[source]
        source: regex::Error,
    },
}

// ---------------------------------------------------------------------------
// Raw filter input (what the user typed/toggled)
// ---------------------------------------------------------------------------

/// The editable filter controls, before compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterInput {
    pub query: String,
    pub combinator: Combinator,
    pub case_sensitive: bool,
    pub enabled: BTreeSet<TestType>,
}

impl Default for FilterInput {
    fn default() -> Self {
        Self {
            query: String::new(),
            combinator: Combinator::Or,
            case_sensitive: false,
            enabled: TestType::CATEGORIES.into_iter().collect(),
        }
    }
}

impl FilterInput {
    pub fn toggle_category(&mut self, test_type: TestType) {
        if !self.enabled.remove(&test_type) {
            self.enabled.insert(test_type);
        }
    }

    pub fn is_enabled(&self, test_type: TestType) -> bool {
        self.enabled.contains(&test_type)
    }

    pub fn compile(&self) -> Result<FilterCriteria, FilterError> {
        FilterCriteria::parse(
            &self.query,
            self.combinator,
            self.case_sensitive,
            &self.enabled,
        )
    }
}

// ---------------------------------------------------------------------------
// Compiled criteria
// ---------------------------------------------------------------------------

/// Compiled filter: ordered patterns, their combinator and enabled categories.
#[derive(Debug, Clone)]
pub struct FilterCriteria {
    terms: Vec<Regex>,
    combinator: Combinator,
    enabled: BTreeSet<TestType>,
    show_all: bool,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            terms: Vec::new(),
            combinator: Combinator::Or,
            enabled: TestType::CATEGORIES.into_iter().collect(),
            show_all: true,
        }
    }
}

/// Split a query on commas, trimming and dropping empty terms.
pub(crate) fn split_terms(query: &str) -> Vec<&str> {
    query
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

impl FilterCriteria {
    /// Compile the user's filter controls.
    ///
    /// An empty query with every category enabled yields a criteria that shows
    /// every row. Otherwise each non-empty term is compiled as a regex.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::InvalidPattern` for the first term that is not a
    /// valid regex.
    pub fn parse(
        query: &str,
        combinator: Combinator,
        case_sensitive: bool,
        enabled: &BTreeSet<TestType>,
    ) -> Result<Self, FilterError> {
        let query = query.trim();
        let all_enabled = TestType::CATEGORIES.iter().all(|t| enabled.contains(t));
        if query.is_empty() && all_enabled {
            return Ok(Self::default());
        }

        let terms = split_terms(query)
            .into_iter()
            .map(|term| {
                RegexBuilder::new(term)
                    .case_insensitive(!case_sensitive)
                    .build()
                    .map_err(|source| FilterError::InvalidPattern {
                        term: term.to_owned(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            terms,
            combinator,
            enabled: enabled.clone(),
            show_all: false,
        })
    }

    pub fn is_show_all(&self) -> bool {
        self.show_all
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// Whether `name` satisfies the combined patterns. No patterns always matches.
    pub fn matches_name(&self, name: &str) -> bool {
        self.terms.is_empty() || self.combinator.combine(&self.terms, name)
    }

    /// Visibility of a single row.
    ///
    /// A checked row is always visible. Otherwise the row's category must be
    /// enabled and its name must match.
    pub fn is_visible(&self, checked: bool, test_type: TestType, name: &str) -> bool {
        if self.show_all || checked {
            return true;
        }
        self.enabled.contains(&test_type) && self.matches_name(name)
    }
}

// ---------------------------------------------------------------------------
// Debounce
// ---------------------------------------------------------------------------

/// Collapses a burst of filter edits into one application after `delay` of quiet.
#[derive(Debug, Clone, Copy)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Re-arm the timer from `now`, discarding any earlier deadline.
    pub fn trigger(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns `true` exactly once when the deadline has passed.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
