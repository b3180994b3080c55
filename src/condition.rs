//! Structured condition tags.
//!
//! Trials are labelled along three experimental axes: task relevance,
//! duration bucket, and lock type (onset- or offset-locked). Selection is
//! field-wise: a query constrains any subset of the axes, so
//! `relevance = "relevant", lock = "onset"` matches all durations. This
//! replaces delimiter-joined composite strings, which break silently when a
//! label contains the delimiter.

use std::fmt;

/// The full label of one trial.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConditionTag {
    pub relevance: String,
    pub duration: String,
    pub lock: String,
}

impl ConditionTag {
    pub fn new(relevance: &str, duration: &str, lock: &str) -> Self {
        Self {
            relevance: relevance.to_string(),
            duration: duration.to_string(),
            lock: lock.to_string(),
        }
    }
}

impl fmt::Display for ConditionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.relevance, self.duration, self.lock)
    }
}

/// A partial label: `None` fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ConditionQuery {
    pub relevance: Option<String>,
    pub duration: Option<String>,
    pub lock: Option<String>,
}

impl ConditionQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn relevance(mut self, value: &str) -> Self {
        self.relevance = Some(value.to_string());
        self
    }

    pub fn duration(mut self, value: &str) -> Self {
        self.duration = Some(value.to_string());
        self
    }

    pub fn lock(mut self, value: &str) -> Self {
        self.lock = Some(value.to_string());
        self
    }

    pub fn matches(&self, tag: &ConditionTag) -> bool {
        self.relevance.as_deref().is_none_or(|v| v == tag.relevance)
            && self.duration.as_deref().is_none_or(|v| v == tag.duration)
            && self.lock.as_deref().is_none_or(|v| v == tag.lock)
    }
}

impl fmt::Display for ConditionQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.relevance.as_deref().unwrap_or("*"),
            self.duration.as_deref().unwrap_or("*"),
            self.lock.as_deref().unwrap_or("*")
        )
    }
}
