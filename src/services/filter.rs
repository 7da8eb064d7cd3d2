//! Draft filtering for dashboard search and the archive.
//!
//! Filters are pure: they never reorder, and every criterion left empty
//! matches everything. All given criteria must match (logical AND).

use std::fmt;
use std::str::FromStr;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Deserializer};

use crate::models::{DraftRecord, DraftStatus, TestType};

/// An enum criterion that is either a wildcard or one exact value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection<T> {
    All,
    Only(T),
}

impl<T> Default for Selection<T> {
    fn default() -> Self {
        Self::All
    }
}

impl<T: Copy + PartialEq> Selection<T> {
    pub fn matches(&self, value: T) -> bool {
        match self {
            Self::All => true,
            Self::Only(expected) => *expected == value,
        }
    }
}

impl<T> FromStr for Selection<T>
where
    T: FromStr,
{
    type Err = T::Err;

    /// Empty input and `all` (any case) select everything.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Only)
        }
    }
}

impl<'de, T> Deserialize<'de> for Selection<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

fn deserialize_day<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| {
            serde::de::Error::custom(format!("invalid date '{}', expected YYYY-MM-DD", raw))
        })
}

/// Search criteria. Parsed straight from the list endpoints' query string.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    pub sample_id: Option<String>,
    /// Calendar day of upload, in server local time.
    #[serde(deserialize_with = "deserialize_day")]
    pub date: Option<NaiveDate>,
    pub test_type: Selection<TestType>,
    pub status: Selection<DraftStatus>,
    pub notes: Option<String>,
    pub uploaded_by: Option<String>,
    /// Free text matched against sample id, uploader and notes.
    pub search: Option<String>,
}

/// Case-insensitive substring match. An empty needle always matches.
fn contains(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn term(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl FilterCriteria {
    pub fn matches(&self, draft: &DraftRecord) -> bool {
        if let Some(sample_id) = term(&self.sample_id) {
            if !contains(&draft.sample_id, sample_id) {
                return false;
            }
        }

        if let Some(day) = self.date {
            if draft.uploaded_at.with_timezone(&Local).date_naive() != day {
                return false;
            }
        }

        if !self.test_type.matches(draft.test_type) || !self.status.matches(draft.status) {
            return false;
        }

        if let Some(notes) = term(&self.notes) {
            match draft.notes {
                Some(ref draft_notes) if contains(draft_notes, notes) => {}
                _ => return false,
            }
        }

        if let Some(uploaded_by) = term(&self.uploaded_by) {
            if !contains(&draft.uploaded_by, uploaded_by) {
                return false;
            }
        }

        if let Some(search) = term(&self.search) {
            let hit = contains(&draft.sample_id, search)
                || contains(&draft.uploaded_by, search)
                || draft
                    .notes
                    .as_deref()
                    .is_some_and(|notes| contains(notes, search));
            if !hit {
                return false;
            }
        }

        true
    }
}

/// Drafts matching `criteria`, in input order.
pub fn filter<'a>(drafts: &'a [DraftRecord], criteria: &FilterCriteria) -> Vec<&'a DraftRecord> {
    drafts.iter().filter(|d| criteria.matches(d)).collect()
}

/// Approved drafts matching `criteria`, in input order.
///
/// A `status` criterion cannot widen the archive beyond approved drafts.
pub fn archive<'a>(drafts: &'a [DraftRecord], criteria: &FilterCriteria) -> Vec<&'a DraftRecord> {
    drafts
        .iter()
        .filter(|d| d.status == DraftStatus::Approved)
        .filter(|d| criteria.matches(d))
        .collect()
}
