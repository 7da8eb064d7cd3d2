//! Dashboard counters.

use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{DraftRecord, DraftStatus, TestType};

/// Counts shown on the dashboard stat cards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct DraftStats {
    pub total: usize,
    pub under_review: usize,
    pub approved: usize,
    pub rejected: usize,
    pub concrete: usize,
    pub asphalt: usize,
    pub soil: usize,
    /// Notification badge text for drafts awaiting review; absent when none.
    pub pending_badge: Option<String>,
}

impl DraftStats {
    pub fn from_drafts(drafts: &[DraftRecord]) -> Self {
        let mut stats = drafts.iter().fold(Self::default(), |mut s, d| {
            s.total += 1;
            match d.status {
                DraftStatus::UnderReview => s.under_review += 1,
                DraftStatus::Approved => s.approved += 1,
                DraftStatus::Rejected => s.rejected += 1,
            }
            match d.test_type {
                TestType::Concrete => s.concrete += 1,
                TestType::Asphalt => s.asphalt += 1,
                TestType::Soil => s.soil += 1,
            }
            s
        });
        stats.pending_badge = pending_badge(stats.under_review);
        stats
    }
}

/// Badge text for a count: nothing for zero, capped at `99+`.
pub fn pending_badge(count: usize) -> Option<String> {
    match count {
        0 => None,
        1..=99 => Some(count.to_string()),
        _ => Some("99+".to_string()),
    }
}
