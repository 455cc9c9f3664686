//! The estimate lifecycle as a closed, strictly ordered enum.
//!
//! ```text
//! Draft -> AwaitingPayment -> Paid -> InProgress -> Completed
//! ```
//!
//! The only mutations are "advance to the next status" and the signing jump
//! to `InProgress`; both are forward-only. Statuses are persisted as their
//! rank (1..=5), so the derived `Ord` and the stored integer agree.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateStatus {
    Draft = 1,
    /// Invoice link sent, waiting on the customer.
    AwaitingPayment = 2,
    Paid = 3,
    /// Physical work is underway.
    InProgress = 4,
    Completed = 5,
}

impl EstimateStatus {
    /// Every status in lifecycle order.
    pub const ALL: [EstimateStatus; 5] = [
        EstimateStatus::Draft,
        EstimateStatus::AwaitingPayment,
        EstimateStatus::Paid,
        EstimateStatus::InProgress,
        EstimateStatus::Completed,
    ];

    /// Persisted integer rank.
    pub fn rank(self) -> i64 {
        self as i64
    }

    /// Resolves a persisted rank. Unknown values yield `None`.
    pub fn from_rank(rank: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.rank() == rank)
    }

    /// The immediate successor. The terminal status maps to itself.
    pub fn next(self) -> Self {
        match self {
            EstimateStatus::Draft => EstimateStatus::AwaitingPayment,
            EstimateStatus::AwaitingPayment => EstimateStatus::Paid,
            EstimateStatus::Paid => EstimateStatus::InProgress,
            EstimateStatus::InProgress => EstimateStatus::Completed,
            EstimateStatus::Completed => EstimateStatus::Completed,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.next() == self
    }

    /// Whether the signing step may move an estimate in this status to
    /// `InProgress` without moving backwards.
    pub fn can_jump_to_in_progress(self) -> bool {
        self < EstimateStatus::InProgress
    }

    /// Label shown to customers and surveyors.
    pub fn label(self) -> &'static str {
        match self {
            EstimateStatus::Draft => "Draft",
            EstimateStatus::AwaitingPayment => "Awaiting Customer Payment",
            EstimateStatus::Paid => "Paid",
            EstimateStatus::InProgress => "In Progress",
            EstimateStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for EstimateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of a status advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub estimate_id: i64,
    pub from: EstimateStatus,
    pub to: EstimateStatus,
}

impl Transition {
    /// True when the estimate was already terminal and nothing changed.
    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }
}
