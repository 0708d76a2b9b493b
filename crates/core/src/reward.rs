//! Weighted reward wheel.
//!
//! After an order completes, the customer gets one spin. The draw happens
//! server-side; the returned segment index lets the client stop its wheel
//! animation on the same segment.

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RewardError {
    #[error("reward table has no segments")]
    Empty,
    #[error("reward table total weight is zero")]
    ZeroWeight,
}

/// One slice of the wheel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardSegment {
    pub label: String,
    pub weight: u32,
}

/// Outcome of a spin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardDraw {
    pub index: usize,
    pub label: String,
}

const DEFAULT_LABELS: [&str; 8] = [
    "5% off your next order",
    "Free shipping",
    "₹100 voucher",
    "Free cleaning kit",
    "10% off your next order",
    "₹250 voucher",
    "Extended warranty (6 months)",
    "Better luck next time",
];

/// The wheel's segments and their weights.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardTable {
    segments: Vec<RewardSegment>,
    total_weight: u64,
}

impl RewardTable {
    /// # Errors
    ///
    /// Returns [`RewardError`] when there are no segments or every weight is zero.
    pub fn new(segments: Vec<RewardSegment>) -> Result<Self, RewardError> {
        if segments.is_empty() {
            return Err(RewardError::Empty);
        }
        let total_weight = segments.iter().map(|s| u64::from(s.weight)).sum();
        if total_weight == 0 {
            return Err(RewardError::ZeroWeight);
        }
        Ok(Self {
            segments,
            total_weight,
        })
    }

    #[must_use]
    pub fn segments(&self) -> &[RewardSegment] {
        &self.segments
    }

    /// Label of the segment at `index`, as stored on an order.
    #[must_use]
    pub fn label(&self, index: usize) -> Option<&str> {
        self.segments.get(index).map(|s| s.label.as_str())
    }

    /// Draw one segment with probability proportional to its weight.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> RewardDraw {
        let roll = rng.random_range(0..self.total_weight);

        let mut cumulative = 0_u64;
        let index = self
            .segments
            .iter()
            .position(|segment| {
                cumulative += u64::from(segment.weight);
                roll < cumulative
            })
            .unwrap_or(self.segments.len().saturating_sub(1));

        RewardDraw {
            index,
            label: self.label(index).unwrap_or_default().to_owned(),
        }
    }
}

impl Default for RewardTable {
    /// Eight equally likely segments.
    fn default() -> Self {
        let segments: Vec<RewardSegment> = DEFAULT_LABELS
            .iter()
            .map(|label| RewardSegment {
                label: (*label).to_owned(),
                weight: 1,
            })
            .collect();
        Self {
            total_weight: segments.len() as u64,
            segments,
        }
    }
}
