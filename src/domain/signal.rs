//! Trade signal types produced by the scoring engine.

use chrono::{DateTime, Utc};
use std::fmt;

/// Score floor for each confidence tier.
pub const SCORE_HIGH: i32 = 70;
pub const SCORE_MEDIUM: i32 = 50;
pub const SCORE_LOW: i32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Long,
    Short,
    Neutral,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "LONG",
            Direction::Short => "SHORT",
            Direction::Neutral => "NEUTRAL",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Confidence {
    None,
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn from_score(score: i32) -> Self {
        if score >= SCORE_HIGH {
            Confidence::High
        } else if score >= SCORE_MEDIUM {
            Confidence::Medium
        } else if score >= SCORE_LOW {
            Confidence::Low
        } else {
            Confidence::None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::None => "No Trade",
            Confidence::Low => "Low",
            Confidence::Medium => "Medium",
            Confidence::High => "High",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One evaluation result for one instrument. Immutable once created; the
/// ordering of `reasons` mirrors rule evaluation order and is part of the
/// contract consumed by alert formatting.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub ticker: String,
    pub generated_at: DateTime<Utc>,
    pub rsi: Option<f64>,
    pub atr: Option<f64>,
    pub score: i32,
    pub confidence: Confidence,
    pub direction: Direction,
    pub reasons: Vec<String>,
}

impl Signal {
    pub fn neutral(ticker: &str, generated_at: DateTime<Utc>) -> Self {
        Signal {
            ticker: ticker.to_string(),
            generated_at,
            rsi: None,
            atr: None,
            score: 0,
            confidence: Confidence::None,
            direction: Direction::Neutral,
            reasons: Vec::new(),
        }
    }
}
