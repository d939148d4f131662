//! Commitments parsed from planning pages.
//!
//! A planning page is free text. Every bullet (`-`, `*`, `•`) or numbered
//! (`1.`, `2)`) line becomes a [`Commitment`]; its priority is classified
//! from keywords in the line.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static BULLET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-*•]\s+(.+)").expect("bullet pattern is valid"));
static NUMBERED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+[.)]\s+(.+)").expect("numbered pattern is valid"));
static HIGH_KEYWORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(critical|blocker|urgent|P0|P1|high)\b").expect("high pattern is valid")
});
static LOW_KEYWORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(nice.to.have|low|optional|stretch|P3|P4)\b").expect("low pattern is valid")
});

/// Classified priority of a commitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitmentPriority {
    High,
    Medium,
    Low,
}

/// A declared priority or promise from planning documentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    pub text: String,
    pub priority: CommitmentPriority,
}

impl Commitment {
    /// Build a commitment, classifying its priority from the text.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let priority = classify(&text);
        Self { text, priority }
    }

    /// Lower-cased whitespace tokens longer than `min_len` characters.
    pub fn keywords(&self, min_len: usize) -> impl Iterator<Item = String> + '_ {
        self.text
            .split_whitespace()
            .map(str::to_lowercase)
            .filter(move |w| w.chars().count() > min_len)
    }
}

/// Classify commitment text. Low keywords are checked last and win.
pub fn classify(text: &str) -> CommitmentPriority {
    let mut priority = CommitmentPriority::Medium;
    if HIGH_KEYWORDS.is_match(text) {
        priority = CommitmentPriority::High;
    }
    if LOW_KEYWORDS.is_match(text) {
        priority = CommitmentPriority::Low;
    }
    priority
}

/// Extract commitments from a planning page body.
pub fn parse_commitments(text: &str) -> Vec<Commitment> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            BULLET
                .captures(line)
                .or_else(|| NUMBERED.captures(line))
                .and_then(|caps| caps.get(1))
                .map(|body| Commitment::new(body.as_str()))
        })
        .collect()
}
