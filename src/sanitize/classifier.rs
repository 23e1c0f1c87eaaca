//! Structural pattern classifier for detecting and redacting sensitive content
//!
//! Applies a fixed, ordered pipeline of four structural matchers. Each stage
//! scans the output of the previous stage, so placeholders inserted earlier
//! are part of the text later stages see. Placeholders are chosen so that no
//! placeholder can satisfy a later stage's pattern (covered by tests).

use crate::error::{Error, Result};
use crate::sanitize::CategoryTag;
use regex::Regex;

/// Output of a classification pass
#[derive(Debug, Clone)]
pub struct Classification {
    /// Text with every match replaced by its category placeholder
    pub sanitized_text: String,
    /// Detected categories, unique, in first-triggered order
    pub categories: Vec<CategoryTag>,
}

struct Stage {
    tag: CategoryTag,
    pattern: Regex,
    placeholder: &'static str,
}

/// Ordered classification pipeline
pub struct Classifier {
    stages: Vec<Stage>,
}

/// Email-shaped tokens
const IDENTITY_PATTERN: &str = r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}";
/// Phone-shaped digit groups: optional country code, 3-4/3-4/4 groups
const CONTACT_PATTERN: &str = r"(\+?\d{1,2}\s?)?(\d{3,4}[-.\s]?\d{3,4}[-.\s]?\d{4})";
/// Card-shaped runs of 13-16 digits with optional separators
const FINANCIAL_PATTERN: &str = r"\b(?:\d[ -]*?){13,16}\b";
/// key[:=]value credential pairs, case-insensitive
const CREDENTIAL_PATTERN: &str =
    r"(?i)\b(password|secret|api_key|token|access_key)\s*[:=]\s*[^\s]+\b";

impl Classifier {
    /// Build the fixed four-stage pipeline.
    ///
    /// Stage order is part of the contract: identity, contact, financial,
    /// credential. Reordering changes which category claims overlapping text.
    pub fn new() -> Result<Self> {
        let stages = vec![
            Stage {
                tag: CategoryTag::IdentityExposure,
                pattern: compile(IDENTITY_PATTERN)?,
                placeholder: "[PROTECTED_IDENTITY]",
            },
            Stage {
                tag: CategoryTag::ContactLeak,
                pattern: compile(CONTACT_PATTERN)?,
                placeholder: "[PROTECTED_CONTACT]",
            },
            Stage {
                tag: CategoryTag::FinancialRisk,
                pattern: compile(FINANCIAL_PATTERN)?,
                placeholder: "[PROTECTED_FINANCE]",
            },
            Stage {
                tag: CategoryTag::CredentialRisk,
                pattern: compile(CREDENTIAL_PATTERN)?,
                placeholder: "[PROTECTED_CREDENTIALS]",
            },
        ];
        Ok(Self { stages })
    }

    /// Classify and redact a piece of text.
    ///
    /// Empty input short-circuits to an empty, category-free result. A stage
    /// that matches appends its tag once regardless of match count and
    /// replaces all of its matches with the stage placeholder.
    pub fn classify(&self, text: &str) -> Classification {
        if text.is_empty() {
            return Classification {
                sanitized_text: String::new(),
                categories: Vec::new(),
            };
        }

        let mut sanitized = text.to_string();
        let mut categories = Vec::new();

        for stage in &self.stages {
            if stage.pattern.is_match(&sanitized) {
                categories.push(stage.tag);
                sanitized = stage
                    .pattern
                    .replace_all(&sanitized, stage.placeholder)
                    .into_owned();
            }
        }

        Classification {
            sanitized_text: sanitized,
            categories,
        }
    }

    /// Check whether text contains any sensitive pattern without redacting.
    pub fn contains_sensitive(&self, text: &str) -> bool {
        !text.is_empty() && self.stages.iter().any(|s| s.pattern.is_match(text))
    }

    /// The placeholders used by the pipeline, in stage order.
    pub fn placeholders(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.placeholder).collect()
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| Error::Sanitize(format!("Invalid classifier pattern '{}': {}", pattern, e)))
}
