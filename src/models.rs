//! Core data models used throughout the analyzer.
//!
//! These types represent the uploaded document, the six-field extraction
//! result returned to clients, and the name records kept in the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw uploaded text, alive for the duration of one request.
#[derive(Debug, Clone)]
pub struct Document {
    pub text: String,
}

impl Document {
    /// Decodes uploaded bytes as UTF-8, replacing invalid sequences and
    /// dropping a leading byte-order mark.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let decoded = String::from_utf8_lossy(bytes);
        let text = decoded.strip_prefix('\u{FEFF}').unwrap_or(&decoded);
        Self {
            text: text.to_string(),
        }
    }
}

/// Structured summary of a research paper.
///
/// Serialized with camelCase keys (`problemStatement`), which is the shape
/// both the HTTP API and the remote extractor's JSON schema use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub title: String,
    pub summary: String,
    pub problem_statement: String,
    pub methodology: String,
    pub results: String,
    pub conclusion: String,
}

/// A user-submitted name as stored in the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRecord {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
