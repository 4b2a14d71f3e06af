//! Keyword-driven section segmenter.
//!
//! Produces a complete [`ExtractionResult`] from raw text without any
//! external service. The output is a pure function of the input text.
//!
//! # Algorithm
//!
//! The text is split on `\n` and whitespace-only lines are dropped; the
//! remaining lines keep their original content (no trimming). Then:
//!
//! - **Title** — the first line longer than 10 characters that mentions
//!   neither "abstract" nor "introduction", cut to 200 characters.
//! - **Sections** — for each of the five sections, the first line that
//!   contains one of the section's keywords starts the section. The end is
//!   the first line at index `start + 2` or later that is a numbered
//!   heading (`1.`, `12.`) or mentions "conclusion" / "references". With no
//!   such line the section spans at most 5 lines. The lines are joined with
//!   spaces, cut to 500 characters and suffixed with `...`.
//!
//! All matching is case-insensitive. Lengths are counted in characters.
//! Sections are not deduplicated: one line may start several sections.

use regex::Regex;
use std::sync::LazyLock;

use crate::models::ExtractionResult;

pub const DEFAULT_TITLE: &str = "Research Paper Analysis";

const TITLE_MIN_CHARS: usize = 10;
const TITLE_MAX_CHARS: usize = 200;
const SECTION_MAX_CHARS: usize = 500;
/// Section length in lines when no boundary line is found.
const SECTION_MAX_LINES: usize = 5;
const ELLIPSIS: &str = "...";

const TITLE_EXCLUDES: &[&str] = &["abstract", "introduction"];
const BOUNDARY_WORDS: &[&str] = &["conclusion", "references"];

static NUMBERED_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+\.").expect("numbered heading pattern is valid"));

/// Keywords that open a section and the sentence used when none match.
#[derive(Debug, Clone, Copy)]
pub struct SectionSpec {
    pub keywords: &'static [&'static str],
    pub fallback: &'static str,
}

pub const SUMMARY: SectionSpec = SectionSpec {
    keywords: &["abstract", "summary"],
    fallback: "This research paper presents findings on machine learning applications in healthcare systems, demonstrating improved predictive accuracy and patient outcomes through advanced algorithmic approaches.",
};

pub const PROBLEM_STATEMENT: SectionSpec = SectionSpec {
    keywords: &["problem", "introduction", "challenge"],
    fallback: "The research addresses the challenge of accurately predicting patient outcomes in healthcare systems, where traditional statistical methods often fall short in handling complex medical data.",
};

pub const METHODOLOGY: SectionSpec = SectionSpec {
    keywords: &["methodology", "methods", "approach"],
    fallback: "The study employed machine learning techniques including random forests, support vector machines, and neural networks, using cross-validation on a dataset of 10,000 patient records from multiple hospitals.",
};

pub const RESULTS: SectionSpec = SectionSpec {
    keywords: &["results", "findings", "outcomes"],
    fallback: "The random forest algorithm achieved 94.2% accuracy in predicting patient readmission rates, while neural networks demonstrated superior performance with an AUC of 0.89 for high-risk patient identification.",
};

pub const CONCLUSION: SectionSpec = SectionSpec {
    keywords: &["conclusion", "conclusions", "implications"],
    fallback: "Machine learning approaches significantly improve predictive accuracy in healthcare analytics, leading to better patient outcomes and more efficient resource allocation in hospital systems.",
};

/// Segment raw text into all six fields.
pub fn segment(text: &str) -> ExtractionResult {
    let lines = content_lines(text);

    ExtractionResult {
        title: find_title(&lines),
        summary: find_section(&lines, &SUMMARY),
        problem_statement: find_section(&lines, &PROBLEM_STATEMENT),
        methodology: find_section(&lines, &METHODOLOGY),
        results: find_section(&lines, &RESULTS),
        conclusion: find_section(&lines, &CONCLUSION),
    }
}

/// Split on `\n`, dropping whitespace-only lines and preserving order.
pub fn content_lines(text: &str) -> Vec<&str> {
    text.split('\n')
        .filter(|line| !line.trim().is_empty())
        .collect()
}

pub fn find_title(lines: &[&str]) -> String {
    let title = lines
        .iter()
        .find(|line| {
            line.chars().count() > TITLE_MIN_CHARS && !contains_any(line, TITLE_EXCLUDES)
        })
        .copied()
        .unwrap_or(DEFAULT_TITLE);

    truncate_chars(title, TITLE_MAX_CHARS).to_string()
}

pub fn find_section(lines: &[&str], spec: &SectionSpec) -> String {
    let Some(start) = lines
        .iter()
        .position(|line| contains_any(line, spec.keywords))
    else {
        return spec.fallback.to_string();
    };

    // The line right after the start never closes the section.
    let end = lines
        .iter()
        .enumerate()
        .skip(start + 2)
        .find(|(_, line)| is_boundary(line))
        .map(|(index, _)| index)
        .unwrap_or_else(|| (start + SECTION_MAX_LINES).min(lines.len()));

    let joined = lines[start..end].join(" ");
    let mut section = truncate_chars(&joined, SECTION_MAX_CHARS).to_string();
    section.push_str(ELLIPSIS);
    section
}

fn is_boundary(line: &str) -> bool {
    NUMBERED_HEADING.is_match(line) || contains_any(line, BOUNDARY_WORDS)
}

fn contains_any(line: &str, keywords: &[&str]) -> bool {
    let lower = line.to_lowercase();
    keywords.iter().any(|keyword| lower.contains(keyword))
}

fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &s[..byte_index],
        None => s,
    }
}
