//! CLI output formatting for build, scan, and check runs.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! processing: posts/one.html → output/2024-01-01/first.html
//! skipping:   posts/two.html
//! index → output/index.html
//! copied: resources/main.css
//!
//! Failures
//!     posts/bad.html: missing required metadata field 'created'
//!
//! Built 1 post, skipped 1, 1 failed
//! ```
//!
//! ## Scan
//!
//! ```text
//! 001 First Post (stale)
//!     Created: 2024-01-01
//!     Source:  posts/one.html
//!     Output:  output/2024-01-01/first.html
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure — no I/O, no side effects.

use crate::build::{BuildSummary, CheckReport, PostAction, ScanReport};
use crate::writer::CopyOutcome;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

// ============================================================================
// Build output
// ============================================================================

/// Format build output: one line per post echoing what the pipeline did,
/// then assets, failures, and a closing tally.
pub fn format_build_output(summary: &BuildSummary) -> Vec<String> {
    let mut lines = Vec::new();

    for post in &summary.posts {
        match &post.action {
            PostAction::Built { output } => lines.push(format!(
                "processing: {} \u{2192} {}",
                post.source.display(),
                output.display()
            )),
            PostAction::Skipped { .. } => {
                lines.push(format!("skipping:   {}", post.source.display()));
            }
        }
    }

    if summary.index_written {
        lines.push("index \u{2192} index.html".to_string());
    }

    for asset in &summary.assets {
        match asset.outcome {
            CopyOutcome::Copied => {
                lines.push(format!("copied: {}", asset.source.display()));
            }
            CopyOutcome::SkippedFresh => {}
        }
    }

    if !summary.failures.is_empty() {
        lines.push(String::new());
        lines.push("Failures".to_string());
        for failure in &summary.failures {
            lines.push(format!("    {}: {}", failure.source.display(), failure.error));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Built {}, skipped {}, {} failed",
        plural(summary.built(), "post"),
        summary.skipped(),
        summary.failures.len()
    ));

    lines
}

/// Print build output to stdout.
pub fn print_build_output(summary: &BuildSummary) {
    for line in format_build_output(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Scan output
// ============================================================================

/// Format scan output showing the discovered post inventory.
///
/// Information-first: each post leads with its positional index and title,
/// with source and derived output path as indented context lines.
pub fn format_scan_output(report: &ScanReport) -> Vec<String> {
    let mut lines = Vec::new();

    for (i, entry) in report.entries.iter().enumerate() {
        let freshness = if entry.stale { "stale" } else { "fresh" };
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1),
            entry.title,
            freshness
        ));
        lines.push(format!("    Created: {}", entry.created));
        lines.push(format!("    Source:  {}", entry.source.display()));
        lines.push(format!("    Output:  {}", entry.output.display()));
    }

    if !report.failures.is_empty() {
        lines.push(String::new());
        lines.push("Failures".to_string());
        for failure in &report.failures {
            lines.push(format!("    {}: {}", failure.source.display(), failure.error));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "{}, {} stale, {} failed",
        plural(report.entries.len(), "post"),
        report.entries.iter().filter(|e| e.stale).count(),
        report.failures.len()
    ));

    lines
}

/// Print scan output to stdout.
pub fn print_scan_output(report: &ScanReport) {
    for line in format_scan_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Check output
// ============================================================================

/// Format check output: failures only, then a tally.
pub fn format_check_output(report: &CheckReport) -> Vec<String> {
    let mut lines = Vec::new();
    for failure in &report.failures {
        lines.push(format!("{}: {}", failure.source.display(), failure.error));
    }
    let ok = report.checked - report.failures.len();
    lines.push(format!(
        "Checked {}: {} ok, {} failed",
        plural(report.checked, "post"),
        ok,
        report.failures.len()
    ));
    lines
}

/// Print check output to stdout.
pub fn print_check_output(report: &CheckReport) {
    for line in format_check_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
