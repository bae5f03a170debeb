//! # Handpress
//!
//! An incremental static-site builder for hand-authored HTML blogs. Posts
//! are plain HTML documents carrying their own metadata in `<meta>` tags;
//! the builder composes each one into a full page, aggregates an index, and
//! skips any post whose output is already newer than everything it depends
//! on.
//!
//! # Architecture: One Parallel Pass, Then Aggregation
//!
//! ```text
//! posts/*.html ─┬─ parse → metadata → freshness ─┬─ stale: compose + write
//!               │        (parallel, per post)    └─ fresh: keep summary only
//!               └─ barrier ──────────────────────── index.html + resources
//! ```
//!
//! Every post is independent until the barrier: parsing, metadata
//! extraction, freshness judgement, and page composition all run per-post in
//! parallel. The index needs every post's title, date, and summary, so it
//! waits for the barrier and is rebuilt on every run — the cost of
//! re-composing one page is trivial next to getting its ordering wrong.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`dom`] | Tolerant HTML parsing into an element tree, and serialization back out |
//! | [`metadata`] | `<meta name>` extraction into the fixed post record, output path derivation |
//! | [`fresh`] | mtime-based freshness judgement against a post's dependency set |
//! | [`compose`] | Template composition — content slot filling, fragment substitution, stylesheet injection |
//! | [`index`] | Index aggregation — newest-first listing blocks from every post's summary |
//! | [`writer`] | Output persistence — tree serialization to disk, copy-if-newer resources |
//! | [`build`] | Orchestration — enumeration, parallel fan-out, barrier, scan/check commands |
//! | [`config`] | Sparse `config.toml` loading and validation |
//! | [`report`] | CLI output formatting for build, scan, and check runs |
//!
//! # Design Decisions
//!
//! ## Posts Are HTML, Not Markdown
//!
//! The source format is the output format. Authors write real HTML with real
//! tags, so there is no rendering step to disagree with the preview, and the
//! parser's error recovery notes feed straight back as authoring feedback.
//! Metadata rides inside the document itself as standard `<meta>` tags — no
//! front-matter dialect, no sidecar files.
//!
//! ## Tree Substitution Over a Template Language
//!
//! Templates are themselves plain HTML. Composition works by structural
//! substitution — find the `<article>` slot, splice in the post body; find
//! `<header>`, fill it from the header fragment — instead of a text-level
//! template language. There are no placeholder syntaxes to escape and no way
//! to produce unbalanced markup: composition operates on parsed trees and
//! serializes them as a whole.
//!
//! ## mtime Freshness, No Manifest
//!
//! Incrementality compares the output file's mtime against the post source,
//! the shared stylesheet, and the page template. No build manifest, no
//! content hashing: the output tree is itself the record of what has been
//! built. Deleting an output file (or the whole output directory) is a
//! complete and safe cache reset.
//!
//! ## Per-Post Failure Isolation
//!
//! A malformed post is reported and left out of the index; the rest of the
//! site still builds. Only damage to shared inputs (a vanished stylesheet or
//! page template) aborts the run, because every page depends on them.

pub mod build;
pub mod compose;
pub mod config;
pub mod dom;
pub mod fresh;
pub mod index;
pub mod metadata;
pub mod report;
pub mod writer;

#[cfg(test)]
pub(crate) mod test_helpers;
