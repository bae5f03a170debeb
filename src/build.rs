//! Build orchestration: the full source-to-site pipeline.
//!
//! ```text
//! enumerate posts
//!   └─ per post (parallel): parse → extract metadata → freshness check
//!        ├─ stale:  compose → write created/slug.html
//!        └─ fresh:  skip write, keep summary for the index
//! barrier (all posts done)
//!   ├─ index.html        (always rebuilt — no independent freshness)
//!   └─ static resources  (stylesheet + images, copy-if-newer)
//! ```
//!
//! ## Failure Isolation
//!
//! A post that fails metadata extraction or composition is reported and
//! excluded from the index; the rest of the run continues. Two classes of
//! error abort the whole run instead: a missing freshness dependency (the
//! shared stylesheet or page template vanished) and a missing copy source —
//! both mean the site as a whole cannot be trusted.
//!
//! ## Parallelism
//!
//! Posts fan out over a rayon parallel iterator. Each task owns its parsed
//! trees and its output path (derived from its own metadata, unique across
//! the run); template content is shared as plain strings and re-parsed per
//! task. The `collect` into a result vector is the barrier the index
//! aggregation requires, and it preserves enumeration order, which is what
//! makes the index's same-date tie-break deterministic.

use crate::compose::{self, ComposeError, TemplateSources};
use crate::config::{self, ConfigError, SiteConfig};
use crate::dom;
use crate::fresh::{self, Dependency, FreshError};
use crate::index::{self, IndexPost};
use crate::metadata::{self, MetadataError};
use crate::writer::{self, CopyOutcome, WriteError};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Errors that halt the entire run.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to read templates from {dir}: {source}")]
    Templates {
        dir: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Fresh(#[from] FreshError),
    #[error(transparent)]
    Write(#[from] WriteError),
    #[error("index composition failed: {0}")]
    Index(#[from] ComposeError),
}

/// Errors scoped to a single post. Collected, never aborting siblings —
/// except `Fresh`, which the barrier promotes to a [`BuildError`].
#[derive(Error, Debug)]
pub enum PostError {
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error(transparent)]
    Compose(#[from] ComposeError),
    #[error(transparent)]
    Fresh(#[from] FreshError),
    #[error(transparent)]
    Write(#[from] WriteError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub source: PathBuf,
    pub resources: PathBuf,
    pub output: PathBuf,
    /// Inject the always-dirty sentinel: rebuild everything.
    pub force: bool,
}

/// What happened to one post.
#[derive(Debug)]
pub enum PostAction {
    Built { output: PathBuf },
    Skipped { output: PathBuf },
}

#[derive(Debug)]
pub struct PostReport {
    pub source: PathBuf,
    pub action: PostAction,
}

#[derive(Debug)]
pub struct PostFailure {
    pub source: PathBuf,
    pub error: PostError,
}

#[derive(Debug)]
pub struct AssetReport {
    pub source: PathBuf,
    pub outcome: CopyOutcome,
}

/// Aggregate result of a build run.
#[derive(Debug, Default)]
pub struct BuildSummary {
    pub posts: Vec<PostReport>,
    pub failures: Vec<PostFailure>,
    pub assets: Vec<AssetReport>,
    pub index_written: bool,
}

impl BuildSummary {
    pub fn built(&self) -> usize {
        self.posts
            .iter()
            .filter(|p| matches!(p.action, PostAction::Built { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.posts.len() - self.built()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Shared read-only state for the parallel post phase.
struct BuildContext<'a> {
    config: &'a SiteConfig,
    sources: &'a TemplateSources,
    stylesheet_path: &'a Path,
    page_template_path: &'a Path,
    output: &'a Path,
    force: bool,
}

struct ProcessedPost {
    report: PostReport,
    index_post: IndexPost,
}

/// Run the full pipeline.
pub fn build(opts: &BuildOptions) -> Result<BuildSummary, BuildError> {
    let config = config::load_config(&opts.source)?;
    let sources =
        TemplateSources::load(&opts.resources, &config).map_err(|e| BuildError::Templates {
            dir: opts.resources.clone(),
            source: e,
        })?;
    let stylesheet_path = opts.resources.join(&config.style.stylesheet);
    let page_template_path = TemplateSources::page_template_path(&opts.resources, &config);

    let ctx = BuildContext {
        config: &config,
        sources: &sources,
        stylesheet_path: &stylesheet_path,
        page_template_path: &page_template_path,
        output: &opts.output,
        force: opts.force,
    };

    let post_paths = enumerate_posts(&opts.source)?;

    // Parallel per-post phase; the collect is the barrier the index needs.
    let results: Vec<Result<ProcessedPost, PostFailure>> = post_paths
        .par_iter()
        .map(|path| {
            process_post(path, &ctx).map_err(|error| PostFailure {
                source: path.clone(),
                error,
            })
        })
        .collect();

    let mut summary = BuildSummary::default();
    let mut index_posts = Vec::new();
    for result in results {
        match result {
            Ok(processed) => {
                summary.posts.push(processed.report);
                index_posts.push(processed.index_post);
            }
            Err(failure) => {
                // Missing shared dependencies poison the whole run
                if let PostError::Fresh(e) = failure.error {
                    return Err(e.into());
                }
                summary.failures.push(failure);
            }
        }
    }

    let index_doc = index::build_index(&index_posts, &sources, &config)?;
    writer::write_tree(&index_doc, &opts.output.join("index.html"))?;
    summary.index_written = true;

    summary.assets = copy_static_resources(opts, &stylesheet_path)?;

    Ok(summary)
}

fn process_post(path: &Path, ctx: &BuildContext<'_>) -> Result<ProcessedPost, PostError> {
    let doc = dom::parse(&std::fs::read_to_string(path)?);
    let meta = metadata::extract(&doc)?;

    let output = ctx.output.join(meta.output_rel_path());

    let mut deps = Vec::with_capacity(4);
    if ctx.force {
        deps.push(Dependency::AlwaysDirty);
    }
    deps.push(Dependency::path(path));
    deps.push(Dependency::path(ctx.stylesheet_path));
    deps.push(Dependency::path(ctx.page_template_path));

    let is_fresh = fresh::is_fresh(fresh::output_mtime(&output), &deps)?;

    let title = meta.display_title().to_string();
    let href = meta.link_href();
    let cap = ctx.config.summary.max_children;

    let (summary, action) = if is_fresh {
        let summary = compose::summarize_post(doc, cap)?;
        (summary, PostAction::Skipped { output })
    } else {
        let composed = compose::compose_post(
            doc,
            &title,
            ctx.sources,
            &metadata::post_stylesheet_href(&ctx.config.style.stylesheet),
            cap,
        )?;
        writer::write_tree(&composed.document, &output)?;
        (composed.summary, PostAction::Built { output })
    };

    Ok(ProcessedPost {
        report: PostReport {
            source: path.to_path_buf(),
            action,
        },
        index_post: IndexPost {
            title,
            created: meta.created,
            href,
            summary,
        },
    })
}

/// Post documents: `*.html` files directly in the source directory, sorted
/// by path so enumeration order (and the index tie-break) is deterministic.
pub fn enumerate_posts(source: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut posts: Vec<PathBuf> = WalkDir::new(source)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .map(|e| e.eq_ignore_ascii_case("html"))
                    .unwrap_or(false)
        })
        .collect();
    posts.sort();
    Ok(posts)
}

const IMAGE_EXTENSIONS: &[&str] = &["png", "svg", "jpg"];

fn enumerate_images(dir: &Path) -> Vec<PathBuf> {
    let mut images: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .map(|e| {
                        let ext = e.to_string_lossy().to_lowercase();
                        IMAGE_EXTENSIONS.contains(&ext.as_str())
                    })
                    .unwrap_or(false)
        })
        .collect();
    images.sort();
    images
}

/// Copy the stylesheet and any image resources (post illustrations from the
/// source dir, logo/background from the resources dir) to the output root.
fn copy_static_resources(
    opts: &BuildOptions,
    stylesheet_path: &Path,
) -> Result<Vec<AssetReport>, WriteError> {
    let mut reports = Vec::new();

    let outcome = writer::copy_if_newer(stylesheet_path, &opts.output)?;
    reports.push(AssetReport {
        source: stylesheet_path.to_path_buf(),
        outcome,
    });

    for image in enumerate_images(&opts.source)
        .into_iter()
        .chain(enumerate_images(&opts.resources))
    {
        let outcome = writer::copy_if_newer(&image, &opts.output)?;
        reports.push(AssetReport {
            source: image,
            outcome,
        });
    }

    Ok(reports)
}

// ============================================================================
// Scan and check (no-write inspection commands)
// ============================================================================

/// One post's metadata and freshness judgement, as `scan` sees it.
#[derive(Debug, Serialize)]
pub struct ScanEntry {
    pub source: PathBuf,
    pub title: String,
    pub created: String,
    pub slug: String,
    pub output: PathBuf,
    pub stale: bool,
}

#[derive(Debug, Serialize)]
pub struct ScanFailure {
    pub source: PathBuf,
    pub error: String,
}

/// Manifest produced by `scan`: the build preview, written nowhere.
#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub entries: Vec<ScanEntry>,
    pub failures: Vec<ScanFailure>,
}

/// Enumerate and inspect every post without writing anything.
pub fn scan(opts: &BuildOptions) -> Result<ScanReport, BuildError> {
    let config = config::load_config(&opts.source)?;
    let stylesheet_path = opts.resources.join(&config.style.stylesheet);
    let page_template_path = TemplateSources::page_template_path(&opts.resources, &config);

    let mut report = ScanReport {
        entries: Vec::new(),
        failures: Vec::new(),
    };

    for path in enumerate_posts(&opts.source)? {
        match scan_post(&path, opts, &stylesheet_path, &page_template_path) {
            Ok(entry) => report.entries.push(entry),
            Err(PostError::Fresh(e)) => return Err(e.into()),
            Err(error) => report.failures.push(ScanFailure {
                source: path,
                error: error.to_string(),
            }),
        }
    }

    Ok(report)
}

fn scan_post(
    path: &Path,
    opts: &BuildOptions,
    stylesheet_path: &Path,
    page_template_path: &Path,
) -> Result<ScanEntry, PostError> {
    let doc = dom::parse(&std::fs::read_to_string(path)?);
    let meta = metadata::extract(&doc)?;
    let output = opts.output.join(meta.output_rel_path());

    let deps = [
        Dependency::path(path),
        Dependency::path(stylesheet_path),
        Dependency::path(page_template_path),
    ];
    let stale = if opts.force {
        true
    } else {
        !fresh::is_fresh(fresh::output_mtime(&output), &deps)?
    };

    Ok(ScanEntry {
        source: path.to_path_buf(),
        title: meta.display_title().to_string(),
        created: meta.created,
        slug: meta.slug,
        output,
        stale,
    })
}

/// Result of `check`: parse and metadata validation only, no freshness, no
/// resources required.
#[derive(Debug)]
pub struct CheckReport {
    pub checked: usize,
    pub failures: Vec<PostFailure>,
}

impl CheckReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Validate that every post parses and carries its required metadata.
pub fn check(source: &Path) -> Result<CheckReport, BuildError> {
    let mut report = CheckReport {
        checked: 0,
        failures: Vec::new(),
    };
    for path in enumerate_posts(source)? {
        report.checked += 1;
        let result: Result<(), PostError> = std::fs::read_to_string(&path)
            .map_err(PostError::from)
            .and_then(|content| {
                metadata::extract(&dom::parse(&content))?;
                Ok(())
            });
        if let Err(error) = result {
            report.failures.push(PostFailure {
                source: path,
                error,
            });
        }
    }
    Ok(report)
}
