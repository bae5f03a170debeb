//! Freshness decisions for incremental rebuilds.
//!
//! A target is rebuilt only when it is stale. The decision is a pure function
//! of the target's prior output timestamp and its declared dependencies,
//! apart from the stat calls that resolve dependency timestamps:
//!
//! - A target that was never built (no prior output) is always stale.
//! - The [`Dependency::AlwaysDirty`] sentinel forces staleness
//!   unconditionally — used by `--force` and by call sites that know a
//!   dependency changed within the current run.
//! - A dependency file whose modification time is strictly newer than the
//!   prior output's flips the target to stale.
//! - A dependency file missing from disk is a hard error for the run
//!   ([`FreshError::MissingDependency`]). Absence never silently means
//!   "stale" or "fresh" — a build against a half-missing resource directory
//!   must fail loudly, not produce a wrong site.
//!
//! Timestamps are compared with strict `>`, so an output written in the same
//! clock tick as its source still counts as fresh on the next run.

use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FreshError {
    #[error("missing dependency file: {0}")]
    MissingDependency(PathBuf),
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// One entry in a target's dependency set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependency {
    /// A file whose mtime gates regeneration.
    Path(PathBuf),
    /// Unconditional rebuild trigger.
    AlwaysDirty,
}

impl Dependency {
    pub fn path(p: impl Into<PathBuf>) -> Self {
        Dependency::Path(p.into())
    }
}

/// Modification time of a previously written output, `None` if it was never
/// built (or was removed, which amounts to the same thing).
pub fn output_mtime(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).ok().and_then(|m| m.modified().ok())
}

/// Decide whether a target with the given prior output timestamp is still
/// fresh with respect to its dependencies.
pub fn is_fresh(prior: Option<SystemTime>, deps: &[Dependency]) -> Result<bool, FreshError> {
    let Some(built_at) = prior else {
        return Ok(false);
    };

    for dep in deps {
        match dep {
            Dependency::AlwaysDirty => return Ok(false),
            Dependency::Path(path) => {
                let meta = std::fs::metadata(path).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::NotFound {
                        FreshError::MissingDependency(path.clone())
                    } else {
                        FreshError::Io {
                            path: path.clone(),
                            source: e,
                        }
                    }
                })?;
                let modified = meta.modified().map_err(|e| FreshError::Io {
                    path: path.clone(),
                    source: e,
                })?;
                if modified > built_at {
                    return Ok(false);
                }
            }
        }
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::time::Duration;
    use tempfile::TempDir;

    /// Write a file and pin its mtime a fixed number of seconds in the past,
    /// so ordering between fixtures never depends on filesystem granularity.
    fn write_with_age(dir: &Path, name: &str, age_secs: u64) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, "content").unwrap();
        let mtime = SystemTime::now() - Duration::from_secs(age_secs);
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(mtime)
            .unwrap();
        path
    }

    #[test]
    fn never_built_is_stale() {
        let tmp = TempDir::new().unwrap();
        let dep = write_with_age(tmp.path(), "dep.html", 100);
        let fresh = is_fresh(None, &[Dependency::path(dep)]).unwrap();
        assert!(!fresh);
    }

    #[test]
    fn older_dependencies_mean_fresh() {
        let tmp = TempDir::new().unwrap();
        let dep = write_with_age(tmp.path(), "dep.html", 100);
        let out = write_with_age(tmp.path(), "out.html", 10);
        let fresh = is_fresh(output_mtime(&out), &[Dependency::path(dep)]).unwrap();
        assert!(fresh);
    }

    #[test]
    fn newer_dependency_flips_to_stale() {
        let tmp = TempDir::new().unwrap();
        let old_dep = write_with_age(tmp.path(), "old.html", 100);
        let new_dep = write_with_age(tmp.path(), "new.html", 1);
        let out = write_with_age(tmp.path(), "out.html", 50);
        let fresh = is_fresh(
            output_mtime(&out),
            &[Dependency::path(old_dep), Dependency::path(new_dep)],
        )
        .unwrap();
        assert!(!fresh);
    }

    #[test]
    fn always_dirty_forces_stale_despite_old_deps() {
        let tmp = TempDir::new().unwrap();
        let dep = write_with_age(tmp.path(), "dep.html", 100);
        let out = write_with_age(tmp.path(), "out.html", 10);
        let fresh = is_fresh(
            output_mtime(&out),
            &[Dependency::AlwaysDirty, Dependency::path(dep)],
        )
        .unwrap();
        assert!(!fresh);
    }

    #[test]
    fn missing_dependency_is_hard_error() {
        let tmp = TempDir::new().unwrap();
        let out = write_with_age(tmp.path(), "out.html", 10);
        let missing = tmp.path().join("not-there.css");
        let result = is_fresh(output_mtime(&out), &[Dependency::path(missing.clone())]);
        match result {
            Err(FreshError::MissingDependency(p)) => assert_eq!(p, missing),
            other => panic!("expected MissingDependency, got {other:?}"),
        }
    }

    #[test]
    fn never_built_short_circuits_missing_dependency() {
        // Never-built short-circuits to stale before deps are consulted;
        // the missing file is only an error when a prior output exists.
        let missing = PathBuf::from("/no/such/dependency.css");
        let fresh = is_fresh(None, &[Dependency::path(missing)]).unwrap();
        assert!(!fresh);
    }

    #[test]
    fn output_mtime_none_for_missing_file() {
        let tmp = TempDir::new().unwrap();
        assert!(output_mtime(&tmp.path().join("absent.html")).is_none());
    }

    #[test]
    fn empty_dependency_set_is_fresh_when_built() {
        let tmp = TempDir::new().unwrap();
        let out = write_with_age(tmp.path(), "out.html", 10);
        assert!(is_fresh(output_mtime(&out), &[]).unwrap());
    }
}
