//! Site configuration.
//!
//! Handles loading and validating `config.toml` from the source directory.
//! Every option has a documented default; config files are sparse and only
//! override what they name. Unknown keys are rejected to catch typos early.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [site]
//! title = "Blog"            # Index page title/heading
//!
//! [summary]
//! max_children = 3          # Index summaries: first N body children, positional
//!
//! [templates]               # Filenames resolved inside the resources dir
//! page = "page.html"        # Per-post page chrome
//! index = "index.html"      # Index page chrome
//! header = "header.html"    # <header> slot fragment
//! footer = "footer.html"    # <footer> slot fragment
//! aside = "aside.html"      # <aside> slot fragment
//!
//! [style]
//! stylesheet = "main.css"   # Shared stylesheet, copied to the output root
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    pub site: SiteSection,
    pub summary: SummarySection,
    pub templates: TemplatesSection,
    pub style: StyleSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteSection {
    /// Title used on the generated index page.
    pub title: String,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            title: "Blog".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SummarySection {
    /// Positional cap on index summaries: the first N children of a post's
    /// body, regardless of what those children are.
    pub max_children: usize,
}

impl Default for SummarySection {
    fn default() -> Self {
        Self { max_children: 3 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplatesSection {
    pub page: String,
    pub index: String,
    pub header: String,
    pub footer: String,
    pub aside: String,
}

impl Default for TemplatesSection {
    fn default() -> Self {
        Self {
            page: "page.html".to_string(),
            index: "index.html".to_string(),
            header: "header.html".to_string(),
            footer: "footer.html".to_string(),
            aside: "aside.html".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StyleSection {
    /// Shared stylesheet filename, looked up in the resources directory and
    /// copied to the output root.
    pub stylesheet: String,
}

impl Default for StyleSection {
    fn default() -> Self {
        Self {
            stylesheet: "main.css".to_string(),
        }
    }
}

impl SiteConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.summary.max_children == 0 {
            return Err(ConfigError::Validation(
                "summary.max_children must be at least 1".to_string(),
            ));
        }
        if self.style.stylesheet.is_empty() {
            return Err(ConfigError::Validation(
                "style.stylesheet must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load `config.toml` from the source root. A missing file yields defaults;
/// a malformed or invalid one is a run-level error.
pub fn load_config(source_root: &Path) -> Result<SiteConfig, ConfigError> {
    let path = source_root.join("config.toml");
    let config = if path.exists() {
        let content = std::fs::read_to_string(&path)?;
        toml::from_str(&content)?
    } else {
        SiteConfig::default()
    };
    config.validate()?;
    Ok(config)
}

/// Stock config with every option documented, for `handpress gen-config`.
pub fn stock_config_toml() -> &'static str {
    r#"# handpress site configuration
# All options are optional - values shown are the defaults.

[site]
# Title used on the generated index page.
title = "Blog"

[summary]
# Index summaries take the first N children of a post's body. The cut is
# purely positional - it is not a paragraph boundary.
max_children = 3

[templates]
# Filenames resolved inside the resources directory.
page = "page.html"
index = "index.html"
header = "header.html"
footer = "footer.html"
aside = "aside.html"

[style]
# Shared stylesheet, copied to the output root.
stylesheet = "main.css"
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults_when_no_config_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.site.title, "Blog");
        assert_eq!(config.summary.max_children, 3);
        assert_eq!(config.templates.page, "page.html");
        assert_eq!(config.style.stylesheet, "main.css");
    }

    #[test]
    fn partial_config_overrides_only_named_keys() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            "[site]\ntitle = \"My Notes\"\n",
        )
        .unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.site.title, "My Notes");
        assert_eq!(config.summary.max_children, 3);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "[site]\ntitel = \"typo\"\n").unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn malformed_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "not valid toml [[[").unwrap();
        assert!(matches!(load_config(tmp.path()), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn zero_summary_cap_rejected() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            "[summary]\nmax_children = 0\n",
        )
        .unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Validation(_))
        ));
    }

    // =========================================================================
    // stock_config_toml
    // =========================================================================

    #[test]
    fn stock_config_toml_is_valid_toml() {
        let parsed: Result<SiteConfig, _> = toml::from_str(stock_config_toml());
        assert!(parsed.is_ok());
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let parsed: SiteConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = SiteConfig::default();
        assert_eq!(parsed.site.title, defaults.site.title);
        assert_eq!(parsed.summary.max_children, defaults.summary.max_children);
        assert_eq!(parsed.templates.page, defaults.templates.page);
        assert_eq!(parsed.templates.index, defaults.templates.index);
        assert_eq!(parsed.style.stylesheet, defaults.style.stylesheet);
    }
}
