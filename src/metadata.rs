//! Post metadata extraction and output-path derivation.
//!
//! Posts declare their metadata inline, in the document head:
//!
//! ```html
//! <meta name="created" content="2024-05-05">
//! <meta name="slug" content="first-post">
//! <title>My First Post</title>
//! ```
//!
//! `created` and `slug` are mandatory — there is no fallback, and a post
//! missing either fails extraction with [`MetadataError::MissingRequiredField`]
//! (fatal to that post only, never to the rest of the run). `title` falls back
//! to the document's `<title>` text when no meta tag provides it.
//!
//! ## Metadata Resolution
//!
//! The extractor walks every node in document order. Each `<meta>` element
//! carrying a `name` attribute records `name → content`. The first `<title>`
//! element contributes its text as the title unless a meta tag of that name
//! was seen anywhere in the document. Keys other than the known three are
//! kept in [`PostMetadata::extra`] but drive nothing.
//!
//! ## Path Scheme
//!
//! `created` and `slug` concatenate into the output path segment
//! `created/slug.html` (a date directory containing one file per post). The
//! same segment is the public link used by the index page, so cross-page
//! references and on-disk layout can never drift apart. `created` dates are
//! `YYYY-MM-DD`, which makes plain string comparison a valid sort key.

use crate::dom::Document;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    #[error("missing required field `{field}` (expected <meta name=\"{field}\" content=...>)")]
    MissingRequiredField { field: &'static str },
}

/// Validated metadata for one post.
///
/// A fixed record rather than an open mapping: required fields are checked
/// once, at extraction time, so later stages never re-validate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostMetadata {
    /// Creation date, `YYYY-MM-DD`. Sort key and output path segment.
    pub created: String,
    /// URL-safe identifier, the output filename stem.
    pub slug: String,
    /// Display title; `<title>` text when no meta tag supplies one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Meta keys beyond the known three, retained but unused.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl PostMetadata {
    /// Output path relative to the output root: `created/slug.html`.
    pub fn output_rel_path(&self) -> PathBuf {
        PathBuf::from(&self.created).join(format!("{}.html", self.slug))
    }

    /// Public link to this post from the output root (the index page).
    pub fn link_href(&self) -> String {
        format!("{}/{}.html", self.created, self.slug)
    }

    /// Title shown in headings and listings; the slug when nothing better
    /// was declared.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.slug)
    }
}

/// Stylesheet href as seen from a rendered post page.
///
/// Posts live one directory below the output root (`created/slug.html`), so
/// the shared stylesheet at the root is always exactly one level up.
pub fn post_stylesheet_href(stylesheet: &str) -> String {
    format!("../{stylesheet}")
}

/// Extract and validate metadata from a parsed post.
pub fn extract(doc: &Document) -> Result<PostMetadata, MetadataError> {
    let mut meta: BTreeMap<String, String> = BTreeMap::new();
    let mut title_text: Option<String> = None;

    doc.visit_elements(&mut |el| {
        if el.tag == "meta" {
            if let (Some(name), Some(content)) = (el.attr("name"), el.attr("content")) {
                // First declaration wins, matching document order
                meta.entry(name.to_string())
                    .or_insert_with(|| content.to_string());
            }
        } else if el.tag == "title" && title_text.is_none() {
            let text = el.text_content().trim().to_string();
            if !text.is_empty() {
                title_text = Some(text);
            }
        }
    });

    let created = meta
        .remove("created")
        .ok_or(MetadataError::MissingRequiredField { field: "created" })?;
    let slug = meta
        .remove("slug")
        .ok_or(MetadataError::MissingRequiredField { field: "slug" })?;
    let title = meta.remove("title").or(title_text);

    Ok(PostMetadata {
        created,
        slug,
        title,
        extra: meta,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom;

    fn post(head: &str) -> Document {
        dom::parse(&format!(
            "<html><head>{head}</head><body><p>body</p></body></html>"
        ))
    }

    #[test]
    fn extracts_required_fields() {
        let doc = post(
            r#"<meta name="created" content="2024-05-05">
               <meta name="slug" content="first-post">"#,
        );
        let meta = extract(&doc).unwrap();
        assert_eq!(meta.created, "2024-05-05");
        assert_eq!(meta.slug, "first-post");
        assert_eq!(meta.title, None);
    }

    #[test]
    fn missing_created_is_error() {
        let doc = post(r#"<meta name="slug" content="x">"#);
        assert_eq!(
            extract(&doc),
            Err(MetadataError::MissingRequiredField { field: "created" })
        );
    }

    #[test]
    fn missing_slug_is_error() {
        let doc = post(r#"<meta name="created" content="2024-01-01">"#);
        assert_eq!(
            extract(&doc),
            Err(MetadataError::MissingRequiredField { field: "slug" })
        );
    }

    #[test]
    fn title_from_meta_tag() {
        let doc = post(
            r#"<meta name="created" content="2024-01-01">
               <meta name="slug" content="x">
               <meta name="title" content="From Meta">
               <title>From Title Element</title>"#,
        );
        assert_eq!(extract(&doc).unwrap().title.as_deref(), Some("From Meta"));
    }

    #[test]
    fn title_falls_back_to_title_element() {
        let doc = post(
            r#"<meta name="created" content="2024-01-01">
               <meta name="slug" content="x">
               <title>  Fallback Title  </title>"#,
        );
        assert_eq!(
            extract(&doc).unwrap().title.as_deref(),
            Some("Fallback Title")
        );
    }

    #[test]
    fn meta_without_name_is_ignored() {
        let doc = post(
            r#"<meta charset="utf-8">
               <meta name="created" content="2024-01-01">
               <meta name="slug" content="x">"#,
        );
        assert!(extract(&doc).is_ok());
    }

    #[test]
    fn unknown_keys_land_in_extra() {
        let doc = post(
            r#"<meta name="created" content="2024-01-01">
               <meta name="slug" content="x">
               <meta name="author" content="someone">"#,
        );
        let meta = extract(&doc).unwrap();
        assert_eq!(meta.extra.get("author").map(String::as_str), Some("someone"));
    }

    #[test]
    fn extraction_is_deterministic() {
        let doc = post(
            r#"<meta name="created" content="2024-01-01">
               <meta name="slug" content="x">
               <title>T</title>"#,
        );
        assert_eq!(extract(&doc).unwrap(), extract(&doc).unwrap());
    }

    // =========================================================================
    // Path derivation
    // =========================================================================

    fn meta(created: &str, slug: &str) -> PostMetadata {
        PostMetadata {
            created: created.to_string(),
            slug: slug.to_string(),
            title: None,
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn output_path_is_created_slash_slug() {
        let m = meta("2024-05-05", "first-post");
        assert_eq!(
            m.output_rel_path(),
            PathBuf::from("2024-05-05/first-post.html")
        );
        assert_eq!(m.link_href(), "2024-05-05/first-post.html");
    }

    #[test]
    fn output_path_is_pure_function_of_created_and_slug() {
        assert_eq!(
            meta("2023-01-01", "a").output_rel_path(),
            meta("2023-01-01", "a").output_rel_path()
        );
    }

    #[test]
    fn display_title_falls_back_to_slug() {
        let m = meta("2024-01-01", "the-slug");
        assert_eq!(m.display_title(), "the-slug");
    }

    #[test]
    fn stylesheet_href_is_one_level_up() {
        assert_eq!(post_stylesheet_href("main.css"), "../main.css");
    }
}
