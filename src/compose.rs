//! Template composition: merging a post's body into the shared page chrome.
//!
//! A rendered page is assembled from a post document plus four template
//! files: the page template (whole-document chrome with an `<article>`
//! content slot) and the `header` / `footer` / `aside` fragments whose
//! content replaces the correspondingly tagged placeholder elements.
//!
//! Composition steps, in order:
//!
//! 1. Rewrite every `<codeblock>` pseudo-element into `<pre><code>...`,
//!    adopting the original children verbatim.
//! 2. Inject one `<link rel="stylesheet">` as the last child of the page
//!    template's `<head>`.
//! 3. Extract the post's `<body>` children and splice them, prefixed by an
//!    `<h1>` carrying the post title, into the template's `<article>` slot.
//! 4. Replace each placeholder's child list with the children of the first
//!    top-level element of the matching fragment.
//!
//! ## Shared Templates, Private Trees
//!
//! Template files are read once per run ([`TemplateSources`]) and held as
//! raw strings. Every composition parses its own tree from those strings,
//! because steps 1-4 mutate in place — concurrent posts must never see each
//! other's mutations.
//!
//! A post without a `<body>`, or a template missing `<head>` or a slot, is a
//! structural error fatal to that document only.

use crate::config::SiteConfig;
use crate::dom::{self, Document, Element, Node};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComposeError {
    #[error("missing structural slot <{slot}>")]
    MissingSlot { slot: &'static str },
    #[error("fragment `{name}` has no top-level element")]
    EmptyFragment { name: &'static str },
}

/// Template file contents, read once per run and re-parsed per composition.
#[derive(Debug, Clone)]
pub struct TemplateSources {
    pub page: String,
    pub index: String,
    pub header: String,
    pub footer: String,
    pub aside: String,
}

impl TemplateSources {
    /// Read all template files from the resources directory.
    pub fn load(resources: &Path, config: &SiteConfig) -> std::io::Result<Self> {
        let read = |name: &str| std::fs::read_to_string(resources.join(name));
        Ok(Self {
            page: read(&config.templates.page)?,
            index: read(&config.templates.index)?,
            header: read(&config.templates.header)?,
            footer: read(&config.templates.footer)?,
            aside: read(&config.templates.aside)?,
        })
    }

    /// Path of the page template file — a freshness dependency of every post.
    pub fn page_template_path(resources: &Path, config: &SiteConfig) -> PathBuf {
        resources.join(&config.templates.page)
    }
}

/// A fully composed page plus the bounded summary excerpt the index needs.
#[derive(Debug)]
pub struct ComposedPost {
    pub document: Document,
    pub summary: Vec<Node>,
}

/// Compose one post into the page template.
///
/// Consumes the post tree: its body children move into the composed page,
/// and the first `summary_cap` of them are also cloned into the returned
/// summary (post-rewrite, so summaries show `<pre><code>` markup too).
pub fn compose_post(
    mut post: Document,
    title: &str,
    sources: &TemplateSources,
    stylesheet_href: &str,
    summary_cap: usize,
) -> Result<ComposedPost, ComposeError> {
    rewrite_codeblocks(&mut post);

    let body = post
        .find_element_mut("body")
        .ok_or(ComposeError::MissingSlot { slot: "body" })?;
    let body_children = std::mem::take(&mut body.children);
    let summary = bounded_summary(&body_children, summary_cap);

    let mut content = Vec::with_capacity(body_children.len() + 1);
    content.push(Node::Element(heading(title)));
    content.extend(body_children);

    let document = compose_page(content, &sources.page, sources, stylesheet_href)?;
    Ok(ComposedPost { document, summary })
}

/// Extract just the bounded summary from a post that will not be rewritten
/// to disk. Fresh posts still feed the index, which has no freshness check
/// of its own, and the index must never re-read a source file.
pub fn summarize_post(mut post: Document, summary_cap: usize) -> Result<Vec<Node>, ComposeError> {
    rewrite_codeblocks(&mut post);
    let body = post
        .find_element("body")
        .ok_or(ComposeError::MissingSlot { slot: "body" })?;
    Ok(bounded_summary(&body.children, summary_cap))
}

/// Parse a chrome template fresh, fill its `<article>` slot with `content`,
/// inject the stylesheet link, and substitute the header/footer/aside
/// fragments. Shared by post pages and the index page.
pub fn compose_page(
    content: Vec<Node>,
    template_source: &str,
    sources: &TemplateSources,
    stylesheet_href: &str,
) -> Result<Document, ComposeError> {
    let mut page = dom::parse(template_source);

    inject_stylesheet(&mut page, stylesheet_href)?;

    let slot = page
        .find_element_mut("article")
        .ok_or(ComposeError::MissingSlot { slot: "article" })?;
    slot.children = content;

    apply_fragment(&mut page, "header", &sources.header)?;
    apply_fragment(&mut page, "footer", &sources.footer)?;
    apply_fragment(&mut page, "aside", &sources.aside)?;

    Ok(page)
}

/// Rewrite every `<codeblock>` element to `<pre>` wrapping a single new
/// `<code>` element that adopts the original children verbatim.
pub fn rewrite_codeblocks(doc: &mut Document) {
    doc.visit_elements_mut(&mut |el| {
        if el.tag == "codeblock" {
            el.tag = "pre".to_string();
            let mut code = Element::new("code");
            code.children = std::mem::take(&mut el.children);
            el.children.push(Node::Element(code));
        }
    });
}

/// Append the stylesheet link as the last child of `<head>`.
///
/// Call sites compose each tree instance exactly once, so the link is never
/// duplicated.
pub fn inject_stylesheet(doc: &mut Document, href: &str) -> Result<(), ComposeError> {
    let head = doc
        .find_element_mut("head")
        .ok_or(ComposeError::MissingSlot { slot: "head" })?;
    let mut link = Element::new("link");
    link.push_attr("rel", "stylesheet");
    link.push_attr("href", href);
    head.children.push(Node::Element(link));
    Ok(())
}

fn apply_fragment(
    page: &mut Document,
    name: &'static str,
    fragment_source: &str,
) -> Result<(), ComposeError> {
    let fragment = dom::parse_fragment(fragment_source);
    let first = fragment
        .children
        .iter()
        .find_map(|n| match n {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        })
        .ok_or(ComposeError::EmptyFragment { name })?;

    // Placeholder elements share their tag with the fragment name
    let slot = page
        .find_element_mut(name)
        .ok_or(ComposeError::MissingSlot { slot: name })?;

    slot.children = first.children.clone();
    Ok(())
}

fn bounded_summary(body_children: &[Node], cap: usize) -> Vec<Node> {
    body_children.iter().take(cap).cloned().collect()
}

fn heading(title: &str) -> Element {
    let mut h1 = Element::new("h1");
    h1.children.push(Node::Text(title.to_string()));
    h1
}
