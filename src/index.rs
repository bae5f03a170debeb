//! Index page aggregation.
//!
//! The index is a reduction over every successfully processed post: one
//! listing block per post, newest first, spliced into the index template's
//! `<article>` slot with the same header/footer/aside substitution as
//! regular pages. It has no freshness check of its own — any post
//! participating in the run means the index is rewritten, so it runs after
//! the full per-post barrier.
//!
//! ## Ordering
//!
//! Posts sort by `created` descending. Dates are fixed-format `YYYY-MM-DD`,
//! so plain string comparison orders correctly; the sort is stable, so posts
//! sharing a date keep their encounter order.
//!
//! ## Summaries
//!
//! Each listing shows the post's bounded summary excerpt: the first
//! `summary.max_children` children of its body, cut positionally (not at a
//! paragraph boundary). Summary nodes are pulled from the same parsed body
//! the build retained — the aggregator never re-reads a source file.

use crate::compose::{self, ComposeError, TemplateSources};
use crate::config::SiteConfig;
use crate::dom::{Document, Element, Node};

/// One post's contribution to the index, retained by the build pass.
#[derive(Debug, Clone)]
pub struct IndexPost {
    pub title: String,
    pub created: String,
    pub href: String,
    pub summary: Vec<Node>,
}

/// Build the index document from every processed post.
pub fn build_index(
    posts: &[IndexPost],
    sources: &TemplateSources,
    config: &SiteConfig,
) -> Result<Document, ComposeError> {
    let mut ordered: Vec<&IndexPost> = posts.iter().collect();
    // Stable sort: same-date posts keep encounter order
    ordered.sort_by(|a, b| b.created.cmp(&a.created));

    let mut content = Vec::with_capacity(ordered.len() + 1);
    content.push(Node::Element(site_heading(&config.site.title)));
    for post in ordered {
        content.push(Node::Element(listing_block(post)));
    }

    // The index lives at the output root, next to the stylesheet
    compose::compose_page(content, &sources.index, sources, &config.style.stylesheet)
}

fn site_heading(title: &str) -> Element {
    let mut h1 = Element::new("h1");
    h1.children.push(Node::Text(title.to_string()));
    h1
}

/// One listing: linked heading, summary nodes verbatim, a "read more" link,
/// and the italicized written-date marker.
fn listing_block(post: &IndexPost) -> Element {
    let mut heading_link = Element::new("a");
    heading_link.push_attr("href", post.href.clone());
    heading_link.children.push(Node::Text(post.title.clone()));

    let mut heading = Element::new("h2");
    heading.children.push(Node::Element(heading_link));

    let mut read_more = Element::new("a");
    read_more.push_attr("href", post.href.clone());
    read_more.push_attr("class", "read-more");
    read_more.children.push(Node::Text("read more".to_string()));
    let mut read_more_p = Element::new("p");
    read_more_p.children.push(Node::Element(read_more));

    let mut written = Element::new("i");
    written
        .children
        .push(Node::Text(format!("written {}", post.created)));
    let mut written_p = Element::new("p");
    written_p.children.push(Node::Element(written));

    let mut block = Element::new("section");
    block.push_attr("class", "post-listing");
    block.children.push(Node::Element(heading));
    block.children.extend(post.summary.iter().cloned());
    block.children.push(Node::Element(read_more_p));
    block.children.push(Node::Element(written_p));
    block
}
