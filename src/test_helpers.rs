//! Shared test utilities for the handpress test suite.
//!
//! Builds a minimal but complete site fixture in a temp directory: a `posts/`
//! source dir, a `resources/` dir with the full template set and stylesheet.
//! Tests get an isolated tree they can mutate freely.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_site();
//! write_post(&tmp, "one.html", "2024-01-01", "first", "<p>Body</p>");
//! // build against tmp.path().join("posts") etc.
//! ```

use std::fs;
use tempfile::TempDir;

pub const PAGE_TEMPLATE: &str = "<!DOCTYPE html>\n\
<html>\n\
<head>\n<title>Page</title>\n</head>\n\
<body>\n\
<header></header>\n\
<aside></aside>\n\
<article></article>\n\
<footer></footer>\n\
</body>\n\
</html>\n";

pub const INDEX_TEMPLATE: &str = "<!DOCTYPE html>\n\
<html>\n\
<head>\n<title>Index</title>\n</head>\n\
<body>\n\
<header></header>\n\
<aside></aside>\n\
<article></article>\n\
<footer></footer>\n\
</body>\n\
</html>\n";

/// Create `posts/` and `resources/` with the stock template set.
pub fn setup_site() -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("posts")).unwrap();
    let resources = tmp.path().join("resources");
    fs::create_dir_all(&resources).unwrap();

    fs::write(resources.join("page.html"), PAGE_TEMPLATE).unwrap();
    fs::write(resources.join("index.html"), INDEX_TEMPLATE).unwrap();
    fs::write(
        resources.join("header.html"),
        "<div><p>Fixture Header</p></div>",
    )
    .unwrap();
    fs::write(
        resources.join("footer.html"),
        "<div><p>Fixture Footer</p></div>",
    )
    .unwrap();
    fs::write(
        resources.join("aside.html"),
        "<div><p>Fixture Aside</p></div>",
    )
    .unwrap();
    fs::write(resources.join("main.css"), "body { margin: 0; }").unwrap();

    tmp
}

/// Write a valid post into `posts/`. The `<title>` is derived from the file
/// name: `one.html` gets `Post one`.
pub fn write_post(tmp: &TempDir, file_name: &str, created: &str, slug: &str, body: &str) {
    let stem = file_name.trim_end_matches(".html");
    let html = format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head>\n\
         <meta name=\"created\" content=\"{created}\">\n\
         <meta name=\"slug\" content=\"{slug}\">\n\
         <title>Post {stem}</title>\n\
         </head>\n\
         <body>\n{body}\n</body>\n\
         </html>\n"
    );
    fs::write(tmp.path().join("posts").join(file_name), html).unwrap();
}
