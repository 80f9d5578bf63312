//! Shared test utilities for the liara test suite.
//!
//! Provides a project fixture writer, lookup helpers, and bulk extractors
//! that work with discovery-phase data structures (`Site`, `Node`).
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_project(&[
//!     ("content/_index.md", "---\ntitle: Home\n---\n"),
//!     ("content/blog/a.md", "---\ntitle: A\n---\nBody"),
//! ]);
//! let site = scan(&roots(tmp.path()), &ResourceFactory::default()).unwrap();
//!
//! let node = find_node(&site, "/blog/a");
//! assert_eq!(node.kind(), NodeKind::Document);
//! assert_eq!(urls_of(&site, NodeKind::Document), vec!["/", "/blog/a"]);
//! ```

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::node::{Node, NodeKind};
use crate::scan::ScanRoots;
use crate::site::Site;

// =========================================================================
// Fixture setup
// =========================================================================

/// Write `contents` to `root/relative`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

/// Create a temp project containing the given `(path, contents)` files.
///
/// Tests get an isolated tree they can mutate without affecting other tests.
pub fn setup_project(files: &[(&str, &str)]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for (relative, contents) in files {
        write_file(tmp.path(), relative, contents);
    }
    tmp
}

/// Scan roots with the stock directory names under `project`.
pub fn roots(project: &Path) -> ScanRoots {
    ScanRoots {
        content: project.join("content"),
        statics: project.join("static"),
        resources: project.join("resources"),
    }
}

/// Front matter document with just a title.
pub fn titled(title: &str, body: &str) -> String {
    format!("---\ntitle: {title}\n---\n{body}")
}

// =========================================================================
// Site lookups: panics with a clear message on miss
// =========================================================================

/// Find a node by output path. Panics if not found.
pub fn find_node<'a>(site: &'a Site, url: &str) -> &'a Node {
    site.get_by_path(url).unwrap_or_else(|| {
        let urls: Vec<&str> = site.urls().map(|u| u.as_str()).collect();
        panic!("node '{url}' not found. Available: {urls:?}")
    })
}

// =========================================================================
// Bulk extractors
// =========================================================================

/// Output paths of every node of `kind`, in discovery order.
pub fn urls_of(site: &Site, kind: NodeKind) -> Vec<&str> {
    site.of_kind(kind).map(|n| n.path().as_str()).collect()
}

/// Output paths of the children of the node at `url`.
pub fn child_urls<'a>(site: &'a Site, url: &str) -> Vec<&'a str> {
    find_node(site, url)
        .children()
        .iter()
        .map(|&id| site[id].path().as_str())
        .collect()
}
