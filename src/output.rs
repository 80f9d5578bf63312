//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. The primary display
//! for every node is its semantic identity (positional index and title) with
//! the output path after an arrow. Source files are secondary context on
//! indented `Source:` lines, so the output reads as a content inventory while
//! still tracing every page back to the file it came from.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Content
//! 001 Home → /
//!     Source: content/_index.md
//!     001 About → /about
//!         Source: content/about.md
//!     002 blog (2 children) → /blog
//!         001 First → /blog/first
//!             Source: content/blog/first.md
//!         002 Second → /blog/second
//!             Source: content/blog/second.md
//!
//! Resources
//! 001 /css/site.css
//!     Source: resources/css/site.scss
//!
//! Static
//! 001 /img/logo.png
//!     Source: static/img/logo.png
//!
//! Found 4 documents, 1 index, 1 resource, 1 static file, 0 data files
//! ```
//!
//! ## Build
//!
//! ```text
//! Broken links
//!     /blog/first → /nowhere
//!
//! Rendered 4 pages, wrote 1 resource, linked 1 static file
//! ```
//!
//! # Architecture
//!
//! Each report has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use serde_json::json;
use std::path::Path;

use crate::node::{Node, NodeId, NodeKind};
use crate::pipeline::BuildReport;
use crate::site::Site;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `n thing` / `n things`.
fn plural(n: usize, singular: &str, plural: &str) -> String {
    if n == 1 {
        format!("{n} {singular}")
    } else {
        format!("{n} {plural}")
    }
}

/// Display title of a node: its `title` metadata, else its last path segment.
fn display_title(node: &Node) -> String {
    if let Some(title) = node.meta("title").and_then(|t| t.as_str()) {
        return title.to_string();
    }
    match node.path().as_str().rsplit('/').next() {
        Some(last) if !last.is_empty() => last.to_string(),
        _ => "(root)".to_string(),
    }
}

/// Format an entity header: positional index + title, with child count for
/// directory nodes.
///
/// ```text
/// 001 Home
/// 002 blog (2 children)
/// ```
fn entity_header(index: usize, title: &str, children: Option<usize>) -> String {
    match children {
        Some(n) => format!("{} {} ({})", format_index(index), title, plural(n, "child", "children")),
        None => format!("{} {}", format_index(index), title),
    }
}

/// `Source:` context line, relative to the project root when possible.
fn source_line(node: &Node, project_root: &Path, depth: usize) -> Option<String> {
    let source = node.source()?;
    let shown = source.strip_prefix(project_root).unwrap_or(source);
    Some(format!("{}Source: {}", indent(depth), shown.display()))
}

// ============================================================================
// Tree walker
// ============================================================================

/// A flattened node from walking the content tree.
struct TreeNode {
    depth: usize,
    position: usize,
    id: NodeId,
}

/// Walk the content tree from its top-level nodes, assigning positional
/// indices per sibling level.
fn walk_content_tree(site: &Site) -> Vec<TreeNode> {
    let tops: Vec<NodeId> = site
        .ids()
        .filter(|&id| {
            let node = &site[id];
            node.parent().is_none() && is_content(node)
        })
        .collect();
    let mut nodes = Vec::new();
    walk_recursive(site, &tops, 0, &mut nodes);
    nodes
}

fn walk_recursive(site: &Site, ids: &[NodeId], depth: usize, nodes: &mut Vec<TreeNode>) {
    for (i, &id) in ids.iter().enumerate() {
        nodes.push(TreeNode {
            depth,
            position: i + 1,
            id,
        });
        walk_recursive(site, site[id].children(), depth + 1, nodes);
    }
}

/// Nodes that belong to the content tree (everything but the flat roots).
fn is_content(node: &Node) -> bool {
    match node.kind() {
        NodeKind::Static => false,
        // Resource-root files are registered without a parent.
        NodeKind::Resource => node.parent().is_some(),
        _ => true,
    }
}

// ============================================================================
// Check output
// ============================================================================

/// Format the discovered site: the content tree, then the flat resource and
/// static listings, then a count line.
pub fn format_site(site: &Site, project_root: &Path) -> Vec<String> {
    let mut lines = Vec::new();

    let tree = walk_content_tree(site);
    if !tree.is_empty() {
        lines.push("Content".to_string());
    }
    for entry in &tree {
        let node = &site[entry.id];
        let children = match node.kind() {
            NodeKind::Index | NodeKind::Internal => Some(node.children().len()),
            _ => None,
        };
        let header = entity_header(entry.position, &display_title(node), children);
        let shown = match node.kind() {
            NodeKind::Internal | NodeKind::Data => header,
            _ => format!("{header} \u{2192} {}", node.path()),
        };
        lines.push(format!("{}{}", indent(entry.depth), shown));
        lines.extend(source_line(node, project_root, entry.depth + 1));
    }

    let flat_resources: Vec<&Node> = site
        .resources()
        .filter(|n| n.parent().is_none())
        .collect();
    let statics: Vec<&Node> = site.statics().collect();
    for (title, group) in [("Resources", flat_resources), ("Static", statics)] {
        if group.is_empty() {
            continue;
        }
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(title.to_string());
        for (i, node) in group.iter().enumerate() {
            lines.push(format!("{} {}", format_index(i + 1), node.path()));
            lines.extend(source_line(node, project_root, 1));
        }
    }

    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format_counts(site));
    lines
}

/// One-line node count summary.
pub fn format_counts(site: &Site) -> String {
    let count = |kind| site.ids_of(kind).len();
    format!(
        "Found {}, {}, {}, {}, {}",
        plural(count(NodeKind::Document), "document", "documents"),
        plural(count(NodeKind::Index), "index", "indices"),
        plural(count(NodeKind::Resource), "resource", "resources"),
        plural(count(NodeKind::Static), "static file", "static files"),
        plural(count(NodeKind::Data), "data file", "data files"),
    )
}

/// Print the discovered site to stdout.
pub fn print_site(site: &Site, project_root: &Path) {
    for line in format_site(site, project_root) {
        println!("{}", line);
    }
}

/// Machine-readable dump of every node, in registration order.
pub fn site_json(site: &Site) -> Result<serde_json::Value, serde_json::Error> {
    let mut nodes = Vec::with_capacity(site.len());
    for node in site.nodes() {
        nodes.push(json!({
            "kind": node.kind().name(),
            "url": node.path().as_str(),
            "source": node.source().map(|s| s.display().to_string()),
            "parent": node.parent().map(|p| site[p].path().as_str()),
            "children": node.children().len(),
            "meta": serde_json::to_value(&node.metadata)?,
        }));
    }
    Ok(json!({ "nodes": nodes, "data": serde_json::to_value(site.data())? }))
}

// ============================================================================
// Build output
// ============================================================================

/// Format a finished build: broken links first, then the totals.
pub fn format_build_report(report: &BuildReport) -> Vec<String> {
    let mut lines = Vec::new();

    if !report.link_warnings.is_empty() {
        lines.push("Broken links".to_string());
        for warning in &report.link_warnings {
            lines.push(format!("    {} \u{2192} {}", warning.page, warning.target));
        }
        lines.push(String::new());
    }

    lines.push(format!(
        "Rendered {}, wrote {}, linked {}",
        plural(report.pages, "page", "pages"),
        plural(report.resources, "resource", "resources"),
        plural(report.statics, "static file", "static files"),
    ));
    lines
}

/// Print build output to stdout.
pub fn print_build_report(report: &BuildReport) {
    for line in format_build_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
