//! Content processing.
//!
//! Stage 3 of the liara build pipeline. Produces node content in parallel,
//! then checks internal links across the processed site.
//!
//! ## Per-Node Work
//!
//! | Kind | Work |
//! |---|---|
//! | Document | markdown body → HTML (`pulldown-cmark`) |
//! | Resource | compile source (`grass` for Sass/SCSS) |
//! | Static | record `image_size: [w, h]` for jpg/png/gif/webp images |
//! | Index, Data, Internal | nothing |
//!
//! ## Parallel Processing
//!
//! Nodes are processed with [rayon](https://docs.rs/rayon) in a pool sized by
//! [`effective_threads`](crate::config::effective_threads). The pool iterates
//! the site's node slice mutably, so every worker writes only into the node it
//! was handed and results stay in discovery order regardless of completion
//! order. The first failing node aborts the stage.
//!
//! ## Link Validation
//!
//! After processing, every document's markdown is scanned for links and
//! images pointing at site-root paths (`/about`, `/img/logo.png#top`),
//! including `href`/`src` attributes of raw HTML in the body. A
//! target that is not a known output path yields a [`LinkWarning`]. Warnings
//! are advisory: they are logged and reported, never fatal. Relative and
//! external links are not checked.

use pulldown_cmark::{Event, Parser, Tag};
use rayon::prelude::*;
use std::fmt;
use thiserror::Error;

use crate::config::{SiteConfig, effective_threads};
use crate::imaging::{ImageBackend, RustBackend};
use crate::naming::OutputPath;
use crate::node::{IMAGE_SIZE_KEY, Node, NodeKind};
use crate::resource::ResourceError;
use crate::site::Site;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Thread pool error: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
    #[error(transparent)]
    Resource(#[from] ResourceError),
}

/// Configuration for content processing
#[derive(Debug, Clone)]
pub struct ProcessConfig {
    pub threads: usize,
}

impl ProcessConfig {
    /// Build a ProcessConfig from SiteConfig values.
    pub fn from_site_config(config: &SiteConfig) -> Self {
        Self {
            threads: effective_threads(&config.processing),
        }
    }
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self::from_site_config(&SiteConfig::default())
    }
}

/// A site-root link in a document that resolves to no node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkWarning {
    pub page: OutputPath,
    pub target: String,
}

impl fmt::Display for LinkWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" referenced in \"{}\" does not exist", self.target, self.page)
    }
}

/// What the process stage did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessReport {
    pub documents: usize,
    pub resources: usize,
    pub images: usize,
    pub link_warnings: Vec<LinkWarning>,
}

pub fn process(site: &mut Site, config: &ProcessConfig) -> Result<ProcessReport, ProcessError> {
    process_with_backend(&RustBackend::new(), site, config)
}

/// Process content using a specific image backend (allows testing with mock).
pub fn process_with_backend(
    backend: &impl ImageBackend,
    site: &mut Site,
    config: &ProcessConfig,
) -> Result<ProcessReport, ProcessError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()?;
    log::info!("processing {} nodes on {} threads", site.len(), config.threads);

    pool.install(|| {
        site.nodes_mut()
            .par_iter_mut()
            .try_for_each(|node| process_node(node, backend))
    })?;

    let link_warnings = validate_links(site);
    for warning in &link_warnings {
        log::warn!("{warning}");
    }

    Ok(ProcessReport {
        documents: site.documents().count(),
        resources: site.resources().count(),
        images: site
            .statics()
            .filter(|n| n.meta(IMAGE_SIZE_KEY).is_some())
            .count(),
        link_warnings,
    })
}

fn process_node(node: &mut Node, backend: &dyn ImageBackend) -> Result<(), ResourceError> {
    match node.kind() {
        NodeKind::Document | NodeKind::Resource => node.process_content(),
        NodeKind::Static => {
            node.update_metadata(backend);
            Ok(())
        }
        NodeKind::Index | NodeKind::Data | NodeKind::Internal => Ok(()),
    }
}

/// Site-root link targets in a markdown body, in document order.
///
/// Covers markdown links and images as well as `href`/`src` attributes in
/// raw HTML embedded in the body.
pub fn collect_site_links(markdown: &str) -> Vec<String> {
    Parser::new(markdown)
        .flat_map(|event| match event {
            Event::Start(Tag::Link { dest_url, .. }) | Event::Start(Tag::Image { dest_url, .. }) => {
                vec![dest_url.into_string()]
            }
            Event::Html(html) | Event::InlineHtml(html) => html_link_targets(&html),
            _ => Vec::new(),
        })
        .filter(|url| url.starts_with('/') && !url.starts_with("//"))
        .collect()
}

/// `href` and `src` attribute values in an HTML fragment, in source order.
fn html_link_targets(html: &str) -> Vec<String> {
    // ASCII lowercasing keeps byte offsets aligned with `html`.
    let lower = html.to_ascii_lowercase();
    let mut found: Vec<(usize, String)> = Vec::new();
    for attr in ["href", "src"] {
        for (start, _) in lower.match_indices(attr) {
            if !lower[..start].ends_with(|c: char| c.is_ascii_whitespace()) {
                continue;
            }
            let Some(rest) = html[start + attr.len()..].trim_start().strip_prefix('=') else {
                continue;
            };
            let rest = rest.trim_start();
            let value = match rest.chars().next() {
                Some(quote @ ('"' | '\'')) => rest[1..].split(quote).next(),
                _ => rest.split(|c: char| c.is_ascii_whitespace() || c == '>').next(),
            };
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                found.push((start, value.to_string()));
            }
        }
    }
    found.sort_by_key(|(start, _)| *start);
    found.into_iter().map(|(_, value)| value).collect()
}

/// Reduce a link target to the output path it refers to.
///
/// Fragment and query are dropped, as is a trailing slash (except for `/`).
pub fn normalize_link(target: &str) -> &str {
    let end = target.find(['#', '?']).unwrap_or(target.len());
    let path = &target[..end];
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

/// Check every document's site-root links against the site's output paths.
pub fn validate_links(site: &Site) -> Vec<LinkWarning> {
    let mut warnings = Vec::new();
    for node in site.documents() {
        let Some(body) = node.raw_body() else {
            continue;
        };
        for target in collect_site_links(body) {
            if !site.contains_path(normalize_link(&target)) {
                warnings.push(LinkWarning {
                    page: node.path().clone(),
                    target,
                });
            }
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Dimensions;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::metadata::Metadata;
    use crate::resource::ResourceFactory;
    use crate::scan::scan;
    use crate::test_helpers::*;
    use std::path::PathBuf;

    fn one_thread() -> ProcessConfig {
        ProcessConfig { threads: 1 }
    }

    fn doc(name: &str, body: &str) -> Node {
        Node::document(
            PathBuf::from(format!("content/{name}.md")),
            OutputPath::from_segments(name.split('/')),
            Metadata::new(),
            body.to_string(),
        )
    }

    // =========================================================================
    // ProcessConfig tests
    // =========================================================================

    #[test]
    fn process_config_from_site_config() {
        let mut config = SiteConfig::default();
        config.processing.max_processes = Some(1);
        assert_eq!(ProcessConfig::from_site_config(&config).threads, 1);
    }

    // =========================================================================
    // Processing tests
    // =========================================================================

    #[test]
    fn documents_get_html_content() {
        let mut site = Site::new();
        site.add(doc("a", "# A\n")).unwrap();
        site.add(doc("b", "*b*\n")).unwrap();

        let report = process_with_backend(&MockBackend::new(), &mut site, &one_thread()).unwrap();
        assert_eq!(report.documents, 2);
        assert_eq!(find_node(&site, "/a").content(), Some("<h1>A</h1>\n"));
        assert_eq!(find_node(&site, "/b").content(), Some("<p><em>b</em></p>\n"));
    }

    #[test]
    fn parallel_results_stay_in_their_nodes() {
        let mut site = Site::new();
        for i in 0..64 {
            site.add(doc(&format!("p{i}"), &format!("page {i}\n"))).unwrap();
        }
        let config = ProcessConfig { threads: 4 };
        process_with_backend(&MockBackend::new(), &mut site, &config).unwrap();

        for (i, node) in site.documents().enumerate() {
            assert_eq!(node.path().as_str(), format!("/p{i}"));
            assert_eq!(node.content(), Some(format!("<p>page {i}</p>\n").as_str()));
        }
    }

    #[test]
    fn resources_are_compiled() {
        let tmp = setup_project(&[("resources/site.scss", "$c: blue;\nbody { color: $c; }\n")]);
        let mut site = scan(&roots(tmp.path()), &ResourceFactory::default()).unwrap();

        let report = process_with_backend(&MockBackend::new(), &mut site, &one_thread()).unwrap();
        assert_eq!(report.resources, 1);
        let css = find_node(&site, "/site.css").content().unwrap();
        assert!(css.contains("color: blue"));
    }

    #[test]
    fn resource_compile_failure_aborts() {
        let tmp = setup_project(&[("resources/bad.scss", "a { color: $nope; }\n")]);
        let mut site = scan(&roots(tmp.path()), &ResourceFactory::default()).unwrap();
        let result = process_with_backend(&MockBackend::new(), &mut site, &one_thread());
        assert!(matches!(result, Err(ProcessError::Resource(_))));
    }

    #[test]
    fn static_images_are_identified() {
        let mut site = Site::new();
        site.add(Node::static_file(
            PathBuf::from("static/photo.jpg"),
            OutputPath::from_segments(["photo.jpg"]),
            Metadata::new(),
        ))
        .unwrap();
        site.add(Node::static_file(
            PathBuf::from("static/app.js"),
            OutputPath::from_segments(["app.js"]),
            Metadata::new(),
        ))
        .unwrap();

        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 1200,
            height: 800,
        }]);
        let report = process_with_backend(&backend, &mut site, &one_thread()).unwrap();

        assert_eq!(report.images, 1);
        assert_eq!(
            backend.get_operations(),
            vec![RecordedOp::Identify("static/photo.jpg".to_string())]
        );
    }

    #[test]
    fn other_kinds_are_untouched() {
        let mut site = Site::new();
        site.add(Node::index(OutputPath::root())).unwrap();
        process_with_backend(&MockBackend::new(), &mut site, &one_thread()).unwrap();
        assert!(find_node(&site, "/").content().is_none());
    }

    // =========================================================================
    // Link validation tests
    // =========================================================================

    #[test]
    fn collects_site_root_links_and_images() {
        let links = collect_site_links(
            "[a](/about) [ext](https://x.org) [rel](other) ![i](/img/a.png) [p](//cdn.x/y)",
        );
        assert_eq!(links, vec!["/about", "/img/a.png"]);
    }

    #[test]
    fn collects_links_from_raw_html() {
        let links = collect_site_links(
            "<a href=\"/missing\">x</a> <img src='/gone.png' srcset=\"/big.png 2x\">\n\n\
             <div class=\"nav\">\n<a HREF=/home>h</a> <a href=\"https://x.org\">e</a>\n</div>\n",
        );
        assert_eq!(links, vec!["/missing", "/gone.png", "/home"]);
    }

    #[test]
    fn broken_raw_html_links_are_warnings() {
        let mut site = Site::new();
        site.add(doc("a", "<a href=\"/missing\">x</a> <img src=\"/gone.png\">\n")).unwrap();

        let report = process_with_backend(&MockBackend::new(), &mut site, &one_thread()).unwrap();
        let targets: Vec<&str> = report.link_warnings.iter().map(|w| w.target.as_str()).collect();
        assert_eq!(targets, vec!["/missing", "/gone.png"]);
    }

    #[test]
    fn normalize_strips_fragment_query_and_slash() {
        assert_eq!(normalize_link("/about/"), "/about");
        assert_eq!(normalize_link("/about#team"), "/about");
        assert_eq!(normalize_link("/search?q=x"), "/search");
        assert_eq!(normalize_link("/"), "/");
        assert_eq!(normalize_link("/#top"), "/");
    }

    #[test]
    fn broken_links_are_warnings() {
        let mut site = Site::new();
        site.add(doc("a", "[ok](/b/) [broken](/missing) [ext](http://x)\n")).unwrap();
        site.add(doc("b", "back to [a](/a#top)\n")).unwrap();

        let report = process_with_backend(&MockBackend::new(), &mut site, &one_thread()).unwrap();
        assert_eq!(
            report.link_warnings,
            vec![LinkWarning {
                page: OutputPath::from_segments(["a"]),
                target: "/missing".to_string(),
            }]
        );
        assert_eq!(
            report.link_warnings[0].to_string(),
            "\"/missing\" referenced in \"/a\" does not exist"
        );
    }
}
