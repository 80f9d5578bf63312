//! The build pipeline.
//!
//! Runs the five stages over one project root:
//!
//! ```text
//! 1. Discover   content/ static/ resources/  →  Site
//! 2. Validate   every Document has a title
//! 3. Process    markdown, Sass, image sizes (parallel) + link check
//! 4. Render     Documents, then Indices  →  <output>/<path>/index.html
//! 5. Emit       resources written, static files symlinked
//! ```
//!
//! Stages 1-3 never touch the output directory, so a content error leaves
//! the previous build in place. The site is shared read-only with the
//! template engine once processing is done.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::config::{ConfigError, SiteConfig};
use crate::generate::{self, GenerateError};
use crate::imaging::{ImageBackend, RustBackend};
use crate::process::{self, LinkWarning, ProcessConfig, ProcessError};
use crate::resource::ResourceFactory;
use crate::scan::{self, ScanError};
use crate::site::Site;
use crate::template::{self, Router, TemplateEngine, TemplateError};

/// Metadata key every Document must define.
pub const TITLE_KEY: &str = "title";

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("{} has no 'title' in its front matter", path.display())]
    Validation { path: PathBuf },
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Generate(#[from] GenerateError),
}

/// Summary of a finished build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub pages: usize,
    pub resources: usize,
    pub statics: usize,
    pub link_warnings: Vec<LinkWarning>,
}

/// Every Document must carry a title. Stops at the first one that does not.
pub fn validate(site: &Site) -> Result<(), BuildError> {
    for node in site.documents() {
        if node.meta(TITLE_KEY).is_none() {
            let path = node
                .source()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(node.path().as_str()));
            return Err(BuildError::Validation { path });
        }
    }
    Ok(())
}

/// Discover and validate without processing or writing anything.
pub fn check(root: &Path, config: &SiteConfig) -> Result<Site, BuildError> {
    let site = scan::scan(&config.scan_roots(root), &ResourceFactory::default())?;
    validate(&site)?;
    Ok(site)
}

/// Build the project at `root` with the configured template backend.
pub fn build(root: &Path, config: &SiteConfig) -> Result<BuildReport, BuildError> {
    let engine = template::engine_for(&config.templates, &config.templates_dir(root))?;
    let router = Router::load(&config.routes_file(root))?;
    build_with(root, config, &router, engine.as_ref(), &RustBackend::new())
}

/// Build with explicit collaborators (allows testing with mocks).
pub fn build_with(
    root: &Path,
    config: &SiteConfig,
    router: &Router,
    engine: &dyn TemplateEngine,
    backend: &impl ImageBackend,
) -> Result<BuildReport, BuildError> {
    config.check_output_dir(root)?;

    log::info!("discovering content under {}", root.display());
    let mut site = check(root, config)?;
    log::info!("discovered {} nodes", site.len());

    log::info!("processing content");
    let processed =
        process::process_with_backend(backend, &mut site, &ProcessConfig::from_site_config(config))?;

    let output_dir = config.output_dir(root);
    if config.build.clean_output {
        generate::clean_output(&output_dir)?;
    }

    log::info!("rendering pages into {}", output_dir.display());
    let site = Arc::new(site);
    let pages = generate::render_pages(&site, router, engine, &output_dir)?;

    log::info!("emitting assets");
    let (resources, statics) = generate::emit_assets(&site, &output_dir)?;

    Ok(BuildReport {
        pages,
        resources,
        statics,
        link_warnings: processed.link_warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockBackend;
    use crate::template::tests::RecordingEngine;
    use crate::test_helpers::*;
    use std::fs;

    fn routes() -> Router {
        Router::from_yaml("/*: page.html\n").unwrap()
    }

    fn single_threaded() -> SiteConfig {
        let mut config = SiteConfig::default();
        config.processing.max_processes = Some(1);
        config
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn documents_without_title_fail_validation() {
        let tmp = setup_project(&[
            ("content/a.md", titled("A", "").as_str()),
            ("content/b.md", "no front matter\n"),
        ]);
        let err = check(tmp.path(), &SiteConfig::default()).unwrap_err();
        assert!(
            matches!(&err, BuildError::Validation { path } if path.ends_with("content/b.md")),
            "got {err}"
        );
    }

    #[test]
    fn indices_need_no_title() {
        let tmp = setup_project(&[
            ("content/a.md", titled("A", "").as_str()),
            ("content/b.md", titled("B", "").as_str()),
        ]);
        let site = check(tmp.path(), &SiteConfig::default()).unwrap();
        assert!(find_node(&site, "/").kind() == crate::node::NodeKind::Index);
    }

    #[test]
    fn validation_failure_writes_no_output() {
        let tmp = setup_project(&[("content/untitled.md", "Body\n")]);
        write_file(tmp.path(), "output/keep.txt", "previous build");
        let engine = RecordingEngine::default();

        let result = build_with(
            tmp.path(),
            &single_threaded(),
            &routes(),
            &engine,
            &MockBackend::new(),
        );
        assert!(matches!(result, Err(BuildError::Validation { .. })));
        assert!(engine.rendered.lock().unwrap().is_empty());
        assert_eq!(
            fs::read_to_string(tmp.path().join("output/keep.txt")).unwrap(),
            "previous build"
        );
    }

    #[test]
    fn output_dir_aliasing_content_is_refused_before_cleaning() {
        let tmp = setup_project(&[("content/a.md", titled("A", "").as_str())]);
        let mut config = single_threaded();
        config.output_directory = "./content".to_string();

        let result = build_with(
            tmp.path(),
            &config,
            &routes(),
            &RecordingEngine::default(),
            &MockBackend::new(),
        );
        assert!(matches!(result, Err(BuildError::Config(ConfigError::Validation(_)))));
        assert!(tmp.path().join("content/a.md").exists());
    }

    #[test]
    fn output_dir_at_project_root_is_refused() {
        let tmp = setup_project(&[("content/a.md", titled("A", "").as_str())]);
        let mut config = single_threaded();
        config.output_directory = ".".to_string();

        let result = build_with(
            tmp.path(),
            &config,
            &routes(),
            &RecordingEngine::default(),
            &MockBackend::new(),
        );
        assert!(matches!(result, Err(BuildError::Config(_))));
        assert!(tmp.path().join("content/a.md").exists());
    }

    // =========================================================================
    // Full build
    // =========================================================================

    #[test]
    fn build_writes_pages_resources_and_statics() {
        let tmp = setup_project(&[
            ("content/_index.md", titled("Home", "Welcome").as_str()),
            ("content/blog/first.md", titled("First", "[home](/)").as_str()),
            ("content/blog/second.md", titled("Second", "[gone](/nowhere)").as_str()),
            ("resources/site.scss", "body { margin: 0; }\n"),
            ("static/robots.txt", "User-agent: *\n"),
        ]);
        let engine = RecordingEngine::default();

        let report = build_with(
            tmp.path(),
            &single_threaded(),
            &routes(),
            &engine,
            &MockBackend::new(),
        )
        .unwrap();

        assert_eq!(report.pages, 4);
        assert_eq!(report.resources, 1);
        assert_eq!(report.statics, 1);
        assert_eq!(report.link_warnings.len(), 1);
        assert_eq!(report.link_warnings[0].target, "/nowhere");

        let out = tmp.path().join("output");
        assert_eq!(
            fs::read_to_string(out.join("index.html")).unwrap(),
            "page.html:/"
        );
        assert!(out.join("blog/index.html").exists());
        assert!(out.join("blog/first/index.html").exists());
        assert!(fs::read_to_string(out.join("site.css")).unwrap().contains("margin: 0"));
        assert!(out.join("robots.txt").exists());
    }

    #[test]
    fn clean_output_removes_stale_files() {
        let tmp = setup_project(&[("content/a.md", titled("A", "").as_str())]);
        write_file(tmp.path(), "output/stale.html", "old");

        build_with(
            tmp.path(),
            &single_threaded(),
            &routes(),
            &RecordingEngine::default(),
            &MockBackend::new(),
        )
        .unwrap();
        assert!(!tmp.path().join("output/stale.html").exists());
        assert!(tmp.path().join("output/a/index.html").exists());
    }

    #[test]
    fn keep_output_when_clean_is_disabled() {
        let tmp = setup_project(&[("content/a.md", titled("A", "").as_str())]);
        write_file(tmp.path(), "output/stale.html", "old");
        let mut config = single_threaded();
        config.build.clean_output = false;

        build_with(
            tmp.path(),
            &config,
            &routes(),
            &RecordingEngine::default(),
            &MockBackend::new(),
        )
        .unwrap();
        assert!(tmp.path().join("output/stale.html").exists());
    }

    #[test]
    fn missing_route_fails_the_build() {
        let tmp = setup_project(&[("content/about.md", titled("About", "").as_str())]);
        let router = Router::from_yaml("/blog/*: post.html\n").unwrap();
        let result = build_with(
            tmp.path(),
            &single_threaded(),
            &router,
            &RecordingEngine::default(),
            &MockBackend::new(),
        );
        assert!(matches!(result, Err(BuildError::Generate(GenerateError::Render { .. }))));
    }

    #[test]
    fn build_requires_routes_file() {
        let tmp = setup_project(&[("content/a.md", titled("A", "").as_str())]);
        let result = build(tmp.path(), &single_threaded());
        assert!(matches!(
            result,
            Err(BuildError::Template(TemplateError::RoutesRead { .. }))
        ));
    }
}
