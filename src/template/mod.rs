//! Template routing and rendering.
//!
//! Rendering a page takes two steps: the [`Router`] picks a template name
//! from the page's output path, then a [`TemplateEngine`] renders that
//! template with three bindings:
//!
//! | Binding | Contents |
//! |---|---|
//! | `site` | `data`, `documents`, `indices`, `resources`, `static`, `internal`, `urls`, `select()` |
//! | `page` | `url`, `meta`, `content` |
//! | `node` | `kind`, `url`, `source`, `meta`, `content`, `parent`, `children`, `select_children()` |
//!
//! The engine is a trait so the build pipeline can be exercised with a
//! recording engine in tests. [`MiniJinjaEngine`] is the production
//! implementation; `jinja2` is the only backend name accepted in config.

mod engine;
mod router;
mod view;

pub use engine::MiniJinjaEngine;
pub use router::{Route, Router};
pub use view::{NodeView, QueryView, SiteView};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::config::TemplatesConfig;
use crate::node::{Node, NodeId};
use crate::site::Site;

/// Backend name accepted in `templates.backend`.
pub const JINJA2_BACKEND: &str = "jinja2";

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("no template route matches {0}")]
    NoRoute(String),
    #[error("invalid route pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    #[error("cannot read routes file {path}: {source}")]
    RoutesRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed routes: {0}")]
    Routes(#[from] serde_yaml::Error),
    #[error("unknown template backend '{0}' (expected 'jinja2')")]
    UnknownBackend(String),
    #[error("template error: {0}")]
    Render(#[from] minijinja::Error),
}

/// What a template sees for one renderable node.
#[derive(Debug, Clone)]
pub struct Bindings {
    pub site: Arc<Site>,
    pub node: NodeId,
}

impl Bindings {
    pub fn new(site: Arc<Site>, node: NodeId) -> Self {
        Self { site, node }
    }

    pub fn node(&self) -> &Node {
        &self.site[self.node]
    }
}

pub trait TemplateEngine: Sync {
    fn render(&self, name: &str, bindings: &Bindings) -> Result<String, TemplateError>;
}

/// Engine for the configured backend, loading templates from `templates_dir`.
pub fn engine_for(
    config: &TemplatesConfig,
    templates_dir: &Path,
) -> Result<Box<dyn TemplateEngine>, TemplateError> {
    match config.backend.as_str() {
        JINJA2_BACKEND => Ok(Box::new(MiniJinjaEngine::new(templates_dir))),
        other => Err(TemplateError::UnknownBackend(other.to_string())),
    }
}
