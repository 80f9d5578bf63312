//! Output writing.
//!
//! Stages 4 and 5 of the liara build pipeline. Renders every page through its
//! routed template and lays the assets out next to them.
//!
//! ## Output Structure
//!
//! ```text
//! public/
//! ├── index.html                 # "/" (section root or Index)
//! ├── about/
//! │   └── index.html             # Document "/about"
//! ├── blog/
//! │   ├── index.html             # Index "/blog"
//! │   ├── first/index.html
//! │   └── theme.css              # Resource, compiled content
//! ├── css/site.css               # Resource from the resource root
//! └── img/logo.png -> /abs/project/static/img/logo.png
//! ```
//!
//! ## Rules
//!
//! - Documents render first, then Indices, each in discovery order.
//! - A page at path `P` is written to `<output>P/index.html`.
//! - Resources are written to `<output>P` with their compiled content.
//! - Static files are symlinked to the absolute path of their source. A
//!   destination that already exists is left alone.
//! - Data and Internal nodes produce nothing.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::node::{Node, NodeKind};
use crate::site::Site;
use crate::template::{Bindings, Router, TemplateEngine, TemplateError};

/// Page file written inside each page's directory.
pub const PAGE_FILE: &str = "index.html";

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("rendering {url}: {source}")]
    Render {
        url: String,
        #[source]
        source: TemplateError,
    },
}

/// What the output stages wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateReport {
    pub pages: usize,
    pub resources: usize,
    pub statics: usize,
}

fn write_error(path: &Path) -> impl FnOnce(io::Error) -> GenerateError + '_ {
    move |source| GenerateError::Write {
        path: path.to_path_buf(),
        source,
    }
}

/// Remove a previous build's output directory, if there is one.
pub fn clean_output(output_dir: &Path) -> Result<(), GenerateError> {
    if output_dir.exists() {
        log::info!("removing {}", output_dir.display());
        fs::remove_dir_all(output_dir).map_err(write_error(output_dir))?;
    }
    Ok(())
}

/// Render every Document, then every Index, to `<output>/<path>/index.html`.
pub fn render_pages(
    site: &Arc<Site>,
    router: &Router,
    engine: &dyn TemplateEngine,
    output_dir: &Path,
) -> Result<usize, GenerateError> {
    let ids = site
        .ids_of(NodeKind::Document)
        .iter()
        .chain(site.ids_of(NodeKind::Index));

    let mut pages = 0;
    for &id in ids {
        let node = &site[id];
        let url = node.path().as_str();
        let render_error = |source: TemplateError| GenerateError::Render {
            url: url.to_string(),
            source,
        };

        let template = router.resolve(url).map_err(render_error)?;
        let html = engine
            .render(template, &Bindings::new(site.clone(), id))
            .map_err(render_error)?;

        let dir = node.path().under(output_dir);
        fs::create_dir_all(&dir).map_err(write_error(&dir))?;
        let file = dir.join(PAGE_FILE);
        fs::write(&file, html).map_err(write_error(&file))?;
        log::debug!("rendered {url} with {template}");
        pages += 1;
    }
    Ok(pages)
}

/// Write compiled resources and link static files into the output tree.
pub fn emit_assets(site: &Site, output_dir: &Path) -> Result<(usize, usize), GenerateError> {
    for node in site.resources() {
        write_resource(node, output_dir)?;
    }
    for node in site.statics() {
        link_static(node, output_dir)?;
    }
    Ok((site.resources().count(), site.statics().count()))
}

/// Both output stages in order: pages, then assets.
pub fn generate(
    site: &Arc<Site>,
    router: &Router,
    engine: &dyn TemplateEngine,
    output_dir: &Path,
) -> Result<GenerateReport, GenerateError> {
    let pages = render_pages(site, router, engine, output_dir)?;
    let (resources, statics) = emit_assets(site, output_dir)?;
    Ok(GenerateReport {
        pages,
        resources,
        statics,
    })
}

fn ensure_parent(path: &Path) -> Result<(), GenerateError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_error(parent))?;
    }
    Ok(())
}

fn write_resource(node: &Node, output_dir: &Path) -> Result<(), GenerateError> {
    let dest = node.path().under(output_dir);
    ensure_parent(&dest)?;
    fs::write(&dest, node.content().unwrap_or_default()).map_err(write_error(&dest))?;
    log::debug!("wrote {}", dest.display());
    Ok(())
}

fn link_static(node: &Node, output_dir: &Path) -> Result<(), GenerateError> {
    let Some(source) = node.source() else {
        return Ok(());
    };
    let dest = node.path().under(output_dir);
    ensure_parent(&dest)?;
    let target = std::path::absolute(source).map_err(write_error(source))?;

    match link(&target, &dest) {
        Ok(()) => {
            log::debug!("linked {} -> {}", dest.display(), target.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(write_error(&dest)(e)),
    }
}

#[cfg(unix)]
fn link(target: &Path, dest: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, dest)
}

#[cfg(not(unix))]
fn link(target: &Path, dest: &Path) -> io::Result<()> {
    if dest.exists() {
        return Err(io::Error::from(io::ErrorKind::AlreadyExists));
    }
    fs::copy(target, dest).map(|_| ())
}
