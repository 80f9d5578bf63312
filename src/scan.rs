//! Filesystem discovery.
//!
//! Stage 1 of the liara build pipeline. Walks the three source roots and
//! registers one [`Node`] per discovered entry into a fresh [`Site`].
//!
//! ## Directory Structure
//!
//! ```text
//! project/
//! ├── config.toml                  # Project configuration (optional)
//! ├── content/                     # Content root
//! │   ├── _index.md                # Section root: Document at "/"
//! │   ├── about.md                 # Document at "/about"
//! │   ├── authors.yaml             # Data, merged into site.data
//! │   └── blog/                    # Index at "/blog" (more than one file)
//! │       ├── first.md             # Document at "/blog/first"
//! │       ├── second.md
//! │       ├── theme.scss           # Resource at "/blog/theme.css"
//! │       └── theme.meta           # Sidecar metadata for theme.scss
//! ├── static/                      # Static root: linked verbatim
//! │   └── img/logo.png             # Static at "/img/logo.png"
//! └── resources/                   # Resource root: compiled
//!     └── css/site.scss            # Resource at "/css/site.css"
//! ```
//!
//! ## Content Root Rules
//!
//! Directories are visited depth-first, parent before children, entries in
//! file-name order. Per directory:
//!
//! 1. A file whose name starts with `_index` becomes a Document at the
//!    directory's own path (the section root). A markdown `_index` wins over
//!    other `_index` files; the rest are ignored.
//! 2. Without one, the directory becomes an **Index** when it holds more than
//!    one content file, otherwise an **Internal** node.
//! 3. Every other file is classified by extension: `.md` → Document,
//!    `.yaml`/`.yml` → Data, anything else → Resource through the
//!    [`ResourceFactory`].
//!
//! The directory node adopts every file node in the directory and the
//! directory nodes of its subdirectories.
//!
//! ## Skipped Entries
//!
//! - Hidden entries (names starting with `.`), files and directories alike
//! - Sidecar `.meta` files; they are read on behalf of their asset
//!
//! ## Missing Roots
//!
//! A root that does not exist contributes no nodes. Every source root is
//! optional; a project with no content at all scans to an empty site.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use crate::metadata::{self, MetadataError};
use crate::naming;
use crate::node::{Node, NodeId};
use crate::resource::ResourceFactory;
use crate::site::{Site, SiteError};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error(transparent)]
    Site(#[from] SiteError),
    #[error("No resource type registered for '{suffix}' files: {path}")]
    UnsupportedResourceType { suffix: String, path: PathBuf },
}

/// The three source roots a site is discovered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRoots {
    pub content: PathBuf,
    pub statics: PathBuf,
    pub resources: PathBuf,
}

/// Reserved file name prefix for section roots.
pub const SECTION_PREFIX: &str = "_index";

const DOCUMENT_EXTENSIONS: &[&str] = &["md"];
const DATA_EXTENSIONS: &[&str] = &["yaml", "yml"];

pub fn scan(roots: &ScanRoots, factory: &ResourceFactory) -> Result<Site, ScanError> {
    let mut site = Site::new();

    if roots.content.is_dir() {
        scan_directory(&roots.content, &roots.content, &mut site, factory)?;
    }

    for source in collect_files(&roots.statics)? {
        let path = naming::asset_output_path(&source, &roots.statics);
        let metadata = metadata::read_sidecar(&source)?.unwrap_or_default();
        site.add(Node::static_file(source, path, metadata))?;
    }

    for source in collect_files(&roots.resources)? {
        let node = resource_node(&source, &roots.resources, factory)?;
        site.add(node)?;
    }

    Ok(site)
}

/// Register `path` and everything below it. Returns the directory's node.
fn scan_directory(
    path: &Path,
    root: &Path,
    site: &mut Site,
    factory: &ResourceFactory,
) -> Result<NodeId, ScanError> {
    let entries = collect_entries(path)?;
    let files: Vec<&PathBuf> = entries.iter().filter(|e| e.is_file()).collect();
    let subdirs: Vec<&PathBuf> = entries.iter().filter(|e| e.is_dir()).collect();

    let dir_path = naming::output_path(path, root);
    let sections: Vec<&PathBuf> = files.iter().copied().filter(|f| is_section(f)).collect();
    let section = sections
        .iter()
        .copied()
        .find(|f| has_extension(f, DOCUMENT_EXTENSIONS))
        .or_else(|| sections.first().copied());

    let dir_id = match section {
        Some(section) => {
            let (metadata, body) = metadata::read_document(section)?;
            site.add(Node::document(section.clone(), dir_path, metadata, body))?
        }
        None if files.len() > 1 => site.add(Node::index(dir_path))?,
        None => site.add(Node::internal(dir_path))?,
    };

    for file in files.iter().copied().filter(|f| !is_section(f)) {
        let node = content_node(file, root, factory)?;
        let id = site.add(node)?;
        site.adopt(dir_id, id);
    }

    for subdir in subdirs {
        let child = scan_directory(subdir, root, site, factory)?;
        site.adopt(dir_id, child);
    }

    Ok(dir_id)
}

/// Classify one content-root file by extension.
fn content_node(source: &Path, root: &Path, factory: &ResourceFactory) -> Result<Node, ScanError> {
    let ext = source
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if DOCUMENT_EXTENSIONS.contains(&ext.as_str()) {
        let (metadata, body) = metadata::read_document(source)?;
        let path = naming::output_path(source, root);
        Ok(Node::document(source.to_path_buf(), path, metadata, body))
    } else if DATA_EXTENSIONS.contains(&ext.as_str()) {
        let metadata = metadata::read_data(source)?;
        let path = naming::output_path(source, root);
        Ok(Node::data(source.to_path_buf(), path, metadata))
    } else {
        resource_node(source, root, factory)
    }
}

fn resource_node(source: &Path, root: &Path, factory: &ResourceFactory) -> Result<Node, ScanError> {
    let kind = factory
        .kind_for(source)
        .ok_or_else(|| ScanError::UnsupportedResourceType {
            suffix: naming::suffixes(&file_name(source)).to_string(),
            path: source.to_path_buf(),
        })?;

    let mut path = naming::asset_output_path(source, root);
    if let Some(ext) = kind.output_extension() {
        path = naming::with_extension(&path, ext);
    }
    let metadata = metadata::read_sidecar(source)?.unwrap_or_default();
    Ok(Node::resource(source.to_path_buf(), path, kind, metadata))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn is_section(path: &Path) -> bool {
    file_name(path).starts_with(SECTION_PREFIX)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .is_some_and(|e| extensions.contains(&e.to_string_lossy().to_lowercase().as_str()))
}

fn is_hidden(path: &Path) -> bool {
    file_name(path).starts_with('.')
}

/// Direct entries of a content directory, sorted, with skipped entries removed.
fn collect_entries(path: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let mut entries: Vec<PathBuf> = fs::read_dir(path)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| !is_hidden(p) && !(p.is_file() && metadata::is_sidecar(p)))
        .collect();

    entries.sort();
    Ok(entries)
}

/// Every non-hidden, non-sidecar file under an asset root, in walk order.
fn collect_files(root: &Path) -> Result<Vec<PathBuf>, ScanError> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()));
    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_file() && !metadata::is_sidecar(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
