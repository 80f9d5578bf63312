//! The node model.
//!
//! A [`Node`] is one addressable unit of the site. Its kind is carried by a
//! [`Payload`] variant, fixed at construction:
//!
//! | Kind | Source | Output | Post-processing |
//! |---|---|---|---|
//! | Document | `.md` file | rendered page | markdown → HTML |
//! | Index | none (directory) | rendered page | none |
//! | Data | `.yaml` file | none | none |
//! | Resource | compiled asset | compiled file | compiler for its suffix |
//! | Static | passthrough asset | symlink | metadata only (image size) |
//! | Internal | none (directory) | none | none |
//!
//! Nodes live in a [`Site`](crate::site::Site) arena and refer to each other
//! by [`NodeId`]. Each node owns its metadata mapping and children list.

use crate::imaging::ImageBackend;
use crate::metadata::Metadata;
use crate::naming::OutputPath;
use crate::resource::{ResourceError, ResourceKind};
use pulldown_cmark::{Options, Parser, html as md_html};
use serde::Serialize;
use serde::ser::SerializeStruct;
use serde_yaml::Value;
use std::fmt;
use std::path::{Path, PathBuf};

/// Index of a node inside its site, in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    Resource,
    Index,
    Document,
    Data,
    Static,
    Internal,
}

impl NodeKind {
    /// Whether nodes of this kind render a page through a template.
    pub fn renders_page(self) -> bool {
        matches!(self, NodeKind::Document | NodeKind::Index)
    }

    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Resource => "resource",
            NodeKind::Index => "index",
            NodeKind::Document => "document",
            NodeKind::Data => "data",
            NodeKind::Static => "static",
            NodeKind::Internal => "internal",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind-specific node data.
#[derive(Debug, Clone)]
pub enum Payload {
    Document { raw_body: String },
    Resource { kind: ResourceKind },
    Data,
    Static,
    Index,
    Internal,
}

/// File extensions whose dimensions are recorded on static nodes.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Metadata key holding `[width, height]` for static images.
pub const IMAGE_SIZE_KEY: &str = "image_size";

#[derive(Debug, Clone)]
pub struct Node {
    source: Option<PathBuf>,
    path: OutputPath,
    pub metadata: Metadata,
    content: Option<String>,
    payload: Payload,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl Node {
    fn new(source: Option<PathBuf>, path: OutputPath, metadata: Metadata, payload: Payload) -> Self {
        Self {
            source,
            path,
            metadata,
            content: None,
            payload,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn document(source: PathBuf, path: OutputPath, metadata: Metadata, raw_body: String) -> Self {
        Self::new(Some(source), path, metadata, Payload::Document { raw_body })
    }

    pub fn data(source: PathBuf, path: OutputPath, metadata: Metadata) -> Self {
        Self::new(Some(source), path, metadata, Payload::Data)
    }

    pub fn resource(source: PathBuf, path: OutputPath, kind: ResourceKind, metadata: Metadata) -> Self {
        Self::new(Some(source), path, metadata, Payload::Resource { kind })
    }

    pub fn static_file(source: PathBuf, path: OutputPath, metadata: Metadata) -> Self {
        Self::new(Some(source), path, metadata, Payload::Static)
    }

    pub fn index(path: OutputPath) -> Self {
        Self::new(None, path, Metadata::new(), Payload::Index)
    }

    pub fn internal(path: OutputPath) -> Self {
        Self::new(None, path, Metadata::new(), Payload::Internal)
    }

    pub fn kind(&self) -> NodeKind {
        match self.payload {
            Payload::Document { .. } => NodeKind::Document,
            Payload::Resource { .. } => NodeKind::Resource,
            Payload::Data => NodeKind::Data,
            Payload::Static => NodeKind::Static,
            Payload::Index => NodeKind::Index,
            Payload::Internal => NodeKind::Internal,
        }
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn path(&self) -> &OutputPath {
        &self.path
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Rendered content; `None` until the process stage has run.
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// Raw markdown body, for documents.
    pub fn raw_body(&self) -> Option<&str> {
        match &self.payload {
            Payload::Document { raw_body } => Some(raw_body),
            _ => None,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn meta(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    pub fn page(&self) -> Page<'_> {
        Page { node: self }
    }

    /// Produce `content` for the kinds that have any: documents render their
    /// markdown body, resources run their compiler. Other kinds are untouched.
    pub fn process_content(&mut self) -> Result<(), ResourceError> {
        match &self.payload {
            Payload::Document { raw_body } => {
                self.content = Some(render_markdown(raw_body));
            }
            Payload::Resource { kind } => {
                // Resources are always constructed with a source.
                if let Some(source) = &self.source {
                    self.content = Some(kind.compile(source)?);
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Add derived metadata to static files. Only images gain anything
    /// (`image_size: [width, height]`); unreadable images are skipped.
    pub fn update_metadata(&mut self, images: &dyn ImageBackend) {
        if !matches!(self.payload, Payload::Static) {
            return;
        }
        let Some(source) = &self.source else {
            return;
        };
        let is_image = source
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.as_str()));
        if !is_image {
            return;
        }
        match images.identify(source) {
            Ok(dims) => {
                let size = Value::Sequence(vec![Value::from(dims.width), Value::from(dims.height)]);
                self.metadata.insert(Value::from(IMAGE_SIZE_KEY), size);
            }
            Err(e) => log::warn!("could not read image size of {}: {}", source.display(), e),
        }
    }

    #[cfg(test)]
    pub(crate) fn set_content(&mut self, content: impl Into<String>) {
        self.content = Some(content.into());
    }
}

/// Render markdown to HTML with the common extensions enabled.
pub fn render_markdown(body: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS;
    let parser = Parser::new_ext(body, options);
    let mut html = String::with_capacity(body.len() * 3 / 2);
    md_html::push_html(&mut html, parser);
    html
}

/// Template-facing projection of a node: `url`, `meta`, `content`, nothing else.
#[derive(Clone, Copy)]
pub struct Page<'a> {
    node: &'a Node,
}

impl<'a> Page<'a> {
    pub fn url(&self) -> &'a str {
        self.node.path.as_str()
    }

    pub fn meta(&self) -> &'a Metadata {
        &self.node.metadata
    }

    pub fn content(&self) -> Option<&'a str> {
        self.node.content()
    }
}

impl fmt::Debug for Page<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page").field("url", &self.url()).finish()
    }
}

impl Serialize for Page<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut page = serializer.serialize_struct("Page", 3)?;
        page.serialize_field("url", self.url())?;
        page.serialize_field("meta", self.meta())?;
        page.serialize_field("content", &self.content())?;
        page.end()
    }
}
