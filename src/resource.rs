//! Compiled resources.
//!
//! A resource is an asset that is transformed before it is written, unlike a
//! static file which is linked verbatim. The set of transformations is closed:
//! each [`ResourceKind`] variant knows how to compile its sources and what
//! extension its output carries.
//!
//! | Kind | Suffixes | Output | Crate |
//! |---|---|---|---|
//! | Sass | `.sass`, `.scss` | `.css` | `grass` |
//!
//! The [`ResourceFactory`] maps file suffixes to kinds. Discovery asks it for
//! every non-document, non-data file; a suffix with no registered kind is a
//! configuration error, never a silent skip.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::naming;

#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("failed to compile {path}: {message}")]
    Compile { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Sass,
}

impl ResourceKind {
    pub fn name(self) -> &'static str {
        match self {
            ResourceKind::Sass => "sass",
        }
    }

    /// Extension the compiled output is written with, if it differs from the source.
    pub fn output_extension(self) -> Option<&'static str> {
        match self {
            ResourceKind::Sass => Some("css"),
        }
    }

    pub fn compile(self, source: &Path) -> Result<String, ResourceError> {
        match self {
            ResourceKind::Sass => {
                grass::from_path(source, &grass::Options::default()).map_err(|e| {
                    ResourceError::Compile {
                        path: source.to_path_buf(),
                        message: e.to_string(),
                    }
                })
            }
        }
    }
}

/// Suffix → kind registry used during discovery.
#[derive(Debug, Clone)]
pub struct ResourceFactory {
    known: HashMap<String, ResourceKind>,
}

impl Default for ResourceFactory {
    fn default() -> Self {
        let mut factory = Self::empty();
        factory.register(&["sass", "scss"], ResourceKind::Sass);
        factory
    }
}

impl ResourceFactory {
    /// A factory with no kinds registered.
    pub fn empty() -> Self {
        Self {
            known: HashMap::new(),
        }
    }

    /// Register `kind` for each suffix (with or without the leading dot,
    /// case-insensitive). Later registrations replace earlier ones.
    pub fn register(&mut self, suffixes: &[&str], kind: ResourceKind) {
        for suffix in suffixes {
            let key = suffix.trim_start_matches('.').to_ascii_lowercase();
            self.known.insert(key, kind);
        }
    }

    /// Kind for a source file, keyed by its last suffix.
    pub fn kind_for(&self, source: &Path) -> Option<ResourceKind> {
        let name = source.file_name()?.to_string_lossy();
        let suffix = naming::last_suffix(&name)?;
        self.known.get(&suffix).copied()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_factory_knows_sass() {
        let factory = ResourceFactory::default();
        assert_eq!(factory.kind_for(Path::new("css/site.scss")), Some(ResourceKind::Sass));
        assert_eq!(factory.kind_for(Path::new("css/site.sass")), Some(ResourceKind::Sass));
        assert_eq!(factory.kind_for(Path::new("css/SITE.SCSS")), Some(ResourceKind::Sass));
    }

    #[test]
    fn unknown_suffix_has_no_kind() {
        let factory = ResourceFactory::default();
        assert_eq!(factory.kind_for(Path::new("img/logo.png")), None);
        assert_eq!(factory.kind_for(Path::new("Makefile")), None);
    }

    #[test]
    fn register_accepts_dotted_suffixes() {
        let mut factory = ResourceFactory::empty();
        assert!(factory.is_empty());
        factory.register(&[".css"], ResourceKind::Sass);
        assert_eq!(factory.kind_for(Path::new("a.css")), Some(ResourceKind::Sass));
    }

    #[test]
    fn sass_outputs_css() {
        assert_eq!(ResourceKind::Sass.output_extension(), Some("css"));
    }

    #[test]
    fn compile_scss() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("site.scss");
        fs::write(&path, "$accent: red;\na { b { color: $accent; } }\n").unwrap();

        let css = ResourceKind::Sass.compile(&path).unwrap();
        assert!(css.contains("a b"));
        assert!(css.contains("color: red"));
    }

    #[test]
    fn compile_error_names_the_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.scss");
        fs::write(&path, "a { color: $undefined; }\n").unwrap();

        let err = ResourceKind::Sass.compile(&path).unwrap_err();
        assert!(err.to_string().contains("broken.scss"));
    }
}
