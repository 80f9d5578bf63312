//! Output path naming: how a source file becomes a site URL.
//!
//! Every node in the site is keyed by an [`OutputPath`], a POSIX-style path
//! with a leading `/`. Two mapping modes exist:
//!
//! - **Page mode** ([`output_path`]): documents and directory roots become
//!   directory-style URLs, so the final segment loses its extension.
//!   `content/blog/hello.md` → `/blog/hello`.
//! - **Asset mode** ([`asset_output_path`]): static files and resources keep
//!   their full suffix chain. `static/dist/app.tar.gz` → `/dist/app.tar.gz`.
//!
//! The root directory itself always maps to `/`.
//!
//! ## Suffix chains
//!
//! A file name's suffix chain is every dot-separated suffix after the first
//! segment, ignoring a leading dot (so `.htaccess` has none):
//!
//! - `archive.tar.gz` → `.tar.gz`
//! - `style.scss` → `.scss`
//! - `README` → `` (empty)

use serde::Serialize;
use std::borrow::Borrow;
use std::fmt;
use std::path::{Component, Path};

/// A canonical site-relative path: POSIX separators, leading `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct OutputPath(String);

impl OutputPath {
    /// The site root, `/`.
    pub fn root() -> Self {
        OutputPath("/".to_string())
    }

    /// Build from path segments. Empty segments are dropped.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut path = String::new();
        for segment in segments {
            let segment = segment.as_ref();
            if segment.is_empty() {
                continue;
            }
            path.push('/');
            path.push_str(segment);
        }
        if path.is_empty() {
            Self::root()
        } else {
            OutputPath(path)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Where this path lands under an output directory.
    ///
    /// `/blog/post` under `out/` is `out/blog/post`; `/` is `out` itself.
    pub fn under(&self, output_root: &Path) -> std::path::PathBuf {
        let mut fs_path = output_root.to_path_buf();
        for segment in self.0.split('/').filter(|s| !s.is_empty()) {
            fs_path.push(segment);
        }
        fs_path
    }
}

impl fmt::Display for OutputPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for OutputPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for OutputPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for OutputPath {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for OutputPath {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Relative segments of `source` under `root`, lossily converted to UTF-8.
///
/// Returns `None` when `source` is not inside `root`.
fn relative_segments(source: &Path, root: &Path) -> Option<Vec<String>> {
    let relative = source.strip_prefix(root).ok()?;
    Some(
        relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect(),
    )
}

/// Remove the last extension from a file name, keeping leading-dot names intact.
fn strip_last_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => name,
        Some(pos) => &name[..pos],
    }
}

/// The suffix chain of a file name, e.g. `.tar.gz` for `archive.tar.gz`.
pub fn suffixes(name: &str) -> &str {
    let trimmed = name.trim_start_matches('.');
    let offset = name.len() - trimmed.len();
    match trimmed.find('.') {
        Some(pos) => &name[offset + pos..],
        None => "",
    }
}

/// The last suffix of a file name, lowercased, without the dot (`gz` for `a.tar.gz`).
pub fn last_suffix(name: &str) -> Option<String> {
    match name.rfind('.') {
        Some(0) | None => None,
        Some(pos) => Some(name[pos + 1..].to_ascii_lowercase()),
    }
}

/// Page-mode mapping: strip the last extension of the final segment.
///
/// `root` itself maps to `/`. A `source` outside `root` is mapped from its
/// file name alone.
pub fn output_path(source: &Path, root: &Path) -> OutputPath {
    if source == root {
        return OutputPath::root();
    }
    let mut segments = relative_segments(source, root).unwrap_or_else(|| {
        source
            .file_name()
            .map(|n| vec![n.to_string_lossy().into_owned()])
            .unwrap_or_default()
    });
    if let Some(last) = segments.last_mut() {
        *last = strip_last_extension(last).to_string();
    }
    OutputPath::from_segments(segments)
}

/// Asset-mode mapping: keep the full suffix chain of the final segment.
pub fn asset_output_path(source: &Path, root: &Path) -> OutputPath {
    if source == root {
        return OutputPath::root();
    }
    let stripped = output_path(source, root);
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let chain = suffixes(&name);
    if chain.is_empty() {
        return stripped;
    }
    // The page-mode path dropped only the last suffix; rebuild the name from
    // the stem before the whole chain plus the chain itself.
    let stem = &name[..name.len() - chain.len()];
    replace_last_segment(&stripped, &format!("{stem}{chain}"))
}

/// Replace the last extension of a path's final segment.
///
/// `/css/theme.dark.scss` with `css` → `/css/theme.dark.css`.
pub fn with_extension(path: &OutputPath, extension: &str) -> OutputPath {
    if path.is_root() {
        return path.clone();
    }
    let last = path.as_str().rsplit('/').next().unwrap_or_default();
    let stem = strip_last_extension(last);
    replace_last_segment(path, &format!("{stem}.{extension}"))
}

fn replace_last_segment(path: &OutputPath, name: &str) -> OutputPath {
    let mut segments: Vec<&str> = path.as_str().split('/').filter(|s| !s.is_empty()).collect();
    segments.pop();
    segments.push(name);
    OutputPath::from_segments(segments)
}
