//! Node metadata extraction.
//!
//! Metadata is an ordered YAML mapping attached to every node. It comes from
//! three places, depending on the node kind:
//!
//! ## Front matter (documents)
//!
//! A markdown file may open with a `---`-delimited YAML block:
//!
//! ```text
//! ---
//! title: Hello
//! tags: [intro]
//! ---
//! Body text handed to the markdown renderer.
//! ```
//!
//! The split is a three-state line scan ([`extract`]): lines before the first
//! delimiter are dropped, lines between the first two delimiters are the
//! metadata block, and everything after the second delimiter is the body,
//! verbatim (later `---` lines included). A file with no delimiter at all has
//! empty metadata and is entirely body.
//!
//! ## Sidecar files (static files and resources)
//!
//! `logo.png` picks up metadata from `logo.meta` next to it. Sidecars are
//! plain YAML mappings ([`read_sidecar`]).
//!
//! ## Data files
//!
//! `.yaml`/`.yml` files in the content tree are decoded whole ([`read_data`])
//! and merged into the site-wide data mapping.

use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Ordered metadata mapping carried by every node.
pub type Metadata = Mapping;

/// Front matter delimiter line.
pub const DELIMITER: &str = "---";

/// Sidecar metadata file extension.
pub const SIDECAR_EXTENSION: &str = "meta";

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("cannot read source file {path}: {source}")]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed metadata in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("metadata in {0} is not a mapping")]
    NotAMapping(PathBuf),
}

/// Raw split of a text file: the metadata block and the body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Extracted {
    pub metadata: String,
    pub body: String,
}

/// Split `text` into its front matter block and body.
pub fn extract(text: &str) -> Extracted {
    #[derive(PartialEq)]
    enum State {
        SeekingStart,
        Metadata,
        Body,
    }

    let mut state = State::SeekingStart;
    let mut out = Extracted::default();

    for line in text.split_inclusive('\n') {
        let is_delimiter = line.trim_end_matches(['\n', '\r']) == DELIMITER;
        match state {
            State::SeekingStart if is_delimiter => state = State::Metadata,
            State::SeekingStart => {}
            State::Metadata if is_delimiter => state = State::Body,
            State::Metadata => out.metadata.push_str(line),
            State::Body => out.body.push_str(line),
        }
    }

    if state == State::SeekingStart {
        // No front matter at all: the whole file is content.
        out.body = text.to_string();
    }
    out
}

/// Decode a YAML block into a mapping. Empty or `null` input is an empty mapping.
pub fn decode_mapping(text: &str, path: &Path) -> Result<Metadata, MetadataError> {
    if text.trim().is_empty() {
        return Ok(Metadata::new());
    }
    let value: Value = serde_yaml::from_str(text).map_err(|source| MetadataError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    match value {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Null => Ok(Metadata::new()),
        _ => Err(MetadataError::NotAMapping(path.to_path_buf())),
    }
}

fn read_source(path: &Path) -> Result<String, MetadataError> {
    fs::read_to_string(path).map_err(|source| MetadataError::SourceRead {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a document: front matter decoded, body returned raw.
pub fn read_document(path: &Path) -> Result<(Metadata, String), MetadataError> {
    let text = read_source(path)?;
    let Extracted { metadata, body } = extract(&text);
    Ok((decode_mapping(&metadata, path)?, body))
}

/// Read a whole-file YAML data mapping.
pub fn read_data(path: &Path) -> Result<Metadata, MetadataError> {
    let text = read_source(path)?;
    decode_mapping(&text, path)
}

/// Path of the sidecar for `source`: last extension replaced by `.meta`.
pub fn sidecar_path(source: &Path) -> PathBuf {
    source.with_extension(SIDECAR_EXTENSION)
}

/// Whether `path` is itself a sidecar file.
pub fn is_sidecar(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == SIDECAR_EXTENSION)
}

/// Read the sidecar metadata for `source`, if one exists.
pub fn read_sidecar(source: &Path) -> Result<Option<Metadata>, MetadataError> {
    let sidecar = sidecar_path(source);
    if !sidecar.is_file() {
        return Ok(None);
    }
    read_data(&sidecar).map(Some)
}

/// Merge `overlay` into `base`; overlay keys win, insertion order of `base` is kept.
pub fn merge(base: &mut Metadata, overlay: Metadata) {
    for (key, value) in overlay {
        base.insert(key, value);
    }
}
