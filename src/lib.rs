//! # Liara
//!
//! A file-driven static site generator. A directory of markdown, YAML and
//! assets is the whole data source: the tree of files becomes a tree of typed
//! nodes, templates query that tree, and the result is written as a plain
//! directory of HTML pages and assets.
//!
//! # Architecture: Five-Stage Pipeline
//!
//! ```text
//! 1. Discover   content/ static/ resources/  →  Site    (filesystem → nodes)
//! 2. Validate   Site                          →  Site    (every document titled)
//! 3. Process    Site                          →  Site    (markdown, Sass, image sizes)
//! 4. Render     Site + routes + templates     →  output/ (one index.html per page)
//! 5. Emit       Site                          →  output/ (resources, static links)
//! ```
//!
//! The [`Site`](site::Site) built in stage 1 is the single source of truth for
//! every later stage. It is structurally frozen after discovery; processing
//! only fills in node content, and rendering shares it read-only with the
//! template engine.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Stage 1: walks the three source roots and registers nodes |
//! | [`process`] | Stage 3: parallel content processing and link validation |
//! | [`generate`] | Stages 4-5: page rendering, resource writing, static linking |
//! | [`pipeline`] | Runs the stages in order, validation included |
//! | [`site`] | The node arena, keyed by output path, with typed collections |
//! | [`node`] | `Node`, `NodeKind`, the `Page` projection seen by templates |
//! | [`query`] | Tag filters and title/tag sorting over site nodes |
//! | [`template`] | URL → template routing, the minijinja engine, template views |
//! | [`naming`] | Source path → output path mapping |
//! | [`metadata`] | Front matter, data files, `.meta` sidecars |
//! | [`resource`] | Compiled asset kinds (Sass/SCSS) |
//! | [`imaging`] | Image dimensions for static files |
//! | [`config`] | `config.toml` loading, validation, stock defaults |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Output Paths as Identity
//!
//! Every node is addressed by its output path (`/blog/first`). Two sources
//! mapping to the same path is an error at discovery time rather than a
//! silent overwrite at write time.
//!
//! ## Templates Query, They Don't Walk
//!
//! Templates get the whole site plus a small query language
//! (`site.select().with_tag("post").sorted_by_title().pages()`), so listing
//! pages needs no Rust code and no per-site configuration.
//!
//! ## Routing by Longest Glob
//!
//! One YAML file maps URL globs to templates. The most specific (longest)
//! pattern wins, so a catch-all `/*` and a precise `/blog/index` coexist
//! without ordering rules.

pub mod config;
pub mod generate;
pub mod imaging;
pub mod metadata;
pub mod naming;
pub mod node;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod query;
pub mod resource;
pub mod scan;
pub mod site;
pub mod template;

#[cfg(test)]
pub(crate) mod test_helpers;
