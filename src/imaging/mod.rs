//! Image metadata for static files.
//!
//! Static nodes are never transformed, but image files gain an `image_size`
//! metadata entry so templates can emit `width`/`height` attributes.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` (header only, no full decode) |
//!
//! The module is split into:
//! - **Backend**: [`ImageBackend`] trait, shared types, and a recording mock for tests
//! - **Rust backend**: [`RustBackend`], the production implementation

pub mod backend;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use rust_backend::RustBackend;
