//! Pure Rust image backend.
//!
//! Dimensions come from `image::image_dimensions`, which reads only the
//! header of JPEG, PNG, GIF, TIFF and WebP files.

use super::backend::{BackendError, Dimensions, ImageBackend};
use std::path::Path;

#[derive(Debug, Default, Clone, Copy)]
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::ProcessingFailed(format!(
                "Failed to read dimensions of {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(Dimensions { width, height })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_png(path: &Path, width: u32, height: u32) {
        image::RgbImage::new(width, height).save(path).unwrap();
    }

    #[test]
    fn identify_synthetic_png() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.png");
        create_test_png(&path, 200, 150);

        let dims = RustBackend::new().identify(&path).unwrap();
        assert_eq!(dims, Dimensions { width: 200, height: 150 });
    }

    #[test]
    fn identify_nonexistent_file_errors() {
        let result = RustBackend::new().identify(Path::new("/nonexistent/image.jpg"));
        assert!(result.is_err());
    }

    #[test]
    fn identify_non_image_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("fake.png");
        std::fs::write(&path, "not an image").unwrap();
        assert!(RustBackend::new().identify(&path).is_err());
    }
}
