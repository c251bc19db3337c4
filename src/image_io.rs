use std::fs;
use std::path::{Path, PathBuf};

use image::{GrayImage, ImageFormat, RgbImage};

use crate::errors::{RootAngleError, Result};
use crate::image_utils::alpha_mask;

/// Photo extensions probed in order; each is tried upper case first, then lower case
pub const PHOTO_EXTENSIONS: [&str; 4] = ["JPG", "JPEG", "PNG", "TIFF"];

/// Extension of the segmentation files
pub const SEGMENTATION_EXTENSION: &str = "png";

/// Segmentation file names (not paths) in `dir`, sorted
pub fn list_segmentation_files<P: AsRef<Path>>(dir: P) -> Result<Vec<String>> {
    let dir = dir.as_ref();

    if !dir.is_dir() {
        return Err(RootAngleError::InvalidPath(dir.to_path_buf()));
    }

    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }

        let is_segmentation = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case(SEGMENTATION_EXTENSION))
            .unwrap_or(false);

        if is_segmentation {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }
    }

    names.sort();
    Ok(names)
}

/// File name without its extension
pub fn base_name(file_name: &str) -> &str {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
}

/// Locate the photograph that a segmentation file was made from
pub fn find_photo<P: AsRef<Path>>(photo_dir: P, file_name: &str) -> Result<PathBuf> {
    let photo_dir = photo_dir.as_ref();
    let stem = base_name(file_name);

    for ext in PHOTO_EXTENSIONS {
        for candidate in [ext.to_string(), ext.to_ascii_lowercase()] {
            let path = photo_dir.join(format!("{}.{}", stem, candidate));
            if path.is_file() {
                return Ok(path);
            }
        }
    }

    Err(RootAngleError::MissingPhoto {
        file: file_name.to_string(),
        dir: photo_dir.to_path_buf(),
    })
}

/// Load a segmentation raster and return its alpha channel as a binary mask
pub fn load_mask<P: AsRef<Path>>(path: P) -> Result<GrayImage> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(RootAngleError::InvalidPath(path.to_path_buf()));
    }

    let img = image::open(path)?;
    Ok(alpha_mask(&img.to_rgba8()))
}

pub fn load_photo<P: AsRef<Path>>(path: P) -> Result<RgbImage> {
    Ok(image::open(path)?.to_rgb8())
}

/// Save a diagnostic composite as JPEG
pub fn save_debug_image<P: AsRef<Path>>(image: &RgbImage, path: P) -> Result<()> {
    image.save_with_format(path, ImageFormat::Jpeg)?;
    Ok(())
}
