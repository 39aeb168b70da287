//! Decides whether a file is an image.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Enough leading bytes for every signature the image crate knows
const SNIFF_LEN: usize = 32;

/// Recognized image formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Jpeg,
    Png,
    WebP,
    Gif,
    Bmp,
    Tiff,
    Unknown,
}

impl ImageFormat {
    /// Detect format from the first bytes of a file
    pub fn from_signature(bytes: &[u8]) -> Self {
        match image::guess_format(bytes) {
            Ok(image::ImageFormat::Jpeg) => ImageFormat::Jpeg,
            Ok(image::ImageFormat::Png) => ImageFormat::Png,
            Ok(image::ImageFormat::WebP) => ImageFormat::WebP,
            Ok(image::ImageFormat::Gif) => ImageFormat::Gif,
            Ok(image::ImageFormat::Bmp) => ImageFormat::Bmp,
            Ok(image::ImageFormat::Tiff) => ImageFormat::Tiff,
            _ => ImageFormat::Unknown,
        }
    }

    /// Check if this format is supported
    pub fn is_supported(&self) -> bool {
        !matches!(self, ImageFormat::Unknown)
    }
}

/// Answers "is this file an image?"
///
/// A known extension settles it without touching the disk. Anything else is
/// sniffed from its leading bytes, and a file that cannot be read is simply
/// not an image.
#[derive(Debug, Clone)]
pub struct ImageClassifier {
    /// File extensions accepted without sniffing
    extensions: HashSet<String>,
    /// Whether to sniff files with unknown or missing extensions
    sniff_content: bool,
}

impl ImageClassifier {
    /// Create a classifier with the default image extensions
    pub fn new() -> Self {
        Self {
            extensions: [
                "jpg", "jpeg", "png", "webp", "heic", "heif", "gif", "bmp", "tiff", "tif",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            sniff_content: true,
        }
    }

    /// Override the list of extensions to accept
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions.into_iter().map(|e| e.to_lowercase()).collect();
        self
    }

    /// Turn content sniffing on or off
    pub fn with_content_sniffing(mut self, sniff: bool) -> Self {
        self.sniff_content = sniff;
        self
    }

    /// Check whether the file at `path` is an image
    pub fn is_image(&self, path: &Path) -> bool {
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            if self.extensions.contains(&ext.to_lowercase()) {
                return true;
            }
        }

        self.sniff_content && Self::sniff(path).is_supported()
    }

    fn sniff(path: &Path) -> ImageFormat {
        let mut header = Vec::with_capacity(SNIFF_LEN);
        let read = File::open(path)
            .and_then(|file| file.take(SNIFF_LEN as u64).read_to_end(&mut header));

        match read {
            Ok(_) => ImageFormat::from_signature(&header),
            Err(e) => {
                tracing::debug!("Could not probe {}: {}", path.display(), e);
                ImageFormat::Unknown
            }
        }
    }
}

impl Default for ImageClassifier {
    fn default() -> Self {
        Self::new()
    }
}
