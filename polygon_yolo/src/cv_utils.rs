use crate::config::{OverlayConfig, MAX_THICKNESS};
use crate::yolo_format::YoloBox;
use image::{ImageFormat, Rgb, RgbImage};
use imageproc::{drawing::draw_hollow_rect_mut, rect::Rect};
use std::{fs, io::Cursor, path::Path};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CvUtilsError {
    #[error("Failed to read image {path}: {source}")]
    ReadImageFailed {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to decode image: {0}")]
    DecodeImageFailed(image::ImageError),
    #[error("Failed to encode image: {0}")]
    EncodeImageFailed(image::ImageError),
}

pub struct CvImage {
    pub image: RgbImage,
}

impl CvImage {
    pub fn new(image: RgbImage) -> Self {
        Self { image }
    }

    pub fn open(path: &Path) -> Result<Self, CvUtilsError> {
        let bytes = fs::read(path).map_err(|source| CvUtilsError::ReadImageFailed {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CvUtilsError> {
        let image = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| CvUtilsError::DecodeImageFailed(e.into()))?
            .decode()
            .map_err(CvUtilsError::DecodeImageFailed)?;

        Ok(Self {
            image: image.to_rgb8(),
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Draws each box as an outline `thickness` pixels wide, growing outward
    /// from the box edge. Parts outside the image are clipped.
    ///
    /// Corners are clamped to one outline width beyond the image, which keeps
    /// the rectangle arithmetic in range for arbitrarily large coordinates
    /// without changing which pixels get drawn.
    pub fn annotate(&mut self, boxes: &[YoloBox], overlay: &OverlayConfig) -> &mut Self {
        let (width, height) = self.dimensions();
        let color = Rgb(overlay.color);
        let thickness = i64::from(overlay.thickness.min(MAX_THICKNESS));
        let clamp_x =
            |v: f64| snap_to_pixel(v).clamp(-thickness - 1, i64::from(width) + thickness);
        let clamp_y =
            |v: f64| snap_to_pixel(v).clamp(-thickness - 1, i64::from(height) + thickness);

        for yolo_box in boxes {
            let bbox = yolo_box.to_pixels(width, height);
            let x1 = clamp_x(bbox.x_min);
            let y1 = clamp_y(bbox.y_min);
            let x2 = clamp_x(bbox.x_max);
            let y2 = clamp_y(bbox.y_max);

            tracing::debug!(
                "Drawing class {} at ({}, {}) - ({}, {})",
                yolo_box.class_id,
                x1,
                y1,
                x2,
                y2
            );

            for offset in 0..thickness {
                let rect_width = (x2 - x1 + 1 + 2 * offset).max(1) as u32;
                let rect_height = (y2 - y1 + 1 + 2 * offset).max(1) as u32;
                let rect = Rect::at((x1 - offset) as i32, (y1 - offset) as i32)
                    .of_size(rect_width, rect_height);
                draw_hollow_rect_mut(&mut self.image, rect, color);
            }
        }
        self
    }

    /// Encodes the image to `path`, picking the format from its extension.
    pub fn save(&self, path: &Path) -> Result<(), CvUtilsError> {
        let format = ImageFormat::from_path(path).map_err(CvUtilsError::EncodeImageFailed)?;
        self.image
            .save_with_format(path, format)
            .map_err(CvUtilsError::EncodeImageFailed)?;

        tracing::info!("Annotated image saved to {}", path.display());
        Ok(())
    }
}

/// Truncates to an integer pixel after dropping sub-micropixel float noise,
/// so `9.999999999999998` lands on 10 while `10.7` still lands on 10.
/// Out-of-range values saturate.
fn snap_to_pixel(value: f64) -> i64 {
    ((value * 1e6).round() / 1e6) as i64
}
