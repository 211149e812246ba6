//! YOLO label lines: `class x_center y_center width height`, normalized to
//! the image size.

use crate::bounding_box::BoundingBox;
use std::{fmt, fs::File, io, io::Write, path::Path};
use thiserror::Error;

/// Decimal places kept when printing normalized values.
pub const PRECISION: usize = 6;

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Image dimensions must be non-zero, got {width}x{height}")]
    ZeroDimension { width: u32, height: u32 },
    #[error("Failed to write label file: {0}")]
    WriteFailed(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YoloBox {
    pub class_id: u32,
    pub x_center: f64,
    pub y_center: f64,
    pub width: f64,
    pub height: f64,
}

impl YoloBox {
    pub fn from_bounding_box(
        bbox: &BoundingBox,
        img_width: u32,
        img_height: u32,
    ) -> Result<Self, FormatError> {
        if img_width == 0 || img_height == 0 {
            return Err(FormatError::ZeroDimension {
                width: img_width,
                height: img_height,
            });
        }

        let (x_center, y_center) = bbox.center();
        let (width, height) = bbox.dimensions();
        let img_width = f64::from(img_width);
        let img_height = f64::from(img_height);

        Ok(Self {
            class_id: bbox.class_id,
            x_center: x_center / img_width,
            y_center: y_center / img_height,
            width: width / img_width,
            height: height / img_height,
        })
    }

    /// Scales the normalized box back to pixel extents for an image of the
    /// given size.
    pub fn to_pixels(&self, img_width: u32, img_height: u32) -> BoundingBox {
        let img_width = f64::from(img_width);
        let img_height = f64::from(img_height);
        let half_width = self.width / 2.0;
        let half_height = self.height / 2.0;

        BoundingBox::new(
            (self.x_center - half_width) * img_width,
            (self.y_center - half_height) * img_height,
            (self.x_center + half_width) * img_width,
            (self.y_center + half_height) * img_height,
        )
        .with_class_id(self.class_id)
    }
}

impl fmt::Display for YoloBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.class_id,
            format_value(self.x_center),
            format_value(self.y_center),
            format_value(self.width),
            format_value(self.height)
        )
    }
}

fn format_value(value: f64) -> String {
    let fixed = format!("{:.*}", PRECISION, value);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" => "0".to_string(),
        other => other.to_string(),
    }
}

/// Writes one line per box and returns the lines written.
pub fn write_labels(path: &Path, boxes: &[YoloBox]) -> Result<Vec<String>, FormatError> {
    let lines: Vec<String> = boxes.iter().map(YoloBox::to_string).collect();

    let mut file = File::create(path)?;
    for line in &lines {
        writeln!(file, "{}", line)?;
    }
    file.flush()?;

    tracing::info!("YOLO format saved to {}", path.display());
    Ok(lines)
}
