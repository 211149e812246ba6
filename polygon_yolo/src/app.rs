use crate::bounding_box::{BoundingBox, BoxError};
use crate::config::Config;
use crate::cv_utils::{CvImage, CvUtilsError};
use crate::label::{read_label_file, LabelError};
use crate::yolo_format::{write_labels, FormatError, YoloBox};
use std::{fmt, path::PathBuf};
use thiserror::Error;
use tracing::instrument;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Label error: {0}")]
    Label(#[from] LabelError),
    #[error("Bounding box error: {0}")]
    BoundingBox(#[from] BoxError),
    #[error("YOLO format error: {0}")]
    Format(#[from] FormatError),
    #[error("Cv utils error: {0}")]
    CvUtils(#[from] CvUtilsError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Parse,
    Validation,
    ZeroDimension,
    Image,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Io => "io",
            ErrorKind::Parse => "parse",
            ErrorKind::Validation => "validation",
            ErrorKind::ZeroDimension => "zero_dimension",
            ErrorKind::Image => "image",
        };
        f.write_str(name)
    }
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Label(LabelError::ReadFailed(_)) => ErrorKind::Io,
            PipelineError::Label(LabelError::InvalidClassId { .. })
            | PipelineError::Label(LabelError::InvalidCoordinate { .. }) => ErrorKind::Parse,
            PipelineError::Label(LabelError::Empty)
            | PipelineError::Label(LabelError::BlankLine(_))
            | PipelineError::BoundingBox(_) => ErrorKind::Validation,
            PipelineError::Format(FormatError::ZeroDimension { .. }) => ErrorKind::ZeroDimension,
            PipelineError::Format(FormatError::WriteFailed(_))
            | PipelineError::CvUtils(CvUtilsError::ReadImageFailed { .. }) => ErrorKind::Io,
            PipelineError::CvUtils(_) => ErrorKind::Image,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub lines: Vec<String>,
    pub image_width: u32,
    pub image_height: u32,
    pub output_path: PathBuf,
    pub preview_path: Option<PathBuf>,
}

/// Runs the whole conversion for one image/label pair.
///
/// The label file is written only once every annotation has been parsed,
/// reduced and normalized. Drawing and the preview happen after the write.
#[instrument(skip(config), fields(image = %config.paths.image.display(), label = %config.paths.label.display()))]
pub fn start_app(config: &Config) -> Result<PipelineReport, PipelineError> {
    let mut cv_image = CvImage::open(&config.paths.image)?;
    let (image_width, image_height) = cv_image.dimensions();
    tracing::info!("Loaded image {}x{}", image_width, image_height);

    let annotations = read_label_file(&config.paths.label, config.annotation.line_mode)?;

    let yolo_boxes = annotations
        .iter()
        .map(|annotation| -> Result<YoloBox, PipelineError> {
            let bbox = BoundingBox::from_annotation(annotation)?;
            tracing::debug!("Reduced polygon to {:?}", bbox);
            Ok(YoloBox::from_bounding_box(&bbox, image_width, image_height)?)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let lines = write_labels(&config.paths.output, &yolo_boxes)?;

    cv_image.annotate(&yolo_boxes, &config.overlay);
    if let Some(preview_path) = &config.paths.preview {
        cv_image.save(preview_path)?;
    }

    Ok(PipelineReport {
        lines,
        image_width,
        image_height,
        output_path: config.paths.output.clone(),
        preview_path: config.paths.preview.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnnotationConfig, LineMode, LogLevel, OverlayConfig, PathsConfig};
    use image::{ImageFormat, Rgb, RgbImage};
    use std::{fs, path::Path};

    fn write_fixture(dir: &Path, label: &str, width: u32, height: u32) -> Config {
        let image_path = dir.join("image.png");
        RgbImage::new(width, height)
            .save_with_format(&image_path, ImageFormat::Png)
            .expect("write image");

        let label_path = dir.join("label.txt");
        fs::write(&label_path, label).expect("write label");

        Config {
            log_level: LogLevel::Info,
            paths: PathsConfig {
                image: image_path,
                label: label_path,
                output: dir.join("output.txt"),
                preview: Some(dir.join("preview.png")),
            },
            annotation: AnnotationConfig::default(),
            overlay: OverlayConfig::default(),
        }
    }

    #[test]
    fn test_square_end_to_end() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config = write_fixture(dir.path(), "0 10 10 50 10 50 50 10 50\n", 100, 100);

        let report = start_app(&config).unwrap();

        assert_eq!(report.lines, vec!["0 0.3 0.3 0.4 0.4"]);
        assert_eq!((report.image_width, report.image_height), (100, 100));
        assert_eq!(
            fs::read_to_string(&config.paths.output).unwrap(),
            "0 0.3 0.3 0.4 0.4\n"
        );

        let preview = image::open(dir.path().join("preview.png")).unwrap().to_rgb8();
        assert_eq!(*preview.get_pixel(10, 10), Rgb([0, 255, 0]));
        assert_eq!(*preview.get_pixel(50, 50), Rgb([0, 255, 0]));
        assert_eq!(*preview.get_pixel(30, 30), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_first_line_only_by_default() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config = write_fixture(dir.path(), "1 0 0 20 20\n2 5 5 10 10\n", 40, 40);

        let report = start_app(&config).unwrap();
        assert_eq!(report.lines, vec!["1 0.25 0.25 0.5 0.5"]);
    }

    #[test]
    fn test_all_lines_mode() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let mut config = write_fixture(dir.path(), "1 0 0 20 20\n\n2 20 20 40 40\n", 40, 40);
        config.annotation.line_mode = LineMode::All;

        let report = start_app(&config).unwrap();
        assert_eq!(
            fs::read_to_string(&config.paths.output).unwrap(),
            "1 0.25 0.25 0.5 0.5\n2 0.75 0.75 0.5 0.5\n"
        );
        assert_eq!(report.lines.len(), 2);
    }

    #[test]
    fn test_odd_coordinates_write_nothing() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config = write_fixture(dir.path(), "0 10 10 50 10 50\n", 100, 100);

        let err = start_app(&config).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(!config.paths.output.exists());
        assert!(!dir.path().join("preview.png").exists());
    }

    #[test]
    fn test_later_bad_line_writes_nothing() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let mut config = write_fixture(dir.path(), "0 1 1 2 2\n1 3 x\n", 10, 10);
        config.annotation.line_mode = LineMode::All;

        let err = start_app(&config).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(!config.paths.output.exists());
    }

    #[test]
    fn test_error_kinds() {
        let dir = tempfile::tempdir().expect("create temp dir");

        let config = write_fixture(dir.path(), "", 10, 10);
        assert_eq!(start_app(&config).unwrap_err().kind(), ErrorKind::Validation);

        let mut config = write_fixture(dir.path(), "0 1 1", 10, 10);
        config.paths.label = dir.path().join("missing.txt");
        assert_eq!(start_app(&config).unwrap_err().kind(), ErrorKind::Io);

        let config = write_fixture(dir.path(), "0 1 1", 10, 10);
        fs::write(&config.paths.image, b"not an image").expect("overwrite image");
        assert_eq!(start_app(&config).unwrap_err().kind(), ErrorKind::Image);
    }

    #[test]
    fn test_far_off_image_polygon() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config = write_fixture(dir.path(), "0 -1e12 0 1e12 10\n", 10, 10);

        let report = start_app(&config).unwrap();

        assert_eq!(report.lines, vec!["0 0 0.5 200000000000 1"]);
        let preview = image::open(dir.path().join("preview.png")).unwrap().to_rgb8();
        assert!((0..10).all(|x| *preview.get_pixel(x, 0) == Rgb([0, 255, 0])));
        assert!((0..10).all(|x| (1..10).all(|y| *preview.get_pixel(x, y) == Rgb([0, 0, 0]))));
    }

    #[test]
    fn test_preview_is_optional() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let mut config = write_fixture(dir.path(), "0 2 2 8 8", 10, 10);
        config.paths.preview = None;

        let report = start_app(&config).unwrap();

        assert_eq!(report.preview_path, None);
        assert!(!dir.path().join("preview.png").exists());
        assert!(config.paths.output.exists());
    }
}
