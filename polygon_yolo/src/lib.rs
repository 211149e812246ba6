pub mod app;
pub mod bounding_box;
pub mod config;
pub mod cv_utils;
pub mod label;
pub mod yolo_format;

pub use app::{start_app, ErrorKind, PipelineError, PipelineReport};
