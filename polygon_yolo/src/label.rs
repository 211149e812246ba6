use crate::config::LineMode;
use std::{
    fs::File,
    io::{self, BufRead},
    path::Path,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LabelError {
    #[error("Failed to read label file: {0}")]
    ReadFailed(#[from] io::Error),
    #[error("Label file is empty")]
    Empty,
    #[error("Line {0} is blank")]
    BlankLine(usize),
    #[error("Line {line}: invalid class id `{token}`")]
    InvalidClassId { line: usize, token: String },
    #[error("Line {line}: invalid coordinate `{token}`")]
    InvalidCoordinate { line: usize, token: String },
}

/// One polygon annotation: a class id followed by flat `x y` pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub class_id: u32,
    pub coords: Vec<f64>,
}

pub fn parse_line(line: &str, line_number: usize) -> Result<Annotation, LabelError> {
    let mut tokens = line.split_whitespace();
    let class_token = tokens.next().ok_or(LabelError::BlankLine(line_number))?;
    let class_id = class_token
        .parse::<u32>()
        .map_err(|_| LabelError::InvalidClassId {
            line: line_number,
            token: class_token.to_string(),
        })?;

    let coords = tokens
        .map(|token| match token.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(LabelError::InvalidCoordinate {
                line: line_number,
                token: token.to_string(),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Annotation { class_id, coords })
}

/// Parses annotations from a reader. `LineMode::First` never looks past the
/// first line; `LineMode::All` skips blank lines.
pub fn parse_labels<R: BufRead>(reader: R, mode: LineMode) -> Result<Vec<Annotation>, LabelError> {
    let mut lines = reader.lines();

    match mode {
        LineMode::First => {
            let line = lines.next().ok_or(LabelError::Empty)??;
            Ok(vec![parse_line(&line, 1)?])
        }
        LineMode::All => {
            let mut annotations = Vec::new();
            for (index, line_result) in lines.enumerate() {
                let line = line_result?;
                if line.trim().is_empty() {
                    continue;
                }
                annotations.push(parse_line(&line, index + 1)?);
            }

            if annotations.is_empty() {
                return Err(LabelError::Empty);
            }
            Ok(annotations)
        }
    }
}

pub fn read_label_file(path: &Path, mode: LineMode) -> Result<Vec<Annotation>, LabelError> {
    let file = File::open(path)?;
    let annotations = parse_labels(io::BufReader::new(file), mode)?;

    tracing::debug!(
        "Read {} annotation(s) from {}",
        annotations.len(),
        path.display()
    );
    Ok(annotations)
}
