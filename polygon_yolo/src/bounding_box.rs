use crate::label::Annotation;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum BoxError {
    #[error("Annotation has no coordinates")]
    EmptyCoordinates,
    #[error("Annotation has an odd number of coordinate values: {0}")]
    OddCoordinateCount(usize),
}

/// Axis-aligned box in pixel units, reduced from a polygon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
    pub class_id: u32,
}

impl BoundingBox {
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
            class_id: 0,
        }
    }

    pub fn with_class_id(mut self, class_id: u32) -> Self {
        self.class_id = class_id;
        self
    }

    /// Reduces a flat `x1 y1 x2 y2 ...` sequence to its enclosing box.
    pub fn from_polygon(coords: &[f64], class_id: u32) -> Result<Self, BoxError> {
        if coords.is_empty() {
            return Err(BoxError::EmptyCoordinates);
        }
        if coords.len() % 2 != 0 {
            return Err(BoxError::OddCoordinateCount(coords.len()));
        }

        let (x_min, y_min, x_max, y_max) = coords.chunks_exact(2).fold(
            (
                f64::INFINITY,
                f64::INFINITY,
                f64::NEG_INFINITY,
                f64::NEG_INFINITY,
            ),
            |(x_min, y_min, x_max, y_max), point| {
                (
                    x_min.min(point[0]),
                    y_min.min(point[1]),
                    x_max.max(point[0]),
                    y_max.max(point[1]),
                )
            },
        );

        Ok(Self {
            x_min,
            y_min,
            x_max,
            y_max,
            class_id,
        })
    }

    pub fn from_annotation(annotation: &Annotation) -> Result<Self, BoxError> {
        Self::from_polygon(&annotation.coords, annotation.class_id)
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }

    pub fn dimensions(&self) -> (f64, f64) {
        (self.x_max - self.x_min, self.y_max - self.y_min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_polygon_square() {
        let coords = [10.0, 10.0, 50.0, 10.0, 50.0, 50.0, 10.0, 50.0];
        let bbox = BoundingBox::from_polygon(&coords, 3).unwrap();

        assert_eq!(bbox, BoundingBox::new(10.0, 10.0, 50.0, 50.0).with_class_id(3));
        assert_eq!(bbox.center(), (30.0, 30.0));
        assert_eq!(bbox.dimensions(), (40.0, 40.0));
    }

    #[test]
    fn test_from_polygon_is_order_independent() {
        let points = [(12.5, 80.0), (3.0, 44.0), (97.25, 61.0), (40.0, 2.5), (55.0, 99.0)];
        let expected = BoundingBox::from_polygon(
            &points.iter().flat_map(|&(x, y)| [x, y]).collect::<Vec<_>>(),
            1,
        )
        .unwrap();

        // every rotation plus the reversed order
        let mut orderings: Vec<Vec<(f64, f64)>> = (0..points.len())
            .map(|shift| {
                let mut rotated = points.to_vec();
                rotated.rotate_left(shift);
                rotated
            })
            .collect();
        orderings.push(points.iter().rev().copied().collect());

        for ordering in orderings {
            let coords: Vec<f64> = ordering.iter().flat_map(|&(x, y)| [x, y]).collect();
            assert_eq!(BoundingBox::from_polygon(&coords, 1).unwrap(), expected);
        }
        assert_eq!(expected, BoundingBox::new(3.0, 2.5, 97.25, 99.0).with_class_id(1));
    }

    #[test]
    fn test_single_point_is_zero_area() {
        let bbox = BoundingBox::from_polygon(&[7.0, 9.0], 0).unwrap();

        assert_eq!(bbox.x_min, bbox.x_max);
        assert_eq!(bbox.y_min, bbox.y_max);
        assert_eq!(bbox.dimensions(), (0.0, 0.0));
    }

    #[test]
    fn test_rejects_odd_and_empty_sequences() {
        assert_eq!(
            BoundingBox::from_polygon(&[1.0, 2.0, 3.0], 0),
            Err(BoxError::OddCoordinateCount(3))
        );
        assert_eq!(
            BoundingBox::from_polygon(&[], 0),
            Err(BoxError::EmptyCoordinates)
        );
    }

    #[test]
    fn test_from_annotation_keeps_class_id() {
        let annotation = Annotation {
            class_id: 12,
            coords: vec![4.0, 8.0, 2.0, 6.0],
        };
        let bbox = BoundingBox::from_annotation(&annotation).unwrap();

        assert_eq!(bbox.class_id, 12);
        assert_eq!((bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max), (2.0, 6.0, 4.0, 8.0));
    }
}
