pub mod model_mediapipe;

use image::RgbImage;
use imageproc::point::Point;
use nalgebra::Point2;

use crate::error::Result;

/// Ordered facial landmarks of a single face, normalized to [0, 1] of the
/// image they were detected in.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    points: Vec<Point2<f32>>,
}

impl LandmarkSet {
    pub fn new(points: Vec<Point2<f32>>) -> LandmarkSet {
        LandmarkSet { points }
    }

    pub fn from_normalized(coords: &[(f32, f32)]) -> LandmarkSet {
        LandmarkSet {
            points: coords.iter().map(|&(x, y)| Point2::new(x, y)).collect(),
        }
    }

    pub fn points(&self) -> &[Point2<f32>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Denormalizes every landmark into pixel coordinates of a
    /// `width` x `height` image. Coordinates are truncated toward zero.
    pub fn to_pixels(&self, width: u32, height: u32) -> Vec<Point<i32>> {
        self.points
            .iter()
            .map(|p| Point::new((p.x * width as f32) as i32, (p.y * height as f32) as i32))
            .collect()
    }
}

/// Finds the landmarks of at most one face.
pub trait LandmarkProvider: Send + Sync {
    fn detect(&self, image: &RgbImage) -> Result<Option<LandmarkSet>>;
}
