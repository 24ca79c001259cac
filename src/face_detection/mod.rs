pub mod cache;
pub mod model_blazeface;

use image::RgbImage;

use crate::error::Result;
use crate::utils::BBox;

pub trait FaceDetectionModel: Send + Sync {
    /// Returns the best face in the image, or `None` when nothing scores above
    /// the model's minimum detection confidence.
    fn run(&self, image: &RgbImage) -> Result<Option<FaceBoundingBox>>;
}

/// Bounding box around a detected face in an image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceBoundingBox {
    origin: (u32, u32),
    width: u32,
    height: u32,
    score: f32,
    image_size: (u32, u32),
}

impl FaceBoundingBox {
    /// Builds a box from pixel coordinates, clipped to the image.
    pub fn new(x: f32, y: f32, width: f32, height: f32, score: f32, image_size: (u32, u32)) -> Self {
        let (image_w, image_h) = image_size;

        let x0 = x.max(0.0).min(image_w as f32);
        let y0 = y.max(0.0).min(image_h as f32);
        let x1 = (x + width).max(0.0).min(image_w as f32);
        let y1 = (y + height).max(0.0).min(image_h as f32);

        Self {
            origin: (x0 as u32, y0 as u32),
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
            score,
            image_size,
        }
    }

    /// Size of the original image as (width, height) in pixels.
    pub fn image_size(&self) -> (u32, u32) {
        self.image_size
    }

    /// Top-left corner of the face rectangle in pixels.
    pub fn origin(&self) -> (u32, u32) {
        self.origin
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Confidence score of the detected face.
    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// (x, y, width, height) of the face rectangle.
    pub fn to_tuple(&self) -> BBox {
        (self.origin.0, self.origin.1, self.width, self.height)
    }
}
