#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use face_analysis::{
    EmotionClassifier, EmotionScores, Error, FaceAnalyzer, LandmarkProvider, LandmarkSet, Result,
};
use image::RgbImage;

/// Landmark provider that always answers with the same face (or none).
pub struct FixedLandmarks(pub Option<LandmarkSet>);

impl LandmarkProvider for FixedLandmarks {
    fn detect(&self, _image: &RgbImage) -> Result<Option<LandmarkSet>> {
        Ok(self.0.clone())
    }
}

/// Landmark provider standing in for a broken model.
pub struct FailingLandmarks(pub &'static str);

impl LandmarkProvider for FailingLandmarks {
    fn detect(&self, _image: &RgbImage) -> Result<Option<LandmarkSet>> {
        Err(Error::InvalidModel(self.0.to_string()))
    }
}

/// Images the classifier was called with, in call order.
pub type SeenImages = Arc<Mutex<Vec<RgbImage>>>;

pub struct FixedEmotions {
    pub faces: Vec<EmotionScores>,
    pub seen: SeenImages,
}

impl EmotionClassifier for FixedEmotions {
    fn classify(&self, image: &RgbImage) -> Result<Vec<EmotionScores>> {
        self.seen.lock().unwrap().push(image.clone());
        Ok(self.faces.clone())
    }
}

/// A rough face outline: a ring of points around the image center.
pub fn face_outline() -> LandmarkSet {
    let points: Vec<(f32, f32)> = (0..36)
        .map(|i| {
            let angle = i as f32 * std::f32::consts::PI / 18.0;
            (0.5 + 0.3 * angle.cos(), 0.5 + 0.35 * angle.sin())
        })
        .collect();
    LandmarkSet::from_normalized(&points)
}

pub fn analyzer(landmarks: Option<LandmarkSet>, faces: Vec<EmotionScores>) -> FaceAnalyzer {
    recording_analyzer(landmarks, faces).0
}

pub fn recording_analyzer(
    landmarks: Option<LandmarkSet>,
    faces: Vec<EmotionScores>,
) -> (FaceAnalyzer, SeenImages) {
    let seen = SeenImages::default();
    let analyzer = FaceAnalyzer::new(
        Box::new(FixedLandmarks(landmarks)),
        Box::new(FixedEmotions {
            faces,
            seen: seen.clone(),
        }),
    );
    (analyzer, seen)
}

pub fn failing_analyzer(message: &'static str) -> FaceAnalyzer {
    FaceAnalyzer::new(
        Box::new(FailingLandmarks(message)),
        Box::new(FixedEmotions {
            faces: vec![],
            seen: SeenImages::default(),
        }),
    )
}

/// Gradient test image: pixel[x, y] = (x, y, x + y) mod 256
pub fn gradient_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    })
}

pub fn temp_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("face-analysis-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir.join(name)
}

/// Fresh, empty directory under the test temp dir.
pub fn temp_dir(name: &str) -> PathBuf {
    let dir = temp_path(name);
    if dir.exists() {
        std::fs::remove_dir_all(&dir).expect("clear temp dir");
    }
    dir
}
