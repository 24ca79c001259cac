use std::path::Path;
use std::time::Instant;

use image::RgbImage;
use serde::Serialize;
use tracing::{debug, info};

use crate::emotion::{Emotion, EmotionClassifier};
use crate::error::Result;
use crate::face_landmarks::LandmarkProvider;
use crate::render::{composite_mask, render_keypoints, RenderOptions};

pub const NO_FACE_DETECTED: &str = "No face detected";
pub const NO_EMOTION_DETECTED: &str = "No emotion detected";

/// Highest scoring emotion of the analysed face.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DominantEmotion {
    pub emotion: Emotion,
    /// Emotion name with the first letter upper case, e.g. "Happy".
    pub label: String,
    pub confidence: f32,
}

impl DominantEmotion {
    pub fn new(emotion: Emotion, confidence: f32) -> DominantEmotion {
        DominantEmotion {
            emotion,
            label: capitalize(emotion.as_str()),
            confidence,
        }
    }

    pub fn confidence_text(&self) -> String {
        format!("{:.2}", self.confidence)
    }
}

#[derive(Debug, Clone)]
pub struct FaceAnalysis {
    pub keypoint_image: RgbImage,
    pub segmented_image: RgbImage,
    pub emotion: Option<DominantEmotion>,
}

#[derive(Debug, Clone)]
pub enum Analysis {
    NoFace,
    Face(FaceAnalysis),
}

impl Analysis {
    /// Text shown next to the rendered images.
    pub fn summary(&self) -> String {
        match self {
            Analysis::NoFace => NO_FACE_DETECTED.to_string(),
            Analysis::Face(FaceAnalysis {
                emotion: Some(emotion),
                ..
            }) => format!("{}: {}", emotion.label, emotion.confidence_text()),
            Analysis::Face(_) => NO_EMOTION_DETECTED.to_string(),
        }
    }

    /// (keypoint image, segmented image, label, confidence)
    ///
    /// Without a face the label carries "No face detected". A face without a
    /// classified emotion has neither label nor confidence.
    pub fn into_parts(self) -> (Option<RgbImage>, Option<RgbImage>, Option<String>, Option<f32>) {
        match self {
            Analysis::NoFace => (None, None, Some(NO_FACE_DETECTED.to_string()), None),
            Analysis::Face(face) => {
                let (label, confidence) = match face.emotion {
                    Some(emotion) => (Some(emotion.label), Some(emotion.confidence)),
                    None => (None, None),
                };
                (
                    Some(face.keypoint_image),
                    Some(face.segmented_image),
                    label,
                    confidence,
                )
            }
        }
    }
}

/// Upper-cases the first character and lower-cases the rest.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Runs landmark detection, rendering and emotion classification for one
/// image at a time. Built once at startup and shared between requests.
pub struct FaceAnalyzer {
    landmarks: Box<dyn LandmarkProvider>,
    emotions: Box<dyn EmotionClassifier>,
    options: RenderOptions,
}

impl FaceAnalyzer {
    pub fn new(landmarks: Box<dyn LandmarkProvider>, emotions: Box<dyn EmotionClassifier>) -> FaceAnalyzer {
        FaceAnalyzer {
            landmarks,
            emotions,
            options: RenderOptions::default(),
        }
    }

    pub fn with_render_options(mut self, options: RenderOptions) -> FaceAnalyzer {
        self.options = options;
        self
    }

    pub fn render_options(&self) -> &RenderOptions {
        &self.options
    }

    /// Reads and decodes the image file, then analyses it.
    pub fn analyze_path(&self, path: &Path) -> Result<Analysis> {
        let image = image::open(path)?.to_rgb8();
        info!(path = %path.display(), width = image.width(), height = image.height(), "analysing image");
        self.analyze(&image)
    }

    pub fn analyze(&self, image: &RgbImage) -> Result<Analysis> {
        let start = Instant::now();

        let Some(landmarks) = self.landmarks.detect(image)?.filter(|l| !l.is_empty()) else {
            info!("no face detected");
            return Ok(Analysis::NoFace);
        };
        debug!(landmarks = landmarks.len(), elapsed = ?start.elapsed(), "landmarks detected");

        let segmented_image = composite_mask(image, &landmarks, &self.options);
        let keypoint_image = render_keypoints(image, &landmarks, &self.options);
        debug!(elapsed = ?start.elapsed(), "overlays rendered");

        // the classifier sees the untouched photo, not the annotated copies
        let faces = self.emotions.classify(image)?;
        let emotion = faces
            .first()
            .and_then(|scores| scores.dominant())
            .map(|(emotion, confidence)| DominantEmotion::new(emotion, confidence));

        match &emotion {
            Some(dominant) => info!(
                emotion = %dominant.emotion,
                confidence = dominant.confidence,
                elapsed = ?start.elapsed(),
                "face analysed"
            ),
            None => info!(elapsed = ?start.elapsed(), "face found but no emotion classified"),
        }

        Ok(Analysis::Face(FaceAnalysis {
            keypoint_image,
            segmented_image,
            emotion,
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::emotion::EmotionScores;
    use crate::face_landmarks::LandmarkSet;

    struct FixedLandmarks(Option<LandmarkSet>);

    impl LandmarkProvider for FixedLandmarks {
        fn detect(&self, _image: &RgbImage) -> Result<Option<LandmarkSet>> {
            Ok(self.0.clone())
        }
    }

    type Seen = Arc<Mutex<Vec<RgbImage>>>;

    // keeps a copy of every image handed to the classifier
    struct FixedEmotions {
        faces: Vec<EmotionScores>,
        seen: Seen,
    }

    impl EmotionClassifier for FixedEmotions {
        fn classify(&self, image: &RgbImage) -> Result<Vec<EmotionScores>> {
            self.seen.lock().unwrap().push(image.clone());
            Ok(self.faces.clone())
        }
    }

    fn analyzer(landmarks: Option<LandmarkSet>, faces: Vec<EmotionScores>) -> (FaceAnalyzer, Seen) {
        let seen = Seen::default();
        let analyzer = FaceAnalyzer::new(
            Box::new(FixedLandmarks(landmarks)),
            Box::new(FixedEmotions {
                faces,
                seen: seen.clone(),
            }),
        );
        (analyzer, seen)
    }

    fn face() -> LandmarkSet {
        LandmarkSet::from_normalized(&[(0.3, 0.3), (0.7, 0.3), (0.7, 0.7), (0.3, 0.7)])
    }

    #[test]
    fn capitalizes_labels() {
        assert_eq!(capitalize("happy"), "Happy");
        assert_eq!(capitalize("sAD"), "Sad");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn no_face_short_circuits() {
        let (analyzer, seen) = analyzer(None, vec![]);
        let analysis = analyzer.analyze(&RgbImage::new(8, 8)).unwrap();

        assert_eq!(analysis.summary(), "No face detected");
        assert_eq!(
            analysis.into_parts(),
            (None, None, Some("No face detected".to_string()), None)
        );
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn empty_landmarks_count_as_no_face() {
        let (analyzer, _) = analyzer(Some(LandmarkSet::new(vec![])), vec![]);
        let analysis = analyzer.analyze(&RgbImage::new(8, 8)).unwrap();
        assert!(matches!(analysis, Analysis::NoFace));
    }

    #[test]
    fn reports_dominant_emotion() {
        let scores = EmotionScores::new(vec![
            (Emotion::Angry, 0.01),
            (Emotion::Happy, 0.82),
            (Emotion::Neutral, 0.10),
            (Emotion::Sad, 0.05),
            (Emotion::Surprise, 0.02),
        ]);
        let (analyzer, seen) = analyzer(Some(face()), vec![scores]);
        let image = RgbImage::from_pixel(40, 30, image::Rgb([80, 90, 100]));
        let analysis = analyzer.analyze(&image).unwrap();

        assert_eq!(analysis.summary(), "Happy: 0.82");
        assert_eq!(seen.lock().unwrap().len(), 1);

        let (keypoints, segmented, label, confidence) = analysis.into_parts();
        assert_eq!(keypoints.unwrap().dimensions(), (40, 30));
        assert_eq!(segmented.unwrap().dimensions(), (40, 30));
        assert_eq!(label.as_deref(), Some("Happy"));
        assert_eq!(confidence, Some(0.82));
    }

    #[test]
    fn missing_emotion_keeps_images() {
        let (analyzer, _) = analyzer(Some(face()), vec![]);
        let analysis = analyzer.analyze(&RgbImage::new(20, 20)).unwrap();

        assert_eq!(analysis.summary(), NO_EMOTION_DETECTED);
        match analysis.clone() {
            Analysis::Face(face) => {
                assert!(face.emotion.is_none());
                assert_eq!(face.segmented_image.dimensions(), (20, 20));
            }
            Analysis::NoFace => panic!("expected a face"),
        }

        let (keypoints, segmented, label, confidence) = analysis.into_parts();
        assert!(keypoints.is_some() && segmented.is_some());
        assert_eq!(label, None);
        assert_eq!(confidence, None);
    }

    #[test]
    fn classifier_sees_untouched_image() {
        let scores = EmotionScores::new(vec![(Emotion::Neutral, 0.7), (Emotion::Happy, 0.3)]);
        let (analyzer, seen) = analyzer(Some(face()), vec![scores]);
        let image = RgbImage::from_pixel(50, 40, image::Rgb([120, 60, 30]));

        let analysis = analyzer.analyze(&image).unwrap();
        let Analysis::Face(face) = analysis else {
            panic!("expected a face");
        };
        assert!(face.keypoint_image.pixels().any(|p| p.0 == [0, 255, 0]));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], image);
        assert!(!seen[0].pixels().any(|p| p.0 == [0, 255, 0]));
    }
}
