use std::path::Path;
use std::sync::Arc;

use image::{imageops, RgbImage};
use ndarray::{Array, CowArray, IxDyn};
use ort::{Environment, Session, SessionBuilder};
use tracing::{debug, info};

use crate::emotion::{Emotion, EmotionClassifier, EmotionScores};
use crate::error::{Error, Result};
use crate::face_detection::FaceDetectionModel;
use crate::utils::{run_session, softmax};

const INPUT_SIZE: u32 = 64;

/// Output order of the FER+ model.
pub const FERPLUS_LABELS: [Emotion; 8] = [
    Emotion::Neutral,
    Emotion::Happy,
    Emotion::Surprise,
    Emotion::Sad,
    Emotion::Angry,
    Emotion::Disgust,
    Emotion::Fear,
    Emotion::Contempt,
];

/// FER+ emotion model run on the face found by the shared detector.
pub struct FerPlusClassifier {
    detector: Arc<dyn FaceDetectionModel>,
    session: Session,
}

impl FerPlusClassifier {
    pub fn from_file(
        environment: &Arc<Environment>,
        detector: Arc<dyn FaceDetectionModel>,
        model_path: &Path,
    ) -> Result<FerPlusClassifier> {
        let session = SessionBuilder::new(environment)?
            .with_intra_threads(1)?
            .with_model_from_file(model_path)?;

        info!(model = %model_path.display(), "loaded emotion model");

        Ok(FerPlusClassifier { detector, session })
    }
}

/// Turns a face crop into the (1, 1, 64, 64) grayscale tensor FER+ expects.
/// Pixel values stay in [0, 255].
fn face_tensor(face: &RgbImage) -> Result<Array<f32, IxDyn>> {
    let gray = imageops::grayscale(face);
    let gray = imageops::resize(&gray, INPUT_SIZE, INPUT_SIZE, imageops::FilterType::Triangle);

    let data: Vec<f32> = gray.pixels().map(|p| p.0[0] as f32).collect();
    let shape = (1, 1, INPUT_SIZE as usize, INPUT_SIZE as usize);

    Ok(Array::from_shape_vec(shape, data)?.into_dyn())
}

impl EmotionClassifier for FerPlusClassifier {
    fn classify(&self, image: &RgbImage) -> Result<Vec<EmotionScores>> {
        let Some(face) = self.detector.run(image)? else {
            return Ok(Vec::new());
        };

        let (x, y, w, h) = face.to_tuple();
        let crop = imageops::crop_imm(image, x, y, w, h).to_image();

        let input: CowArray<f32, IxDyn> = face_tensor(&crop)?.into();
        let outputs = run_session(&self.session, &input)?;

        let logits: Vec<f32> = outputs
            .first()
            .ok_or_else(|| Error::InvalidModel("emotion model returned no outputs".into()))?
            .iter()
            .cloned()
            .collect();

        if logits.len() != FERPLUS_LABELS.len() {
            return Err(Error::InvalidModel(format!(
                "expected {} emotion logits, got {}",
                FERPLUS_LABELS.len(),
                logits.len()
            )));
        }

        let scores: EmotionScores = FERPLUS_LABELS
            .iter()
            .copied()
            .zip(softmax(&logits))
            .collect();

        debug!(?scores, "emotions classified");
        Ok(vec![scores])
    }
}
