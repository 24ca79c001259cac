use std::path::Path;
use std::sync::Arc;

use image::{imageops, RgbImage};
use nalgebra::Point2;
use ort::{Environment, Session, SessionBuilder};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::face_detection::FaceDetectionModel;
use crate::face_landmarks::{LandmarkProvider, LandmarkSet};
use crate::utils::{pad_bbox, run_session, sigmoid, to_nhwc_tensor};

const INPUT_SIZE: u32 = 256;
// 468 mesh points plus 10 iris points
pub const NUM_LANDMARKS: usize = 478;
const FACE_PADDING: f32 = 0.25;

/// MediaPipe face mesh: a face detector followed by the 478 point landmark
/// model run on the padded face crop.
pub struct MediapipeFaceMesh {
    detector: Arc<dyn FaceDetectionModel>,
    session: Session,
    min_confidence: f32,
}

impl MediapipeFaceMesh {
    pub fn from_file(
        environment: &Arc<Environment>,
        detector: Arc<dyn FaceDetectionModel>,
        model_path: &Path,
        min_confidence: f32,
    ) -> Result<MediapipeFaceMesh> {
        let session = SessionBuilder::new(environment)?
            .with_intra_threads(1)?
            .with_model_from_file(model_path)?;

        info!(model = %model_path.display(), "loaded face landmark model");

        Ok(MediapipeFaceMesh {
            detector,
            session,
            min_confidence,
        })
    }
}

impl LandmarkProvider for MediapipeFaceMesh {
    fn detect(&self, image: &RgbImage) -> Result<Option<LandmarkSet>> {
        let Some(face) = self.detector.run(image)? else {
            return Ok(None);
        };

        let (x, y, w, h) = pad_bbox(face.to_tuple(), FACE_PADDING, image.width(), image.height());
        if w == 0 || h == 0 {
            return Ok(None);
        }

        let crop = imageops::crop_imm(image, x, y, w, h).to_image();
        let input = imageops::resize(&crop, INPUT_SIZE, INPUT_SIZE, imageops::FilterType::Triangle);

        let outputs = run_session(&self.session, &to_nhwc_tensor(&input)?)?;
        if outputs.len() < 2 {
            return Err(Error::InvalidModel(format!(
                "landmark model returned {} outputs, expected 2",
                outputs.len()
            )));
        }

        let face_flag = outputs[1]
            .iter()
            .next()
            .copied()
            .ok_or_else(|| Error::InvalidModel("empty face flag output".into()))?;
        let presence = sigmoid(face_flag);

        if presence < self.min_confidence {
            debug!(presence, "landmark model rejected face");
            return Ok(None);
        }

        let raw: Vec<f32> = outputs[0].iter().cloned().collect();
        if raw.len() < NUM_LANDMARKS * 3 {
            return Err(Error::InvalidModel(format!(
                "expected {} landmark values, got {}",
                NUM_LANDMARKS * 3,
                raw.len()
            )));
        }

        // landmarks are (x, y, z) in input pixels of the crop; map them back
        // into the full image and normalize
        let scale = INPUT_SIZE as f32;
        let (image_w, image_h) = (image.width() as f32, image.height() as f32);
        let points = raw
            .chunks_exact(3)
            .take(NUM_LANDMARKS)
            .map(|p| {
                let px = x as f32 + p[0] / scale * w as f32;
                let py = y as f32 + p[1] / scale * h as f32;
                Point2::new(px / image_w, py / image_h)
            })
            .collect();

        debug!(presence, face = ?face.to_tuple(), "face landmarks found");
        Ok(Some(LandmarkSet::new(points)))
    }
}
