use std::path::Path;
use std::sync::Arc;

use image::{imageops, RgbImage};
use ndarray::prelude::*;
use ort::{Environment, Session, SessionBuilder};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::face_detection::{FaceBoundingBox, FaceDetectionModel};
use crate::utils::{argmax, letterbox, run_session, sigmoid, to_nhwc_tensor};

const INPUT_SIZE: u32 = 256;
// regressor layout: 4 box values followed by 6 keypoints (x, y)
const REGRESSOR_LEN: usize = 16;

pub struct BlazefaceModel {
    session: Session,
    anchors: Array2<f32>,
    min_confidence: f32,
}

impl BlazefaceModel {
    /// Loads the 256x256 BlazeFace back model and its anchors (`.npy`, N x 4).
    pub fn from_files(
        environment: &Arc<Environment>,
        model_path: &Path,
        anchors_path: &Path,
        min_confidence: f32,
    ) -> Result<BlazefaceModel> {
        let session = SessionBuilder::new(environment)?
            .with_intra_threads(1)?
            .with_model_from_file(model_path)?;

        // anchors are stored as f64
        let anchors: Array2<f64> = ndarray_npy::read_npy(anchors_path)?;
        let anchors = anchors.mapv(|x| x as f32);

        if anchors.ncols() < 4 {
            return Err(Error::InvalidModel(format!(
                "expected anchors with 4 columns, got {}",
                anchors.ncols()
            )));
        }

        info!(
            model = %model_path.display(),
            anchors = anchors.nrows(),
            "loaded face detection model"
        );

        Ok(BlazefaceModel {
            session,
            anchors,
            min_confidence,
        })
    }

    /// Decodes one raw box into normalized (xmin, ymin, width, height).
    fn decode_box(&self, raw_box: ArrayView1<f32>, index: usize) -> (f32, f32, f32, f32) {
        let anchor = self.anchors.row(index);
        let scale = INPUT_SIZE as f32;

        let x_center = raw_box[0] / scale * anchor[2] + anchor[0];
        let y_center = raw_box[1] / scale * anchor[3] + anchor[1];

        let w = raw_box[2] / scale * anchor[2];
        let h = raw_box[3] / scale * anchor[3];

        (x_center - w / 2.0, y_center - h / 2.0, w, h)
    }
}

impl FaceDetectionModel for BlazefaceModel {
    fn run(&self, image: &RgbImage) -> Result<Option<FaceBoundingBox>> {
        // pad to a square so faces near the edges survive the resize
        let (square, side) = letterbox(image);
        let input = imageops::resize(
            &square,
            INPUT_SIZE,
            INPUT_SIZE,
            imageops::FilterType::Triangle,
        );

        let outputs = run_session(&self.session, &to_nhwc_tensor(&input)?)?;
        if outputs.len() < 4 {
            return Err(Error::InvalidModel(format!(
                "face detector returned {} outputs, expected 4",
                outputs.len()
            )));
        }

        // scores and regressors come split over two feature maps each
        let scores = ndarray::concatenate(Axis(1), &[outputs[0].view(), outputs[1].view()])?
            .into_dimensionality::<Ix3>()?;
        let regressors = ndarray::concatenate(Axis(1), &[outputs[2].view(), outputs[3].view()])?
            .into_dimensionality::<Ix3>()?;

        if scores.shape()[1] != self.anchors.nrows()
            || regressors.shape()[1] != self.anchors.nrows()
            || regressors.shape()[2] < REGRESSOR_LEN
        {
            return Err(Error::InvalidModel(format!(
                "face detector output {:?} does not match {} anchors",
                regressors.shape(),
                self.anchors.nrows()
            )));
        }

        let logits: Vec<f32> = scores.slice(s![0, .., 0]).iter().cloned().collect();
        let Some(best) = argmax(&logits) else {
            return Ok(None);
        };
        let score = sigmoid(logits[best]);

        if score < self.min_confidence {
            debug!(score, "no face above detection threshold");
            return Ok(None);
        }

        let (x, y, w, h) = self.decode_box(regressors.slice(s![0, best, ..]), best);
        let side = side as f32;

        let face = FaceBoundingBox::new(
            x * side,
            y * side,
            w * side,
            h * side,
            score,
            image.dimensions(),
        );

        if face.is_empty() {
            return Ok(None);
        }

        debug!(?face, "face detected");
        Ok(Some(face))
    }
}
