use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use ort::{Environment, ExecutionProvider};

use crate::analysis::FaceAnalyzer;
use crate::emotion::model_ferplus::FerPlusClassifier;
use crate::error::Result;
use crate::face_detection::cache::CachedFaceDetector;
use crate::face_detection::model_blazeface::BlazefaceModel;
use crate::face_detection::FaceDetectionModel;
use crate::face_landmarks::model_mediapipe::MediapipeFaceMesh;
use crate::render::RenderOptions;

#[derive(Parser, Debug)]
#[command(name = "face-analysis")]
#[command(author, version, about = "Face keypoints, segmentation mask and dominant emotion", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub models: ModelArgs,

    /// Log filter used when RUST_LOG is not set (trace|debug|info|warn|error)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the upload form
    Serve {
        #[arg(long, default_value = "127.0.0.1:7860")]
        bind: SocketAddr,
    },
    /// Analyse one image file and write the rendered images
    Analyze {
        image: PathBuf,

        /// Directory for keypoints.png and segmented.png
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// BlazeFace 256x256 face detection model (onnx)
    #[arg(long, global = true, default_value = "models/face_detection_back_256x256.onnx")]
    pub detector_model: PathBuf,

    /// BlazeFace anchors (npy, N x 4)
    #[arg(long, global = true, default_value = "models/anchors.npy")]
    pub anchors: PathBuf,

    /// MediaPipe face landmark model (onnx)
    #[arg(long, global = true, default_value = "models/face_landmarks_detector.onnx")]
    pub landmark_model: PathBuf,

    /// FER+ emotion model (onnx)
    #[arg(long, global = true, default_value = "models/emotion-ferplus-8.onnx")]
    pub emotion_model: PathBuf,

    #[arg(long, global = true, default_value_t = 0.5)]
    pub min_detection_confidence: f32,

    /// Overlay weight of the face mask, between 0 and 1
    #[arg(long, global = true, default_value_t = 0.6, value_parser = parse_alpha)]
    pub alpha: f32,
}

fn parse_alpha(value: &str) -> std::result::Result<f32, String> {
    let alpha: f32 = value.parse().map_err(|err| format!("{err}"))?;
    if (0.0..=1.0).contains(&alpha) {
        Ok(alpha)
    } else {
        Err(format!("{value} is not between 0 and 1"))
    }
}

impl ModelArgs {
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            alpha: self.alpha,
            ..RenderOptions::default()
        }
    }

    /// Loads every model once. The returned analyzer owns the sessions until
    /// it is dropped.
    pub fn build_analyzer(&self) -> Result<FaceAnalyzer> {
        let environment = Environment::builder()
            .with_name("face-analysis")
            .with_execution_providers([ExecutionProvider::CPU(Default::default())])
            .build()?
            .into_arc();

        let blazeface = BlazefaceModel::from_files(
            &environment,
            &self.detector_model,
            &self.anchors,
            self.min_detection_confidence,
        )?;
        // face mesh and classifier both look up the face in the same photo
        let detector: Arc<dyn FaceDetectionModel> =
            Arc::new(CachedFaceDetector::new(Arc::new(blazeface)));

        let face_mesh = MediapipeFaceMesh::from_file(
            &environment,
            detector.clone(),
            &self.landmark_model,
            self.min_detection_confidence,
        )?;
        let classifier = FerPlusClassifier::from_file(&environment, detector, &self.emotion_model)?;

        Ok(FaceAnalyzer::new(Box::new(face_mesh), Box::new(classifier))
            .with_render_options(self.render_options()))
    }
}
