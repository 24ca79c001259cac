pub mod analysis;
pub mod config;
pub mod emotion;
pub mod error;
pub mod face_detection;
pub mod face_landmarks;
pub mod render;
pub mod report;
pub mod server;
pub mod telemetry;
pub mod utils;

pub use analysis::{Analysis, DominantEmotion, FaceAnalysis, FaceAnalyzer};
pub use emotion::{Emotion, EmotionClassifier, EmotionScores};
pub use error::{Error, Result};
pub use face_landmarks::{LandmarkProvider, LandmarkSet};
pub use render::RenderOptions;
pub use report::{write_report, Report};
