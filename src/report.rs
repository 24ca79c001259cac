use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::analysis::{Analysis, DominantEmotion, FaceAnalyzer};
use crate::error::{Error, Result};

pub const KEYPOINTS_FILE: &str = "keypoints.png";
pub const SEGMENTED_FILE: &str = "segmented.png";

/// Result of analysing one image file from the command line.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub image: String,
    pub face_detected: bool,
    pub summary: String,
    pub emotion: Option<DominantEmotion>,
    pub keypoints: Option<String>,
    pub segmented: Option<String>,
}

impl Report {
    /// Pretty JSON when `json` is set, otherwise the summary line.
    pub fn render(&self, json: bool) -> Result<String> {
        if json {
            serde_json::to_string_pretty(self).map_err(|err| Error::Encode(err.to_string()))
        } else {
            Ok(self.summary.clone())
        }
    }
}

/// Analyses `image` and saves both rendered images into `out_dir`.
/// Nothing is written when no face is found.
pub fn write_report(analyzer: &FaceAnalyzer, image: &Path, out_dir: &Path) -> Result<Report> {
    let analysis = analyzer.analyze_path(image)?;

    let mut report = Report {
        image: image.display().to_string(),
        face_detected: matches!(analysis, Analysis::Face(_)),
        summary: analysis.summary(),
        emotion: None,
        keypoints: None,
        segmented: None,
    };

    if let Analysis::Face(face) = analysis {
        fs::create_dir_all(out_dir)?;
        let keypoints = out_dir.join(KEYPOINTS_FILE);
        let segmented = out_dir.join(SEGMENTED_FILE);
        face.keypoint_image.save(&keypoints)?;
        face.segmented_image.save(&segmented)?;
        info!(dir = %out_dir.display(), "rendered images saved");

        report.emotion = face.emotion;
        report.keypoints = Some(keypoints.display().to_string());
        report.segmented = Some(segmented.display().to_string());
    }

    Ok(report)
}
