pub mod model_ferplus;

use std::fmt;

use image::RgbImage;
use serde::Serialize;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Angry,
    Disgust,
    Fear,
    Happy,
    Sad,
    Surprise,
    Neutral,
    Contempt,
}

impl Emotion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Angry => "angry",
            Emotion::Disgust => "disgust",
            Emotion::Fear => "fear",
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Surprise => "surprise",
            Emotion::Neutral => "neutral",
            Emotion::Contempt => "contempt",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Confidence per emotion for one face, in the order the classifier
/// produced them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmotionScores {
    scores: Vec<(Emotion, f32)>,
}

impl EmotionScores {
    pub fn new(scores: Vec<(Emotion, f32)>) -> EmotionScores {
        EmotionScores { scores }
    }

    pub fn get(&self, emotion: Emotion) -> Option<f32> {
        self.scores
            .iter()
            .find(|(e, _)| *e == emotion)
            .map(|&(_, score)| score)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Emotion, f32)> {
        self.scores.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// The highest scoring emotion. Ties go to the entry seen first and
    /// NaN scores are never picked.
    pub fn dominant(&self) -> Option<(Emotion, f32)> {
        self.scores
            .iter()
            .filter(|(_, score)| !score.is_nan())
            .fold(None, |best: Option<(Emotion, f32)>, &(emotion, score)| match best {
                Some((_, max)) if score <= max => best,
                _ => Some((emotion, score)),
            })
    }
}

impl FromIterator<(Emotion, f32)> for EmotionScores {
    fn from_iter<I: IntoIterator<Item = (Emotion, f32)>>(iter: I) -> Self {
        EmotionScores::new(iter.into_iter().collect())
    }
}

/// Scores the emotions of every face found in an image.
pub trait EmotionClassifier: Send + Sync {
    fn classify(&self, image: &RgbImage) -> Result<Vec<EmotionScores>>;
}
