use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Expression labels produced by the classifier
///
/// Declaration order is the tie-break order for [`EmotionDistribution::dominant`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionLabel {
    Neutral,
    Happy,
    Sad,
    Angry,
    Fearful,
    Disgusted,
    Surprised,
}

impl EmotionLabel {
    pub const ALL: [EmotionLabel; 7] = [
        EmotionLabel::Neutral,
        EmotionLabel::Happy,
        EmotionLabel::Sad,
        EmotionLabel::Angry,
        EmotionLabel::Fearful,
        EmotionLabel::Disgusted,
        EmotionLabel::Surprised,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionLabel::Neutral => "neutral",
            EmotionLabel::Happy => "happy",
            EmotionLabel::Sad => "sad",
            EmotionLabel::Angry => "angry",
            EmotionLabel::Fearful => "fearful",
            EmotionLabel::Disgusted => "disgusted",
            EmotionLabel::Surprised => "surprised",
        }
    }
}

/// Per-label probabilities for one frame
///
/// Scores are clamped to [0, 1] but not normalised; model output is kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmotionDistribution {
    scores: BTreeMap<EmotionLabel, f64>,
}

impl EmotionDistribution {
    pub fn from_scores<I>(scores: I) -> Self
    where
        I: IntoIterator<Item = (EmotionLabel, f64)>,
    {
        let scores = scores
            .into_iter()
            .map(|(label, p)| {
                let p = if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) };
                (label, p)
            })
            .collect();

        Self { scores }
    }

    /// Probability for `label`, 0 when the model did not report it
    pub fn get(&self, label: EmotionLabel) -> f64 {
        self.scores.get(&label).copied().unwrap_or(0.0)
    }

    /// Label with the highest probability; earlier labels win ties
    pub fn dominant(&self) -> Option<EmotionLabel> {
        let mut best: Option<(EmotionLabel, f64)> = None;

        for label in EmotionLabel::ALL {
            let Some(&p) = self.scores.get(&label) else {
                continue;
            };
            match best {
                Some((_, best_p)) if p <= best_p => {}
                _ => best = Some((label, p)),
            }
        }

        best.map(|(label, _)| label)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EmotionLabel, f64)> + '_ {
        self.scores.iter().map(|(l, p)| (*l, *p))
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// One classified camera frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionSample {
    /// Seconds since the camera surface started playing
    #[serde(rename = "timestamp")]
    pub timestamp_seconds: f64,
    #[serde(rename = "emotions")]
    pub distribution: EmotionDistribution,
}

/// Caller-supplied receiver for emotion samples
pub type EmotionSink = Arc<dyn Fn(EmotionSample) + Send + Sync>;
