//! Sentiment gauge for the latest candidate message. Informational only.
//!
//! Lexicon scoring: each opinion word carries (polarity, subjectivity). A preceding negation
//! flips and halves polarity; a preceding intensifier scales both. The result is the mean
//! over matched words. Nothing in the dialogue controller reads this.

use serde::Serialize;

/// (word, polarity −1..1, subjectivity 0..1)
const LEXICON: &[(&str, f64, f64)] = &[
    ("absolutely", 0.2, 0.9),
    ("amazing", 0.6, 0.9),
    ("awesome", 1.0, 1.0),
    ("best", 1.0, 0.3),
    ("better", 0.5, 0.5),
    ("clean", 0.37, 0.69),
    ("confident", 0.5, 0.5),
    ("easy", 0.43, 0.83),
    ("enjoy", 0.4, 0.5),
    ("excellent", 1.0, 1.0),
    ("excited", 0.375, 0.75),
    ("fantastic", 0.4, 0.9),
    ("fun", 0.3, 0.2),
    ("glad", 0.5, 1.0),
    ("good", 0.7, 0.6),
    ("great", 0.8, 0.75),
    ("happy", 0.8, 1.0),
    ("interesting", 0.5, 0.5),
    ("love", 0.5, 0.6),
    ("nice", 0.6, 1.0),
    ("perfect", 1.0, 1.0),
    ("solid", 0.3, 0.4),
    ("thanks", 0.2, 0.2),
    ("awful", -1.0, 1.0),
    ("bad", -0.7, 0.67),
    ("boring", -1.0, 1.0),
    ("confusing", -0.3, 0.6),
    ("difficult", -0.5, 1.0),
    ("frustrating", -0.4, 0.7),
    ("hard", -0.29, 0.54),
    ("hate", -0.8, 0.9),
    ("horrible", -1.0, 1.0),
    ("messy", -0.4, 0.6),
    ("poor", -0.4, 0.6),
    ("slow", -0.3, 0.4),
    ("stupid", -0.8, 1.0),
    ("terrible", -1.0, 1.0),
    ("unfortunately", -0.5, 1.0),
    ("useless", -0.5, 0.2),
    ("worst", -1.0, 1.0),
    ("wrong", -0.5, 0.9),
];

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "don't", "dont", "doesn't", "didn't", "isn't", "wasn't", "can't",
    "cannot", "won't",
];

const INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 1.3),
    ("really", 1.3),
    ("so", 1.2),
    ("super", 1.3),
    ("quite", 1.1),
    ("extremely", 1.5),
    ("incredibly", 1.5),
];

/// Polarity multiplier applied after a negation.
const NEGATION_FACTOR: f64 = -0.5;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum Mood {
    Enthusiastic,
    Positive,
    Neutral,
    Concerned,
    Frustrated,
}

impl Mood {
    fn from_polarity(polarity: f64) -> Self {
        if polarity > 0.5 {
            Mood::Enthusiastic
        } else if polarity > 0.0 {
            Mood::Positive
        } else if polarity < -0.5 {
            Mood::Frustrated
        } else if polarity < 0.0 {
            Mood::Concerned
        } else {
            Mood::Neutral
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Sentiment {
    pub polarity: f64,
    pub subjectivity: f64,
    /// Polarity mapped onto 0..1 for a progress-bar style gauge.
    pub gauge: f64,
    pub mood: Mood,
}

pub fn analyze(text: &str) -> Sentiment {
    let lowered = text.to_lowercase();
    let words = lowered
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty());

    let mut polarities = Vec::new();
    let mut subjectivities = Vec::new();
    let mut negated = false;
    let mut intensity = 1.0;

    for word in words {
        if NEGATIONS.contains(&word) {
            negated = true;
            continue;
        }
        if let Some((_, factor)) = INTENSIFIERS.iter().find(|(w, _)| *w == word) {
            intensity *= factor;
            continue;
        }
        if let Some((_, polarity, subjectivity)) = LEXICON.iter().find(|(w, _, _)| *w == word) {
            let mut polarity = polarity * intensity;
            if negated {
                polarity *= NEGATION_FACTOR;
            }
            polarities.push(polarity.clamp(-1.0, 1.0));
            subjectivities.push((subjectivity * intensity).clamp(0.0, 1.0));
        }
        negated = false;
        intensity = 1.0;
    }

    let polarity = mean(&polarities);
    Sentiment {
        polarity,
        subjectivity: mean(&subjectivities),
        gauge: (polarity + 1.0) / 2.0,
        mood: Mood::from_polarity(polarity),
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
