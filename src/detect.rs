//! Detection-service seam.
//!
//! External AI detectors are optional collaborators: any of them may be down,
//! slow or unconfigured. A [`DetectorPanel`] asks every registered
//! [`Detector`], drops the ones that fail, and falls back to the deterministic
//! [`LocalDetector`] (backed by [`human_likeness_score`]) when nothing else
//! answered. The panel therefore always produces a response for non-blank text.
//!
//! ```text
//! text ─┬─ detector A ── ok(72, conf 0.8) ─┐
//!       ├─ detector B ── err (logged)       ├─ weighted mean ─▶ aggregateScore
//!       └─ (none ok?) ── LocalDetector ─────┘
//! ```

use crate::document::TextStats;
use crate::score::human_likeness_score;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    #[error("text is required")]
    EmptyText,

    #[error("detector '{detector}' is unavailable: {reason}")]
    Unavailable { detector: String, reason: String },
}

/// One detector's verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    /// 0 (machine) to 100 (human).
    pub human_likeness_score: u8,
    pub source: String,
    pub raw_score: f64,
    /// How much the detector trusts its own verdict, in `[0, 1]`.
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResponse {
    pub aggregate_score: u8,
    pub results: Vec<DetectionResult>,
    pub timestamp: DateTime<Utc>,
}

pub trait Detector {
    fn name(&self) -> &str;
    fn detect(&self, text: &str) -> Result<DetectionResult, DetectError>;
}

/// Offline detector built on the local scoring formula.
///
/// Confidence grows with length and saturates at 300 words, the same basis the
/// score uses for its length factor.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalDetector;

impl LocalDetector {
    pub const NAME: &'static str = "local";
}

impl Detector for LocalDetector {
    fn name(&self) -> &str {
        LocalDetector::NAME
    }

    fn detect(&self, text: &str) -> Result<DetectionResult, DetectError> {
        let score = human_likeness_score(text);
        let words = TextStats::of(text).words;
        Ok(DetectionResult {
            human_likeness_score: score,
            source: LocalDetector::NAME.to_string(),
            raw_score: f64::from(score) / 100.0,
            confidence: (words as f64 / 300.0).min(1.0),
        })
    }
}

#[derive(Default)]
pub struct DetectorPanel {
    detectors: Vec<Box<dyn Detector>>,
    fallback: LocalDetector,
}

impl DetectorPanel {
    /// A panel with no external detectors; every request is answered locally.
    pub fn new() -> Self {
        DetectorPanel::default()
    }

    pub fn with(mut self, detector: impl Detector + 'static) -> Self {
        self.detectors.push(Box::new(detector));
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    /// Ask every detector about `text` and aggregate the answers.
    pub fn detect(&self, text: &str) -> Result<DetectionResponse, DetectError> {
        if text.trim().is_empty() {
            return Err(DetectError::EmptyText);
        }

        let mut results = Vec::with_capacity(self.detectors.len());
        for detector in &self.detectors {
            match detector.detect(text) {
                Ok(result) => results.push(result),
                Err(err) => tracing::warn!(detector = detector.name(), error = %err, "detector failed; skipping"),
            }
        }

        if results.is_empty() {
            tracing::debug!("no external detector answered; using local scoring");
            results.push(self.fallback.detect(text)?);
        }

        Ok(DetectionResponse { aggregate_score: aggregate(&results), results, timestamp: Utc::now() })
    }
}

/// Confidence-weighted mean of the scores; a plain mean when no result carries
/// any confidence.
fn aggregate(results: &[DetectionResult]) -> u8 {
    if results.is_empty() {
        return 0;
    }
    let weight: f64 = results.iter().map(|r| r.confidence.clamp(0.0, 1.0)).sum();
    let mean = if weight > 0.0 {
        results.iter().map(|r| f64::from(r.human_likeness_score) * r.confidence.clamp(0.0, 1.0)).sum::<f64>() / weight
    } else {
        results.iter().map(|r| f64::from(r.human_likeness_score)).sum::<f64>() / results.len() as f64
    };
    mean.round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str, u8, f64);

    impl Detector for Fixed {
        fn name(&self) -> &str {
            self.0
        }

        fn detect(&self, _text: &str) -> Result<DetectionResult, DetectError> {
            Ok(DetectionResult {
                human_likeness_score: self.1,
                source: self.0.to_string(),
                raw_score: f64::from(self.1) / 100.0,
                confidence: self.2,
            })
        }
    }

    struct Offline;

    impl Detector for Offline {
        fn name(&self) -> &str {
            "offline"
        }

        fn detect(&self, _text: &str) -> Result<DetectionResult, DetectError> {
            Err(DetectError::Unavailable { detector: "offline".into(), reason: "connection refused".into() })
        }
    }

    #[test]
    fn local_detector_mirrors_the_score() {
        let result = LocalDetector.detect("Hello world.").unwrap();
        assert_eq!(result.human_likeness_score, 66);
        assert_eq!(result.source, "local");
        assert!((result.raw_score - 0.66).abs() < 1e-9);
        assert!((result.confidence - 2.0 / 300.0).abs() < 1e-9);
    }

    #[test]
    fn empty_panel_falls_back_to_local() {
        let response = DetectorPanel::new().detect("Hello world.").unwrap();
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].source, "local");
        assert_eq!(response.aggregate_score, 66);
    }

    #[test]
    fn failing_detectors_are_skipped() {
        let panel = DetectorPanel::new().with(Offline).with(Fixed("steady", 80, 0.5));
        let response = panel.detect("some text").unwrap();
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].source, "steady");
        assert_eq!(response.aggregate_score, 80);

        let all_down = DetectorPanel::new().with(Offline).detect("some text").unwrap();
        assert_eq!(all_down.results[0].source, "local");
    }

    #[test]
    fn aggregate_is_confidence_weighted() {
        let panel = DetectorPanel::new().with(Fixed("a", 90, 0.75)).with(Fixed("b", 50, 0.25));
        assert_eq!(panel.detect("text").unwrap().aggregate_score, 80);

        let unsure = DetectorPanel::new().with(Fixed("a", 90, 0.0)).with(Fixed("b", 50, 0.0));
        assert_eq!(unsure.detect("text").unwrap().aggregate_score, 70);
        assert_eq!(unsure.names(), vec!["a", "b"]);
    }

    #[test]
    fn blank_text_is_rejected() {
        assert!(matches!(DetectorPanel::new().detect("  \n"), Err(DetectError::EmptyText)));
    }

    #[test]
    fn response_serializes_in_camel_case() {
        let response = DetectorPanel::new().with(Fixed("a", 70, 1.0)).detect("text").unwrap();
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["aggregateScore"], 70);
        assert_eq!(json["results"][0]["humanLikenessScore"], 70);
        assert!(json["timestamp"].is_string());
    }
}
