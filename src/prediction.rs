use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Output of the prediction model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted class label
    pub label: String,
    /// Model confidence score
    pub confidence_score: f64,
    /// Whether the confidence cleared the decision threshold
    pub is_above_threshold: bool,
}

/// Seam for the image classification model.
///
/// Real inference lives behind this trait; the service ships with a mock
/// that returns a fixed result.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PredictionSource: Send + Sync {
    /// Classify an image, returning the label and confidence
    async fn predict(&self, image: &[u8]) -> Result<Prediction>;
}

/// Mock predictor returning a fixed classification
pub struct MockPredictor;

const MOCK_LABEL: &str = "Vascular lesion";
const MOCK_CONFIDENCE: f64 = 99.67641830444336;

#[async_trait]
impl PredictionSource for MockPredictor {
    async fn predict(&self, _image: &[u8]) -> Result<Prediction> {
        Ok(Prediction {
            label: MOCK_LABEL.to_string(),
            confidence_score: MOCK_CONFIDENCE,
            is_above_threshold: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_predictor_returns_fixed_result() {
        let predictor = MockPredictor;
        let prediction = predictor.predict(b"any image bytes").await.unwrap();

        assert_eq!(prediction.label, "Vascular lesion");
        assert_eq!(prediction.confidence_score, 99.67641830444336);
        assert!(prediction.is_above_threshold);
    }

    #[tokio::test]
    async fn test_mock_predictor_ignores_input() {
        let predictor = MockPredictor;
        let a = predictor.predict(b"cat").await.unwrap();
        let b = predictor.predict(b"dog").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_prediction_seam_is_swappable() {
        let mut source = MockPredictionSource::new();
        source.expect_predict().returning(|_| {
            Ok(Prediction {
                label: "Diabetic retinopathy".to_string(),
                confidence_score: 87.5,
                is_above_threshold: false,
            })
        });

        let prediction = source.predict(b"image").await.unwrap();
        assert_eq!(prediction.label, "Diabetic retinopathy");
        assert!(!prediction.is_above_threshold);
    }
}
