// Data shapes exchanged with the inference service. The service decides the
// response layout from the model it ran, but we never trust the model name
// for that: `Prediction` is recognised from the fields the body carries.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The four models served by the inference API. The wire strings are sent
/// verbatim as the `model_name` form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModelName {
    #[default]
    Cnn,
    MobileNetV2,
    Vit,
    UNet,
}

impl ModelName {
    pub const ALL: [ModelName; 4] = [
        ModelName::Cnn,
        ModelName::MobileNetV2,
        ModelName::Vit,
        ModelName::UNet,
    ];

    /// Identifier as the service expects it.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelName::Cnn => "CNN",
            ModelName::MobileNetV2 => "MobileNetV2",
            ModelName::Vit => "ViT",
            ModelName::UNet => "U-Net",
        }
    }

    /// Longer label used in the model picker.
    pub fn label(&self) -> &'static str {
        match self {
            ModelName::Cnn => "CNN - Convolutional Neural Network",
            ModelName::MobileNetV2 => "MobileNetV2 - Efficient CNN",
            ModelName::Vit => "ViT - Vision Transformer",
            ModelName::UNet => "U-Net - Segmentation Model",
        }
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown model '{0}', expected one of CNN, MobileNetV2, ViT, U-Net")]
pub struct UnknownModel(pub String);

impl FromStr for ModelName {
    type Err = UnknownModel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ModelName::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownModel(s.to_string()))
    }
}

/// Successful `/predict` body. Segmentation bodies carry `mask_image`,
/// classification bodies carry `class`; serde tries them in that order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Prediction {
    Segmentation(SegmentationResult),
    Classification(ClassificationResult),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SegmentationResult {
    /// Base64-encoded PNG.
    pub mask_image: String,
    pub disease_percentage: DiseasedArea,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClassificationResult {
    #[serde(rename = "class")]
    pub label: String,
    pub confidence: Confidence,
    #[serde(default)]
    pub suggestion: Option<String>,
}

impl ClassificationResult {
    /// Treatment advice, if the service sent a non-empty one.
    pub fn advice(&self) -> Option<&str> {
        self.suggestion
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Confidence as reported by the service. It usually arrives pre-formatted
/// (`"92.13%"`); a bare number is read as a percentage too.
#[derive(Debug, Clone, PartialEq)]
pub struct Confidence {
    text: String,
    percent: Option<f64>,
}

impl Confidence {
    pub fn from_text(text: &str) -> Self {
        Confidence {
            text: text.to_string(),
            percent: parse_percent(text),
        }
    }

    pub fn from_percent(percent: f64) -> Self {
        Confidence {
            text: format!("{:.2}%", percent),
            percent: Some(percent),
        }
    }

    /// Text to show the user, exactly as received for string values.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Numeric percentage, when the value could be read as one.
    pub fn percent(&self) -> Option<f64> {
        self.percent
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Number(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for Confidence {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawNumber::deserialize(deserializer)? {
            RawNumber::Number(n) => Confidence::from_percent(n),
            RawNumber::Text(s) => Confidence::from_text(&s),
        })
    }
}

/// Share of the leaf marked as diseased. The service sends it as a string
/// (`"12.50"`); the text is kept so it is shown with the same digits.
#[derive(Debug, Clone, PartialEq)]
pub struct DiseasedArea {
    text: String,
    percent: f64,
}

impl DiseasedArea {
    pub fn from_percent(percent: f64) -> Self {
        DiseasedArea {
            text: percent.to_string(),
            percent,
        }
    }

    /// Value as received, without a `%` sign.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn percent(&self) -> f64 {
        self.percent
    }
}

impl<'de> Deserialize<'de> for DiseasedArea {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawNumber::deserialize(deserializer)? {
            RawNumber::Number(n) => Ok(DiseasedArea::from_percent(n)),
            RawNumber::Text(s) => {
                let percent = parse_percent(&s)
                    .ok_or_else(|| serde::de::Error::custom(format!("not a number: {:?}", s)))?;
                let trimmed = s.trim();
                let text = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
                Ok(DiseasedArea {
                    text: text.to_string(),
                    percent,
                })
            }
        }
    }
}

/// Accepts `"92"`, `"92.5%"` and `" 92.5 % "`.
pub fn parse_percent(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
    number.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// `GET /health` body.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub models_loaded: BTreeMap<String, bool>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

/// `GET /models` body.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ModelList {
    pub available_models: Vec<String>,
    #[serde(default)]
    pub model_status: BTreeMap<String, String>,
}

impl ModelList {
    pub fn is_loaded(&self, model: ModelName) -> bool {
        self.model_status
            .get(model.as_str())
            .map(|s| s == "loaded")
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn model_names_round_trip_through_wire_strings() {
        for model in ModelName::ALL {
            assert_eq!(model.as_str().parse::<ModelName>(), Ok(model));
        }
        assert_eq!("u-net".parse::<ModelName>(), Ok(ModelName::UNet));
        assert_eq!(
            "ResNet".parse::<ModelName>(),
            Err(UnknownModel("ResNet".into()))
        );
    }

    #[test]
    fn cnn_is_the_default_model() {
        assert_eq!(ModelName::default(), ModelName::Cnn);
    }

    #[test]
    fn classification_body_is_recognised_by_its_fields() {
        let body = json!({
            "model": "ViT",
            "type": "classification",
            "class": "Tomato___Late_blight",
            "confidence": "92.13%",
            "suggestion": "Remove and destroy infected plants."
        });
        let prediction: Prediction = serde_json::from_value(body).unwrap();
        match prediction {
            Prediction::Classification(c) => {
                assert_eq!(c.label, "Tomato___Late_blight");
                assert_eq!(c.confidence.text(), "92.13%");
                assert_eq!(c.confidence.percent(), Some(92.13));
                assert_eq!(c.advice(), Some("Remove and destroy infected plants."));
            }
            other => panic!("expected classification, got {:?}", other),
        }
    }

    #[test]
    fn segmentation_percentage_may_be_a_string() {
        let body = json!({ "mask_image": "aGVsbG8=", "disease_percentage": "12.50" });
        let Prediction::Segmentation(seg) = serde_json::from_value(body).unwrap() else {
            panic!("expected segmentation");
        };
        assert_eq!(seg.mask_image, "aGVsbG8=");
        assert_eq!(seg.disease_percentage.percent(), 12.5);
        assert_eq!(seg.disease_percentage.text(), "12.50");

        let body = json!({ "mask_image": "", "disease_percentage": 40 });
        let Prediction::Segmentation(seg) = serde_json::from_value(body).unwrap() else {
            panic!("expected segmentation");
        };
        assert_eq!(seg.disease_percentage.percent(), 40.0);
        assert_eq!(seg.disease_percentage.text(), "40");
    }

    #[test]
    fn non_numeric_disease_percentage_is_rejected() {
        let body = json!({ "mask_image": "", "disease_percentage": "lots" });
        assert!(serde_json::from_value::<Prediction>(body).is_err());
    }

    #[test]
    fn numeric_confidence_and_missing_suggestion() {
        let body = json!({ "class": "Apple___healthy", "confidence": 88.5 });
        let prediction: Prediction = serde_json::from_value(body).unwrap();
        let Prediction::Classification(c) = prediction else {
            panic!("expected classification");
        };
        assert_eq!(c.confidence.text(), "88.50%");
        assert_eq!(c.advice(), None);
    }

    #[test]
    fn unknown_shape_is_rejected() {
        let body = json!({ "message": "hello" });
        assert!(serde_json::from_value::<Prediction>(body).is_err());
    }

    #[test]
    fn parse_percent_handles_formatting() {
        assert_eq!(parse_percent("92%"), Some(92.0));
        assert_eq!(parse_percent(" 7.25 % "), Some(7.25));
        assert_eq!(parse_percent("high"), None);
        assert_eq!(parse_percent("NaN"), None);
    }

    #[test]
    fn model_list_reports_loaded_models() {
        let list: ModelList = serde_json::from_value(json!({
            "available_models": ["CNN", "U-Net"],
            "model_status": { "CNN": "loaded", "U-Net": "not loaded" }
        }))
        .unwrap();
        assert!(list.is_loaded(ModelName::Cnn));
        assert!(!list.is_loaded(ModelName::UNet));
        assert!(!list.is_loaded(ModelName::Vit));
    }
}
