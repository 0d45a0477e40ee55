//! Hosted plugin entities: taggers and trainers.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A single annotation produced by a tagger plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub kind: String,
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_idx: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_idx: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Output of invoking a tagger plugin instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagResult {
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// Trainable parameters reported by (and submitted to) a trainer plugin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub training_epochs: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub testing_holdout_percent: Option<f64>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub training_params: BTreeMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_training_parameters_round_trip() {
        let mut params = TrainingParameters {
            training_epochs: Some(3),
            testing_holdout_percent: Some(0.2),
            ..Default::default()
        };
        params
            .training_params
            .insert("learning_rate".to_string(), serde_json::json!(0.01));

        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["trainingEpochs"], 3);

        let back: TrainingParameters = serde_json::from_value(json).unwrap();
        assert_eq!(back, params);
    }

    #[test]
    fn test_tag_result_defaults_to_empty() {
        let result: TagResult = serde_json::from_str("{}").unwrap();
        assert!(result.tags.is_empty());
    }
}
