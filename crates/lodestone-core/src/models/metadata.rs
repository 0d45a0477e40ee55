//! Arbitrary item metadata and its wire encoding.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::Result;

/// Metadata attached to an index item.
///
/// A closed variant over the value shapes the service accepts: scalars,
/// sequences, and string-keyed mappings. Structured values (lists and maps)
/// are serialized to a JSON string before transmission; scalars travel as
/// themselves. The server returns metadata in the same encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Metadata {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Metadata>),
    Map(BTreeMap<String, Metadata>),
}

impl Metadata {
    /// Encode for transmission.
    ///
    /// Lists and maps become a JSON string; scalars become their plain JSON
    /// value. This mirrors what the service stores and echoes back.
    pub fn to_wire(&self) -> Result<Value> {
        if self.is_structured() {
            Ok(Value::String(serde_json::to_string(self)?))
        } else {
            Ok(serde_json::to_value(self)?)
        }
    }

    /// Decode a wire value produced by [`Metadata::to_wire`].
    ///
    /// A string that parses as JSON is treated as a stringified structure;
    /// anything else is taken at face value. A plain-string metadata value
    /// that happens to look like JSON is indistinguishable on the wire from
    /// a stringified structure, so it decodes as the structure.
    pub fn from_wire(value: &Value) -> Result<Metadata> {
        if let Value::String(s) = value {
            if let Ok(parsed) = serde_json::from_str::<Metadata>(s) {
                return Ok(parsed);
            }
            return Ok(Metadata::Str(s.clone()));
        }
        Ok(serde_json::from_value(value.clone())?)
    }

    /// True for lists and maps, false for scalars.
    pub fn is_structured(&self) -> bool {
        matches!(self, Metadata::List(_) | Metadata::Map(_))
    }
}

impl From<bool> for Metadata {
    fn from(v: bool) -> Self {
        Metadata::Bool(v)
    }
}

impl From<i64> for Metadata {
    fn from(v: i64) -> Self {
        Metadata::Int(v)
    }
}

impl From<f64> for Metadata {
    fn from(v: f64) -> Self {
        Metadata::Float(v)
    }
}

impl From<&str> for Metadata {
    fn from(v: &str) -> Self {
        Metadata::Str(v.to_string())
    }
}

impl From<String> for Metadata {
    fn from(v: String) -> Self {
        Metadata::Str(v)
    }
}

impl<T: Into<Metadata>> From<Vec<T>> for Metadata {
    fn from(values: Vec<T>) -> Self {
        Metadata::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Metadata>> From<BTreeMap<String, T>> for Metadata {
    fn from(map: BTreeMap<String, T>) -> Self {
        Metadata::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

/// Encode an optional metadata value for a request body.
pub fn metadata_to_wire(metadata: Option<&Metadata>) -> Result<Option<Value>> {
    metadata.map(Metadata::to_wire).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars_pass_through() {
        assert_eq!(Metadata::Int(7).to_wire().unwrap(), serde_json::json!(7));
        assert_eq!(
            Metadata::Bool(true).to_wire().unwrap(),
            serde_json::json!(true)
        );
        assert_eq!(
            Metadata::Str("plain".into()).to_wire().unwrap(),
            serde_json::json!("plain")
        );
    }

    #[test]
    fn test_structured_values_stringify() {
        let meta = Metadata::from(vec![1i64, 2, 3]);
        let wire = meta.to_wire().unwrap();
        assert_eq!(wire, serde_json::json!("[1,2,3]"));
    }

    #[test]
    fn test_map_round_trip() {
        let mut map = BTreeMap::new();
        map.insert("kind".to_string(), Metadata::from("doc"));
        map.insert("page".to_string(), Metadata::Int(4));
        let meta = Metadata::Map(map);

        let wire = meta.to_wire().unwrap();
        assert!(wire.is_string());
        assert_eq!(Metadata::from_wire(&wire).unwrap(), meta);
    }

    #[test]
    fn test_non_json_string_decodes_as_scalar() {
        let wire = serde_json::json!("not json at all");
        assert_eq!(
            Metadata::from_wire(&wire).unwrap(),
            Metadata::Str("not json at all".into())
        );
    }

    #[test]
    fn test_float_stays_float() {
        let wire = Metadata::Float(2.0).to_wire().unwrap();
        assert_eq!(Metadata::from_wire(&wire).unwrap(), Metadata::Float(2.0));
    }
}
