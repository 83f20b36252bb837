//! Assembly instruction documents.
//!
//! The on-disk form is a JSON object with an `assemblyStages` array. Import is
//! deliberately lenient about individual stages (missing descriptions or part
//! lists are tolerated) but strict about the envelope: the stages array must
//! be present and array-typed, otherwise nothing is returned.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Schema revision written on export.
pub const DOCUMENT_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructionDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub assembly_stages: Vec<StageRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    pub id: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub parts: Vec<String>,
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("instruction file is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("instruction file must contain a JSON object")]
    NotAnObject,
    #[error("instruction file has no `assemblyStages` field")]
    MissingStages,
    #[error("`assemblyStages` must be an array")]
    StagesNotArray,
    #[error("stage {index} must be a JSON object")]
    StageNotAnObject { index: usize },
    #[error("failed to encode instruction file: {0}")]
    Encode(#[source] serde_json::Error),
}

impl InstructionDocument {
    pub fn new(created_at: DateTime<Utc>, assembly_stages: Vec<StageRecord>) -> Self {
        Self {
            version: Some(DOCUMENT_VERSION.to_string()),
            created_at: Some(created_at),
            assembly_stages,
        }
    }

    pub fn parse(text: &str) -> Result<Self, DocumentError> {
        let value: Value = serde_json::from_str(text).map_err(DocumentError::InvalidJson)?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self, DocumentError> {
        let object = value.as_object().ok_or(DocumentError::NotAnObject)?;
        let stages = object
            .get("assemblyStages")
            .ok_or(DocumentError::MissingStages)?
            .as_array()
            .ok_or(DocumentError::StagesNotArray)?;

        let assembly_stages = stages
            .iter()
            .enumerate()
            .map(|(index, stage)| parse_stage(index, stage))
            .collect::<Result<Vec<_>, _>>()?;

        let version = object
            .get("version")
            .and_then(|field| field.as_str().map(str::to_string));
        let created_at = object
            .get("createdAt")
            .and_then(|field| field.as_str())
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|stamp| stamp.with_timezone(&Utc));

        Ok(Self {
            version,
            created_at,
            assembly_stages,
        })
    }

    pub fn to_json(&self, pretty: bool) -> Result<String, DocumentError> {
        if pretty {
            serde_json::to_string_pretty(self).map_err(DocumentError::Encode)
        } else {
            serde_json::to_string(self).map_err(DocumentError::Encode)
        }
    }
}

fn parse_stage(index: usize, value: &Value) -> Result<StageRecord, DocumentError> {
    let stage = value
        .as_object()
        .ok_or(DocumentError::StageNotAnObject { index })?;
    // Stages without an id get their position; the engine renumbers anyway.
    let id = stage
        .get("id")
        .and_then(Value::as_u64)
        .and_then(|raw| u32::try_from(raw).ok())
        .unwrap_or_else(|| u32::try_from(index + 1).unwrap_or(u32::MAX));
    let name = stage
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let description = stage
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_string);
    let parts = stage
        .get("parts")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    Ok(StageRecord {
        id,
        name,
        description,
        parts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lenient_stage_shapes() {
        let doc = InstructionDocument::parse(
            r#"{
                "version": "1.0",
                "createdAt": "2024-03-01T12:00:00.000Z",
                "assemblyStages": [
                    { "id": 1, "name": "Frame", "parts": ["Frame / Plate"] },
                    { "name": "Fasteners", "description": "bolts first" }
                ]
            }"#,
        )
        .expect("document parses");

        assert_eq!(doc.version.as_deref(), Some("1.0"));
        assert!(doc.created_at.is_some());
        assert_eq!(doc.assembly_stages.len(), 2);
        assert_eq!(doc.assembly_stages[0].parts, vec!["Frame / Plate"]);
        assert_eq!(doc.assembly_stages[1].id, 2);
        assert!(doc.assembly_stages[1].parts.is_empty());
        assert_eq!(
            doc.assembly_stages[1].description.as_deref(),
            Some("bolts first")
        );
    }

    #[test]
    fn rejects_missing_or_mistyped_stages() {
        assert!(matches!(
            InstructionDocument::parse(r#"{"version":"1.0"}"#),
            Err(DocumentError::MissingStages)
        ));
        assert!(matches!(
            InstructionDocument::parse(r#"{"assemblyStages":{}}"#),
            Err(DocumentError::StagesNotArray)
        ));
        assert!(matches!(
            InstructionDocument::parse("[]"),
            Err(DocumentError::NotAnObject)
        ));
        assert!(matches!(
            InstructionDocument::parse("{not json"),
            Err(DocumentError::InvalidJson(_))
        ));
    }

    #[test]
    fn export_uses_camel_case_envelope() {
        let stamp = DateTime::parse_from_rfc3339("2024-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let doc = InstructionDocument::new(
            stamp,
            vec![StageRecord {
                id: 1,
                name: "Frame".into(),
                description: None,
                parts: vec!["Frame".into()],
            }],
        );
        let json: Value = serde_json::from_str(&doc.to_json(false).unwrap()).unwrap();
        assert_eq!(json["version"], "1.0");
        assert_eq!(json["createdAt"], "2024-03-01T12:00:00Z");
        assert_eq!(json["assemblyStages"][0]["name"], "Frame");
        assert!(json["assemblyStages"][0].get("description").is_none());
    }
}
