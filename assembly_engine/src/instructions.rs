//! Ordered instruction steps with dense `1..=N` ids.
//!
//! Every structural change (add, delete, reorder, import) renumbers the steps
//! so ids always match their 1-based position. Ids are the stable handle for
//! callers; indices are only used for display ordering and `reorder`.

use assembly_formats::{DocumentError, InstructionDocument, StageRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstructionStep {
    pub id: u32,
    pub name: String,
    pub description: Option<String>,
    pub parts: Vec<String>,
}

impl InstructionStep {
    pub fn parts(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(String::as_str)
    }
}

impl From<StageRecord> for InstructionStep {
    fn from(record: StageRecord) -> Self {
        InstructionStep {
            id: record.id,
            name: record.name,
            description: record.description,
            parts: record.parts,
        }
    }
}

impl From<&InstructionStep> for StageRecord {
    fn from(step: &InstructionStep) -> Self {
        StageRecord {
            id: step.id,
            name: step.name.clone(),
            description: step.description.clone(),
            parts: step.parts.clone(),
        }
    }
}

/// Partial update for [`InstructionModel::update_step`]; `None` keeps a field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub parts: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstructionModel {
    steps: Vec<InstructionStep>,
}

impl InstructionModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_document(document: InstructionDocument) -> Self {
        let mut model = InstructionModel {
            steps: document
                .assembly_stages
                .into_iter()
                .map(InstructionStep::from)
                .collect(),
        };
        model.renumber();
        model
    }

    pub fn steps(&self) -> &[InstructionStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&InstructionStep> {
        self.steps.iter().find(|step| step.id == id)
    }

    /// Zero-based display position of the step with `id`.
    pub fn position(&self, id: u32) -> Option<usize> {
        self.steps.iter().position(|step| step.id == id)
    }

    pub fn add_step(
        &mut self,
        name: &str,
        description: Option<&str>,
        parts: Vec<String>,
    ) -> Result<&InstructionStep, ValidationError> {
        let name = validate_name(name)?;
        validate_parts(&parts)?;
        let id = self.steps.iter().map(|step| step.id).max().unwrap_or(0) + 1;
        self.steps.push(InstructionStep {
            id,
            name,
            description: normalize_description(description),
            parts,
        });
        self.renumber();
        let last = self.steps.len() - 1;
        Ok(&self.steps[last])
    }

    /// Apply `patch` to the step with `id`. Returns `Ok(false)` when no such
    /// step exists; nothing is changed in that case.
    pub fn update_step(&mut self, id: u32, patch: StepPatch) -> Result<bool, ValidationError> {
        let name = patch.name.as_deref().map(validate_name).transpose()?;
        if let Some(parts) = patch.parts.as_ref() {
            validate_parts(parts)?;
        }
        let Some(step) = self.steps.iter_mut().find(|step| step.id == id) else {
            log::debug!("update for unknown step id {id} ignored");
            return Ok(false);
        };
        if let Some(name) = name {
            step.name = name;
        }
        if let Some(description) = patch.description {
            step.description = normalize_description(description.as_deref());
        }
        if let Some(parts) = patch.parts {
            step.parts = parts;
        }
        Ok(true)
    }

    /// Remove the step with `id` and renumber the rest. Returns `false` when
    /// the id is unknown.
    pub fn delete_step(&mut self, id: u32) -> bool {
        let Some(index) = self.position(id) else {
            log::debug!("delete for unknown step id {id} ignored");
            return false;
        };
        self.steps.remove(index);
        self.renumber();
        true
    }

    /// Move the step at `from` to `to` (both zero-based) and renumber.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<(), ValidationError> {
        let len = self.steps.len();
        for index in [from, to] {
            if index >= len {
                return Err(ValidationError::StepIndexOutOfRange { index, len });
            }
        }
        if from != to {
            let step = self.steps.remove(from);
            self.steps.insert(to, step);
            self.renumber();
        }
        Ok(())
    }

    /// Move the step with `id` to position `to`; unknown ids are ignored.
    pub fn move_step(&mut self, id: u32, to: usize) -> Result<bool, ValidationError> {
        match self.position(id) {
            Some(from) => self.reorder(from, to).map(|_| true),
            None => Ok(false),
        }
    }

    pub fn clear(&mut self) {
        self.steps.clear();
    }

    pub fn export_snapshot(&self, created_at: DateTime<Utc>) -> InstructionDocument {
        InstructionDocument::new(
            created_at,
            self.steps.iter().map(StageRecord::from).collect(),
        )
    }

    /// Replace every step with the document's stages. On error the current
    /// steps are left untouched.
    pub fn import_snapshot(&mut self, text: &str) -> Result<usize, DocumentError> {
        let document = InstructionDocument::parse(text)?;
        *self = InstructionModel::from_document(document);
        Ok(self.steps.len())
    }

    fn renumber(&mut self) {
        for (index, step) in self.steps.iter_mut().enumerate() {
            step.id = u32::try_from(index + 1).unwrap_or(u32::MAX);
        }
    }
}

fn validate_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyStepName);
    }
    Ok(trimmed.to_string())
}

fn validate_parts(parts: &[String]) -> Result<(), ValidationError> {
    if parts.is_empty() {
        return Err(ValidationError::EmptyPartSelection);
    }
    Ok(())
}

fn normalize_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn three_steps() -> InstructionModel {
        let mut model = InstructionModel::new();
        model.add_step("one", None, parts(&["A"])).unwrap();
        model.add_step("two", Some("middle"), parts(&["B"])).unwrap();
        model.add_step("three", None, parts(&["C"])).unwrap();
        model
    }

    fn ids(model: &InstructionModel) -> Vec<u32> {
        model.steps().iter().map(|step| step.id).collect()
    }

    #[test]
    fn add_validates_name_and_parts() {
        let mut model = InstructionModel::new();
        assert_eq!(
            model.add_step("  ", None, parts(&["A"])).unwrap_err(),
            ValidationError::EmptyStepName
        );
        assert_eq!(
            model.add_step("frame", None, Vec::new()).unwrap_err(),
            ValidationError::EmptyPartSelection
        );
        assert!(model.is_empty());

        let step = model.add_step(" frame ", Some(""), parts(&["A"])).unwrap();
        assert_eq!(step.id, 1);
        assert_eq!(step.name, "frame");
        assert_eq!(step.description, None);
    }

    #[test]
    fn delete_renumbers_remaining_steps() {
        let mut model = three_steps();
        assert!(model.delete_step(2));
        assert_eq!(model.len(), 2);
        assert_eq!(ids(&model), vec![1, 2]);
        assert_eq!(model.get(2).map(|step| step.name.as_str()), Some("three"));
        assert!(!model.delete_step(7));
        assert_eq!(model.len(), 2);
    }

    #[test]
    fn reorder_moves_and_renumbers() {
        let mut model = three_steps();
        model.reorder(0, 2).unwrap();
        let names: Vec<&str> = model.steps().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["two", "three", "one"]);
        assert_eq!(ids(&model), vec![1, 2, 3]);
        assert_eq!(
            model.reorder(0, 3),
            Err(ValidationError::StepIndexOutOfRange { index: 3, len: 3 })
        );
        assert!(model.move_step(3, 0).unwrap());
        assert_eq!(model.steps()[0].name, "one");
        assert!(!model.move_step(9, 0).unwrap());
    }

    #[test]
    fn update_patches_fields_and_ignores_unknown_ids() {
        let mut model = three_steps();
        let changed = model
            .update_step(
                2,
                StepPatch {
                    name: Some("renamed".into()),
                    description: Some(None),
                    parts: Some(parts(&["B", "C"])),
                },
            )
            .unwrap();
        assert!(changed);
        let step = model.get(2).unwrap();
        assert_eq!(step.name, "renamed");
        assert_eq!(step.description, None);
        assert_eq!(step.parts, parts(&["B", "C"]));

        assert!(!model.update_step(42, StepPatch::default()).unwrap());
        assert_eq!(
            model.update_step(
                1,
                StepPatch {
                    parts: Some(Vec::new()),
                    ..StepPatch::default()
                }
            ),
            Err(ValidationError::EmptyPartSelection)
        );
        assert_eq!(model.get(1).unwrap().parts, parts(&["A"]));
    }

    #[test]
    fn ids_stay_dense_across_mixed_operations() {
        let mut model = InstructionModel::new();
        for round in 0..6 {
            model
                .add_step(&format!("step {round}"), None, parts(&["A"]))
                .unwrap();
        }
        model.delete_step(1);
        model.reorder(4, 0).unwrap();
        model.delete_step(3);
        model.add_step("late", None, parts(&["B"])).unwrap();
        model.reorder(1, 3).unwrap();
        let expected: Vec<u32> = (1..=model.len() as u32).collect();
        assert_eq!(ids(&model), expected);
    }

    #[test]
    fn export_then_import_round_trips() {
        let original = three_steps();
        let stamp = Utc::now();
        let text = original.export_snapshot(stamp).to_json(true).unwrap();

        let mut restored = InstructionModel::new();
        assert_eq!(restored.import_snapshot(&text).unwrap(), 3);
        assert_eq!(restored, original);
    }

    #[test]
    fn failed_import_leaves_steps_untouched() {
        let mut model = three_steps();
        let before = model.clone();
        assert!(model.import_snapshot(r#"{"stages": []}"#).is_err());
        assert!(model.import_snapshot("nope").is_err());
        assert_eq!(model, before);
    }

    #[test]
    fn import_renumbers_sparse_ids() {
        let mut model = InstructionModel::new();
        model
            .import_snapshot(
                r#"{"assemblyStages": [
                    {"id": 5, "name": "b", "parts": ["B"]},
                    {"id": 9, "name": "a", "parts": ["A"]}
                ]}"#,
            )
            .unwrap();
        assert_eq!(ids(&model), vec![1, 2]);
        assert_eq!(model.get(2).unwrap().name, "a");
    }
}
