//! Upload classification and archive bundle selection.
//!
//! Uploads are routed purely by file extension. Archives are read by an
//! external reader; this module only decides which of the extracted entries
//! become the model and the instruction document.

use std::path::Path;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFormat {
    Glb,
    Gltf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadKind {
    Model(ModelFormat),
    Instructions,
    Archive,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("unsupported file type for {0} (expected .glb, .gltf, .json or .zip)")]
    UnsupportedExtension(String),
    #[error("archive does not contain a .glb or .gltf model")]
    MissingModel,
    #[error("archive could not be read: {0}")]
    Extraction(String),
}

impl UploadKind {
    pub fn from_file_name(name: &str) -> Result<Self, UploadError> {
        let extension = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "glb" => Ok(UploadKind::Model(ModelFormat::Glb)),
            "gltf" => Ok(UploadKind::Model(ModelFormat::Gltf)),
            "json" => Ok(UploadKind::Instructions),
            "zip" => Ok(UploadKind::Archive),
            _ => Err(UploadError::UnsupportedExtension(name.to_string())),
        }
    }

    pub fn is_model(self) -> bool {
        matches!(self, UploadKind::Model(_))
    }
}

/// One file extracted from an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ArchiveEntry {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn file_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    fn is_resource_fork(&self) -> bool {
        self.name.starts_with("__MACOSX/") || self.file_name().starts_with("._")
    }
}

/// Model plus optional instructions chosen from an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveBundle {
    pub model: ArchiveEntry,
    pub format: ModelFormat,
    pub instructions: Option<ArchiveEntry>,
}

/// Pick the first model and the first instruction document in archive order.
/// Later matches are ignored, as are directories and unsupported files.
pub fn select_bundle<I>(entries: I) -> Result<ArchiveBundle, UploadError>
where
    I: IntoIterator<Item = ArchiveEntry>,
{
    let mut model: Option<(ArchiveEntry, ModelFormat)> = None;
    let mut instructions: Option<ArchiveEntry> = None;

    for entry in entries {
        if entry.name.ends_with('/') || entry.is_resource_fork() {
            continue;
        }
        match UploadKind::from_file_name(entry.file_name()) {
            Ok(UploadKind::Model(format)) if model.is_none() => model = Some((entry, format)),
            Ok(UploadKind::Instructions) if instructions.is_none() => instructions = Some(entry),
            _ => {}
        }
        if model.is_some() && instructions.is_some() {
            break;
        }
    }

    let (model, format) = model.ok_or(UploadError::MissingModel)?;
    Ok(ArchiveBundle {
        model,
        format,
        instructions,
    })
}
