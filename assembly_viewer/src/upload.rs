use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use assembly_engine::UploadItem;
use assembly_formats::UploadKind;
use walkdir::WalkDir;

pub fn read_file(path: &Path) -> Result<UploadItem> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("{} has no UTF-8 file name", path.display()))?;
    Ok(UploadItem::file(name, bytes))
}

/// Collect every model and instruction file below `root`, sorted by path.
/// Unsupported files are skipped; archives must be extracted beforehand.
pub fn collect_dir(root: &Path) -> Result<Vec<UploadItem>> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("walking {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        match UploadKind::from_file_name(&name) {
            Ok(UploadKind::Archive) => {
                log::warn!("skipping {}: extract archives before uploading", name);
            }
            Ok(_) => paths.push(entry.path().to_path_buf()),
            Err(_) => log::debug!("skipping unsupported file {}", entry.path().display()),
        }
    }
    paths.iter().map(|path| read_file(path)).collect()
}
