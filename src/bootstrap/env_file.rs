//! Environment file creation.
//!
//! The env file is written at most once. Both the template copy and the
//! synthesized defaults go through `create_new`, so an existing file is never
//! truncated, even if it appears between the existence check and the write.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::Path;

/// What [`ensure_env_file`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvFileAction {
    AlreadyPresent,
    CopiedTemplate,
    Synthesized,
}

/// Contents written when no template exists. `db_host` is the database service name.
pub fn default_contents(db_host: &str) -> String {
    format!(
        "DATABASE_URL=postgresql://postgres:postgres@{}:5432/app\nSECRET_KEY=change-me\nDEBUG=true\n",
        db_host
    )
}

/// Ensure `target` exists: copy `template` if it exists, else write defaults.
pub fn ensure_env_file(target: &Path, template: &Path, db_host: &str) -> Result<EnvFileAction> {
    if target.exists() {
        return Ok(EnvFileAction::AlreadyPresent);
    }

    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let (contents, action) = if template.is_file() {
        let contents = std::fs::read(template)
            .with_context(|| format!("Failed to read env template: {}", template.display()))?;
        (contents, EnvFileAction::CopiedTemplate)
    } else {
        (default_contents(db_host).into_bytes(), EnvFileAction::Synthesized)
    };

    let mut file = match OpenOptions::new().write(true).create_new(true).open(target) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(EnvFileAction::AlreadyPresent),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to create env file: {}", target.display()));
        }
    };
    file.write_all(&contents)
        .with_context(|| format!("Failed to write env file: {}", target.display()))?;

    Ok(action)
}

/// Keys defined in an env file, in file order.
pub fn env_keys(path: &Path) -> Result<Vec<String>> {
    let iter = dotenvy::from_path_iter(path)
        .with_context(|| format!("Failed to open env file: {}", path.display()))?;
    let mut keys = Vec::new();
    for item in iter {
        let (key, _) = item.with_context(|| format!("Failed to parse env file: {}", path.display()))?;
        keys.push(key);
    }
    Ok(keys)
}
