//! Manifest writer for Hemascreen model artifacts.
//!
//! Records the SHA-256 digest of each artifact in `manifest.json` next to it,
//! so the runtime can refuse a model file that was modified after export.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin sign_model -- <model.json> [<other.json> ...]
//! ```
//!
//! All artifacts must live in the same directory. Entries already present in
//! an existing manifest for other files are kept.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use hemascreen::adapters::forest::{
    sha256_hex, ExportedForest, ModelManifest, MANIFEST_FILE, MANIFEST_VERSION,
};
use hemascreen::adapters::ForestModel;

fn usage() -> String {
    "Usage: sign_model <model_path> [<model_path> ...]".to_string()
}

fn parse_args() -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "-h" | "--help" => bail!(usage()),
            _ => paths.push(PathBuf::from(arg)),
        }
    }
    if paths.is_empty() {
        bail!(usage());
    }
    Ok(paths)
}

/// Refuse to sign something the runtime could never load.
fn check_artifact(path: &Path, bytes: &[u8]) -> Result<()> {
    let forest: ExportedForest = serde_json::from_slice(bytes)
        .with_context(|| format!("{path:?} is not a forest export"))?;
    let model = ForestModel::from_export(forest)
        .with_context(|| format!("{path:?} failed validation"))?;
    println!("Validated {path:?} ({} trees)", model.n_trees());
    Ok(())
}

fn load_existing(manifest_path: &Path) -> Result<BTreeMap<String, String>> {
    if !manifest_path.exists() {
        return Ok(BTreeMap::new());
    }
    let content = fs::read(manifest_path)
        .with_context(|| format!("Failed to read {manifest_path:?}"))?;
    let manifest: ModelManifest = serde_json::from_slice(&content)
        .with_context(|| format!("Existing {manifest_path:?} is not a valid manifest"))?;
    Ok(manifest.files)
}

fn main() -> Result<()> {
    let paths = parse_args()?;

    let model_dir = paths[0]
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let manifest_path = model_dir.join(MANIFEST_FILE);
    let mut files = load_existing(&manifest_path)?;

    for path in &paths {
        if path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(".")) != model_dir {
            bail!("{path:?} is not in {model_dir:?}; sign each directory separately");
        }
        let bytes = fs::read(path).with_context(|| format!("Failed to read {path:?}"))?;
        check_artifact(path, &bytes)?;

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("{path:?} has no file name"))?;
        if name == MANIFEST_FILE {
            bail!("Refusing to sign {MANIFEST_FILE} itself");
        }
        files.insert(name.to_string(), sha256_hex(&bytes));
    }

    let manifest = ModelManifest {
        version: MANIFEST_VERSION,
        created_at: Some(chrono::Utc::now().timestamp()),
        files,
    };
    let manifest_bytes =
        serde_json::to_vec_pretty(&manifest).context("Failed to serialize manifest")?;
    fs::write(&manifest_path, &manifest_bytes)
        .with_context(|| format!("Failed to write {manifest_path:?}"))?;

    println!("Wrote manifest: {manifest_path:?}");
    for (name, digest) in &manifest.files {
        println!("  {name} sha256={digest}");
    }

    Ok(())
}
