//! Artifact discovery by convention.
//!
//! Dataset descriptors and trained weights are located the same way: an
//! explicit path always wins (and must exist), otherwise an ordered list of
//! conventional locations is searched and the first hit is used.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use log::debug;

use crate::config::IMAGE_EXTENSIONS;

/// Locate `data.yaml`, searching the conventional locations when no explicit
/// data directory is given.
pub fn resolve_data_config(data_dir: Option<&Path>) -> Result<PathBuf> {
    let explicit = data_dir.map(|dir| dir.join("data.yaml"));

    let mut candidates = Vec::new();
    if let Ok(dir) = std::env::var("MINA_DATA_DIR") {
        candidates.push(PathBuf::from(dir).join("data.yaml"));
    }
    candidates.extend(conventional_candidates(Path::new(".")));

    resolve_with(explicit.as_deref(), &candidates)
}

/// Conventional `data.yaml` locations under `root`, in search order.
fn conventional_candidates(root: &Path) -> Vec<PathBuf> {
    ["data", "Mina-2", "mina-2"]
        .iter()
        .map(|dir| root.join(dir).join("data.yaml"))
        .collect()
}

/// Explicit-override-then-ordered-fallback search. The explicit path, when
/// given, must exist; otherwise the first existing candidate wins.
fn resolve_with(explicit: Option<&Path>, candidates: &[PathBuf]) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        anyhow::bail!("data.yaml not found at: {}", path.display());
    }

    for candidate in candidates {
        if candidate.exists() {
            debug!("resolved dataset descriptor: {}", candidate.display());
            return Ok(candidate.clone());
        }
    }

    let searched: Vec<String> = candidates.iter().map(|p| p.display().to_string()).collect();
    anyhow::bail!(
        "data.yaml not found. Looked in: [{}]\n\
         Download the dataset first, or pass the dataset directory explicitly.",
        searched.join(", ")
    )
}

/// A completed training run with exported best weights.
#[derive(Debug, Clone)]
pub struct RunWeights {
    /// Full path to `best.pt`.
    pub path: PathBuf,
    /// Run directory name (e.g. `fish_disease3`).
    pub run_name: String,
    pub size_mb: f64,
    pub modified: SystemTime,
}

impl RunWeights {
    pub fn display_name(&self) -> String {
        format!("{} - {:.1} MB", self.run_name, self.size_mb)
    }
}

/// Scan a runs directory for `*/weights/best.pt`, newest first.
pub fn list_run_weights(runs_dir: &Path) -> Result<Vec<RunWeights>> {
    let mut runs = Vec::new();
    if !runs_dir.exists() {
        return Ok(runs);
    }

    for entry in fs::read_dir(runs_dir)
        .with_context(|| format!("Failed to read runs directory: {}", runs_dir.display()))?
    {
        let entry = entry?;
        let run_dir = entry.path();
        if !run_dir.is_dir() {
            continue;
        }

        let best = run_dir.join("weights").join("best.pt");
        if !best.exists() {
            continue;
        }

        let meta = fs::metadata(&best)?;
        runs.push(RunWeights {
            run_name: run_dir
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string(),
            size_mb: meta.len() as f64 / (1024.0 * 1024.0),
            modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            path: best,
        });
    }

    runs.sort_by(|a, b| b.modified.cmp(&a.modified));
    Ok(runs)
}

/// Validate the test directory layout and return how many images it holds.
/// Fails before the framework is ever invoked.
pub fn validate_test_dir(test_dir: &Path) -> Result<usize> {
    if !test_dir.exists() {
        anyhow::bail!(
            "Test directory not found: {}\n\
             Download the dataset first, or point --test-dir at it.",
            test_dir.display()
        );
    }

    let images_dir = test_dir.join("images");
    let labels_dir = test_dir.join("labels");

    if !images_dir.exists() {
        anyhow::bail!("Test images directory not found: {}", images_dir.display());
    }
    if !labels_dir.exists() {
        anyhow::bail!("Test labels directory not found: {}", labels_dir.display());
    }

    let image_count = count_images(&images_dir)?;
    if image_count == 0 {
        anyhow::bail!("No images found in {}", images_dir.display());
    }

    Ok(image_count)
}

/// Count files carrying a recognized image extension.
pub fn count_images(dir: &Path) -> Result<usize> {
    let mut count = 0;
    for entry in
        fs::read_dir(dir).with_context(|| format!("Failed to read directory: {}", dir.display()))?
    {
        let path = entry?.path();
        let is_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
            .unwrap_or(false);
        if is_image {
            count += 1;
        }
    }
    Ok(count)
}
