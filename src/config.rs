use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Disease classes from the Roboflow dataset. Order matters: positions must
/// match the class indices used in the label files and the exported model.
pub const DISEASE_CLASSES: [&str; 5] = [
    "bacterial_infection",
    "fungal_infection",
    "healthy",
    "parasite",
    "white_tail",
];

pub const NUM_CLASSES: usize = DISEASE_CLASSES.len();

// Default training parameters
pub const DEFAULT_EPOCHS: u32 = 100;
pub const DEFAULT_BATCH_SIZE: u32 = 16;
pub const DEFAULT_IMAGE_SIZE: u32 = 640;
pub const DEFAULT_PATIENCE: u32 = 20;

// Tuning parameters
pub const DEFAULT_TUNE_EPOCHS: u32 = 30;
pub const DEFAULT_TUNE_ITERATIONS: u32 = 300;

// Evaluation parameters. Confidence is deliberately low: mAP computation
// needs the full score range, not a deployment threshold.
pub const DEFAULT_EVAL_CONFIDENCE: f64 = 0.001;
pub const DEFAULT_IOU_THRESHOLD: f64 = 0.6;

/// A model scoring under this mAP@50 on the test set is treated as broken.
pub const MAP50_WARNING_THRESHOLD: f64 = 0.1;

/// Where the framework places detection runs, relative to the working directory.
pub const RUNS_DIR: &str = "runs/detect";

/// File extensions counted as images when sizing the test set.
pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "webp"];

/// Dataset descriptor consumed by the detection framework (`data.yaml`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Dataset root directory.
    pub path: PathBuf,
    /// Training images, relative to `path`.
    pub train: String,
    /// Validation images, relative to `path`.
    pub val: String,
    /// Class-index-to-name mapping.
    pub names: BTreeMap<usize, String>,
    /// Class count.
    pub nc: usize,
}

impl DataConfig {
    /// Load a descriptor from a `data.yaml` file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read dataset descriptor: {}", path.display()))?;
        let config: DataConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid dataset descriptor: {}", path.display()))?;
        Ok(config)
    }

    /// Descriptor pointing `val` at a held-out test set, so the framework's
    /// validation pass runs against the test images. `train` is unused in
    /// that pass but the framework requires the field.
    pub fn for_test_set(test_dir: &Path) -> Result<Self> {
        let root = test_dir
            .canonicalize()
            .with_context(|| format!("Failed to resolve test directory: {}", test_dir.display()))?;
        Ok(Self {
            path: root,
            train: "images".to_string(),
            val: "images".to_string(),
            names: DISEASE_CLASSES
                .iter()
                .enumerate()
                .map(|(i, name)| (i, name.to_string()))
                .collect(),
            nc: NUM_CLASSES,
        })
    }

    /// Write the descriptor as YAML.
    pub fn write(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)
            .with_context(|| format!("Failed to write dataset descriptor: {}", path.display()))?;
        Ok(())
    }

    /// Class names in index order, for display.
    pub fn class_summary(&self) -> String {
        self.names.values().cloned().collect::<Vec<_>>().join(", ")
    }
}

/// Pick the training device the way the framework would: first GPU when
/// nvidia-smi reports one, otherwise CPU.
pub fn auto_device() -> String {
    let has_gpu = Command::new("nvidia-smi")
        .arg("-L")
        .output()
        .map(|out| out.status.success() && !out.stdout.is_empty())
        .unwrap_or(false);

    if has_gpu {
        "0".to_string()
    } else {
        "cpu".to_string()
    }
}
