//! The external detection framework, seen from this side of the fence.
//!
//! Everything substantive (model construction, the training loop,
//! hyperparameter search, quantized export, metric computation) happens
//! inside the framework. This module only shapes requests, hands them over,
//! and returns whatever the framework reports back.

pub mod ultralytics;

pub use ultralytics::UltralyticsRunner;

use std::fmt;
use std::path::PathBuf;

use anyhow::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Interface to the detection framework. The production implementation
/// shells out to the ultralytics runtime; tests substitute their own.
pub trait Detector {
    /// Train `model` on a dataset. Blocks until the run finishes.
    fn train(&self, model: &str, request: &TrainRequest) -> Result<TrainOutcome>;

    /// Run the framework's hyperparameter search.
    fn tune(&self, model: &str, request: &TuneRequest) -> Result<TuneOutcome>;

    /// Export trained weights to a deployment format.
    fn export(&self, model: &str, request: &ExportRequest) -> Result<ExportOutcome>;

    /// Run the framework's validation pass and report metrics.
    fn validate(&self, model: &str, request: &ValidationRequest) -> Result<ValidationOutcome>;
}

/// Optimizers the framework's tuner accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
pub enum Optimizer {
    #[value(name = "SGD")]
    #[serde(rename = "SGD")]
    Sgd,
    #[value(name = "Adam")]
    #[serde(rename = "Adam")]
    Adam,
    #[value(name = "AdamW")]
    #[serde(rename = "AdamW")]
    AdamW,
    #[value(name = "NAdam")]
    #[serde(rename = "NAdam")]
    NAdam,
    #[value(name = "RAdam")]
    #[serde(rename = "RAdam")]
    RAdam,
}

impl Optimizer {
    /// Name in the form the framework expects.
    pub fn as_str(&self) -> &'static str {
        match self {
            Optimizer::Sgd => "SGD",
            Optimizer::Adam => "Adam",
            Optimizer::AdamW => "AdamW",
            Optimizer::NAdam => "NAdam",
            Optimizer::RAdam => "RAdam",
        }
    }
}

impl fmt::Display for Optimizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Augmentation applied when no tuned hyperparameters are supplied.
/// Values match what the dataset responded well to during development.
#[derive(Debug, Clone, Serialize)]
pub struct Augmentation {
    pub hsv_h: f64,
    pub hsv_s: f64,
    pub hsv_v: f64,
    pub degrees: f64,
    pub translate: f64,
    pub scale: f64,
    pub flipud: f64,
    pub fliplr: f64,
    pub mosaic: f64,
    pub mixup: f64,
}

impl Default for Augmentation {
    fn default() -> Self {
        Self {
            hsv_h: 0.015,
            hsv_s: 0.7,
            hsv_v: 0.4,
            degrees: 10.0,
            translate: 0.1,
            scale: 0.5,
            flipud: 0.5,
            fliplr: 0.5,
            mosaic: 1.0,
            mixup: 0.1,
        }
    }
}

/// Parameters forwarded to the framework's train() call. Field names match
/// the keyword arguments the framework expects.
#[derive(Debug, Clone, Serialize)]
pub struct TrainRequest {
    pub data: PathBuf,
    pub epochs: u32,
    pub imgsz: u32,
    pub batch: u32,
    pub name: String,
    pub save: bool,
    pub save_period: i32,
    pub patience: u32,
    pub workers: u32,
    pub device: String,
    /// Tuned hyperparameter file from a previous tuning run.
    #[serde(rename = "cfg", skip_serializing_if = "Option::is_none")]
    pub hyp: Option<PathBuf>,
    /// Only set when `hyp` is absent; a tuned file carries its own values.
    #[serde(flatten)]
    pub augmentation: Option<Augmentation>,
}

/// Parameters forwarded to the framework's tune() call.
#[derive(Debug, Clone, Serialize)]
pub struct TuneRequest {
    pub data: PathBuf,
    pub epochs: u32,
    pub iterations: u32,
    pub optimizer: Optimizer,
    pub device: String,
    pub plots: bool,
    pub save: bool,
    pub val: bool,
}

/// Parameters forwarded to the framework's export() call.
#[derive(Debug, Clone, Serialize)]
pub struct ExportRequest {
    pub format: String,
    pub int8: bool,
    pub imgsz: u32,
    pub simplify: bool,
    pub nms: bool,
}

/// Parameters forwarded to the framework's val() call.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationRequest {
    pub data: PathBuf,
    pub imgsz: u32,
    pub conf: f64,
    pub iou: f64,
    /// The throwaway test descriptor points `val` at the test images.
    pub split: String,
    pub verbose: bool,
}

/// What the framework reports back from a training run.
#[derive(Debug, Clone, Deserialize)]
pub struct TrainOutcome {
    /// Run directory the framework created.
    pub save_dir: PathBuf,
    /// Flat results dict keyed by framework metric names.
    #[serde(default)]
    pub metrics: Value,
}

impl TrainOutcome {
    /// Best checkpoint, by the framework's fixed layout.
    pub fn best_weights(&self) -> PathBuf {
        self.save_dir.join("weights").join("best.pt")
    }
}

/// Where the tuning run left its artifacts.
#[derive(Debug, Clone, Deserialize)]
pub struct TuneOutcome {
    pub save_dir: PathBuf,
}

/// Where the exported model landed.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportOutcome {
    pub export_path: PathBuf,
}

/// Metrics reported by a validation pass.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidationOutcome {
    #[serde(default)]
    pub metrics: Value,
    /// AP@50 per class, aligned with the dataset's class indices.
    #[serde(default)]
    pub per_class_ap50: Vec<f64>,
}
