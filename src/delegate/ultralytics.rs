//! Subprocess bridge to the ultralytics runtime.
//!
//! The framework is Python-only, so every operation is serialized to a JSON
//! request, handed to a small driver script, and read back as a JSON result
//! once the run finishes. The driver inherits stdout/stderr, so the
//! framework's own progress output reaches the console untouched; nothing on
//! this side polls or interprets it.

use std::process::Command;

use anyhow::{Context, Result};
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::TempDir;

use super::{
    Detector, ExportOutcome, ExportRequest, TrainOutcome, TrainRequest, TuneOutcome, TuneRequest,
    ValidationOutcome, ValidationRequest,
};

/// Driver handed to the Python interpreter. Reads the request JSON, calls
/// into ultralytics, writes the result JSON. Kept deliberately dumb: any
/// framework exception escapes and fails the subprocess.
const DRIVER: &str = r#"
import json
import sys

from ultralytics import YOLO


def main():
    with open(sys.argv[1]) as f:
        request = json.load(f)

    model = YOLO(request["model"])
    args = request["args"]
    mode = request["mode"]

    if mode == "train":
        results = model.train(**args)
        out = {
            "save_dir": str(results.save_dir),
            "metrics": dict(getattr(results, "results_dict", {}) or {}),
        }
    elif mode == "tune":
        model.tune(**args)
        out = {"save_dir": "runs/tune"}
    elif mode == "export":
        out = {"export_path": str(model.export(**args))}
    elif mode == "val":
        results = model.val(**args)
        out = {
            "metrics": dict(results.results_dict),
            "per_class_ap50": [float(v) for v in results.box.ap50],
        }
    else:
        raise SystemExit(f"unknown mode: {mode}")

    with open(sys.argv[2], "w") as f:
        json.dump(out, f)


if __name__ == "__main__":
    main()
"#;

/// Runs framework operations through a Python subprocess.
pub struct UltralyticsRunner {
    python: String,
}

impl UltralyticsRunner {
    /// Use `MINA_PYTHON` when set, otherwise the `python3` on PATH.
    pub fn from_env() -> Self {
        let python = std::env::var("MINA_PYTHON").unwrap_or_else(|_| "python3".to_string());
        Self { python }
    }

    /// Whether the interpreter can import the framework at all.
    pub fn check_available(&self) -> bool {
        Command::new(&self.python)
            .args(["-c", "import ultralytics"])
            .output()
            .map(|out| out.status.success())
            .unwrap_or(false)
    }

    fn invoke<R, O>(&self, mode: &str, model: &str, request: &R) -> Result<O>
    where
        R: Serialize,
        O: DeserializeOwned,
    {
        let scratch =
            TempDir::new().context("Failed to create scratch directory for the framework driver")?;
        let driver_path = scratch.path().join("driver.py");
        let request_path = scratch.path().join("request.json");
        let result_path = scratch.path().join("result.json");

        std::fs::write(&driver_path, DRIVER)?;
        let payload = serde_json::json!({
            "mode": mode,
            "model": model,
            "args": request,
        });
        std::fs::write(&request_path, serde_json::to_vec_pretty(&payload)?)?;
        debug!("delegating {} to {}: {}", mode, self.python, payload);

        let status = Command::new(&self.python)
            .arg(&driver_path)
            .arg(&request_path)
            .arg(&result_path)
            .status()
            .with_context(|| format!("Failed to launch {}", self.python))?;

        if !status.success() {
            anyhow::bail!(
                "The detection framework reported a failure ({}). See its output above.",
                status
            );
        }

        let raw = std::fs::read_to_string(&result_path)
            .context("The framework finished but left no result file")?;
        serde_json::from_str(&raw).context("Malformed result from the framework driver")
    }
}

impl Detector for UltralyticsRunner {
    fn train(&self, model: &str, request: &TrainRequest) -> Result<TrainOutcome> {
        self.invoke("train", model, request)
    }

    fn tune(&self, model: &str, request: &TuneRequest) -> Result<TuneOutcome> {
        self.invoke("tune", model, request)
    }

    fn export(&self, model: &str, request: &ExportRequest) -> Result<ExportOutcome> {
        self.invoke("export", model, request)
    }

    fn validate(&self, model: &str, request: &ValidationRequest) -> Result<ValidationOutcome> {
        self.invoke("val", model, request)
    }
}
