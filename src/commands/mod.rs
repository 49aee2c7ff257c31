//! CLI subcommands for mina
//!
//! This module contains the implementation of all CLI subcommands:
//! - `train` - Train the detector on the fish disease dataset
//! - `tune` - Search for better training hyperparameters
//! - `export` - Export trained weights to TFLite for the mobile app
//! - `evaluate` - Evaluate trained weights on the held-out test set

pub mod evaluate;
pub mod export;
pub mod train;
pub mod tune;

pub use evaluate::{run_evaluate, EvaluateArgs};
pub use export::{run_export, ExportArgs};
pub use train::{run_train, TrainArgs};
pub use tune::{run_tune, TuneArgs};

use anyhow::Result;

use crate::delegate::UltralyticsRunner;

/// Connect to the framework, or fail with an install hint.
pub(crate) fn framework() -> Result<UltralyticsRunner> {
    let runner = UltralyticsRunner::from_env();
    if !runner.check_available() {
        println!("❌ ultralytics runtime not found.\n");
        println!("Install it with:");
        println!("  pip install ultralytics\n");
        println!("A non-default interpreter can be selected with MINA_PYTHON.");
        anyhow::bail!("the ultralytics package is required");
    }
    Ok(runner)
}
