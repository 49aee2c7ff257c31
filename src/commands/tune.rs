//! Tune command implementation
//!
//! Forwards a hyperparameter search to the framework's tuner. Each
//! iteration is a short training run; the tuner mutates hyperparameters
//! between iterations and keeps the best set it finds.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::config::{DEFAULT_TUNE_EPOCHS, DEFAULT_TUNE_ITERATIONS};
use crate::delegate::{Detector, Optimizer, TuneRequest};
use crate::paths;

/// Tune command arguments
#[derive(Args, Debug)]
pub struct TuneArgs {
    /// Path to data.yaml (conventional locations searched when omitted)
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Training epochs per tuning iteration
    #[arg(long, default_value_t = DEFAULT_TUNE_EPOCHS)]
    pub epochs: u32,

    /// Total tuning iterations
    #[arg(long, default_value_t = DEFAULT_TUNE_ITERATIONS)]
    pub iterations: u32,

    /// Optimizer to use
    #[arg(long, value_enum, default_value_t = Optimizer::AdamW)]
    pub optimizer: Optimizer,

    /// Device to use: '0' for GPU, 'cpu' for CPU
    #[arg(long, default_value = "0")]
    pub device: String,

    /// Pretrained weights to tune from
    #[arg(long, default_value = "yolov8n.pt")]
    pub pretrained: String,
}

impl TuneArgs {
    fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            anyhow::bail!("epochs must be positive");
        }
        if self.iterations == 0 {
            anyhow::bail!("iterations must be positive");
        }
        Ok(())
    }
}

/// Run the tune command
pub fn run_tune(args: TuneArgs) -> Result<()> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    args.validate()?;

    println!("🔧 Mina Hyperparameter Tuner");
    println!("============================\n");

    let data_yaml = match &args.data {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("data.yaml not found at: {}", path.display());
            }
            path.clone()
        }
        None => paths::resolve_data_config(None)?,
    };

    println!("Using dataset config: {}", data_yaml.display());
    println!("Starting hyperparameter tuning...");
    println!("  Epochs per iteration: {}", args.epochs);
    println!("  Total iterations: {}", args.iterations);
    println!("  Optimizer: {}", args.optimizer);

    let request = TuneRequest {
        data: data_yaml,
        epochs: args.epochs,
        iterations: args.iterations,
        optimizer: args.optimizer,
        device: args.device.clone(),
        plots: true,
        save: true,
        val: true,
    };

    let runner = super::framework()?;
    let outcome = runner.tune(&args.pretrained, &request)?;

    println!("\nTuning complete!");
    println!("Results saved to: {}", outcome.save_dir.display());
    println!(
        "Train with the tuned values: mina train --hyp {}",
        outcome.save_dir.join("best_hyperparameters.yaml").display()
    );

    Ok(())
}
