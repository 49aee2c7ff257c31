//! Train command implementation
//!
//! Wraps the framework's training entry point: resolves the dataset
//! descriptor, picks a device, forwards the run configuration, and reports
//! where the best weights landed.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::config::{
    self, DataConfig, DEFAULT_BATCH_SIZE, DEFAULT_EPOCHS, DEFAULT_IMAGE_SIZE, DEFAULT_PATIENCE,
};
use crate::delegate::{Augmentation, Detector, TrainOutcome, TrainRequest};
use crate::metrics::{display_metric, metric, KEY_MAP50, KEY_MAP50_95};
use crate::paths;

/// Train command arguments
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Number of training epochs
    #[arg(long, default_value_t = DEFAULT_EPOCHS)]
    pub epochs: u32,

    /// Batch size
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch: u32,

    /// Input image size (square)
    #[arg(long, default_value_t = DEFAULT_IMAGE_SIZE)]
    pub imgsz: u32,

    /// Training run name
    #[arg(long, default_value = "fish_disease")]
    pub name: String,

    /// Device to train on: '0' for GPU, 'cpu' for CPU (auto-detected when omitted)
    #[arg(long)]
    pub device: Option<String>,

    /// Pretrained weights to start from
    #[arg(long, default_value = "yolov8n.pt")]
    pub pretrained: String,

    /// Dataset directory containing data.yaml (conventional locations searched when omitted)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Early stopping patience, in epochs
    #[arg(long, default_value_t = DEFAULT_PATIENCE)]
    pub patience: u32,

    /// Tuned hyperparameters YAML from a previous `mina tune` run
    #[arg(long)]
    pub hyp: Option<PathBuf>,
}

impl TrainArgs {
    fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            anyhow::bail!("epochs must be positive");
        }
        if self.batch == 0 {
            anyhow::bail!("batch size must be positive");
        }
        if self.imgsz == 0 {
            anyhow::bail!("image size must be positive");
        }
        Ok(())
    }
}

/// Run the train command
pub fn run_train(args: TrainArgs) -> Result<()> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    args.validate()?;

    println!("🐟 Mina Trainer");
    println!("===============\n");

    let data_yaml = paths::resolve_data_config(args.data_dir.as_deref())?;
    println!("Using dataset config: {}", data_yaml.display());

    let data = DataConfig::load(&data_yaml)?;
    println!("Dataset: {} classes ({})", data.nc, data.class_summary());

    let device = match args.device.clone() {
        Some(device) => device,
        None => config::auto_device(),
    };
    println!("Using device: {}", device);

    if let Some(hyp) = &args.hyp {
        if !hyp.exists() {
            anyhow::bail!(
                "Hyperparameters file not found: {}\n\
                 Run tuning first: mina tune",
                hyp.display()
            );
        }
        println!("Using tuned hyperparameters from: {}", hyp.display());
    }

    let request = build_request(&args, data_yaml, device);

    let runner = super::framework()?;
    let outcome = runner.train(&args.pretrained, &request)?;

    write_run_summary(&outcome, &request);

    println!("\nTraining complete!");
    println!("Best weights saved to: {}", outcome.best_weights().display());
    println!(
        "Validation mAP50: {}",
        display_metric(metric(&outcome.metrics, KEY_MAP50))
    );
    println!(
        "Validation mAP50-95: {}",
        display_metric(metric(&outcome.metrics, KEY_MAP50_95))
    );

    Ok(())
}

/// Shape the framework request. Augmentation defaults apply only when no
/// tuned hyperparameter file overrides them.
fn build_request(args: &TrainArgs, data_yaml: PathBuf, device: String) -> TrainRequest {
    TrainRequest {
        data: data_yaml,
        epochs: args.epochs,
        imgsz: args.imgsz,
        batch: args.batch,
        name: args.name.clone(),
        save: true,
        save_period: -1,
        patience: args.patience,
        workers: 4,
        device,
        augmentation: args.hyp.is_none().then(Augmentation::default),
        hyp: args.hyp.clone(),
    }
}

/// Drop a summary of the run next to the framework's own artifacts.
/// Best-effort: a failure here never fails the training run.
fn write_run_summary(outcome: &TrainOutcome, request: &TrainRequest) {
    let summary = serde_json::json!({
        "completed": chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        "request": request,
        "metrics": outcome.metrics,
    });
    let path = outcome.save_dir.join("run.json");
    if let Ok(json) = serde_json::to_string_pretty(&summary) {
        let _ = std::fs::write(&path, json);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> TrainArgs {
        TrainArgs {
            epochs: DEFAULT_EPOCHS,
            batch: DEFAULT_BATCH_SIZE,
            imgsz: DEFAULT_IMAGE_SIZE,
            name: "fish_disease".to_string(),
            device: None,
            pretrained: "yolov8n.pt".to_string(),
            data_dir: None,
            patience: DEFAULT_PATIENCE,
            hyp: None,
        }
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(args().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_epochs() {
        let mut invalid = args();
        invalid.epochs = 0;
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_request_carries_augmentation_without_hyp() {
        let request = build_request(&args(), PathBuf::from("data/data.yaml"), "cpu".to_string());
        assert!(request.augmentation.is_some());
        assert!(request.hyp.is_none());
        assert_eq!(request.workers, 4);
        assert_eq!(request.save_period, -1);
    }

    #[test]
    fn test_tuned_hyperparameters_replace_augmentation() {
        let mut tuned = args();
        tuned.hyp = Some(PathBuf::from("runs/tune/best_hyperparameters.yaml"));
        let request = build_request(&tuned, PathBuf::from("data/data.yaml"), "0".to_string());
        assert!(request.augmentation.is_none());
        assert!(request.hyp.is_some());
    }
}
