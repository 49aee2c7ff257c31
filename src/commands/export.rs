//! Export command implementation
//!
//! Hands trained weights to the framework's TFLite exporter. Quantized
//! int8 output is the default because the model ships to mobile. NMS stays
//! out of the exported graph; the app applies it at inference time.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Select};

use crate::config::{DEFAULT_IMAGE_SIZE, RUNS_DIR};
use crate::delegate::{Detector, ExportRequest};
use crate::paths;

/// Export command arguments
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Trained weights to export (most recent training run when omitted)
    #[arg(short = 'w', long)]
    pub weights: Option<PathBuf>,

    /// Training runs directory to scan
    #[arg(long, default_value = RUNS_DIR)]
    pub runs_dir: PathBuf,

    /// Input image size for the exported model
    #[arg(long, default_value_t = DEFAULT_IMAGE_SIZE)]
    pub imgsz: u32,

    /// Use int8 quantization (recommended for mobile)
    #[arg(long, default_value_t = true)]
    pub int8: bool,

    /// Include NMS in the exported graph
    #[arg(long)]
    pub nms: bool,

    /// Directory to move the exported model into
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Pick the most recent run without prompting
    #[arg(long)]
    pub latest: bool,
}

/// Run the export command
pub fn run_export(args: ExportArgs) -> Result<()> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    println!("📦 Mina Model Exporter");
    println!("======================\n");

    let weights = select_weights(&args)?;

    println!("Loading model from: {}", weights.display());
    println!(
        "Exporting to TFLite (int8={}, imgsz={}, nms={})...",
        args.int8, args.imgsz, args.nms
    );

    let request = ExportRequest {
        format: "tflite".to_string(),
        int8: args.int8,
        imgsz: args.imgsz,
        simplify: true,
        nms: args.nms,
    };

    let runner = super::framework()?;
    let outcome = runner.export(&weights.to_string_lossy(), &request)?;

    let mut export_path = outcome.export_path;
    if let Some(output_dir) = &args.output {
        fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))?;
        let final_path = output_dir.join(export_path.file_name().unwrap_or_default());
        fs::rename(&export_path, &final_path).with_context(|| {
            format!(
                "Failed to move exported model to {}",
                final_path.display()
            )
        })?;
        export_path = final_path;
    }

    let size_mb = fs::metadata(&export_path)?.len() as f64 / (1024.0 * 1024.0);
    println!("\n✅ Export complete!");
    println!("TFLite model saved to: {}", export_path.display());
    println!("Model size: {:.2} MB", size_mb);

    Ok(())
}

/// Resolve which weights to export: explicit path, newest run, or an
/// interactive pick when several runs qualify.
fn select_weights(args: &ExportArgs) -> Result<PathBuf> {
    if let Some(path) = &args.weights {
        if !path.exists() {
            anyhow::bail!("Weights file not found: {}", path.display());
        }
        return Ok(path.clone());
    }

    let runs = paths::list_run_weights(&args.runs_dir)?;
    if runs.is_empty() {
        anyhow::bail!(
            "No weights file specified and no training runs found under {}.\n\
             Either train a model first (mina train) or pass --weights path/to/best.pt",
            args.runs_dir.display()
        );
    }

    if args.latest || runs.len() == 1 {
        let run = &runs[0];
        println!("Using weights from most recent training: {}", run.path.display());
        return Ok(run.path.clone());
    }

    let items: Vec<String> = runs.iter().map(|run| run.display_name()).collect();
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select a training run to export")
        .items(&items)
        .default(0)
        .interact()
        .context("Failed to get user selection")?;

    Ok(runs[selection].path.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn args(runs_dir: PathBuf) -> ExportArgs {
        ExportArgs {
            weights: None,
            runs_dir,
            imgsz: DEFAULT_IMAGE_SIZE,
            int8: true,
            nms: false,
            output: None,
            latest: true,
        }
    }

    #[test]
    fn test_explicit_weights_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let mut export = args(dir.path().to_path_buf());
        export.weights = Some(dir.path().join("best.pt"));

        let err = select_weights(&export).unwrap_err();
        assert!(err.to_string().contains("Weights file not found"));
    }

    #[test]
    fn test_no_runs_is_fatal_with_hint() {
        let dir = tempfile::tempdir().unwrap();
        let err = select_weights(&args(dir.path().join("runs"))).unwrap_err();
        assert!(err.to_string().contains("no training runs found"));
    }

    #[test]
    fn test_latest_picks_the_only_run() {
        let dir = tempfile::tempdir().unwrap();
        let weights_dir = dir.path().join("fish_disease").join("weights");
        fs::create_dir_all(&weights_dir).unwrap();
        File::create(weights_dir.join("best.pt")).unwrap();

        let selected = select_weights(&args(dir.path().to_path_buf())).unwrap();
        assert_eq!(selected, weights_dir.join("best.pt"));
    }
}
