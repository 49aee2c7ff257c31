mod commands;
mod config;
mod delegate;
mod metrics;
mod paths;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{run_evaluate, run_export, run_train, run_tune};
use commands::{EvaluateArgs, ExportArgs, TrainArgs, TuneArgs};

/// Mina: model operations for the fish disease detector
#[derive(Parser, Debug)]
#[command(name = "mina")]
#[command(about = "Train, tune, export, and evaluate the fish disease detection model", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train the detector on the fish disease dataset
    Train(TrainArgs),
    /// Search for better training hyperparameters
    Tune(TuneArgs),
    /// Export trained weights to TFLite for the mobile app
    Export(ExportArgs),
    /// Evaluate trained weights on the held-out test set
    Evaluate(EvaluateArgs),
}

fn main() -> Result<ExitCode> {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Train(args) => run_train(args).map(|_| ExitCode::SUCCESS),
        Command::Tune(args) => run_tune(args).map(|_| ExitCode::SUCCESS),
        Command::Export(args) => run_export(args).map(|_| ExitCode::SUCCESS),
        Command::Evaluate(args) => run_evaluate(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delegate::Optimizer;

    #[test]
    fn test_train_defaults() {
        let cli = Cli::try_parse_from(["mina", "train"]).unwrap();
        let Command::Train(args) = cli.command else {
            panic!("expected train");
        };
        assert_eq!(args.epochs, 100);
        assert_eq!(args.batch, 16);
        assert_eq!(args.imgsz, 640);
        assert_eq!(args.name, "fish_disease");
        assert_eq!(args.device, None);
        assert_eq!(args.hyp, None);
    }

    #[test]
    fn test_tune_defaults() {
        let cli = Cli::try_parse_from(["mina", "tune"]).unwrap();
        let Command::Tune(args) = cli.command else {
            panic!("expected tune");
        };
        assert_eq!(args.epochs, 30);
        assert_eq!(args.iterations, 300);
        assert_eq!(args.optimizer, Optimizer::AdamW);
        assert_eq!(args.device, "0");
    }

    #[test]
    fn test_tune_optimizer_is_a_closed_enum() {
        let ok = Cli::try_parse_from(["mina", "tune", "--optimizer", "RAdam"]);
        assert!(ok.is_ok());
        let bad = Cli::try_parse_from(["mina", "tune", "--optimizer", "Lion"]);
        assert!(bad.is_err());
    }

    #[test]
    fn test_evaluate_requires_weights() {
        let bad = Cli::try_parse_from(["mina", "evaluate"]);
        assert!(bad.is_err());

        let cli = Cli::try_parse_from(["mina", "evaluate", "--weights", "best.pt"]).unwrap();
        let Command::Evaluate(args) = cli.command else {
            panic!("expected evaluate");
        };
        assert_eq!(args.test_dir.to_str(), Some("test_data"));
        assert_eq!(args.confidence, 0.001);
        assert_eq!(args.iou, 0.6);
    }
}
