//! Evaluate command implementation
//!
//! Runs the framework's validation pass against the held-out test set for
//! an unbiased read on a trained model. Every precondition (weights, test
//! directory layout, a non-empty image set) is checked before the framework
//! is invoked; a suspiciously low headline metric turns into exit status 1.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::config::{
    DataConfig, DEFAULT_EVAL_CONFIDENCE, DEFAULT_IMAGE_SIZE, DEFAULT_IOU_THRESHOLD,
    MAP50_WARNING_THRESHOLD,
};
use crate::delegate::{Detector, ValidationRequest};
use crate::metrics::EvalReport;
use crate::paths;

/// Evaluate command arguments
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Trained model weights (.pt or .tflite)
    #[arg(short = 'w', long)]
    pub weights: PathBuf,

    /// Test data directory (with images/ and labels/ subdirs)
    #[arg(long, default_value = "test_data")]
    pub test_dir: PathBuf,

    /// Input image size
    #[arg(long, default_value_t = DEFAULT_IMAGE_SIZE)]
    pub imgsz: u32,

    /// Confidence threshold (low by default, for mAP computation)
    #[arg(long, default_value_t = DEFAULT_EVAL_CONFIDENCE)]
    pub confidence: f64,

    /// IoU threshold for NMS
    #[arg(long, default_value_t = DEFAULT_IOU_THRESHOLD)]
    pub iou: f64,
}

/// Run the evaluate command
pub fn run_evaluate(args: EvaluateArgs) -> Result<ExitCode> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    println!("📊 Mina Test Set Evaluation");
    println!("===========================\n");

    let runner = super::framework()?;
    let report = evaluate_with(&runner, &args)?;

    report.print();

    if report.below_warning_threshold() {
        println!(
            "\n⚠️  mAP@50 is below {} - model may have issues.",
            MAP50_WARNING_THRESHOLD
        );
        return Ok(ExitCode::from(1));
    }

    Ok(ExitCode::SUCCESS)
}

/// Check preconditions, delegate the validation pass, and extract metrics.
fn evaluate_with(detector: &dyn Detector, args: &EvaluateArgs) -> Result<EvalReport> {
    if !args.weights.exists() {
        anyhow::bail!(
            "Weights file not found: {}\n\
             Train a model first (mina train) or pass --weights path/to/best.pt",
            args.weights.display()
        );
    }

    let image_count = paths::validate_test_dir(&args.test_dir)?;
    println!("Evaluating on {} test images...", image_count);

    // The framework wants a dataset descriptor; write a throwaway one that
    // points its validation split at the test images.
    let descriptor = DataConfig::for_test_set(&args.test_dir)?;
    let test_yaml = args.test_dir.join("test_data.yaml");
    descriptor.write(&test_yaml)?;

    let request = ValidationRequest {
        data: test_yaml.clone(),
        imgsz: args.imgsz,
        conf: args.confidence,
        iou: args.iou,
        split: "val".to_string(),
        verbose: true,
    };

    let result = detector.validate(&args.weights.to_string_lossy(), &request);
    let _ = fs::remove_file(&test_yaml);
    let outcome = result?;

    Ok(EvalReport::from_outcome(&outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delegate::{
        ExportOutcome, ExportRequest, TrainOutcome, TrainRequest, TuneOutcome, TuneRequest,
        ValidationOutcome,
    };
    use crate::metrics::{KEY_MAP50, KEY_MAP50_95, KEY_PRECISION, KEY_RECALL};
    use serde_json::json;
    use std::cell::Cell;
    use std::fs::File;
    use std::path::Path;

    /// Test double standing in for the framework.
    struct MockDetector {
        map50: f64,
        calls: Cell<usize>,
    }

    impl MockDetector {
        fn scoring(map50: f64) -> Self {
            Self {
                map50,
                calls: Cell::new(0),
            }
        }
    }

    impl Detector for MockDetector {
        fn train(&self, _model: &str, _request: &TrainRequest) -> Result<TrainOutcome> {
            unimplemented!("evaluation never trains")
        }

        fn tune(&self, _model: &str, _request: &TuneRequest) -> Result<TuneOutcome> {
            unimplemented!("evaluation never tunes")
        }

        fn export(&self, _model: &str, _request: &ExportRequest) -> Result<ExportOutcome> {
            unimplemented!("evaluation never exports")
        }

        fn validate(
            &self,
            _model: &str,
            request: &ValidationRequest,
        ) -> Result<ValidationOutcome> {
            self.calls.set(self.calls.get() + 1);
            // The throwaway descriptor must exist while the framework runs
            assert!(request.data.exists());
            Ok(ValidationOutcome {
                metrics: json!({
                    KEY_MAP50: self.map50,
                    KEY_MAP50_95: self.map50 * 0.7,
                    KEY_PRECISION: 0.8,
                    KEY_RECALL: 0.75,
                }),
                per_class_ap50: vec![0.9, 0.85, 0.95, 0.7, 0.6],
            })
        }
    }

    fn test_fixture(image_names: &[&str]) -> (tempfile::TempDir, EvaluateArgs) {
        let root = tempfile::tempdir().unwrap();
        let weights = root.path().join("best.pt");
        File::create(&weights).unwrap();

        let test_dir = root.path().join("test_data");
        fs::create_dir_all(test_dir.join("images")).unwrap();
        fs::create_dir_all(test_dir.join("labels")).unwrap();
        for name in image_names {
            File::create(test_dir.join("images").join(name)).unwrap();
        }

        let args = EvaluateArgs {
            weights,
            test_dir,
            imgsz: DEFAULT_IMAGE_SIZE,
            confidence: DEFAULT_EVAL_CONFIDENCE,
            iou: DEFAULT_IOU_THRESHOLD,
        };
        (root, args)
    }

    #[test]
    fn test_missing_weights_fails_before_delegate() {
        let (_root, mut args) = test_fixture(&["fish.jpg"]);
        args.weights = Path::new("nowhere").join("best.pt");

        let mock = MockDetector::scoring(0.5);
        let err = evaluate_with(&mock, &args).unwrap_err();
        assert!(err.to_string().contains("Weights file not found"));
        assert_eq!(mock.calls.get(), 0);
    }

    #[test]
    fn test_missing_images_dir_fails_before_delegate() {
        let (_root, args) = test_fixture(&["fish.jpg"]);
        fs::remove_dir_all(args.test_dir.join("images")).unwrap();

        let mock = MockDetector::scoring(0.5);
        let err = evaluate_with(&mock, &args).unwrap_err();
        assert!(err.to_string().contains("images"));
        assert_eq!(mock.calls.get(), 0);
    }

    #[test]
    fn test_empty_image_set_fails_before_delegate() {
        let (_root, args) = test_fixture(&[]);

        let mock = MockDetector::scoring(0.5);
        let err = evaluate_with(&mock, &args).unwrap_err();
        assert!(err.to_string().contains("No images found"));
        assert_eq!(mock.calls.get(), 0);
    }

    #[test]
    fn test_low_map50_trips_the_warning() {
        let (_root, args) = test_fixture(&["fish.jpg", "tail.png"]);

        let mock = MockDetector::scoring(0.05);
        let report = evaluate_with(&mock, &args).unwrap();
        assert_eq!(mock.calls.get(), 1);
        assert!(report.below_warning_threshold());
    }

    #[test]
    fn test_healthy_map50_passes() {
        let (_root, args) = test_fixture(&["fish.jpg"]);

        let mock = MockDetector::scoring(0.5);
        let report = evaluate_with(&mock, &args).unwrap();
        assert_eq!(report.map50, Some(0.5));
        assert!(!report.below_warning_threshold());
    }

    #[test]
    fn test_throwaway_descriptor_is_cleaned_up() {
        let (_root, args) = test_fixture(&["fish.jpg"]);

        let mock = MockDetector::scoring(0.5);
        evaluate_with(&mock, &args).unwrap();
        assert!(!args.test_dir.join("test_data.yaml").exists());
    }
}
