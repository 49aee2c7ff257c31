//! Metric extraction and console reporting.
//!
//! The framework hands back a flat results dict keyed by names like
//! `metrics/mAP50(B)`. Fields are pulled out defensively: a missing key
//! renders as `n/a` instead of failing the run.

use serde_json::Value;

use crate::config::{DISEASE_CLASSES, MAP50_WARNING_THRESHOLD};
use crate::delegate::ValidationOutcome;

// Keys used by the framework's results dict.
pub const KEY_MAP50: &str = "metrics/mAP50(B)";
pub const KEY_MAP50_95: &str = "metrics/mAP50-95(B)";
pub const KEY_PRECISION: &str = "metrics/precision(B)";
pub const KEY_RECALL: &str = "metrics/recall(B)";

/// Pull a numeric metric out of a results dict.
pub fn metric(results: &Value, key: &str) -> Option<f64> {
    results.get(key).and_then(Value::as_f64)
}

/// Render a metric for display.
pub fn display_metric(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.4}"),
        None => "n/a".to_string(),
    }
}

/// Evaluation summary extracted from a validation run.
#[derive(Debug, Clone)]
pub struct EvalReport {
    pub map50: Option<f64>,
    pub map50_95: Option<f64>,
    pub precision: Option<f64>,
    pub recall: Option<f64>,
    /// AP@50 per class name; classes the framework did not score are `None`.
    pub per_class_ap50: Vec<(String, Option<f64>)>,
}

impl EvalReport {
    pub fn from_outcome(outcome: &ValidationOutcome) -> Self {
        let per_class_ap50 = DISEASE_CLASSES
            .iter()
            .enumerate()
            .map(|(i, name)| (name.to_string(), outcome.per_class_ap50.get(i).copied()))
            .collect();

        Self {
            map50: metric(&outcome.metrics, KEY_MAP50),
            map50_95: metric(&outcome.metrics, KEY_MAP50_95),
            precision: metric(&outcome.metrics, KEY_PRECISION),
            recall: metric(&outcome.metrics, KEY_RECALL),
            per_class_ap50,
        }
    }

    /// Low enough that the model probably has issues. A run that reported no
    /// headline metric at all counts as failing: there is nothing to vouch
    /// for the weights.
    pub fn below_warning_threshold(&self) -> bool {
        self.map50.map_or(true, |m| m < MAP50_WARNING_THRESHOLD)
    }

    /// Print the fixed-width results table.
    pub fn print(&self) {
        println!("\n{}", "=".repeat(60));
        println!("FINAL TEST SET EVALUATION RESULTS");
        println!("{}", "=".repeat(60));

        println!("\n{:<25} {:>15}", "Metric", "Value");
        println!("{}", "-".repeat(40));
        println!("{:<25} {:>15}", "mAP@50", display_metric(self.map50));
        println!("{:<25} {:>15}", "mAP@50-95", display_metric(self.map50_95));
        println!("{:<25} {:>15}", "Precision", display_metric(self.precision));
        println!("{:<25} {:>15}", "Recall", display_metric(self.recall));

        println!("\n{:<25}", "Per-Class AP@50");
        println!("{}", "-".repeat(40));
        for (name, ap) in &self.per_class_ap50 {
            println!("  {:<23} {:>15}", name, display_metric(*ap));
        }
        println!("{}", "=".repeat(60));
    }
}
