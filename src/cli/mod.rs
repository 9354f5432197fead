// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, TrainArgs};

use crate::application::train_use_case::{TrainSummary, TrainUseCase};

/// The main CLI struct
#[derive(Parser, Debug)]
#[command(
    name = "cf-nade",
    version = "0.1.0",
    about = "Train a CF-NADE ordinal rating model on explicit-feedback data."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args) => run_train(args),
        }
    }
}

/// Converts CLI args into a TrainConfig and hands off to Layer 2.
fn run_train(args: TrainArgs) -> Result<()> {

    tracing::info!("Starting training on '{}'", args.data_file.display());

    let summary = TrainUseCase::new(args.into()).execute()?;

    println!("{}", final_line(&summary));
    Ok(())
}

fn final_line(summary: &TrainSummary) -> String {
    match (summary.best_test_accuracy, summary.best_valid_accuracy) {
        (Some(test), Some(valid)) => format!("final test accuracy={test:.6} (best valid accuracy={valid:.6})"),
        (None, Some(valid))       => format!("final test accuracy=n/a (best valid accuracy={valid:.6})"),
        _                         => "final test accuracy=n/a (no validation epoch scored)".to_string(),
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::TrainConfig;
    use crate::ml::trainer::EvalOrdering;

    fn parse(extra: &[&str]) -> TrainConfig {
        let mut argv = vec!["cf-nade", "train", "--output", "m.bin", "--data-file", "d.json"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Train(args) => args.into(),
        }
    }

    #[test]
    fn test_defaults_match_config_defaults() {
        let parsed   = parse(&[]);
        let defaults = TrainConfig::default();
        assert_eq!(parsed.gpu,            defaults.gpu);
        assert_eq!(parsed.batch_size,     defaults.batch_size);
        assert_eq!(parsed.layer_num,      defaults.layer_num);
        assert_eq!(parsed.hidden_size,    defaults.hidden_size);
        assert_eq!(parsed.ordinal_weight, defaults.ordinal_weight);
        assert_eq!(parsed.epochs,         defaults.epochs);
        assert_eq!(parsed.save_iter,      defaults.save_iter);
        assert_eq!(parsed.lr,             defaults.lr);
        assert_eq!(parsed.weight_decay,   defaults.weight_decay);
        assert_eq!(parsed.seed,           defaults.seed);
        assert_eq!(parsed.eval_ordering,  defaults.eval_ordering);
        assert!(!parsed.item_base);
        assert!(parsed.input.is_none());
    }

    #[test]
    fn test_flags_are_mapped() {
        let parsed = parse(&[
            "--gpu", "-2", "--iter", "7", "--random-seed", "9",
            "--item-base", "--eval-ordering", "random", "--input", "old.bin",
        ]);
        assert_eq!(parsed.gpu, -2);
        assert_eq!(parsed.epochs, 7);
        assert_eq!(parsed.seed, 9);
        assert!(parsed.item_base);
        assert_eq!(parsed.eval_ordering, EvalOrdering::Random);
        assert_eq!(parsed.input.as_deref(), Some(std::path::Path::new("old.bin")));
    }

    #[test]
    fn test_final_line_reports_best_epoch() {
        let summary = TrainSummary { best_valid_accuracy: Some(0.6), best_test_accuracy: Some(0.3) };
        assert_eq!(final_line(&summary), "final test accuracy=0.300000 (best valid accuracy=0.600000)");

        let none = TrainSummary { best_valid_accuracy: None, best_test_accuracy: None };
        assert!(final_line(&none).contains("n/a"));
    }

    #[test]
    fn test_output_and_data_file_are_required() {
        assert!(Cli::try_parse_from(["cf-nade", "train", "--output", "m.bin"]).is_err());
        assert!(Cli::try_parse_from(["cf-nade", "train", "--data-file", "d.json"]).is_err());
    }
}
