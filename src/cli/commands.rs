// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the `train` subcommand and all its configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::application::train_use_case::TrainConfig;
use crate::ml::trainer::EvalOrdering;

/// The top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a CF-NADE model on a rating dataset
    Train(TrainArgs),
}

/// How evaluation orders each row's ratings
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalOrderingArg {
    /// Same orderings every epoch; metrics are comparable across epochs
    Fixed,
    /// Fresh orderings every epoch
    Random,
}

impl From<EvalOrderingArg> for EvalOrdering {
    fn from(a: EvalOrderingArg) -> Self {
        match a {
            EvalOrderingArg::Fixed  => EvalOrdering::Fixed,
            EvalOrderingArg::Random => EvalOrdering::Random,
        }
    }
}

/// All arguments for the `train` command.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Accelerator index; negative runs on the CPU
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    pub gpu: i32,

    /// Checkpoint to resume training from
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Primary checkpoint path; epoch checkpoints, config and
    /// metrics are written next to it
    #[arg(long)]
    pub output: PathBuf,

    /// JSON dataset: [user_count, item_count, train, test|null]
    #[arg(long)]
    pub data_file: PathBuf,

    /// Rows (users, or items with --item-base) per minibatch
    #[arg(long, default_value_t = 512)]
    pub batch_size: usize,

    /// Number of stacked tanh hidden layers
    #[arg(long, default_value_t = 1)]
    pub layer_num: usize,

    /// Width of every hidden layer
    #[arg(long, default_value_t = 500)]
    pub hidden_size: usize,

    /// Blend between reconstruction (0.0) and ordinal (1.0) cost
    #[arg(long, default_value_t = 1.0)]
    pub ordinal_weight: f64,

    /// Number of training epochs
    #[arg(long = "iter", default_value_t = 200)]
    pub epochs: usize,

    /// Write an epoch checkpoint every N epochs (0 = never)
    #[arg(long, default_value_t = 10)]
    pub save_iter: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// L2 penalty added to the gradient
    #[arg(long, default_value_t = 0.015)]
    pub weight_decay: f64,

    /// Model items' rating vectors instead of users'
    #[arg(long)]
    pub item_base: bool,

    /// Seed for init, splitting, shuffling and orderings
    #[arg(long = "random-seed", default_value_t = 1)]
    pub seed: u64,

    /// Orderings used when scoring train / valid / test
    #[arg(long, value_enum, default_value_t = EvalOrderingArg::Fixed)]
    pub eval_ordering: EvalOrderingArg,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            gpu:            a.gpu,
            input:          a.input,
            output:         a.output,
            data_file:      a.data_file,
            batch_size:     a.batch_size,
            layer_num:      a.layer_num,
            hidden_size:    a.hidden_size,
            ordinal_weight: a.ordinal_weight,
            epochs:         a.epochs,
            save_iter:      a.save_iter,
            lr:             a.lr,
            weight_decay:   a.weight_decay,
            item_base:      a.item_base,
            seed:           a.seed,
            eval_ordering:  a.eval_ordering.into(),
        }
    }
}
