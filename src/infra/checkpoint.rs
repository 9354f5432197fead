// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights with Burn's named
// MessagePack recorder.
//
// What gets written, for --output runs/model.bin:
//
//   runs/
//     model.bin               ← primary checkpoint, best validation
//                               epoch so far, then the final model
//     model_0010.bin          ← epoch checkpoint every save_iter epochs
//     model_0020.bin
//     model.config.json       ← CfNadeConfig used to build the model
//
// The recorder serialises to bytes and this module writes them
// itself, so the file names above are exactly what the user
// asked for. File-based recorders replace the extension.
//
// Why save the config separately?
//   Loading weights needs a model of the same shape. Resuming
//   with --input reads the config first and refuses to start
//   when the architecture differs.
//
// Reference: Burn Book §5 (Records and Checkpointing)
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkBytesRecorder, Recorder},
};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::traits::ModelSink;
use crate::ml::model::{CfNadeConfig, CfNadeModel};

type WeightsRecorder = NamedMpkBytesRecorder<FullPrecisionSettings>;

/// Owns the primary checkpoint path and everything derived from it.
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    primary: PathBuf,
}

impl CheckpointManager {
    /// Creates the parent directory of `output` if needed.
    pub fn new(output: impl Into<PathBuf>) -> Result<Self> {
        let primary = output.into();
        if let Some(dir) = primary.parent().filter(|d| !d.as_os_str().is_empty()) {
            // create_dir_all is `mkdir -p`: fine if it already exists
            fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        }
        Ok(Self { primary })
    }

    pub fn primary_path(&self) -> &Path {
        &self.primary
    }

    /// `<stem>_<epoch:04><ext>` next to the primary checkpoint.
    pub fn epoch_path(&self, epoch: usize) -> PathBuf {
        self.sibling(&format!("_{epoch:04}"), self.extension())
    }

    /// `<stem>.config.json` next to the primary checkpoint.
    pub fn config_path(&self) -> PathBuf {
        config_path_for(&self.primary)
    }

    /// `<stem>_metrics.csv` next to the primary checkpoint.
    pub fn metrics_path(&self) -> PathBuf {
        self.sibling("_metrics", ".csv")
    }

    fn extension(&self) -> String {
        self.primary
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default()
    }

    fn sibling(&self, suffix: &str, extension: impl AsRef<str>) -> PathBuf {
        let stem = self.primary
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.primary.with_file_name(format!("{stem}{suffix}{}", extension.as_ref()))
    }

    pub fn save_config(&self, cfg: &CfNadeConfig) -> Result<()> {
        let path = self.config_path();
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved model config to '{}'", path.display());
        Ok(())
    }
}

/// Config file that belongs to the checkpoint at `weights`.
pub fn config_path_for(weights: &Path) -> PathBuf {
    weights.with_extension("config.json")
}

/// Read the config saved next to `weights`, if there is one.
pub fn load_config(weights: &Path) -> Result<Option<CfNadeConfig>> {
    let path = config_path_for(weights);
    if !path.exists() {
        return Ok(None);
    }
    let json = fs::read_to_string(&path)
        .with_context(|| format!("Cannot read config from '{}'", path.display()))?;
    let cfg = serde_json::from_str(&json)
        .with_context(|| format!("Invalid model config in '{}'", path.display()))?;
    Ok(Some(cfg))
}

/// Write the model's parameters to exactly `path`.
///
/// The bytes go to `<file>.tmp` first and are renamed over `path`,
/// so a failed write leaves the previous checkpoint intact.
pub fn save_model<B: Backend>(model: &CfNadeModel<B>, path: &Path) -> Result<()> {
    let bytes = WeightsRecorder::default()
        .record(model.clone().into_record(), ())
        .with_context(|| format!("Failed to serialise checkpoint for '{}'", path.display()))?;

    let tmp = temporary_path(path);
    fs::write(&tmp, bytes)
        .with_context(|| format!("Failed to save checkpoint to '{}'", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to move checkpoint into '{}'", path.display()))?;

    tracing::debug!("Saved checkpoint '{}'", path.display());
    Ok(())
}

fn temporary_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "checkpoint".to_string());
    path.with_file_name(format!("{name}.tmp"))
}

/// Load parameters from `path` into `model`, which must already
/// have the saved architecture.
pub fn load_model<B: Backend>(
    model:  CfNadeModel<B>,
    path:   &Path,
    device: &B::Device,
) -> Result<CfNadeModel<B>> {
    let bytes = fs::read(path)
        .with_context(|| format!("Cannot read checkpoint '{}'", path.display()))?;
    let record = WeightsRecorder::default()
        .load(bytes, device)
        .with_context(|| format!("Cannot load checkpoint '{}'", path.display()))?;
    tracing::info!("Loaded checkpoint '{}'", path.display());
    Ok(model.load_record(record))
}

impl<B: Backend> ModelSink<CfNadeModel<B>> for CheckpointManager {
    fn save_primary(&self, model: &CfNadeModel<B>) -> Result<()> {
        save_model(model, &self.primary)
    }

    fn save_epoch(&self, model: &CfNadeModel<B>, epoch: usize) -> Result<()> {
        save_model(model, &self.epoch_path(epoch))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    fn config() -> CfNadeConfig {
        CfNadeConfig::new(4, 3, 2).with_hidden_size(6)
    }

    #[test]
    fn test_derived_paths() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path().join("model.bin")).unwrap();
        assert_eq!(ckpt.epoch_path(10),  dir.path().join("model_0010.bin"));
        assert_eq!(ckpt.epoch_path(123), dir.path().join("model_0123.bin"));
        assert_eq!(ckpt.config_path(),   dir.path().join("model.config.json"));
        assert_eq!(ckpt.metrics_path(),  dir.path().join("model_metrics.csv"));
    }

    #[test]
    fn test_epoch_path_without_extension() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path().join("weights")).unwrap();
        assert_eq!(ckpt.epoch_path(3), dir.path().join("weights_0003"));
    }

    #[test]
    fn test_new_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b").join("model.bin");
        CheckpointManager::new(&nested).unwrap();
        assert!(dir.path().join("a").join("b").is_dir());
    }

    #[test]
    fn test_weights_survive_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path().join("model.bin")).unwrap();
        let device = Default::default();

        let saved = config().init::<TestBackend>(&device);
        ModelSink::save_primary(&ckpt, &saved).unwrap();
        assert!(ckpt.primary_path().exists());

        let fresh = config().init::<TestBackend>(&device);
        let loaded = load_model(fresh, ckpt.primary_path(), &device).unwrap();

        let expected: Vec<f32> = saved.output.weight.val().into_data().to_vec().unwrap();
        let actual:   Vec<f32> = loaded.output.weight.val().into_data().to_vec().unwrap();
        assert_eq!(expected, actual);
    }

    #[test]
    fn test_epoch_checkpoint_lands_on_epoch_path() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path().join("model.bin")).unwrap();
        let model = config().init::<TestBackend>(&Default::default());
        ModelSink::save_epoch(&ckpt, &model, 20).unwrap();
        assert!(dir.path().join("model_0020.bin").exists());
        assert!(!ckpt.primary_path().exists());
    }

    #[test]
    fn test_config_round_trip_and_absence() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path().join("model.bin")).unwrap();
        assert!(load_config(ckpt.primary_path()).unwrap().is_none());

        ckpt.save_config(&config()).unwrap();
        let loaded = load_config(ckpt.primary_path()).unwrap().unwrap();
        assert!(loaded.same_architecture(&config()));
    }

    #[test]
    fn test_overwrite_leaves_no_temporary_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        let model = config().init::<TestBackend>(&Default::default());

        save_model(&model, &path).unwrap();
        save_model(&model, &path).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path()).unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["model.bin".to_string()]);
    }

    #[test]
    fn test_failed_write_keeps_previous_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        let device = Default::default();

        let first = config().init::<TestBackend>(&device);
        save_model(&first, &path).unwrap();
        let before = fs::read(&path).unwrap();

        // A directory squatting on the temporary name makes the write fail.
        fs::create_dir(dir.path().join("model.bin.tmp")).unwrap();
        let second = config().init::<TestBackend>(&device);
        assert!(save_model(&second, &path).is_err());
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_missing_checkpoint_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let model = config().init::<TestBackend>(&Default::default());
        assert!(load_model(model, &dir.path().join("absent.bin"), &Default::default()).is_err());
    }
}
