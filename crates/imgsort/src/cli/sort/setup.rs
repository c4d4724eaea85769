//! Sort setup: config loading and CLI overrides.

use imgsort_core::Config;
use std::path::{Path, PathBuf};

use super::SortArgs;

/// Load the configuration and apply command-line overrides.
pub fn build_config(args: &SortArgs, config_path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = match config_path {
        Some(path) => {
            let path = expand(path);
            if !path.exists() {
                anyhow::bail!(
                    "Config file does not exist: {:?}\n\n  Hint: Create one with `imgsort config init`.",
                    path
                );
            }
            Config::load_from(&path)?
        }
        None => Config::load()?,
    };

    apply_overrides(&mut config, args);
    config.validate()?;

    let input = config.input_dir();
    if !input.is_dir() {
        anyhow::bail!(
            "Input directory does not exist: {:?}\n\n  Hint: Pass a directory or set paths.input_dir in the config.",
            input
        );
    }

    tracing::debug!(
        "Sorting {:?} into {:?} ({:?} mode, {} workers)",
        input,
        config.destination_dir(),
        config.processing.transfer_mode,
        config.processing.max_workers
    );
    Ok(config)
}

/// Apply flags on top of the loaded config. Flags that were not given leave
/// the config untouched.
pub fn apply_overrides(config: &mut Config, args: &SortArgs) {
    if let Some(input) = &args.input {
        config.paths.input_dir = expand(input);
    }
    if let Some(destination) = &args.destination {
        config.paths.destination_dir = expand(destination);
    }
    if let Some(workers) = args.workers {
        config.processing.max_workers = workers;
    }
    if let Some(batch_size) = args.batch_size {
        config.processing.batch_size = batch_size;
    }
    if let Some(transfer) = args.transfer {
        config.processing.transfer_mode = transfer.into();
    }
    if let Some(rule) = args.size_rule {
        config.classification.size_rule = rule.into();
    }
    if args.keep_structure {
        config.layout.keep_directory_structure = true;
    }
    if args.no_shape {
        config.classification.sort_by_shape = false;
    }
    if args.no_quality {
        config.classification.quality_sort = false;
    }
}

fn expand(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::sort::{SizeRuleArg, Transfer};
    use imgsort_core::config::{SizeRule, TransferMode};

    #[test]
    fn test_no_flags_keep_config() {
        let mut config = Config::default();
        let before = config.to_toml().unwrap();
        apply_overrides(&mut config, &SortArgs::default());
        assert_eq!(config.to_toml().unwrap(), before);
    }

    #[test]
    fn test_flags_override_config() {
        let mut config = Config::default();
        let args = SortArgs {
            input: Some(PathBuf::from("/photos")),
            destination: Some(PathBuf::from("/sorted")),
            workers: Some(2),
            batch_size: Some(10),
            transfer: Some(Transfer::Copy),
            keep_structure: true,
            no_shape: true,
            no_quality: true,
            size_rule: Some(SizeRuleArg::BothDimensions),
            ..Default::default()
        };
        apply_overrides(&mut config, &args);

        assert_eq!(config.paths.input_dir, PathBuf::from("/photos"));
        assert_eq!(config.paths.destination_dir, PathBuf::from("/sorted"));
        assert_eq!(config.processing.max_workers, 2);
        assert_eq!(config.processing.batch_size, 10);
        assert_eq!(config.processing.transfer_mode, TransferMode::Copy);
        assert_eq!(config.classification.size_rule, SizeRule::BothDimensions);
        assert!(config.layout.keep_directory_structure);
        assert!(!config.classification.sort_by_shape);
        assert!(!config.classification.quality_sort);
    }

    #[test]
    fn test_build_config_rejects_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        std::fs::write(&config_path, "").unwrap();

        let args = SortArgs {
            input: Some(dir.path().join("missing")),
            ..Default::default()
        };
        let err = build_config(&args, Some(&config_path)).unwrap_err();
        assert!(err.to_string().contains("Input directory does not exist"));
    }

    #[test]
    fn test_build_config_rejects_zero_workers() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        std::fs::write(&config_path, "").unwrap();

        let args = SortArgs {
            input: Some(dir.path().to_path_buf()),
            workers: Some(0),
            ..Default::default()
        };
        assert!(build_config(&args, Some(&config_path)).is_err());
    }

    #[test]
    fn test_build_config_reads_legacy_json() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("settings.json");
        std::fs::write(
            &config_path,
            r#"{ "_comment": "old style", "processing": { "max_workers": 3 } }"#,
        )
        .unwrap();

        let args = SortArgs {
            input: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let config = build_config(&args, Some(&config_path)).unwrap();
        assert_eq!(config.processing.max_workers, 3);
    }
}
