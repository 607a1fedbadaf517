use std::path::Path;

use config::Config;
use config::ConfigError as ExternalConfigError;
use config::File;
use config::FileFormat;
use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;

/// Configuration build/deserialize failure.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct ConfigError(#[from] ExternalConfigError);

/// Workspace settings, merged from the per-user config file and the
/// solution directory's `truss.toml` / `.truss.toml` (later sources win).
#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Command used to launch the out-of-process build evaluator.
    evaluator: String,
    /// Extra arguments passed to the evaluator before `--port`.
    evaluator_args: Vec<String>,
    /// File extension of compilable sources discovered per project.
    source_extension: String,
    /// Target framework to prefer when the evaluator reports several.
    target_framework: Option<String>,
    /// How many times to retry the initial evaluator connection.
    connect_attempts: u32,
    pub debug: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            evaluator: String::from("msbuild-eval-host"),
            evaluator_args: Vec::new(),
            source_extension: String::from("cs"),
            target_framework: None,
            connect_attempts: 20,
            debug: false,
        }
    }
}

impl Settings {
    pub fn new(solution_root: &Path) -> Result<Self, ConfigError> {
        let user_config_file = ProjectDirs::from("dev", "truss", "truss")
            .map(|proj_dirs| proj_dirs.config_dir().join("truss.toml"));

        Self::load_from_paths(solution_root, user_config_file.as_deref())
    }

    fn load_from_paths(
        solution_root: &Path,
        user_config_path: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = user_config_path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
        }

        builder = builder.add_source(
            File::from(solution_root.join(".truss.toml"))
                .format(FileFormat::Toml)
                .required(false),
        );

        builder = builder.add_source(
            File::from(solution_root.join("truss.toml"))
                .format(FileFormat::Toml)
                .required(false),
        );

        let config = builder.build()?;
        let settings = config.try_deserialize()?;
        Ok(settings)
    }

    #[must_use]
    pub fn evaluator(&self) -> &str {
        &self.evaluator
    }

    #[must_use]
    pub fn evaluator_args(&self) -> &[String] {
        &self.evaluator_args
    }

    #[must_use]
    pub fn source_extension(&self) -> &str {
        &self.source_extension
    }

    #[must_use]
    pub fn target_framework(&self) -> Option<&str> {
        self.target_framework.as_deref()
    }

    #[must_use]
    pub fn connect_attempts(&self) -> u32 {
        self.connect_attempts
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_load_no_files() {
        let dir = tempdir().unwrap();
        let settings = Settings::load_from_paths(dir.path(), None).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_load_truss_toml_only() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("truss.toml"), "evaluator = \"/opt/eval\"").unwrap();
        let settings = Settings::load_from_paths(dir.path(), None).unwrap();
        assert_eq!(settings.evaluator(), "/opt/eval");
        assert_eq!(settings.source_extension(), "cs");
    }

    #[test]
    fn test_load_dot_truss_toml_only() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".truss.toml"), "debug = true").unwrap();
        let settings = Settings::load_from_paths(dir.path(), None).unwrap();
        assert!(settings.debug);
    }

    #[test]
    fn test_truss_toml_overrides_dot_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".truss.toml"), "source_extension = \"vb\"").unwrap();
        fs::write(dir.path().join("truss.toml"), "source_extension = \"cs\"").unwrap();
        let settings = Settings::load_from_paths(dir.path(), None).unwrap();
        assert_eq!(settings.source_extension(), "cs");
    }

    #[test]
    fn test_project_overrides_user_config() {
        let dir = tempdir().unwrap();
        let user_dir = tempdir().unwrap();
        let user_file = user_dir.path().join("truss.toml");
        fs::write(&user_file, "evaluator = \"user-eval\"\ndebug = true").unwrap();
        fs::write(dir.path().join("truss.toml"), "evaluator = \"project-eval\"").unwrap();

        let settings = Settings::load_from_paths(dir.path(), Some(&user_file)).unwrap();
        assert_eq!(settings.evaluator(), "project-eval");
        // Untouched keys still come from the user layer.
        assert!(settings.debug);
    }

    #[test]
    fn test_evaluator_args_list() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("truss.toml"),
            "evaluator_args = [\"--no-restore\", \"-v:q\"]",
        )
        .unwrap();
        let settings = Settings::load_from_paths(dir.path(), None).unwrap();
        assert_eq!(settings.evaluator_args(), ["--no-restore", "-v:q"]);
    }
}
