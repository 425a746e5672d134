use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};

/// Runner configuration: where the simulator lives and where scenario
/// artifacts are found. Loaded from a TOML file or from the environment;
/// every field has a working default so a bare `tracelab run` works from a
/// scenario directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunnerConfig {
    /// Simulator executable invoked for each scenario.
    pub simulator: String,
    /// Directory holding the per-scenario topology config files.
    pub scenario_dir: PathBuf,
    /// Directory where transferred files are written by the simulated hosts.
    pub downloads_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            simulator: "netsim".into(),
            scenario_dir: PathBuf::from("."),
            downloads_dir: PathBuf::from("downloads"),
        }
    }
}

impl RunnerConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let cfg: Self =
            toml::from_str(&data).map_err(|e| Error::config(format!("toml parse error: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from the environment, starting from defaults.
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();
        if let Ok(v) = std::env::var("TRACELAB_SIMULATOR") {
            cfg.simulator = v;
        }
        if let Ok(v) = std::env::var("TRACELAB_SCENARIO_DIR") {
            cfg.scenario_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("TRACELAB_DOWNLOADS_DIR") {
            cfg.downloads_dir = PathBuf::from(v);
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject configurations that cannot possibly run.
    pub fn validate(&self) -> Result<()> {
        if self.simulator.trim().is_empty() {
            return Err(Error::config("simulator program must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let cfg = RunnerConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.simulator, "netsim");
    }

    #[test]
    fn empty_simulator_rejected() {
        let cfg = RunnerConfig {
            simulator: "  ".into(),
            ..RunnerConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn load_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracelab.toml");
        std::fs::write(
            &path,
            "simulator = \"mysim\"\nscenario_dir = \"cfg\"\ndownloads_dir = \"out\"\n",
        )
        .unwrap();
        let cfg = RunnerConfig::load_from_file(&path).unwrap();
        assert_eq!(cfg.simulator, "mysim");
        assert_eq!(cfg.scenario_dir, PathBuf::from("cfg"));
        assert_eq!(cfg.downloads_dir, PathBuf::from("out"));
    }
}
