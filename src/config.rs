//! Runtime configuration
//!
//! Defaults reproduce the stock countdown. An optional TOML file overrides
//! them and command-line flags override the file.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::countdown::DEFAULT_DEADLINE;
use crate::constants::field::TORUS_COUNT;
use crate::constants::surface::{DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH};
use crate::constants::text::TITLE;
use crate::countdown::{Countdown, Deadline, PastDeadline};
use crate::error::{AppError, AppResult};

/// How the countdown is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "native", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Animated 3D scene
    #[default]
    Scene,
    /// One plain line per second
    Text,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// RFC 3339 timestamp
    pub deadline: String,
    pub mode: Mode,
    pub past_deadline: PastDeadline,
    pub title: String,
    pub torus_count: usize,
    pub window_width: u32,
    pub window_height: u32,
    /// Fixed seed for the torus layout; random when absent
    pub seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            deadline: DEFAULT_DEADLINE.to_string(),
            mode: Mode::default(),
            past_deadline: PastDeadline::default(),
            title: TITLE.to_string(),
            torus_count: TORUS_COUNT,
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
            seed: None,
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(raw: &str) -> AppResult<Self> {
        let config: AppConfig =
            toml::from_str(raw).map_err(|e| AppError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> AppResult<Self> {
        log::info!("[AppConfig::load] Reading {}", path.display());
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Reject values no host can run with
    pub fn validate(&self) -> AppResult<()> {
        Deadline::parse(&self.deadline)?;
        if self.window_width == 0 || self.window_height == 0 {
            return Err(AppError::ConfigParse(format!(
                "window size must be non-zero, got {}x{}",
                self.window_width, self.window_height
            )));
        }
        Ok(())
    }

    pub fn deadline(&self) -> AppResult<Deadline> {
        Deadline::parse(&self.deadline)
    }

    pub fn countdown(&self) -> AppResult<Countdown> {
        Ok(Countdown::new(self.deadline()?, self.past_deadline))
    }

    /// Layout RNG: seeded when `seed` is set
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// Command-line interface
#[cfg(feature = "native")]
#[derive(clap::Parser, Debug, Default)]
#[command(name = "torus-countdown")]
#[command(about = "Countdown to a fixed deadline, as text or a 3D torus scene")]
pub struct Cli {
    /// Presentation mode
    #[arg(long, value_enum)]
    pub mode: Option<Mode>,

    /// Deadline as an RFC 3339 timestamp
    #[arg(long)]
    pub deadline: Option<String>,

    /// TOML config file
    #[arg(long)]
    pub config: Option<std::path::PathBuf>,

    /// Stop text mode after this many updates
    #[arg(long)]
    pub ticks: Option<u64>,

    /// What to show once the deadline has passed
    #[arg(long, value_enum)]
    pub past_deadline: Option<PastDeadline>,
}

#[cfg(feature = "native")]
impl Cli {
    /// Defaults, then the config file, then these flags
    pub fn resolve(&self) -> AppResult<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load(path)?,
            None => AppConfig::default(),
        };

        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(deadline) = &self.deadline {
            config.deadline = deadline.clone();
        }
        if let Some(policy) = self.past_deadline {
            config.past_deadline = policy;
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.mode, Mode::Scene);
        assert_eq!(config.past_deadline, PastDeadline::Clamp);
        assert_eq!(config.torus_count, 200);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            mode = "text"
            past_deadline = "negative"
            seed = 42
            "#,
        )
        .unwrap();
        assert_eq!(config.mode, Mode::Text);
        assert_eq!(config.past_deadline, PastDeadline::Negative);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.deadline, DEFAULT_DEADLINE);
    }

    #[test]
    fn test_bad_values_are_rejected() {
        assert!(matches!(
            AppConfig::from_toml_str("deadline = \"tomorrow\""),
            Err(AppError::InvalidDeadline { .. })
        ));
        assert!(matches!(
            AppConfig::from_toml_str("window_width = 0"),
            Err(AppError::ConfigParse(_))
        ));
        assert!(matches!(
            AppConfig::from_toml_str("colour = \"red\""),
            Err(AppError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "deadline = \"2030-01-01T00:00:00Z\"").unwrap();
        writeln!(file, "torus_count = 16").unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.torus_count, 16);
        assert_eq!(config.deadline().unwrap().to_string(), "2030-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = AppConfig::load(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(AppError::Io(_))));
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        use rand::Rng;
        let config = AppConfig {
            seed: Some(9),
            ..AppConfig::default()
        };
        let a: f32 = config.rng().gen();
        let b: f32 = config.rng().gen();
        assert_eq!(a, b);
    }

    #[cfg(feature = "native")]
    #[test]
    fn test_cli_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "mode = \"text\"").unwrap();
        writeln!(file, "deadline = \"2030-01-01T00:00:00Z\"").unwrap();

        let cli = Cli {
            mode: Some(Mode::Scene),
            config: Some(file.path().to_path_buf()),
            ..Cli::default()
        };
        let config = cli.resolve().unwrap();
        assert_eq!(config.mode, Mode::Scene);
        assert_eq!(config.deadline, "2030-01-01T00:00:00Z");
    }

    #[cfg(feature = "native")]
    #[test]
    fn test_cli_parses_flags() {
        use clap::Parser;
        let cli = Cli::try_parse_from([
            "torus-countdown",
            "--mode",
            "text",
            "--ticks",
            "3",
            "--past-deadline",
            "negative",
        ])
        .unwrap();
        assert_eq!(cli.mode, Some(Mode::Text));
        assert_eq!(cli.ticks, Some(3));
        assert_eq!(cli.past_deadline, Some(PastDeadline::Negative));
    }
}
