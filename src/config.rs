use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::console::ConsoleStyle;

const DEFAULT_CONFIG_FILE: &str = "timeledger.toml";
const DEFAULT_DATA_PATH: &str = "data/data.json";
const DEFAULT_DAY_END: &str = "22:00";
const DEFAULT_TOP_LIMIT: usize = 5;
const CONFIG_ENV: &str = "TIMELEDGER_CONFIG";
const DATA_ENV: &str = "TIMELEDGER_DATA";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("failed to read config {path}: {source}")]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("config {path} is malformed: {source}")]
	Parse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},
	#[error("day_end must look like HH:MM, got {0:?}")]
	InvalidDayEnd(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	pub data_path: PathBuf,
	/// Clock time the "time left" banner counts down to.
	pub day_end: String,
	/// Rows shown by `top`; zero shows every activity.
	pub top_limit: usize,
	pub color: bool,
	pub clear_screen: bool,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			data_path: PathBuf::from(DEFAULT_DATA_PATH),
			day_end: DEFAULT_DAY_END.to_string(),
			top_limit: DEFAULT_TOP_LIMIT,
			color: true,
			clear_screen: true,
		}
	}
}

impl Settings {
	pub fn parse(raw: &str, path: &Path) -> Result<Self, ConfigError> {
		let settings: Settings = toml::from_str(raw).map_err(|source| ConfigError::Parse {
			path: path.to_path_buf(),
			source,
		})?;
		settings.day_end()?;
		Ok(settings)
	}

	pub fn day_end(&self) -> Result<NaiveTime, ConfigError> {
		NaiveTime::parse_from_str(self.day_end.trim(), "%H:%M")
			.map_err(|_| ConfigError::InvalidDayEnd(self.day_end.clone()))
	}

	pub fn top_limit(&self) -> Option<usize> {
		(self.top_limit > 0).then_some(self.top_limit)
	}

	pub fn console_style(&self) -> ConsoleStyle {
		ConsoleStyle {
			color: self.color,
			clear_screen: self.clear_screen,
		}
	}
}

pub fn resolve_config_path(cli_path: Option<PathBuf>) -> Option<PathBuf> {
	resolve_config_path_from(cli_path, env::var_os(CONFIG_ENV), Path::new(DEFAULT_CONFIG_FILE))
}

pub fn resolve_data_path(cli_path: Option<PathBuf>, settings: &Settings) -> PathBuf {
	resolve_data_path_from(cli_path, env::var_os(DATA_ENV), settings)
}

/// Reads settings from `path`, or returns the defaults when no config file
/// was selected.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
	let Some(path) = path else {
		return Ok(Settings::default());
	};

	let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
		path: path.to_path_buf(),
		source,
	})?;
	let settings = Settings::parse(&raw, path)?;
	tracing::debug!(path = %path.display(), "loaded settings");
	Ok(settings)
}

fn resolve_config_path_from(
	cli_path: Option<PathBuf>,
	env_path: Option<OsString>,
	default_path: &Path,
) -> Option<PathBuf> {
	if let Some(path) = cli_path {
		return Some(path);
	}

	if let Some(path) = env_path.filter(|path| !path.is_empty()) {
		return Some(PathBuf::from(path));
	}

	default_path.exists().then(|| default_path.to_path_buf())
}

fn resolve_data_path_from(
	cli_path: Option<PathBuf>,
	env_path: Option<OsString>,
	settings: &Settings,
) -> PathBuf {
	if let Some(path) = cli_path {
		return path;
	}

	if let Some(path) = env_path.filter(|path| !path.is_empty()) {
		return PathBuf::from(path);
	}

	settings.data_path.clone()
}
