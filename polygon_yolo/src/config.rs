use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(deserialize_with = "deserialize_log_level")]
    pub log_level: LogLevel,
    pub paths: PathsConfig,
    #[serde(default)]
    pub annotation: AnnotationConfig,
    #[serde(default)]
    pub overlay: OverlayConfig,
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.try_into().map_err(serde::de::Error::custom)
}

fn deserialize_line_mode<'de, D>(deserializer: D) -> Result<LineMode, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.try_into().map_err(serde::de::Error::custom)
}

#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    pub image: PathBuf,
    pub label: PathBuf,
    #[serde(default = "default_output_path")]
    pub output: PathBuf,
    pub preview: Option<PathBuf>,
}

fn default_output_path() -> PathBuf {
    PathBuf::from("output.txt")
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AnnotationConfig {
    #[serde(default, deserialize_with = "deserialize_line_mode")]
    pub line_mode: LineMode,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OverlayConfig {
    #[serde(default = "default_thickness")]
    pub thickness: u32,
    #[serde(default = "default_color")]
    pub color: [u8; 3],
}

/// Upper bound for the overlay outline, in pixels.
pub const MAX_THICKNESS: u32 = 256;

fn default_thickness() -> u32 {
    2
}

fn default_color() -> [u8; 3] {
    [0, 255, 0]
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            thickness: default_thickness(),
            color: default_color(),
        }
    }
}

impl OverlayConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.thickness == 0 {
            return Err("Overlay thickness must be at least 1 pixel".to_string());
        }
        if self.thickness > MAX_THICKNESS {
            return Err(format!(
                "Overlay thickness {} exceeds the maximum of {} pixels",
                self.thickness, MAX_THICKNESS
            ));
        }
        Ok(())
    }
}

/// Which lines of a label file are turned into boxes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LineMode {
    #[default]
    First,
    All,
}

impl LineMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineMode::First => "first",
            LineMode::All => "all",
        }
    }
}

impl TryFrom<String> for LineMode {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "first" => Ok(Self::First),
            "all" => Ok(Self::All),
            other => Err(format!(
                "{} is not a supported line mode. Use either `first` or `all`.",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub enum LogLevel {
    Debug,
    Info,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            other => Err(format!(
                "{} is not a supported minimum log level. Use either `debug` or `info`.",
                other
            )),
        }
    }
}

/// Values given on the command line; they take precedence over every other
/// configuration source.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config_dir: PathBuf,
    pub image: Option<PathBuf>,
    pub label: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub preview: Option<PathBuf>,
    pub all_lines: bool,
    pub thickness: Option<u32>,
}

fn path_value(path: &Option<PathBuf>) -> Option<String> {
    path.as_ref().map(|p| p.display().to_string())
}

pub fn get_configuration(overrides: &Overrides) -> Result<Config, config::ConfigError> {
    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;

    build_configuration(overrides, &environment)
}

pub fn build_configuration(
    overrides: &Overrides,
    environment: &Environment,
) -> Result<Config, config::ConfigError> {
    build_configuration_from(overrides, environment, None)
}

/// `env_vars` replaces the process environment for the `PY_` layer when set.
fn build_configuration_from(
    overrides: &Overrides,
    environment: &Environment,
    env_vars: Option<config::Map<String, String>>,
) -> Result<Config, config::ConfigError> {
    let configuration_directory: &Path = &overrides.config_dir;

    let mut builder = config::Config::builder()
        .set_default("log_level", "info")?
        .add_source(
            config::File::from(configuration_directory.join("base.yaml")).required(false),
        )
        .add_source(
            config::File::from(
                configuration_directory.join(format!("{}.yaml", environment.as_str())),
            )
            .required(false),
        )
        .add_source(
            config::Environment::with_prefix("PY")
                .prefix_separator("_")
                .separator("__")
                .source(env_vars),
        )
        .set_override_option("paths.image", path_value(&overrides.image))?
        .set_override_option("paths.label", path_value(&overrides.label))?
        .set_override_option("paths.output", path_value(&overrides.output))?
        .set_override_option("paths.preview", path_value(&overrides.preview))?
        .set_override_option("overlay.thickness", overrides.thickness.map(i64::from))?;

    if overrides.all_lines {
        builder = builder.set_override("annotation.line_mode", LineMode::All.as_str())?;
    }

    let config: Config = builder.build()?.try_deserialize::<Config>()?;

    config
        .overlay
        .validate()
        .map_err(config::ConfigError::Message)?;

    Ok(config)
}
