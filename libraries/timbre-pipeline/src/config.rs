/// Host configuration
use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Config file looked up in the working directory
pub const CONFIG_FILE: &str = "timbre.toml";

/// Environment variable prefix (`TIMBRE_ANALYSIS__PROVIDER=...`)
pub const ENV_PREFIX: &str = "TIMBRE";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HostConfig {
    #[serde(default = "default_analysis")]
    pub analysis: AnalysisSettings,

    #[serde(default = "default_encoding")]
    pub encoding: EncodingSettings,

    #[serde(default = "default_logging")]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AnalysisSettings {
    #[serde(default = "default_analysis_provider")]
    pub provider: String,

    /// 0 keeps rayon's default (one thread per core)
    #[serde(default)]
    pub worker_threads: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EncodingSettings {
    #[serde(default = "default_encoding_provider")]
    pub provider: String,

    #[serde(default = "default_output_directory")]
    pub output_directory: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingSettings {
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            analysis: default_analysis(),
            encoding: default_encoding(),
            logging: default_logging(),
        }
    }
}

impl HostConfig {
    /// Load configuration from `timbre.toml` (if present) and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Load configuration from `path` (if present) and the environment
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut settings = config::Config::builder();

        if path.exists() {
            debug!("Reading configuration from {:?}", path);
            settings = settings.add_source(config::File::from(path.to_path_buf()));
        }

        // Nested keys use a double underscore: TIMBRE_ENCODING__OUTPUT_DIRECTORY
        settings = settings.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings.build()?;
        let host: Self = config.try_deserialize()?;
        host.validate()?;
        Ok(host)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.analysis.provider.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "analysis.provider must name an analyzer".to_string(),
            ));
        }
        if self.encoding.provider.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "encoding.provider must name an encoder".to_string(),
            ));
        }
        Ok(())
    }

    /// Size the global rayon pool from `analysis.worker_threads`
    ///
    /// An already initialized pool is kept as it is.
    pub fn init_worker_pool(&self) {
        let threads = self.analysis.worker_threads;
        if threads == 0 {
            return;
        }
        match rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
        {
            Ok(()) => debug!("Configured worker pool with {} threads", threads),
            Err(e) => warn!("Keeping existing worker pool: {}", e),
        }
    }
}

// Default values
fn default_analysis() -> AnalysisSettings {
    AnalysisSettings {
        provider: default_analysis_provider(),
        worker_threads: 0,
    }
}

fn default_analysis_provider() -> String {
    "ReplayGain".to_string()
}

fn default_encoding() -> EncodingSettings {
    EncodingSettings {
        provider: default_encoding_provider(),
        output_directory: default_output_directory(),
    }
}

fn default_encoding_provider() -> String {
    "LPCM".to_string()
}

fn default_output_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_logging() -> LoggingSettings {
    LoggingSettings {
        filter: default_filter(),
    }
}

fn default_filter() -> String {
    "timbre=info".to_string()
}
