use fish_core::{default_kernel_threads, FishError, FishResult};
use fish_remap::RemapConfig;
use std::path::PathBuf;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Everything a batch run needs
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BatchConfig {
    pub source_dir: PathBuf,
    pub dest_dir: PathBuf,
    /// Number of concurrent workers, each with its own compute context
    pub workers: usize,
    /// Threads for the CPU kernels; all logical CPUs when unset
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub cpu_threads: Option<usize>,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub remap: RemapConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("imgs"),
            dest_dir: PathBuf::from("elaborated"),
            workers: 8,
            cpu_threads: None,
            remap: RemapConfig::default(),
        }
    }
}

impl BatchConfig {
    pub fn new(source_dir: impl Into<PathBuf>, dest_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            dest_dir: dest_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_remap(mut self, remap: RemapConfig) -> Self {
        self.remap = remap;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn kernel_threads(&self) -> usize {
        self.cpu_threads.unwrap_or_else(default_kernel_threads)
    }

    pub fn summary(&self) -> String {
        format!(
            "{} -> {}, workers={}, kernel threads={}, {}",
            self.source_dir.display(),
            self.dest_dir.display(),
            self.workers,
            self.kernel_threads(),
            self.remap.summary()
        )
    }

    pub fn validate(&self) -> FishResult<()> {
        if self.workers == 0 {
            return Err(FishError::Configuration(
                "worker count must be at least 1".to_string(),
            ));
        }
        if self.cpu_threads == Some(0) {
            return Err(FishError::Configuration(
                "CPU thread count must be at least 1".to_string(),
            ));
        }
        self.remap.validate()
    }

    /// Save configuration to JSON file
    #[cfg(feature = "serde")]
    pub fn save_json<P: AsRef<std::path::Path>>(&self, path: P) -> FishResult<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?).map_err(|e| FishError::io(path, e))
    }

    /// Load configuration from JSON file
    #[cfg(feature = "serde")]
    pub fn load_json<P: AsRef<std::path::Path>>(path: P) -> FishResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| FishError::io(path, e))?;
        Self::from_json(&content)
    }

    /// Save configuration to TOML file
    #[cfg(feature = "serde")]
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> FishResult<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_toml()?).map_err(|e| FishError::io(path, e))
    }

    /// Load configuration from TOML file
    #[cfg(feature = "serde")]
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> FishResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| FishError::io(path, e))?;
        Self::from_toml(&content)
    }

    /// Picks the format from the extension: `.json` or TOML otherwise
    #[cfg(feature = "serde")]
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> FishResult<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::load_json(path),
            _ => Self::load_toml(path),
        }
    }

    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> FishResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| FishError::Configuration(format!("cannot serialize config: {e}")))
    }

    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> FishResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| FishError::Configuration(format!("invalid JSON config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(feature = "serde")]
    pub fn to_toml(&self) -> FishResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| FishError::Configuration(format!("cannot serialize config: {e}")))
    }

    #[cfg(feature = "serde")]
    pub fn from_toml(toml_str: &str) -> FishResult<Self> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| FishError::Configuration(format!("invalid TOML config: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}
