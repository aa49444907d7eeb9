use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use lpt_parser_core::{DEFAULT_IDLE_TIMEOUT, DEFAULT_SEPARATOR_PATTERN, JobSeparator, ScannerConfig};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("invalid configuration:\n{}", bullet_list(.0))]
    InvalidConfig(Vec<String>),

    #[error("'{0}' is not a directory")]
    NotADirectory(PathBuf),
}

fn bullet_list(items: &[String]) -> String {
    items.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("jobs")
}

fn default_max_concurrent_jobs() -> usize {
    2
}

fn default_reconnect_delay_secs() -> u64 {
    10
}

/// Contents of the agent's TOML configuration file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Printer socket of the unnamed "default" input
    #[serde(default)]
    pub address: Option<String>,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// How many finished jobs may be written out at the same time
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,

    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,

    #[serde(default)]
    pub inputs: Vec<InputConfig>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct InputConfig {
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub idle_timeout_ms: Option<u64>,
    #[serde(default)]
    pub separator_pattern: Option<String>,
}

/// A validated input, ready to be connected.
#[derive(Debug, Clone)]
pub struct InputSettings {
    pub address: String,
    pub output_dir: PathBuf,
    pub scanner: ScannerConfig,
}

impl AgentConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let txt = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&txt).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn parse(txt: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(txt)?)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    /// All inputs, including the top level "default" one if `address` is set.
    fn all_inputs(&self) -> Vec<InputConfig> {
        let mut inputs = Vec::with_capacity(self.inputs.len() + 1);
        if let Some(address) = &self.address {
            inputs.push(InputConfig {
                name: "default".to_string(),
                address: address.clone(),
                output_dir: None,
                idle_timeout_ms: None,
                separator_pattern: None,
            });
        }
        inputs.extend(self.inputs.iter().cloned());
        inputs
    }

    /// Checks the whole configuration and resolves every input.
    /// All problems are collected before giving up.
    pub fn validate(&self, trace: bool) -> Result<Vec<InputSettings>, AgentError> {
        let mut errors = Vec::new();
        let mut settings = Vec::new();
        let mut names: HashMap<String, usize> = HashMap::new();
        let mut addresses: HashMap<String, String> = HashMap::new();

        if self.max_concurrent_jobs == 0 {
            errors.push("'max_concurrent_jobs' must be at least 1".to_string());
        }
        let inputs = self.all_inputs();
        if inputs.is_empty() {
            errors.push("no inputs configured; set 'address' or add an [[inputs]] table".to_string());
        }

        for (i, input) in inputs.iter().enumerate() {
            let name = input.name.trim();
            let label = if name.is_empty() { format!("#{}", i + 1) } else { name.to_string() };
            if name.is_empty() {
                errors.push(format!("input {} requires a value in the 'name' field", label));
            } else if names.insert(name.to_string(), i).is_some() {
                errors.push(format!("input name [{}] is used more than once", name));
            }

            let address = input.address.trim();
            if address.is_empty() {
                errors.push(format!("input [{}] must set 'address'", label));
            } else if let Some(other) = addresses.insert(address.to_string(), label.clone()) {
                errors.push(format!("input [{}] and input [{}] have the same 'address'; this is not allowed", label, other));
            }

            let separator = match &input.separator_pattern {
                Some(pattern) => JobSeparator::new(pattern).unwrap_or_else(|err| {
                    errors.push(format!("input [{}] has an invalid 'separator_pattern': {}", label, err));
                    JobSeparator::default()
                }),
                None => JobSeparator::default(),
            };
            if input.idle_timeout_ms == Some(0) {
                errors.push(format!("input [{}] 'idle_timeout_ms' must be greater than 0", label));
            }

            let mut scanner = ScannerConfig::named(label);
            scanner.idle_timeout = input.idle_timeout_ms.map_or(DEFAULT_IDLE_TIMEOUT, Duration::from_millis);
            scanner.separator = separator;
            scanner.trace = trace;
            settings.push(InputSettings {
                address: address.to_string(),
                output_dir: input.output_dir.clone().unwrap_or_else(|| self.output_dir.clone()),
                scanner,
            });
        }

        if errors.is_empty() { Ok(settings) } else { Err(AgentError::InvalidConfig(errors)) }
    }
}

/// Makes sure `path` is a usable directory, creating it if needed.
pub fn verify_or_create_dir(path: &Path) -> anyhow::Result<()> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(AgentError::NotADirectory(path.to_path_buf()).into()),
        Err(_) => {
            log::info!("creating directory '{}'", path.display());
            fs::create_dir_all(path).with_context(|| format!("creating {}", path.display()))
        }
    }
}

/// Printed by `lpt_agent live --example-config`.
pub fn example_config() -> String {
    format!(
        r#"# Directory for finished jobs, used by inputs without their own 'output_dir'
output_dir = "jobs"
max_concurrent_jobs = 2
reconnect_delay_secs = 10

# Shortcut for a single printer:
# address = "127.0.0.1:1403"

[[inputs]]
name = "prt00e"
address = "127.0.0.1:1403"
# output_dir = "jobs/prt00e"
# idle_timeout_ms = {}
# separator_pattern = '{}'
"#,
        DEFAULT_IDLE_TIMEOUT.as_millis(),
        DEFAULT_SEPARATOR_PATTERN
    )
}
