use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::types::SafetyTier;

pub const CONFIG_FILE: &str = ".tierscan.toml";

const MIB: u64 = 1024 * 1024;

/// Top-level configuration from `.tierscan.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub thresholds: Thresholds,
}

/// Which files are considered and where the report goes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_code_extensions")]
    pub code_extensions: Vec<String>,
    #[serde(default = "default_config_extensions")]
    pub config_extensions: Vec<String>,
    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,
    /// Files matching these globs are reported even if their kind is unknown.
    #[serde(default)]
    pub include_patterns: Vec<String>,
    #[serde(default = "default_output")]
    pub output: String,
}

fn default_code_extensions() -> Vec<String> {
    vec!["py".to_string()]
}

fn default_config_extensions() -> Vec<String> {
    ["ini", "cfg", "conf", "toml", "yml", "yaml", "json"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_exclude_patterns() -> Vec<String> {
    vec![
        ".git/**".to_string(),
        "target/**".to_string(),
        "**/__pycache__/**".to_string(),
        "**/.venv/**".to_string(),
    ]
}

fn default_output() -> String {
    "foundational/report.md".to_string()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            code_extensions: default_code_extensions(),
            config_extensions: default_config_extensions(),
            exclude_patterns: default_exclude_patterns(),
            include_patterns: Vec::new(),
            output: default_output(),
        }
    }
}

/// Tier boundaries. A value equal to a boundary belongs to the lower tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    #[serde(default = "default_complexity_simple")]
    pub complexity_simple: u32,
    #[serde(default = "default_complexity_safe")]
    pub complexity_safe: u32,
    #[serde(default = "default_complexity_complex")]
    pub complexity_complex: u32,
    #[serde(default = "default_size_simple")]
    pub size_simple: u64,
    #[serde(default = "default_size_safe")]
    pub size_safe: u64,
    #[serde(default = "default_size_complex")]
    pub size_complex: u64,
    /// Comment density below this ratio is flagged in the reason (advisory only).
    #[serde(default = "default_low_comment_density")]
    pub low_comment_density: f64,
}

fn default_complexity_simple() -> u32 {
    15
}
fn default_complexity_safe() -> u32 {
    35
}
fn default_complexity_complex() -> u32 {
    55
}
fn default_size_simple() -> u64 {
    MIB
}
fn default_size_safe() -> u64 {
    MIB * 5 / 2
}
fn default_size_complex() -> u64 {
    MIB * 4
}
fn default_low_comment_density() -> f64 {
    0.10
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            complexity_simple: default_complexity_simple(),
            complexity_safe: default_complexity_safe(),
            complexity_complex: default_complexity_complex(),
            size_simple: default_size_simple(),
            size_safe: default_size_safe(),
            size_complex: default_size_complex(),
            low_comment_density: default_low_comment_density(),
        }
    }
}

impl Thresholds {
    pub fn complexity_tier(&self, complexity: u32) -> SafetyTier {
        if complexity <= self.complexity_simple {
            SafetyTier::Simple
        } else if complexity <= self.complexity_safe {
            SafetyTier::Safe
        } else if complexity <= self.complexity_complex {
            SafetyTier::Complex
        } else {
            SafetyTier::Danger
        }
    }

    pub fn size_tier(&self, bytes: u64) -> SafetyTier {
        if bytes <= self.size_simple {
            SafetyTier::Simple
        } else if bytes <= self.size_safe {
            SafetyTier::Safe
        } else if bytes <= self.size_complex {
            SafetyTier::Complex
        } else {
            SafetyTier::Danger
        }
    }

    /// Reject boundaries that would make tiers overlap or skip.
    pub fn validate(&self) -> Result<()> {
        if !(self.complexity_simple < self.complexity_safe
            && self.complexity_safe < self.complexity_complex)
        {
            anyhow::bail!(
                "complexity thresholds must be strictly increasing (got {}, {}, {})",
                self.complexity_simple,
                self.complexity_safe,
                self.complexity_complex
            );
        }
        if !(self.size_simple < self.size_safe && self.size_safe < self.size_complex) {
            anyhow::bail!(
                "size thresholds must be strictly increasing (got {}, {}, {})",
                self.size_simple,
                self.size_safe,
                self.size_complex
            );
        }
        if !(0.0..=1.0).contains(&self.low_comment_density) {
            anyhow::bail!(
                "low_comment_density must be a ratio between 0 and 1 (got {})",
                self.low_comment_density
            );
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from a `.tierscan.toml` file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let config: Config = toml::from_str(&content).with_context(|| {
            format!(
                "failed to parse '{}'. Run `tierscan init` to create a valid config file",
                path.display()
            )
        })?;
        config
            .thresholds
            .validate()
            .with_context(|| format!("invalid thresholds in '{}'", path.display()))?;
        Ok(config)
    }

    /// Load from `.tierscan.toml` in the given directory or any ancestor.
    /// Defaults apply only when no file is found; a file that is found but
    /// invalid is an error.
    pub fn load_or_default(dir: &Path) -> Result<Self> {
        let start = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
        let mut current = start.as_path();
        loop {
            let config_path = current.join(CONFIG_FILE);
            if config_path.exists() {
                tracing::debug!(path = %config_path.display(), "using discovered config");
                return Self::load(&config_path);
            }
            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }
        Ok(Self::default())
    }

    /// Generate default TOML content for `tierscan init`.
    pub fn default_toml() -> String {
        r#"# tierscan - AI maintainability assessment configuration

[scan]
code_extensions = ["py"]
config_extensions = ["ini", "cfg", "conf", "toml", "yml", "yaml", "json"]
exclude_patterns = [".git/**", "target/**", "**/__pycache__/**", "**/.venv/**"]
# Files matching these globs are always reported, even when their kind is unknown.
# include_patterns = ["scripts/*.sh"]
output = "foundational/report.md"

[thresholds]
# Cyclomatic complexity of the most complex function in a code file
complexity_simple = 15
complexity_safe = 35
complexity_complex = 55
# Config file size in bytes (1 MiB, 2.5 MiB, 4 MiB)
size_simple = 1048576
size_safe = 2621440
size_complex = 4194304
# Comment density below this ratio is flagged (advisory, never changes the tier)
low_comment_density = 0.10
"#
        .to_string()
    }
}
