//! Configuration management utilities.

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use serde::{Deserialize, Serialize};

const DEFAULT_CONFIG: &str = include_str!("../../assets/default-config.toml");
const DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".dirflat/config.toml";

/// Layered configuration loaded from defaults, user, workspace, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub flatten: Flatten,
    #[serde(default)]
    pub logging: Logging,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Flatten {
    #[serde(default)]
    relative_paths: Option<bool>,
    #[serde(default)]
    follow_links: Option<bool>,
    #[serde(default)]
    pub ignore_globs: Vec<String>,
}

impl Flatten {
    /// Record paths relative to the flattened root instead of as walked.
    pub fn relative_paths(&self) -> bool {
        self.relative_paths.unwrap_or(false)
    }

    pub fn follow_links(&self) -> bool {
        self.follow_links.unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Logging {
    #[serde(default)]
    level: Option<String>,
}

impl Logging {
    fn default_level() -> &'static str {
        "warn"
    }

    pub fn level(&self) -> String {
        self.level
            .clone()
            .unwrap_or_else(|| Self::default_level().to_owned())
    }
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    log_level: Option<String>,
    relative_paths: Option<bool>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            log_level: env::var("DIRFLAT_LOG").ok().filter(|v| !v.trim().is_empty()),
            relative_paths: env::var("DIRFLAT_RELATIVE_PATHS")
                .ok()
                .and_then(|value| parse_bool(&value)),
        }
    }

    #[cfg(test)]
    fn for_tests(log_level: &str, relative_paths: bool) -> Self {
        Self {
            log_level: Some(log_level.to_owned()),
            relative_paths: Some(relative_paths),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Config {
    /// Load configuration from defaults, user/global config, workspace config, and env overrides.
    pub fn load() -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = workspace_config_path()?;
        Self::load_with_layers(global, workspace, env)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            tracing::debug!(path = %global_path.display(), "loading global config");
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            tracing::debug!(path = %workspace_path.display(), "loading workspace config");
            layers.push(Self::from_file(&workspace_path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        Ok(apply_env_overrides(merged, env_overrides))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
            .with_context(|| format!("invalid config file: {}", path.display()))
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            flatten: merge_flatten(self.flatten, other.flatten),
            logging: merge_logging(self.logging, other.logging),
        }
    }
}

fn merge_flatten(mut base: Flatten, overlay: Flatten) -> Flatten {
    if let Some(value) = overlay.relative_paths {
        base.relative_paths = Some(value);
    }
    if let Some(value) = overlay.follow_links {
        base.follow_links = Some(value);
    }
    let mut globs: BTreeSet<String> = base.ignore_globs.into_iter().collect();
    globs.extend(overlay.ignore_globs);
    base.ignore_globs = globs.into_iter().collect();
    base
}

fn merge_logging(mut base: Logging, overlay: Logging) -> Logging {
    if let Some(level) = overlay.level {
        base.level = Some(level);
    }
    base
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("dirflat/config.toml"))
}

fn workspace_config_path() -> Result<Option<PathBuf>> {
    let cwd = env::current_dir()?;
    let root = find_repo_root(&cwd).unwrap_or(cwd);
    Ok(Some(root.join(DEFAULT_WORKSPACE_CONFIG_PATH)))
}

fn find_repo_root(start: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(level) = env.log_level {
        config.logging.level = Some(level);
    }
    if let Some(relative) = env.relative_paths {
        config.flatten.relative_paths = Some(relative);
    }
    config
}
