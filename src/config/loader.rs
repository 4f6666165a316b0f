//! Multi-source config loading.
//!
//! Priority, lowest to highest:
//! 1. Built-in defaults
//! 2. YAML file: explicit `--config` path, else `.guata.yaml` in the
//!    project root, else `config.yaml` in the user config directory
//! 3. Environment variables

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use super::schema::GuataConfig;
use crate::error::{GuataError, Result};

/// File name looked up in the project root.
pub const PROJECT_CONFIG_FILE: &str = ".guata.yaml";

pub const ENV_EDGE_URL: &str = "GUATA_EDGE_URL";
pub const ENV_EDGE_KEY: &str = "GUATA_EDGE_KEY";
pub const ENV_GOOGLE_KEY: &str = "GOOGLE_CSE_API_KEY";
pub const ENV_GOOGLE_CX: &str = "GOOGLE_CSE_ID";
pub const ENV_CACHE_CAPACITY: &str = "GUATA_CACHE_CAPACITY";
pub const ENV_CACHE_TTL: &str = "GUATA_CACHE_TTL_SECS";

/// Load the effective configuration.
///
/// An explicit path that does not exist is an error; the implicit
/// locations are optional.
pub fn load_config(explicit: Option<&Path>, project_root: Option<&Path>) -> Result<GuataConfig> {
    let mut config = match resolve_config_path(explicit, project_root)? {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config file");
            read_config_file(&path)?
        }
        None => GuataConfig::default(),
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Parse a YAML config file.
pub fn read_config_file(path: &Path) -> Result<GuataConfig> {
    let text = std::fs::read_to_string(path)?;
    if text.trim().is_empty() {
        return Ok(GuataConfig::default());
    }
    Ok(serde_yaml::from_str(&text)?)
}

fn resolve_config_path(
    explicit: Option<&Path>,
    project_root: Option<&Path>,
) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(GuataError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        return Ok(Some(path.to_path_buf()));
    }

    if let Some(root) = project_root {
        let candidate = root.join(PROJECT_CONFIG_FILE);
        if candidate.is_file() {
            return Ok(Some(candidate));
        }
    }

    Ok(user_config_path().filter(|p| p.is_file()))
}

/// `config.yaml` inside the platform user config directory.
pub fn user_config_path() -> Option<PathBuf> {
    ProjectDirs::from("br", "descubrams", "guata").map(|d| d.config_dir().join("config.yaml"))
}

/// Overlay environment variables onto `config`.
///
/// `lookup` is injected so tests do not have to mutate the process
/// environment. Blank values are ignored; unparsable numbers are logged
/// and ignored.
pub fn apply_env_overrides<F>(config: &mut GuataConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = get(ENV_EDGE_URL) {
        config.edge.base_url = Some(url.trim_end_matches('/').to_string());
    }
    if let Some(key) = get(ENV_EDGE_KEY) {
        config.edge.anon_key = Some(key);
    }
    if let Some(key) = get(ENV_GOOGLE_KEY) {
        config.google.api_key = Some(key);
    }
    if let Some(cx) = get(ENV_GOOGLE_CX) {
        config.google.engine_id = Some(cx);
    }
    if let Some(raw) = get(ENV_CACHE_CAPACITY) {
        match raw.trim().parse::<usize>() {
            Ok(n) => config.cache.capacity = n,
            Err(e) => tracing::warn!("Invalid {ENV_CACHE_CAPACITY} value {raw:?}: {e}"),
        }
    }
    if let Some(raw) = get(ENV_CACHE_TTL) {
        match raw.trim().parse::<u64>() {
            Ok(n) => config.cache.ttl_secs = n,
            Err(e) => tracing::warn!("Invalid {ENV_CACHE_TTL} value {raw:?}: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
