//! Read `$XDG_CONFIG_HOME/<app>/config.toml`.
//!
//! Two tables are recognised:
//!
//! ```toml
//! [resolver]
//! client_id = "abc"
//! use_cache = false
//! id_batch_limit = 50
//!
//! [env]
//! HELIX_LOG_DIR = "/var/log/helix"
//! ```
//!
//! `[resolver]` fields map to their `HELIX_*` variables; raw `[env]` entries win on conflict.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::LoadError;

fn xdg_config_path(app_name: &str) -> Result<Option<PathBuf>, LoadError> {
    let base = cross_xdg::BaseDirs::new().map_err(|e| LoadError::XdgPath(e.to_string()))?;
    let path = base.config_home().join(app_name).join("config.toml");
    Ok(path.is_file().then_some(path))
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ResolverTable {
    client_id: Option<String>,
    oauth_token: Option<String>,
    api_url: Option<String>,
    use_cache: Option<bool>,
    cache_path: Option<PathBuf>,
    cache_ttl_secs: Option<u64>,
    id_batch_limit: Option<usize>,
    max_concurrent_chunks: Option<usize>,
}

impl ResolverTable {
    fn into_env_pairs(self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        let mut push = |key: &'static str, value: Option<String>| {
            if let Some(v) = value {
                pairs.push((key, v));
            }
        };
        push("HELIX_CLIENT_ID", self.client_id);
        push("HELIX_OAUTH_TOKEN", self.oauth_token);
        push("HELIX_API_URL", self.api_url);
        push("HELIX_USE_CACHE", self.use_cache.map(|b| b.to_string()));
        push(
            "HELIX_CACHE_PATH",
            self.cache_path.map(|p| p.to_string_lossy().into_owned()),
        );
        push("HELIX_CACHE_TTL_SECS", self.cache_ttl_secs.map(|n| n.to_string()));
        push("HELIX_ID_BATCH_LIMIT", self.id_batch_limit.map(|n| n.to_string()));
        push(
            "HELIX_MAX_CONCURRENT_CHUNKS",
            self.max_concurrent_chunks.map(|n| n.to_string()),
        );
        pairs
    }
}

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    resolver: ResolverTable,
    #[serde(default)]
    env: HashMap<String, String>,
}

/// Returns the env key-value pairs described by the config file. Missing file returns an empty map.
pub fn load_env_map(app_name: &str) -> Result<HashMap<String, String>, LoadError> {
    let Some(path) = xdg_config_path(app_name)? else {
        return Ok(HashMap::new());
    };
    let content = std::fs::read_to_string(&path).map_err(LoadError::XdgRead)?;
    let config: ConfigFile = toml::from_str(&content)?;

    let mut map: HashMap<String, String> = config
        .resolver
        .into_env_pairs()
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    map.extend(config.env);
    Ok(map)
}
