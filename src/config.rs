use serde::Deserialize;
use std::time::Duration;

/// Which store the server keeps its data in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Redis,
    Memory,
}

impl StoreBackend {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "redis" => Some(Self::Redis),
            "memory" | "mem" => Some(Self::Memory),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Redis => "redis",
            Self::Memory => "memory",
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    // HTTP settings
    pub listen_addr: String,
    pub debug: bool,

    // Store settings
    pub store: StoreBackend,
    pub redis_url: String,
    /// Database holding lookup cache entries, kept apart from feed data
    pub cache_redis_url: String,
    pub flush_on_start: bool,

    // Lookup cache settings
    pub lookup_url: String,
    pub cache_ttl_secs: Option<u64>,
}

impl Config {
    /// Expiry applied to lookup cache entries; `None` keeps them forever.
    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_secs.map(Duration::from_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
            debug: false,
            store: StoreBackend::Redis,
            redis_url: "redis://127.0.0.1:6379/0".to_string(),
            cache_redis_url: "redis://127.0.0.1:6379/1".to_string(),
            flush_on_start: false,
            lookup_url: "http://ip-api.com/json".to_string(),
            cache_ttl_secs: None,
        }
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(false)
}

pub fn load_config() -> anyhow::Result<Config> {
    let listen_addr = std::env::var("KVDEMO_LISTEN_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string());

    let debug = std::env::var("DEBUG").is_ok();

    let store = match std::env::var("KVDEMO_STORE") {
        Ok(v) => StoreBackend::parse(&v).ok_or_else(|| {
            anyhow::anyhow!("unknown store backend {:?} (expected redis or memory)", v)
        })?,
        Err(_) => StoreBackend::Redis,
    };

    let redis_url = std::env::var("KVDEMO_REDIS_URL")
        .unwrap_or_else(|_| "redis://127.0.0.1:6379/0".to_string());

    let cache_redis_url = std::env::var("KVDEMO_CACHE_REDIS_URL")
        .unwrap_or_else(|_| "redis://127.0.0.1:6379/1".to_string());

    let flush_on_start = env_flag("KVDEMO_FLUSH_ON_START");

    let lookup_url = std::env::var("KVDEMO_LOOKUP_URL")
        .unwrap_or_else(|_| "http://ip-api.com/json".to_string());

    // Unparsable or zero means no expiry
    let cache_ttl_secs = std::env::var("KVDEMO_CACHE_TTL_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|secs| *secs > 0);

    Ok(Config {
        listen_addr,
        debug,
        store,
        redis_url,
        cache_redis_url,
        flush_on_start,
        lookup_url,
        cache_ttl_secs,
    })
}
