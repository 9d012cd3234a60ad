use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
};

pub const DEFAULT_PORT: u16 = 8080;
pub const MODEL_FILE: &str = "models/best_gbm_model.json";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub addr: SocketAddr,
    pub model_path: PathBuf,
    /// Keep the first successfully loaded model for the life of the process.
    pub cache_model: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Same as `from_env`, with the variable source injected.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let ip = match var("BIND_ADDR") {
            Some(s) => s.parse().unwrap_or_else(|_| {
                tracing::warn!("BIND_ADDR {:?} is not an IP address; using 0.0.0.0", s);
                IpAddr::V4(Ipv4Addr::UNSPECIFIED)
            }),
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };
        let port = match var("PORT") {
            Some(s) => s.parse().unwrap_or_else(|_| {
                tracing::warn!("PORT {:?} is not a port number; using {}", s, DEFAULT_PORT);
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };
        let model_path = var("MODEL_PATH")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(resolve_model_path);
        let cache_model = var("MODEL_CACHE")
            .map(|s| matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self {
            addr: SocketAddr::new(ip, port),
            model_path,
            cache_model,
        }
    }
}

/// Prefers the artifact packaged next to the executable, then the working
/// directory.
fn resolve_model_path() -> PathBuf {
    if let Ok(mut p) = std::env::current_exe() {
        p.pop(); // exe dir
        p.push(MODEL_FILE);
        if p.exists() {
            return p;
        }
    }
    PathBuf::from(MODEL_FILE)
}
