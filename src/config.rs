//! Server configuration resolved from CLI flags, then environment, then defaults.

use std::collections::HashMap;
use std::path::PathBuf;

use thiserror::Error;

pub const DEFAULT_HTTP_PORT: u16 = 4466;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_NAMESPACE: &str = "acl";

pub const USAGE: &str = "aclstore server\n\nUSAGE:\n  aclstore_server [--http-port N] [--bind ADDR] [--namespace NS] [--seed PATH]\n\nOPTIONS:\n  --http-port N     HTTP API port (env: ACLSTORE_HTTP_PORT, default 4466)\n  --bind ADDR       Listen address (env: ACLSTORE_BIND, default 0.0.0.0)\n  --namespace NS    Collection prefix for roles/policies (env: ACLSTORE_NAMESPACE, default acl)\n  --seed PATH       JSON file with roles and policies to preload (env: ACLSTORE_SEED)\n";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid port '{value}' for {source_name}")]
    InvalidPort { source_name: String, value: String },
    #[error("flag {0} expects a value")]
    MissingValue(String),
    #[error("namespace must be non-empty and must not start or end with '/': '{0}'")]
    InvalidNamespace(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub http_port: u16,
    pub bind_addr: String,
    pub namespace: String,
    pub seed_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: DEFAULT_HTTP_PORT,
            bind_addr: DEFAULT_BIND.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            seed_file: None,
        }
    }
}

impl ServerConfig {
    /// Resolve from the process arguments and environment.
    pub fn from_env_and_args(args: &[String]) -> Result<Self, ConfigError> {
        let env: HashMap<String, String> = std::env::vars().filter(|(k, _)| k.starts_with("ACLSTORE_")).collect();
        Self::resolve(args, &env)
    }

    /// CLI arguments override environment; environment overrides defaults.
    pub fn resolve(args: &[String], env: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let http_port = match arg_value(args, "--http-port")? {
            Some(v) => parse_port("--http-port", &v)?,
            None => match env.get("ACLSTORE_HTTP_PORT") {
                Some(v) => parse_port("ACLSTORE_HTTP_PORT", v)?,
                None => defaults.http_port,
            },
        };
        let bind_addr = arg_value(args, "--bind")?
            .or_else(|| env.get("ACLSTORE_BIND").cloned())
            .unwrap_or(defaults.bind_addr);
        let namespace = arg_value(args, "--namespace")?
            .or_else(|| env.get("ACLSTORE_NAMESPACE").cloned())
            .unwrap_or(defaults.namespace);
        if namespace.is_empty() || namespace.starts_with('/') || namespace.ends_with('/') {
            return Err(ConfigError::InvalidNamespace(namespace));
        }
        let seed_file = arg_value(args, "--seed")?
            .or_else(|| env.get("ACLSTORE_SEED").cloned())
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self { http_port, bind_addr, namespace, seed_file })
    }

    pub fn listen_addr(&self) -> String { format!("{}:{}", self.bind_addr, self.http_port) }
}

pub fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn arg_value(args: &[String], flag: &str) -> Result<Option<String>, ConfigError> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag {
            return match args.get(i + 1) {
                Some(v) if !v.starts_with("--") => Ok(Some(v.clone())),
                _ => Err(ConfigError::MissingValue(flag.to_string())),
            };
        }
        i += 1;
    }
    Ok(None)
}

fn parse_port(source_name: &str, value: &str) -> Result<u16, ConfigError> {
    value.trim().parse::<u16>().map_err(|_| ConfigError::InvalidPort { source_name: source_name.to_string(), value: value.to_string() })
}
