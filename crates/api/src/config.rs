use std::fmt;
use std::str::FromStr;

use axum::http::HeaderValue;
use catalog_core::asset::MAX_ASSET_BASE64_LEN;
use catalog_store::github::DEFAULT_API_BASE;
use catalog_store::GitHubConfig;
use catalog_sync::SyncLimits;

/// Configuration errors. Fatal at startup for the server binary.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    /// The configured store client could not be constructed.
    #[error("Store client could not be built: {0}")]
    StoreClient(String),
}

/// Which revision store the server writes to.
#[derive(Debug, Clone)]
pub enum StoreSettings {
    /// The hosting provider's contents API.
    GitHub(GitHubConfig),
    /// In-process store. Nothing is persisted; for dry runs and local UI work.
    Memory,
}

impl StoreSettings {
    pub fn backend_name(&self) -> &'static str {
        match self {
            StoreSettings::GitHub(_) => "github",
            StoreSettings::Memory => "memory",
        }
    }
}

/// Process-wide configuration, read once at startup.
///
/// Immutable after construction; shared through `AppState`.
#[derive(Clone)]
pub struct AppConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    /// `*` allows any origin.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Largest accepted request body in bytes (default: 64 MiB).
    pub max_body_bytes: usize,
    /// Largest accepted asset payload in base64 characters.
    pub max_asset_base64_len: usize,
    /// Shared secret expected in `x-editor-secret`. `None` leaves the
    /// editor endpoints open.
    pub editor_secret: Option<String>,
    pub store: StoreSettings,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("cors_origins", &self.cors_origins)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("max_asset_base64_len", &self.max_asset_base64_len)
            .field(
                "editor_secret",
                &self.editor_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("store", &self.store)
            .finish()
    }
}

const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                | Default                  |
    /// |------------------------|--------------------------|
    /// | `HOST`                 | `0.0.0.0`                |
    /// | `PORT`                 | `3000`                   |
    /// | `CORS_ORIGINS`         | `*`                      |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                     |
    /// | `MAX_BODY_BYTES`       | `67108864`               |
    /// | `MAX_ASSET_BASE64_LEN` | `11184810`               |
    /// | `EDITOR_SECRET`        | unset                    |
    /// | `STORE_BACKEND`        | `github`                 |
    /// | `GITHUB_OWNER`         | required for `github`    |
    /// | `GITHUB_REPO`          | required for `github`    |
    /// | `GITHUB_TOKEN`         | required for `github`    |
    /// | `GITHUB_BRANCH`        | `main`                   |
    /// | `GITHUB_API_BASE`      | `https://api.github.com` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source. Blank values
    /// count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = parse_or(&var, "PORT", 3000u16)?;
        let request_timeout_secs = parse_or(&var, "REQUEST_TIMEOUT_SECS", 30u64)?;
        let max_body_bytes = parse_or(&var, "MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES)?;
        let max_asset_base64_len =
            parse_or(&var, "MAX_ASSET_BASE64_LEN", MAX_ASSET_BASE64_LEN)?;

        let cors_origins: Vec<String> = var("CORS_ORIGINS")
            .unwrap_or_else(|| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        for origin in &cors_origins {
            if origin != "*" && HeaderValue::from_str(origin).is_err() {
                return Err(ConfigError::Invalid {
                    name: "CORS_ORIGINS",
                    reason: format!("'{origin}' is not a valid origin"),
                });
            }
        }

        let store = match var("STORE_BACKEND").as_deref().unwrap_or("github") {
            "github" => StoreSettings::GitHub(github_config(&var)?),
            "memory" => StoreSettings::Memory,
            other => {
                return Err(ConfigError::Invalid {
                    name: "STORE_BACKEND",
                    reason: format!("'{other}' is not one of: github, memory"),
                })
            }
        };

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            max_body_bytes,
            max_asset_base64_len,
            editor_secret: var("EDITOR_SECRET"),
            store,
        })
    }

    pub fn sync_limits(&self) -> SyncLimits {
        SyncLimits {
            max_asset_base64_len: self.max_asset_base64_len,
        }
    }
}

/// Owner, repository and token are all required; report every missing one
/// at once.
fn github_config(var: &impl Fn(&str) -> Option<String>) -> Result<GitHubConfig, ConfigError> {
    let owner = var("GITHUB_OWNER");
    let repo = var("GITHUB_REPO");
    let token = var("GITHUB_TOKEN");

    match (owner, repo, token) {
        (Some(owner), Some(repo), Some(token)) => Ok(GitHubConfig {
            api_base: var("GITHUB_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.into()),
            owner,
            repo,
            branch: var("GITHUB_BRANCH").unwrap_or_else(|| "main".into()),
            token,
        }),
        (owner, repo, token) => {
            let missing = [
                ("GITHUB_OWNER", owner.is_none()),
                ("GITHUB_REPO", repo.is_none()),
                ("GITHUB_TOKEN", token.is_none()),
            ]
            .into_iter()
            .filter_map(|(name, missing)| missing.then_some(name))
            .collect();
            Err(ConfigError::Missing(missing))
        }
    }
}

fn parse_or<T>(
    var: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match var(name) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: format!("'{raw}': {e}"),
        }),
        None => Ok(default),
    }
}
