use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "https://contracts-saas-api.onrender.com";
pub const API_URL_ENV: &str = "CONTRACTS_API_URL";
pub const SESSION_FILE_ENV: &str = "CONTRACTS_SESSION_FILE";

/// Connection settings for the contracts backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
    pub session_file: PathBuf,
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>, session_file: impl Into<PathBuf>) -> Self {
        Self {
            api_url: normalize_base_url(&api_url.into()),
            session_file: session_file.into(),
        }
    }

    /// Reads `CONTRACTS_API_URL` and `CONTRACTS_SESSION_FILE`, falling back to defaults.
    pub fn from_env() -> Self {
        let api_url = std::env::var(API_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let session_file = std::env::var(SESSION_FILE_ENV)
            .ok()
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_session_file);

        Self::new(api_url, session_file)
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = normalize_base_url(&api_url.into());
        self
    }

    pub fn with_session_file(mut self, session_file: impl Into<PathBuf>) -> Self {
        self.session_file = session_file.into();
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL, default_session_file())
    }
}

fn default_session_file() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".contracts").join("session.json"),
        None => PathBuf::from(".contracts-session.json"),
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
