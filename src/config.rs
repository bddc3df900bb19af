use anyhow::{bail, Result};

/// Settings for the contribution fetcher, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub github_pat: String,
    pub github_username: String,
}

impl Config {
    /// Loads `.env` (if present) into the process environment, then reads the
    /// required keys. Fails naming the first missing key.
    pub fn from_env() -> Result<Self> {
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let github_pat = require(&lookup, "GITHUB_PAT")?;
        let github_username = require(&lookup, "GITHUB_USERNAME")?;
        Ok(Self {
            github_pat,
            github_username,
        })
    }
}

fn require(lookup: impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => bail!("{key} environment variable not set; set it in .env or the environment"),
    }
}
