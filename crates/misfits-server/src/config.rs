use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::warn;

/// Placeholder secrets that must not be used outside development.
const PLACEHOLDER_SECRETS: &[&str] = &["dev-secret-change-me", "change-me-to-a-random-string"];

const DEFAULT_SECRET: &str = "dev-secret-change-me";

pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub upload_dir: PathBuf,
    pub secret: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let port = env::var("MISFITS_PORT")
            .or_else(|_| env::var("PORT"))
            .unwrap_or_else(|_| "5000".into());
        let port = port
            .parse()
            .with_context(|| format!("invalid port {port:?}"))?;

        let secret = env::var("MISFITS_SECRET_KEY").unwrap_or_else(|_| DEFAULT_SECRET.into());
        if PLACEHOLDER_SECRETS.contains(&secret.as_str()) {
            warn!("MISFITS_SECRET_KEY is unset or a placeholder; sessions can be forged");
        }

        Ok(Self {
            host: env::var("MISFITS_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port,
            db_path: env::var("MISFITS_DB_PATH")
                .unwrap_or_else(|_| "misfits.db".into())
                .into(),
            upload_dir: env::var("MISFITS_UPLOAD_DIR")
                .unwrap_or_else(|_| "static/uploads".into())
                .into(),
            secret,
        })
    }
}
