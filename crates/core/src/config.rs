//! Configuration types shared across crates.

use crate::Identifier;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// HTTP server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address (e.g., "0.0.0.0").
    #[serde(default = "default_host")]
    pub host: String,
    /// Listen port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum request body size in bytes for upload requests.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Enable the /metrics endpoint for Prometheus scraping (default: true).
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_max_body_bytes() -> usize {
    1024 * 1024 * 1024 // 1 GiB
}

fn default_metrics_enabled() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
            metrics_enabled: default_metrics_enabled(),
        }
    }
}

impl ServerConfig {
    /// Socket address string to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Signature verification configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SigningConfig {
    /// Allowed signers file (`ssh-keygen` ALLOWED SIGNERS format).
    pub allowed_signers: PathBuf,
    /// Verification program invoked per file.
    #[serde(default = "default_program")]
    pub program: PathBuf,
    /// Maximum verification subprocesses running at once across all requests.
    #[serde(default = "default_max_concurrent_verifications")]
    pub max_concurrent_verifications: usize,
}

fn default_program() -> PathBuf {
    PathBuf::from("ssh-keygen")
}

fn default_max_concurrent_verifications() -> usize {
    crate::MAX_BATCH_FILES
}

impl SigningConfig {
    /// Create a signing config for the given allowed signers file with defaults.
    pub fn new(allowed_signers: impl Into<PathBuf>) -> Self {
        Self {
            allowed_signers: allowed_signers.into(),
            program: default_program(),
            max_concurrent_verifications: default_max_concurrent_verifications(),
        }
    }
}

/// Upload storage configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Scratch directory incoming multipart parts are spooled to.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
    /// Root directory batches are published under.
    /// Aliases are created in its parent directory.
    #[serde(default = "default_upload_path")]
    pub upload_path: PathBuf,
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("./data/tmp")
}

fn default_upload_path() -> PathBuf {
    PathBuf::from("./data/uploads")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
            upload_path: default_upload_path(),
        }
    }
}

impl StorageConfig {
    /// Directory aliases are published in (parent of the upload root).
    pub fn alias_root(&self) -> Option<&Path> {
        self.upload_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
    }

    /// Whether the alias for `identifier` would land on the upload root or
    /// the temp dir.
    pub fn is_reserved_alias(&self, identifier: &Identifier) -> bool {
        self.alias_root().is_some_and(|root| {
            let alias = root.join(identifier.as_str());
            alias == self.upload_path || alias == self.temp_dir
        })
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Signature verification configuration (required).
    pub signing: SigningConfig,
    /// Upload storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Create a test configuration rooted at the given directory.
    ///
    /// **For testing only.** The allowed signers file is not created.
    pub fn for_testing(root: &Path) -> Self {
        Self {
            server: ServerConfig::default(),
            signing: SigningConfig::new(root.join("allowed_signers")),
            storage: StorageConfig {
                temp_dir: root.join("tmp"),
                upload_path: root.join("public").join("uploads"),
            },
        }
    }

    /// Validate configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        if self.signing.max_concurrent_verifications == 0 {
            return Err("signing.max_concurrent_verifications must be at least 1".to_string());
        }
        if self.server.max_body_bytes == 0 {
            return Err("server.max_body_bytes must be at least 1".to_string());
        }
        if self.storage.alias_root().is_none() {
            return Err(format!(
                "storage.upload_path {} has no parent directory to publish aliases in",
                self.storage.upload_path.display()
            ));
        }
        Ok(())
    }
}
