use std::path::PathBuf;
use std::time::Duration;

use stash_core::storage::DEFAULT_PRESIGN_TTL;
use stash_core::AllowList;

/// Where archived media goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    S3 {
        bucket: String,
        endpoint_url: Option<String>,
    },
    Local {
        path: PathBuf,
    },
}

impl StorageConfig {
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::S3 { .. } => "s3",
            Self::Local { .. } => "local",
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// Everything except the channel credentials (and the bucket when using S3)
/// has a default suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    pub channel_secret: String,
    pub channel_access_token: String,
    /// Users allowed to drive the bot. Empty allows nobody.
    pub allowed_users: AllowList,
    /// Bounded queue size of the worker pool (default: `64`).
    pub worker_queue_capacity: usize,
    /// Number of concurrent workers (default: `4`).
    pub worker_count: usize,
    pub storage: StorageConfig,
    /// Prepended to every archived media key (default: empty).
    pub object_key_prefix: String,
    /// Validity of presigned URLs in seconds (default: `1800`).
    pub presign_ttl_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default    |
    /// |-------------------------|------------|
    /// | `HOST`                  | `0.0.0.0`  |
    /// | `PORT`                  | `3000`     |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`       |
    /// | `CHANNEL_SECRET`        | required   |
    /// | `CHANNEL_ACCESS_TOKEN`  | required   |
    /// | `ALLOWED_USER_IDS`      | empty      |
    /// | `WORKER_QUEUE_CAPACITY` | `64`       |
    /// | `WORKER_COUNT`          | `4`        |
    /// | `STORAGE_BACKEND`       | `s3`       |
    /// | `S3_BUCKET`             | required for `s3` |
    /// | `S3_ENDPOINT_URL`       | unset      |
    /// | `LOCAL_STORAGE_PATH`    | `./stash`  |
    /// | `OBJECT_KEY_PREFIX`     | empty      |
    /// | `PRESIGN_TTL_SECS`      | `1800`     |
    ///
    /// Panics on missing or malformed values; misconfiguration should stop
    /// the process at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let channel_secret = std::env::var("CHANNEL_SECRET").expect("CHANNEL_SECRET must be set");
        let channel_access_token =
            std::env::var("CHANNEL_ACCESS_TOKEN").expect("CHANNEL_ACCESS_TOKEN must be set");

        let allowed_users =
            AllowList::from_csv(&std::env::var("ALLOWED_USER_IDS").unwrap_or_default());

        let worker_queue_capacity: usize = std::env::var("WORKER_QUEUE_CAPACITY")
            .unwrap_or_else(|_| "64".into())
            .parse()
            .expect("WORKER_QUEUE_CAPACITY must be a valid usize");

        let worker_count: usize = std::env::var("WORKER_COUNT")
            .unwrap_or_else(|_| "4".into())
            .parse()
            .expect("WORKER_COUNT must be a valid usize");

        let storage = match std::env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "s3".into())
            .to_ascii_lowercase()
            .as_str()
        {
            "s3" => StorageConfig::S3 {
                bucket: std::env::var("S3_BUCKET").expect("S3_BUCKET must be set for s3 storage"),
                endpoint_url: std::env::var("S3_ENDPOINT_URL")
                    .ok()
                    .filter(|url| !url.trim().is_empty()),
            },
            "local" => StorageConfig::Local {
                path: std::env::var("LOCAL_STORAGE_PATH")
                    .unwrap_or_else(|_| "./stash".into())
                    .into(),
            },
            other => panic!("STORAGE_BACKEND must be 's3' or 'local', got '{other}'"),
        };

        let object_key_prefix = std::env::var("OBJECT_KEY_PREFIX").unwrap_or_default();

        let presign_ttl_secs: u64 = std::env::var("PRESIGN_TTL_SECS")
            .map(|secs| secs.parse().expect("PRESIGN_TTL_SECS must be a valid u64"))
            .unwrap_or(DEFAULT_PRESIGN_TTL.as_secs());

        Self {
            host,
            port,
            request_timeout_secs,
            channel_secret,
            channel_access_token,
            allowed_users,
            worker_queue_capacity,
            worker_count,
            storage,
            object_key_prefix,
            presign_ttl_secs,
        }
    }

    pub fn presign_ttl(&self) -> Duration {
        Duration::from_secs(self.presign_ttl_secs)
    }
}
