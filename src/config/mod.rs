use serde::Deserialize;

static CONFIG: OnceCell<Config> = OnceCell::const_new();

mod config_dir;
pub use config_dir::{find_config_file, read_config, read_config_from};

mod error;
pub use error::{ConfigError, ConfigResult};
use tokio::sync::OnceCell;

#[derive(Debug, Deserialize)]
pub struct Config {
    host: Host,
    app: App,
    #[serde(default)]
    payment: Payment,
}

#[derive(Debug, Deserialize)]
pub struct Host {
    bindto: String,
}

#[derive(Debug, Deserialize)]
pub struct App {
    jwt: String,
    #[serde(default = "default_jwt_expire_hours")]
    jwt_expire_hours: i64,
    database_uri: String,
    #[serde(default)]
    docs: bool,
    #[serde(default = "default_client_url")]
    client_url: String,
    /// Public base URL used when building links to uploaded files.
    api_url: Option<String>,
    #[serde(default = "default_upload_dir")]
    upload_dir: String,
    #[serde(default = "default_max_upload_bytes")]
    max_upload_bytes: usize,
    token_secret: String,
}

/// SSLCommerz merchant credentials.
#[derive(Debug, Deserialize)]
pub struct Payment {
    #[serde(default)]
    store_id: String,
    #[serde(default)]
    store_password: String,
    #[serde(default = "default_sandbox")]
    sandbox: bool,
}

fn default_jwt_expire_hours() -> i64 {
    24
}

fn default_client_url() -> String {
    String::from("http://localhost:3000")
}

fn default_upload_dir() -> String {
    String::from("uploads")
}

fn default_max_upload_bytes() -> usize {
    100 * 1024 * 1024
}

fn default_sandbox() -> bool {
    true
}

impl Default for Payment {
    fn default() -> Self {
        Self {
            store_id: String::new(),
            store_password: String::new(),
            sandbox: default_sandbox(),
        }
    }
}

impl Config {
    #[tracing::instrument]
    pub async fn get_or_init(use_local: bool) -> &'static Config {
        CONFIG
            .get_or_init(|| async {
                let read_cfg = |use_local| -> ConfigResult<Self> {
                    let bytes = read_config(use_local)?;
                    let config: Self = toml::from_slice(&bytes)?;
                    config.validate()?;
                    Ok(config)
                };

                match read_cfg(use_local) {
                    Ok(c) => c,
                    Err(e) => {
                        if !matches!(e, error::ConfigError::ConfigNotFound) {
                            crate::error::log_error(&e);
                        }
                        tracing::error!("Config not found.");
                        std::process::exit(1);
                    }
                }
            })
            .await
    }

    /// Rejects settings that would only fail later, at request time.
    fn validate(&self) -> ConfigResult<()> {
        let invalid = |key, reason| Err(ConfigError::InvalidSetting { key, reason });

        if self.app.jwt.trim().is_empty() {
            return invalid("app.jwt", "signing secret must not be empty");
        }
        if self.app.token_secret.trim().is_empty() {
            return invalid("app.token_secret", "must not be empty");
        }
        if self.app.jwt_expire_hours <= 0 {
            return invalid("app.jwt_expire_hours", "must be positive");
        }
        if self.app.max_upload_bytes == 0 {
            return invalid("app.max_upload_bytes", "must be positive");
        }
        Ok(())
    }

    /// Returns the config if it has already been loaded.
    pub fn get() -> Option<&'static Config> {
        CONFIG.get()
    }

    #[inline]
    pub fn host(&self) -> &Host {
        &self.host
    }

    #[inline]
    pub fn app(&self) -> &App {
        &self.app
    }

    #[inline]
    pub fn payment(&self) -> &Payment {
        &self.payment
    }
}

impl Host {
    #[inline]
    pub fn bindto(&self) -> &str {
        &self.bindto
    }
}

impl App {
    #[inline]
    pub fn jwt(&self) -> &str {
        &self.jwt
    }

    #[inline]
    pub fn jwt_expire_hours(&self) -> i64 {
        self.jwt_expire_hours
    }

    #[inline]
    pub fn database_uri(&self) -> &str {
        &self.database_uri
    }

    #[inline]
    pub fn docs(&self) -> bool {
        self.docs
    }

    #[inline]
    pub fn client_url(&self) -> &str {
        &self.client_url
    }

    #[inline]
    pub fn api_url(&self) -> Option<&str> {
        self.api_url.as_deref()
    }

    #[inline]
    pub fn upload_dir(&self) -> &str {
        &self.upload_dir
    }

    #[inline]
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    #[inline]
    pub fn token_secret(&self) -> &str {
        &self.token_secret
    }
}

impl Payment {
    #[inline]
    pub fn store_id(&self) -> &str {
        &self.store_id
    }

    #[inline]
    pub fn store_password(&self) -> &str {
        &self.store_password
    }

    #[inline]
    pub fn sandbox(&self) -> bool {
        self.sandbox
    }
}
