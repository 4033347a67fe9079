pub const DEFAULT_REGION: &str = "eu-west-1";
pub const DEFAULT_SESSION_DURATION: u32 = 86400;
pub const DEFAULT_ROLE_DURATION: u32 = 3600;

const FILE_CONFIG_IN: &str = "config.yaml";
const FILE_SESSION_CACHE: &str = "session.yaml";
const FILE_CONFIG_OUT: &str = "config";
const FILE_CREDENTIALS_OUT: &str = "credentials";

/// Run configuration. Built once at startup and handed to each component; never mutated.
#[derive(Debug, Clone, Default)]
pub struct Config {
    config_dir: std::path::PathBuf,
    inner: ConfigData,
}

impl Config {
    pub fn new(
        config_dir: Option<std::path::PathBuf>,
        inner: ConfigData,
    ) -> Result<Self, crate::error::Error> {
        let config_dir_ = match config_dir {
            Some(v) => v,
            None => dirs::home_dir()
                .ok_or_else(|| {
                    crate::error::Error::ConfigError(
                        "--configuration-directory is required or provide $HOME".to_string(),
                    )
                })?
                .join(".aws"),
        };

        Ok(Self {
            config_dir: config_dir_,
            inner,
        })
    }

    pub fn config_dir(&self) -> std::path::PathBuf {
        self.config_dir.clone()
    }

    fn path_or_default(&self, given: &Option<std::path::PathBuf>, name: &str) -> std::path::PathBuf {
        match given {
            Some(p) => p.clone(),
            None => self.config_dir().join(name),
        }
    }

    /// YAML file declaring master accounts and role profiles
    pub fn config_in_path(&self) -> std::path::PathBuf {
        self.path_or_default(&self.config_in_file, FILE_CONFIG_IN)
    }

    pub fn session_cache_path(&self) -> std::path::PathBuf {
        self.path_or_default(&self.session_cache_file, FILE_SESSION_CACHE)
    }

    pub fn config_out_path(&self) -> std::path::PathBuf {
        self.path_or_default(&self.config_out_file, FILE_CONFIG_OUT)
    }

    pub fn credentials_out_path(&self) -> std::path::PathBuf {
        self.path_or_default(&self.credentials_out_file, FILE_CREDENTIALS_OUT)
    }

    pub fn default_region(&self) -> &str {
        self.region.as_deref().unwrap_or(DEFAULT_REGION)
    }

    pub fn session_duration(&self) -> u32 {
        self.session_duration.unwrap_or(DEFAULT_SESSION_DURATION)
    }

    pub fn role_duration(&self) -> u32 {
        self.role_duration.unwrap_or(DEFAULT_ROLE_DURATION)
    }

    /// Ensure parent directory of an output file
    pub(crate) async fn ensure_parent_dir(
        &self,
        path: &std::path::Path,
    ) -> Result<(), crate::error::Error> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| crate::error::Error::file_write_failed(parent, e))?;
            }
        }
        Ok(())
    }
}

impl std::ops::Deref for Config {
    type Target = ConfigData;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigData {
    pub config_in_file: Option<std::path::PathBuf>,
    pub session_cache_file: Option<std::path::PathBuf>,
    pub config_out_file: Option<std::path::PathBuf>,
    pub credentials_out_file: Option<std::path::PathBuf>,
    /// Fallback region; also written to the `default` section
    pub region: Option<String>,
    pub session_duration: Option<u32>,
    pub role_duration: Option<u32>,
    /// STS endpoint URL override; `https://sts.{region}.amazonaws.com` when absent
    pub endpoint: Option<String>,
}
