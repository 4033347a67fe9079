//! Write the session cache and the `config`/`credentials` files consumed by AWS tooling.

const KEY_ACCESS_KEY_ID: &str = "aws_access_key_id";
const KEY_SECRET_ACCESS_KEY: &str = "aws_secret_access_key";
const KEY_SECURITY_TOKEN: &str = "aws_security_token";
const KEY_REGION: &str = "region";

const SECTION_DEFAULT: &str = "default";

/// Which of the two output files is being rendered; they differ only in section naming.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProfileFile {
    Config,
    Credentials,
}

impl ProfileFile {
    pub fn path(&self, config: &crate::config::Config) -> std::path::PathBuf {
        match *self {
            Self::Config => config.config_out_path(),
            Self::Credentials => config.credentials_out_path(),
        }
    }

    pub fn section_name(&self, name: &str) -> String {
        match *self {
            Self::Config => format!("profile {name}"),
            Self::Credentials => name.to_owned(),
        }
    }

    /// Sessions first, then roles; a role sharing a name with a session replaces its section.
    pub fn render(
        &self,
        store: &crate::store::CredentialStore,
        default_region: &str,
    ) -> ini::Ini {
        let mut ini = ini::Ini::new();
        if *self == Self::Config {
            ini.with_section(Some(SECTION_DEFAULT))
                .set(KEY_REGION, default_region);
        }

        for (name, c) in store.sessions().iter() {
            ini.with_section(Some(self.section_name(name)))
                .set(KEY_ACCESS_KEY_ID, c.access_key_id.as_str())
                .set(KEY_SECRET_ACCESS_KEY, c.secret_access_key.expose())
                .set(KEY_SECURITY_TOKEN, c.session_token.as_str())
                .set(KEY_REGION, c.region.as_str());
        }

        for (name, c) in store.roles().iter() {
            ini.with_section(Some(self.section_name(name)))
                .set(KEY_ACCESS_KEY_ID, c.access_key_id.as_str())
                .set(KEY_SECRET_ACCESS_KEY, c.secret_access_key.expose())
                .set(KEY_SECURITY_TOKEN, c.session_token.as_str())
                .set(KEY_REGION, c.region.as_str());
        }

        ini
    }

    pub fn render_to_string(
        &self,
        store: &crate::store::CredentialStore,
        default_region: &str,
    ) -> Result<String, crate::error::Error> {
        let mut buf = Vec::new();
        self.render(store, default_region).write_to_opt(
            &mut buf,
            ini::WriteOption {
                escape_policy: ini::EscapePolicy::Nothing,
                kv_separator: " = ",
                ..Default::default()
            },
        )?;
        String::from_utf8(buf)
            .map_err(|_| crate::error::Error::Unknown("rendered profile is not utf-8".to_string()))
    }
}

pub struct Persister<'a> {
    config: &'a crate::config::Config,
}

impl<'a> Persister<'a> {
    pub fn new(config: &'a crate::config::Config) -> Self {
        Self { config }
    }

    /// Overwrite the session cache with every session in `store`.
    pub async fn save_session_cache(
        &self,
        store: &crate::store::CredentialStore,
    ) -> Result<(), crate::error::Error> {
        let path = self.config.session_cache_path();
        let yaml = crate::store::render_session_cache(store.sessions())?;
        self.write(&path, yaml.as_bytes()).await?;
        tracing::info!(message = "Session cache updated", path = ?path, sessions = store.sessions().len());
        Ok(())
    }

    /// Back up both output files, then replace them with profiles rendered from `store`.
    pub async fn save_profiles(
        &self,
        store: &crate::store::CredentialStore,
    ) -> Result<(), crate::error::Error> {
        for name in store.shadowed_sessions() {
            tracing::warn!(message = "role profile shares its name with an account; the role's credentials replace the account's section", name = %name);
        }

        let files = [ProfileFile::Config, ProfileFile::Credentials];

        for file in files.iter() {
            backup(&file.path(self.config)).await?;
        }

        for file in files.iter() {
            let path = file.path(self.config);
            let content = file.render_to_string(store, self.config.default_region())?;
            self.write(&path, content.as_bytes()).await?;
            tracing::info!(message = "Profile file updated", path = ?path);
        }
        Ok(())
    }

    async fn write(&self, path: &std::path::Path, content: &[u8]) -> Result<(), crate::error::Error> {
        use tokio::io::AsyncWriteExt;

        self.config.ensure_parent_dir(path).await?;
        let result = async {
            let mut file = tokio::fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(path)
                .await?;
            file.write_all(content).await?;
            file.flush().await
        }
        .await;
        result.map_err(|e| crate::error::Error::file_write_failed(path, e))
    }
}

pub fn backup_path(path: &std::path::Path) -> std::path::PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(".backup");
    s.into()
}

/// Copy `path` to its `.backup` sibling. A missing `path` (first run) is skipped.
async fn backup(path: &std::path::Path) -> Result<(), crate::error::Error> {
    let dest = backup_path(path);
    match tokio::fs::copy(path, &dest).await {
        Ok(_) => {
            tracing::debug!(message = "Backed up", path = ?path, backup = ?dest);
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(message = "Nothing to back up", path = ?path);
            Ok(())
        }
        Err(e) => Err(crate::error::Error::file_write_failed(&dest, e)),
    }
}
