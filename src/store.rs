//! In-memory session and role credentials, and the YAML session cache.

pub type SessionMap = std::collections::BTreeMap<String, SessionCredential>;
pub type RoleMap = std::collections::BTreeMap<String, RoleCredential>;

/// Temporary credentials of a master account, cached across runs.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SessionCredential {
    pub access_key_id: String,
    pub secret_access_key: crate::client::AwsSecretAccessKey,
    pub session_token: String,
    pub expiration: chrono::DateTime<chrono::Utc>,
    pub region: String,
}

impl SessionCredential {
    pub fn from_credentials(credentials: crate::client::Credentials, region: &str) -> Self {
        Self {
            access_key_id: credentials.access_key_id,
            secret_access_key: credentials.secret_access_key,
            session_token: credentials.session_token,
            expiration: credentials.expiration,
            region: region.to_owned(),
        }
    }

    pub fn is_valid(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        now < self.expiration
    }

    pub fn identity(&self) -> crate::identity::Identity {
        crate::identity::Identity {
            access_key_id: self.access_key_id.clone(),
            secret_access_key: self.secret_access_key.clone(),
            session_token: Some(self.session_token.clone()),
        }
    }
}

/// Temporary credentials of an assumed role. Recomputed on every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleCredential {
    pub role: String,
    pub access_key_id: String,
    pub secret_access_key: crate::client::AwsSecretAccessKey,
    pub session_token: String,
    pub expiration: chrono::DateTime<chrono::Utc>,
    pub region: String,
}

impl RoleCredential {
    pub fn from_credentials(
        role: &str,
        credentials: crate::client::Credentials,
        region: &str,
    ) -> Self {
        Self {
            role: role.to_owned(),
            access_key_id: credentials.access_key_id,
            secret_access_key: credentials.secret_access_key,
            session_token: credentials.session_token,
            expiration: credentials.expiration,
            region: region.to_owned(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    sessions: SessionMap,
    roles: RoleMap,
}

impl CredentialStore {
    pub fn new(sessions: SessionMap) -> Self {
        Self {
            sessions,
            roles: RoleMap::new(),
        }
    }

    /// Load cached sessions; a missing cache file yields an empty store.
    pub async fn load(path: &std::path::Path) -> Result<Self, crate::error::Error> {
        let yaml = match tokio::fs::read_to_string(path).await {
            Ok(v) => v,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(message = "Session cache does not exist", path = ?path);
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        let sessions =
            parse_session_cache(&yaml).map_err(|source| crate::error::Error::ConfigParseError {
                path: path.to_owned(),
                source,
            })?;
        Ok(Self::new(sessions))
    }

    pub fn is_valid(&self, name: &str, now: chrono::DateTime<chrono::Utc>) -> bool {
        self.sessions
            .get(name)
            .map(|s| s.is_valid(now))
            .unwrap_or(false)
    }

    pub fn session(&self, name: &str) -> Option<&SessionCredential> {
        self.sessions.get(name)
    }

    pub fn put_session(&mut self, name: &str, credential: SessionCredential) {
        self.sessions.insert(name.to_owned(), credential);
    }

    pub fn role(&self, name: &str) -> Option<&RoleCredential> {
        self.roles.get(name)
    }

    pub fn put_role(&mut self, name: &str, credential: RoleCredential) {
        self.roles.insert(name.to_owned(), credential);
    }

    pub fn sessions(&self) -> &SessionMap {
        &self.sessions
    }

    pub fn roles(&self) -> &RoleMap {
        &self.roles
    }

    /// Names held by both a session and a role; the role wins in rendered profiles.
    pub fn shadowed_sessions(&self) -> Vec<&str> {
        self.roles
            .keys()
            .filter(|name| self.sessions.contains_key(*name))
            .map(|name| name.as_str())
            .collect()
    }
}

pub fn parse_session_cache(yaml: &str) -> Result<SessionMap, serde_yaml::Error> {
    if yaml.trim().is_empty() {
        return Ok(SessionMap::new());
    }
    Ok(serde_yaml::from_str::<Option<SessionMap>>(yaml)?.unwrap_or_default())
}

pub fn render_session_cache(sessions: &SessionMap) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(sessions)
}
