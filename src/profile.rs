//! Account and role profile definitions read from `config.yaml`.

/// A master account; sessions are obtained for it with GetSessionToken.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Account {
    pub name: String,
    pub region: Option<String>,
    /// Session duration in seconds
    pub duration: Option<u32>,
    /// Static access key id. Ambient credentials are used unless both `id` and `key` are given.
    pub id: Option<String>,
    pub key: Option<String>,
    pub mfa_arn: Option<String>,
}

/// A role profile assumed with the session of its `default` account.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Role {
    pub name: String,
    #[serde(rename = "default")]
    pub default_account: String,
    pub role_arn: String,
    pub region: Option<String>,
    /// Role session duration in seconds
    pub duration: Option<u32>,
}

impl Account {
    pub fn region<'a>(&'a self, config: &'a crate::config::Config) -> &'a str {
        self.region
            .as_deref()
            .unwrap_or_else(|| config.default_region())
    }

    pub fn duration(&self, config: &crate::config::Config) -> u32 {
        self.duration.unwrap_or_else(|| config.session_duration())
    }

    pub fn static_identity(&self) -> Option<crate::identity::Identity> {
        match (self.id.as_ref(), self.key.as_ref()) {
            (Some(id), Some(key)) => Some(crate::identity::Identity::new(
                id.clone(),
                key.clone(),
                None,
            )),
            _ => None,
        }
    }
}

impl Role {
    pub fn region<'a>(&'a self, config: &'a crate::config::Config) -> &'a str {
        self.region
            .as_deref()
            .unwrap_or_else(|| config.default_region())
    }

    pub fn duration(&self, config: &crate::config::Config) -> u32 {
        self.duration.unwrap_or_else(|| config.role_duration())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ProfileConfig {
    #[serde(rename = "default", default)]
    pub accounts: Vec<Account>,
    #[serde(rename = "profiles", default)]
    pub roles: Vec<Role>,
}

impl ProfileConfig {
    pub async fn load(path: &std::path::Path) -> Result<Self, crate::error::Error> {
        let yaml = match tokio::fs::read_to_string(path).await {
            Ok(v) => v,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(crate::error::Error::ConfigMissing(path.to_owned()));
            }
            Err(e) => return Err(e.into()),
        };
        let parsed = Self::parse(&yaml).map_err(|source| {
            crate::error::Error::ConfigParseError {
                path: path.to_owned(),
                source,
            }
        })?;
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn parse(yaml: &str) -> Result<Self, serde_yaml::Error> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str::<Option<Self>>(yaml)?.unwrap_or_default())
    }

    /// Names must be unique per kind, and every role must point at a configured account.
    pub fn validate(&self) -> Result<(), crate::error::Error> {
        let mut account_names = std::collections::HashSet::new();
        for account in self.accounts.iter() {
            if !account_names.insert(account.name.as_str()) {
                return Err(crate::error::Error::ConfigError(format!(
                    "duplicate account name: {}",
                    account.name
                )));
            }
        }

        let mut role_names = std::collections::HashSet::new();
        for role in self.roles.iter() {
            if !role_names.insert(role.name.as_str()) {
                return Err(crate::error::Error::ConfigError(format!(
                    "duplicate role profile name: {}",
                    role.name
                )));
            }
            if !account_names.contains(role.default_account.as_str()) {
                return Err(crate::error::Error::UnresolvedAccountReference {
                    role: role.name.clone(),
                    account: role.default_account.clone(),
                });
            }
        }

        Ok(())
    }
}
