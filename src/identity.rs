//! Credentials used to sign STS requests, and resolution of ambient credentials.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub access_key_id: String,
    pub secret_access_key: crate::client::AwsSecretAccessKey,
    pub session_token: Option<String>,
}

impl Identity {
    pub fn new(
        access_key_id: String,
        secret_access_key: String,
        session_token: Option<String>,
    ) -> Self {
        Self {
            access_key_id,
            secret_access_key: secret_access_key.into(),
            session_token,
        }
    }

    /// Resolve credentials with the AWS SDK default provider chain: environment variables,
    /// `config`/`credentials` profiles (including `credential_process` and SSO), web identity,
    /// ECS container and EC2 instance metadata.
    pub async fn from_ambient(region: &str) -> Result<Self, crate::error::Error> {
        use aws_credential_types::provider::ProvideCredentials as _;

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_owned()))
            .load()
            .await;
        let provider = sdk_config.credentials_provider().ok_or_else(|| {
            crate::error::Error::CredentialsNotFound(
                "no credentials provider is configured".to_string(),
            )
        })?;
        let credentials = provider
            .provide_credentials()
            .await
            .map_err(|e| crate::error::Error::CredentialsNotFound(e.to_string()))?;

        tracing::debug!(message = "Using ambient credentials", access_key_id = %credentials.access_key_id(), expiry = ?credentials.expiry());
        Ok(Self::new(
            credentials.access_key_id().to_owned(),
            credentials.secret_access_key().to_owned(),
            credentials.session_token().map(|v| v.to_owned()),
        ))
    }
}

/// How a request to STS is authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentitySource {
    /// Resolve from the default provider chain at request time
    Ambient,
    Given(Identity),
}

impl IdentitySource {
    pub async fn resolve(&self, region: &str) -> Result<Identity, crate::error::Error> {
        match self {
            Self::Ambient => Identity::from_ambient(region).await,
            Self::Given(identity) => Ok(identity.clone()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serial_test::serial;

    const AMBIENT_VARS: &[&str] = &[
        "AWS_ACCESS_KEY_ID",
        "AWS_SECRET_ACCESS_KEY",
        "AWS_SESSION_TOKEN",
        "AWS_PROFILE",
        "AWS_CONFIG_FILE",
        "AWS_SHARED_CREDENTIALS_FILE",
        "AWS_WEB_IDENTITY_TOKEN_FILE",
        "AWS_ROLE_ARN",
        "AWS_CONTAINER_CREDENTIALS_RELATIVE_URI",
        "AWS_CONTAINER_CREDENTIALS_FULL_URI",
        "AWS_EC2_METADATA_DISABLED",
    ];

    /// Clears the variables the provider chain reads and restores them on drop.
    struct AmbientEnv {
        saved: Vec<(&'static str, Option<String>)>,
        tmpdir: temp_dir::TempDir,
    }

    impl AmbientEnv {
        fn new() -> Self {
            let saved = AMBIENT_VARS
                .iter()
                .map(|k| (*k, std::env::var(k).ok()))
                .collect();
            for k in AMBIENT_VARS.iter() {
                std::env::remove_var(k);
            }
            let tmpdir = temp_dir::TempDir::with_prefix("aws-role-creds-ambient").unwrap();
            std::env::set_var("AWS_CONFIG_FILE", tmpdir.path().join("config"));
            std::env::set_var(
                "AWS_SHARED_CREDENTIALS_FILE",
                tmpdir.path().join("credentials"),
            );
            std::env::set_var("AWS_EC2_METADATA_DISABLED", "true");
            Self { saved, tmpdir }
        }

        fn write_config(&self, content: &str) {
            std::fs::write(self.tmpdir.path().join("config"), content).unwrap();
        }
    }

    impl Drop for AmbientEnv {
        fn drop(&mut self) {
            for (k, v) in self.saved.iter() {
                match v {
                    Some(v) => std::env::set_var(k, v),
                    None => std::env::remove_var(k),
                }
            }
        }
    }

    #[tokio::test]
    #[serial]
    async fn test_from_ambient_reads_config_file_profile() {
        let env = AmbientEnv::new();
        env.write_config(indoc::indoc! {"
            [default]
            aws_access_key_id = AKIDCONF
            aws_secret_access_key = confsecret
        "});

        let identity = Identity::from_ambient("eu-west-1").await.unwrap();
        assert_eq!(identity.access_key_id, "AKIDCONF");
        assert_eq!(identity.secret_access_key.expose(), "confsecret");
        assert_eq!(identity.session_token, None);
    }

    #[tokio::test]
    #[serial]
    async fn test_from_ambient_named_profile() {
        let env = AmbientEnv::new();
        env.write_config(indoc::indoc! {"
            [default]
            aws_access_key_id = AKIDDEFAULT
            aws_secret_access_key = defaultsecret

            [profile work]
            aws_access_key_id = ASIAWORK
            aws_secret_access_key = worksecret
            aws_session_token = worktoken
        "});
        std::env::set_var("AWS_PROFILE", "work");

        let identity = Identity::from_ambient("eu-west-1").await.unwrap();
        assert_eq!(identity.access_key_id, "ASIAWORK");
        assert_eq!(identity.session_token.as_deref(), Some("worktoken"));
    }

    #[tokio::test]
    #[serial]
    async fn test_from_ambient_prefers_env_vars() {
        let env = AmbientEnv::new();
        env.write_config(indoc::indoc! {"
            [default]
            aws_access_key_id = AKIDCONF
            aws_secret_access_key = confsecret
        "});
        std::env::set_var("AWS_ACCESS_KEY_ID", "AKIDENV");
        std::env::set_var("AWS_SECRET_ACCESS_KEY", "envsecret");
        std::env::set_var("AWS_SESSION_TOKEN", "envtoken");

        let identity = Identity::from_ambient("eu-west-1").await.unwrap();
        assert_eq!(identity.access_key_id, "AKIDENV");
        assert_eq!(identity.session_token.as_deref(), Some("envtoken"));
    }

    #[tokio::test]
    #[serial]
    async fn test_from_ambient_without_credentials() {
        let _env = AmbientEnv::new();
        assert!(matches!(
            Identity::from_ambient("eu-west-1").await,
            Err(crate::error::Error::CredentialsNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_given_source_resolves_to_itself() {
        let identity = Identity::new("AKID".to_string(), "secret".to_string(), None);
        let source = IdentitySource::Given(identity.clone());
        assert_eq!(source.resolve("eu-west-1").await.unwrap(), identity);
    }
}
