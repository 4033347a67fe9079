#[derive(clap::Args, Debug, Default)]
pub struct RefreshArgs {
    /// Path to the YAML file declaring master accounts (`default`) and role profiles (`profiles`)
    ///
    /// Default to config.yaml in the configuration directory.
    #[clap(long)]
    config: Option<std::path::PathBuf>,
    /// Path to the YAML session cache; default to session.yaml in the configuration directory
    #[clap(long)]
    session_cache: Option<std::path::PathBuf>,
    /// Path to the config file to generate
    #[clap(long, env = "AWS_CONFIG_FILE")]
    config_out: Option<std::path::PathBuf>,
    /// Path to the credentials file to generate
    #[clap(long, env = "AWS_SHARED_CREDENTIALS_FILE")]
    credentials_out: Option<std::path::PathBuf>,
    /// Region used when an account or role has none; default to eu-west-1
    #[clap(long)]
    region: Option<String>,
    /// Session duration in seconds for accounts without `duration`; default to 86400
    #[clap(long)]
    session_duration: Option<u32>,
    /// Role session duration in seconds for roles without `duration`; default to 3600
    #[clap(long)]
    role_duration: Option<u32>,
    /// STS endpoint URL; default to https://sts.{region}.amazonaws.com
    #[clap(long)]
    endpoint: Option<String>,
}

impl RefreshArgs {
    pub fn config_data(&self) -> crate::config::ConfigData {
        crate::config::ConfigData {
            config_in_file: self.config.clone(),
            session_cache_file: self.session_cache.clone(),
            config_out_file: self.config_out.clone(),
            credentials_out_file: self.credentials_out.clone(),
            region: self.region.clone(),
            session_duration: self.session_duration,
            role_duration: self.role_duration,
            endpoint: self.endpoint.clone(),
        }
    }
}

#[tokio::main]
pub async fn run(config: &crate::config::Config) -> Result<(), anyhow::Error> {
    let _span = tracing::info_span!("refresh").entered();

    let client = crate::client::Client::new(config.endpoint.as_deref())?;
    execute(
        config,
        &client,
        &crate::prompt::StdioPrompt,
        chrono::Utc::now(),
    )
    .await?;
    Ok(())
}

/// Refresh sessions, persist the session cache, assume roles, then write the profile files.
///
/// Sessions obtained before a failing account are still written to the session cache.
pub async fn execute(
    config: &crate::config::Config,
    sts: &dyn crate::client::Sts,
    prompt: &dyn crate::prompt::MfaPrompt,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<crate::store::CredentialStore, crate::error::Error> {
    let profiles = crate::profile::ProfileConfig::load(&config.config_in_path()).await?;
    tracing::debug!(accounts = profiles.accounts.len(), roles = profiles.roles.len());

    let mut store = crate::store::CredentialStore::load(&config.session_cache_path()).await?;
    let persister = crate::persist::Persister::new(config);

    let refreshed = crate::session::SessionRefresher::new(config, sts, prompt)
        .refresh(&mut store, &profiles.accounts, now)
        .await;
    persister.save_session_cache(&store).await?;
    refreshed?;

    crate::role::RoleAssumer::new(config, sts)
        .assume(&mut store, &profiles.roles)
        .await?;
    persister.save_profiles(&store).await?;

    Ok(store)
}
