//! Refresh session credentials of master accounts with sts:GetSessionToken.

pub struct SessionRefresher<'a> {
    config: &'a crate::config::Config,
    sts: &'a dyn crate::client::Sts,
    prompt: &'a dyn crate::prompt::MfaPrompt,
}

impl<'a> SessionRefresher<'a> {
    pub fn new(
        config: &'a crate::config::Config,
        sts: &'a dyn crate::client::Sts,
        prompt: &'a dyn crate::prompt::MfaPrompt,
    ) -> Self {
        Self {
            config,
            sts,
            prompt,
        }
    }

    /// Ensure every account has a session valid at `now`, in configured order.
    /// Stops at the first failure; accounts before it keep their refreshed sessions in `store`.
    pub async fn refresh(
        &self,
        store: &mut crate::store::CredentialStore,
        accounts: &[crate::profile::Account],
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), crate::error::Error> {
        for account in accounts.iter() {
            if store.is_valid(&account.name, now) {
                tracing::info!(message = "Reusing cached session", account = %account.name, expiration = ?store.session(&account.name).map(|s| s.expiration));
                continue;
            }

            let session = self
                .request(account)
                .await
                .map_err(|e| crate::error::Error::credential_request_failed(&account.name, e))?;
            tracing::info!(message = "Obtained new session", account = %account.name, access_key_id = %session.access_key_id, expiration = ?session.expiration);
            store.put_session(&account.name, session);
        }
        Ok(())
    }

    async fn request(
        &self,
        account: &crate::profile::Account,
    ) -> Result<crate::store::SessionCredential, crate::error::Error> {
        let region = account.region(self.config);
        let identity = match account.static_identity() {
            Some(v) => crate::identity::IdentitySource::Given(v),
            None => crate::identity::IdentitySource::Ambient,
        };

        let request = match account.mfa_arn {
            Some(ref mfa_arn) => crate::client::GetSessionTokenRequest {
                duration_seconds: account.duration(self.config),
                serial_number: Some(mfa_arn.clone()),
                token_code: Some(self.prompt.prompt(&account.name, mfa_arn)?),
            },
            None => crate::client::GetSessionTokenRequest {
                duration_seconds: account.duration(self.config),
                serial_number: None,
                token_code: None,
            },
        };

        let credentials = self
            .sts
            .get_session_token(
                &crate::client::Target {
                    region,
                    identity: &identity,
                },
                &request,
            )
            .await?;
        Ok(crate::store::SessionCredential::from_credentials(
            credentials,
            region,
        ))
    }
}
