//! Assume role profiles with sts:AssumeRole using the sessions of their accounts.

pub struct RoleAssumer<'a> {
    config: &'a crate::config::Config,
    sts: &'a dyn crate::client::Sts,
}

impl<'a> RoleAssumer<'a> {
    pub fn new(config: &'a crate::config::Config, sts: &'a dyn crate::client::Sts) -> Self {
        Self { config, sts }
    }

    /// Assume every role in configured order. Roles are never reused from an earlier run.
    pub async fn assume(
        &self,
        store: &mut crate::store::CredentialStore,
        roles: &[crate::profile::Role],
    ) -> Result<(), crate::error::Error> {
        for role in roles.iter() {
            let session = store.session(&role.default_account).ok_or_else(|| {
                crate::error::Error::UnresolvedAccountReference {
                    role: role.name.clone(),
                    account: role.default_account.clone(),
                }
            })?;
            let identity = crate::identity::IdentitySource::Given(session.identity());

            let region = role.region(self.config);
            tracing::debug!(message = "Getting credentials", role = %role.name, role_arn = %role.role_arn, account = %role.default_account);

            let result = self
                .sts
                .assume_role(
                    &crate::client::Target {
                        region,
                        identity: &identity,
                    },
                    &crate::client::AssumeRoleRequest {
                        role_arn: role.role_arn.clone(),
                        role_session_name: role.name.clone(),
                        duration_seconds: role.duration(self.config),
                    },
                )
                .await
                .map_err(|e| crate::error::Error::credential_request_failed(&role.name, e))?;

            tracing::info!(message = "Assumed role", role = %role.name, assumed_role_user = ?result.assumed_role_user.as_ref().map(|u| &u.arn), expiration = ?result.credentials.expiration);
            store.put_role(
                &role.name,
                crate::store::RoleCredential::from_credentials(
                    &role.role_arn,
                    result.credentials,
                    region,
                ),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn role(name: &str, account: &str) -> crate::profile::Role {
        crate::profile::Role {
            name: name.to_string(),
            default_account: account.to_string(),
            role_arn: format!("arn:aws:iam::222222222222:role/{name}"),
            region: None,
            duration: None,
        }
    }

    fn session() -> crate::store::SessionCredential {
        crate::store::SessionCredential {
            access_key_id: "ASIAM1".to_string(),
            secret_access_key: "m1secret".to_string().into(),
            session_token: "m1token".to_string(),
            expiration: chrono::Utc::now() + chrono::Duration::hours(1),
            region: "eu-west-1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_assume_uses_session() {
        let config = crate::dev::TestConfig::new();
        let sts = crate::dev::FakeSts::default();
        let mut store = crate::store::CredentialStore::default();
        store.put_session("m1", session());

        let mut r2 = role("r2", "m1");
        r2.region = Some("us-east-1".to_string());
        r2.duration = Some(900);

        RoleAssumer::new(&config, &sts)
            .assume(&mut store, &[role("r1", "m1"), r2])
            .await
            .unwrap();

        let calls = sts.calls();
        assert_eq!(calls.len(), 2);
        match &calls[0] {
            crate::dev::StsCall::AssumeRole {
                region,
                identity,
                request,
            } => {
                assert_eq!(region, "eu-west-1");
                assert_eq!(
                    identity,
                    &crate::identity::IdentitySource::Given(crate::identity::Identity::new(
                        "ASIAM1".to_string(),
                        "m1secret".to_string(),
                        Some("m1token".to_string())
                    ))
                );
                assert_eq!(request.role_arn, "arn:aws:iam::222222222222:role/r1");
                assert_eq!(request.role_session_name, "r1");
                assert_eq!(request.duration_seconds, 3600);
            }
            other => panic!("unexpected: {other:?}"),
        }
        match &calls[1] {
            crate::dev::StsCall::AssumeRole {
                region, request, ..
            } => {
                assert_eq!(region, "us-east-1");
                assert_eq!(request.duration_seconds, 900);
            }
            other => panic!("unexpected: {other:?}"),
        }

        let r1 = store.role("r1").unwrap();
        assert_eq!(r1.role, "arn:aws:iam::222222222222:role/r1");
        assert_eq!(r1.access_key_id, "ASIAROLE1");
        assert_eq!(r1.region, "eu-west-1");
        assert_eq!(store.role("r2").unwrap().region, "us-east-1");
    }

    #[tokio::test]
    async fn test_always_reassumes() {
        let config = crate::dev::TestConfig::new();
        let sts = crate::dev::FakeSts::default();
        let mut store = crate::store::CredentialStore::default();
        store.put_session("m1", session());

        let assumer = RoleAssumer::new(&config, &sts);
        assumer
            .assume(&mut store, &[role("r1", "m1")])
            .await
            .unwrap();
        assumer
            .assume(&mut store, &[role("r1", "m1")])
            .await
            .unwrap();

        assert_eq!(sts.calls().len(), 2);
        assert_eq!(store.role("r1").unwrap().access_key_id, "ASIAROLE2");
        assert_eq!(store.roles().len(), 1);
    }

    #[tokio::test]
    async fn test_unresolved_account() {
        let config = crate::dev::TestConfig::new();
        let sts = crate::dev::FakeSts::default();
        let mut store = crate::store::CredentialStore::default();

        match RoleAssumer::new(&config, &sts)
            .assume(&mut store, &[role("r1", "m9")])
            .await
        {
            Err(crate::error::Error::UnresolvedAccountReference { role, account }) => {
                assert_eq!(role, "r1");
                assert_eq!(account, "m9");
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(sts.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failure_names_role() {
        let config = crate::dev::TestConfig::new();
        let sts = crate::dev::FakeSts::failing_role("r1");
        let mut store = crate::store::CredentialStore::default();
        store.put_session("m1", session());

        match RoleAssumer::new(&config, &sts)
            .assume(&mut store, &[role("r1", "m1")])
            .await
        {
            Err(crate::error::Error::CredentialRequestFailed { name, .. }) => {
                assert_eq!(name, "r1")
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(store.role("r1").is_none());
    }
}
