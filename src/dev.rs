pub struct TestConfig {
    inner: crate::config::Config,
    pub tmpdir: temp_dir::TempDir,
}

impl std::ops::Deref for TestConfig {
    type Target = crate::config::Config;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl TestConfig {
    pub fn new() -> Self {
        let tmpdir = temp_dir::TempDir::with_prefix("aws-role-creds-dev").unwrap();
        let inner = crate::config::Config::new(
            Some(tmpdir.path().into()),
            crate::config::ConfigData::default(),
        )
        .unwrap();
        Self { inner, tmpdir }
    }
}

#[derive(Debug, Clone)]
pub enum StsCall {
    GetSessionToken {
        region: String,
        identity: crate::identity::IdentitySource,
        request: crate::client::GetSessionTokenRequest,
    },
    AssumeRole {
        region: String,
        identity: crate::identity::IdentitySource,
        request: crate::client::AssumeRoleRequest,
    },
}

/// Records calls and answers with numbered credentials (`ASIASESSION1`, `ASIAROLE1`, ...)
/// expiring after the requested duration.
#[derive(Default)]
pub struct FakeSts {
    calls: std::sync::Mutex<Vec<StsCall>>,
    /// 1-based ordinals of GetSessionToken calls to fail
    failing_sessions: Vec<usize>,
    /// role session names to fail
    failing_roles: Vec<String>,
}

impl FakeSts {
    pub fn failing_session_request(n: usize) -> Self {
        Self {
            failing_sessions: vec![n],
            ..Default::default()
        }
    }

    pub fn failing_role(name: &str) -> Self {
        Self {
            failing_roles: vec![name.to_string()],
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<StsCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: StsCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn count_of(&self, session: bool) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, StsCall::GetSessionToken { .. }) == session)
            .count()
    }

    fn credentials(prefix: &str, n: usize, duration_seconds: u32) -> crate::client::Credentials {
        crate::client::Credentials {
            access_key_id: format!("ASIA{prefix}{n}"),
            secret_access_key: format!("{prefix}secret{n}").to_lowercase().into(),
            session_token: format!("{prefix}token{n}").to_lowercase(),
            expiration: chrono::Utc::now() + chrono::Duration::seconds(duration_seconds.into()),
        }
    }
}

#[async_trait::async_trait]
impl crate::client::Sts for FakeSts {
    async fn get_session_token(
        &self,
        target: &crate::client::Target<'_>,
        request: &crate::client::GetSessionTokenRequest,
    ) -> Result<crate::client::Credentials, crate::error::Error> {
        self.record(StsCall::GetSessionToken {
            region: target.region.to_string(),
            identity: target.identity.clone(),
            request: request.clone(),
        });
        let n = self.count_of(true);
        if self.failing_sessions.contains(&n) {
            return Err(crate::error::Error::ApiError(
                reqwest::StatusCode::FORBIDDEN,
                "AccessDenied".to_string(),
            ));
        }
        Ok(Self::credentials("SESSION", n, request.duration_seconds))
    }

    async fn assume_role(
        &self,
        target: &crate::client::Target<'_>,
        request: &crate::client::AssumeRoleRequest,
    ) -> Result<crate::client::AssumeRoleResult, crate::error::Error> {
        self.record(StsCall::AssumeRole {
            region: target.region.to_string(),
            identity: target.identity.clone(),
            request: request.clone(),
        });
        if self.failing_roles.contains(&request.role_session_name) {
            return Err(crate::error::Error::ApiError(
                reqwest::StatusCode::FORBIDDEN,
                "AccessDenied".to_string(),
            ));
        }
        let n = self.count_of(false);
        Ok(crate::client::AssumeRoleResult {
            assumed_role_user: None,
            credentials: Self::credentials("ROLE", n, request.duration_seconds),
        })
    }
}

/// Answers MFA prompts from a fixed list and remembers what was asked.
#[derive(Default)]
pub struct ScriptedPrompt {
    answers: std::sync::Mutex<std::collections::VecDeque<String>>,
    asked: std::sync::Mutex<Vec<(String, String)>>,
}

impl ScriptedPrompt {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: std::sync::Mutex::new(answers.iter().map(|v| v.to_string()).collect()),
            asked: Default::default(),
        }
    }

    pub fn asked(&self) -> Vec<(String, String)> {
        self.asked.lock().unwrap().clone()
    }
}

impl crate::prompt::MfaPrompt for ScriptedPrompt {
    fn prompt(&self, account: &str, mfa_arn: &str) -> Result<String, crate::error::Error> {
        self.asked
            .lock()
            .unwrap()
            .push((account.to_string(), mfa_arn.to_string()));
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| crate::error::Error::Unknown("no scripted MFA answer left".to_string()))
    }
}
