//! sts:GetSessionToken and sts:AssumeRole API client

/// Secret access key; redacted from Debug output.
#[derive(Clone)]
pub struct AwsSecretAccessKey(secrecy::SecretString);

impl AwsSecretAccessKey {
    pub fn expose(&self) -> &str {
        use secrecy::ExposeSecret;
        self.0.expose_secret().as_str()
    }
}

impl From<String> for AwsSecretAccessKey {
    fn from(value: String) -> Self {
        Self(secrecy::SecretString::new(value))
    }
}

impl std::fmt::Debug for AwsSecretAccessKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AwsSecretAccessKey([REDACTED])")
    }
}

impl PartialEq for AwsSecretAccessKey {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for AwsSecretAccessKey {}

impl serde::Serialize for AwsSecretAccessKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.expose())
    }
}

impl<'de> serde::Deserialize<'de> for AwsSecretAccessKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(String::deserialize(deserializer)?.into())
    }
}

/// https://docs.aws.amazon.com/STS/latest/APIReference/API_GetSessionToken.html
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetSessionTokenRequest {
    pub duration_seconds: u32,
    /// MFA device ARN
    pub serial_number: Option<String>,
    pub token_code: Option<String>,
}

impl GetSessionTokenRequest {
    fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("DurationSeconds", self.duration_seconds.to_string())];
        if let Some(ref serial_number) = self.serial_number {
            params.push(("SerialNumber", serial_number.clone()));
        }
        if let Some(ref token_code) = self.token_code {
            params.push(("TokenCode", token_code.clone()));
        }
        params
    }
}

/// https://docs.aws.amazon.com/STS/latest/APIReference/API_AssumeRole.html
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssumeRoleRequest {
    pub role_arn: String,
    pub role_session_name: String,
    pub duration_seconds: u32,
}

impl AssumeRoleRequest {
    fn to_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("RoleArn", self.role_arn.clone()),
            ("RoleSessionName", self.role_session_name.clone()),
            ("DurationSeconds", self.duration_seconds.to_string()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Credentials {
    pub access_key_id: String,
    #[serde(deserialize_with = "deserialize_expiration")]
    pub expiration: chrono::DateTime<chrono::Utc>,
    pub secret_access_key: AwsSecretAccessKey,
    pub session_token: String,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetSessionTokenResult {
    pub credentials: Credentials,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AssumeRoleResult {
    pub assumed_role_user: Option<AssumedRoleUser>,
    pub credentials: Credentials,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AssumedRoleUser {
    pub arn: String,
    pub assumed_role_id: String,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetSessionTokenEnvelope {
    get_session_token_response: GetSessionTokenResponse,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetSessionTokenResponse {
    get_session_token_result: GetSessionTokenResult,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AssumeRoleEnvelope {
    assume_role_response: AssumeRoleResponse,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AssumeRoleResponse {
    assume_role_result: AssumeRoleResult,
}

/// STS JSON responses carry epoch seconds; RFC 3339 strings are accepted as well.
fn deserialize_expiration<'de, D>(deserializer: D) -> Result<chrono::DateTime<chrono::Utc>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use chrono::TimeZone as _;
    use serde::de::Error as _;
    use serde::Deserialize as _;

    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Epoch(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Epoch(secs) => chrono::Utc
            .timestamp_millis_opt((secs * 1000.0).round() as i64)
            .single()
            .ok_or_else(|| D::Error::custom("expiration is out of range")),
        Raw::Text(s) => chrono::DateTime::parse_from_rfc3339(&s)
            .map(|t| t.with_timezone(&chrono::Utc))
            .map_err(D::Error::custom),
    }
}

/// Region and identity a request is issued with.
#[derive(Debug, Clone, Copy)]
pub struct Target<'a> {
    pub region: &'a str,
    pub identity: &'a crate::identity::IdentitySource,
}

/// The security token service boundary.
#[async_trait::async_trait]
pub trait Sts: Send + Sync {
    async fn get_session_token(
        &self,
        target: &Target<'_>,
        request: &GetSessionTokenRequest,
    ) -> Result<Credentials, crate::error::Error>;

    async fn assume_role(
        &self,
        target: &Target<'_>,
        request: &AssumeRoleRequest,
    ) -> Result<AssumeRoleResult, crate::error::Error>;
}

pub struct Client {
    http_client: reqwest::Client,
    endpoint: Option<String>,
}

const SERVICE_NAME: &str = "sts";
const API_VERSION: &str = "2011-06-15";

impl Client {
    pub fn new(endpoint: Option<&str>) -> Result<Self, crate::error::Error> {
        let http_client = reqwest::ClientBuilder::new().http1_only().build()?;

        Ok(Self {
            http_client,
            endpoint: endpoint.map(|v| v.to_owned()),
        })
    }

    fn url_for(&self, region: &str) -> String {
        match self.endpoint {
            Some(ref e) => format!("{}/", e.trim_end_matches('/')),
            None => format!("https://sts.{region}.amazonaws.com/"),
        }
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        target: &Target<'_>,
        action: &str,
        params: &[(&'static str, String)],
    ) -> Result<T, crate::error::Error> {
        let identity = target.identity.resolve(target.region).await?;

        let body = {
            let mut form = url::form_urlencoded::Serializer::new(String::new());
            form.append_pair("Action", action);
            form.append_pair("Version", API_VERSION);
            for (k, v) in params.iter() {
                form.append_pair(k, v);
            }
            form.finish()
        };

        // Use http::Request for signer
        let mut req = http::Request::builder()
            .uri(self.url_for(target.region))
            .method(http::Method::POST)
            .header(
                http::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded; charset=utf-8",
            )
            .header(http::header::ACCEPT, "application/json")
            .body(bytes::Bytes::from(body))?;

        let auth_headers = crate::sign::calculate_signing_headers(
            &crate::sign::SignableRequest::from(&req),
            &crate::sign::SigningParams {
                region: target.region,
                service_name: SERVICE_NAME,
                time: chrono::Utc::now(),
                identity: &identity,
            },
        )?;

        for (k, v) in auth_headers.iter() {
            req.headers_mut().append(k, v.to_owned());
        }

        tracing::trace!(message = "Calling STS", action = action, region = target.region, access_key_id = %identity.access_key_id);
        let resp = self
            .http_client
            .execute(reqwest::Request::try_from(req)?)
            .await?;

        let status = resp.status();
        if status.is_success() {
            Ok(resp.json::<T>().await?)
        } else {
            let body = resp.text().await?;
            Err(crate::error::Error::ApiError(status, body))
        }
    }
}

#[async_trait::async_trait]
impl Sts for Client {
    async fn get_session_token(
        &self,
        target: &Target<'_>,
        request: &GetSessionTokenRequest,
    ) -> Result<Credentials, crate::error::Error> {
        let envelope: GetSessionTokenEnvelope = self
            .call(target, "GetSessionToken", &request.to_params())
            .await?;
        Ok(envelope
            .get_session_token_response
            .get_session_token_result
            .credentials)
    }

    async fn assume_role(
        &self,
        target: &Target<'_>,
        request: &AssumeRoleRequest,
    ) -> Result<AssumeRoleResult, crate::error::Error> {
        let envelope: AssumeRoleEnvelope = self
            .call(target, "AssumeRole", &request.to_params())
            .await?;
        Ok(envelope.assume_role_response.assume_role_result)
    }
}
