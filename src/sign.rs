/*
 * This source code is a modified version of aws-sigv4 crate, reduced to what STS Query API
 * calls need: POST requests without query strings, signed with AWS4-HMAC-SHA256.
 *
 * https://github.com/awslabs/aws-sdk-rust/blob/main/sdk/aws-sigv4
 *
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! AWS4-HMAC-SHA256 signer

pub const AWS4_HMAC_SHA256: &str = "AWS4-HMAC-SHA256";

pub mod header {
    pub const X_AMZ_DATE: &str = "x-amz-date";
    pub const X_AMZ_SECURITY_TOKEN: &str = "x-amz-security-token";
}

type HmacSha256 = hmac::Hmac<sha2::Sha256>;

#[derive(Debug)]
pub struct SigningParams<'a> {
    pub region: &'a str,
    pub service_name: &'a str,
    pub time: chrono::DateTime<chrono::Utc>,

    pub identity: &'a crate::identity::Identity,
}

#[derive(Debug)]
pub struct SignableRequest<'a> {
    pub method: &'a reqwest::Method,
    pub uri: &'a http::Uri,
    pub headers: &'a reqwest::header::HeaderMap,
    pub body: &'a [u8],
}

impl<'a, B> From<&'a http::Request<B>> for SignableRequest<'a>
where
    B: 'a,
    B: AsRef<[u8]>,
{
    fn from(request: &'a http::Request<B>) -> SignableRequest<'a> {
        SignableRequest {
            method: request.method(),
            uri: request.uri(),
            headers: request.headers(),
            body: request.body().as_ref(),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
struct CanonicalHeaderName(reqwest::header::HeaderName);

impl PartialOrd for CanonicalHeaderName {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CanonicalHeaderName {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.as_str().cmp(other.0.as_str())
    }
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct SigningScope<'a> {
    pub time: chrono::DateTime<chrono::Utc>,
    pub region: &'a str,
    pub service: &'a str,
}

impl<'a> std::fmt::Display for SigningScope<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}/aws4_request",
            self.time.format("%Y%m%d"),
            self.region,
            self.service
        )
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct StringToSign<'a> {
    pub scope: SigningScope<'a>,
    pub time: chrono::DateTime<chrono::Utc>,
    pub hashed_creq: &'a str,
}

impl<'a> StringToSign<'a> {
    pub(crate) fn new(
        time: chrono::DateTime<chrono::Utc>,
        region: &'a str,
        service: &'a str,
        hashed_creq: &'a str,
    ) -> Self {
        let scope = SigningScope {
            time,
            region,
            service,
        };
        Self {
            scope,
            time,
            hashed_creq,
        }
    }
}

impl<'a> std::fmt::Display for StringToSign<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\n{}\n{}\n{}",
            AWS4_HMAC_SHA256,
            self.time.format("%Y%m%dT%H%M%SZ"),
            self.scope,
            self.hashed_creq
        )
    }
}

#[derive(Debug, PartialEq, Eq, Default)]
pub struct SignedHeaders {
    headers: Vec<CanonicalHeaderName>,
    formatted: String,
}

impl SignedHeaders {
    fn new(mut headers: Vec<CanonicalHeaderName>) -> Self {
        headers.sort();
        let formatted = headers
            .iter()
            .map(|h| h.0.as_str())
            .collect::<Vec<&str>>()
            .join(";");

        SignedHeaders { headers, formatted }
    }

    pub(super) fn as_str(&self) -> &str {
        &self.formatted
    }
}

impl std::fmt::Display for SignedHeaders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.formatted)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct SignatureValues {
    pub content_sha256: String,
    pub date_time: String,
    pub signed_headers: SignedHeaders,

    pub security_token: Option<reqwest::header::HeaderValue>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct CanonicalRequest<'a> {
    pub method: &'a reqwest::Method,
    pub path: &'a str,
    pub headers: reqwest::header::HeaderMap,
    pub values: SignatureValues,
    // params (query params) is omitted
}

impl<'a> CanonicalRequest<'a> {
    pub fn from<'b>(
        req: &'b SignableRequest<'b>,
        params: &'b SigningParams<'b>,
    ) -> Result<CanonicalRequest<'b>, crate::error::Error> {
        let path = req.uri.path();
        let payload_hash = sha256_hex_string(req.body);

        if matches!(req.uri.query().map(|v| v.is_empty()), Some(false)) {
            return Err(crate::error::Error::Unknown(
                "CanonicalRequest lacks implementation for signing query string".to_string(),
            ));
        }

        let date_time = params.time.format("%Y%m%dT%H%M%SZ").to_string();

        let security_token = params
            .identity
            .session_token
            .as_ref()
            .map(|v| reqwest::header::HeaderValue::try_from(v.as_str()))
            .transpose()?;

        let (signed_headers, canonical_headers) =
            Self::headers(req, &date_time, security_token.as_ref())?;
        let signed_headers = SignedHeaders::new(signed_headers);
        let values = SignatureValues {
            content_sha256: payload_hash,
            date_time,
            signed_headers,
            security_token,
        };
        let creq = CanonicalRequest {
            method: req.method,
            path,
            headers: canonical_headers,
            values,
        };
        Ok(creq)
    }

    fn headers(
        req: &SignableRequest<'_>,
        date_time: &str,
        security_token: Option<&reqwest::header::HeaderValue>,
    ) -> Result<(Vec<CanonicalHeaderName>, reqwest::header::HeaderMap), crate::error::Error> {
        use std::str::FromStr as _;

        let mut canonical_headers = reqwest::header::HeaderMap::with_capacity(req.headers.len());
        for (name, value) in req.headers.iter() {
            canonical_headers.append(
                reqwest::header::HeaderName::from_str(&name.as_str().to_lowercase())?,
                normalize_header_value(value)?,
            );
        }

        Self::insert_host_header(&mut canonical_headers, req.uri)?;
        Self::insert_date_header(&mut canonical_headers, date_time)?;
        if let Some(token) = security_token {
            canonical_headers.insert(
                reqwest::header::HeaderName::from_static(header::X_AMZ_SECURITY_TOKEN),
                token.clone(),
            );
        }

        let mut signed_headers = Vec::with_capacity(canonical_headers.len());
        for name in canonical_headers.keys() {
            signed_headers.push(CanonicalHeaderName(name.clone()));
        }

        Ok((signed_headers, canonical_headers))
    }

    fn insert_host_header(
        canonical_headers: &mut reqwest::header::HeaderMap,
        uri: &http::Uri,
    ) -> Result<(), crate::error::Error> {
        if canonical_headers.contains_key(reqwest::header::HOST) {
            return Ok(());
        }
        let authority = uri.authority().ok_or_else(|| {
            crate::error::Error::Unknown("request uri authority must be set for signing".to_string())
        })?;
        let header = reqwest::header::HeaderValue::try_from(authority.as_str())?;
        canonical_headers.insert(reqwest::header::HOST, header);
        Ok(())
    }

    fn insert_date_header(
        canonical_headers: &mut reqwest::header::HeaderMap,
        date_time: &str,
    ) -> Result<(), crate::error::Error> {
        let x_amz_date = reqwest::header::HeaderName::from_static(header::X_AMZ_DATE);
        canonical_headers.insert(x_amz_date, reqwest::header::HeaderValue::try_from(date_time)?);
        Ok(())
    }
}

impl<'a> std::fmt::Display for CanonicalRequest<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.method)?;
        writeln!(f, "{}", self.path)?;

        // query params is omitted
        writeln!(f)?;

        // write out _all_ the headers
        for header in &self.values.signed_headers.headers {
            let value = self.headers.get(&header.0).ok_or(std::fmt::Error)?;
            write!(f, "{}:", header.0.as_str())?;
            writeln!(
                f,
                "{}",
                std::str::from_utf8(value.as_bytes()).map_err(|_| std::fmt::Error)?
            )?;
        }
        writeln!(f)?;
        // write out the signed headers
        write!(f, "{}", self.values.signed_headers.as_str())?;
        writeln!(f)?;
        write!(f, "{}", self.values.content_sha256)?;
        Ok(())
    }
}

static MULTIPLE_SPACES: once_cell::sync::Lazy<regex::bytes::Regex> =
    once_cell::sync::Lazy::new(|| regex::bytes::Regex::new(r" {2,}").unwrap());

fn trim_all(text: &[u8]) -> std::borrow::Cow<'_, [u8]> {
    let text = trim_spaces_from_byte_string(text);
    MULTIPLE_SPACES.replace_all(text, " ".as_bytes())
}

fn trim_spaces_from_byte_string(bytes: &[u8]) -> &[u8] {
    let Some(starting_index) = bytes.iter().position(|b| *b != b' ') else {
        return &[];
    };
    let ending_index = bytes
        .iter()
        .rposition(|b| *b != b' ')
        .map_or(starting_index, |i| i + 1);
    &bytes[starting_index..ending_index]
}

fn normalize_header_value(
    header_value: &reqwest::header::HeaderValue,
) -> Result<reqwest::header::HeaderValue, crate::error::Error> {
    let trimmed_value = trim_all(header_value.as_bytes());
    Ok(reqwest::header::HeaderValue::from_bytes(&trimmed_value)?)
}

fn sha256_hex_string(body: &[u8]) -> String {
    use sha2::Digest as _;
    let hash = sha2::Sha256::digest(body);
    base16ct::lower::encode_string(&hash)
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    use hmac::Mac as _;
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// kSigning = HMAC(HMAC(HMAC(HMAC("AWS4" + secret, date), region), service), "aws4_request")
pub fn derive_signing_key(
    secret_access_key: &str,
    time: chrono::DateTime<chrono::Utc>,
    region: &str,
    service: &str,
) -> Vec<u8> {
    let k_secret = format!("AWS4{secret_access_key}");
    let k_date = hmac_sha256(
        k_secret.as_bytes(),
        time.format("%Y%m%d").to_string().as_bytes(),
    );
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

fn build_authorization_header(
    access_key_id: &str,
    creq: &CanonicalRequest<'_>,
    sts: StringToSign<'_>,
    signature: &str,
) -> Result<reqwest::header::HeaderValue, crate::error::Error> {
    let mut value = reqwest::header::HeaderValue::try_from(format!(
        "{} Credential={}/{}, SignedHeaders={}, Signature={}",
        AWS4_HMAC_SHA256,
        access_key_id,
        sts.scope,
        creq.values.signed_headers.as_str(),
        signature
    ))?;
    value.set_sensitive(true);
    Ok(value)
}

pub fn calculate_signing_headers<'a>(
    request: &'a SignableRequest<'a>,
    params: &'a SigningParams<'a>,
) -> Result<reqwest::header::HeaderMap, crate::error::Error> {
    let creq = CanonicalRequest::from(request, params)?;
    tracing::trace!(canonical_request = %creq);

    let encoded_creq = &sha256_hex_string(creq.to_string().as_bytes());
    let sts = StringToSign::new(
        params.time,
        params.region,
        params.service_name,
        encoded_creq,
    );

    let signing_key = derive_signing_key(
        params.identity.secret_access_key.expose(),
        params.time,
        params.region,
        params.service_name,
    );
    let signature =
        base16ct::lower::encode_string(&hmac_sha256(&signing_key, sts.to_string().as_bytes()));

    let values = &creq.values;

    let mut headers = reqwest::header::HeaderMap::new();

    headers.insert(
        header::X_AMZ_DATE,
        reqwest::header::HeaderValue::try_from(values.date_time.as_str())?,
    );
    if let Some(token) = values.security_token.as_ref() {
        let mut token = token.clone();
        token.set_sensitive(true);
        headers.insert(header::X_AMZ_SECURITY_TOKEN, token);
    }

    headers.insert(
        reqwest::header::AUTHORIZATION,
        build_authorization_header(&params.identity.access_key_id, &creq, sts, &signature)?,
    );

    Ok(headers)
}
