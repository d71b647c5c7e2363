// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase ID token verification.
//!
//! Production tokens are RS256, signed with Google's rotating securetoken
//! keys. Local development can instead use HS256 tokens signed with a
//! shared secret.

use crate::config::Config;
use anyhow::Context;
use async_trait::async_trait;
use axum::http::HeaderValue;
use chrono::Utc;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::header::{HeaderMap, CACHE_CONTROL};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
const JWKS_FETCH_TIMEOUT: Duration = Duration::from_secs(5);
/// Used when Google omits `Cache-Control: max-age`.
const FALLBACK_KEY_LIFETIME: Duration = Duration::from_secs(300);
/// Unknown key ids do not trigger a refetch more often than this.
const MIN_REFETCH_INTERVAL: Duration = Duration::from_secs(30);
const ALLOWED_CLOCK_DRIFT_SECS: u64 = 60;
/// Firebase caps user ids at 128 characters.
const MAX_UID_LEN: usize = 128;

/// Identity extracted from a valid ID token.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedUser {
    pub uid: String,
    pub email: Option<String>,
}

/// Verification error categories.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AuthError {
    /// The token is malformed, expired, or its claims do not match.
    #[error("invalid credential: {0}")]
    Invalid(String),
    /// Signing keys could not be fetched.
    #[error("identity provider unavailable: {0}")]
    Transient(String),
}

/// Resolves a bearer credential to a user identity.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<VerifiedUser, AuthError>;
}

/// Claims carried by a Firebase ID token.
///
/// Also used to mint locally signed tokens in shared-secret mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirebaseClaims {
    pub iss: String,
    pub aud: String,
    pub sub: String,
    pub exp: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl FirebaseClaims {
    /// Claims for `uid` valid for `ttl_secs` from now, as Firebase would issue them.
    pub fn for_user(project_id: &str, uid: &str, ttl_secs: u64) -> Self {
        let issued_at = now_secs();
        Self {
            iss: issuer_for(project_id),
            aud: project_id.to_string(),
            sub: uid.to_string(),
            exp: (issued_at + ttl_secs) as usize,
            iat: Some(issued_at as usize),
            email: None,
        }
    }

    /// Checks `jsonwebtoken` does not cover: issue time and uid shape.
    fn into_user(self) -> Result<VerifiedUser, AuthError> {
        match self.iat {
            None => return Err(AuthError::Invalid("missing iat claim".to_string())),
            Some(iat) if iat as u64 > now_secs() + ALLOWED_CLOCK_DRIFT_SECS => {
                return Err(AuthError::Invalid("iat claim is in the future".to_string()))
            }
            Some(_) => {}
        }

        if self.sub.is_empty() || self.sub.len() > MAX_UID_LEN {
            return Err(AuthError::Invalid("invalid sub claim".to_string()));
        }

        Ok(VerifiedUser {
            uid: self.sub,
            email: self.email,
        })
    }
}

/// Verifier for Firebase Authentication ID tokens.
pub struct FirebaseTokenVerifier {
    project_id: String,
    issuer: String,
    keys: KeySource,
}

enum KeySource {
    Shared(Arc<DecodingKey>),
    Remote(RemoteKeys),
}

impl KeySource {
    fn algorithm(&self) -> Algorithm {
        match self {
            KeySource::Shared(_) => Algorithm::HS256,
            KeySource::Remote(_) => Algorithm::RS256,
        }
    }
}

impl FirebaseTokenVerifier {
    /// Pick the verification mode from config: a shared secret selects HS256.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        match &config.auth_shared_secret {
            Some(secret) => {
                tracing::warn!("Using shared-secret token verification (development only)");
                Self::new_with_shared_secret(&config.firebase_project_id, secret)
            }
            None => Self::new(&config.firebase_project_id),
        }
    }

    /// Create a production verifier backed by Google's securetoken keys.
    pub fn new(project_id: &str) -> anyhow::Result<Self> {
        Self::with_jwks_url(project_id, FIREBASE_JWKS_URL)
    }

    /// Create an RS256 verifier that loads its signing keys from `jwks_url`.
    pub fn with_jwks_url(project_id: &str, jwks_url: impl Into<String>) -> anyhow::Result<Self> {
        let keys = RemoteKeys::new(jwks_url.into())?;
        tracing::info!(project = project_id, "Initialized Firebase ID token verifier");
        Ok(Self::build(project_id, KeySource::Remote(keys)))
    }

    /// Create a verifier accepting HS256 tokens signed with `secret`.
    pub fn new_with_shared_secret(project_id: &str, secret: &[u8]) -> anyhow::Result<Self> {
        if secret.is_empty() {
            anyhow::bail!("shared auth secret must not be empty");
        }
        let key = Arc::new(DecodingKey::from_secret(secret));
        Ok(Self::build(project_id, KeySource::Shared(key)))
    }

    fn build(project_id: &str, keys: KeySource) -> Self {
        Self {
            project_id: project_id.to_string(),
            issuer: issuer_for(project_id),
            keys,
        }
    }

    fn validation(&self, algorithm: Algorithm) -> Validation {
        let mut validation = Validation::new(algorithm);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[self.project_id.as_str()]);
        validation.leeway = ALLOWED_CLOCK_DRIFT_SECS;
        validation
    }
}

#[async_trait]
impl IdentityVerifier for FirebaseTokenVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedUser, AuthError> {
        let header = decode_header(token)
            .map_err(|e| AuthError::Invalid(format!("malformed token header: {e}")))?;

        let algorithm = self.keys.algorithm();
        if header.alg != algorithm {
            return Err(AuthError::Invalid(format!(
                "token signed with {:?}, expected {:?}",
                header.alg, algorithm
            )));
        }

        let key = match &self.keys {
            KeySource::Shared(key) => key.clone(),
            KeySource::Remote(remote) => {
                let kid = header
                    .kid
                    .as_deref()
                    .ok_or_else(|| AuthError::Invalid("token has no kid".to_string()))?;
                remote.key(kid).await?
            }
        };

        decode::<FirebaseClaims>(token, &key, &self.validation(algorithm))
            .map_err(|e| AuthError::Invalid(format!("token rejected: {e}")))?
            .claims
            .into_user()
    }
}

// ─── Remote Signing Keys ─────────────────────────────────────

/// One fetched snapshot of the published signing keys.
struct SigningKeys {
    by_kid: HashMap<String, Arc<DecodingKey>>,
    fetched_at: Instant,
    fresh_until: Instant,
}

impl SigningKeys {
    fn is_fresh(&self, now: Instant) -> bool {
        now < self.fresh_until
    }

    fn lookup(&self, kid: &str, now: Instant) -> Option<Arc<DecodingKey>> {
        if !self.is_fresh(now) {
            return None;
        }
        self.by_kid.get(kid).cloned()
    }
}

struct RemoteKeys {
    http: reqwest::Client,
    url: String,
    current: RwLock<Option<Arc<SigningKeys>>>,
    /// Serializes fetches so a burst of requests triggers one download.
    fetching: Mutex<()>,
}

impl RemoteKeys {
    fn new(url: String) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(JWKS_FETCH_TIMEOUT)
            .build()
            .context("failed building JWKS HTTP client")?;

        Ok(Self {
            http,
            url,
            current: RwLock::new(None),
            fetching: Mutex::new(()),
        })
    }

    async fn snapshot(&self) -> Option<Arc<SigningKeys>> {
        self.current.read().await.clone()
    }

    /// Key for `kid`, refetching when the snapshot is stale or lacks it.
    async fn key(&self, kid: &str) -> Result<Arc<DecodingKey>, AuthError> {
        let unknown = || AuthError::Invalid(format!("unknown signing key id: {kid}"));

        if let Some(key) = self
            .snapshot()
            .await
            .and_then(|keys| keys.lookup(kid, Instant::now()))
        {
            return Ok(key);
        }

        let _fetching = self.fetching.lock().await;

        // Re-check: the fetch we waited on may have brought the key.
        if let Some(keys) = self.snapshot().await {
            let now = Instant::now();
            if let Some(key) = keys.lookup(kid, now) {
                return Ok(key);
            }
            if keys.is_fresh(now) && now.duration_since(keys.fetched_at) < MIN_REFETCH_INTERVAL {
                return Err(unknown());
            }
        }

        let keys = self.fetch().await?;
        let key = keys.lookup(kid, Instant::now());
        *self.current.write().await = Some(keys);
        key.ok_or_else(unknown)
    }

    async fn fetch(&self) -> Result<Arc<SigningKeys>, AuthError> {
        tracing::debug!(url = %self.url, "Fetching Firebase signing keys");

        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AuthError::Transient(format!("signing key fetch failed: {e}")))?;

        let lifetime = max_age(response.headers()).unwrap_or(FALLBACK_KEY_LIFETIME);

        let set: JwkSet = response
            .json()
            .await
            .map_err(|e| AuthError::Transient(format!("invalid JWKS body: {e}")))?;

        let by_kid: HashMap<_, _> = set
            .keys
            .into_iter()
            .filter_map(Jwk::into_verifying_key)
            .collect();
        if by_kid.is_empty() {
            return Err(AuthError::Transient(
                "JWKS contains no RS256 signing keys".to_string(),
            ));
        }

        tracing::debug!(
            keys = by_kid.len(),
            lifetime_secs = lifetime.as_secs(),
            "Firebase signing keys refreshed"
        );

        let fetched_at = Instant::now();
        Ok(Arc::new(SigningKeys {
            by_kid,
            fetched_at,
            fresh_until: fetched_at + lifetime,
        }))
    }
}

#[derive(Debug, Deserialize)]
struct JwkSet {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    alg: Option<String>,
    #[serde(rename = "use")]
    key_use: Option<String>,
    n: String,
    e: String,
}

impl Jwk {
    /// RSA signing keys only; anything else published alongside is ignored.
    fn into_verifying_key(self) -> Option<(String, Arc<DecodingKey>)> {
        let usable = self.kty == "RSA"
            && !self.kid.trim().is_empty()
            && matches!(self.alg.as_deref(), None | Some("RS256"))
            && matches!(self.key_use.as_deref(), None | Some("sig"));
        if !usable {
            return None;
        }

        match DecodingKey::from_rsa_components(&self.n, &self.e) {
            Ok(key) => Some((self.kid, Arc::new(key))),
            Err(e) => {
                tracing::warn!(kid = %self.kid, error = %e, "Ignoring malformed signing key");
                None
            }
        }
    }
}

fn max_age(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(CACHE_CONTROL)?.to_str().ok()?;
    max_age_directive(value).map(Duration::from_secs)
}

fn max_age_directive(cache_control: &str) -> Option<u64> {
    cache_control
        .split(',')
        .filter_map(|directive| directive.trim().split_once('='))
        .find(|(name, _)| name.eq_ignore_ascii_case("max-age"))
        .and_then(|(_, secs)| secs.trim_matches('"').parse().ok())
}

// ─── Helpers ─────────────────────────────────────────────────

/// Pull the token out of an `Authorization: Bearer ...` header.
pub fn extract_bearer_token(auth_header: &HeaderValue) -> Result<&str, AuthError> {
    let value = auth_header
        .to_str()
        .map_err(|_| AuthError::Invalid("Authorization header is not ASCII".to_string()))?;

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => match token.trim() {
            "" => Err(AuthError::Invalid("bearer token is empty".to_string())),
            token => Ok(token),
        },
        _ => Err(AuthError::Invalid(
            "Authorization header must use the Bearer scheme".to_string(),
        )),
    }
}

fn issuer_for(project_id: &str) -> String {
    format!("https://securetoken.google.com/{project_id}")
}

fn now_secs() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const PROJECT: &str = "demo-project";
    const SECRET: &[u8] = b"unit_test_secret_at_least_32_bytes";

    fn sign_with(claims: &FirebaseClaims, secret: &[u8]) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret),
        )
        .unwrap()
    }

    async fn verify(claims: &FirebaseClaims) -> Result<VerifiedUser, AuthError> {
        let verifier = FirebaseTokenVerifier::new_with_shared_secret(PROJECT, SECRET).unwrap();
        verifier.verify(&sign_with(claims, SECRET)).await
    }

    fn is_invalid(result: Result<VerifiedUser, AuthError>) -> bool {
        matches!(result, Err(AuthError::Invalid(_)))
    }

    #[tokio::test]
    async fn accepts_token_for_project() {
        let user = verify(&FirebaseClaims::for_user(PROJECT, "user-1", 3600))
            .await
            .unwrap();
        assert_eq!(user.uid, "user-1");
    }

    #[tokio::test]
    async fn rejects_claims_for_another_project() {
        let mut claims = FirebaseClaims::for_user(PROJECT, "user-1", 3600);
        claims.aud = "other-project".to_string();
        assert!(is_invalid(verify(&claims).await));

        let mut claims = FirebaseClaims::for_user(PROJECT, "user-1", 3600);
        claims.iss = "https://accounts.google.com".to_string();
        assert!(is_invalid(verify(&claims).await));
    }

    #[tokio::test]
    async fn rejects_bad_timestamps() {
        let mut expired = FirebaseClaims::for_user(PROJECT, "user-1", 0);
        expired.exp -= 3600;
        assert!(is_invalid(verify(&expired).await));

        let mut issued_later = FirebaseClaims::for_user(PROJECT, "user-1", 3600);
        issued_later.iat = issued_later.iat.map(|iat| iat + 600);
        assert!(is_invalid(verify(&issued_later).await));

        // Within the drift allowance.
        let mut slightly_ahead = FirebaseClaims::for_user(PROJECT, "user-1", 3600);
        slightly_ahead.iat = slightly_ahead.iat.map(|iat| iat + 30);
        assert!(verify(&slightly_ahead).await.is_ok());
    }

    #[tokio::test]
    async fn rejects_foreign_signature_and_garbage() {
        let verifier = FirebaseTokenVerifier::new_with_shared_secret(PROJECT, SECRET).unwrap();
        let forged = sign_with(
            &FirebaseClaims::for_user(PROJECT, "user-1", 3600),
            b"some_other_secret_of_sufficient_len",
        );

        assert!(is_invalid(verifier.verify(&forged).await));
        assert!(is_invalid(verifier.verify("not-a-jwt").await));
    }

    #[test]
    fn empty_shared_secret_is_refused() {
        assert!(FirebaseTokenVerifier::new_with_shared_secret(PROJECT, b"").is_err());
    }

    #[test]
    fn max_age_directive_parsing() {
        assert_eq!(
            max_age_directive("public, max-age=19845, must-revalidate, no-transform"),
            Some(19845)
        );
        assert_eq!(max_age_directive("Max-Age=\"120\""), Some(120));
        assert_eq!(max_age_directive("public, immutable"), None);
        assert_eq!(max_age_directive("max-age=abc"), None);
        assert_eq!(max_age_directive(""), None);
    }

    #[test]
    fn only_rsa_signing_keys_are_kept() {
        let set: JwkSet = serde_json::from_value(serde_json::json!({
            "keys": [
                { "kid": "enc", "kty": "RSA", "use": "enc", "n": "AQAB", "e": "AQAB" },
                { "kid": "ec", "kty": "EC", "n": "AQAB", "e": "AQAB" },
                { "kid": " ", "kty": "RSA", "n": "AQAB", "e": "AQAB" },
                { "kid": "ok", "kty": "RSA", "alg": "RS256", "use": "sig", "n": "AQAB", "e": "AQAB" }
            ]
        }))
        .unwrap();

        let kids: Vec<String> = set
            .keys
            .into_iter()
            .filter_map(Jwk::into_verifying_key)
            .map(|(kid, _)| kid)
            .collect();
        assert_eq!(kids, vec!["ok"]);
    }

    #[test]
    fn bearer_token_extraction() {
        let token = |raw: &'static str| {
            extract_bearer_token(&HeaderValue::from_static(raw)).map(str::to_string)
        };

        assert_eq!(token("Bearer abc.def.ghi").unwrap(), "abc.def.ghi");
        assert_eq!(token("bearer abc.def.ghi").unwrap(), "abc.def.ghi");
        assert!(token("Basic dXNlcjpwYXNz").is_err());
        assert!(token("Bearer ").is_err());
        assert!(token("Bearer").is_err());
    }
}
