use std::{collections::HashMap, fmt};

use async_trait::async_trait;
use jsonwebtoken::{
    jwk::{Jwk, JwkSet},
    DecodingKey,
};
use log::info;
use tower::BoxError;
use url::Url;

use crate::{
    credential::RawCredential,
    error::{AuthError, JwkError, StartupError},
};

/// Picks the key a token's signature is checked against.
///
/// Called with the unverified credential before the signature is checked,
/// so implementations must only rely on header metadata such as `kid`.
#[async_trait]
pub trait KeyResolver: Send + Sync {
    async fn resolve_key(&self, credential: &RawCredential) -> Result<DecodingKey, AuthError>;
}

/// Always returns the same key.
#[derive(Clone)]
pub struct StaticKeyResolver {
    key: DecodingKey,
}

impl StaticKeyResolver {
    pub fn new(key: DecodingKey) -> Self {
        Self { key }
    }
}

#[async_trait]
impl KeyResolver for StaticKeyResolver {
    async fn resolve_key(&self, _credential: &RawCredential) -> Result<DecodingKey, AuthError> {
        Ok(self.key.clone())
    }
}

impl fmt::Debug for StaticKeyResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticKeyResolver").finish()
    }
}

/// Selects a key based on the `kid` of the token header.
#[derive(Clone)]
pub struct KeySetResolver {
    keys: HashMap<String, DecodingKey>,
}

impl KeySetResolver {
    pub fn new(keys: HashMap<String, DecodingKey>) -> Self {
        Self { keys }
    }

    /// Every key of the set must carry a `kid` and be decodable.
    pub fn from_jwks(jwks: &JwkSet) -> Result<Self, StartupError> {
        let keys = jwks
            .keys
            .iter()
            .map(parse_jwk)
            .collect::<Result<HashMap<_, _>, _>>()
            .map_err(StartupError::InvalidJwk)?;
        Ok(Self::new(keys))
    }

    /// Fetches a JWK set document once.
    ///
    /// The keys are not refreshed afterwards.
    pub async fn fetch(jwks_url: Url) -> Result<Self, StartupError> {
        let response = reqwest::get(jwks_url.clone())
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| StartupError::JwksFetchFailed(e.to_string()))?;
        let jwks = response
            .json::<JwkSet>()
            .await
            .map_err(|e| StartupError::JwksFetchFailed(e.to_string()))?;
        let resolver = Self::from_jwks(&jwks)?;
        info!(
            "Loaded {} key(s) from JWK set at {}",
            resolver.keys.len(),
            jwks_url
        );
        Ok(resolver)
    }

    pub fn has_kid(&self, kid: &str) -> bool {
        self.keys.contains_key(kid)
    }
}

#[async_trait]
impl KeyResolver for KeySetResolver {
    async fn resolve_key(&self, credential: &RawCredential) -> Result<DecodingKey, AuthError> {
        let header = credential.header()?;
        let kid = header.kid.ok_or(AuthError::MissingKeyId)?;
        self.keys.get(&kid).cloned().ok_or(AuthError::InvalidKeyId)
    }
}

impl fmt::Debug for KeySetResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeySetResolver")
            .field("kids", &self.keys.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Adapts a synchronous closure into a [KeyResolver].
///
/// Errors returned by the closure become [AuthError::KeyResolutionFailed].
pub struct FnKeyResolver<F>(F);

impl<F> FnKeyResolver<F>
where
    F: Fn(&RawCredential) -> Result<DecodingKey, BoxError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> KeyResolver for FnKeyResolver<F>
where
    F: Fn(&RawCredential) -> Result<DecodingKey, BoxError> + Send + Sync,
{
    async fn resolve_key(&self, credential: &RawCredential) -> Result<DecodingKey, AuthError> {
        (self.0)(credential).map_err(|e| AuthError::KeyResolutionFailed(e.to_string()))
    }
}

fn parse_jwk(jwk: &Jwk) -> Result<(String, DecodingKey), JwkError> {
    let key_id = jwk.common.key_id.as_ref().ok_or(JwkError::MissingKeyId)?;
    let decoding_key =
        DecodingKey::from_jwk(jwk).map_err(|e| JwkError::DecodingFailed(e.to_string()))?;
    Ok((key_id.clone(), decoding_key))
}
