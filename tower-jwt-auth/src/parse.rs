use std::{collections::HashMap, marker::PhantomData, sync::Arc};

use async_trait::async_trait;
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, Validation};
use serde::de::DeserializeOwned;

use crate::{
    claims::VerifiedToken, context::RequestContext, credential::RawCredential, error::AuthError,
    key::KeyResolver, validation::ClaimsValidationSpec,
};

/// Turns a raw credential into the identity stored for downstream handlers.
///
/// [JwtParser] is the default. A custom implementation replaces the whole
/// verification step, e.g. to support another token format; rejections are
/// reported as [AuthError::ParseFailed].
#[async_trait]
pub trait TokenParser<Identity>: Send + Sync {
    async fn parse(
        &self,
        credential: &RawCredential,
        request: &RequestContext<'_>,
    ) -> Result<Identity, AuthError>;
}

/// Verifies JWTs against a [KeyResolver].
///
/// Only tokens declaring one of the allowed algorithms are accepted, so a
/// deployment configured for HMAC never trusts a token declaring `RS256`
/// (or the other way around).
pub struct JwtParser<Claims> {
    key_resolver: Arc<dyn KeyResolver>,
    validations: HashMap<Algorithm, Validation>,
    phantom: PhantomData<fn() -> Claims>,
}

impl<Claims> JwtParser<Claims> {
    pub fn new(
        key_resolver: Arc<dyn KeyResolver>,
        algorithms: &[Algorithm],
        claims_validation: &ClaimsValidationSpec,
    ) -> Self {
        let validations = algorithms
            .iter()
            .map(|alg| (*alg, claims_validation.validation(*alg)))
            .collect();
        Self {
            key_resolver,
            validations,
            phantom: PhantomData,
        }
    }
}

impl<Claims> JwtParser<Claims>
where
    Claims: DeserializeOwned,
{
    pub async fn verify(&self, credential: &RawCredential) -> Result<VerifiedToken<Claims>, AuthError> {
        let header = credential.header()?;
        let validation = self
            .validations
            .get(&header.alg)
            .ok_or(AuthError::UnsupportedAlgorithm(header.alg))?;
        let decoding_key = self.key_resolver.resolve_key(credential).await?;

        match decode::<Claims>(credential.as_str(), &decoding_key, validation) {
            Ok(data) => Ok(VerifiedToken {
                header: data.header,
                claims: data.claims,
            }),
            Err(e) => Err(match e.into_kind() {
                ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Utf8(_) => {
                    AuthError::ParseJwtError
                }
                reason => AuthError::ValidationFailed { reason },
            }),
        }
    }
}

#[async_trait]
impl<Claims> TokenParser<VerifiedToken<Claims>> for JwtParser<Claims>
where
    Claims: DeserializeOwned + Send + Sync,
{
    async fn parse(
        &self,
        credential: &RawCredential,
        _request: &RequestContext<'_>,
    ) -> Result<VerifiedToken<Claims>, AuthError> {
        self.verify(credential).await
    }
}
