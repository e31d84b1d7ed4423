use std::{error::Error, fmt::Display};

use http::StatusCode;
use jsonwebtoken::Algorithm;

use crate::lookup::TokenLookup;

#[derive(Clone, Debug, PartialEq)]
pub enum StartupError {
    /// Neither a signing key, a key set, a key resolver nor a custom token parser was configured.
    MissingKeyStrategy,
    InvalidParameter(String),
    JwksFetchFailed(String),
    InvalidJwk(JwkError),
}

impl Display for StartupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
impl Error for StartupError {}

#[derive(Clone, Debug, PartialEq)]
pub enum JwkError {
    MissingKeyId,
    DecodingFailed(String),
}

impl Display for JwkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
impl Error for JwkError {}

/// Request-time failures of the authentication pipeline.
///
/// Extraction failures map to `400 Bad Request`, everything that happens
/// once a credential was found maps to `401 Unauthorized`,
/// see [status_code](AuthError::status_code).
#[derive(Clone, Debug, PartialEq)]
pub enum AuthError {
    /// No lookup source yielded a credential.
    MissingCredential,
    /// A source was present but ill-formed, e.g. an `Authorization`
    /// header with the wrong scheme or without a token after it.
    MalformedCredential(TokenLookup),
    /// The credential could not be parsed as a JWT.
    ParseJwtError,
    /// A key set is configured but the token header carries no `kid`.
    MissingKeyId,
    /// The token's `kid` is not part of the configured key set.
    InvalidKeyId,
    /// A custom [KeyResolver](crate::key::KeyResolver) returned an error.
    KeyResolutionFailed(String),
    /// The token declares an algorithm outside of the allowed list.
    UnsupportedAlgorithm(Algorithm),
    ValidationFailed {
        reason: jsonwebtoken::errors::ErrorKind,
    },
    /// A custom [TokenParser](crate::parse::TokenParser) rejected the credential.
    ParseFailed(String),
}

impl AuthError {
    pub fn parse_failed(reason: impl Display) -> Self {
        AuthError::ParseFailed(reason.to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingCredential | AuthError::MalformedCredential(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// Whether the failure happened while locating the credential,
    /// as opposed to while resolving keys for or verifying it.
    pub fn is_extraction_error(&self) -> bool {
        self.status_code() == StatusCode::BAD_REQUEST
    }
}

impl Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
impl Error for AuthError {}

#[cfg(test)]
mod tests {
    use jsonwebtoken::errors::ErrorKind;

    use super::*;
    use crate::lookup::TokenSource;

    #[test]
    fn extraction_errors_are_bad_requests() {
        assert_eq!(
            AuthError::MissingCredential.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::MalformedCredential(TokenLookup::new(TokenSource::Header, "Authorization"))
                .status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn verification_errors_are_unauthorized() {
        for error in [
            AuthError::ParseJwtError,
            AuthError::MissingKeyId,
            AuthError::InvalidKeyId,
            AuthError::KeyResolutionFailed("faulty".to_owned()),
            AuthError::UnsupportedAlgorithm(Algorithm::RS256),
            AuthError::ValidationFailed {
                reason: ErrorKind::InvalidSignature,
            },
            AuthError::parse_failed("parsing failed"),
        ] {
            assert_eq!(error.status_code(), StatusCode::UNAUTHORIZED, "{}", error);
            assert!(!error.is_extraction_error());
        }
    }
}
