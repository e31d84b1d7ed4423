use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{decode_header, Header};

use crate::{error::AuthError, lookup::TokenLookup};

/// A token as found in the request, not yet verified.
///
/// Carries the [TokenLookup] it was found with. Created anew for every
/// request and moved into verification.
#[derive(Debug, Clone)]
pub struct RawCredential {
    token: String,
    lookup: TokenLookup,
}

impl RawCredential {
    pub fn new(token: impl Into<String>, lookup: TokenLookup) -> Self {
        RawCredential {
            token: token.into(),
            lookup,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.token
    }

    pub fn lookup(&self) -> &TokenLookup {
        &self.lookup
    }

    /// Decodes the JOSE header without checking the signature.
    ///
    /// Only the metadata (`alg`, `kid`, ...) may be trusted for selecting a key.
    pub fn header(&self) -> Result<Header, AuthError> {
        decode_header(&self.token).map_err(|_| AuthError::ParseJwtError)
    }

    /// Decodes the payload without checking the signature.
    pub fn unverified_claims(&self) -> Option<serde_json::Value> {
        let claims_b64 = self.token.split('.').nth(1)?;
        let claims_bytes = URL_SAFE_NO_PAD.decode(claims_b64).ok()?;
        serde_json::from_slice(&claims_bytes).ok()
    }
}
