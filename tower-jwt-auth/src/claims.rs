use std::fmt::Display;

use jsonwebtoken::{Algorithm, Header};
use serde::{Deserialize, Serialize};
use serde_with::{formats::PreferMany, serde_as, OneOrMany};

/// Claims decoded into a generic map from claim name to JSON value.
pub type MapClaims = serde_json::Map<String, serde_json::Value>;

/// The registered claims of RFC 7519.
///
/// Meant to be `#[serde(flatten)]`ed into an own claims struct:
///
/// ```
/// use serde::Deserialize;
/// use tower_jwt_auth::claims::StandardClaims;
///
/// #[derive(Clone, Debug, Deserialize)]
/// struct MyClaims {
///     #[serde(flatten)]
///     standard: StandardClaims,
///     name: String,
///     admin: bool,
/// }
/// ```
#[serde_as]
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct StandardClaims {
    pub iss: Option<String>,
    pub sub: Option<String>,
    #[serde_as(as = "OneOrMany<_, PreferMany>")]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aud: Vec<String>,
    pub exp: Option<u64>,
    pub nbf: Option<u64>,
    pub iat: Option<u64>,
    pub jti: Option<String>,
}

impl Display for StandardClaims {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Result of a successful verification, stored in the request extensions.
///
/// Handlers obtain it by its type, e.g. `Extension<VerifiedToken>` in axum.
#[derive(Clone, Debug)]
pub struct VerifiedToken<Claims = MapClaims> {
    pub header: Header,
    pub claims: Claims,
}

impl<Claims> VerifiedToken<Claims> {
    pub fn algorithm(&self) -> Algorithm {
        self.header.alg
    }

    pub fn key_id(&self) -> Option<&str> {
        self.header.kid.as_deref()
    }

    pub fn claims(&self) -> &Claims {
        &self.claims
    }
}

impl VerifiedToken<MapClaims> {
    pub fn claim(&self, name: &str) -> Option<&serde_json::Value> {
        self.claims.get(name)
    }
}
