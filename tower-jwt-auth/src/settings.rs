use jsonwebtoken::Algorithm;
use serde::Deserialize;

use crate::{builder::DEFAULTS, lookup::LookupChain, validation::ClaimsValidationSpec};

/// The data-only part of the middleware configuration.
///
/// Meant to be deserialized from whatever configuration source an application
/// uses, then applied with [settings](crate::builder::JwtAuthBuilder::settings).
/// Keys and callbacks are always set on the builder.
///
/// ```
/// use tower_jwt_auth::settings::AuthSettings;
///
/// let settings: AuthSettings = serde_json::from_str(r#"{
///     "token_lookup": "header:Authorization,cookie:jwt",
///     "credentials_optional": true,
///     "algorithms": ["HS256", "HS512"]
/// }"#).unwrap();
/// assert_eq!(settings.auth_scheme, "Bearer");
/// ```
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthSettings {
    pub token_lookup: LookupChain,
    pub auth_scheme: String,
    pub credentials_optional: bool,
    pub continue_on_ignored_error: bool,
    pub algorithms: Vec<Algorithm>,
    pub issuer: Option<String>,
    pub audiences: Option<Vec<String>>,
    pub require_exp: bool,
    pub require_nbf: bool,
    pub leeway: Option<u64>,
}

impl AuthSettings {
    pub fn claims_validation(&self) -> ClaimsValidationSpec {
        let mut spec = ClaimsValidationSpec::new()
            .exp(self.require_exp)
            .nbf(self.require_nbf);
        if let Some(issuer) = &self.issuer {
            spec = spec.iss(issuer);
        }
        if let Some(audiences) = &self.audiences {
            spec = spec.aud(audiences.clone());
        }
        if let Some(leeway) = self.leeway {
            spec = spec.leeway(leeway);
        }
        spec
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            token_lookup: DEFAULTS.token_lookup(),
            auth_scheme: DEFAULTS.auth_scheme.to_owned(),
            credentials_optional: false,
            continue_on_ignored_error: false,
            algorithms: DEFAULTS.algorithms.to_vec(),
            issuer: None,
            audiences: None,
            require_exp: false,
            require_nbf: false,
            leeway: None,
        }
    }
}
