use std::fmt::Display;

use jsonwebtoken::{Algorithm, Validation};

/// Which registered claims are checked besides the signature.
///
/// `exp` and `nbf` are always checked when a token carries them.
/// Setting [exp](ClaimsValidationSpec::exp) or [nbf](ClaimsValidationSpec::nbf)
/// additionally makes them mandatory.
#[derive(Clone, Debug, PartialEq)]
pub struct ClaimsValidationSpec {
    pub iss: Option<String>,
    pub exp: bool,
    pub nbf: bool,
    pub aud: Option<Vec<String>>,
    /// Clock skew tolerance in seconds.
    pub leeway: u64,
}

impl Default for ClaimsValidationSpec {
    fn default() -> Self {
        Self {
            iss: None,
            exp: false,
            nbf: false,
            aud: None,
            leeway: 60,
        }
    }
}

impl ClaimsValidationSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recommended(issuer: &str, audiences: Vec<String>) -> Self {
        Self::new().exp(true).iss(issuer).aud(audiences)
    }

    pub fn iss(mut self, issuer: &str) -> Self {
        self.iss = Some(issuer.to_owned());
        self
    }

    pub fn exp(mut self, required: bool) -> Self {
        self.exp = required;
        self
    }

    pub fn nbf(mut self, required: bool) -> Self {
        self.nbf = required;
        self
    }

    pub fn aud(mut self, audiences: Vec<String>) -> Self {
        self.aud = Some(audiences);
        self
    }

    pub fn leeway(mut self, seconds: u64) -> Self {
        self.leeway = seconds;
        self
    }

    pub(crate) fn validation(&self, alg: Algorithm) -> Validation {
        let mut validation = Validation::new(alg);
        let mut required_claims = Vec::<&'static str>::new();
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = self.leeway;
        if let Some(iss) = &self.iss {
            required_claims.push("iss");
            validation.set_issuer(&[iss]);
        }
        if self.exp {
            required_claims.push("exp");
        }
        if self.nbf {
            required_claims.push("nbf");
        }
        match &self.aud {
            Some(aud) => {
                required_claims.push("aud");
                validation.set_audience(aud);
            }
            None => validation.validate_aud = false,
        }
        validation.set_required_spec_claims(&required_claims);
        validation
    }
}

impl Display for ClaimsValidationSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
