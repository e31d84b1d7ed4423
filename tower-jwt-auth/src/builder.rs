use std::{collections::HashMap, sync::Arc};

use http::request::Parts;
use jsonwebtoken::{Algorithm, DecodingKey};
use log::{info, warn};
use serde::de::DeserializeOwned;
use tower::BoxError;

use crate::{
    claims::VerifiedToken,
    context::RequestContext,
    credential::RawCredential,
    error::StartupError,
    extract::{LookupExtractor, TokenExtractor},
    key::{FnKeyResolver, KeyResolver, KeySetResolver, StaticKeyResolver},
    lookup::{LookupChain, TokenLookup, TokenSource},
    middleware::{BeforeHook, JwtAuth, JwtAuthConfig, Skipper, SuccessHook},
    parse::{JwtParser, TokenParser},
    settings::AuthSettings,
    validation::ClaimsValidationSpec,
};

/// Values used for everything not set explicitly on a [JwtAuthBuilder].
pub struct Defaults {
    pub token_lookup: (TokenSource, &'static str),
    pub auth_scheme: &'static str,
    pub algorithms: &'static [Algorithm],
}

impl Defaults {
    pub fn token_lookup(&self) -> LookupChain {
        let (source, name) = self.token_lookup;
        LookupChain::single(TokenLookup::new(source, name))
    }
}

pub const DEFAULTS: Defaults = Defaults {
    token_lookup: (TokenSource::Header, "Authorization"),
    auth_scheme: "Bearer",
    algorithms: &[Algorithm::HS256],
};

type ParserFactory<Identity> =
    fn(Arc<dyn KeyResolver>, &[Algorithm], &ClaimsValidationSpec) -> Arc<dyn TokenParser<Identity>>;

enum ParserSource<Identity> {
    Jwt(ParserFactory<Identity>),
    Custom(Arc<dyn TokenParser<Identity>>),
}

fn jwt_parser<Claims>(
    key_resolver: Arc<dyn KeyResolver>,
    algorithms: &[Algorithm],
    claims_validation: &ClaimsValidationSpec,
) -> Arc<dyn TokenParser<VerifiedToken<Claims>>>
where
    Claims: DeserializeOwned + Send + Sync + 'static,
{
    Arc::new(JwtParser::<Claims>::new(
        key_resolver,
        algorithms,
        claims_validation,
    ))
}

pub struct JwtAuthBuilder<Identity> {
    parser: ParserSource<Identity>,
    key_resolver: Option<(&'static str, Arc<dyn KeyResolver>)>,
    extractor: Option<Box<dyn TokenExtractor>>,
    token_lookup: Result<LookupChain, StartupError>,
    auth_scheme: String,
    algorithms: Vec<Algorithm>,
    claims_validation: ClaimsValidationSpec,
    credentials_optional: bool,
    continue_on_ignored_error: bool,
    skipper: Option<Skipper>,
    before: Option<BeforeHook>,
    on_success: Option<SuccessHook>,
}

impl<Claims> JwtAuth<VerifiedToken<Claims>>
where
    Claims: Clone + DeserializeOwned + Send + Sync + 'static,
{
    /// Builder for a middleware verifying JWTs and storing a
    /// [VerifiedToken] with the given claims type.
    pub fn builder() -> JwtAuthBuilder<VerifiedToken<Claims>> {
        JwtAuthBuilder::new(ParserSource::Jwt(jwt_parser::<Claims>))
    }
}

impl<Identity> JwtAuth<Identity>
where
    Identity: Clone + Send + Sync + 'static,
{
    /// Builder for a middleware whose verification is done entirely by `parser`.
    pub fn builder_with_parser(
        parser: Arc<dyn TokenParser<Identity>>,
    ) -> JwtAuthBuilder<Identity> {
        JwtAuthBuilder::new(ParserSource::Custom(parser))
    }
}

impl<Identity> JwtAuthBuilder<Identity>
where
    Identity: Clone + Send + Sync + 'static,
{
    fn new(parser: ParserSource<Identity>) -> Self {
        JwtAuthBuilder {
            parser,
            key_resolver: None,
            extractor: None,
            token_lookup: Ok(DEFAULTS.token_lookup()),
            auth_scheme: DEFAULTS.auth_scheme.to_owned(),
            algorithms: DEFAULTS.algorithms.to_vec(),
            claims_validation: ClaimsValidationSpec::default(),
            credentials_optional: false,
            continue_on_ignored_error: false,
            skipper: None,
            before: None,
            on_success: None,
        }
    }

    /// Verify every token with the same key.
    pub fn signing_key(mut self, key: DecodingKey) -> Self {
        self.key_resolver = Some(("static key", Arc::new(StaticKeyResolver::new(key))));
        self
    }

    /// Verify tokens with the key registered under their `kid` header.
    pub fn signing_keys(mut self, keys: HashMap<String, DecodingKey>) -> Self {
        self.key_resolver = Some(("key set", Arc::new(KeySetResolver::new(keys))));
        self
    }

    pub fn key_resolver(mut self, key_resolver: Arc<dyn KeyResolver>) -> Self {
        self.key_resolver = Some(("custom key resolver", key_resolver));
        self
    }

    pub fn key_fn<F>(self, f: F) -> Self
    where
        F: Fn(&RawCredential) -> Result<DecodingKey, BoxError> + Send + Sync + 'static,
    {
        self.key_resolver(Arc::new(FnKeyResolver::new(f)))
    }

    /// Replace verification altogether. Any configured key is ignored.
    pub fn token_parser(mut self, parser: Arc<dyn TokenParser<Identity>>) -> Self {
        self.parser = ParserSource::Custom(parser);
        self
    }

    /// Comma separated `source:name` pairs, e.g. `header:Authorization,cookie:jwt`.
    ///
    /// An invalid value is reported by [build](JwtAuthBuilder::build).
    pub fn token_lookup(mut self, token_lookup: &str) -> Self {
        self.token_lookup = token_lookup.parse();
        self
    }

    /// Replace the lookup chain with an own extractor.
    pub fn token_extractor(mut self, extractor: Box<dyn TokenExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn auth_scheme(mut self, auth_scheme: impl Into<String>) -> Self {
        self.auth_scheme = auth_scheme.into();
        self
    }

    pub fn algorithms(mut self, algorithms: &[Algorithm]) -> Self {
        self.algorithms = algorithms.to_vec();
        self
    }

    pub fn claims_validation(mut self, claims_validation: ClaimsValidationSpec) -> Self {
        self.claims_validation = claims_validation;
        self
    }

    /// Let requests without any credential through, without identity.
    pub fn credentials_optional(mut self, credentials_optional: bool) -> Self {
        self.credentials_optional = credentials_optional;
        self
    }

    /// Honor [ErrorAction::Ignore](crate::error_handler::ErrorAction::Ignore)
    /// by calling the inner service.
    pub fn continue_on_ignored_error(mut self, continue_on_ignored_error: bool) -> Self {
        self.continue_on_ignored_error = continue_on_ignored_error;
        self
    }

    /// Requests for which `skipper` returns `true` bypass authentication.
    pub fn skipper<F>(mut self, skipper: F) -> Self
    where
        F: Fn(&Parts) -> bool + Send + Sync + 'static,
    {
        self.skipper = Some(Arc::new(skipper));
        self
    }

    /// Called for every request that is not skipped, before extraction.
    pub fn before<F>(mut self, before: F) -> Self
    where
        F: Fn(&Parts) + Send + Sync + 'static,
    {
        self.before = Some(Arc::new(before));
        self
    }

    /// Called after the identity was stored.
    pub fn on_success<F>(mut self, on_success: F) -> Self
    where
        F: Fn(&RequestContext<'_>) + Send + Sync + 'static,
    {
        self.on_success = Some(Arc::new(on_success));
        self
    }

    pub fn settings(mut self, settings: AuthSettings) -> Self {
        self.claims_validation = settings.claims_validation();
        self.token_lookup = Ok(settings.token_lookup);
        self.auth_scheme = settings.auth_scheme;
        self.credentials_optional = settings.credentials_optional;
        self.continue_on_ignored_error = settings.continue_on_ignored_error;
        self.algorithms = settings.algorithms;
        self
    }

    /// Construct the middleware.
    ///
    /// Fails if no way to verify tokens was configured, or if the
    /// token lookup or algorithm list is invalid.
    pub fn build(self) -> Result<JwtAuth<Identity>, StartupError> {
        let token_lookup = self.token_lookup?;
        if self.algorithms.is_empty() {
            return Err(StartupError::InvalidParameter(
                "at least one algorithm must be allowed".to_owned(),
            ));
        }
        let parser = match self.parser {
            ParserSource::Custom(parser) => {
                if let Some((strategy, _)) = self.key_resolver {
                    warn!("A custom token parser is configured, ignoring the {}", strategy);
                }
                parser
            }
            ParserSource::Jwt(factory) => {
                let (strategy, key_resolver) =
                    self.key_resolver.ok_or(StartupError::MissingKeyStrategy)?;
                info!(
                    "Tokens will be verified with a {} for algorithms {:?} and claims validation {}",
                    strategy, self.algorithms, self.claims_validation
                );
                factory(key_resolver, &self.algorithms, &self.claims_validation)
            }
        };
        let extractor = match self.extractor {
            Some(extractor) => extractor,
            None => {
                info!(
                    "Credentials will be looked up in {} using scheme '{}'",
                    token_lookup, self.auth_scheme
                );
                Box::new(LookupExtractor::new(token_lookup, self.auth_scheme.clone()))
            }
        };

        Ok(JwtAuth::new(JwtAuthConfig {
            extractor,
            parser,
            auth_scheme: self.auth_scheme,
            credentials_optional: self.credentials_optional,
            continue_on_ignored_error: self.continue_on_ignored_error,
            skipper: self.skipper,
            before: self.before,
            on_success: self.on_success,
        }))
    }
}
