use core::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::{header::CONTENT_TYPE, request::Parts, Request, Response};
use http_body::Body;
use http_body_util::{BodyExt, Limited};
use log::{debug, warn};
use tower::BoxError;

use crate::{
    claims::VerifiedToken,
    context::{FormFields, RequestContext},
    error::AuthError,
    error_handler::{ContextErrorHandler, DefaultErrorHandler, ErrorHandler, ErrorRouting},
    extract::TokenExtractor,
    layer::JwtAuthLayer,
    parse::TokenParser,
};

/// Upper bound for urlencoded bodies buffered for `form:` lookups.
pub const MAX_FORM_BODY_BYTES: usize = 1024 * 1024;

/// Decides per request whether authentication is bypassed.
pub type Skipper = Arc<dyn Fn(&Parts) -> bool + Send + Sync>;
/// Observes every request that is not skipped, before extraction.
pub type BeforeHook = Arc<dyn Fn(&Parts) + Send + Sync>;
/// Observes every request once its identity was stored.
pub type SuccessHook = Arc<dyn Fn(&RequestContext<'_>) + Send + Sync>;

pub(crate) struct JwtAuthConfig<Identity> {
    pub(crate) extractor: Box<dyn TokenExtractor>,
    pub(crate) parser: Arc<dyn TokenParser<Identity>>,
    pub(crate) auth_scheme: String,
    pub(crate) credentials_optional: bool,
    pub(crate) continue_on_ignored_error: bool,
    pub(crate) skipper: Option<Skipper>,
    pub(crate) before: Option<BeforeHook>,
    pub(crate) on_success: Option<SuccessHook>,
}

/// JwtAuth
///
/// This is the actual middleware.
/// Built with [builder](JwtAuth::builder), and turned into a tower layer
/// by calling [into_layer](JwtAuth::into_layer).
///
/// On success the identity (a [VerifiedToken] unless a custom
/// [TokenParser] is used) is inserted into the request extensions,
/// where downstream handlers look it up by its type.
pub struct JwtAuth<Identity = VerifiedToken> {
    inner: Arc<JwtAuthConfig<Identity>>,
}

impl<Identity> Clone for JwtAuth<Identity> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<Identity> fmt::Debug for JwtAuth<Identity> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtAuth")
            .field("auth_scheme", &self.inner.auth_scheme)
            .field("credentials_optional", &self.inner.credentials_optional)
            .field(
                "continue_on_ignored_error",
                &self.inner.continue_on_ignored_error,
            )
            .finish()
    }
}

impl<Identity> JwtAuth<Identity>
where
    Identity: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(config: JwtAuthConfig<Identity>) -> Self {
        Self {
            inner: Arc::new(config),
        }
    }

    /// Extract and verify the credential of a request.
    ///
    /// Returns `Ok(None)` when no credential was found and credentials
    /// are optional.
    pub async fn authenticate(
        &self,
        request: &RequestContext<'_>,
    ) -> Result<Option<Identity>, AuthError> {
        let credential = match self.inner.extractor.extract(request) {
            Ok(credential) => credential,
            Err(AuthError::MissingCredential) if self.inner.credentials_optional => {
                debug!("No credential found, continuing without identity");
                return Ok(None);
            }
            Err(e) => {
                debug!("Credential extraction failed: {}", e);
                return Err(e);
            }
        };
        match self.inner.parser.parse(&credential, request).await {
            Ok(identity) => {
                debug!("Credential from {} accepted", credential.lookup());
                Ok(Some(identity))
            }
            Err(e) => {
                debug!("Credential from {} rejected: {}", credential.lookup(), e);
                Err(e)
            }
        }
    }

    pub(crate) async fn authorize_request<ReqBody, ResBody>(
        &self,
        request: Request<ReqBody>,
        errors: &ErrorRouting<ResBody>,
    ) -> Result<Request<ReqBody>, Response<ResBody>>
    where
        ReqBody: Body + From<Bytes> + Send + 'static,
        ReqBody::Data: Send,
        ReqBody::Error: Into<BoxError>,
    {
        let (mut parts, body) = request.into_parts();
        if let Some(skipper) = &self.inner.skipper {
            if skipper(&parts) {
                debug!(
                    "Skipping authentication for {} {}",
                    parts.method,
                    parts.uri.path()
                );
                return Ok(Request::from_parts(parts, body));
            }
        }
        if let Some(before) = &self.inner.before {
            before(&parts);
        }

        let (body, form) = match self.read_form(&parts, body).await {
            Ok(read) => read,
            // The body is gone, so an ignored error cannot continue downstream.
            Err(error) => {
                let context = RequestContext::new(&parts, None);
                return Err(errors.reject(error, &context));
            }
        };

        let result = self
            .authenticate(&RequestContext::new(&parts, form.as_ref()))
            .await;
        match result {
            Ok(Some(identity)) => {
                parts.extensions.insert(identity);
                if let Some(on_success) = &self.inner.on_success {
                    on_success(&RequestContext::new(&parts, form.as_ref()));
                }
                Ok(Request::from_parts(parts, body))
            }
            Ok(None) => Ok(Request::from_parts(parts, body)),
            Err(error) => {
                let context = RequestContext::new(&parts, form.as_ref());
                match errors.route(error, &context, self.inner.continue_on_ignored_error) {
                    Some(response) => Err(response),
                    None => {
                        debug!("Error ignored, continuing without identity");
                        Ok(Request::from_parts(parts, body))
                    }
                }
            }
        }
    }

    /// Buffers urlencoded bodies when extraction reaches a `form:` lookup,
    /// i.e. no earlier lookup yielded a value.
    /// The returned body replays the buffered bytes.
    async fn read_form<ReqBody>(
        &self,
        parts: &Parts,
        body: ReqBody,
    ) -> Result<(ReqBody, Option<FormFields>), AuthError>
    where
        ReqBody: Body + From<Bytes> + Send + 'static,
        ReqBody::Data: Send,
        ReqBody::Error: Into<BoxError>,
    {
        let Some(lookup) = self.inner.extractor.form_lookup() else {
            return Ok((body, None));
        };
        if !is_urlencoded(parts)
            || !self
                .inner
                .extractor
                .reads_form(&RequestContext::new(parts, None))
        {
            return Ok((body, None));
        }
        match Limited::new(body, MAX_FORM_BODY_BYTES).collect().await {
            Ok(collected) => {
                let bytes = collected.to_bytes();
                let form = FormFields::parse(&bytes);
                Ok((ReqBody::from(bytes), Some(form)))
            }
            Err(e) => {
                warn!("Failed to read form body for {}: {}", lookup, e);
                Err(AuthError::MalformedCredential(lookup.clone()))
            }
        }
    }

    /// Returns a [tower layer](https://docs.rs/tower/latest/tower/trait.Layer.html)
    /// mapping failures with the [DefaultErrorHandler].
    pub fn into_layer<ResBody>(&self) -> JwtAuthLayer<ResBody, Identity>
    where
        ResBody: Default + Send + 'static,
    {
        JwtAuthLayer::new(self.clone(), self.default_routing())
    }

    /// Returns a [tower layer](https://docs.rs/tower/latest/tower/trait.Layer.html) that uses a custom [ErrorHandler] implementation.
    pub fn into_layer_with_error_handler<ResBody>(
        &self,
        error_handler: Arc<dyn ErrorHandler<ResBody>>,
    ) -> JwtAuthLayer<ResBody, Identity>
    where
        ResBody: Default + Send + 'static,
    {
        JwtAuthLayer::new(
            self.clone(),
            self.default_routing().with_handler(error_handler),
        )
    }

    /// Returns a [tower layer](https://docs.rs/tower/latest/tower/trait.Layer.html) that uses a [ContextErrorHandler].
    pub fn into_layer_with_context_error_handler<ResBody>(
        &self,
        error_handler: Arc<dyn ContextErrorHandler<ResBody>>,
    ) -> JwtAuthLayer<ResBody, Identity>
    where
        ResBody: Default + Send + 'static,
    {
        JwtAuthLayer::new(
            self.clone(),
            self.default_routing().with_context_handler(error_handler),
        )
    }

    /// Returns a [tower layer](https://docs.rs/tower/latest/tower/trait.Layer.html) that uses both
    /// kinds of handlers. The [ContextErrorHandler] is consulted first; when it ignores an error
    /// that may not continue, the default mapping applies.
    pub fn into_layer_with_error_handlers<ResBody>(
        &self,
        error_handler: Arc<dyn ErrorHandler<ResBody>>,
        context_error_handler: Arc<dyn ContextErrorHandler<ResBody>>,
    ) -> JwtAuthLayer<ResBody, Identity>
    where
        ResBody: Default + Send + 'static,
    {
        JwtAuthLayer::new(
            self.clone(),
            self.default_routing()
                .with_handler(error_handler)
                .with_context_handler(context_error_handler),
        )
    }

    fn default_routing<ResBody>(&self) -> ErrorRouting<ResBody>
    where
        ResBody: Default + Send + 'static,
    {
        ErrorRouting::new(Arc::new(DefaultErrorHandler::new(&self.inner.auth_scheme)))
    }
}

fn is_urlencoded(parts: &Parts) -> bool {
    parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| {
            mime.trim()
                .eq_ignore_ascii_case("application/x-www-form-urlencoded")
        })
}
