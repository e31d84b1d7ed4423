use std::sync::Arc;

use http::{header::WWW_AUTHENTICATE, HeaderValue, Response, StatusCode};
use log::debug;

use crate::{context::RequestContext, error::AuthError};

/// Maps a failure to the response sent instead of calling the inner service.
pub trait ErrorHandler<B>: Send + Sync {
    fn map_error(&self, error: AuthError) -> Response<B>;
}

/// Like [ErrorHandler], but also sees the rejected request.
///
/// Takes precedence over an [ErrorHandler] when both are configured.
pub trait ContextErrorHandler<B>: Send + Sync {
    fn map_error(&self, error: AuthError, request: &RequestContext<'_>) -> ErrorAction<B>;
}

/// What a [ContextErrorHandler] decided.
#[derive(Debug)]
pub enum ErrorAction<B> {
    Respond(Response<B>),
    /// Let the request through without identity, provided the middleware was
    /// built with [continue_on_ignored_error](crate::builder::JwtAuthBuilder::continue_on_ignored_error).
    /// Otherwise the default mapping applies.
    Ignore,
}

/// `400` for extraction failures, `401` with a `WWW-Authenticate` challenge
/// for everything else.
pub struct DefaultErrorHandler {
    challenge: HeaderValue,
}

impl DefaultErrorHandler {
    pub fn new(auth_scheme: &str) -> Self {
        let scheme = if auth_scheme.is_empty() {
            "Bearer"
        } else {
            auth_scheme
        };
        Self {
            challenge: HeaderValue::from_str(scheme)
                .unwrap_or_else(|_| HeaderValue::from_static("Bearer")),
        }
    }
}

impl Default for DefaultErrorHandler {
    fn default() -> Self {
        Self::new("Bearer")
    }
}

impl<B> ErrorHandler<B> for DefaultErrorHandler
where
    B: Default,
{
    fn map_error(&self, error: AuthError) -> Response<B> {
        let status = error.status_code();
        let mut response = Response::new(B::default());
        *response.status_mut() = status;
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, self.challenge.clone());
        }
        response
    }
}

/// The handlers configured for a layer, consulted in order of precedence:
/// context aware handler, plain handler, default mapping.
pub(crate) struct ErrorRouting<B> {
    with_context: Option<Arc<dyn ContextErrorHandler<B>>>,
    handler: Option<Arc<dyn ErrorHandler<B>>>,
    default: Arc<dyn ErrorHandler<B>>,
}

impl<B> Clone for ErrorRouting<B> {
    fn clone(&self) -> Self {
        Self {
            with_context: self.with_context.clone(),
            handler: self.handler.clone(),
            default: self.default.clone(),
        }
    }
}

impl<B> ErrorRouting<B> {
    pub(crate) fn new(default: Arc<dyn ErrorHandler<B>>) -> Self {
        Self {
            with_context: None,
            handler: None,
            default,
        }
    }

    pub(crate) fn with_handler(mut self, handler: Arc<dyn ErrorHandler<B>>) -> Self {
        self.handler = Some(handler);
        self
    }

    pub(crate) fn with_context_handler(mut self, handler: Arc<dyn ContextErrorHandler<B>>) -> Self {
        self.with_context = Some(handler);
        self
    }

    /// `None` means the request continues downstream without identity.
    pub(crate) fn route(
        &self,
        error: AuthError,
        request: &RequestContext<'_>,
        continue_on_ignored_error: bool,
    ) -> Option<Response<B>> {
        let Some(with_context) = &self.with_context else {
            return Some(self.plain(error));
        };
        match with_context.map_error(error.clone(), request) {
            ErrorAction::Respond(response) => Some(response),
            ErrorAction::Ignore if continue_on_ignored_error => None,
            ErrorAction::Ignore => {
                debug!("Ignored error is not allowed to continue: {}", error);
                Some(self.default.map_error(error))
            }
        }
    }

    /// Like [route](ErrorRouting::route) for requests that cannot continue.
    pub(crate) fn reject(&self, error: AuthError, request: &RequestContext<'_>) -> Response<B> {
        self.route(error.clone(), request, false)
            .unwrap_or_else(|| self.default.map_error(error))
    }

    fn plain(&self, error: AuthError) -> Response<B> {
        match &self.handler {
            Some(handler) => handler.map_error(error),
            None => self.default.map_error(error),
        }
    }
}
