use bytes::Bytes;
use http::{HeaderName, Request, Response, StatusCode};
use http_body_util::Full;
use serde_json::Value;
use tower::BoxError;
use tower_jwt_auth::{
    claims::VerifiedToken,
    context::RequestContext,
    error::AuthError,
    error_handler::{ContextErrorHandler, ErrorAction, ErrorHandler},
};

pub async fn echo(req: Request<Full<Bytes>>) -> Result<Response<Full<Bytes>>, BoxError> {
    let b = req.into_body();
    let mut response = Response::new(b);
    *response.status_mut() = StatusCode::OK;
    Ok(response)
}

/// Responds with the `name` claim of the stored token, or `anonymous`.
pub async fn echo_name(req: Request<Full<Bytes>>) -> Result<Response<Full<Bytes>>, BoxError> {
    let name = req
        .extensions()
        .get::<VerifiedToken>()
        .and_then(|token| token.claim("name"))
        .and_then(Value::as_str)
        .unwrap_or("anonymous")
        .to_owned();
    Ok(Response::new(Full::new(name.into())))
}

pub async fn teapot(_req: Request<Full<Bytes>>) -> Result<Response<Full<Bytes>>, BoxError> {
    Ok(Response::builder()
        .status(StatusCode::IM_A_TEAPOT)
        .body(Full::default())
        .unwrap())
}

pub fn request_with_headers(headers: Vec<(HeaderName, &str)>) -> Request<Full<Bytes>> {
    request_to("/", headers)
}

pub fn request_to(uri: &str, headers: Vec<(HeaderName, &str)>) -> Request<Full<Bytes>> {
    let mut request = Request::get(uri);
    let request_headers = request.headers_mut().unwrap();
    headers.into_iter().for_each(|(name, value)| {
        request_headers.append(name, value.parse().unwrap());
    });
    request.body(Full::<Bytes>::default()).unwrap()
}

pub struct DetailedErrorHandler {}

impl ErrorHandler<Full<Bytes>> for DetailedErrorHandler {
    fn map_error(&self, error: AuthError) -> Response<Full<Bytes>> {
        Response::builder()
            .status(StatusCode::UNAUTHORIZED)
            .body(Full::new(error.to_string().into()))
            .unwrap()
    }
}

pub struct TeapotErrorHandler {}

impl ErrorHandler<Full<Bytes>> for TeapotErrorHandler {
    fn map_error(&self, error: AuthError) -> Response<Full<Bytes>> {
        Response::builder()
            .status(StatusCode::IM_A_TEAPOT)
            .body(Full::new(error.to_string().into()))
            .unwrap()
    }
}

/// Answers `418` with the path of the rejected request, or ignores
/// failures to locate a credential.
pub struct TeapotContextErrorHandler {
    pub ignore_missing: bool,
}

impl ContextErrorHandler<Full<Bytes>> for TeapotContextErrorHandler {
    fn map_error(
        &self,
        error: AuthError,
        request: &RequestContext<'_>,
    ) -> ErrorAction<Full<Bytes>> {
        if self.ignore_missing && error == AuthError::MissingCredential {
            return ErrorAction::Ignore;
        }
        ErrorAction::Respond(
            Response::builder()
                .status(StatusCode::IM_A_TEAPOT)
                .body(Full::new(request.parts().uri.path().to_owned().into()))
                .unwrap(),
        )
    }
}
