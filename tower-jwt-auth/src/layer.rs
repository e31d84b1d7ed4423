use bytes::Bytes;
use futures_util::{future::BoxFuture, Future};
use http::{Request, Response};
use http_body::Body;
use pin_project::pin_project;

use std::{
    pin::Pin,
    task::{ready, Context, Poll},
};
use tower::{BoxError, Layer, Service};

use crate::{error_handler::ErrorRouting, middleware::JwtAuth};

trait Authorize<ReqBody, ResBody> {
    type Future: Future<Output = Result<Request<ReqBody>, Response<ResBody>>>;

    fn authorize(&mut self, request: Request<ReqBody>) -> Self::Future;
}

impl<S, ReqBody, ResBody, Identity> Authorize<ReqBody, ResBody>
    for JwtAuthService<S, ResBody, Identity>
where
    Identity: Clone + Send + Sync + 'static,
    ReqBody: Body + From<Bytes> + Send + 'static,
    ReqBody::Data: Send,
    ReqBody::Error: Into<BoxError>,
    ResBody: Send + 'static,
{
    type Future = BoxFuture<'static, Result<Request<ReqBody>, Response<ResBody>>>;

    fn authorize(&mut self, request: Request<ReqBody>) -> Self::Future {
        let auth = self.auth.clone();
        let errors = self.errors.clone();
        Box::pin(async move { auth.authorize_request(request, &errors).await })
    }
}

pub struct JwtAuthLayer<ResBody, Identity> {
    auth: JwtAuth<Identity>,
    errors: ErrorRouting<ResBody>,
}

impl<ResBody, Identity> Clone for JwtAuthLayer<ResBody, Identity> {
    fn clone(&self) -> Self {
        Self {
            auth: self.auth.clone(),
            errors: self.errors.clone(),
        }
    }
}

impl<S, ResBody, Identity> Layer<S> for JwtAuthLayer<ResBody, Identity> {
    type Service = JwtAuthService<S, ResBody, Identity>;

    fn layer(&self, inner: S) -> Self::Service {
        JwtAuthService {
            inner,
            auth: self.auth.clone(),
            errors: self.errors.clone(),
        }
    }
}

impl<ResBody, Identity> JwtAuthLayer<ResBody, Identity> {
    pub(crate) fn new(auth: JwtAuth<Identity>, errors: ErrorRouting<ResBody>) -> Self {
        JwtAuthLayer { auth, errors }
    }
}

pub struct JwtAuthService<S, ResBody, Identity> {
    inner: S,
    auth: JwtAuth<Identity>,
    errors: ErrorRouting<ResBody>,
}

impl<S, ResBody, Identity> Clone for JwtAuthService<S, ResBody, Identity>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            auth: self.auth.clone(),
            errors: self.errors.clone(),
        }
    }
}

impl<S, ReqBody, ResBody, Identity> Service<Request<ReqBody>>
    for JwtAuthService<S, ResBody, Identity>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone,
    ResBody: Default + Send + 'static,
    Identity: Clone + Send + Sync + 'static,
    ReqBody: Body + From<Bytes> + Send + 'static,
    ReqBody::Data: Send,
    ReqBody::Error: Into<BoxError>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = ResponseFuture<S, ReqBody, ResBody, Identity>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        // Take the service that was driven to readiness, leave a fresh clone behind.
        let clone = self.inner.clone();
        let inner = std::mem::replace(&mut self.inner, clone);
        let authorize = self.authorize(request);

        ResponseFuture {
            state: State::Authorize { authorize },
            service: inner,
        }
    }
}

type AuthorizeFuture<S, ReqBody, ResBody, Identity> =
    <JwtAuthService<S, ResBody, Identity> as Authorize<ReqBody, ResBody>>::Future;

#[pin_project]
pub struct ResponseFuture<S, ReqBody, ResBody, Identity>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    Identity: Clone + Send + Sync + 'static,
    ReqBody: Body + From<Bytes> + Send + 'static,
    ReqBody::Data: Send,
    ReqBody::Error: Into<BoxError>,
    ResBody: Send + 'static,
{
    #[pin]
    state: State<AuthorizeFuture<S, ReqBody, ResBody, Identity>, S::Future>,
    service: S,
}

#[pin_project(project = StateProj)]
enum State<A, SFut> {
    Authorize {
        #[pin]
        authorize: A,
    },
    Authorized {
        #[pin]
        fut: SFut,
    },
}

impl<S, ReqBody, ResBody, Identity> Future for ResponseFuture<S, ReqBody, ResBody, Identity>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    Identity: Clone + Send + Sync + 'static,
    ReqBody: Body + From<Bytes> + Send + 'static,
    ReqBody::Data: Send,
    ReqBody::Error: Into<BoxError>,
    ResBody: Send + 'static,
{
    type Output = Result<Response<ResBody>, S::Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut this = self.project();

        loop {
            match this.state.as_mut().project() {
                StateProj::Authorize { authorize } => {
                    let auth = ready!(authorize.poll(cx));
                    match auth {
                        Ok(req) => {
                            let fut = this.service.call(req);
                            this.state.set(State::Authorized { fut })
                        }
                        Err(res) => {
                            return Poll::Ready(Ok(res));
                        }
                    };
                }
                StateProj::Authorized { fut } => {
                    return fut.poll(cx);
                }
            }
        }
    }
}
