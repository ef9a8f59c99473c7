use std::sync::Arc;

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    Error, HttpMessage, ResponseError,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::matcher::RequestMatcher;
use crate::auth::token::{Claims, JwtHelper};
use crate::error::AppError;

/// Token-only authorization filter.
///
/// For every request: public URLs pass through untouched. Anything else has its
/// bearer token validated and, when valid, the decoded [`Claims`] attached to the
/// request extensions. A non-public request that ends up without claims is
/// rejected with 401 before it reaches a handler. No session is created or read.
#[derive(Clone)]
pub struct AuthMiddleware {
    public_urls: Arc<RequestMatcher>,
    tokens: Arc<JwtHelper>,
}

impl AuthMiddleware {
    pub fn new(public_urls: Arc<RequestMatcher>, tokens: Arc<JwtHelper>) -> Self {
        Self { public_urls, tokens }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            public_urls: Arc::clone(&self.public_urls),
            tokens: Arc::clone(&self.tokens),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    public_urls: Arc<RequestMatcher>,
    tokens: Arc<JwtHelper>,
}

impl<S> AuthMiddlewareService<S> {
    /// Decodes the bearer token, if any. Invalid tokens are logged and ignored.
    fn authenticate(&self, req: &ServiceRequest) -> Option<Claims> {
        let token = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))?;

        match self.tokens.validate(token.trim()) {
            Ok(claims) => Some(claims),
            Err(err) => {
                log::debug!(
                    "rejected token for {} {}: {}",
                    req.method(),
                    req.match_info().as_str(),
                    err
                );
                None
            }
        }
    }
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // Match on the decoded path the router dispatches on, not the raw URI.
        if self.public_urls.matches(req.method(), req.match_info().as_str()) {
            let fut = self.service.call(req);
            return Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) });
        }

        let authenticated = match self.authenticate(&req) {
            Some(claims) => {
                req.extensions_mut().insert(claims);
                true
            }
            None => false,
        };

        // Every non-public request must be authenticated.
        if !authenticated {
            let response = AppError::Unauthorized("Missing or invalid token".into())
                .error_response()
                .map_into_right_body();
            return Box::pin(async move { Ok(req.into_response(response)) });
        }

        let fut = self.service.call(req);
        Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
    }
}
