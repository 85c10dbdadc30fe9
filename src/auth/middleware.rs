use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage, ResponseError,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;
use std::sync::Arc;

use crate::auth::extractors::bearer_token;
use crate::auth::identity::IdentityProvider;

/// Resolves the caller's identity through an `IdentityProvider` before the
/// wrapped service runs, and stores the resulting `UserInfo` in the request
/// extensions for the `VerifiedUser` extractor.
///
/// Requests without a usable bearer token, or whose token the provider rejects,
/// are answered directly with the provider's error.
#[derive(Clone)]
pub struct IdentityMiddleware {
    provider: Arc<dyn IdentityProvider>,
}

impl IdentityMiddleware {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }
}

impl<S, B> Transform<S, ServiceRequest> for IdentityMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = IdentityMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(IdentityMiddlewareService {
            service: Rc::new(service),
            provider: Arc::clone(&self.provider),
        }))
    }
}

pub struct IdentityMiddlewareService<S> {
    service: Rc<S>,
    provider: Arc<dyn IdentityProvider>,
}

impl<S, B> Service<ServiceRequest> for IdentityMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let provider = Arc::clone(&self.provider);

        Box::pin(async move {
            let token = bearer_token(req.headers()).map(str::to_string);
            let token = match token {
                Ok(token) => token,
                Err(app_err) => {
                    let response = app_err.error_response();
                    return Ok(req.into_response(response).map_into_right_body());
                }
            };

            match provider.introspect(&token).await {
                Ok(user) => {
                    req.extensions_mut().insert(user);
                    service
                        .call(req)
                        .await
                        .map(ServiceResponse::map_into_left_body)
                }
                Err(app_err) => {
                    let response = app_err.error_response();
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}
