//! Identity middleware
//!
//! 从 Cookie 中解析签名的用户 ID；缺失或校验失败时分配新的 UUID 用户。
//! 每个响应都会重新下发 Cookie，用户写入 request extensions。

use std::future::{Ready, ready};
use std::rc::Rc;
use std::sync::Arc;

use actix_service::{Service, Transform};
use actix_web::{
    Error, FromRequest, HttpMessage, HttpRequest,
    cookie::{Cookie, SameSite, time::Duration as CookieDuration},
    dev::{Payload, ServiceRequest, ServiceResponse},
};
use futures_util::future::LocalBoxFuture;
use tracing::{debug, error};
use uuid::Uuid;

use crate::api::jwt::JwtService;
use crate::storage::User;

/// Extractor for the user the request runs as. Falls back to the default
/// user when the identity middleware is not installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn into_inner(self) -> User {
        self.0
    }
}

impl FromRequest for CurrentUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user = req.extensions().get::<User>().cloned().unwrap_or_default();
        ready(Ok(CurrentUser(user)))
    }
}

#[derive(Clone)]
pub struct IdentityMiddleware {
    jwt: Arc<JwtService>,
    cookie_name: Rc<str>,
}

impl IdentityMiddleware {
    pub fn new(jwt: Arc<JwtService>, cookie_name: &str) -> Self {
        Self {
            jwt,
            cookie_name: Rc::from(cookie_name),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for IdentityMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = IdentityService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(IdentityService {
            service: Rc::new(service),
            jwt: Arc::clone(&self.jwt),
            cookie_name: Rc::clone(&self.cookie_name),
        }))
    }
}

pub struct IdentityService<S> {
    service: Rc<S>,
    jwt: Arc<JwtService>,
    cookie_name: Rc<str>,
}

impl<S> IdentityService<S> {
    fn resolve_user(&self, req: &ServiceRequest) -> User {
        match req.cookie(&self.cookie_name) {
            Some(cookie) => match self.jwt.validate(cookie.value()) {
                Ok(user) => user,
                Err(e) => {
                    debug!("Identity cookie rejected: {}", e);
                    User::new(Uuid::new_v4().to_string())
                }
            },
            None => User::new(Uuid::new_v4().to_string()),
        }
    }
}

impl<S, B> Service<ServiceRequest> for IdentityService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    actix_service::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = Rc::clone(&self.service);
        let user = self.resolve_user(&req);
        let token = self.jwt.issue(&user);
        let cookie_name = self.cookie_name.to_string();
        let max_age = CookieDuration::days(self.jwt.token_ttl_days() as i64);
        req.extensions_mut().insert(user);

        Box::pin(async move {
            let mut response = srv.call(req).await?;

            match token {
                Ok(token) => {
                    let cookie = Cookie::build(cookie_name, token)
                        .path("/")
                        .http_only(true)
                        .same_site(SameSite::Lax)
                        .max_age(max_age)
                        .finish();
                    if let Err(e) = response.response_mut().add_cookie(&cookie) {
                        error!("Failed to set identity cookie: {}", e);
                    }
                }
                Err(e) => error!("Failed to sign identity token: {}", e),
            }
            Ok(response)
        })
    }
}
