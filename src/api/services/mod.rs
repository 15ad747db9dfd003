//! HTTP handlers
//!
//! Handlers only parse requests and map controller outcomes to status codes;
//! all rules live in [`crate::services::LinkController`].

pub mod internal;
pub mod redirect;
pub mod shorten;
pub mod user_urls;

use actix_web::{HttpResponse, http::StatusCode, web};
use tracing::error;

use crate::errors::ShortenerError;
use crate::services::LinkController;
use crate::utils::ip::TrustedSubnet;

pub use internal::{InternalService, internal_routes};
pub use redirect::{RedirectService, redirect_routes};
pub use shorten::{ShortenService, shorten_routes};
pub use user_urls::{UserUrlsService, user_urls_routes};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub controller: LinkController,
    pub trusted_subnet: Option<TrustedSubnet>,
}

/// Register every route. Catch-all `/{code}` goes last.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(internal_routes)
        .configure(user_urls_routes)
        .configure(shorten_routes)
        .configure(redirect_routes);
}

pub fn status_for(err: &ShortenerError) -> StatusCode {
    match err {
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        ShortenerError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Plain-text error body; server-side failures are logged and not leaked.
pub fn error_response(err: &ShortenerError) -> HttpResponse {
    let status = status_for(err);
    let body = if status.is_server_error() {
        error!("Request failed: {}", err);
        "Internal Server Error".to_string()
    } else {
        err.message().to_string()
    };
    HttpResponse::build(status)
        .insert_header(("Content-Type", "text/plain; charset=utf-8"))
        .body(body)
}
