use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, web};
use tracing::{debug, trace};

use super::{AppState, error_response};
use crate::api::middleware::CurrentUser;
use crate::errors::ShortenerError;
use crate::services::Resolved;

pub struct RedirectService;

impl RedirectService {
    /// `GET /{code}`: 307 to the original URL, 410 once deleted.
    pub async fn handle_redirect(
        state: web::Data<AppState>,
        user: CurrentUser,
        path: web::Path<String>,
    ) -> impl Responder {
        let code = path.into_inner();

        match state.controller.resolve(&user.0, &code).await {
            Ok(Resolved::Found(url)) => {
                trace!("Redirecting {} -> {}", code, url);
                HttpResponse::TemporaryRedirect()
                    .insert_header(("Location", url))
                    .finish()
            }
            Ok(Resolved::Gone) => {
                debug!("Link {} is deleted", code);
                HttpResponse::build(StatusCode::GONE)
                    .insert_header(("Content-Type", "text/plain; charset=utf-8"))
                    .body("Deleted")
            }
            Err(ShortenerError::NotFound(_)) => {
                debug!("Link {} not found for {}", code, user.0);
                Self::not_found_response()
            }
            Err(e) => error_response(&e),
        }
    }

    #[inline]
    fn not_found_response() -> HttpResponse {
        HttpResponse::build(StatusCode::NOT_FOUND)
            .insert_header(("Content-Type", "text/plain; charset=utf-8"))
            .body("Not Found")
    }
}

pub fn redirect_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/{code}", web::get().to(RedirectService::handle_redirect));
}
