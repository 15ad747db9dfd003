use actix_web::{HttpResponse, Responder, web};
use tracing::debug;

use super::{AppState, error_response};
use crate::api::middleware::CurrentUser;
use crate::errors::ShortenerError;

pub struct UserUrlsService;

impl UserUrlsService {
    /// `GET /api/user/urls`: 204 when the user has nothing yet.
    pub async fn list(state: web::Data<AppState>, user: CurrentUser) -> impl Responder {
        match state.controller.user_links(&user.0).await {
            Ok(links) if !links.is_empty() => HttpResponse::Ok().json(links),
            Ok(_) | Err(ShortenerError::NotFound(_)) => {
                debug!("No links for {}", user.0);
                HttpResponse::NoContent().finish()
            }
            Err(e) => error_response(&e),
        }
    }

    /// `DELETE /api/user/urls` with a JSON array of ids.
    pub async fn delete(
        state: web::Data<AppState>,
        user: CurrentUser,
        body: web::Bytes,
    ) -> impl Responder {
        let ids: Vec<u64> = match serde_json::from_slice(&body) {
            Ok(ids) => ids,
            Err(e) => {
                return error_response(&ShortenerError::malformed_request(format!(
                    "JSON is incorrect: {}",
                    e
                )));
            }
        };

        match state.controller.delete(&user.0, ids).await {
            Ok(_) => HttpResponse::Accepted().finish(),
            Err(e) => error_response(&e),
        }
    }
}

pub fn user_urls_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/user/urls")
            .route(web::get().to(UserUrlsService::list))
            .route(web::delete().to(UserUrlsService::delete)),
    );
}
