use actix_web::{HttpRequest, HttpResponse, Responder, web};
use tracing::{error, warn};

use super::{AppState, error_response};

pub struct InternalService;

impl InternalService {
    /// `GET /api/internal/stats`, only for `X-Real-IP` inside the trusted subnet.
    pub async fn stats(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
        let real_ip = req.headers().get("X-Real-IP").and_then(|v| v.to_str().ok());

        let allowed = state
            .trusted_subnet
            .as_ref()
            .is_some_and(|subnet| subnet.allows(real_ip));
        if !allowed {
            warn!("Stats request rejected for X-Real-IP {:?}", real_ip);
            return HttpResponse::Forbidden().finish();
        }

        match state.controller.stats().await {
            Ok(stats) => HttpResponse::Ok().json(stats),
            Err(e) => error_response(&e),
        }
    }

    /// `GET /ping`: storage reachability.
    pub async fn ping(state: web::Data<AppState>) -> impl Responder {
        match state.controller.ping().await {
            Ok(()) => HttpResponse::Ok().finish(),
            Err(e) => {
                error!("Ping failed: {}", e);
                HttpResponse::InternalServerError().finish()
            }
        }
    }
}

pub fn internal_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/ping", web::get().to(InternalService::ping))
        .route("/api/internal/stats", web::get().to(InternalService::stats));
}
