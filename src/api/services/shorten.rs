use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, web};
use tracing::trace;

use super::{AppState, error_response};
use crate::api::middleware::CurrentUser;
use crate::errors::ShortenerError;
use crate::services::{ApiResult, BatchItem, CreateOutcome};

fn outcome_status(outcome: &CreateOutcome) -> StatusCode {
    if outcome.is_created() {
        StatusCode::CREATED
    } else {
        StatusCode::CONFLICT
    }
}

pub struct ShortenService;

impl ShortenService {
    /// `POST /` with the URL as a plain-text body.
    pub async fn create_short(
        state: web::Data<AppState>,
        user: CurrentUser,
        body: web::Bytes,
    ) -> impl Responder {
        let url = match std::str::from_utf8(&body) {
            Ok(url) => url,
            Err(e) => {
                return error_response(&ShortenerError::invalid_input(format!(
                    "Body is not valid UTF-8: {}",
                    e
                )));
            }
        };
        trace!("Plain create request from {}: {}", user.0, url);

        match state.controller.create_short(&user.0, url).await {
            Ok(outcome) => HttpResponse::build(outcome_status(&outcome))
                .insert_header(("Content-Type", "text/plain; charset=utf-8"))
                .body(outcome.short_url().to_string()),
            Err(e) => error_response(&e),
        }
    }

    /// `POST /api/shorten` with `{"url": ...}`.
    pub async fn api_create_short(
        state: web::Data<AppState>,
        user: CurrentUser,
        body: web::Bytes,
    ) -> impl Responder {
        match state.controller.api_create_short(&user.0, &body).await {
            Ok(outcome) => HttpResponse::build(outcome_status(&outcome)).json(ApiResult {
                result: outcome.short_url().to_string(),
            }),
            Err(e) => error_response(&e),
        }
    }

    /// `POST /api/shorten/batch`
    pub async fn bunch_save_json(
        state: web::Data<AppState>,
        user: CurrentUser,
        body: web::Bytes,
    ) -> impl Responder {
        let items: Vec<BatchItem> = match serde_json::from_slice(&body) {
            Ok(items) => items,
            Err(e) => {
                return error_response(&ShortenerError::malformed_request(format!(
                    "JSON is incorrect: {}",
                    e
                )));
            }
        };

        match state.controller.bunch_save_json(&user.0, items).await {
            Ok(saved) => HttpResponse::Created().json(saved),
            Err(e) => error_response(&e),
        }
    }
}

pub fn shorten_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::post().to(ShortenService::create_short))
        .route("/api/shorten", web::post().to(ShortenService::api_create_short))
        .route("/api/shorten/batch", web::post().to(ShortenService::bunch_save_json));
}
