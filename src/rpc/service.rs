use tonic::metadata::{Ascii, MetadataValue};
use tonic::{Request, Response, Status};
use tracing::{debug, trace, warn};

use super::proto::shortener_server::Shortener;
use super::proto::{
    BatchShortLink, BunchSaveRequest, BunchSaveResponse, CodeRequest, DeleteRequest, Empty,
    StatsResponse, UrlRequest, UrlResponse, UserLink, UserShortsResponse,
};
use crate::api::services::AppState;
use crate::errors::ShortenerError;
use crate::services::{BatchItem, CreateOutcome, LinkController, Resolved};
use crate::storage::User;
use crate::utils::ip::TrustedSubnet;

/// Request metadata key carrying the caller's user id.
pub const USER_METADATA_KEY: &str = "user_id";
/// Request metadata key checked against the trusted subnet by `Stats`.
pub const REAL_IP_METADATA_KEY: &str = "x-real-ip";

/// `Shortener` service over a [`LinkController`].
#[derive(Clone)]
pub struct ShortenerRpc {
    controller: LinkController,
    trusted_subnet: Option<TrustedSubnet>,
}

impl ShortenerRpc {
    pub fn new(controller: LinkController, trusted_subnet: Option<TrustedSubnet>) -> Self {
        Self {
            controller,
            trusted_subnet,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(state.controller.clone(), state.trusted_subnet)
    }
}

fn user_of<T>(request: &Request<T>) -> User {
    request
        .metadata()
        .get(USER_METADATA_KEY)
        .and_then(|v| v.to_str().ok())
        .filter(|id| !id.is_empty())
        .map(User::new)
        .unwrap_or_default()
}

fn user_value(user: &User) -> Option<MetadataValue<Ascii>> {
    user.as_str().parse().ok()
}

/// Successful reply with the resolved user echoed in the metadata.
fn reply<T>(user: &User, message: T) -> Result<Response<T>, Status> {
    let mut response = Response::new(message);
    if let Some(value) = user_value(user) {
        response.metadata_mut().insert(USER_METADATA_KEY, value);
    }
    Ok(response)
}

fn reject(user: &User, status: impl Into<Status>) -> Status {
    let mut status = status.into();
    if let Some(value) = user_value(user) {
        status.metadata_mut().insert(USER_METADATA_KEY, value);
    }
    status
}

/// `Conflict` is not an error for the controller, but gRPC has no body on a
/// non-OK status: the existing short URL travels as the status message.
fn created_or_conflict(
    user: &User,
    outcome: CreateOutcome,
) -> Result<Response<UrlResponse>, Status> {
    match outcome {
        CreateOutcome::Created(url) => reply(user, UrlResponse { url }),
        CreateOutcome::Conflict(url) => Err(reject(user, Status::already_exists(url))),
    }
}

#[tonic::async_trait]
impl Shortener for ShortenerRpc {
    async fn create_short(
        &self,
        request: Request<UrlRequest>,
    ) -> Result<Response<UrlResponse>, Status> {
        let user = user_of(&request);
        let url = request.into_inner().url;
        trace!("RPC create request from {}: {}", user, url);

        let outcome = self
            .controller
            .create_short(&user, &url)
            .await
            .map_err(|e| reject(&user, e))?;
        created_or_conflict(&user, outcome)
    }

    async fn api_create_short(
        &self,
        request: Request<UrlRequest>,
    ) -> Result<Response<UrlResponse>, Status> {
        let user = user_of(&request);
        let url = request.into_inner().url;
        if url.trim().is_empty() {
            return Err(reject(&user, ShortenerError::malformed_request("URL is empty")));
        }

        let outcome = self
            .controller
            .create_short(&user, &url)
            .await
            .map_err(|e| reject(&user, e))?;
        created_or_conflict(&user, outcome)
    }

    async fn bunch_save_json(
        &self,
        request: Request<BunchSaveRequest>,
    ) -> Result<Response<BunchSaveResponse>, Status> {
        let user = user_of(&request);
        let items: Vec<BatchItem> = request
            .into_inner()
            .links
            .into_iter()
            .map(|link| BatchItem {
                correlation_id: link.correlation_id,
                original_url: link.original_url,
            })
            .collect();
        debug!("RPC batch of {} rows from {}", items.len(), user);

        let saved = self
            .controller
            .bunch_save_json(&user, items)
            .await
            .map_err(|e| reject(&user, e))?;
        let links = saved
            .into_iter()
            .map(|view| BatchShortLink {
                correlation_id: view.correlation_id,
                short_url: view.short_url,
            })
            .collect();
        reply(&user, BunchSaveResponse { links })
    }

    async fn get_short(
        &self,
        request: Request<CodeRequest>,
    ) -> Result<Response<UrlResponse>, Status> {
        let user = user_of(&request);
        let code = request.into_inner().code;

        match self.controller.resolve(&user, &code).await {
            Ok(Resolved::Found(url)) => reply(&user, UrlResponse { url }),
            Ok(Resolved::Gone) => Err(reject(
                &user,
                Status::failed_precondition(format!("Link '{}' has been deleted", code)),
            )),
            Err(e) => Err(reject(&user, e)),
        }
    }

    async fn get_user_shorts(
        &self,
        request: Request<Empty>,
    ) -> Result<Response<UserShortsResponse>, Status> {
        let user = user_of(&request);
        let links = match self.controller.user_links(&user).await {
            Ok(links) => links,
            Err(ShortenerError::NotFound(_)) => Vec::new(),
            Err(e) => return Err(reject(&user, e)),
        };

        let links = links
            .into_iter()
            .map(|link| UserLink {
                id: link.id,
                short_url: link.short_url,
                original_url: link.original_url,
            })
            .collect();
        reply(&user, UserShortsResponse { links })
    }

    async fn delete(&self, request: Request<DeleteRequest>) -> Result<Response<Empty>, Status> {
        let user = user_of(&request);
        let ids = request.into_inner().ids;

        self.controller
            .delete(&user, ids)
            .await
            .map_err(|e| reject(&user, e))?;
        reply(&user, Empty {})
    }

    async fn stats(&self, request: Request<Empty>) -> Result<Response<StatsResponse>, Status> {
        let real_ip = request
            .metadata()
            .get(REAL_IP_METADATA_KEY)
            .and_then(|v| v.to_str().ok());
        let allowed = self
            .trusted_subnet
            .as_ref()
            .is_some_and(|subnet| subnet.allows(real_ip));
        if !allowed {
            warn!("RPC stats request rejected for real IP {:?}", real_ip);
            return Err(Status::permission_denied("Forbidden"));
        }

        let stats = self.controller.stats().await?;
        Ok(Response::new(StatsResponse {
            urls: stats.urls as u64,
            users: stats.users as u64,
        }))
    }

    async fn ping(&self, _request: Request<Empty>) -> Result<Response<Empty>, Status> {
        self.controller.ping().await?;
        Ok(Response::new(Empty {}))
    }
}
