use tonic::Status;
use tracing::error;

use crate::errors::ShortenerError;

impl From<ShortenerError> for Status {
    fn from(err: ShortenerError) -> Self {
        match err {
            e if e.is_client_error() => Status::invalid_argument(e.message()),
            ShortenerError::NotFound(msg) => Status::not_found(msg),
            ShortenerError::CodeSpaceExhausted(msg) => Status::resource_exhausted(msg),
            ShortenerError::PoolClosed(msg) => Status::unavailable(msg),
            // 服务端错误不向调用方暴露细节
            e => {
                error!("RPC request failed: {}", e);
                Status::internal("Internal Server Error")
            }
        }
    }
}
