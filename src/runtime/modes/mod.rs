pub mod grpc;
pub mod server;

pub use grpc::spawn_grpc_server;
pub use server::run_server;
