/// Generates the gRPC server and client for `proto/shortener.proto`.
///
/// The output is included by `src/rpc/mod.rs` via
/// `tonic::include_proto!("shortener")`.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=proto/shortener.proto");

    let config = tonic_prost_build::Config::new();
    tonic_prost_build::configure().compile_with_config(
        config,
        &["proto/shortener.proto"],
        &["proto"],
    )?;
    Ok(())
}
