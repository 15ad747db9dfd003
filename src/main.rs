use clap::Parser;
use colored::Colorize;
use tracing::error;

use shortener::config::{CliArgs, StaticConfig};
use shortener::runtime::modes::run_server;
use shortener::system::init_logging;

#[actix_web::main]
async fn main() {
    // .env 需在解析参数前加载，命令行参数可回退到环境变量
    dotenvy::dotenv().ok();
    let args = CliArgs::parse();

    if args.generate_config {
        println!("{}", StaticConfig::generate_sample_config());
        return;
    }

    let config = match StaticConfig::from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e.format_colored());
            std::process::exit(1);
        }
    };

    let _guard = match init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{}", e.format_colored());
            std::process::exit(1);
        }
    };

    if let Err(e) = run_server(&config).await {
        error!("Server exited with error: {:#}", e);
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
