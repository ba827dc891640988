//! `bundle-tool <asset> <position> <rotation> <scale> <texture|undefined> <icon|undefined>`
//!
//! Run with the project directory as working directory.

use std::process::ExitCode;

use hatbundle_server::tool::{self, ToolContext};

fn main() -> ExitCode {
    // stderr is read back by the server as build diagnostics
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hatbundle_server=info".into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    let ctx = match ToolContext::from_env() {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::error!("cannot determine project directory: {e}");
            return ExitCode::FAILURE;
        }
    };

    match tool::run(&ctx, &args) {
        Ok(output) => {
            tracing::info!("AssetBundle generated at {}", output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("bundle build failed: {e}");
            ExitCode::FAILURE
        }
    }
}
