use anyhow::Result;
use clap::Parser;
use gpu_webhook::cmd::run_print_config;
use gpu_webhook::cmd::run_serve;
use gpu_webhook::config::Cli;
use gpu_webhook::config::Commands;

/// Sets up global panic hooks.
fn setup_global_hooks() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        default_hook(panic_info);
        tracing::error!("Thread panicked: {}", panic_info);
    }));
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_global_hooks();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(serve_args) => run_serve(*serve_args).await,
        Commands::PrintConfig(serve_args) => run_print_config(*serve_args),
    }
}
