use clap::{Parser, Subcommand};
use utils::version;

use crate::config::serve::ServeArgs;

#[derive(Parser)]
#[command(about, long_about, version = &**version::VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the admission webhook server
    Serve(Box<ServeArgs>),
    /// Print the effective webhook and device configuration as YAML
    #[command(name = "print-config")]
    PrintConfig(Box<ServeArgs>),
}
