mod boomerang;
mod output;

use boomerang::Application;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

const VERSION: &str = concat!(env!("BOOMERANG_VERSION"), " ", env!("BOOMERANG_BUILD_HASH"));

/// Run a list of commands on many machines over SSH and collect the
/// results as JSON.
#[derive(Debug, Parser)]
#[command(name = "boomerang", version = VERSION, about)]
struct Arguments {
    /// Run configuration file
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Host inventory file or http(s) URL, overriding the config
    #[arg(short, long)]
    inventory: Option<String>,

    /// Report directory, overriding the config
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let arguments = Arguments::parse();
    init_tracing(arguments.verbose);

    let application = Application::new(arguments.config, arguments.inventory, arguments.output_dir);
    match application.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", fleet::error_chain(&e).join(": "));
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
