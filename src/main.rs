use clap::Parser;
use console::style;

use guata::cli::{run, Cli};
use guata::observability::init_logging;

#[tokio::main]
async fn main() {
    init_logging();
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("{} {e}", style("error:").red().bold());
        std::process::exit(1);
    }
}
