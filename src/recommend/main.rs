use anyhow::Result;
use clap::Parser;

use phonebot::recommend;
use phonebot::shared::config::ConfigArgs;
use phonebot::shared::{logging, Config};

#[derive(Parser)]
#[command(name = "phonebot-recommend")]
#[command(about = "Phonebot - pick phones from the catalog for a shopping request")]
struct Args {
    /// What the shopper is looking for, e.g. "camera phone under 20000"
    #[arg(required = true, num_args = 1..)]
    request: Vec<String>,

    /// Filter the catalog locally by budget instead of asking the model
    #[arg(long)]
    offline: bool,

    #[command(flatten)]
    config: ConfigArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize service logging
    let _ = logging::init_service_logging(&args.config.log_dir, "phonebot_recommend");

    let request = args.request.join(" ");
    let config = Config::from_args(args.config)?;
    recommend::run(config, &request, args.offline).await
}
