use anyhow::Result;
use clap::Parser;

use phonebot::assistant;
use phonebot::shared::config::ConfigArgs;
use phonebot::shared::{logging, Config};

#[derive(Parser)]
#[command(name = "phonebot-assistant")]
#[command(about = "Phonebot - chat about smartphone prices, specs and images in India")]
struct Args {
    #[command(flatten)]
    config: ConfigArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize service logging
    let _ = logging::init_service_logging(&args.config.log_dir, "phonebot_assistant");

    let config = Config::from_args(args.config)?;
    assistant::run(config).await
}
