//! Interactive phone-shopping assistant.

pub mod message_handler;
pub mod tool_registry;
pub mod tools;

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::extract::ResultSanitizer;
use crate::shared::models::session::GREETING;
use crate::shared::{Config, InferenceClient};
use message_handler::{MessageHandler, TurnOutput};
use tool_registry::{QueryArgMapper, ToolRegistry};
use tools::{build_http_client, PhoneImagesTool, SerpApiClient, SerpSearchTool, WikiSpecsTool};

const EXIT_COMMANDS: &[&str] = &["exit", "quit"];
const RESET_COMMAND: &str = "/reset";

/// Register the search tools and their short aliases.
pub async fn build_registry(config: &Config, sanitizer: Arc<ResultSanitizer>) -> Result<ToolRegistry> {
    let http = build_http_client(config.http_timeout)?;
    let serpapi = SerpApiClient::new(http.clone(), config.serpapi_api_key.clone());
    let registry = ToolRegistry::new();

    registry
        .register_tool(Box::new(SerpSearchTool::new(serpapi.clone(), sanitizer.clone())))
        .await;
    registry
        .register_tool(Box::new(WikiSpecsTool::new(http, sanitizer.clone())))
        .await;
    registry
        .register_tool(Box::new(PhoneImagesTool::new(
            serpapi,
            sanitizer,
            config.max_images,
        )))
        .await;

    for (alias, target) in [
        ("search", "SerpSearch"),
        ("specs", "WikiSpecs"),
        ("images", "PhoneImages"),
    ] {
        registry
            .register_alias(alias, target, Some(Box::new(QueryArgMapper)))
            .await;
    }

    Ok(registry)
}

pub async fn run(config: Config) -> Result<()> {
    info!("Starting phonebot assistant...");
    config.log_summary();

    let sanitizer = Arc::new(
        ResultSanitizer::new().with_extra_terms(config.extra_denylist.iter()),
    );
    let registry = Arc::new(build_registry(&config, sanitizer.clone()).await?);
    info!("Available tools: {:?}", registry.list_tools().await);

    let model = Arc::new(InferenceClient::new(&config)?);
    let mut handler = MessageHandler::new(
        model,
        registry,
        sanitizer,
        config.max_tool_rounds,
        config.max_images,
    );

    println!("{}", GREETING);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        prompt()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted; ending session");
                println!();
                break;
            }
        };

        let Some(line) = line else {
            info!("Input closed; ending session");
            break;
        };
        let input = line.trim();

        if input.is_empty() {
            continue;
        }
        if EXIT_COMMANDS.iter().any(|cmd| input.eq_ignore_ascii_case(cmd)) {
            break;
        }
        if input.eq_ignore_ascii_case(RESET_COMMAND) {
            handler.reset();
            println!("{}", GREETING);
            continue;
        }

        let output = tokio::select! {
            output = handler.handle_turn(input) => output,
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted while answering; ending session");
                println!();
                break;
            }
        };
        println!("{}", render(&output));
    }

    info!("Phonebot assistant stopped");
    Ok(())
}

fn prompt() -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    write!(stdout, "> ")?;
    stdout.flush()
}

/// Reply text followed by an `Images:` block when there are any.
pub fn render(output: &TurnOutput) -> String {
    if output.images.is_empty() {
        return output.reply.clone();
    }
    let mut rendered = format!("{}\n\nImages:", output.reply);
    for url in &output.images {
        rendered.push('\n');
        rendered.push_str(url);
    }
    rendered
}
