//! Serverless entrypoint: reads one function event as JSON on stdin and
//! writes the function response as JSON on stdout. Logs go to stderr.

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use catalog_api::adapters::function::{FunctionEvent, FunctionRoute, FunctionRuntime};

#[derive(Parser, Debug)]
#[command(name = "catalog-function")]
#[command(about = "Handle one editor request delivered as a function event")]
struct Cli {
    /// Editor operation this deployment serves
    #[arg(long, value_enum, default_value_t = FunctionRoute::Commit, env = "FUNCTION_ROUTE")]
    route: FunctionRoute,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "catalog_api=info,catalog_sync=info,catalog_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let runtime = FunctionRuntime::from_env();

    let mut raw = String::new();
    tokio::io::stdin()
        .read_to_string(&mut raw)
        .await
        .context("Failed to read event from stdin")?;
    let event: FunctionEvent = serde_json::from_str(&raw).context("Malformed function event")?;

    let response = runtime.invoke(cli.route, &event).await;
    tracing::info!(status = response.status_code, route = ?cli.route, "Function invocation finished");

    let mut out = serde_json::to_vec(&response)?;
    out.push(b'\n');
    let mut stdout = tokio::io::stdout();
    stdout.write_all(&out).await?;
    stdout.flush().await?;
    Ok(())
}
