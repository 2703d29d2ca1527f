use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use event_page::config::{self, Config};
use event_page::error::PageError;
use event_page::state::AppState;
use event_page::templates::EventTemplate;
use event_page::{build_renderer, logging, router};

use askama::Template;

#[derive(Parser)]
#[command(name = "event-page")]
#[command(about = "Serves event detail pages from the content lake")]
#[command(version)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Port to listen on (overrides config and PORT)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Render one event page to stdout
    Render {
        /// Event slug
        slug: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let mut config = Config::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    let _guard = logging::init_logging(&config.logging);

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(config).await
        }
        Commands::Render { slug } => render(config, &slug).await,
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let renderer = build_renderer(&config).context("configuring content client")?;
    let app = router::app_router(AppState::new(renderer));

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;

    info!(
        addr = %bind_addr,
        project = %config.content.project_id,
        dataset = %config.content.dataset,
        "event page server listening"
    );
    axum::serve(listener, app).await?;
    Ok(())
}

async fn render(config: Config, slug: &str) -> anyhow::Result<()> {
    let renderer = build_renderer(&config).context("configuring content client")?;
    match renderer.render(slug).await {
        Ok(page) => {
            let html = EventTemplate { event: page.view }.render()?;
            println!("{html}");
            Ok(())
        }
        Err(PageError::NotFound(slug)) => {
            error!(%slug, "event not found");
            anyhow::bail!("no event found for slug `{slug}`")
        }
        Err(err) => Err(err).context("fetching event"),
    }
}
