//! browser-scrape MCP Server
//!
//! Serves the scraping tools (`browser_navigate`, `browser_scrape`,
//! `browser_extract`) to MCP clients over stdio, SSE or streamable HTTP.

use browser_scrape::browser::{BrowserSession, ConnectionOptions, LaunchOptions, ProxyPool};
use browser_scrape::config::ScraperConfig;
use browser_scrape::mcp::BrowserServer;
use clap::{Parser, ValueEnum};
use rmcp::{ServiceExt,
           transport::{sse_server::{SseServer, SseServerConfig},
                       stdio,
                       streamable_http_server::{StreamableHttpService, session::local::LocalSessionManager}}};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Transport {
    /// Standard input/output transport (default)
    Stdio,
    /// Server-Sent Events transport
    Sse,
    /// HTTP streamable transport
    Http,
}

#[derive(Parser)]
#[command(name = "mcp-server")]
#[command(version)]
#[command(about = "Scraping MCP server", long_about = None)]
struct Cli {
    /// Launch browser in headed mode (overrides HEADLESS)
    #[arg(long, short = 'H')]
    headed: bool,

    /// Path to custom browser executable
    #[arg(long, value_name = "PATH")]
    executable_path: Option<PathBuf>,

    /// WebSocket endpoint URL of an already running browser
    #[arg(long, value_name = "URL")]
    ws_endpoint: Option<String>,

    /// Persistent browser profile directory
    #[arg(long, value_name = "DIR")]
    user_data_dir: Option<PathBuf>,

    /// Transport type to use
    #[arg(long, short = 't', value_enum, default_value = "stdio")]
    transport: Transport,

    /// Port for SSE or HTTP transport
    #[arg(long, short = 'p', default_value = "3000")]
    port: u16,

    /// SSE endpoint path
    #[arg(long, default_value = "/sse")]
    sse_path: String,

    /// SSE POST path for messages
    #[arg(long, default_value = "/message")]
    sse_post_path: String,

    /// HTTP streamable endpoint path
    #[arg(long, default_value = "/mcp")]
    http_path: String,
}

/// Launch options from the environment configuration and command-line flags.
///
/// The session keeps one proxy for its lifetime: the first usable `PROXY_LIST` entry.
fn launch_options(cli: &Cli, config: &ScraperConfig) -> browser_scrape::Result<LaunchOptions> {
    let proxy = ProxyPool::from_config(config)?.next_proxy();
    let mut options = LaunchOptions::from_config(config).proxy(proxy);
    if cli.headed {
        options = options.headless(false);
    }
    if let Some(path) = &cli.executable_path {
        options = options.chrome_path(path.clone());
    }
    if let Some(dir) = &cli.user_data_dir {
        options = options.user_data_dir(dir.clone());
    }
    Ok(options)
}

/// One server whose browser session is shared by every connection
fn build_server(cli: &Cli) -> browser_scrape::Result<BrowserServer> {
    let config = ScraperConfig::from_env()?;

    if let Some(endpoint) = &cli.ws_endpoint {
        log::info!("Connecting to browser at {}", endpoint);
        let session = BrowserSession::connect(ConnectionOptions::new(endpoint.clone()))?.with_config(config);
        return Ok(BrowserServer::from_session(session));
    }

    let options = launch_options(cli, &config)?;
    log::info!("Browser mode: {}", if options.headless { "headless" } else { "headed" });
    BrowserServer::with_options(options, config)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    log::info!("browser-scrape MCP Server v{}", env!("CARGO_PKG_VERSION"));
    let server = build_server(&cli).map_err(|e| format!("Failed to create browser server: {}", e))?;

    match cli.transport {
        Transport::Stdio => {
            log::info!("Ready to accept MCP connections via stdio");
            let running = server.serve(stdio()).await?;
            let quit_reason = running.waiting().await?;
            log::info!("Server quit with reason: {:?}", quit_reason);
        }
        Transport::Sse => {
            let bind_addr = format!("127.0.0.1:{}", cli.port);
            let config = SseServerConfig {
                bind: bind_addr.parse()?,
                sse_path: cli.sse_path.clone(),
                post_path: cli.sse_post_path.clone(),
                ct: CancellationToken::new(),
                sse_keep_alive: None,
            };

            let (sse_server, router) = SseServer::new(config);
            let _cancellation_token = sse_server.with_service(move || server.clone());

            log::info!("Ready to accept MCP connections at http://{}{}", bind_addr, cli.sse_path);
            let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
            axum::serve(listener, router.into_make_service()).await?;
        }
        Transport::Http => {
            let bind_addr = format!("127.0.0.1:{}", cli.port);
            let http_service = StreamableHttpService::new(
                move || Ok(server.clone()),
                LocalSessionManager::default().into(),
                Default::default(),
            );
            let router = axum::Router::new().nest_service(&cli.http_path, http_service);

            log::info!("Ready to accept MCP connections at http://{}{}", bind_addr, cli.http_path);
            let listener = tokio::net::TcpListener::bind(bind_addr).await?;
            axum::serve(listener, router).await?;
        }
    }

    Ok(())
}
