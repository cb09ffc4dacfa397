use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use geo_consent::cascade::CallerContext;
use geo_consent::cli;

#[derive(Parser)]
#[command(name = "geo-consent", version, about = "Location-aware consent policy for cookie banners")]
struct Cli {
    /// Project root containing `.geo-consent/` (default: current directory).
    #[arg(long, global = true)]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create `.geo-consent/` with a default config and starter groups.
    Init,

    /// Serve the geo-policy endpoint.
    Serve {
        /// Override the configured bind address.
        #[arg(long)]
        bind: Option<String>,
    },

    /// Resolve a location against the configured groups, offline.
    Resolve {
        /// ISO 3166-1 alpha-2 country code.
        #[arg(long)]
        country: Option<String>,
        /// Region code, e.g. a US state.
        #[arg(long)]
        region: Option<String>,
    },

    /// Look up one address with the configured geo service.
    Lookup { ip: IpAddr },

    /// List location groups in match-priority order.
    Groups,

    /// Print the site settings after the override cascade.
    Settings {
        /// visitor, admin, or admin_groups.
        #[arg(long, default_value = "visitor")]
        context: CallerContext,
    },

    /// Play a headless page load against a running server.
    Simulate {
        /// Base URL of the server.
        #[arg(long, default_value = "http://127.0.0.1:8080")]
        server: String,
        /// Seed the policy cookie with this JSON.
        #[arg(long)]
        cached: Option<String>,
        /// Pretend the visitor already made a consent decision.
        #[arg(long)]
        decided: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("GEO_CONSENT_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let root = cli::project_root(cli.project.as_deref());

    match cli.command {
        Commands::Init => cli::init::run_init(&root).await?,
        Commands::Serve { bind } => cli::serve::run_serve(&root, bind.as_deref()).await?,
        Commands::Resolve { country, region } => {
            cli::inspect::run_resolve(&root, country.as_deref(), region.as_deref()).await?
        }
        Commands::Lookup { ip } => cli::inspect::run_lookup(&root, ip).await?,
        Commands::Groups => cli::inspect::run_groups(&root).await?,
        Commands::Settings { context } => cli::inspect::run_settings(&root, context).await?,
        Commands::Simulate {
            server,
            cached,
            decided,
        } => cli::simulate::run_simulate(&root, &server, cached.as_deref(), decided).await?,
    }

    Ok(())
}
