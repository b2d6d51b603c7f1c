//! Membership - sign up, log in, and a members-only area with role management

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use membership_db::UserDirectory;
use membership_web::{WebServer, WebServerConfig};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Membership site server
#[derive(Parser, Debug)]
#[command(name = "membership")]
#[command(about = "Membership site with member and admin areas")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Database URL for users and sessions
    #[arg(
        long,
        global = true,
        env = "DATABASE_URL",
        default_value = "sqlite://./membership.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the web server (default)
    Serve(ServeArgs),

    /// Set a user's role directly in the database
    #[command(long_about = r#"
Set a user's role directly in the database. The web admin area can only be
reached by an admin, so use this to create the first one.

EXAMPLES:
  membership set-role --email ann@x.com --role admin
    "#)]
    SetRole {
        /// Email of the user to update
        #[arg(long)]
        email: String,

        /// New role, stored as given
        #[arg(long, default_value = "admin")]
        role: String,
    },
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value = "3000")]
    port: u16,

    /// Host address to bind
    #[arg(long, env = "BIND_HOST", default_value = "0.0.0.0")]
    bind_host: IpAddr,

    /// Secret used to sign session cookies
    #[arg(long, env = "SESSION_SECRET", hide_env_values = true)]
    session_secret: String,

    /// Secret used to encrypt session data in the store
    #[arg(long, env = "SESSION_STORE_SECRET", hide_env_values = true)]
    session_store_secret: String,

    /// Directory of static assets
    #[arg(long, env = "PUBLIC_DIR", default_value = "public")]
    public_dir: PathBuf,
}

/// Server settings taken from the environment alone
#[derive(Parser, Debug)]
struct ServeDefaults {
    #[command(flatten)]
    args: ServeArgs,
}

/// Setup logging with the specified log level
fn setup_logging(verbose: bool) {
    let log_level = if verbose { "debug" } else { "info" };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();
}

async fn serve(database_url: &str, args: ServeArgs) -> Result<()> {
    if args.session_secret == args.session_store_secret {
        warn!("SESSION_SECRET and SESSION_STORE_SECRET are identical; use separate secrets");
    }

    let db = membership_db::connect(database_url)
        .await
        .context("Failed to connect to database")?;
    membership_db::migrate(&db)
        .await
        .context("Failed to run database migrations")?;

    let config = WebServerConfig {
        bind_addr: SocketAddr::new(args.bind_host, args.port),
        session_secret: args.session_secret,
        session_store_secret: args.session_store_secret,
        public_dir: args.public_dir,
        ..WebServerConfig::default()
    };

    info!("Server running on port {}", args.port);
    WebServer::new(config, db).start().await
}

async fn set_role(database_url: &str, email: &str, role: &str) -> Result<()> {
    let db = membership_db::connect(database_url)
        .await
        .context("Failed to connect to database")?;
    membership_db::migrate(&db)
        .await
        .context("Failed to run database migrations")?;

    let changed = UserDirectory::new(db)
        .update_role(email, role)
        .await
        .context("Failed to update role")?;

    if changed == 0 {
        anyhow::bail!("No user registered with email {}", email);
    }

    info!("Set role of {} to {}", email, role);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; the environment may already be set
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Some(Commands::Serve(args)) => serve(&cli.database_url, args).await,
        Some(Commands::SetRole { email, role }) => set_role(&cli.database_url, &email, &role).await,
        None => {
            // Bare `membership` behaves like `membership serve`
            let defaults = ServeDefaults::try_parse_from(["membership"])
                .context("Missing server settings; see `membership serve --help`")?;
            serve(&cli.database_url, defaults.args).await
        }
    }
}
