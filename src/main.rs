use clap::{Parser, Subcommand};
use recipe_backend::db::connection;
use recipe_backend::db::services::CredentialStore;
use recipe_backend::server::config::ServerConfig;
use recipe_backend::web::create_axum_router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Create a staff superuser account
    CreateSuperuser {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Block until the database accepts connections, then exit
    WaitForDb,
}

fn init_logging(log_dir: &str) {
    // Log to a file: JSON format, daily rotation
    let file_appender = rolling::daily(log_dir, "server.log");
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .json();

    // Log to stdout: human-readable format
    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    // Default to `info,sea_orm=warn` level if RUST_LOG is not set.
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sea_orm=warn,sqlx::query=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    let server_config = match ServerConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load server configuration: {e}");
            return Err(e.into());
        }
    };

    init_logging(&server_config.log_dir);
    info!(version = env!("CARGO_PKG_VERSION"), "Starting recipe backend.");

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(server_config).await,
        Command::CreateSuperuser { email, password } => {
            let db_pool = connection::connect_and_sync(&server_config).await?;
            let credentials = CredentialStore::new(db_pool, server_config.password_hash_cost);
            match credentials.create_superuser(&email, &password).await {
                Ok(user) => {
                    info!(user_id = user.id, email = %user.email, "Superuser created.");
                    Ok(())
                }
                Err(e) => {
                    error!(error = %e, "Failed to create superuser.");
                    Err(e.into())
                }
            }
        }
        Command::WaitForDb => {
            connection::connect(&server_config).await?;
            info!("Database available.");
            Ok(())
        }
    }
}

async fn serve(server_config: ServerConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if server_config.database_url.starts_with("sqlite://") {
        std::fs::create_dir_all(&server_config.data_dir)?;
    }

    let db_pool = match connection::connect_and_sync(&server_config).await {
        Ok(db) => db,
        Err(e) => {
            error!(error = %e, "Failed to initialize database.");
            return Err(e.into());
        }
    };

    let addr: SocketAddr = server_config.listen_addr.parse()?;
    let app = create_axum_router(db_pool, &server_config);

    let listener = TcpListener::bind(addr).await?;
    info!(address = %addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "Failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
