use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Use the library instead of redeclaring modules
use tubestats::{
    config::Config,
    database::Database,
    history::HistoryRecorder,
    ingestor::{UpdateScheduler, UpdateService},
    sources::YouTubeApiClient,
    web::WebServer,
};

#[derive(Parser)]
#[command(name = "tubestats")]
#[command(version)]
#[command(about = "Tracks YouTube channel and video statistics as daily time series")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = tubestats::config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch every listed channel once and exit
    Update {
        /// Channel list file (overrides ingestion.channels_file)
        #[arg(long, value_name = "FILE")]
        channels: Option<PathBuf>,
    },
    /// Run the update job on the configured cron schedule
    Schedule,
    /// Serve the dashboard API
    Serve {
        /// Listening IP address
        #[arg(short = 'H', long, value_name = "IP")]
        host: Option<String>,

        /// Listening port
        #[arg(short, long, value_name = "PORT")]
        port: Option<u16>,

        /// Also run the scheduled update job in this process. Dashboard
        /// writes then contend with the job for the database write lock.
        #[arg(long)]
        with_scheduler: bool,
    },
    /// Delete a channel and all of its videos
    DeleteChannel {
        /// Channel id
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging with specified level
    let log_filter = if cli.log_level == "trace" {
        format!("tubestats={},tower_http=trace", cli.log_level)
    } else {
        format!("tubestats={}", cli.log_level)
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting tubestats v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load(Some(&cli.config))?;
    info!("Configuration loaded from: {}", cli.config.display());

    info!("Using database: {}", config.database.url);
    let database = Database::new(&config.database).await?;
    database.migrate().await?;
    info!("Database connection established and migrations applied");

    match cli.command {
        Command::Update { channels } => {
            let channels_file = channels.unwrap_or_else(|| config.ingestion.channels_file.clone());
            let service = update_service(&config, database)?;
            let summary = service.run(&channels_file).await?;
            info!("Update complete: {:?}", summary);
        }
        Command::Schedule => {
            let service = Arc::new(update_service(&config, database)?);
            scheduler(&config, service)?.start().await?;
        }
        Command::Serve {
            host,
            port,
            with_scheduler,
        } => {
            if let Some(host) = host {
                config.web.host = host;
            }
            if let Some(port) = port {
                config.web.port = port;
            }

            if with_scheduler {
                let service = update_service(&config, database.clone())?;
                let scheduler = scheduler(&config, Arc::new(service))?;
                warn!("Running the update job alongside the dashboard");
                tokio::spawn(async move {
                    if let Err(e) = scheduler.start().await {
                        error!("Update scheduler failed: {}", e);
                    }
                });
            }

            let web_server = WebServer::new(&config, database)?;
            info!(
                "Starting web server on {}:{}",
                web_server.host(),
                web_server.port()
            );
            web_server.serve().await?;
        }
        Command::DeleteChannel { id } => {
            if database.delete_channel(&id).await? {
                info!("Deleted channel {}", id);
            } else {
                warn!("Channel {} not found", id);
            }
        }
    }

    Ok(())
}

fn update_service(config: &Config, database: Database) -> Result<UpdateService<YouTubeApiClient>> {
    let client = YouTubeApiClient::new(&config.youtube, config.require_api_key()?)?;
    let recorder = HistoryRecorder::new(config.calendar_zone()?);
    Ok(UpdateService::new(
        client,
        database,
        recorder,
        config.youtube.max_videos_per_channel,
    ))
}

fn scheduler(
    config: &Config,
    service: Arc<UpdateService<YouTubeApiClient>>,
) -> Result<UpdateScheduler<YouTubeApiClient>> {
    Ok(UpdateScheduler::new(
        service,
        &config.ingestion.update_cron,
        config.ingestion.channels_file.clone(),
        config.ingestion.run_on_startup,
    )?)
}
