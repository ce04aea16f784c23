use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use a3s_sse::{FilteredSseStream, ProviderConfig, SseConfig, SseEvent, Subchannel};

/// Filtered Server-Sent Events over a shared pub/sub backend
#[derive(Debug, Parser)]
#[command(name = "a3s-sse", version, about)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Serve event streams over HTTP
    Serve {
        /// Override the configured host
        #[arg(long)]
        host: Option<String>,

        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Publish one event to the configured backend
    Publish {
        /// Event type
        #[arg(short, long)]
        event: String,

        /// JSON payload
        #[arg(short, long, default_value = "{}")]
        data: String,

        /// Sub-partition key; the base channel if omitted
        #[arg(short, long)]
        subchannel: Option<String>,
    },
    /// End every listener on a sub-partition
    Unsubscribe {
        /// Sub-partition key; the base channel if omitted
        #[arg(short, long)]
        subchannel: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = SseConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            a3s_sse::server::start(&config).await?;
        }
        Commands::Publish {
            event,
            data,
            subchannel,
        } => {
            let data: serde_json::Value = serde_json::from_str(&data)?;
            let stream = connect_stream(&config).await?;
            let subchannel = Subchannel::from(subchannel);
            let topic = stream.create_channel_name(subchannel.clone());
            stream
                .publish(&SseEvent::new(event, data), subchannel)
                .await?;
            println!("Published to {}", topic);
        }
        Commands::Unsubscribe { subchannel } => {
            let stream = connect_stream(&config).await?;
            let subchannel = Subchannel::from(subchannel);
            let topic = stream.create_channel_name(subchannel.clone());
            stream.unsubscribe(subchannel).await?;
            println!("Unsubscribed {}", topic);
        }
    }

    Ok(())
}

async fn connect_stream(config: &SseConfig) -> a3s_sse::Result<FilteredSseStream> {
    if matches!(config.provider, ProviderConfig::Memory(_)) {
        tracing::warn!("Memory provider is process-local; no server will see this");
    }
    let provider = config.provider.connect().await?;
    Ok(FilteredSseStream::new(config.channel.clone(), provider))
}
