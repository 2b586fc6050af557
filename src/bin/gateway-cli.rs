use clap::{Parser, Subcommand};
use reqwest::Client;
use serde_json::Value;
use std::path::PathBuf;
use url::Url;

use plc_gateway::transform::{EntityStore, OrionStore};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Management CLI for the PLC gateway", long_about = None)]
struct Cli {
    /// Running gateway to send device payloads to.
    #[arg(short, long, default_value = "http://localhost:4315")]
    gateway: Url,

    /// Context broker holding the entities.
    #[arg(short, long, default_value = "http://localhost:1026")]
    broker: Url,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// POST a device payload file to the gateway
    Send { payload: PathBuf },
    /// Upsert a JSON array of entities into the broker
    Seed { entities: PathBuf },
    /// Print a broker entity
    Get { id: String },
    /// Check whether a broker entity exists
    Exists { id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = Client::builder().no_proxy().build()?;
    let store = OrionStore::new(client.clone(), cli.broker.clone());

    match cli.command {
        Commands::Send { payload } => {
            let body = tokio::fs::read(&payload).await?;
            let res = client.post(cli.gateway.clone()).body(body).send().await?;
            let status = res.status();
            let text = res.text().await?;
            println!("{status}");
            println!("{text}");
        }
        Commands::Seed { entities } => {
            let content = tokio::fs::read_to_string(&entities).await?;
            let entities = match serde_json::from_str::<Value>(&content)? {
                Value::Array(entities) => entities,
                entity @ Value::Object(_) => vec![entity],
                _ => return Err("expected a JSON array of entities".into()),
            };
            let count = entities.len();
            store.upsert(entities).await?;
            println!("Upserted {count} entities into {}", store.base_url());
        }
        Commands::Get { id } => {
            let entity = store.get(&id).await?;
            println!("{}", serde_json::to_string_pretty(&entity)?);
        }
        Commands::Exists { id } => {
            println!("{}", store.exists(&id).await?);
        }
    }

    Ok(())
}
