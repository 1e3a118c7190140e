//! CLI for agrirelay
//!
//! Subcommands:
//! - `server`: run the notification relay
//! - `client`: run a small smoke-test client against a running relay
//! - `listing`: maintain the listing directory used to route new orders

use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use agrirelay::config::{Settings, load_config, load_config_from};
use agrirelay::dispatcher::EventDispatcher;
use agrirelay::persistence::SledListingDirectory;
use agrirelay::router::TopicRouter;
use agrirelay::transport::NotificationServer;
use agrirelay::utils::logging;
use clap::{Parser, Subcommand};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "agrirelay")]
enum Command {
    /// Start the notification relay
    Server {
        /// Configuration file (defaults to config/default.*)
        #[arg(long)]
        config: Option<String>,
    },
    /// Identify, join a product room, publish a price and print what comes back
    Client {
        /// WebSocket server URL to connect to
        #[arg(long, default_value = "ws://127.0.0.1:3000")]
        url: String,
        /// Participant id to identify as
        #[arg(long, default_value_t = 456)]
        participant: u64,
        /// Product room to join and publish to
        #[arg(long, default_value_t = 123)]
        product: u64,
    },
    /// Manage the listing-to-supplier directory
    Listing {
        #[command(subcommand)]
        action: ListingAction,
        /// Configuration file (defaults to config/default.*)
        #[arg(long, global = true)]
        config: Option<String>,
    },
}

#[derive(Subcommand)]
enum ListingAction {
    /// Record the supplier that owns a listing
    Add {
        #[arg(long)]
        listing_id: u64,
        #[arg(long)]
        supplier_id: u64,
    },
    /// Forget a listing
    Remove {
        #[arg(long)]
        listing_id: u64,
    },
    /// Print the owner of a listing
    Show {
        #[arg(long)]
        listing_id: u64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let result = match Command::parse() {
        Command::Server { config } => run_server(config.as_deref()).await,
        Command::Client {
            url,
            participant,
            product,
        } => run_client(&url, participant, product).await,
        Command::Listing { action, config } => run_listing(action, config.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logging::init("info");
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn settings(path: Option<&str>) -> Result<Settings, Box<dyn Error>> {
    let settings = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    logging::init(&settings.logging.level);
    Ok(settings)
}

async fn run_server(config: Option<&str>) -> Result<(), Box<dyn Error>> {
    let settings = settings(config)?;

    let listings = SledListingDirectory::open(&settings.listings.path)?;
    info!(
        path = %settings.listings.path,
        listings = listings.len(),
        "listing directory opened"
    );

    let dispatcher = EventDispatcher::new(TopicRouter::shared(), Arc::new(listings));
    let server = NotificationServer::bind(&settings, dispatcher).await?;

    tokio::select! {
        _ = server.run() => {
            error!("Notification server exited unexpectedly.");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
        }
    }

    Ok(())
}

async fn run_client(url: &str, participant: u64, product: u64) -> Result<(), Box<dyn Error>> {
    use futures_util::{SinkExt, StreamExt};
    use serde_json::json;
    use tokio_tungstenite::connect_async;
    use tokio_tungstenite::tungstenite::Message as WsMessage;

    logging::init("info");
    let (mut ws_stream, _response) = connect_async(url).await?;

    // 1. Identify so new orders for this supplier reach us
    let identify = json!({ "type": "identify", "participantId": participant });
    ws_stream.send(WsMessage::text(identify.to_string())).await?;

    // 2. Join the product room
    let join = json!({ "type": "join_product_room", "productId": product });
    ws_stream.send(WsMessage::text(join.to_string())).await?;

    // 3. Publish a price change to the room we just joined
    let update = json!({
        "type": "update_price",
        "productId": product,
        "newPrice": 50.00,
        "supplierId": participant
    });
    ws_stream.send(WsMessage::text(update.to_string())).await?;

    // 4. Print notifications until the relay goes quiet
    let quiet = Duration::from_secs(2);
    while let Ok(Some(frame)) = tokio::time::timeout(quiet, ws_stream.next()).await {
        match frame? {
            WsMessage::Text(incoming) => println!("Incoming: {}", incoming.as_str()),
            WsMessage::Close(_) => break,
            _ => {}
        }
    }

    ws_stream.close(None).await?;
    Ok(())
}

fn run_listing(action: ListingAction, config: Option<&str>) -> Result<(), Box<dyn Error>> {
    let settings = settings(config)?;
    let store = SledListingDirectory::open(&settings.listings.path)?;

    match action {
        ListingAction::Add {
            listing_id,
            supplier_id,
        } => {
            let record = store.register_listing(listing_id, supplier_id)?;
            println!(
                "Listing {} now routes orders to supplier {}",
                record.listing_id, record.supplier_id
            );
        }
        ListingAction::Remove { listing_id } => {
            if store.remove_listing(listing_id)? {
                println!("Listing {listing_id} removed");
            } else {
                println!("Listing {listing_id} was not registered");
            }
        }
        ListingAction::Show { listing_id } => match store.get(listing_id)? {
            Some(record) => println!(
                "Listing {} -> supplier {} (registered at {})",
                record.listing_id, record.supplier_id, record.registered_at
            ),
            None => println!("Listing {listing_id} is not registered"),
        },
    }

    store.flush()?;
    Ok(())
}
