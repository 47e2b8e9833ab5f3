use actix::prelude::*;
use colored::Color;
use common::config::Config;
use common::errors::NozhaError;
use common::geo::ZonePolygon;
use common::logger::Logger;
use common::utils::init_tokio_console;
use map::channel::{ChannelClient, Connect, Disconnect, Subscribe};
use map::live_map::{LiveMap, RenderMap};
use std::env;
use std::path::Path;
use std::sync::Arc;
use tokio::signal::ctrl_c;

#[actix::main]
async fn main() -> Result<(), NozhaError> {
    init_tokio_console();

    // Uso: map [config.json] [zone.geojson]
    let args: Vec<String> = env::args().collect();
    let config = Config::load(args.get(1).map(Path::new))?;
    let zone = match args.get(2) {
        Some(path) => ZonePolygon::load(path)?,
        None => ZonePolygon::nozha()?,
    };
    let logger = Logger::new("Map main", Color::Cyan);

    let client = ChannelClient::new(config.channel.clone()).start();
    let subscription = client
        .send(Subscribe)
        .await
        .map_err(|e| NozhaError::ChannelDisconnected(e.to_string()))?;
    let map = LiveMap::new(Arc::new(zone), &config.map, subscription).start();
    client.do_send(Connect);

    if ctrl_c().await.is_err() {
        logger.error("Cannot listen for Ctrl-C");
    }
    println!("Ctrl-C recibido, apagando...");
    if let Ok(snapshot) = map.send(RenderMap).await {
        logger.info(snapshot);
    }
    if client.send(Disconnect).await.is_err() {
        logger.warn("Channel client already stopped");
    }
    System::current().stop();

    Ok(())
}
