mod messages;
mod server_acceptor;
mod server_actors;

use crate::server_acceptor::acceptor::Acceptor;
use crate::server_actors::zone_hub::ZoneHub;
use actix::prelude::*;
use common::config::Config;
use common::errors::NozhaError;
use common::geo::ZonePolygon;
use common::utils::init_tokio_console;
use std::env;
use std::path::Path;
use std::sync::Arc;
use tokio::signal::ctrl_c;

#[actix::main]
async fn main() -> Result<(), NozhaError> {
    init_tokio_console();

    // Uso: server [zone.geojson] [config.json]
    let args: Vec<String> = env::args().collect();
    let zone = match args.get(1) {
        Some(path) => ZonePolygon::load(path)?,
        None => ZonePolygon::nozha()?,
    };
    let config = Config::load(args.get(2).map(Path::new))?;

    let hub = ZoneHub::new(Arc::new(zone)).start();
    let acceptor = Acceptor::new(config.channel.server_addr, hub);

    tokio::select! {
        res = acceptor.start() => res?,
        _ = ctrl_c() => {
            println!("Ctrl-C recibido, apagando...");
        }
    }

    Ok(())
}
