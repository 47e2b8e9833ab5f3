use crate::server_actors::session::Session;
use crate::server_actors::zone_hub::ZoneHub;
use actix::prelude::*;
use colored::Color;
use common::logger::Logger;
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Accepts channel connections and starts one [`Session`] per peer.
pub struct Acceptor {
    pub addr: SocketAddr,
    pub hub: Addr<ZoneHub>,
    pub logger: Logger,
}

impl Acceptor {
    pub fn new(addr: SocketAddr, hub: Addr<ZoneHub>) -> Self {
        Self {
            addr,
            hub,
            logger: Logger::new("Acceptor", Color::Magenta),
        }
    }

    pub async fn start(&self) -> std::io::Result<()> {
        let listener = self.bind().await?;
        self.accept_connections(listener).await
    }

    pub async fn bind(&self) -> std::io::Result<TcpListener> {
        let listener = TcpListener::bind(self.addr).await?;
        self.logger.info(format!(
            "Acceptor started, listening on {}",
            listener.local_addr()?
        ));
        Ok(listener)
    }

    pub async fn accept_connections(&self, listener: TcpListener) -> std::io::Result<()> {
        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    self.logger.info(format!("Accepted connection from {}", peer));
                    if let Err(e) = stream.set_nodelay(true) {
                        self.logger.warn(format!("Cannot set TCP_NODELAY for {}: {}", peer, e));
                    }
                    Session::new(stream, peer, self.hub.clone()).start();
                }
                Err(e) => {
                    self.logger.warn(format!("Failed to accept connection: {}", e));
                }
            }
        }
    }
}
