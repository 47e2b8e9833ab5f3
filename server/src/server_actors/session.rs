use crate::messages::internal_messages::{Inbound, PeerDisconnected, RegisterPeer};
use crate::server_actors::zone_hub::ZoneHub;
use actix::prelude::*;
use colored::Color;
use common::logger::Logger;
use common::messages::shared_messages::NetworkMessage;
use common::network::communicator::Communicator;
use std::net::SocketAddr;
use tokio::net::TcpStream;

/// One accepted connection. Relays the peer's messages to the [`ZoneHub`]
/// tagged with the peer address, and tells the hub when the connection ends.
pub struct Session {
    pub peer: SocketAddr,
    pub hub: Addr<ZoneHub>,
    pub communicator: Option<Communicator<Session>>,
    pub pending_stream: Option<TcpStream>, // Se consume en `started`
    pub logger: Logger,
}

impl Session {
    pub fn new(stream: TcpStream, peer: SocketAddr, hub: Addr<ZoneHub>) -> Self {
        Self {
            peer,
            hub,
            communicator: None,
            pending_stream: Some(stream),
            logger: Logger::new(format!("Session {}", peer), Color::Blue),
        }
    }
}

impl Actor for Session {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let Some(stream) = self.pending_stream.take() else {
            ctx.stop();
            return;
        };
        match Communicator::new(stream, ctx.address()) {
            Ok(communicator) => {
                self.hub.do_send(RegisterPeer {
                    peer: self.peer,
                    outbox: communicator.sender.clone().recipient(),
                });
                self.communicator = Some(communicator);
            }
            Err(e) => {
                self.logger.error(format!("Cannot set up connection: {}", e));
                ctx.stop();
            }
        }
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        if let Some(communicator) = self.communicator.take() {
            communicator.shutdown();
        }
    }
}

impl Handler<NetworkMessage> for Session {
    type Result = ();

    fn handle(&mut self, msg: NetworkMessage, ctx: &mut Self::Context) -> Self::Result {
        match msg {
            NetworkMessage::ConnectionClosed(_) => {
                self.hub.do_send(PeerDisconnected { peer: self.peer });
                ctx.stop();
            }
            message => {
                self.logger.debug(format!("Received {:?}", message));
                self.hub.do_send(Inbound {
                    peer: self.peer,
                    message,
                });
            }
        }
    }
}
