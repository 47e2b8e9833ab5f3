use crate::logger::Logger;
use crate::messages::shared_messages::{ConnectionClosed, NetworkMessage, Shutdown};
use actix::dev::ToEnvelope;
use actix::prelude::*;
use colored::Color;
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, BufReader, ReadHalf};
use tokio::net::TcpStream;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::LinesStream;

/// The `TCPReceiver` actor reads JSON lines from a peer and forwards each
/// decoded [`NetworkMessage`] to its destination actor. When the stream ends
/// the destination receives [`NetworkMessage::ConnectionClosed`].
pub struct TCPReceiver<A: Actor + Handler<NetworkMessage>> {
    remote_addr: SocketAddr,
    reader: Option<BufReader<ReadHalf<TcpStream>>>,
    destination: Addr<A>,
    logger: Logger,
}

impl<A> TCPReceiver<A>
where
    A: Actor + Handler<NetworkMessage>,
{
    pub fn new(reader: ReadHalf<TcpStream>, remote_addr: SocketAddr, destination: Addr<A>) -> Self {
        Self {
            remote_addr,
            reader: Some(BufReader::new(reader)),
            destination,
            logger: Logger::new(format!("TCPReceiver {}", remote_addr), Color::BrightBlack),
        }
    }
}

impl<A> Actor for TCPReceiver<A>
where
    A: Actor + Handler<NetworkMessage> + 'static,
    A::Context: ToEnvelope<A, NetworkMessage>,
{
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let Some(reader) = self.reader.take() else {
            self.logger.error("Receiver started without a reader");
            ctx.stop();
            return;
        };
        let addr = self.destination.clone();
        let remote_addr = self.remote_addr;
        let logger = self.logger.clone();

        ctx.spawn(
            async move {
                let mut lines = LinesStream::new(reader.lines());
                while let Some(line) = lines.next().await {
                    let line = match line {
                        Ok(line) => line,
                        Err(e) => {
                            logger.warn(format!("Read error: {}", e));
                            break;
                        }
                    };
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<NetworkMessage>(&line) {
                        Ok(msg) => addr.do_send(msg),
                        Err(e) => logger.warn(format!("Discarding undecodable line {:?}: {}", line, e)),
                    }
                }
                logger.info("Connection closed");
                addr.do_send(NetworkMessage::ConnectionClosed(ConnectionClosed { remote_addr }));
            }
            .into_actor(self)
            .map(|_, _act, ctx| ctx.stop()),
        );
    }
}

impl<A> Handler<Shutdown> for TCPReceiver<A>
where
    A: Actor + Handler<NetworkMessage> + 'static,
    A::Context: ToEnvelope<A, NetworkMessage>,
{
    type Result = ();

    fn handle(&mut self, _msg: Shutdown, ctx: &mut Self::Context) {
        ctx.stop();
    }
}
