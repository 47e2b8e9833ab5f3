use crate::errors::NozhaError;
use crate::messages::shared_messages::{NetworkMessage, Shutdown};
use crate::network::tcp_receiver::TCPReceiver;
use crate::network::tcp_sender::TCPSender;
use actix::prelude::*;
use std::net::SocketAddr;
use tokio::io::split;
use tokio::net::TcpStream;

/// Both halves of one TCP connection: a [`TCPSender`] for outgoing messages
/// and a [`TCPReceiver`] forwarding incoming ones to the owning actor.
#[derive(Debug)]
pub struct Communicator<A>
where
    A: Actor<Context = Context<A>> + Handler<NetworkMessage>,
{
    pub sender: Addr<TCPSender>,
    pub receiver: Addr<TCPReceiver<A>>,
    pub local_address: SocketAddr,
    pub peer_address: SocketAddr,
}

impl<A> Communicator<A>
where
    A: Actor<Context = Context<A>> + Handler<NetworkMessage>,
{
    pub fn new(tcp_stream: TcpStream, destination_address: Addr<A>) -> Result<Self, NozhaError> {
        let local_address = tcp_stream.local_addr()?;
        let peer_address = tcp_stream.peer_addr()?;
        let (read_half, write_half) = split(tcp_stream);
        Ok(Self {
            sender: TCPSender::new(write_half, peer_address).start(),
            receiver: TCPReceiver::new(read_half, peer_address, destination_address).start(),
            local_address,
            peer_address,
        })
    }

    pub fn send(&self, message: NetworkMessage) {
        self.sender.do_send(message);
    }

    /// Closes the connection without notifying the owning actor.
    pub fn shutdown(&self) {
        self.receiver.do_send(Shutdown);
        self.sender.do_send(Shutdown);
    }
}
