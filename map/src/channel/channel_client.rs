use crate::channel::events::{ChannelEvent, EventSubscription, Subscribe, SubscriptionHandle, Unsubscribe};
use actix::prelude::*;
use actix_async_handler::async_handler;
use colored::Color;
use common::config::ChannelConfig;
use common::errors::NozhaError;
use common::logger::Logger;
use common::messages::channel_messages::JoinZone;
use common::messages::shared_messages::NetworkMessage;
use common::network::communicator::Communicator;
use common::network::connections::connect;
use futures_channel::mpsc::{UnboundedSender, unbounded};
use std::collections::HashMap;
use tokio::net::TcpStream;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Not connected; a reconnect may be scheduled.
    Disconnected,
    Connecting,
    Connected,
    /// Closed on request. Stays closed until the next [`Connect`].
    Closed,
}

/// Opens the connection and joins the configured zone.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Connect;

/// Closes the connection and stops reconnecting.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Disconnect;

#[derive(Message)]
#[rtype(result = "ChannelStatus")]
pub struct GetChannelStatus;

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelStatus {
    pub state: ChannelState,
    pub subscribers: usize,
    /// Successful connections so far, reconnections included.
    pub connections: u32,
}

struct OpenConnection;

impl Message for OpenConnection {
    type Result = ();
}

/// Client side of the live position channel.
///
/// Owns one connection to the channel server, joins the configured zone after
/// every (re)connection and fans the received vendor events out to its
/// subscribers. When the transport drops it reconnects after
/// `reconnect_delay`. Every rejoin is announced to subscribers as
/// [`ChannelEvent::Resubscribed`], after which the server replays
/// `vendor:online` for every live vendor so subscribers rebuild their state.
pub struct ChannelClient {
    pub config: ChannelConfig,
    pub state: ChannelState,
    pub communicator: Option<Communicator<ChannelClient>>,
    pub subscribers: HashMap<Uuid, UnboundedSender<ChannelEvent>>,
    pub reconnect: Option<SpawnHandle>,
    pub connections: u32,
    pub logger: Logger,
}

impl ChannelClient {
    pub fn new(config: ChannelConfig) -> Self {
        let logger = Logger::new(format!("Channel {}", config.zone), Color::Yellow);
        Self {
            config,
            state: ChannelState::Disconnected,
            communicator: None,
            subscribers: HashMap::new(),
            reconnect: None,
            connections: 0,
            logger,
        }
    }

    fn on_connect_result(&mut self, result: Result<TcpStream, NozhaError>, ctx: &mut Context<Self>) {
        if self.state != ChannelState::Connecting {
            // Disconnect arrived while connecting; the stream is dropped here.
            return;
        }
        let stream = match result {
            Ok(stream) => stream,
            Err(e) => {
                self.logger.warn(e.to_string());
                self.state = ChannelState::Disconnected;
                self.schedule_reconnect(ctx);
                return;
            }
        };
        match Communicator::new(stream, ctx.address()) {
            Ok(communicator) => {
                self.logger.info(format!(
                    "Connected to {}, joining zone {}",
                    communicator.peer_address, self.config.zone
                ));
                communicator.send(NetworkMessage::JoinZone(JoinZone {
                    zone: self.config.zone.clone(),
                }));
                self.communicator = Some(communicator);
                self.state = ChannelState::Connected;
                if self.connections > 0 {
                    // Subscribers drop what they knew; the replay rebuilds it.
                    self.publish(ChannelEvent::Resubscribed);
                }
                self.connections += 1;
            }
            Err(e) => {
                self.logger.error(format!("Cannot set up connection: {}", e));
                self.state = ChannelState::Disconnected;
                self.schedule_reconnect(ctx);
            }
        }
    }

    fn schedule_reconnect(&mut self, ctx: &mut Context<Self>) {
        if let Some(pending) = self.reconnect.take() {
            ctx.cancel_future(pending);
        }
        let delay = self.config.reconnect_delay;
        self.logger.info(format!("Reconnecting in {:?}", delay));
        self.reconnect = Some(ctx.run_later(delay, |act, ctx| {
            act.reconnect = None;
            ctx.notify(Connect);
        }));
    }

    fn publish(&mut self, event: ChannelEvent) {
        self.logger.debug(format!("Event {:?}", event));
        // Subscribers whose stream was dropped are forgotten here.
        self.subscribers
            .retain(|_, tx| tx.unbounded_send(event.clone()).is_ok());
    }
}

impl Actor for ChannelClient {
    type Context = Context<Self>;

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        if let Some(communicator) = self.communicator.take() {
            communicator.shutdown();
        }
    }
}

impl Handler<Connect> for ChannelClient {
    type Result = ();

    fn handle(&mut self, _msg: Connect, ctx: &mut Self::Context) -> Self::Result {
        match self.state {
            ChannelState::Connecting | ChannelState::Connected => {
                self.logger.debug("Already connected or connecting");
            }
            ChannelState::Disconnected | ChannelState::Closed => {
                if let Some(pending) = self.reconnect.take() {
                    ctx.cancel_future(pending);
                }
                self.state = ChannelState::Connecting;
                ctx.notify(OpenConnection);
            }
        }
    }
}

#[async_handler]
impl Handler<OpenConnection> for ChannelClient {
    type Result = ();

    async fn handle(&mut self, _msg: OpenConnection, ctx: &mut Self::Context) -> Self::Result {
        let server_addr = self.config.server_addr;
        let result = connect(server_addr).await;
        self.on_connect_result(result, ctx);
    }
}

impl Handler<Disconnect> for ChannelClient {
    type Result = ();

    fn handle(&mut self, _msg: Disconnect, ctx: &mut Self::Context) -> Self::Result {
        self.state = ChannelState::Closed;
        if let Some(pending) = self.reconnect.take() {
            ctx.cancel_future(pending);
        }
        if let Some(communicator) = self.communicator.take() {
            communicator.shutdown();
        }
        self.logger.info("Disconnected");
    }
}

impl Handler<Subscribe> for ChannelClient {
    type Result = MessageResult<Subscribe>;

    fn handle(&mut self, _msg: Subscribe, ctx: &mut Self::Context) -> Self::Result {
        let (tx, rx) = unbounded();
        let id = Uuid::new_v4();
        self.subscribers.insert(id, tx);
        self.logger.debug(format!("Subscriber {} added", id));
        MessageResult(EventSubscription {
            handle: SubscriptionHandle::new(id, ctx.address().recipient()),
            events: rx,
        })
    }
}

impl Handler<Unsubscribe> for ChannelClient {
    type Result = ();

    fn handle(&mut self, msg: Unsubscribe, _ctx: &mut Self::Context) -> Self::Result {
        if self.subscribers.remove(&msg.id).is_some() {
            self.logger.debug(format!("Subscriber {} removed", msg.id));
        }
    }
}

impl Handler<GetChannelStatus> for ChannelClient {
    type Result = MessageResult<GetChannelStatus>;

    fn handle(&mut self, _msg: GetChannelStatus, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(ChannelStatus {
            state: self.state,
            subscribers: self.subscribers.len(),
            connections: self.connections,
        })
    }
}

impl Handler<NetworkMessage> for ChannelClient {
    type Result = ();

    fn handle(&mut self, msg: NetworkMessage, ctx: &mut Self::Context) -> Self::Result {
        if let NetworkMessage::ConnectionClosed(closed) = &msg {
            self.communicator = None;
            if self.state == ChannelState::Closed {
                return;
            }
            let err = NozhaError::ChannelDisconnected(format!(
                "connection to {} lost",
                closed.remote_addr
            ));
            self.logger.warn(err.to_string());
            self.state = ChannelState::Disconnected;
            self.schedule_reconnect(ctx);
            return;
        }

        match ChannelEvent::from_network(msg) {
            Some(event) => self.publish(event),
            None => self.logger.debug("Ignoring non-vendor message"),
        }
    }
}
