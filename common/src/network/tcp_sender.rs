use crate::logger::Logger;
use crate::messages::shared_messages::{NetworkMessage, Shutdown};
use actix::prelude::*;
use colored::Color;
use std::collections::VecDeque;
use std::net::SocketAddr;
use tokio::io::{AsyncWriteExt, BufWriter, WriteHalf};
use tokio::net::TcpStream;

/// The `TCPSender` actor serializes [`NetworkMessage`]s as JSON lines and
/// writes them to a remote peer. Messages are queued and written one at a
/// time so they leave in the order they were sent.
pub struct TCPSender {
    /// The buffered writer, `None` while a write is in flight or after a failure.
    pub writer: Option<BufWriter<WriteHalf<TcpStream>>>,
    /// Serialized lines waiting to be written.
    pub queue: VecDeque<String>,
    /// Set by [`Shutdown`]: stop once the queue is flushed.
    pub closing: bool,
    pub logger: Logger,
}

impl TCPSender {
    pub fn new(write_half: WriteHalf<TcpStream>, peer: SocketAddr) -> Self {
        Self {
            writer: Some(BufWriter::new(write_half)),
            queue: VecDeque::new(),
            closing: false,
            logger: Logger::new(format!("TCPSender {}", peer), Color::BrightBlack),
        }
    }
}

impl Actor for TCPSender {
    type Context = Context<Self>;
}

struct ProcessQueue;

impl Message for ProcessQueue {
    type Result = ();
}

impl Handler<NetworkMessage> for TCPSender {
    type Result = ();

    fn handle(&mut self, msg: NetworkMessage, ctx: &mut Self::Context) {
        if self.closing {
            return;
        }
        let line = match serde_json::to_string(&msg) {
            Ok(line) => line,
            Err(e) => {
                self.logger
                    .warn(format!("Dropping message that cannot be serialized: {}", e));
                return;
            }
        };
        self.logger.debug(format!("Queued {}", line));
        self.queue.push_back(line);
        if self.queue.len() == 1 {
            ctx.notify(ProcessQueue);
        }
    }
}

impl Handler<ProcessQueue> for TCPSender {
    type Result = ResponseActFuture<Self, ()>;

    fn handle(&mut self, _msg: ProcessQueue, _ctx: &mut Self::Context) -> Self::Result {
        let Some(mut writer) = self.writer.take() else {
            return Box::pin(async {}.into_actor(self));
        };
        let Some(line) = self.queue.front().cloned() else {
            self.writer = Some(writer);
            return Box::pin(async {}.into_actor(self));
        };

        let fut = async move {
            let to_send = format!("{}\n", line);

            writer
                .write_all(to_send.as_bytes())
                .await
                .map_err(|e| format!("Error writing to socket: {}", e))?;
            writer
                .flush()
                .await
                .map_err(|e| format!("Error flushing socket: {}", e))?;

            Ok::<_, String>(writer)
        };

        Box::pin(fut.into_actor(self).map(move |res, act, ctx| match res {
            Ok(writer) => {
                act.writer = Some(writer);
                act.queue.pop_front();
                if !act.queue.is_empty() {
                    ctx.notify(ProcessQueue);
                } else if act.closing {
                    ctx.stop();
                }
            }
            Err(err_msg) => {
                // The writer is unusable after a failed write.
                act.writer = None;
                act.queue.clear();
                act.logger.error(err_msg);
                ctx.stop();
            }
        }))
    }
}

impl Handler<Shutdown> for TCPSender {
    type Result = ();

    fn handle(&mut self, _msg: Shutdown, ctx: &mut Self::Context) {
        if self.queue.is_empty() {
            ctx.stop();
        } else {
            self.closing = true;
        }
    }
}
