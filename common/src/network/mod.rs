pub mod communicator;
pub mod connections;
pub mod tcp_receiver;
pub mod tcp_sender;
