//! Transport and wire layers.

pub mod communicator;
pub mod wire;

pub use communicator::{CommTag, Communicator, NoComm, OutgoingMessage, ThreadComm};
