//! SNMPv2c trap delivery sender. See [`ber`] for the hand-rolled BER
//! encoding and [`sender`] for trap construction and UDP transmission.

pub mod ber;
pub mod sender;

pub use sender::SnmpSender;
