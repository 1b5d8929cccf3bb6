//! MQTT delivery sender: publishes to a per-route rendered topic with the
//! route's configured QoS and retain flag.

pub mod sender;
pub mod topic;

pub use sender::MqttSender;
pub use topic::render_topic;
