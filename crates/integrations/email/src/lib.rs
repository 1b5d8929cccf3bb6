//! SMTP delivery sender: sends the dispatcher's templated subject/body over
//! SMTP, optionally with STARTTLS, guarded against loopback/private/
//! link-local/metadata SMTP hosts.

pub mod config;
pub mod sender;

pub use config::EmailSenderConfig;
pub use sender::EmailSender;
