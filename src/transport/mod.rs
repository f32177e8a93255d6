//! Transports deliver a message to its recipients.
//!
//! The only transport provided is [`smtp`], which hands the message to a relay
//! over a plain SMTP connection. The [`Transport`] trait is the seam a
//! composition layer programs against.

use crate::{Envelope, Message};

pub mod smtp;

/// Blocking delivery of one message
pub trait Transport {
    /// Value produced on success
    type Ok;
    /// Error produced by the transport
    type Error;

    /// Delivers `message` to the recipients of `envelope`
    fn send(&self, envelope: &Envelope, message: &Message) -> Result<Self::Ok, Self::Error>;
}
