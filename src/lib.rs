//! Minimal SMTP client for handing pre-built messages to a relay.
//!
//! The crate opens one plain TCP connection per message, walks the SMTP
//! dialogue (greeting, optional `AUTH LOGIN`, envelope, `DATA`) and closes the
//! connection again, whatever the outcome.
//!
//! Message assembly is not done here: the caller supplies a rendered header
//! block and body block as a [`Message`], and the sender and recipients as an
//! [`Envelope`].
//!
//! ```rust,no_run
//! use smtp_courier::{Address, Envelope, Message, SmtpTransport, Transport};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let envelope = Envelope::new(
//!     Some("nobody@domain.tld".parse::<Address>()?),
//!     vec!["hei@domain.tld".parse::<Address>()?],
//! );
//! let message = Message::new("Subject: Happy new year", "Be happy!");
//!
//! let mailer = SmtpTransport::builder("mail.domain.tld").port(25).build();
//! mailer.send(&envelope, &message)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! * **hostname** (default): use the local host name as `EHLO`/`HELO` argument
//! * **tracing**: log the SMTP dialogue at debug level through `tracing`
//! * **serde**: `Serialize`/`Deserialize` for the configuration types

#![doc(html_root_url = "https://docs.rs/crate/smtp-courier/0.1.0")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    rust_2018_idioms,
    clippy::string_add,
    clippy::string_add_assign,
    clippy::clone_on_ref_ptr,
    clippy::verbose_file_reads,
    clippy::unnecessary_self_imports,
    clippy::string_to_string,
    clippy::mem_forget,
    clippy::cast_lossless,
    clippy::inefficient_to_string,
    clippy::inline_always,
    clippy::linkedlist,
    clippy::macro_use_imports,
    clippy::manual_assert,
    clippy::unnecessary_join,
    clippy::wildcard_imports,
    clippy::zero_sized_map_values
)]

pub mod address;
pub mod message;
pub mod transport;

pub use crate::{
    address::{Address, Envelope},
    message::Message,
    transport::{
        smtp::{Error, SmtpTransport},
        Transport,
    },
};

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;
