//! SMTP client
//!
//! `SmtpConnection` allows manually sending SMTP commands.
//!
//! ```rust,no_run
//! use smtp_courier::{
//!     transport::smtp::{
//!         client::SmtpConnection,
//!         commands::{Data, Helo, Mail, Rcpt},
//!         extension::{ClientId, LineEnding},
//!     },
//!     Address, Message,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut conn = SmtpConnection::new(LineEnding::Crlf);
//! conn.connect(("localhost", 25), None)?;
//! conn.command(Helo::new(ClientId::Domain("my_hostname".to_owned())), &[250])?;
//! conn.command(Mail::new("user@example.com".parse::<Address>()?), &[250])?;
//! conn.command(Rcpt::new("user@example.org".parse::<Address>()?), &[250, 251])?;
//! conn.command(Data, &[354])?;
//! conn.message(&Message::new("Subject: test", "test"))?;
//! conn.quit()?;
//! # Ok(())
//! # }
//! ```

pub use self::{connection::SmtpConnection, net::NetworkStream};
use super::extension::LineEnding;
use crate::Message;

mod connection;
#[cfg(test)]
pub(crate) mod mock;
mod net;

/// Where a session is in the SMTP dialogue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No connection opened yet
    Idle,
    /// TCP connection open, banner read
    Connected,
    /// EHLO/HELO and HELP accepted
    Greeted,
    /// `AUTH LOGIN` accepted
    Authenticated,
    /// MAIL FROM and every RCPT TO accepted
    EnvelopeSet,
    /// Message content accepted
    DataSent,
    /// QUIT sent
    Closing,
    /// QUIT acknowledged and connection closed
    Closed,
    /// A step failed, connection closed
    Failed,
}

impl SessionState {
    /// Whether a connection handle belongs to this state
    pub fn is_open(self) -> bool {
        matches!(
            self,
            SessionState::Connected
                | SessionState::Greeted
                | SessionState::Authenticated
                | SessionState::EnvelopeSet
                | SessionState::DataSent
                | SessionState::Closing
        )
    }
}

/// The codec used for transparency
///
/// Joins header and body with one line ending, splits the result on the
/// configured line ending and doubles a leading `.` on every line, so that
/// nothing in the content can be read as the end of data.
#[derive(Clone, Copy, Debug)]
pub struct ClientCodec {
    line_ending: LineEnding,
}

impl ClientCodec {
    /// Creates a new client codec
    pub fn new(line_ending: LineEnding) -> Self {
        ClientCodec { line_ending }
    }

    /// Adds transparency
    pub fn encode(&self, message: &Message, buf: &mut Vec<u8>) {
        let separator = self.line_ending.as_str();
        let content = [message.header(), message.body()].join(separator);

        for line in content.split(separator) {
            if line.starts_with('.') {
                buf.push(b'.');
            }
            buf.extend_from_slice(line.as_bytes());
            buf.extend_from_slice(separator.as_bytes());
        }
    }
}

/// Returns the string replacing all the CRLF with "\<CRLF\>"
/// Used for debug displays
#[cfg(feature = "tracing")]
pub(super) fn escape_crlf(string: &str) -> String {
    string.replace("\r\n", "<CRLF>")
}
