//! The SMTP transport hands messages to a relay using the SMTP protocol.
//!
//! It follows the classic client dialogue of [RFC
//! 5321](https://tools.ietf.org/html/rfc5321) over a plain TCP connection,
//! with a single extension:
//!
//! * AUTH ([RFC 4954](http://tools.ietf.org/html/rfc4954)) with the LOGIN mechanism
//!
//! One connection is opened per message and closed once the relay has
//! accepted (or refused) it. There is no TLS, no pooling and no retry: a
//! refusal at any step ends the delivery with an [`Error`].
//!
//! #### Dialogue
//!
//! ```text
//! <- 220 banner (read, not checked)
//! -> EHLO or HELO <hello name>   expects 250 (EHLO falls back to HELO)
//! -> HELP                        expects 214
//! -> AUTH LOGIN                  expects 334 (only with credentials)
//! -> base64(username)            expects 334
//! -> base64(password)            expects 235
//! -> MAIL FROM:<sender>          expects 250
//! -> RCPT TO:<recipient>         expects 250 or 251, for to, cc then bcc
//! -> DATA                        expects 354
//! -> dot-stuffed header and body
//! -> .                           expects 250
//! -> QUIT                        expects 221
//! ```
//!
//! #### Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use smtp_courier::{
//!     transport::smtp::{authentication::Credentials, extension::LineEnding},
//!     Address, Envelope, Message, SmtpTransport, Transport,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mailer = SmtpTransport::builder("smtp.example.com")
//!     .port(587)
//!     .timeout(Some(Duration::from_secs(10)))
//!     .credentials(Credentials::new("username".to_owned(), "password".to_owned()))
//!     .line_ending(LineEnding::Crlf)
//!     .build();
//!
//! let envelope = Envelope::new(
//!     Some("a@example.com".parse::<Address>()?),
//!     vec!["b@example.com".parse::<Address>()?],
//! );
//! mailer.send(&envelope, &Message::new("Subject: hi", "hello"))?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use crate::Address;

use self::{
    authentication::Credentials,
    extension::{BodyEncoding, ClientId, LineEnding},
};
pub use self::{
    client::{SessionState, SmtpConnection},
    error::{CommandFailure, Error},
    response::Response,
    transport::{SmtpClient, SmtpTransport, SmtpTransportBuilder},
};

pub mod authentication;
pub mod client;
pub mod commands;
mod connection_url;
mod error;
pub mod extension;
pub mod response;
mod transport;

/// Default smtp port
pub const SMTP_PORT: u16 = 25;
/// Default submission port
pub const SUBMISSION_PORT: u16 = 587;

/// Default timeout for connecting and for each read or write
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Everything needed to open and drive one session
#[derive(Debug, Clone)]
struct SmtpInfo {
    /// Name sent during EHLO or HELO
    hello_name: ClientId,
    /// Server we are connecting to
    server: String,
    /// Port to connect to
    port: u16,
    /// Credentials for `AUTH LOGIN`
    credentials: Option<Credentials>,
    /// Timeout for connect, reads and writes
    timeout: Option<Duration>,
    /// Separator used on the wire and to split the message into lines
    line_ending: LineEnding,
    /// Transfer encoding of the body, decides between EHLO and HELO
    encoding: BodyEncoding,
    /// Sender used when the envelope has none
    sender: Option<Address>,
}

impl Default for SmtpInfo {
    fn default() -> Self {
        Self {
            hello_name: ClientId::default(),
            server: "localhost".to_owned(),
            port: SMTP_PORT,
            credentials: None,
            timeout: Some(DEFAULT_TIMEOUT),
            line_ending: LineEnding::default(),
            encoding: BodyEncoding::default(),
            sender: None,
        }
    }
}

impl SmtpInfo {
    /// Fails when the relay cannot be addressed at all
    fn check(&self) -> Result<(), Error> {
        if self.server.trim().is_empty() {
            return Err(error::configuration("no SMTP host configured"));
        }
        if self.port == 0 {
            return Err(error::configuration("no SMTP port configured"));
        }
        Ok(())
    }

    /// Credentials to authenticate with, if both parts are present
    fn login(&self) -> Option<&Credentials> {
        self.credentials.as_ref().filter(|c| c.is_complete())
    }

    /// EHLO is only needed for AUTH or an 8-bit body
    fn wants_ehlo(&self) -> bool {
        self.login().is_some() || self.encoding.is_eight_bit_clean()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn check_rejects_missing_host_and_port() {
        let info = SmtpInfo {
            server: " ".to_owned(),
            ..Default::default()
        };
        assert!(info.check().unwrap_err().is_configuration());

        let info = SmtpInfo {
            port: 0,
            ..Default::default()
        };
        assert!(info.check().unwrap_err().is_configuration());

        assert!(SmtpInfo::default().check().is_ok());
    }

    #[test]
    fn ehlo_only_for_auth_or_eight_bit() {
        let mut info = SmtpInfo::default();
        assert!(!info.wants_ehlo());

        info.credentials = Some(Credentials::new("user".to_owned(), String::new()));
        assert!(!info.wants_ehlo());

        info.credentials = Some(Credentials::new("user".to_owned(), "pass".to_owned()));
        assert!(info.wants_ehlo());

        info.credentials = None;
        info.encoding = BodyEncoding::EightBit;
        assert!(info.wants_ehlo());
    }
}
