//! Error and result type for SMTP clients

use std::{error::Error as StdError, fmt};

use super::response::Response;
use crate::BoxError;

// Inspired by https://github.com/seanmonstar/reqwest/blob/a8566383168c0ef06c21f38cbc9213af6ff6db31/src/error.rs

/// The Errors that may occur when sending an email over SMTP
pub struct Error {
    inner: Box<Inner>,
}

struct Inner {
    kind: Kind,
    source: Option<BoxError>,
}

impl Error {
    pub(crate) fn new<E>(kind: Kind, source: Option<E>) -> Error
    where
        E: Into<BoxError>,
    {
        Error {
            inner: Box::new(Inner {
                kind,
                source: source.map(Into::into),
            }),
        }
    }

    /// Returns true if the transport was not configured well enough to connect
    pub fn is_configuration(&self) -> bool {
        matches!(self.inner.kind, Kind::Configuration)
    }

    /// Returns true if the TCP connection could not be established
    pub fn is_connection(&self) -> bool {
        matches!(self.inner.kind, Kind::Connection)
    }

    /// Returns true if a command got an unexpected reply or could not be exchanged
    pub fn is_command(&self) -> bool {
        matches!(self.inner.kind, Kind::Command(_))
    }

    /// Returns true if the `AUTH LOGIN` exchange failed
    pub fn is_authentication(&self) -> bool {
        matches!(self.inner.kind, Kind::Authentication)
    }

    /// Returns true if the error is from client
    pub fn is_client(&self) -> bool {
        matches!(self.inner.kind, Kind::Client)
    }

    /// Returns true if the error is caused by a timeout
    pub fn is_timeout(&self) -> bool {
        let mut source = self.source();

        while let Some(err) = source {
            if let Some(io_err) = err.downcast_ref::<std::io::Error>() {
                return matches!(
                    io_err.kind(),
                    std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
                );
            }

            source = err.source();
        }

        false
    }

    /// The failed command, if the error comes from the dialogue
    pub fn command_failure(&self) -> Option<&CommandFailure> {
        match self.inner.kind {
            Kind::Command(ref failure) => Some(failure),
            _ => None,
        }
    }

    /// Returns the reply code, if the error was generated from a reply
    pub fn status(&self) -> Option<u16> {
        self.command_failure().and_then(CommandFailure::code)
    }
}

#[derive(Debug)]
pub(crate) enum Kind {
    /// Host or port missing, or no sender available
    Configuration,
    /// TCP connection could not be established
    Connection,
    /// Unexpected reply code, or failed write/read with an expectation set
    Command(CommandFailure),
    /// One of the `AUTH LOGIN` steps failed
    Authentication,
    /// Internal client error
    Client,
}

/// A command whose reply was not one of the expected codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFailure {
    command: String,
    expected: Vec<u16>,
    code: Option<u16>,
    response: Option<String>,
}

impl CommandFailure {
    pub(crate) fn new(
        command: &str,
        expected: &[u16],
        response: Option<&Response>,
    ) -> CommandFailure {
        CommandFailure {
            command: command.to_owned(),
            expected: expected.to_vec(),
            code: response.and_then(Response::code),
            response: response.map(|r| r.raw().to_owned()),
        }
    }

    /// The command line as sent, without line ending
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Reply codes that would have been accepted
    pub fn expected(&self) -> &[u16] {
        &self.expected
    }

    /// The raw reply, `None` if the exchange failed before a reply was read
    pub fn response(&self) -> Option<&str> {
        self.response.as_deref()
    }

    /// Code of the reply, when it starts with three digits
    pub fn code(&self) -> Option<u16> {
        self.code
    }
}

impl fmt::Display for CommandFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unexpected response to [{}], expecting: ", self.command)?;
        for (i, code) in self.expected.iter().enumerate() {
            if i > 0 {
                f.write_str(" or ")?;
            }
            write!(f, "{code}")?;
        }
        match self.response {
            Some(ref response) => write!(f, ", received: {}", response.trim_end()),
            None => f.write_str(", received nothing"),
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = f.debug_struct("smtp_courier::transport::smtp::Error");

        builder.field("kind", &self.inner.kind);

        if let Some(ref source) = self.inner.source {
            builder.field("source", source);
        }

        builder.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.kind {
            Kind::Configuration => f.write_str("configuration error")?,
            Kind::Connection => f.write_str("could not connect to SMTP")?,
            Kind::Command(ref failure) => write!(f, "command failed: {failure}")?,
            Kind::Authentication => f.write_str("failed authentication")?,
            Kind::Client => f.write_str("internal client error")?,
        };

        if let Some(ref e) = self.inner.source {
            write!(f, ": {e}")?;
        }

        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source.as_ref().map(|e| {
            let r: &(dyn std::error::Error + 'static) = &**e;
            r
        })
    }
}

pub(crate) fn configuration<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Configuration, Some(e))
}

pub(crate) fn connection<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Connection, Some(e))
}

pub(crate) fn command(failure: CommandFailure, source: Option<std::io::Error>) -> Error {
    Error::new(Kind::Command(failure), source)
}

pub(crate) fn authentication() -> Error {
    Error::new::<BoxError>(Kind::Authentication, None)
}

pub(crate) fn client<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Client, Some(e))
}
