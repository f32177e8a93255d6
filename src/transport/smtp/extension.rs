//! Session parameters exchanged with or imposed on the server

use std::{
    fmt::{self, Display, Formatter},
    net::{Ipv4Addr, Ipv6Addr},
};

/// Client identifier, the parameter to `EHLO` and `HELO`
#[derive(PartialEq, Eq, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum ClientId {
    /// A fully-qualified domain name
    Domain(String),
    /// An IPv4 address
    Ipv4(Ipv4Addr),
    /// An IPv6 address
    Ipv6(Ipv6Addr),
}

/// Used when the local host name cannot be determined
pub const DEFAULT_DOMAIN_CLIENT_ID: &str = "localhost.local";

impl Default for ClientId {
    fn default() -> Self {
        #[cfg(feature = "hostname")]
        {
            hostname::get()
                .ok()
                .and_then(|s| s.into_string().ok())
                .filter(|s| !s.is_empty())
                .map(Self::Domain)
                .unwrap_or_else(|| Self::Domain(DEFAULT_DOMAIN_CLIENT_ID.to_owned()))
        }
        #[cfg(not(feature = "hostname"))]
        Self::Domain(DEFAULT_DOMAIN_CLIENT_ID.to_owned())
    }
}

impl Display for ClientId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Domain(ref value) => f.write_str(value),
            Self::Ipv4(ref value) => write!(f, "[{value}]"),
            Self::Ipv6(ref value) => write!(f, "[IPv6:{value}]"),
        }
    }
}

/// Line separator used on the wire and to split the message into lines
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LineEnding {
    /// `\r\n`, what RFC 5321 mandates
    #[default]
    Crlf,
    /// `\n`, for relays that accept bare line feeds
    Lf,
    /// `\r`
    Cr,
}

impl LineEnding {
    /// The separator itself
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Crlf => "\r\n",
            LineEnding::Lf => "\n",
            LineEnding::Cr => "\r",
        }
    }
}

/// Content transfer encoding the message body was rendered with
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BodyEncoding {
    /// 7bit ASCII
    #[default]
    SevenBit,
    /// 8bit, needs an `EHLO` greeting
    EightBit,
    /// quoted-printable
    QuotedPrintable,
    /// base64
    Base64,
}

impl BodyEncoding {
    /// Whether the body may contain non-ASCII bytes
    pub fn is_eight_bit_clean(self) -> bool {
        self == BodyEncoding::EightBit
    }
}
