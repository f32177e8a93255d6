//! Validated email address

use std::{
    error::Error,
    fmt::{Display, Formatter, Result as FmtResult},
    net::IpAddr,
    str::FromStr,
};

use email_address::EmailAddress;
use idna::domain_to_ascii;

/// An email address as it appears in `MAIL FROM` and `RCPT TO`.
///
/// The address is checked on construction, so it never contains angle
/// brackets, whitespace or line breaks that would corrupt an SMTP command.
///
/// ```
/// use smtp_courier::Address;
///
/// # use std::error::Error;
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let address = "user@email.com".parse::<Address>()?;
/// assert_eq!(address.user(), "user");
/// assert_eq!(address.domain(), "email.com");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct Address {
    serialized: String,
    /// Index of the '@'
    at: usize,
}

impl Address {
    /// Builds an address from its user and domain parts
    pub fn new<U: AsRef<str>, D: AsRef<str>>(user: U, domain: D) -> Result<Self, AddressError> {
        let (user, domain) = (user.as_ref(), domain.as_ref());
        check_input(user)?;
        check_input(domain)?;
        check_user(user)?;
        check_domain(domain)?;

        Ok(Address {
            serialized: format!("{user}@{domain}"),
            at: user.len(),
        })
    }

    /// Part before the '@'
    pub fn user(&self) -> &str {
        &self.serialized[..self.at]
    }

    /// Part after the '@'
    pub fn domain(&self) -> &str {
        &self.serialized[self.at + 1..]
    }
}

fn check_input(val: &str) -> Result<(), AddressError> {
    if val.chars().any(|c| c.is_control() || c == '<' || c == '>') {
        Err(AddressError::InvalidInput)
    } else {
        Ok(())
    }
}

fn check_address(val: &str) -> Result<usize, AddressError> {
    check_input(val)?;
    let (user, domain) = val.rsplit_once('@').ok_or(AddressError::MissingParts)?;
    check_user(user)?;
    check_domain(domain)?;
    Ok(user.len())
}

fn check_user(user: &str) -> Result<(), AddressError> {
    if EmailAddress::is_valid_local_part(user) {
        Ok(())
    } else {
        Err(AddressError::InvalidUser)
    }
}

fn check_domain(domain: &str) -> Result<(), AddressError> {
    check_domain_ascii(domain).or_else(|_| {
        domain_to_ascii(domain)
            .map_err(|_| AddressError::InvalidDomain)
            .and_then(|domain| check_domain_ascii(&domain))
    })
}

fn check_domain_ascii(domain: &str) -> Result<(), AddressError> {
    if EmailAddress::is_valid_domain(domain) {
        return Ok(());
    }

    // address literal
    let ip = domain
        .strip_prefix('[')
        .and_then(|ip| ip.strip_suffix(']'))
        .map(|ip| ip.strip_prefix("IPv6:").unwrap_or(ip))
        .unwrap_or(domain);

    if ip.parse::<IpAddr>().is_ok() {
        Ok(())
    } else {
        Err(AddressError::InvalidDomain)
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.serialized)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(val: &str) -> Result<Self, AddressError> {
        let at = check_address(val)?;
        Ok(Address {
            serialized: val.to_owned(),
            at,
        })
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(serialized: String) -> Result<Self, AddressError> {
        let at = check_address(&serialized)?;
        Ok(Address { serialized, at })
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.serialized
    }
}

/// Reasons an address is rejected
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[non_exhaustive]
pub enum AddressError {
    /// No '@' separating user and domain
    MissingParts,
    /// Invalid local part
    InvalidUser,
    /// Invalid domain or address literal
    InvalidDomain,
    /// Control characters or angle brackets
    InvalidInput,
}

impl Error for AddressError {}

impl Display for AddressError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            AddressError::MissingParts => f.write_str("Missing domain or user"),
            AddressError::InvalidUser => f.write_str("Invalid email user"),
            AddressError::InvalidDomain => f.write_str("Invalid email domain"),
            AddressError::InvalidInput => f.write_str("Invalid input"),
        }
    }
}
