//! Credentials for the `AUTH LOGIN` mechanism
//!
//! LOGIN is obsolete but still the lowest common denominator among relays.
//! It is defined in [draft-murchison-sasl-login-00](https://www.ietf.org/archive/id/draft-murchison-sasl-login-00.txt):
//! after `AUTH LOGIN` the server prompts twice with 334, and the client
//! answers with the base64 encoded username, then password.

use std::fmt::{self, Debug, Formatter};

use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Contains user credentials
#[derive(PartialEq, Eq, Clone, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Credentials {
    authentication_identity: String,
    secret: String,
}

impl Credentials {
    /// Create a `Credentials` struct from username and password
    pub fn new(username: String, password: String) -> Credentials {
        Credentials {
            authentication_identity: username,
            secret: password,
        }
    }

    /// Authentication only happens when both parts are non-empty
    pub fn is_complete(&self) -> bool {
        !self.authentication_identity.is_empty() && !self.secret.is_empty()
    }

    /// Answer to the first `334` prompt
    pub(crate) fn encoded_identity(&self) -> String {
        STANDARD.encode(&self.authentication_identity)
    }

    /// Answer to the second `334` prompt
    pub(crate) fn encoded_secret(&self) -> String {
        STANDARD.encode(&self.secret)
    }
}

impl<S, T> From<(S, T)> for Credentials
where
    S: Into<String>,
    T: Into<String>,
{
    fn from((username, password): (S, T)) -> Self {
        Credentials::new(username.into(), password.into())
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials").finish()
    }
}
