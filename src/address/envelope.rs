use super::Address;

/// Sender and recipients of one SMTP transaction.
///
/// Recipients are kept in three ordered lists. They are announced to the
/// server in `to`, `cc`, `bcc` order, each entry with its own `RCPT TO`, and
/// duplicates are not removed.
#[derive(PartialEq, Eq, Clone, Debug, Default)]
pub struct Envelope {
    /// The envelope sender address
    ///
    /// When absent, the sender configured on the transport is used.
    reverse_path: Option<Address>,
    to: Vec<Address>,
    cc: Vec<Address>,
    bcc: Vec<Address>,
}

impl Envelope {
    /// Creates an envelope with primary recipients only
    ///
    /// ```
    /// use smtp_courier::{Address, Envelope};
    ///
    /// # use std::error::Error;
    /// # fn main() -> Result<(), Box<dyn Error>> {
    /// let envelope = Envelope::new(
    ///     Some("from@email.com".parse::<Address>()?),
    ///     vec!["to@email.com".parse::<Address>()?],
    /// )
    /// .with_bcc(vec!["archive@email.com".parse::<Address>()?]);
    ///
    /// assert_eq!(envelope.recipients().count(), 2);
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(from: Option<Address>, to: Vec<Address>) -> Envelope {
        Envelope {
            reverse_path: from,
            to,
            cc: Vec::new(),
            bcc: Vec::new(),
        }
    }

    /// Sets the carbon-copy recipients
    pub fn with_cc(mut self, cc: Vec<Address>) -> Envelope {
        self.cc = cc;
        self
    }

    /// Sets the blind carbon-copy recipients
    pub fn with_bcc(mut self, bcc: Vec<Address>) -> Envelope {
        self.bcc = bcc;
        self
    }

    /// Gets the sender of the envelope
    pub fn from(&self) -> Option<&Address> {
        self.reverse_path.as_ref()
    }

    /// Primary recipients
    pub fn to(&self) -> &[Address] {
        &self.to
    }

    /// Carbon-copy recipients
    pub fn cc(&self) -> &[Address] {
        &self.cc
    }

    /// Blind carbon-copy recipients
    pub fn bcc(&self) -> &[Address] {
        &self.bcc
    }

    /// Every recipient, in the order `RCPT TO` commands are issued
    pub fn recipients(&self) -> impl Iterator<Item = &Address> {
        self.to.iter().chain(&self.cc).chain(&self.bcc)
    }
}
