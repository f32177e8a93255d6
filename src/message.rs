//! Pre-rendered message content

/// A message as handed over by the composition layer.
///
/// Both parts are already fully rendered (headers folded, MIME parts and
/// transfer encodings applied). They are joined with one line ending when
/// the message is transmitted, and nothing else is interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message {
    header: String,
    body: String,
}

impl Message {
    /// Creates a message from its header block and body block
    pub fn new<H: Into<String>, B: Into<String>>(header: H, body: B) -> Message {
        Message {
            header: header.into(),
            body: body.into(),
        }
    }

    /// The header block
    pub fn header(&self) -> &str {
        &self.header
    }

    /// The body block
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Length in bytes of both blocks
    pub fn len(&self) -> usize {
        self.header.len() + self.body.len()
    }

    /// Whether both blocks are empty
    pub fn is_empty(&self) -> bool {
        self.header.is_empty() && self.body.is_empty()
    }
}
