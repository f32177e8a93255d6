// Comes from https://github.com/inre/rust-mq/blob/master/netopt

use std::{
    io::{self, Cursor, Read, Write},
    sync::{Arc, Mutex},
};

type MockCursor = Cursor<Vec<u8>>;

/// A stream whose server side is scripted up front.
///
/// SMTP is strictly turn based, so every reply the server will ever give can
/// be queued before the session starts. Clones share both buffers, which lets
/// a test keep a handle and inspect what the session wrote.
#[derive(Clone, Debug, Default)]
pub struct MockStream {
    reader: Arc<Mutex<MockCursor>>,
    writer: Arc<Mutex<MockCursor>>,
}

impl MockStream {
    pub fn with_replies(replies: &[&str]) -> MockStream {
        let mut script = String::new();
        for reply in replies {
            script.push_str(reply);
            script.push_str("\r\n");
        }
        MockStream {
            reader: Arc::new(Mutex::new(MockCursor::new(script.into_bytes()))),
            writer: Arc::default(),
        }
    }

    /// Everything written so far
    pub fn written(&self) -> String {
        String::from_utf8_lossy(self.writer.lock().unwrap().get_ref()).into_owned()
    }

    /// Written lines, split on CRLF
    pub fn written_lines(&self) -> Vec<String> {
        let written = self.written();
        let mut lines: Vec<String> = written.split("\r\n").map(ToOwned::to_owned).collect();
        if lines.last().is_some_and(String::is_empty) {
            lines.pop();
        }
        lines
    }
}

impl Write for MockStream {
    fn write(&mut self, msg: &[u8]) -> io::Result<usize> {
        self.writer.lock().unwrap().write(msg)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.lock().unwrap().flush()
    }
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.lock().unwrap().read(buf)
    }
}

#[cfg(test)]
mod test {
    use std::io::{Read, Write};

    use super::MockStream;

    #[test]
    fn replies_are_crlf_terminated() {
        let mut mock = MockStream::with_replies(&["220 ready", "250 ok"]);
        let mut read = String::new();
        mock.read_to_string(&mut read).unwrap();
        assert_eq!(read, "220 ready\r\n250 ok\r\n");
    }

    #[test]
    fn clones_share_the_written_side() {
        let mut mock = MockStream::default();
        let observer = mock.clone();
        mock.write_all(b"HELO x\r\nHELP\r\n").unwrap();
        assert_eq!(observer.written_lines(), ["HELO x", "HELP"]);
    }
}
