use std::{
    fmt::Display,
    io::{self, BufRead, BufReader, Read, Write},
    net::{Shutdown, ToSocketAddrs},
    time::Duration,
};

#[cfg(feature = "tracing")]
use super::escape_crlf;
use super::{ClientCodec, NetworkStream, SessionState};
use crate::{
    transport::smtp::{
        authentication::Credentials,
        commands::{AuthLogin, Data, DataEnd, Ehlo, Helo, Help, Mail, Noop, Quit, Rcpt},
        error::{self, CommandFailure, Error},
        extension::{ClientId, LineEnding},
        response::{is_last_line, Response, MAX_LINE_LENGTH},
    },
    Address, Message,
};

/// Shown in logs and errors instead of credential lines
const REDACTED: &str = "<redacted>";

macro_rules! try_smtp (
    ($err: expr, $client: ident) => ({
        match $err {
            Ok(val) => val,
            Err(err) => {
                $client.abort();
                return Err(From::from(err))
            },
        }
    })
);

/// Structure that implements the SMTP client
///
/// One value drives one message delivery. Every step that fails closes the
/// connection before the error is returned, and dropping the value closes
/// it as well.
#[derive(Debug)]
pub struct SmtpConnection {
    /// TCP stream between client and server
    ///
    /// `Some` exactly while the state is open
    stream: Option<BufReader<NetworkStream>>,
    state: SessionState,
    line_ending: LineEnding,
    /// An I/O error occurred, the stream can not be trusted anymore
    broken: bool,
}

impl SmtpConnection {
    /// Creates an idle session, no connection is opened yet
    pub fn new(line_ending: LineEnding) -> SmtpConnection {
        SmtpConnection {
            stream: None,
            state: SessionState::Idle,
            line_ending,
            broken: false,
        }
    }

    /// Current position in the dialogue
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Connects to the server and reads its banner
    pub fn connect<A: ToSocketAddrs>(
        &mut self,
        server: A,
        timeout: Option<Duration>,
    ) -> Result<(), Error> {
        if self.state != SessionState::Idle {
            return Err(error::client("a session only opens one connection"));
        }
        let stream = NetworkStream::connect(server, timeout)?;
        #[cfg(feature = "tracing")]
        tracing::debug!(peer = ?stream.peer_addr().ok(), "connected");
        self.attach(stream, timeout)
    }

    /// Takes ownership of an established stream and drains the banner
    pub(crate) fn attach(
        &mut self,
        mut stream: NetworkStream,
        timeout: Option<Duration>,
    ) -> Result<(), Error> {
        stream
            .set_read_timeout(timeout)
            .and_then(|()| stream.set_write_timeout(timeout))
            .map_err(error::connection)?;
        self.stream = Some(BufReader::new(stream));
        self.state = SessionState::Connected;

        // The banner is consumed, not checked
        if let Err(_err) = self.read_response() {
            #[cfg(feature = "tracing")]
            tracing::debug!("could not read banner: {}", _err);
            self.broken = true;
        }
        Ok(())
    }

    /// Says hello, then sends HELP
    ///
    /// With `extended`, `EHLO` is tried first and `HELO` is only sent if it
    /// is not answered with 250.
    pub fn greet(&mut self, hello_name: &ClientId, extended: bool) -> Result<(), Error> {
        let greeted = extended
            && self
                .try_command(Ehlo::new(hello_name.clone()))
                .is_some_and(|response| response.has_code(250));
        if !greeted {
            try_smtp!(self.command(Helo::new(hello_name.clone()), &[250]), self);
        }
        try_smtp!(self.command(Help, &[214]), self);
        self.state = SessionState::Greeted;
        Ok(())
    }

    /// Authenticates with `AUTH LOGIN`
    ///
    /// Whichever of the three steps fails, the error is an authentication
    /// error.
    pub fn auth(&mut self, credentials: &Credentials) -> Result<Response, Error> {
        match self.login(credentials) {
            Ok(response) => {
                self.state = SessionState::Authenticated;
                Ok(response)
            }
            Err(_) => {
                self.abort();
                Err(error::authentication())
            }
        }
    }

    fn login(&mut self, credentials: &Credentials) -> Result<Response, Error> {
        self.command(AuthLogin, &[334])?;
        self.exchange(&credentials.encoded_identity(), REDACTED, &[334])?;
        self.exchange(&credentials.encoded_secret(), REDACTED, &[235])
    }

    /// Declares the envelope and transmits the message
    ///
    /// Recipients are announced in iteration order; the first refused one
    /// ends the transaction.
    pub fn send<'a, I>(
        &mut self,
        sender: &Address,
        recipients: I,
        message: &Message,
    ) -> Result<Response, Error>
    where
        I: IntoIterator<Item = &'a Address>,
    {
        try_smtp!(self.command(Mail::new(sender.clone()), &[250]), self);

        for recipient in recipients {
            try_smtp!(
                self.command(Rcpt::new(recipient.clone()), &[250, 251]),
                self
            );
        }
        self.state = SessionState::EnvelopeSet;

        try_smtp!(self.command(Data, &[354]), self);

        let response = try_smtp!(self.message(message), self);
        self.state = SessionState::DataSent;
        Ok(response)
    }

    /// Sends the message content, then the final `.`
    pub fn message(&mut self, message: &Message) -> Result<Response, Error> {
        let mut out_buf = Vec::with_capacity(message.len() + 64);
        ClientCodec::new(self.line_ending).encode(message, &mut out_buf);

        if let Err(err) = self.write(&out_buf) {
            self.broken = true;
            return Err(error::command(
                CommandFailure::new("<message content>", &[250], None),
                Some(err),
            ));
        }
        #[cfg(feature = "tracing")]
        tracing::debug!("Wrote {} bytes of message content", out_buf.len());

        self.command(DataEnd, &[250])
    }

    /// Sends QUIT, expects 221, and closes the connection
    pub fn quit(&mut self) -> Result<Response, Error> {
        if self.stream.is_some() {
            self.state = SessionState::Closing;
        }
        let response = try_smtp!(self.command(Quit, &[221]), self);
        self.close();
        self.state = SessionState::Closed;
        Ok(response)
    }

    /// Checks if the server is connected using the NOOP SMTP command
    pub fn test_connected(&mut self) -> bool {
        self.command(Noop, &[250]).is_ok()
    }

    /// Closes the connection after a failure
    ///
    /// QUIT is still attempted, without expectation, when the stream is
    /// healthy and QUIT was not already the failing command.
    pub fn abort(&mut self) {
        if self.stream.is_some() && !self.broken && self.state != SessionState::Closing {
            let _ = self.try_command(Quit);
        }
        self.close();
        self.state = SessionState::Failed;
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.get_ref().shutdown(Shutdown::Both);
            #[cfg(feature = "tracing")]
            tracing::debug!("connection closed");
        }
    }

    /// Sends an SMTP command and checks the reply code against `expected`
    pub fn command<C: Display>(&mut self, command: C, expected: &[u16]) -> Result<Response, Error> {
        let line = command.to_string();
        self.exchange(&line, &line, expected)
    }

    /// Sends an SMTP command without expectation
    ///
    /// A failed exchange is returned as `None` instead of an error, any reply
    /// is returned as is.
    pub fn try_command<C: Display>(&mut self, command: C) -> Option<Response> {
        debug_assert_eq!(self.stream.is_some(), self.state.is_open());
        if self.stream.is_none() {
            return None;
        }
        let line = command.to_string();
        match self.round_trip(&line, &line) {
            Ok(response) => Some(response),
            Err(_) => {
                self.broken = true;
                None
            }
        }
    }

    /// Writes `line`, reads the reply and checks its code
    ///
    /// `shown` replaces `line` in logs and errors.
    fn exchange(&mut self, line: &str, shown: &str, expected: &[u16]) -> Result<Response, Error> {
        debug_assert_eq!(self.stream.is_some(), self.state.is_open());
        if self.stream.is_none() {
            return Err(error::client(format!(
                "[{shown}] issued without an open connection"
            )));
        }

        let response = match self.round_trip(line, shown) {
            Ok(response) => response,
            Err(err) => {
                self.broken = true;
                return Err(error::command(
                    CommandFailure::new(shown, expected, None),
                    Some(err),
                ));
            }
        };

        match response.code() {
            Some(code) if expected.contains(&code) => Ok(response),
            _ => Err(error::command(
                CommandFailure::new(shown, expected, Some(&response)),
                None,
            )),
        }
    }

    fn round_trip(&mut self, line: &str, shown: &str) -> io::Result<Response> {
        let mut out = String::with_capacity(line.len() + 2);
        out.push_str(line);
        out.push_str(self.line_ending.as_str());
        self.write(out.as_bytes())?;

        #[cfg(feature = "tracing")]
        tracing::debug!(">> {}", shown);
        #[cfg(not(feature = "tracing"))]
        let _ = shown;

        self.read_response()
    }

    /// Writes a string to the server
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotConnected))?;
        stream.get_mut().write_all(bytes)?;
        stream.get_mut().flush()
    }

    /// Gets the SMTP response
    ///
    /// Reads chunks of at most `MAX_LINE_LENGTH` bytes until the end of the
    /// first line that has a space as fourth character, or until the end of
    /// the stream.
    pub fn read_response(&mut self) -> io::Result<Response> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotConnected))?;

        let mut buffer = String::with_capacity(100);
        let mut line = Vec::with_capacity(MAX_LINE_LENGTH as usize);
        // Lines longer than the bound arrive in several chunks, only the
        // first one carries the code and separator
        let mut at_line_start = true;
        let mut in_last_line = false;
        loop {
            line.clear();
            let read = Read::take(&mut *stream, MAX_LINE_LENGTH).read_until(b'\n', &mut line)?;
            if read == 0 {
                break;
            }

            let text = String::from_utf8_lossy(&line);
            #[cfg(feature = "tracing")]
            tracing::debug!("<< {}", escape_crlf(&text));
            buffer.push_str(&text);

            if at_line_start && is_last_line(&text) {
                in_last_line = true;
            }
            at_line_start = line.ends_with(b"\n");
            if in_last_line && at_line_start {
                break;
            }
        }

        Ok(Response::new(buffer))
    }
}

impl Drop for SmtpConnection {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::transport::smtp::client::mock::MockStream;

    fn session(replies: &[&str]) -> (SmtpConnection, MockStream) {
        let mock = MockStream::with_replies(replies);
        let mut conn = SmtpConnection::new(LineEnding::Crlf);
        conn.attach(NetworkStream::Mock(mock.clone()), None).unwrap();
        (conn, mock)
    }

    fn addr(s: &str) -> Address {
        s.parse().unwrap()
    }

    fn hello() -> ClientId {
        ClientId::Domain("client.example".to_owned())
    }

    #[test]
    fn reads_multi_line_reply_up_to_the_space_line() {
        let (mut conn, _mock) = session(&[
            "220 banner",
            "250-first\r\n250-second\r\n250 last",
            "214 help",
        ]);
        let response = conn.command(Help, &[250]).unwrap();
        assert_eq!(response.raw(), "250-first\r\n250-second\r\n250 last\r\n");
        assert_eq!(response.lines().collect::<Vec<_>>(), ["first", "second", "last"]);

        // the next reply is still intact
        assert!(conn.command(Help, &[214]).is_ok());
    }

    #[test]
    fn multi_line_banner_is_drained() {
        let (mut conn, mock) = session(&["220-hello\r\n220-there\r\n220 ready", "250 ok"]);
        assert_eq!(conn.state(), SessionState::Connected);
        assert!(conn.command(Noop, &[250]).is_ok());
        assert_eq!(mock.written_lines(), ["NOOP"]);
    }

    #[test]
    fn unexpected_code_is_a_command_failure() {
        let (mut conn, _mock) = session(&["220 banner", "500 unknown command"]);
        let err = conn.command(Help, &[214]).unwrap_err();
        let failure = err.command_failure().unwrap();
        assert_eq!(failure.command(), "HELP");
        assert_eq!(failure.expected(), [214]);
        assert_eq!(failure.response(), Some("500 unknown command\r\n"));
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn end_of_stream_gives_an_empty_reply() {
        let (mut conn, _mock) = session(&["220 banner"]);
        assert_eq!(conn.try_command(Noop), Some(Response::new(String::new())));

        let err = conn.command(Noop, &[250]).unwrap_err();
        assert!(err.is_command());
        assert_eq!(err.command_failure().unwrap().response(), Some(""));
    }

    #[test]
    fn overlong_lines_are_read_in_bounded_chunks() {
        let long = format!("250-{}", "x".repeat(600));
        let (mut conn, _mock) = session(&["220 banner", &long, "250 done"]);
        let response = conn.command(Noop, &[250]).unwrap();
        assert!(response.raw().ends_with("250 done\r\n"));
        assert_eq!(response.raw().len(), long.len() + 2 + "250 done\r\n".len());
    }

    #[test]
    fn overlong_continuation_line_does_not_end_the_reply() {
        // the chunk after the bound starts with "abc " and is not a line start
        let long = format!("250-{}abc tail", "x".repeat(508));
        let (mut conn, _mock) = session(&["220 banner", &long, "250 done", "214 help"]);

        let response = conn.command(Noop, &[250]).unwrap();
        assert!(response.raw().ends_with("abc tail\r\n250 done\r\n"));
        assert!(conn.command(Help, &[214]).is_ok());
    }

    #[test]
    fn overlong_last_line_is_read_to_its_end() {
        let long = format!("250 {}", "y".repeat(700));
        let (mut conn, _mock) = session(&["220 banner", &long, "214 help"]);

        let response = conn.command(Noop, &[250]).unwrap();
        assert_eq!(response.raw(), format!("{long}\r\n"));
        assert!(conn.command(Help, &[214]).is_ok());
    }

    #[test]
    fn commands_without_connection_are_client_errors() {
        let mut conn = SmtpConnection::new(LineEnding::Crlf);
        assert_eq!(conn.state(), SessionState::Idle);
        assert!(conn.command(Noop, &[250]).unwrap_err().is_client());
        assert_eq!(conn.try_command(Noop), None);
    }

    #[test]
    fn ehlo_is_skipped_without_extension_needs() {
        let (mut conn, mock) = session(&["220 banner", "250 hi", "214 help"]);
        conn.greet(&hello(), false).unwrap();
        assert_eq!(mock.written_lines(), ["HELO client.example", "HELP"]);
        assert_eq!(conn.state(), SessionState::Greeted);
    }

    #[test]
    fn rejected_ehlo_falls_back_to_helo() {
        let (mut conn, mock) = session(&["220 banner", "500 what", "250 hi", "214 help"]);
        conn.greet(&hello(), true).unwrap();
        assert_eq!(
            mock.written_lines(),
            ["EHLO client.example", "HELO client.example", "HELP"]
        );
    }

    #[test]
    fn accepted_ehlo_skips_helo() {
        let (mut conn, mock) = session(&[
            "220 banner",
            "250-relay.example\r\n250 AUTH LOGIN",
            "214 help",
        ]);
        conn.greet(&hello(), true).unwrap();
        assert_eq!(mock.written_lines(), ["EHLO client.example", "HELP"]);
    }

    #[test]
    fn failed_help_aborts_the_session() {
        let (mut conn, mock) = session(&["220 banner", "250 hi", "502 no help", "221 bye"]);
        let err = conn.greet(&hello(), false).unwrap_err();
        assert!(err.is_command());
        assert_eq!(conn.state(), SessionState::Failed);
        assert_eq!(mock.written_lines(), ["HELO client.example", "HELP", "QUIT"]);
    }

    #[test]
    fn auth_login_sends_base64_lines() {
        let (mut conn, mock) = session(&["220 banner", "334 VXNlcm5hbWU6", "334 UGFzc3dvcmQ6", "235 ok"]);
        conn.auth(&Credentials::from(("alice", "wonderland")))
            .unwrap();
        assert_eq!(
            mock.written_lines(),
            ["AUTH LOGIN", "YWxpY2U=", "d29uZGVybGFuZA=="]
        );
        assert_eq!(conn.state(), SessionState::Authenticated);
    }

    #[test]
    fn auth_failure_at_any_step_is_uniform() {
        for replies in [
            &["220 banner", "504 no LOGIN", "221 bye"][..],
            &["220 banner", "334 VXNlcm5hbWU6", "535 bad user", "221 bye"][..],
            &["220 banner", "334 VXNlcm5hbWU6", "334 UGFzc3dvcmQ6", "535 bad", "221 bye"][..],
        ] {
            let (mut conn, mock) = session(replies);
            let err = conn.auth(&Credentials::from(("alice", "wonderland"))).unwrap_err();
            assert!(err.is_authentication());
            assert!(err.command_failure().is_none());
            assert_eq!(conn.state(), SessionState::Failed);
            assert_eq!(mock.written_lines().last().map(String::as_str), Some("QUIT"));
        }
    }

    #[test]
    fn rcpt_accepts_251() {
        let (mut conn, mock) = session(&[
            "220 banner",
            "250 sender ok",
            "251 not local, will forward",
            "250 ok",
            "354 go ahead",
            "250 queued",
        ]);
        let recipients = [addr("b@x.com"), addr("c@y.com")];
        let response = conn
            .send(&addr("a@x.com"), &recipients, &Message::new("Subject: t", "hi"))
            .unwrap();
        assert!(response.has_code(250));
        assert_eq!(conn.state(), SessionState::DataSent);
        assert_eq!(
            mock.written_lines(),
            [
                "MAIL FROM:<a@x.com>",
                "RCPT TO:<b@x.com>",
                "RCPT TO:<c@y.com>",
                "DATA",
                "Subject: t",
                "hi",
                "."
            ]
        );
    }

    #[test]
    fn mail_from_does_not_accept_251() {
        let (mut conn, mock) = session(&["220 banner", "251 forward", "221 bye"]);
        let err = conn
            .send(&addr("a@x.com"), &[addr("b@x.com")], &Message::default())
            .unwrap_err();
        assert_eq!(err.status(), Some(251));
        assert_eq!(mock.written_lines(), ["MAIL FROM:<a@x.com>", "QUIT"]);
    }

    #[test]
    fn one_refused_recipient_fails_the_delivery() {
        let (mut conn, mock) = session(&[
            "220 banner",
            "250 sender ok",
            "250 ok",
            "550 no such user",
            "221 bye",
        ]);
        let recipients = [addr("b@x.com"), addr("nobody@x.com"), addr("c@x.com")];
        let err = conn
            .send(&addr("a@x.com"), &recipients, &Message::default())
            .unwrap_err();
        assert_eq!(
            err.command_failure().unwrap().command(),
            "RCPT TO:<nobody@x.com>"
        );
        assert_eq!(
            mock.written_lines(),
            [
                "MAIL FROM:<a@x.com>",
                "RCPT TO:<b@x.com>",
                "RCPT TO:<nobody@x.com>",
                "QUIT"
            ]
        );
    }

    #[test]
    fn data_must_be_answered_with_354() {
        let (mut conn, mock) = session(&[
            "220 banner",
            "250 sender ok",
            "250 ok",
            "554 no valid recipients",
            "221 bye",
        ]);
        let err = conn
            .send(&addr("a@x.com"), &[addr("b@x.com")], &Message::new("Subject: t", "hi"))
            .unwrap_err();

        assert!(err.is_command());
        assert_eq!(err.command_failure().unwrap().command(), "DATA");
        assert_eq!(err.status(), Some(554));
        assert_eq!(conn.state(), SessionState::Failed);
        assert_eq!(
            mock.written_lines(),
            ["MAIL FROM:<a@x.com>", "RCPT TO:<b@x.com>", "DATA", "QUIT"]
        );
    }

    #[test]
    fn terminator_must_be_answered_with_250() {
        let (mut conn, mock) = session(&[
            "220 banner",
            "250 sender ok",
            "250 ok",
            "354 go ahead",
            "552 message too big",
            "221 bye",
        ]);
        let err = conn
            .send(&addr("a@x.com"), &[addr("b@x.com")], &Message::new("Subject: t", "hi"))
            .unwrap_err();

        assert!(err.is_command());
        assert_eq!(err.command_failure().unwrap().command(), ".");
        assert_eq!(err.command_failure().unwrap().expected(), [250]);
        assert_eq!(err.status(), Some(552));
        assert_eq!(conn.state(), SessionState::Failed);
        assert_eq!(
            mock.written_lines(),
            [
                "MAIL FROM:<a@x.com>",
                "RCPT TO:<b@x.com>",
                "DATA",
                "Subject: t",
                "hi",
                ".",
                "QUIT"
            ]
        );
    }

    #[test]
    fn quit_without_connection_keeps_state_consistent() {
        let mut conn = SmtpConnection::new(LineEnding::Crlf);
        assert!(conn.quit().unwrap_err().is_client());
        assert_eq!(conn.state(), SessionState::Failed);
        assert!(!conn.state().is_open());
    }

    #[test]
    fn content_lines_are_dot_stuffed() {
        let (mut conn, mock) = session(&["220 banner", "250 queued"]);
        conn.message(&Message::new("", "hello\r\n.\r\n..x\r\nworld"))
            .unwrap();
        assert_eq!(
            mock.written_lines(),
            ["", "hello", "..", "...x", "world", "."]
        );
    }

    #[test]
    fn configured_line_ending_is_used_on_the_wire() {
        let mock = MockStream::with_replies(&["220 banner", "250 hi", "214 help"]);
        let mut conn = SmtpConnection::new(LineEnding::Lf);
        conn.attach(NetworkStream::Mock(mock.clone()), None).unwrap();
        conn.greet(&hello(), false).unwrap();
        assert_eq!(mock.written(), "HELO client.example\nHELP\n");
    }

    #[test]
    fn quit_closes_the_connection() {
        let (mut conn, _mock) = session(&["220 banner", "221 bye"]);
        conn.quit().unwrap();
        assert_eq!(conn.state(), SessionState::Closed);
        assert!(conn.command(Noop, &[250]).unwrap_err().is_client());
    }

    #[test]
    fn refused_quit_is_not_sent_twice() {
        let (mut conn, mock) = session(&["220 banner", "500 no"]);
        assert!(conn.quit().unwrap_err().is_command());
        assert_eq!(conn.state(), SessionState::Failed);
        assert_eq!(mock.written_lines(), ["QUIT"]);
    }

    #[test]
    fn second_connect_is_refused() {
        let (mut conn, _mock) = session(&["220 banner"]);
        assert!(conn.connect(("localhost", 25), None).unwrap_err().is_client());
    }
}
