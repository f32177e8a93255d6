use std::{
    fmt::{self, Debug, Formatter},
    io::{self, Read, Write},
    net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs},
    time::Duration,
};

use socket2::{Domain, Protocol, Socket, Type};

#[cfg(test)]
use super::mock::MockStream;
use crate::transport::smtp::{error, Error};

/// Represents the different types of underlying network streams
pub enum NetworkStream {
    /// Plain TCP stream
    Tcp(TcpStream),
    /// Scripted stream for tests
    #[cfg(test)]
    Mock(MockStream),
}

impl NetworkStream {
    /// Returns peer's address
    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        match *self {
            NetworkStream::Tcp(ref s) => s.peer_addr(),
            #[cfg(test)]
            NetworkStream::Mock(_) => Ok(SocketAddr::from(([127, 0, 0, 1], 25))),
        }
    }

    /// Shutdowns the connection
    pub fn shutdown(&self, how: Shutdown) -> io::Result<()> {
        match *self {
            NetworkStream::Tcp(ref s) => s.shutdown(how),
            #[cfg(test)]
            NetworkStream::Mock(_) => Ok(()),
        }
    }

    /// Opens a TCP connection, trying every address `server` resolves to
    pub fn connect<T: ToSocketAddrs>(
        server: T,
        timeout: Option<Duration>,
    ) -> Result<NetworkStream, Error> {
        let addrs = server.to_socket_addrs().map_err(error::connection)?;

        let mut last_err = None;
        for addr in addrs {
            match try_connect(&addr, timeout) {
                Ok(stream) => return Ok(NetworkStream::Tcp(stream)),
                Err(err) => last_err = Some(err),
            }
        }

        Err(match last_err {
            Some(last_err) => error::connection(last_err),
            None => error::connection("could not resolve to any address"),
        })
    }

    /// Set read timeout for IO calls
    pub fn set_read_timeout(&mut self, duration: Option<Duration>) -> io::Result<()> {
        match *self {
            NetworkStream::Tcp(ref mut stream) => stream.set_read_timeout(duration),
            #[cfg(test)]
            NetworkStream::Mock(_) => Ok(()),
        }
    }

    /// Set write timeout for IO calls
    pub fn set_write_timeout(&mut self, duration: Option<Duration>) -> io::Result<()> {
        match *self {
            NetworkStream::Tcp(ref mut stream) => stream.set_write_timeout(duration),
            #[cfg(test)]
            NetworkStream::Mock(_) => Ok(()),
        }
    }
}

fn try_connect(addr: &SocketAddr, timeout: Option<Duration>) -> io::Result<TcpStream> {
    let socket = Socket::new(Domain::for_address(*addr), Type::STREAM, Some(Protocol::TCP))?;
    match timeout {
        Some(timeout) => socket.connect_timeout(&(*addr).into(), timeout)?,
        None => socket.connect(&(*addr).into())?,
    }
    Ok(socket.into())
}

impl Debug for NetworkStream {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            NetworkStream::Tcp(ref s) => f.debug_tuple("Tcp").field(s).finish(),
            #[cfg(test)]
            NetworkStream::Mock(_) => f.write_str("Mock"),
        }
    }
}

impl Read for NetworkStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match *self {
            NetworkStream::Tcp(ref mut s) => s.read(buf),
            #[cfg(test)]
            NetworkStream::Mock(ref mut s) => s.read(buf),
        }
    }
}

impl Write for NetworkStream {
    fn write(&mut self, msg: &[u8]) -> io::Result<usize> {
        match *self {
            NetworkStream::Tcp(ref mut s) => s.write(msg),
            #[cfg(test)]
            NetworkStream::Mock(ref mut s) => s.write(msg),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match *self {
            NetworkStream::Tcp(ref mut s) => s.flush(),
            #[cfg(test)]
            NetworkStream::Mock(ref mut s) => s.flush(),
        }
    }
}
