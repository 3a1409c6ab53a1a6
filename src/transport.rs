//! Byte transport unifying plain TCP and TLS behind the session contract.

use std::{
    fmt::Debug,
    io::{Error, ErrorKind, Read, Write},
    net::{Shutdown, SocketAddr, ToSocketAddrs},
    time::{Duration, Instant},
};

use log::debug;
use native_tls::Certificate;
use tcp_stream::{HandshakeError, MidHandshakeTlsStream, NativeTlsConnector, TcpStream};

use crate::{
    url::Scheme, DriveOutcome, Flush, Publish, PublishOutcome, Receive, ReceiveOutcome, Session,
    SessionStatus,
};

const READ_BUFFER_CAPACITY: usize = 4096;
const BLOCKING_CONNECT_POLL: Duration = Duration::from_millis(1);

/// TLS configuration for [`Transport`] connections.
///
/// With no `cert_chain`, the platform trust roots are used. The process-wide CA bundle of
/// a larger application is expected to be loaded once and passed here per client.
#[derive(Debug, Clone, Default)]
pub struct TlsOptions {
    /// Extra PEM-encoded root certificates to trust.
    pub cert_chain: Option<String>,
    /// Skip hostname verification. Only for test endpoints.
    pub accept_invalid_hostnames: bool,
}

struct TlsPlan {
    domain: String,
    options: TlsOptions,
}

/// Internal state machine of a transport connection
enum Connection {
    Initializing(
        mio::net::TcpStream,
        mio::Poll,
        mio::Events,
        Option<TlsPlan>,
    ),
    MidTlsHandshake(MidHandshakeTlsStream),
    Connected(TcpStream),
}
impl Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Initializing(_, _, _, _) => "Initializing",
            Self::MidTlsHandshake(_) => "MidTlsHandshake",
            Self::Connected(_) => "Connected",
        };
        f.write_str(s)
    }
}

/// A [`Session`] that can [`Publish`] and [`Receive`] raw bytes over TCP, with optional TLS
/// resolved from the URL [`Scheme`].
///
/// This implementation does not provide any framing guarantees. Buffers are returned as
/// they are read from the underlying socket, and writes may be partially completed with the
/// remaining slice returned as [`PublishOutcome::Incomplete`].
///
/// [`Transport::connect`] starts a non-blocking connect and returns immediately; the
/// connect, and for `https` the TLS handshake, are driven to completion by calling
/// [`Session::drive`] while [`Session::status`] returns [`SessionStatus::Establishing`].
/// [`Transport::connect_blocking`] performs the same establishment synchronously under a
/// deadline before returning.
pub struct Transport {
    connection: Option<Connection>,
    read_buffer: Vec<u8>,
}
impl Transport {
    /// Start a non-blocking connect to `host:port`, with a TLS handshake planned for
    /// [`Scheme::Https`].
    ///
    /// Address resolution happens synchronously; the connect itself does not.
    pub fn connect(
        host: &str,
        port: u16,
        scheme: Scheme,
        tls: &TlsOptions,
    ) -> Result<Self, Error> {
        let addrs: Vec<SocketAddr> = (host, port)
            .to_socket_addrs()
            .map_err(|err| Error::new(ErrorKind::InvalidInput, err))?
            .collect();
        let (stream, poll) = Self::addr_to_stream(addrs)?;
        let events = mio::Events::with_capacity(1);
        let plan = match scheme {
            Scheme::Https => Some(TlsPlan {
                domain: host.to_owned(),
                options: tls.clone(),
            }),
            Scheme::Http => None,
        };
        let mut read_buffer = Vec::new();
        read_buffer.resize(READ_BUFFER_CAPACITY, 0);
        Ok(Self {
            connection: Some(Connection::Initializing(stream, poll, events, plan)),
            read_buffer,
        })
    }

    /// Connect and, for `https`, complete the TLS handshake before returning.
    ///
    /// Fails with [`ErrorKind::TimedOut`] when establishment exceeds `timeout`.
    pub fn connect_blocking(
        host: &str,
        port: u16,
        scheme: Scheme,
        tls: &TlsOptions,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let deadline = Instant::now() + timeout;
        let mut transport = Self::connect(host, port, scheme, tls)?;
        while transport.status() == SessionStatus::Establishing {
            if Instant::now() >= deadline {
                return Err(Error::new(ErrorKind::TimedOut, "connect deadline elapsed"));
            }
            if transport.drive()? == DriveOutcome::Idle {
                std::thread::sleep(BLOCKING_CONNECT_POLL);
            }
        }
        Ok(transport)
    }

    fn addr_to_stream(addrs: Vec<SocketAddr>) -> Result<(mio::net::TcpStream, mio::Poll), Error> {
        let mut stream = None;
        let mut err = None;
        for addr in addrs {
            match mio::net::TcpStream::connect(addr) {
                Ok(x) => stream = Some(x),
                Err(x) => err = Some(x),
            }
        }
        let mut stream = match stream {
            Some(x) => x,
            None => match err {
                Some(err) => return Err(err),
                None => return Err(Error::new(ErrorKind::Other, "could not connect to addr")),
            },
        };
        let poll = mio::Poll::new()?;
        poll.registry()
            .register(&mut stream, mio::Token(0), mio::Interest::WRITABLE)?;

        Ok((stream, poll))
    }

    fn start_tls(stream: TcpStream, plan: &TlsPlan) -> Result<Connection, Error> {
        let connector = build_connector(&plan.options)?;
        match stream.into_native_tls(&connector, &plan.domain) {
            Ok(x) => Ok(Connection::Connected(x)),
            Err(HandshakeError::WouldBlock(x)) => Ok(Connection::MidTlsHandshake(x)),
            Err(HandshakeError::Failure(err)) => Err(err),
        }
    }

    fn connected(&mut self) -> Result<&mut TcpStream, Error> {
        match self.connection.as_mut() {
            Some(Connection::Connected(x)) => Ok(x),
            Some(Connection::Initializing(_, _, _, _)) => Err(Error::new(
                ErrorKind::NotConnected,
                "stream is initializing",
            )),
            Some(Connection::MidTlsHandshake(_)) => Err(Error::new(
                ErrorKind::NotConnected,
                "stream is mid-handshake",
            )),
            None => Err(Error::new(ErrorKind::NotConnected, "stream not connected")),
        }
    }
}
impl Session for Transport {
    fn status(&self) -> SessionStatus {
        match &self.connection {
            None => SessionStatus::Terminated,
            Some(Connection::Connected(_)) => SessionStatus::Established,
            Some(Connection::Initializing(_, _, _, _)) | Some(Connection::MidTlsHandshake(_)) => {
                SessionStatus::Establishing
            }
        }
    }

    fn close(&mut self) {
        if let Some(connection) = self.connection.take() {
            match connection {
                Connection::Initializing(stream, _, _, _) => {
                    stream.shutdown(Shutdown::Both).ok();
                }
                Connection::MidTlsHandshake(mut x) => {
                    x.get_mut().shutdown(Shutdown::Both).ok();
                }
                Connection::Connected(stream) => {
                    stream.shutdown(Shutdown::Both).ok();
                }
            }
        }
    }

    fn drive(&mut self) -> Result<DriveOutcome, Error> {
        match self.connection.take() {
            Some(Connection::Initializing(stream, mut poll, mut events, tls)) => {
                poll.poll(&mut events, Some(Duration::ZERO))?;
                if let Ok(Some(err)) | Err(err) = stream.take_error() {
                    return Err(err);
                }
                match stream.peer_addr() {
                    Ok(..) => {
                        // connected
                        let stream: TcpStream = unsafe { into_tcpstream(stream) };
                        stream.set_nonblocking(true)?;
                        stream.set_nodelay(true)?;
                        match tls {
                            None => self.connection = Some(Connection::Connected(stream)),
                            Some(plan) => {
                                debug!("starting tls handshake with {}", plan.domain);
                                self.connection = Some(Self::start_tls(stream, &plan)?);
                            }
                        }
                        Ok(DriveOutcome::Active)
                    }
                    Err(err) => {
                        // `NotConnected`/`EINPROGRESS` => still connecting
                        // `ECONNREFUSED` => failed
                        if err.kind() == ErrorKind::NotConnected
                            || err.raw_os_error() == Some(libc::EINPROGRESS)
                        {
                            self.connection =
                                Some(Connection::Initializing(stream, poll, events, tls));
                            Ok(DriveOutcome::Idle)
                        } else {
                            Err(err)
                        }
                    }
                }
            }
            Some(Connection::MidTlsHandshake(x)) => match x.handshake() {
                Ok(x) => {
                    self.connection = Some(Connection::Connected(x));
                    Ok(DriveOutcome::Active)
                }
                Err(HandshakeError::WouldBlock(x)) => {
                    self.connection = Some(Connection::MidTlsHandshake(x));
                    Ok(DriveOutcome::Idle)
                }
                Err(HandshakeError::Failure(err)) => Err(err),
            },
            Some(Connection::Connected(x)) => {
                self.connection = Some(Connection::Connected(x));
                Ok(DriveOutcome::Idle)
            }
            None => Err(Error::new(ErrorKind::NotConnected, "stream not connected")),
        }
    }
}
impl Receive for Transport {
    type ReceivePayload<'a> = &'a [u8];

    fn receive<'a>(&'a mut self) -> Result<ReceiveOutcome<Self::ReceivePayload<'a>>, Error> {
        let read = {
            let stream = match self.connection.as_mut() {
                Some(Connection::Connected(x)) => x,
                _ => return Err(Error::new(ErrorKind::NotConnected, "stream not connected")),
            };
            match stream.read(self.read_buffer.as_mut_slice()) {
                Ok(x) => Some(x),
                Err(err) => match err.kind() {
                    ErrorKind::WouldBlock => None,
                    _ => {
                        self.connection = None;
                        return Err(err);
                    }
                },
            }
        };
        match read {
            None => Ok(ReceiveOutcome::Idle),
            Some(0) => {
                // eof
                self.connection = None;
                Err(Error::new(ErrorKind::UnexpectedEof, "stream is eof"))
            }
            Some(read) => Ok(ReceiveOutcome::Payload(&self.read_buffer[..read])),
        }
    }
}
impl Publish for Transport {
    type PublishPayload<'a> = &'a [u8];

    fn publish<'a>(
        &mut self,
        data: Self::PublishPayload<'a>,
    ) -> Result<PublishOutcome<Self::PublishPayload<'a>>, Error> {
        if data.is_empty() {
            // nothing to write, nothing to do
            return Ok(PublishOutcome::Published);
        }
        let stream = self.connected()?;
        let wrote = match stream.write(data) {
            Ok(0) => {
                // per rust docs: a return of 0 typically means the underlying object can no
                // longer accept bytes
                self.connection = None;
                return Err(Error::new(
                    ErrorKind::UnexpectedEof,
                    "stream underlying write returned 0 instead of WouldBlock",
                ));
            }
            Ok(x) => x,
            Err(err) => match err.kind() {
                ErrorKind::WouldBlock => 0,
                _ => {
                    self.connection = None;
                    return Err(err);
                }
            },
        };
        if wrote == data.len() {
            Ok(PublishOutcome::Published)
        } else {
            Ok(PublishOutcome::Incomplete(&data[wrote..]))
        }
    }
}
impl Flush for Transport {
    fn flush(&mut self) -> Result<(), Error> {
        self.connected()?.flush()
    }
}
impl Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("connection", &self.connection)
            .finish()
    }
}
impl Drop for Transport {
    fn drop(&mut self) {
        self.close();
    }
}

fn build_connector(options: &TlsOptions) -> Result<NativeTlsConnector, Error> {
    let mut builder = NativeTlsConnector::builder();
    if options.accept_invalid_hostnames {
        builder.danger_accept_invalid_hostnames(true);
    }

    if let Some(cert_chain) = &options.cert_chain {
        let mut cert_chain = std::io::BufReader::new(cert_chain.as_bytes());
        for cert in rustls_pemfile::read_all(&mut cert_chain) {
            if let rustls_pemfile::Item::X509Certificate(cert) = cert? {
                builder.add_root_certificate(
                    Certificate::from_der(&cert[..])
                        .map_err(|e| Error::new(ErrorKind::Other, e))?,
                );
            }
        }
    }

    builder.build().map_err(|e| Error::new(ErrorKind::Other, e))
}

#[cfg(unix)]
unsafe fn into_tcpstream(stream: mio::net::TcpStream) -> TcpStream {
    use std::os::fd::{FromRawFd, IntoRawFd};
    TcpStream::from_raw_fd(stream.into_raw_fd())
}

#[cfg(windows)]
unsafe fn into_tcpstream(stream: mio::net::TcpStream) -> TcpStream {
    use std::os::windows::io::{FromRawSocket, IntoRawSocket};
    TcpStream::from_raw_socket(stream.into_raw_socket())
}
