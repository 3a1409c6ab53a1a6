//! A non-blocking HTTP 1.x client built around an explicit state machine.
//!
//! One [`HttpExchange`] handles one request/response. It owns its transport, its receive
//! buffer, and all parsing progress, and advances through its states one bounded step at a
//! time. The same step function serves three drivers: the blocking loop
//! ([`HttpExchange::run_blocking`]), the tick scheduler ([`HttpExchange::spawn_on`]), and a
//! caller's own drive/receive loop via the [`Session`] and [`Receive`] impls. Every
//! suspension resumes purely from data stored on the exchange, so delivery of the response
//! in arbitrarily small fragments parses identically to a single block.

use std::{
    fmt::Debug,
    io::{Error, ErrorKind},
    mem,
    time::{Duration, Instant},
};

use hyperium_http::{
    header::{CONNECTION, CONTENT_LENGTH, HOST, TRANSFER_ENCODING, USER_AGENT},
    Method, StatusCode,
};
use log::{debug, trace};

use crate::{
    buffer::{GrowableCircleBuf, RecvBuffer},
    error::HttpError,
    parse::{self, ChunkSizeLine, Headers, StatusLine},
    scheduler::{Scheduler, TaskHandle, TaskOutcome},
    transport::{TlsOptions, Transport},
    url::UrlParts,
    DriveOutcome, Publish, PublishOutcome, Receive, ReceiveOutcome, Session, SessionStatus,
};

const AGENT: &str = concat!("tickio/", env!("CARGO_PKG_VERSION"));
const LINE_BREAK: &[u8] = b"\r\n";

const WRITE_BUFFER_CAPACITY: usize = 4096;
/// Cap on bytes buffered before the first CRLF; an oversized preamble is a hard error.
const MAX_STATUS_LINE_BYTES: usize = 1024;
const MAX_SEND_RETRIES: u32 = 3;
const SEND_RETRY_DELAY: Duration = Duration::from_millis(100);
const SEND_BACKOFF_STEP: Duration = Duration::from_millis(1000);
const CONNECT_POLL_DELAY: Duration = Duration::from_millis(20);
const BLOCKING_IDLE_SLEEP: Duration = Duration::from_millis(1);

/// An HTTP request to be performed by an [`HttpExchange`]: method, split URL, and body.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: UrlParts,
    pub body: Vec<u8>,
}
impl HttpRequest {
    pub fn new(method: Method, url: &str, body: Vec<u8>) -> Result<Self, HttpError> {
        Ok(Self {
            method,
            url: UrlParts::parse(url)?,
            body,
        })
    }

    pub fn get(url: &str) -> Result<Self, HttpError> {
        Self::new(Method::GET, url, Vec::new())
    }

    fn host_header(&self) -> String {
        if self.url.port == self.url.scheme.default_port() {
            self.url.host.clone()
        } else {
            format!("{}:{}", self.url.host, self.url.port)
        }
    }
}

/// A complete, owned HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub version: String,
    pub status: StatusCode,
    pub reason: String,
    pub headers: Headers,
    pub body: Vec<u8>,
}
impl HttpResponse {
    /// First matching header value, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ExchangeState {
    Connecting,
    WaitingConnect,
    BuildingRequest,
    SendingRequest,
    ReadingFirstline,
    ReadingHeaders,
    DecipherChunkSize { trailers: bool },
    ReadingChunkBody { remaining: usize },
    ReadingBody { content_length: usize },
    Returning,
    Failed,
    Disposing,
    Done,
}
impl Debug for ExchangeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Connecting => "Connecting",
            Self::WaitingConnect => "WaitingConnect",
            Self::BuildingRequest => "BuildingRequest",
            Self::SendingRequest => "SendingRequest",
            Self::ReadingFirstline => "ReadingFirstline",
            Self::ReadingHeaders => "ReadingHeaders",
            Self::DecipherChunkSize { .. } => "DecipherChunkSize",
            Self::ReadingChunkBody { .. } => "ReadingChunkBody",
            Self::ReadingBody { .. } => "ReadingBody",
            Self::Returning => "Returning",
            Self::Failed => "Failed",
            Self::Disposing => "Disposing",
            Self::Done => "Done",
        };
        f.write_str(s)
    }
}

enum Fill {
    Read(usize),
    Idle,
    Closed,
}

type StepResult = Result<(ExchangeState, DriveOutcome), HttpError>;
type Completion = Box<dyn FnOnce(Result<HttpResponse, HttpError>)>;

/// One in-flight HTTP request/response over a byte session `S`.
///
/// Generic over the transport exactly like a framing session: any `S` that publishes and
/// receives raw `&[u8]` works, which is how the state machine runs unchanged over a real
/// [`Transport`] and a scripted [`crate::mock::MockStream`].
///
/// The exchange is single-shot. After the response (or failure) is delivered, the exchange
/// disposes itself: the transport is closed, buffers are released, and a scheduler task
/// vacates its slot. Disposal is idempotent and happens exactly once regardless of which
/// driver advances the exchange.
pub struct HttpExchange<S = Transport> {
    transport: S,
    request: HttpRequest,
    state: ExchangeState,
    write_buffer: GrowableCircleBuf,
    recv: RecvBuffer,
    status_line: Option<StatusLine>,
    headers: Headers,
    content_length: Option<usize>,
    decoded_body: Vec<u8>,
    retries: u32,
    next_retry_at: Option<Instant>,
    error: Option<HttpError>,
    completion: Option<Completion>,
    outcome: Option<Result<HttpResponse, HttpError>>,
}
impl<S> HttpExchange<S>
where
    S: for<'a> Publish<PublishPayload<'a> = &'a [u8]>
        + for<'a> Receive<ReceivePayload<'a> = &'a [u8]>
        + 'static,
{
    /// Wrap a byte session in a new exchange for `request`.
    ///
    /// The session may still be establishing; the exchange waits out the connect and any
    /// TLS handshake before serializing the request.
    pub fn new(transport: S, request: HttpRequest) -> Result<Self, HttpError> {
        Ok(Self {
            transport,
            request,
            state: ExchangeState::Connecting,
            write_buffer: GrowableCircleBuf::new(WRITE_BUFFER_CAPACITY)?,
            recv: RecvBuffer::new(),
            status_line: None,
            headers: Headers::new(),
            content_length: None,
            decoded_body: Vec::new(),
            retries: 0,
            next_retry_at: None,
            error: None,
            completion: None,
            outcome: None,
        })
    }

    /// The underlying byte session.
    pub fn transport(&self) -> &S {
        &self.transport
    }

    /// The mutable underlying byte session.
    pub fn transport_mut(&mut self) -> &mut S {
        &mut self.transport
    }

    /// Whether the exchange has fully disposed itself.
    pub fn is_terminated(&self) -> bool {
        self.state == ExchangeState::Done
    }

    /// Advance the state machine one bounded step.
    ///
    /// Safe to call repeatedly from any driver; a step that cannot make progress returns
    /// [`DriveOutcome::Idle`] and leaves all buffered data intact for the next call.
    pub fn step(&mut self, now: Instant) -> DriveOutcome {
        if let Some(at) = self.next_retry_at {
            if now < at {
                return DriveOutcome::Idle;
            }
            self.next_retry_at = None;
        }
        let state = self.state;
        let result = match state {
            ExchangeState::Connecting => self.on_connecting(),
            ExchangeState::WaitingConnect => self.on_waiting_connect(now),
            ExchangeState::BuildingRequest => self.on_building_request(),
            ExchangeState::SendingRequest => self.on_sending_request(now),
            ExchangeState::ReadingFirstline => self.on_reading_firstline(),
            ExchangeState::ReadingHeaders => self.on_reading_headers(),
            ExchangeState::DecipherChunkSize { trailers } => self.on_decipher_chunk_size(trailers),
            ExchangeState::ReadingChunkBody { remaining } => self.on_reading_chunk_body(remaining),
            ExchangeState::ReadingBody { content_length } => self.on_reading_body(content_length),
            ExchangeState::Returning => self.on_returning(),
            ExchangeState::Failed => {
                let err = self.error.take().unwrap_or(HttpError::ConnectionClosed);
                debug!("http exchange failed: {err}");
                self.deliver(Err(err));
                Ok((ExchangeState::Disposing, DriveOutcome::Active))
            }
            ExchangeState::Disposing => {
                self.release();
                Ok((ExchangeState::Done, DriveOutcome::Active))
            }
            ExchangeState::Done => Ok((ExchangeState::Done, DriveOutcome::Idle)),
        };
        let (next, outcome) = match result {
            Ok(x) => x,
            Err(err) => {
                self.error = Some(err);
                (ExchangeState::Failed, DriveOutcome::Active)
            }
        };
        if next != state {
            trace!("http exchange {state:?} -> {next:?}");
        }
        self.state = next;
        outcome
    }

    /// Drive the exchange to completion on the calling thread.
    ///
    /// The deadline covers the whole operation. When it elapses before the response is
    /// complete, the exchange is disposed (all owned resources released) and
    /// [`HttpError::Timeout`] is returned.
    pub fn run_blocking(mut self, timeout: Duration) -> Result<HttpResponse, HttpError> {
        let deadline = Instant::now() + timeout;
        loop {
            let now = Instant::now();
            if now >= deadline {
                self.dispose();
                return Err(HttpError::Timeout);
            }
            let outcome = self.step(now);
            if let Some(result) = self.outcome.take() {
                self.dispose();
                return result;
            }
            if outcome == DriveOutcome::Idle {
                std::thread::sleep(BLOCKING_IDLE_SLEEP);
            }
        }
    }

    /// Register the exchange as a scheduler task.
    ///
    /// The task advances the exchange once per tick. `on_complete` is invoked exactly once
    /// with the response or the failure, after which the task completes and its slot is
    /// vacated. Returns [`HttpError::Busy`] when the scheduler is at capacity.
    pub fn spawn_on<F>(
        mut self,
        scheduler: &mut Scheduler,
        on_complete: F,
    ) -> Result<TaskHandle, HttpError>
    where
        F: FnOnce(Result<HttpResponse, HttpError>) + 'static,
    {
        self.completion = Some(Box::new(on_complete));
        let mut exchange = self;
        scheduler
            .spawn(move |now| {
                let outcome = exchange.step(now);
                if exchange.is_terminated() {
                    TaskOutcome::Complete
                } else {
                    match outcome {
                        DriveOutcome::Active => TaskOutcome::Active,
                        DriveOutcome::Idle => TaskOutcome::Idle,
                    }
                }
            })
            .map_err(|_| HttpError::Busy)
    }

    /// Release every owned resource and move straight to the terminal state.
    ///
    /// Idempotent; also invoked internally when the exchange finishes on its own.
    pub fn dispose(&mut self) {
        if self.state == ExchangeState::Done {
            return;
        }
        self.release();
        self.state = ExchangeState::Done;
    }

    fn release(&mut self) {
        self.transport.close();
        self.recv.clear();
        self.decoded_body = Vec::new();
        self.completion = None;
    }

    fn deliver(&mut self, result: Result<HttpResponse, HttpError>) {
        match self.completion.take() {
            Some(callback) => callback(result),
            None => self.outcome = Some(result),
        }
    }

    fn on_connecting(&mut self) -> StepResult {
        match self.transport.status() {
            SessionStatus::Established => {
                Ok((ExchangeState::BuildingRequest, DriveOutcome::Active))
            }
            SessionStatus::Terminated => Err(HttpError::ConnectionClosed),
            SessionStatus::Establishing => {
                self.transport.drive()?;
                if self.transport.status() == SessionStatus::Established {
                    Ok((ExchangeState::BuildingRequest, DriveOutcome::Active))
                } else {
                    Ok((ExchangeState::WaitingConnect, DriveOutcome::Active))
                }
            }
        }
    }

    fn on_waiting_connect(&mut self, now: Instant) -> StepResult {
        match self.transport.status() {
            SessionStatus::Established => {
                Ok((ExchangeState::BuildingRequest, DriveOutcome::Active))
            }
            SessionStatus::Terminated => Err(HttpError::ConnectionClosed),
            SessionStatus::Establishing => {
                let outcome = self.transport.drive()?;
                if self.transport.status() == SessionStatus::Established {
                    return Ok((ExchangeState::BuildingRequest, DriveOutcome::Active));
                }
                match outcome {
                    DriveOutcome::Active => Ok((ExchangeState::WaitingConnect, DriveOutcome::Active)),
                    DriveOutcome::Idle => {
                        self.next_retry_at = Some(now + CONNECT_POLL_DELAY);
                        Ok((ExchangeState::WaitingConnect, DriveOutcome::Idle))
                    }
                }
            }
        }
    }

    fn on_building_request(&mut self) -> StepResult {
        let serialized = self.serialize_request();
        if !self.write_buffer.try_write(&[&serialized])? {
            return Err(HttpError::Io(Error::new(
                ErrorKind::Other,
                "request did not fit the outbound buffer",
            )));
        }
        Ok((ExchangeState::SendingRequest, DriveOutcome::Active))
    }

    fn serialize_request(&self) -> Vec<u8> {
        let request = &self.request;
        let host_header = request.host_header();
        let mut out =
            Vec::with_capacity(128 + request.url.path.len() + request.body.len());
        out.extend_from_slice(request.method.as_str().as_bytes());
        out.extend_from_slice(b" ");
        out.extend_from_slice(request.url.path.as_bytes());
        out.extend_from_slice(b" HTTP/1.1");
        out.extend_from_slice(LINE_BREAK);
        out.extend_from_slice(HOST.as_str().as_bytes());
        out.extend_from_slice(b": ");
        out.extend_from_slice(host_header.as_bytes());
        out.extend_from_slice(LINE_BREAK);
        out.extend_from_slice(USER_AGENT.as_str().as_bytes());
        out.extend_from_slice(b": ");
        out.extend_from_slice(AGENT.as_bytes());
        out.extend_from_slice(LINE_BREAK);
        out.extend_from_slice(CONNECTION.as_str().as_bytes());
        out.extend_from_slice(b": close");
        out.extend_from_slice(LINE_BREAK);
        if !request.body.is_empty() {
            out.extend_from_slice(CONTENT_LENGTH.as_str().as_bytes());
            out.extend_from_slice(b": ");
            out.extend_from_slice(request.body.len().to_string().as_bytes());
            out.extend_from_slice(LINE_BREAK);
        }
        out.extend_from_slice(LINE_BREAK);
        out.extend_from_slice(&request.body);
        out
    }

    fn on_sending_request(&mut self, now: Instant) -> StepResult {
        let pending = self.write_buffer.peek_read();
        let pending_len = pending.len();
        let wrote = match self.transport.publish(pending) {
            Ok(PublishOutcome::Published) => pending_len,
            Ok(PublishOutcome::Incomplete(rest)) => pending_len - rest.len(),
            Err(err) => {
                return match err.kind() {
                    ErrorKind::WouldBlock | ErrorKind::Interrupted | ErrorKind::UnexpectedEof => {
                        self.send_backoff(now, &err)
                    }
                    _ => Err(HttpError::Io(err)),
                }
            }
        };
        self.write_buffer.advance_read(wrote)?;
        if self.write_buffer.is_empty() {
            self.retries = 0;
            return Ok((ExchangeState::ReadingFirstline, DriveOutcome::Active));
        }
        if wrote > 0 {
            // partial send, come back shortly for the rest
            self.next_retry_at = Some(now + SEND_RETRY_DELAY);
            Ok((ExchangeState::SendingRequest, DriveOutcome::Active))
        } else {
            self.send_backoff(now, "write made no progress")
        }
    }

    fn send_backoff(&mut self, now: Instant, cause: impl std::fmt::Display) -> StepResult {
        if self.retries >= MAX_SEND_RETRIES {
            return Err(HttpError::Exhausted);
        }
        self.retries += 1;
        self.next_retry_at = Some(now + SEND_BACKOFF_STEP * self.retries);
        debug!("send retry {} of {MAX_SEND_RETRIES}: {cause}", self.retries);
        Ok((ExchangeState::SendingRequest, DriveOutcome::Idle))
    }

    fn fill_recv(&mut self) -> Result<Fill, HttpError> {
        match self.transport.receive() {
            Ok(ReceiveOutcome::Payload(bytes)) => {
                let len = bytes.len();
                self.recv.append(bytes);
                Ok(Fill::Read(len))
            }
            Ok(ReceiveOutcome::Buffered) => Ok(Fill::Read(0)),
            Ok(ReceiveOutcome::Idle) => Ok(Fill::Idle),
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => Ok(Fill::Closed),
            Err(err) => Err(HttpError::Io(err)),
        }
    }

    /// Read more bytes and revisit `stay` on the next step. A peer close here always means
    /// the response ended before the framing said it should.
    fn fill_or_stay(&mut self, stay: ExchangeState) -> StepResult {
        match self.fill_recv()? {
            Fill::Read(n) if n > 0 => Ok((stay, DriveOutcome::Active)),
            Fill::Read(_) | Fill::Idle => Ok((stay, DriveOutcome::Idle)),
            Fill::Closed => Err(HttpError::ConnectionClosed),
        }
    }

    fn on_reading_firstline(&mut self) -> StepResult {
        if let Some(line_end) = parse::find_line_end(self.recv.as_bytes()) {
            let status_line = parse::parse_status_line(&self.recv.as_bytes()[..line_end])?;
            trace!(
                "response status line: {} {}",
                status_line.status,
                status_line.reason
            );
            self.status_line = Some(status_line);
            self.recv.consume(line_end + 2);
            self.retries = 0;
            return Ok((ExchangeState::ReadingHeaders, DriveOutcome::Active));
        }
        if self.recv.len() >= MAX_STATUS_LINE_BYTES {
            return Err(HttpError::Parse(format!(
                "no status line within {MAX_STATUS_LINE_BYTES} bytes"
            )));
        }
        self.fill_or_stay(ExchangeState::ReadingFirstline)
    }

    fn on_reading_headers(&mut self) -> StepResult {
        let buf = self.recv.as_bytes();
        if buf.len() >= 2 && buf[..2] == *b"\r\n" {
            // empty header block
            self.recv.consume(2);
            self.headers = Headers::new();
            return self.dispatch_body();
        }
        if let Some(block_end) = parse::find_headers_end(buf) {
            self.headers = parse::parse_headers(&buf[..block_end + 2])?;
            self.recv.consume(block_end + 4);
            self.retries = 0;
            return self.dispatch_body();
        }
        self.fill_or_stay(ExchangeState::ReadingHeaders)
    }

    fn dispatch_body(&mut self) -> StepResult {
        if let Some(te) = self.headers.get(TRANSFER_ENCODING.as_str()) {
            if te.eq_ignore_ascii_case("chunked") {
                return Ok((
                    ExchangeState::DecipherChunkSize { trailers: false },
                    DriveOutcome::Active,
                ));
            }
        }
        match self.headers.get(CONTENT_LENGTH.as_str()) {
            Some(value) => {
                let content_length: usize = value.trim().parse().map_err(|_| {
                    HttpError::Parse(format!("content-length is not a number: {value:?}"))
                })?;
                self.content_length = Some(content_length);
                if content_length == 0 || self.recv.len() >= content_length {
                    Ok((ExchangeState::Returning, DriveOutcome::Active))
                } else {
                    Ok((
                        ExchangeState::ReadingBody { content_length },
                        DriveOutcome::Active,
                    ))
                }
            }
            None => Ok((ExchangeState::Returning, DriveOutcome::Active)),
        }
    }

    fn on_decipher_chunk_size(&mut self, trailers: bool) -> StepResult {
        if trailers {
            // after the terminal chunk: discard a bare CRLF, or a whole trailer block
            let buf = self.recv.as_bytes();
            if buf.len() >= 2 && buf[..2] == *b"\r\n" {
                self.recv.consume(2);
                return Ok((ExchangeState::Returning, DriveOutcome::Active));
            }
            if let Some(end) = parse::find_headers_end(buf) {
                self.recv.consume(end + 4);
                return Ok((ExchangeState::Returning, DriveOutcome::Active));
            }
            return self.fill_or_stay(ExchangeState::DecipherChunkSize { trailers: true });
        }
        match parse::decode_chunk_size_line(self.recv.as_bytes())? {
            ChunkSizeLine::NeedMore => {
                self.fill_or_stay(ExchangeState::DecipherChunkSize { trailers: false })
            }
            ChunkSizeLine::Complete { size, consumed } => {
                self.recv.consume(consumed);
                if size == 0 {
                    Ok((
                        ExchangeState::DecipherChunkSize { trailers: true },
                        DriveOutcome::Active,
                    ))
                } else {
                    Ok((
                        ExchangeState::ReadingChunkBody { remaining: size },
                        DriveOutcome::Active,
                    ))
                }
            }
        }
    }

    fn on_reading_chunk_body(&mut self, mut remaining: usize) -> StepResult {
        if remaining > 0 {
            let avail = remaining.min(self.recv.len());
            if avail == 0 {
                return self.fill_or_stay(ExchangeState::ReadingChunkBody { remaining });
            }
            self.decoded_body
                .extend_from_slice(&self.recv.as_bytes()[..avail]);
            self.recv.consume(avail);
            remaining -= avail;
            if remaining > 0 {
                return Ok((
                    ExchangeState::ReadingChunkBody { remaining },
                    DriveOutcome::Active,
                ));
            }
        }
        // chunk payload complete, consume its trailing CRLF
        let buf = self.recv.as_bytes();
        if buf.len() < 2 {
            return self.fill_or_stay(ExchangeState::ReadingChunkBody { remaining: 0 });
        }
        if buf[..2] != *b"\r\n" {
            return Err(HttpError::Parse(
                "chunk payload not followed by CRLF".to_string(),
            ));
        }
        self.recv.consume(2);
        Ok((
            ExchangeState::DecipherChunkSize { trailers: false },
            DriveOutcome::Active,
        ))
    }

    fn on_reading_body(&mut self, content_length: usize) -> StepResult {
        if self.recv.len() >= content_length {
            self.retries = 0;
            return Ok((ExchangeState::Returning, DriveOutcome::Active));
        }
        self.fill_or_stay(ExchangeState::ReadingBody { content_length })
    }

    fn on_returning(&mut self) -> StepResult {
        let body = if !self.decoded_body.is_empty() {
            mem::take(&mut self.decoded_body)
        } else {
            let len = self
                .content_length
                .map_or(self.recv.len(), |n| n.min(self.recv.len()));
            self.recv.take_front(len)
        };
        let status_line = self.status_line.take().ok_or_else(|| {
            HttpError::Parse("response completed without a status line".to_string())
        })?;
        let response = HttpResponse {
            version: status_line.version,
            status: status_line.status,
            reason: status_line.reason,
            headers: mem::take(&mut self.headers),
            body,
        };
        self.deliver(Ok(response));
        Ok((ExchangeState::Disposing, DriveOutcome::Active))
    }
}
impl<S> Session for HttpExchange<S>
where
    S: for<'a> Publish<PublishPayload<'a> = &'a [u8]>
        + for<'a> Receive<ReceivePayload<'a> = &'a [u8]>
        + 'static,
{
    fn status(&self) -> SessionStatus {
        match self.state {
            ExchangeState::Connecting | ExchangeState::WaitingConnect => {
                SessionStatus::Establishing
            }
            ExchangeState::Done => SessionStatus::Terminated,
            _ => SessionStatus::Established,
        }
    }

    fn close(&mut self) {
        self.dispose();
    }

    fn drive(&mut self) -> Result<DriveOutcome, Error> {
        Ok(self.step(Instant::now()))
    }
}
impl<S> Receive for HttpExchange<S>
where
    S: for<'a> Publish<PublishPayload<'a> = &'a [u8]>
        + for<'a> Receive<ReceivePayload<'a> = &'a [u8]>
        + 'static,
{
    type ReceivePayload<'a> = HttpResponse;

    fn receive<'a>(&'a mut self) -> Result<ReceiveOutcome<Self::ReceivePayload<'a>>, Error> {
        match self.outcome.take() {
            Some(Ok(response)) => Ok(ReceiveOutcome::Payload(response)),
            Some(Err(err)) => Err(err.into()),
            None => Ok(ReceiveOutcome::Idle),
        }
    }
}
impl<S> Debug for HttpExchange<S>
where
    S: Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpExchange")
            .field("state", &self.state)
            .field("transport", &self.transport)
            .finish()
    }
}

/// Entry points for making HTTP requests over [`Transport`] connections.
///
/// ## Example
///
/// ```no_run
/// use tickio::{Receive, ReceiveOutcome, Session};
/// use tickio::http::HttpClient;
///
/// let client = HttpClient::new();
/// let mut conn = client.get("http://icanhazip.com").unwrap();
///
/// loop {
///     conn.drive().unwrap();
///     if let ReceiveOutcome::Payload(response) = conn.receive().unwrap() {
///         println!("Response Body: {}", String::from_utf8_lossy(&response.body));
///         break;
///     }
/// }
/// ```
pub struct HttpClient {
    tls: TlsOptions,
}
impl HttpClient {
    pub fn new() -> Self {
        Self {
            tls: TlsOptions::default(),
        }
    }

    /// Override the default TLS options.
    pub fn with_tls_options(mut self, tls: TlsOptions) -> Self {
        self.tls = tls;
        self
    }

    /// Start a request over a non-blocking connection.
    ///
    /// The returned exchange has not touched the network yet beyond initiating the
    /// connect; drive it with a scheduler, [`HttpExchange::run_blocking`], or your own
    /// drive/receive loop.
    pub fn request(
        &self,
        method: Method,
        url: &str,
        body: Vec<u8>,
    ) -> Result<HttpExchange<Transport>, HttpError> {
        let request = HttpRequest::new(method, url, body)?;
        let transport = Transport::connect(
            &request.url.host,
            request.url.port,
            request.url.scheme,
            &self.tls,
        )?;
        HttpExchange::new(transport, request)
    }

    /// Start a GET request over a non-blocking connection.
    pub fn get(&self, url: &str) -> Result<HttpExchange<Transport>, HttpError> {
        self.request(Method::GET, url, Vec::new())
    }

    /// Perform a request synchronously, connecting (and handshaking, for `https`) before
    /// driving the exchange to completion. The timeout covers the whole operation.
    pub fn request_blocking(
        &self,
        method: Method,
        url: &str,
        body: Vec<u8>,
        timeout: Duration,
    ) -> Result<HttpResponse, HttpError> {
        let deadline = Instant::now() + timeout;
        let request = HttpRequest::new(method, url, body)?;
        let transport = Transport::connect_blocking(
            &request.url.host,
            request.url.port,
            request.url.scheme,
            &self.tls,
            timeout,
        )
        .map_err(|err| {
            if err.kind() == ErrorKind::TimedOut {
                HttpError::Timeout
            } else {
                HttpError::Io(err)
            }
        })?;
        let exchange = HttpExchange::new(transport, request)?;
        exchange.run_blocking(deadline.saturating_duration_since(Instant::now()))
    }

    /// Perform a GET request synchronously.
    pub fn get_blocking(&self, url: &str, timeout: Duration) -> Result<HttpResponse, HttpError> {
        self.request_blocking(Method::GET, url, Vec::new(), timeout)
    }
}
impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}
