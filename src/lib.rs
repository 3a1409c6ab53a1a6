//! # Description
//!
//! This crate is a cooperative, nonblocking HTTP 1.x client built from three pieces that
//! share one polling vocabulary: a byte [`transport`] over plain TCP or TLS, an explicit
//! state-machine HTTP exchange in [`http`], and a single-threaded tick [`scheduler`] that
//! multiplexes many exchanges on one thread without blocking.
//!
//! Nothing here spins up threads behind your back. Every connection and every request is a
//! state machine that you (or the scheduler) advance one bounded step at a time, and every
//! operation that cannot make progress right now says so through its return value instead of
//! blocking or failing.
//!
//! # Sessions
//!
//! The core [`Session`] trait controls a single connection or logical session. Payload-level
//! reads and writes use the [`Receive`] and [`Publish`] traits, which utilize associated
//! types so a session can hand out anything from raw `&[u8]` slices to fully parsed
//! [`http::HttpResponse`] values without copying.
//!
//! # Errors
//!
//! An [`Err`] always represents a transport or protocol level failure. A condition that
//! simply needs to be retried later is **not** an error: instead of surfacing
//! [`std::io::ErrorKind::WouldBlock`] everywhere, partial progress is reported as
//! [`ReceiveOutcome::Idle`], [`ReceiveOutcome::Buffered`], or [`PublishOutcome::Incomplete`]
//! inside [`Result::Ok`]. A peer that closed the connection surfaces as
//! [`std::io::ErrorKind::UnexpectedEof`].
//!
//! # Features
//!
//! By default all features are enabled for rapid prototyping. In a production codebase you
//! will likely want to pick your required features.
//!
//! Feature list:
//! - `http` (implies `tcp`)
//! - `tcp`
//! - `mock`
//! - `pool`
//!
//! # Examples
//!
//! ## Blocking request
//!
//! The blocking entry point drives the same state machine in a local loop until the
//! response is complete or the deadline elapses.
//!
//! ```no_run
//! use std::time::Duration;
//! use tickio::http::HttpClient;
//!
//! let client = HttpClient::new();
//! let response = client
//!     .get_blocking("http://example.com/", Duration::from_secs(10))
//!     .unwrap();
//! println!("status: {}", response.status);
//! println!("body: {}", String::from_utf8_lossy(&response.body));
//! ```
//!
//! ## Polling a single exchange
//!
//! An [`http::HttpExchange`] is itself a [`Session`] that can [`Receive`], so a request can
//! be driven by hand with the same drive/receive loop as any other session.
//!
//! ```no_run
//! use tickio::{Receive, ReceiveOutcome, Session};
//! use tickio::http::HttpClient;
//!
//! let client = HttpClient::new();
//! let mut conn = client.get("http://example.com/").unwrap();
//!
//! loop {
//!     conn.drive().unwrap();
//!     if let ReceiveOutcome::Payload(response) = conn.receive().unwrap() {
//!         println!("body: {}", String::from_utf8_lossy(&response.body));
//!         break;
//!     }
//! }
//! ```
//!
//! ## Many exchanges on one scheduler
//!
//! The scheduler owns a fixed table of tasks and advances every live task once per tick.
//! An exchange registers itself as a task, invokes its completion callback exactly once
//! with the outcome, and frees its slot.
//!
//! ```no_run
//! use std::time::Instant;
//! use tickio::http::HttpClient;
//! use tickio::scheduler::Scheduler;
//!
//! let client = HttpClient::new();
//! let mut scheduler = Scheduler::new(64);
//!
//! let conn = client.get("http://example.com/").unwrap();
//! conn.spawn_on(&mut scheduler, |result| match result {
//!     Ok(response) => println!("got {} bytes", response.body.len()),
//!     Err(err) => eprintln!("request failed: {err}"),
//! })
//! .unwrap();
//!
//! while scheduler.task_count() > 0 {
//!     scheduler.tick(Instant::now());
//! }
//! ```

#[cfg(feature = "http")]
pub extern crate http as hyperium_http;
#[cfg(feature = "tcp")]
pub extern crate tcp_stream;

pub mod buffer;
pub mod error;
#[cfg(feature = "http")]
pub mod http;
#[cfg(feature = "mock")]
pub mod mock;
#[cfg(feature = "http")]
pub mod parse;
#[cfg(feature = "pool")]
pub mod pool;
pub mod scheduler;
#[cfg(feature = "tcp")]
pub mod transport;
pub mod url;

use std::{fmt::Debug, io::Error};

/// An instance of a connection or logical session.
///
/// ## Connecting
///
/// Some implementations do not start in an established state, in which case immediate calls
/// to `publish()` and `receive()` will fail. The [`Session::status`] function provides the
/// current status, which will not return [`SessionStatus::Established`] until all required
/// connect and handshake steps are complete. While [`Session::status`] returns
/// [`SessionStatus::Establishing`], drive the connection process via [`Session::drive`].
///
/// ## Duty cycles
///
/// [`Session::drive`] services any internally buffered work: finishing a connect, advancing
/// a TLS handshake, flushing a pending write buffer. It returns [`DriveOutcome::Active`]
/// when work was done, signaling to a scheduler that more work may be pending, and
/// [`DriveOutcome::Idle`] when yielding is appropriate.
///
/// ## Retrying
///
/// The [`Ok`] results of `publish(..)` and `receive(..)` may report [`ReceiveOutcome::Idle`],
/// [`ReceiveOutcome::Buffered`], or [`PublishOutcome::Incomplete`], which indicate the
/// operation should be retried on a later duty cycle. None of these are errors.
pub trait Session: Debug {
    /// Check the current session status.
    ///
    /// If this returns [`SessionStatus::Establishing`], use [`Session::drive`] to progress
    /// the connection process.
    fn status(&self) -> SessionStatus;

    /// Force the session to move to a [`SessionStatus::Terminated`] state immediately,
    /// performing any graceful close actions as appropriate.
    ///
    /// All subsequent calls to `status` will return [`SessionStatus::Terminated`].
    fn close(&mut self);

    /// Perform one bounded unit of pending internal work.
    ///
    /// Returns [`DriveOutcome::Active`] if work was done, indicating to any scheduler that
    /// more work may be pending. Only when this returns [`DriveOutcome::Idle`] is it
    /// appropriate to yield or back off.
    fn drive(&mut self) -> Result<DriveOutcome, Error>;
}

/// Returned by the [`Session::status`] function, providing the current connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    /// Session is attempting to connect, handshake, or otherwise establish, and will move
    /// to `Established` or `Terminated` as [`Session::drive`] is called.
    Establishing,
    /// Session is currently established, and will move to `Terminated` when an
    /// unrecoverable error is encountered.
    Established,
    /// Session terminal state, the connection has been closed.
    Terminated,
}

/// Returned by the [`Session::drive`] function, providing the result of the drive operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriveOutcome {
    /// The drive operation resulted in work being done, so drive again as soon as possible.
    Active,
    /// The drive operation did not result in any work being done, so yielding or backing
    /// off is appropriate.
    Idle,
}

/// A [`Session`] implementation that can receive payloads via polling.
pub trait Receive: Session {
    /// The type returned by the `receive(..)` function.
    type ReceivePayload<'a>
    where
        Self: 'a;

    /// Attempt to receive a payload from the session.
    ///
    /// This will return [`ReceiveOutcome::Payload`] when data has been received.
    /// [`ReceiveOutcome::Buffered`] reports that work was completed, but a full payload is
    /// not ready. Only [`ReceiveOutcome::Idle`] should indicate to a scheduler that
    /// yielding or idling is appropriate.
    fn receive<'a>(&'a mut self) -> Result<ReceiveOutcome<Self::ReceivePayload<'a>>, Error>;
}

/// Returned by the [`Receive::receive`] function, providing the outcome of the receive
/// action.
///
/// The generic type `T` will match the corresponding [`Receive::ReceivePayload`].
pub enum ReceiveOutcome<T> {
    /// Contains a payload received from the [`Receive::receive`] action.
    Payload(T),

    /// Data was buffered. A partial payload was received, but could not be returned as a
    /// complete `Payload`.
    Buffered,

    /// No work was done. This is useful to signal to a scheduler or idle strategy that it
    /// may be time to yield.
    Idle,
}
impl<T: Debug> Debug for ReceiveOutcome<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReceiveOutcome::Payload(x) => f.write_str(&format!("ReceiveOutcome::Payload({x:?})")),
            ReceiveOutcome::Buffered => f.write_str("ReceiveOutcome::Buffered"),
            ReceiveOutcome::Idle => f.write_str("ReceiveOutcome::Idle"),
        }
    }
}
impl<T: Clone> Clone for ReceiveOutcome<T> {
    fn clone(&self) -> Self {
        match self {
            ReceiveOutcome::Payload(x) => ReceiveOutcome::Payload(x.clone()),
            ReceiveOutcome::Buffered => ReceiveOutcome::Buffered,
            ReceiveOutcome::Idle => ReceiveOutcome::Idle,
        }
    }
}

/// A [`Session`] implementation that can publish payloads.
pub trait Publish: Session {
    /// The type given to the `publish(..)` function.
    type PublishPayload<'a>
    where
        Self: 'a;

    /// Write the given payload to the session.
    ///
    /// This will return [`PublishOutcome::Incomplete`] if the publish is not immediately
    /// completed fully, in which case the `T` of `Incomplete(T)` must be retried.
    ///
    /// Note that some implementations complete a publish partially, so you must re-attempt
    /// the data encapsulated by `Incomplete`, not the data originally passed into the
    /// function. This guidance can only be ignored when you are not writing generic code
    /// and you know your [`Publish`] impl is all-or-none.
    fn publish<'a>(
        &mut self,
        payload: Self::PublishPayload<'a>,
    ) -> Result<PublishOutcome<Self::PublishPayload<'a>>, Error>;
}

/// A [`Publish`] implementation that exposes a blocking flush operation.
pub trait Flush: Publish {
    /// Flush all pending publish data, blocking until completion.
    fn flush(&mut self) -> Result<(), Error>;
}

/// Returned by the [`Publish::publish`] function, providing the outcome of the publish
/// action.
///
/// The generic type `T` will match the corresponding [`Publish::PublishPayload`].
pub enum PublishOutcome<T> {
    /// The publish action completed fully.
    Published,

    /// The publish action was not performed or was partially performed.
    ///
    /// The returned reference must be passed back into the [`Publish::publish`] function
    /// for the publish action to complete. Whether the returned reference may consist of
    /// partial data depends on the [`Session`] implementation.
    Incomplete(T),
}
impl<T: Debug> Debug for PublishOutcome<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PublishOutcome::Published => f.write_str("PublishOutcome::Published"),
            PublishOutcome::Incomplete(x) => {
                f.write_str(&format!("PublishOutcome::Incomplete({x:?})"))
            }
        }
    }
}
impl<T: Clone> Clone for PublishOutcome<T> {
    fn clone(&self) -> Self {
        match self {
            PublishOutcome::Published => PublishOutcome::Published,
            PublishOutcome::Incomplete(x) => PublishOutcome::Incomplete(x.clone()),
        }
    }
}
