//! Mock sessions, most useful for testing

use std::{
    collections::VecDeque,
    fmt::Debug,
    io::{Error, ErrorKind},
};

use crate::{
    DriveOutcome, Flush, Publish, PublishOutcome, Receive, ReceiveOutcome, Session, SessionStatus,
};

/// One scripted result for [`MockStream::receive`].
#[derive(Debug, Clone)]
pub enum ScriptedIo {
    /// Return these bytes as a received payload.
    Data(Vec<u8>),
    /// Report no data available ([`ReceiveOutcome::Idle`]).
    WouldBlock,
    /// Report the peer closing the connection ([`ErrorKind::UnexpectedEof`]).
    PeerClosed,
    /// Fail with the given error kind.
    Fail(ErrorKind),
}

/// One scripted behavior for [`MockStream::publish`].
#[derive(Debug, Clone, Copy)]
pub enum PublishScript {
    /// Accept the whole payload.
    Accept,
    /// Accept at most this many bytes, returning the rest as
    /// [`PublishOutcome::Incomplete`].
    AcceptPartial(usize),
    /// Accept nothing, failing with [`ErrorKind::WouldBlock`].
    WouldBlock,
}

/// A scripted byte-stream session driven entirely by public [`VecDeque`] queues.
///
/// Each call to [`MockStream::receive`] pops the front of `receive_script`; an empty
/// script reports [`ReceiveOutcome::Idle`]. Each call to [`MockStream::publish`] pops
/// `publish_script`, defaulting to [`PublishScript::Accept`] when empty; accepted bytes
/// accumulate in `published` for assertions. `drive_script` feeds [`Session::drive`] the
/// same way, defaulting to [`DriveOutcome::Idle`].
pub struct MockStream {
    pub status: SessionStatus,
    pub receive_script: VecDeque<ScriptedIo>,
    pub publish_script: VecDeque<PublishScript>,
    pub drive_script: VecDeque<Result<DriveOutcome, Error>>,
    pub published: Vec<u8>,
    current: Vec<u8>,
}
impl MockStream {
    /// A mock that reports [`SessionStatus::Established`] immediately.
    pub fn new() -> Self {
        Self {
            status: SessionStatus::Established,
            receive_script: VecDeque::new(),
            publish_script: VecDeque::new(),
            drive_script: VecDeque::new(),
            published: Vec::new(),
            current: Vec::new(),
        }
    }

    /// Queue `data` to be returned by a later `receive` call.
    pub fn script_data(&mut self, data: &[u8]) {
        self.receive_script.push_back(ScriptedIo::Data(data.to_vec()));
    }
}
impl Default for MockStream {
    fn default() -> Self {
        Self::new()
    }
}
impl Session for MockStream {
    fn status(&self) -> SessionStatus {
        self.status
    }

    fn close(&mut self) {
        self.status = SessionStatus::Terminated
    }

    fn drive(&mut self) -> Result<DriveOutcome, Error> {
        match self.drive_script.pop_front() {
            Some(x) => x,
            None => Ok(DriveOutcome::Idle),
        }
    }
}
impl Receive for MockStream {
    type ReceivePayload<'a> = &'a [u8];

    fn receive<'a>(&'a mut self) -> Result<ReceiveOutcome<Self::ReceivePayload<'a>>, Error> {
        if self.status != SessionStatus::Established {
            return Err(Error::new(ErrorKind::NotConnected, "not established"));
        }
        match self.receive_script.pop_front() {
            None | Some(ScriptedIo::WouldBlock) => Ok(ReceiveOutcome::Idle),
            Some(ScriptedIo::Data(data)) => {
                self.current = data;
                Ok(ReceiveOutcome::Payload(&self.current))
            }
            Some(ScriptedIo::PeerClosed) => {
                Err(Error::new(ErrorKind::UnexpectedEof, "stream is eof"))
            }
            Some(ScriptedIo::Fail(kind)) => Err(Error::new(kind, "scripted failure")),
        }
    }
}
impl Publish for MockStream {
    type PublishPayload<'a> = &'a [u8];

    fn publish<'a>(
        &mut self,
        payload: Self::PublishPayload<'a>,
    ) -> Result<PublishOutcome<Self::PublishPayload<'a>>, Error> {
        if self.status != SessionStatus::Established {
            return Err(Error::new(ErrorKind::NotConnected, "not established"));
        }
        match self.publish_script.pop_front().unwrap_or(PublishScript::Accept) {
            PublishScript::Accept => {
                self.published.extend_from_slice(payload);
                Ok(PublishOutcome::Published)
            }
            PublishScript::AcceptPartial(max) => {
                let take = max.min(payload.len());
                self.published.extend_from_slice(&payload[..take]);
                if take == payload.len() {
                    Ok(PublishOutcome::Published)
                } else {
                    Ok(PublishOutcome::Incomplete(&payload[take..]))
                }
            }
            PublishScript::WouldBlock => {
                Err(Error::new(ErrorKind::WouldBlock, "scripted backpressure"))
            }
        }
    }
}
impl Flush for MockStream {
    fn flush(&mut self) -> Result<(), Error> {
        Ok(())
    }
}
impl Debug for MockStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MockStream")
    }
}

#[cfg(test)]
mod test {
    use std::io::ErrorKind;

    use crate::{Publish, PublishOutcome, Receive, ReceiveOutcome};

    use super::{MockStream, PublishScript, ScriptedIo};

    #[test]
    fn scripted_receive() {
        let mut stream = MockStream::new();
        stream.script_data(b"hello, reader!");
        stream.receive_script.push_back(ScriptedIo::WouldBlock);
        stream.receive_script.push_back(ScriptedIo::PeerClosed);

        if let ReceiveOutcome::Payload(x) = stream.receive().unwrap() {
            assert_eq!(x, b"hello, reader!");
        } else {
            panic!("expected payload");
        }
        assert!(matches!(stream.receive().unwrap(), ReceiveOutcome::Idle));
        let err = stream.receive().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
    }

    #[test]
    fn scripted_publish() {
        let mut stream = MockStream::new();
        stream.publish_script.push_back(PublishScript::AcceptPartial(3));
        stream.publish_script.push_back(PublishScript::WouldBlock);

        match stream.publish(b"abcdef").unwrap() {
            PublishOutcome::Incomplete(rest) => assert_eq!(rest, b"def"),
            PublishOutcome::Published => panic!("expected partial write"),
        }
        assert_eq!(
            stream.publish(b"def").unwrap_err().kind(),
            ErrorKind::WouldBlock
        );
        assert!(matches!(
            stream.publish(b"def").unwrap(),
            PublishOutcome::Published
        ));
        assert_eq!(stream.published, b"abcdef");
    }
}
