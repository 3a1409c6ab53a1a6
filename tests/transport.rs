#[cfg(feature = "tcp")]
mod tests {
    use std::{
        io::{Read, Write},
        net::TcpListener,
        thread,
        time::{Duration, Instant},
    };

    use tickio::{
        transport::{TlsOptions, Transport},
        url::Scheme,
        Publish, PublishOutcome, Receive, ReceiveOutcome, Session, SessionStatus,
    };

    fn establish(transport: &mut Transport) {
        let _ = env_logger::builder().is_test(true).try_init();
        let deadline = Instant::now() + Duration::from_secs(5);
        while transport.status() == SessionStatus::Establishing {
            assert!(Instant::now() < deadline, "connect did not finish");
            transport.drive().unwrap();
        }
        assert_eq!(transport.status(), SessionStatus::Established);
    }

    #[test]
    fn nonblocking_connect_write_read_eof() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut transport =
            Transport::connect("127.0.0.1", port, Scheme::Http, &TlsOptions::default()).unwrap();
        let (mut server, _) = listener.accept().unwrap();
        establish(&mut transport);

        // client -> server
        let mut pending: &[u8] = b"hello from client";
        loop {
            match transport.publish(pending).unwrap() {
                PublishOutcome::Published => break,
                PublishOutcome::Incomplete(rest) => pending = rest,
            }
        }
        let mut buf = [0u8; 64];
        let read = server.read(&mut buf).unwrap();
        assert_eq!(&buf[..read], b"hello from client");

        // server -> client
        server.write_all(b"hello from server").unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut received = Vec::new();
        while received.len() < 17 {
            assert!(Instant::now() < deadline, "read did not finish");
            match transport.receive().unwrap() {
                ReceiveOutcome::Payload(data) => received.extend_from_slice(data),
                ReceiveOutcome::Buffered | ReceiveOutcome::Idle => {
                    thread::sleep(Duration::from_millis(1))
                }
            }
        }
        assert_eq!(received, b"hello from server");

        // peer close surfaces as UnexpectedEof and terminates the transport
        drop(server);
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            assert!(Instant::now() < deadline, "eof did not surface");
            match transport.receive() {
                Ok(_) => thread::sleep(Duration::from_millis(1)),
                Err(err) => {
                    assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
                    break;
                }
            }
        }
        assert_eq!(transport.status(), SessionStatus::Terminated);
    }

    #[test]
    fn connect_blocking_establishes_before_returning() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let accepter = thread::spawn(move || listener.accept().unwrap());

        let transport = Transport::connect_blocking(
            "127.0.0.1",
            port,
            Scheme::Http,
            &TlsOptions::default(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(transport.status(), SessionStatus::Established);
        accepter.join().unwrap();
    }

    #[test]
    fn connect_refused_fails_while_driving() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let mut transport =
            Transport::connect("127.0.0.1", port, Scheme::Http, &TlsOptions::default()).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            assert!(Instant::now() < deadline, "refusal did not surface");
            match transport.drive() {
                Err(_) => break,
                Ok(_) => thread::sleep(Duration::from_millis(1)),
            }
        }
        assert_eq!(transport.status(), SessionStatus::Terminated);
    }

    #[test]
    fn close_is_idempotent_in_every_phase() {
        // mid-connect
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let mut transport =
            Transport::connect("127.0.0.1", port, Scheme::Http, &TlsOptions::default()).unwrap();
        transport.close();
        transport.close();
        assert_eq!(transport.status(), SessionStatus::Terminated);

        // established
        let mut transport =
            Transport::connect("127.0.0.1", port, Scheme::Http, &TlsOptions::default()).unwrap();
        let _server = listener.accept().unwrap();
        establish(&mut transport);
        transport.close();
        transport.close();
        assert_eq!(transport.status(), SessionStatus::Terminated);
    }

    #[test]
    fn publish_before_established_is_not_connected() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let mut transport =
            Transport::connect("127.0.0.1", port, Scheme::Http, &TlsOptions::default()).unwrap();
        let err = transport.publish(b"too early").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotConnected);
    }
}
