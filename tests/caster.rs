use anyhow::Result;
use ntrip_client::{
    codec::{frame, message::TextMessage},
    session::{CasterEndpoint, Error, NtripSession, NtripVersion},
};

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};

/// A live 1005 frame, used as caster traffic in the stream tests.
#[rustfmt::skip]
const MSG1005_FRAME: &[u8] = &[
    0xD3, 0x00, 0x13, 0x3E, 0xD7, 0xD3, 0x02, 0x02, 0x98, 0x0E, 0xDE, 0xEF,
    0x34, 0xB4, 0xBD, 0x62, 0xAC, 0x09, 0x41, 0x98, 0x6F, 0x33, 0x36, 0x0B,
    0x98,
];

const SOURCETABLE: &str = "CAS;caster.example.com;2101;Test;None;0;DNK;55.70;12.56\r\n\
                           STR;PNT1;Copenhagen;RTCM 3.2;1074(1),1084(1);2;GPS+GLO;Test;DNK;55.70;12.56;0;0;Leica;None;B;N;500;\r\n\
                           ENDSOURCETABLE\r\n";

async fn read_request(socket: &mut TcpStream) -> String {
    let mut request = Vec::new();
    let mut byte = [0u8; 1];
    while !request.ends_with(b"\r\n\r\n") {
        if socket.read(&mut byte).await.unwrap() == 0 {
            break;
        }

        request.push(byte[0]);
    }

    String::from_utf8_lossy(&request).to_string()
}

fn endpoint_of(listener: &TcpListener) -> CasterEndpoint {
    let port = listener.local_addr().unwrap().port();
    CasterEndpoint::parse(&format!("http://127.0.0.1:{port}")).unwrap()
}

fn chunk(payload: &[u8]) -> Vec<u8> {
    let mut bytes = format!("{:X}\r\n", payload.len()).into_bytes();
    bytes.extend_from_slice(payload);
    bytes.extend_from_slice(b"\r\n");
    bytes
}

#[tokio::test]
async fn sourcetable_request() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let endpoint = endpoint_of(&listener);

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;

        assert!(request.starts_with("GET / HTTP/1.1\r\n"));
        assert!(request.contains("Ntrip-Version: Ntrip/2.0\r\n"));
        assert!(request.contains("User-Agent: NTRIP Bedrock Solutions NtripClient/"));
        assert!(request.contains("Connection: close\r\n"));

        socket
            .write_all(
                format!("HTTP/1.1 200 OK\r\nServer: TestCaster/1.0\r\n\r\n{SOURCETABLE}").as_bytes(),
            )
            .await
            .unwrap();
    });

    let mut session = NtripSession::connect(endpoint).await?;
    let table = session.request_sourcetable().await?;

    assert_eq!(table.len(), 3);
    assert!(table[1].starts_with("STR;PNT1;"));
    assert_eq!(table.last().map(String::as_str), Some("ENDSOURCETABLE"));

    Ok(())
}

#[tokio::test]
async fn chunked_stream() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let endpoint = endpoint_of(&listener);

    let second_frame = frame::seal(&TextMessage::new("status ok").encode())
        .unwrap()
        .to_vec();
    let stream_bytes = [MSG1005_FRAME, &second_frame[..]].concat();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;

        assert!(request.starts_with("GET /PNT1 HTTP/1.1\r\n"));
        // b64("otto:tystys")
        assert!(request.contains("Authorization: Basic b3R0bzp0eXN0eXM=\r\n"));
        assert!(request.contains("$GPGGA,"));

        socket
            .write_all(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n")
            .await
            .unwrap();

        // Chunk boundaries deliberately do not line up with frame
        // boundaries.
        for part in stream_bytes.chunks(17) {
            socket.write_all(&chunk(part)).await.unwrap();
        }

        socket.write_all(b"0\r\n\r\n").await.unwrap();
    });

    let gga = "$GPGGA,092751.000,5321.6802,N,00630.3371,W,1,8,1.03,61.7,M,55.3,M,,*75";
    let mut session = NtripSession::connect(endpoint).await?;
    session
        .request_stream("PNT1", Some("otto"), Some("tystys"), Some(gga))
        .await?;

    let (first, _) = session.next_frame().await?;
    let (second, _) = session.next_frame().await?;

    assert_eq!(&first[..], MSG1005_FRAME);
    assert_eq!(&second[..], &second_frame[..]);
    assert_eq!(frame::message_type(&second)?, 1029);

    // The zero length chunk ends the stream.
    assert!(matches!(
        session.next_frame().await,
        Err(Error::Transport(_))
    ));

    Ok(())
}

#[tokio::test]
async fn unchunked_stream() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let endpoint = endpoint_of(&listener);

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;

        socket.write_all(b"HTTP/1.1 200 OK\r\n\r\n").await.unwrap();
        socket.write_all(MSG1005_FRAME).await.unwrap();
        socket.write_all(MSG1005_FRAME).await.unwrap();
    });

    let mut session = NtripSession::connect(endpoint).await?;
    session.request_stream("PNT1", None, None, None).await?;

    for _ in 0..2 {
        let (frame, _) = session.next_frame().await?;
        assert_eq!(&frame[..], MSG1005_FRAME);
    }

    Ok(())
}

#[tokio::test]
async fn rejected_stream_request() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let endpoint = endpoint_of(&listener);

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;

        socket
            .write_all(b"HTTP/1.1 401 Unauthorized\r\n\r\n")
            .await
            .unwrap();
    });

    let mut session = NtripSession::connect(endpoint).await?;
    let result = session.request_stream("PNT1", None, None, None).await;

    match result {
        Err(Error::Protocol(line)) => assert_eq!(line, "HTTP/1.1 401 Unauthorized"),
        other => panic!("expected a protocol error, got {other:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn server_handshake_and_upload() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let endpoint = endpoint_of(&listener);

    let received = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;

        assert!(request.starts_with("POST /PNT1 HTTP/1.1\r\n"));
        assert!(request.contains("Authorization: Basic b3R0bzp0eXN0eXM=\r\n"));

        socket.write_all(b"HTTP/1.1 200 OK\r\n\r\n").await.unwrap();

        let mut frame = vec![0u8; MSG1005_FRAME.len()];
        socket.read_exact(&mut frame).await.unwrap();
        frame
    });

    let mut session = NtripSession::connect(endpoint).await?;
    session
        .request_server("PNT1", Some("otto"), Some("tystys"), NtripVersion::V2)
        .await?;
    session.send_frame(MSG1005_FRAME).await?;

    assert_eq!(received.await?, MSG1005_FRAME);

    Ok(())
}

#[tokio::test]
async fn ntrip1_server_handshake() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let endpoint = endpoint_of(&listener);

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;

        // b64("tystys")
        assert!(request.starts_with("SOURCE dHlzdHlz /PNT1 HTTP/1.1\r\n"));
        assert!(request.contains("Source-Agent: NTRIP "));

        socket.write_all(b"ICY 200 OK\r\n\r\n").await.unwrap();
    });

    let mut session = NtripSession::connect(endpoint).await?;
    session
        .request_server("PNT1", None, Some("tystys"), NtripVersion::V1)
        .await?;

    Ok(())
}
