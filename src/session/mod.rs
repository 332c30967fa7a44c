pub mod framer;
pub mod headers;

pub use self::{framer::Framer, headers::ResponseHeader};

use std::{
    pin::Pin,
    task::{Context, Poll},
    time::SystemTime,
};

use bytes::Bytes;
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, ReadBuf},
    net::TcpStream,
};

#[cfg(feature = "ssl")]
use std::sync::Arc;

#[cfg(feature = "ssl")]
use tokio_rustls::{
    TlsConnector,
    client::TlsStream,
    rustls::{ClientConfig, RootCertStore, pki_types::ServerName},
};

#[derive(Debug)]
pub enum Error {
    /// Connect failure, timeout or abrupt end of stream.
    Transport(std::io::Error),
    /// Non-200 status, or a response the client cannot make sense of.
    /// Carries the first response line when there is one.
    Protocol(String),
    /// Chunked transfer framing violations.
    Framing(String),
    /// The requested operation needs credentials that were not given.
    MissingCredentials(&'static str),
    /// The caster URL does not name a usable endpoint.
    InvalidUrl(String),
    /// Frame payload decoding failed.
    Codec(codec::Error),
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Transport(value)
    }
}

impl From<codec::Error> for Error {
    fn from(value: codec::Error) -> Self {
        Self::Codec(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NtripVersion {
    V1,
    V2,
}

/// A caster endpoint, immutable for the lifetime of a session. The
/// port is required: casters listen on no well-known default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CasterEndpoint {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
    pub mountpoint: Option<String>,
}

impl CasterEndpoint {
    pub fn parse(input: &str) -> Result<Self, Error> {
        let url =
            url::Url::parse(input).map_err(|error| Error::InvalidUrl(format!("{input}: {error}")))?;

        let scheme = match url.scheme() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            other => {
                return Err(Error::InvalidUrl(format!("unsupported scheme: {other}")));
            }
        };

        let host = url
            .host_str()
            .ok_or_else(|| Error::InvalidUrl(format!("{input}: missing host")))?
            .to_string();

        let port = url
            .port()
            .ok_or_else(|| Error::InvalidUrl(format!("{input}: missing port")))?;

        let mountpoint = match url.path().trim_start_matches('/') {
            "" => None,
            path => Some(path.to_string()),
        };

        Ok(Self {
            scheme,
            host,
            port,
            mountpoint,
        })
    }

    /// The `Host:` header value: netloc without the scheme.
    pub fn netloc(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// The transport below a session: plain TCP or TLS over TCP.
pub enum NtripStream {
    Tcp(TcpStream),
    #[cfg(feature = "ssl")]
    Tls(Box<TlsStream<TcpStream>>),
}

impl AsyncRead for NtripStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Self::Tcp(stream) => Pin::new(stream).poll_read(cx, buf),
            #[cfg(feature = "ssl")]
            Self::Tls(stream) => Pin::new(stream.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for NtripStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        match self.get_mut() {
            Self::Tcp(stream) => Pin::new(stream).poll_write(cx, buf),
            #[cfg(feature = "ssl")]
            Self::Tls(stream) => Pin::new(stream.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Self::Tcp(stream) => Pin::new(stream).poll_flush(cx),
            #[cfg(feature = "ssl")]
            Self::Tls(stream) => Pin::new(stream.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Self::Tcp(stream) => Pin::new(stream).poll_shutdown(cx),
            #[cfg(feature = "ssl")]
            Self::Tls(stream) => Pin::new(stream.as_mut()).poll_shutdown(cx),
        }
    }
}

async fn connect_stream(endpoint: &CasterEndpoint) -> Result<NtripStream, Error> {
    let stream = TcpStream::connect((endpoint.host.as_str(), endpoint.port)).await?;

    // Disable the Nagle algorithm: corrections age quickly, received
    // data should move as soon as possible.
    if let Err(error) = stream.set_nodelay(true) {
        log::error!("socket set nodelay failed!: addr={}, err={error}", endpoint.netloc());
    }

    match endpoint.scheme {
        Scheme::Http => Ok(NtripStream::Tcp(stream)),
        #[cfg(feature = "ssl")]
        Scheme::Https => {
            let mut roots = RootCertStore::empty();
            roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

            let connector = TlsConnector::from(Arc::new(
                ClientConfig::builder()
                    .with_root_certificates(roots)
                    .with_no_client_auth(),
            ));

            let name = ServerName::try_from(endpoint.host.clone())
                .map_err(|_| Error::InvalidUrl(format!("invalid tls name: {}", endpoint.host)))?;

            Ok(NtripStream::Tls(Box::new(
                connector.connect(name, stream).await?,
            )))
        }
        #[cfg(not(feature = "ssl"))]
        Scheme::Https => Err(Error::InvalidUrl(
            "https caster but tls support is not compiled in".to_string(),
        )),
    }
}

/// One NTRIP session: the connection, the response header state and
/// the frame scanner. Created by `connect`, destroyed by `close` or by
/// dropping it (which closes the socket on every exit path).
pub struct NtripSession {
    stream: BufReader<NtripStream>,
    endpoint: CasterEndpoint,
    framer: Framer,
    chunked: bool,
    response: ResponseHeader,
}

impl NtripSession {
    pub async fn connect(endpoint: CasterEndpoint) -> Result<Self, Error> {
        let stream = connect_stream(&endpoint).await?;
        log::debug!("connection open: caster={}", endpoint.netloc());

        Ok(Self {
            stream: BufReader::new(stream),
            endpoint,
            framer: Framer::default(),
            chunked: false,
            response: ResponseHeader::default(),
        })
    }

    /// The most recently parsed response header.
    pub fn response(&self) -> &ResponseHeader {
        &self.response
    }

    /// Fetches the caster sourcetable: every body line through the
    /// `ENDSOURCETABLE` terminator (inclusive), then closes.
    pub async fn request_sourcetable(&mut self) -> Result<Vec<String>, Error> {
        let request = headers::sourcetable_request(&self.endpoint);
        self.send_request(&request).await?;
        self.read_response().await?;
        self.ensure_status_ok().await?;

        let mut table = Vec::new();
        loop {
            let Some(line) = self.read_line().await? else {
                return Err(Error::Protocol(
                    "connection closed before ENDSOURCETABLE".to_string(),
                ));
            };

            log::debug!("sourcetable > {line}");
            let done = line == "ENDSOURCETABLE";
            table.push(line);
            if done {
                break;
            }
        }

        let _ = self.stream.shutdown().await;
        Ok(table)
    }

    /// Subscribes to a mountpoint stream and arms the framer.
    /// Subsequent `next_frame` calls yield the RTCM frames.
    pub async fn request_stream(
        &mut self,
        mountpoint: &str,
        user: Option<&str>,
        password: Option<&str>,
        nmea_gga: Option<&str>,
    ) -> Result<(), Error> {
        let request = headers::stream_request(&self.endpoint, mountpoint, user, password, nmea_gga);
        self.send_request(&request).await?;
        self.read_response().await?;
        self.ensure_status_ok().await?;

        self.chunked = self.response.chunked;
        self.framer = Framer::default();
        Ok(())
    }

    /// The next CRC-verified frame and its arrival time.
    pub async fn next_frame(&mut self) -> Result<(Bytes, SystemTime), Error> {
        loop {
            if let Some(frame) = self.framer.next_frame() {
                return Ok((frame, SystemTime::now()));
            }

            if self.chunked {
                self.read_chunk().await?;
            } else {
                let mut buffer = [0u8; 2048];
                let size = self.stream.read(&mut buffer).await?;
                if size == 0 {
                    return Err(Error::Transport(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        "caster closed the stream",
                    )));
                }

                self.framer.extend(&buffer[..size]);
            }
        }
    }

    /// Reads one chunk of an HTTP chunked body into the framer: a hex
    /// length line, then exactly `length + 2` bytes of which the last
    /// two must be the CRLF terminator.
    async fn read_chunk(&mut self) -> Result<(), Error> {
        let Some(line) = self.read_line().await? else {
            return Err(Error::Transport(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "caster closed the stream",
            )));
        };

        let size = usize::from_str_radix(line.trim(), 16)
            .map_err(|_| Error::Framing(format!("invalid chunk length line: {line:?}")))?;
        if size == 0 {
            return Err(Error::Transport(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "caster ended the chunked stream",
            )));
        }

        let mut chunk = vec![0u8; size + 2];
        self.stream.read_exact(&mut chunk).await.map_err(|error| {
            match error.kind() {
                std::io::ErrorKind::UnexpectedEof => {
                    Error::Framing(format!("chunk shorter than advertised: {size}"))
                }
                _ => Error::Transport(error),
            }
        })?;

        if &chunk[size..] != b"\r\n" {
            return Err(Error::Framing("chunk missing crlf terminator".to_string()));
        }

        self.framer.extend(&chunk[..size]);
        Ok(())
    }

    /// Performs the server (provider) handshake; `send_frame` then
    /// forwards frames to the caster.
    pub async fn request_server(
        &mut self,
        mountpoint: &str,
        user: Option<&str>,
        password: Option<&str>,
        version: NtripVersion,
    ) -> Result<(), Error> {
        let request =
            headers::server_request(&self.endpoint, mountpoint, user, password, version)?;
        self.send_request(&request).await?;
        self.read_response().await?;
        self.ensure_status_ok().await
    }

    /// Forwards one raw RTCM frame to the caster.
    pub async fn send_frame(&mut self, frame: &[u8]) -> Result<(), Error> {
        self.stream.write_all(frame).await?;
        self.stream.flush().await?;
        Ok(())
    }

    pub async fn close(mut self) -> Result<(), Error> {
        self.stream.shutdown().await?;
        Ok(())
    }

    async fn send_request(&mut self, request: &[u8]) -> Result<(), Error> {
        for line in String::from_utf8_lossy(request)
            .split("\r\n")
            .filter(|line| !line.is_empty())
        {
            log::debug!("request header > {line}");
        }

        self.stream.write_all(request).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// One ISO-8859-1 response line without its CRLF, or `None` at end
    /// of stream.
    async fn read_line(&mut self) -> Result<Option<String>, Error> {
        let mut bytes = Vec::new();
        let size = self.stream.read_until(b'\n', &mut bytes).await?;
        if size == 0 {
            return Ok(None);
        }

        while matches!(bytes.last(), Some(b'\r' | b'\n')) {
            bytes.pop();
        }

        // ISO-8859-1 maps one to one onto unicode scalar values.
        Ok(Some(bytes.iter().map(|&byte| byte as char).collect()))
    }

    async fn read_response(&mut self) -> Result<(), Error> {
        let mut lines = Vec::new();
        loop {
            match self.read_line().await? {
                None if lines.is_empty() => {
                    return Err(Error::Protocol("empty caster response".to_string()));
                }
                None => break,
                Some(line) if line.is_empty() => break,
                Some(line) => {
                    log::debug!("response header > {line}");
                    lines.push(line);
                }
            }
        }

        self.response = ResponseHeader::parse(lines);
        Ok(())
    }

    /// Requires a 200 status; anything else surfaces the first
    /// response line and closes the writer.
    async fn ensure_status_ok(&mut self) -> Result<(), Error> {
        if self.response.status_ok() {
            return Ok(());
        }

        let line = self.response.lines.first().cloned().unwrap_or_default();
        let _ = self.stream.shutdown().await;
        Err(Error::Protocol(line))
    }
}
