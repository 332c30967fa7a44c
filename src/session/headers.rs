use base64::{Engine, prelude::BASE64_STANDARD};
use chrono::Utc;

use super::{CasterEndpoint, Error, NtripVersion};
use crate::CLIENT_NAME;

/// NTRIP is an HTTP dialect, but its headers are ISO-8859-1: encode
/// characters one to one and replace anything outside latin-1.
fn iso8859_1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| if (ch as u32) < 256 { ch as u8 } else { b'?' })
        .collect()
}

/// `Date:` value in RFC 1123 form, always GMT.
fn timestamp() -> String {
    Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Sourcetable request: a plain `GET /` with the NTRIP 2.0 headers.
pub fn sourcetable_request(endpoint: &CasterEndpoint) -> Vec<u8> {
    iso8859_1(&format!(
        "GET / HTTP/1.1\r\n\
         Host: {}\r\n\
         Ntrip-Version: Ntrip/2.0\r\n\
         User-Agent: NTRIP {}\r\n\
         Date: {}\r\n\
         Connection: close\r\n\
         \r\n",
        endpoint.netloc(),
        CLIENT_NAME,
        timestamp(),
    ))
}

/// Client stream request for a mountpoint, with optional Basic auth
/// and an optional NMEA-GGA sentence marking the rover position.
pub fn stream_request(
    endpoint: &CasterEndpoint,
    mountpoint: &str,
    user: Option<&str>,
    password: Option<&str>,
    nmea_gga: Option<&str>,
) -> Vec<u8> {
    let auth = match (user, password) {
        (Some(user), Some(password)) => {
            format!(
                "Authorization: Basic {}\r\n",
                BASE64_STANDARD.encode(format!("{user}:{password}"))
            )
        }
        _ => String::new(),
    };

    let nmea = nmea_gga
        .map(|sentence| format!("{sentence}\r\n"))
        .unwrap_or_default();

    iso8859_1(&format!(
        "GET /{mountpoint} HTTP/1.1\r\n\
         Host: {}\r\n\
         Ntrip-Version: Ntrip/2.0\r\n\
         User-Agent: NTRIP {}\r\n\
         {auth}{nmea}\
         Date: {}\r\n\
         Connection: close\r\n\
         \r\n",
        endpoint.netloc(),
        CLIENT_NAME,
        timestamp(),
    ))
}

/// Server (provider) handshake. Version 2 is a `POST` with Basic auth
/// and needs both credentials; version 1 is the one line `SOURCE`
/// handshake carrying only the base64 password.
pub fn server_request(
    endpoint: &CasterEndpoint,
    mountpoint: &str,
    user: Option<&str>,
    password: Option<&str>,
    version: NtripVersion,
) -> Result<Vec<u8>, Error> {
    Ok(match version {
        NtripVersion::V2 => {
            let (Some(user), Some(password)) = (user, password) else {
                return Err(Error::MissingCredentials(
                    "ntrip v2 server mode needs a user and a password",
                ));
            };

            iso8859_1(&format!(
                "POST /{mountpoint} HTTP/1.1\r\n\
                 Host: {}\r\n\
                 Ntrip-Version: Ntrip/2.0\r\n\
                 Authorization: Basic {}\r\n\
                 User-Agent: NTRIP {}\r\n\
                 Date: {}\r\n\
                 Connection: close\r\n\
                 \r\n",
                endpoint.netloc(),
                BASE64_STANDARD.encode(format!("{user}:{password}")),
                CLIENT_NAME,
                timestamp(),
            ))
        }
        NtripVersion::V1 => {
            let Some(password) = password else {
                return Err(Error::MissingCredentials(
                    "ntrip v1 server mode needs a password",
                ));
            };

            iso8859_1(&format!(
                "SOURCE {} /{mountpoint} HTTP/1.1\r\n\
                 Source-Agent: NTRIP {}\r\n\
                 \r\n",
                BASE64_STANDARD.encode(password),
                CLIENT_NAME,
            ))
        }
    })
}

/// Parsed caster response header.
#[derive(Debug, Clone, Default)]
pub struct ResponseHeader {
    pub lines: Vec<String>,
    /// The token following the protocol in the status line, or 0 when
    /// the line does not tokenise. Some v1 casters answer with a body
    /// oriented response; the caller decides what to make of it.
    pub status_code: u16,
    /// Whether any line reads `Transfer-Encoding: chunked`.
    pub chunked: bool,
}

impl ResponseHeader {
    pub fn parse(lines: Vec<String>) -> Self {
        let status_code = lines
            .first()
            .and_then(|line| line.split_whitespace().nth(1))
            .and_then(|token| token.parse().ok())
            .unwrap_or(0);

        let chunked = lines
            .iter()
            .any(|line| line.trim().eq_ignore_ascii_case("transfer-encoding: chunked"));

        Self {
            lines,
            status_code,
            chunked,
        }
    }

    pub fn status_ok(&self) -> bool {
        self.status_code == 200
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Scheme;

    fn endpoint() -> CasterEndpoint {
        CasterEndpoint {
            scheme: Scheme::Http,
            host: "caster.example.com".to_string(),
            port: 2101,
            mountpoint: None,
        }
    }

    fn split_lines(header: &[u8]) -> Vec<String> {
        String::from_utf8(header.to_vec())
            .unwrap()
            .split("\r\n")
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn sourcetable_request_shape() {
        let lines = split_lines(&sourcetable_request(&endpoint()));

        assert_eq!(lines[0], "GET / HTTP/1.1");
        assert_eq!(lines[1], "Host: caster.example.com:2101");
        assert_eq!(lines[2], "Ntrip-Version: Ntrip/2.0");
        assert!(lines[3].starts_with("User-Agent: NTRIP Bedrock Solutions NtripClient/"));
        assert!(lines[4].starts_with("Date: "));
        assert!(lines[4].ends_with(" GMT"));
        assert_eq!(lines[5], "Connection: close");
        assert_eq!(&lines[6..], ["", ""]);
    }

    #[test]
    fn stream_request_auth_and_gga() {
        let gga = "$GPGGA,092751.000,5321.6802,N,00630.3371,W,1,8,1.03,61.7,M,55.3,M,,*75";
        let request = stream_request(&endpoint(), "PNT1", Some("otto"), Some("tystys"), Some(gga));
        let lines = split_lines(&request);

        assert_eq!(lines[0], "GET /PNT1 HTTP/1.1");
        // b64("otto:tystys")
        assert_eq!(lines[4], "Authorization: Basic b3R0bzp0eXN0eXM=");
        assert_eq!(lines[5], gga);

        // Without a full credential pair no auth line is emitted.
        let request = stream_request(&endpoint(), "PNT1", Some("otto"), None, None);
        assert!(!String::from_utf8(request).unwrap().contains("Authorization"));
    }

    #[test]
    fn server_request_versions() {
        let request =
            server_request(&endpoint(), "PNT1", Some("otto"), Some("tystys"), NtripVersion::V2)
                .unwrap();
        let lines = split_lines(&request);
        assert_eq!(lines[0], "POST /PNT1 HTTP/1.1");
        assert_eq!(lines[3], "Authorization: Basic b3R0bzp0eXN0eXM=");

        let request =
            server_request(&endpoint(), "PNT1", None, Some("tystys"), NtripVersion::V1).unwrap();
        let lines = split_lines(&request);
        // b64("tystys")
        assert_eq!(lines[0], "SOURCE dHlzdHlz /PNT1 HTTP/1.1");
        assert!(lines[1].starts_with("Source-Agent: NTRIP "));

        assert!(server_request(&endpoint(), "PNT1", None, Some("x"), NtripVersion::V2).is_err());
        assert!(server_request(&endpoint(), "PNT1", Some("x"), None, NtripVersion::V1).is_err());
    }

    #[test]
    fn response_header_parsing() {
        let response = ResponseHeader::parse(vec![
            "HTTP/1.1 200 OK".to_string(),
            "Transfer-Encoding: CHUNKED".to_string(),
        ]);
        assert_eq!(response.status_code, 200);
        assert!(response.status_ok());
        assert!(response.chunked);

        let response = ResponseHeader::parse(vec!["ICY 200 OK".to_string()]);
        assert_eq!(response.status_code, 200);
        assert!(!response.chunked);

        // A body oriented v1 answer without a status token.
        let response = ResponseHeader::parse(vec!["SOURCETABLE".to_string()]);
        assert_eq!(response.status_code, 0);
        assert!(!response.status_ok());

        assert_eq!(ResponseHeader::parse(vec![]).status_code, 0);
    }
}
