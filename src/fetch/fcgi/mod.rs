//! In-process FastCGI status client.

pub mod protocol;

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, UnixStream};
use tokio::time::timeout;
use tracing::debug;

use crate::error::FetchError;

use super::{StatusFetcher, STATUS_QUERY};

/// A single exchange per connection, so one id is all we ever need.
const REQUEST_ID: u16 = 1;

const SERVER_SOFTWARE: &str = "phpfpm-exporter/fcgi";

/// Fetches the status page by speaking FastCGI to the pool endpoint
/// directly.
///
/// Transport is auto-detected per call: an endpoint naming an existing
/// socket file dials unix, anything else dials TCP. The dial is bounded by
/// the connect timeout; reads are not separately bounded.
pub struct FcgiFetcher {
    endpoint: String,
    status_path: String,
    connect_timeout: Duration,
}

enum Transport {
    Unix(UnixStream),
    Tcp(TcpStream),
}

impl FcgiFetcher {
    pub fn new(
        endpoint: impl Into<String>,
        status_path: impl Into<String>,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            status_path: status_path.into(),
            connect_timeout,
        }
    }

    fn request_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(256);
        protocol::encode_begin_request(REQUEST_ID, &mut buf);
        protocol::encode_params(
            REQUEST_ID,
            &[
                ("SCRIPT_NAME", self.status_path.as_str()),
                ("SCRIPT_FILENAME", self.status_path.as_str()),
                ("QUERY_STRING", STATUS_QUERY),
                ("REQUEST_METHOD", "GET"),
                ("SERVER_SOFTWARE", SERVER_SOFTWARE),
            ],
            &mut buf,
        );
        protocol::encode_stdin_close(REQUEST_ID, &mut buf);
        buf
    }

    async fn dial(&self) -> Result<Transport, FetchError> {
        let connect_timeout = self.connect_timeout;

        if is_unix_socket(&self.endpoint) {
            debug!(endpoint = %self.endpoint, "endpoint identified as unix socket");
            let stream = timeout(connect_timeout, UnixStream::connect(&self.endpoint))
                .await
                .map_err(|_| self.connect_error(format!("timed out after {connect_timeout:?}")))?
                .map_err(|e| self.connect_error(e.to_string()))?;
            Ok(Transport::Unix(stream))
        } else {
            debug!(endpoint = %self.endpoint, "endpoint identified as tcp address");
            let stream = timeout(connect_timeout, TcpStream::connect(&self.endpoint))
                .await
                .map_err(|_| self.connect_error(format!("timed out after {connect_timeout:?}")))?
                .map_err(|e| self.connect_error(e.to_string()))?;
            Ok(Transport::Tcp(stream))
        }
    }

    fn connect_error(&self, reason: String) -> FetchError {
        FetchError::Connect {
            endpoint: self.endpoint.clone(),
            reason,
        }
    }
}

#[async_trait]
impl StatusFetcher for FcgiFetcher {
    async fn fetch(&self) -> Result<String, FetchError> {
        let request = self.request_bytes();

        let stdout = match self.dial().await? {
            Transport::Unix(mut stream) => exchange(&mut stream, &request).await?,
            Transport::Tcp(mut stream) => exchange(&mut stream, &request).await?,
        };

        let text = String::from_utf8(stdout)
            .map_err(|_| FetchError::Protocol("status response is not valid UTF-8".into()))?;

        strip_cgi_headers(&text).map(str::to_owned)
    }
}

fn is_unix_socket(endpoint: &str) -> bool {
    use std::os::unix::fs::FileTypeExt;

    std::fs::metadata(endpoint)
        .map(|m| m.file_type().is_socket())
        .unwrap_or(false)
}

/// Write the request, then collect STDOUT until END_REQUEST.
async fn exchange<S>(stream: &mut S, request: &[u8]) -> Result<Vec<u8>, FetchError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(request).await?;

    let mut stdout = Vec::new();
    let mut stderr = Vec::new();

    loop {
        let mut header_bytes = [0u8; protocol::HEADER_LEN];
        read_framed(stream, &mut header_bytes).await?;
        let header = protocol::RecordHeader::parse(&header_bytes)?;

        let mut content =
            vec![0u8; header.content_length as usize + header.padding_length as usize];
        read_framed(stream, &mut content).await?;
        content.truncate(header.content_length as usize);

        match header.record_type {
            protocol::STDOUT => stdout.extend_from_slice(&content),
            protocol::STDERR => stderr.extend_from_slice(&content),
            protocol::END_REQUEST => break,
            _ => {}
        }
    }

    if !stderr.is_empty() {
        debug!(
            stderr = %String::from_utf8_lossy(&stderr),
            "FastCGI application wrote to stderr"
        );
    }

    Ok(stdout)
}

/// `read_exact` with a mid-record EOF reported as a framing error rather
/// than a plain I/O failure.
async fn read_framed<S>(stream: &mut S, buf: &mut [u8]) -> Result<(), FetchError>
where
    S: AsyncRead + Unpin,
{
    match stream.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(FetchError::Protocol(
            "connection closed before end of request".into(),
        )),
        Err(e) => Err(FetchError::Io(e)),
    }
}

/// Strip the CGI header block; the body starts after the first blank line.
fn strip_cgi_headers(response: &str) -> Result<&str, FetchError> {
    response
        .split_once("\r\n\r\n")
        .map(|(_, body)| body)
        .ok_or_else(|| FetchError::Protocol("missing CGI header/body boundary".into()))
}
