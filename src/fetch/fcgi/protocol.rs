//! Minimal FastCGI record framing.
//!
//! Only the records one status-page exchange needs: `BEGIN_REQUEST`,
//! `PARAMS` and `STDIN` on the way out, `STDOUT`/`STDERR`/`END_REQUEST` on
//! the way back. This is deliberately not a general FastCGI client.

use crate::error::FetchError;

pub const FCGI_VERSION: u8 = 1;

pub const BEGIN_REQUEST: u8 = 1;
pub const END_REQUEST: u8 = 3;
pub const PARAMS: u8 = 4;
pub const STDIN: u8 = 5;
pub const STDOUT: u8 = 6;
pub const STDERR: u8 = 7;

/// Role requested in BEGIN_REQUEST.
pub const ROLE_RESPONDER: u16 = 1;

pub const HEADER_LEN: usize = 8;

/// Decoded record header (version byte already validated).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub record_type: u8,
    pub request_id: u16,
    pub content_length: u16,
    pub padding_length: u8,
}

impl RecordHeader {
    pub fn parse(bytes: &[u8; HEADER_LEN]) -> Result<Self, FetchError> {
        if bytes[0] != FCGI_VERSION {
            return Err(FetchError::Protocol(format!(
                "unsupported FastCGI version {}",
                bytes[0]
            )));
        }
        Ok(Self {
            record_type: bytes[1],
            request_id: u16::from_be_bytes([bytes[2], bytes[3]]),
            content_length: u16::from_be_bytes([bytes[4], bytes[5]]),
            padding_length: bytes[6],
        })
    }
}

/// Append one record (header plus content, no padding) to `buf`.
///
/// Content larger than a single record is not supported; a status request
/// never comes close to the 64 KiB record limit.
pub fn encode_record(record_type: u8, request_id: u16, content: &[u8], buf: &mut Vec<u8>) {
    debug_assert!(content.len() <= u16::MAX as usize);

    buf.push(FCGI_VERSION);
    buf.push(record_type);
    buf.extend_from_slice(&request_id.to_be_bytes());
    buf.extend_from_slice(&(content.len() as u16).to_be_bytes());
    buf.push(0); // padding length
    buf.push(0); // reserved
    buf.extend_from_slice(content);
}

/// Append a BEGIN_REQUEST record (responder role, connection closed after
/// the request).
pub fn encode_begin_request(request_id: u16, buf: &mut Vec<u8>) {
    let mut body = [0u8; 8];
    body[..2].copy_from_slice(&ROLE_RESPONDER.to_be_bytes());
    encode_record(BEGIN_REQUEST, request_id, &body, buf);
}

/// Append one PARAMS record carrying all pairs, followed by the empty
/// PARAMS terminator.
pub fn encode_params(request_id: u16, pairs: &[(&str, &str)], buf: &mut Vec<u8>) {
    let mut content = Vec::new();
    for (name, value) in pairs {
        encode_name_value(name.as_bytes(), value.as_bytes(), &mut content);
    }
    encode_record(PARAMS, request_id, &content, buf);
    encode_record(PARAMS, request_id, &[], buf);
}

/// Append the empty STDIN record that closes the request body.
pub fn encode_stdin_close(request_id: u16, buf: &mut Vec<u8>) {
    encode_record(STDIN, request_id, &[], buf);
}

/// FastCGI name-value pair: lengths below 128 take one byte, longer ones
/// four bytes with the high bit set.
fn encode_name_value(name: &[u8], value: &[u8], buf: &mut Vec<u8>) {
    encode_length(name.len(), buf);
    encode_length(value.len(), buf);
    buf.extend_from_slice(name);
    buf.extend_from_slice(value);
}

fn encode_length(len: usize, buf: &mut Vec<u8>) {
    if len < 128 {
        buf.push(len as u8);
    } else {
        buf.extend_from_slice(&((len as u32) | 0x8000_0000).to_be_bytes());
    }
}
