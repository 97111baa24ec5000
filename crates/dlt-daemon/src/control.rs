//! # Control Frame Codec
//!
//! ```text
//! request:  service_id:u32le | len:u32le | payload[len]
//! response: service_id:u32le | status:u8 | len:u32le | payload[len]
//! ```
//!
//! Injection requests (service id at or above `CALLSW_CINJECTION`) carry a
//! 12 byte target header: ECU, application and context id, four bytes each,
//! NUL padded.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use dlt_types::{ServiceId, ServiceResponse};

use crate::error::DaemonError;

pub const REQUEST_HEADER_LEN: usize = 8;
pub const RESPONSE_HEADER_LEN: usize = 9;
/// Largest accepted request payload.
pub const MAX_PAYLOAD: usize = 64 * 1024;
const ID_LEN: usize = 4;
pub const INJECTION_HEADER_LEN: usize = 3 * ID_LEN;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlRequest {
    pub service_id: ServiceId,
    pub payload: Bytes,
}

impl ControlRequest {
    pub fn new(service_id: ServiceId, payload: impl Into<Bytes>) -> Self {
        Self {
            service_id,
            payload: payload.into(),
        }
    }

    pub fn encode(&self) -> BytesMut {
        let mut out = BytesMut::with_capacity(REQUEST_HEADER_LEN + self.payload.len());
        out.put_u32_le(self.service_id);
        out.put_u32_le(self.payload.len() as u32);
        out.put_slice(&self.payload);
        out
    }

    /// Decode one request from the front of `buf`.
    ///
    /// Returns `Ok(None)` while the frame is incomplete, otherwise the
    /// request and the number of bytes it occupied.
    pub fn decode(buf: &[u8]) -> Result<Option<(Self, usize)>, DaemonError> {
        if buf.len() < REQUEST_HEADER_LEN {
            return Ok(None);
        }
        let mut header = &buf[..REQUEST_HEADER_LEN];
        let service_id = header.get_u32_le();
        let len = header.get_u32_le() as usize;
        if len > MAX_PAYLOAD {
            return Err(DaemonError::Codec(format!(
                "payload of {len} bytes exceeds {MAX_PAYLOAD}"
            )));
        }
        let total = REQUEST_HEADER_LEN + len;
        if buf.len() < total {
            return Ok(None);
        }
        let payload = Bytes::copy_from_slice(&buf[REQUEST_HEADER_LEN..total]);
        Ok(Some((Self { service_id, payload }, total)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlResponse {
    pub service_id: ServiceId,
    pub status: ServiceResponse,
    pub payload: Bytes,
}

impl ControlResponse {
    pub fn status(service_id: ServiceId, status: ServiceResponse) -> Self {
        Self {
            service_id,
            status,
            payload: Bytes::new(),
        }
    }

    pub fn with_payload(mut self, payload: impl Into<Bytes>) -> Self {
        self.payload = payload.into();
        self
    }

    pub fn encode(&self) -> BytesMut {
        let mut out = BytesMut::with_capacity(RESPONSE_HEADER_LEN + self.payload.len());
        out.put_u32_le(self.service_id);
        out.put_u8(self.status.as_u8());
        out.put_u32_le(self.payload.len() as u32);
        out.put_slice(&self.payload);
        out
    }

    pub fn decode(buf: &[u8]) -> Result<Option<(Self, usize)>, DaemonError> {
        if buf.len() < RESPONSE_HEADER_LEN {
            return Ok(None);
        }
        let mut header = &buf[..RESPONSE_HEADER_LEN];
        let service_id = header.get_u32_le();
        let status = ServiceResponse::try_from(header.get_u8())
            .map_err(|e| DaemonError::Codec(e.to_string()))?;
        let len = header.get_u32_le() as usize;
        let total = RESPONSE_HEADER_LEN + len;
        if buf.len() < total {
            return Ok(None);
        }
        let payload = Bytes::copy_from_slice(&buf[RESPONSE_HEADER_LEN..total]);
        Ok(Some((
            Self {
                service_id,
                status,
                payload,
            },
            total,
        )))
    }
}

/// Addressee of an injection request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionTarget {
    pub ecu_id: String,
    pub app_id: String,
    pub context_id: String,
}

impl InjectionTarget {
    pub fn parse(payload: &[u8]) -> Result<Self, DaemonError> {
        if payload.len() < INJECTION_HEADER_LEN {
            return Err(DaemonError::Codec(format!(
                "injection payload of {} bytes is shorter than {INJECTION_HEADER_LEN}",
                payload.len()
            )));
        }
        let mut ids = payload[..INJECTION_HEADER_LEN]
            .chunks_exact(ID_LEN)
            .map(decode_id);
        let mut next = || ids.next().unwrap_or_default();
        Ok(Self {
            ecu_id: next(),
            app_id: next(),
            context_id: next(),
        })
    }

    pub fn encode(&self) -> BytesMut {
        let mut out = BytesMut::with_capacity(INJECTION_HEADER_LEN);
        for id in [&self.ecu_id, &self.app_id, &self.context_id] {
            let mut field = [0u8; ID_LEN];
            let bytes = id.as_bytes();
            let n = bytes.len().min(ID_LEN);
            field[..n].copy_from_slice(&bytes[..n]);
            out.put_slice(&field);
        }
        out
    }
}

fn decode_id(raw: &[u8]) -> String {
    let end = raw.iter().position(|b| *b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}
