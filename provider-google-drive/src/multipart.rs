//! `multipart/mixed` codec for the Drive batch endpoint.
//!
//! A batch call carries one `application/http` part per request, tagged with
//! `Content-ID: <item-{key}>`. The reply carries one part per request with
//! `Content-ID: <response-item-{key}>`, an embedded status line, headers and
//! a JSON body.

use bytes::Bytes;
use core_batch::{CorrelationKey, DispatchError, DispatchReply, PendingRequest, RawError, RawResponse};
use serde_json::Value;
use uuid::Uuid;

use crate::types::ErrorEnvelope;

/// Fresh boundary for one batch call.
pub fn new_boundary() -> String {
    format!("batch_{}", Uuid::new_v4().simple())
}

/// `Content-Type` header value for a body using `boundary`.
pub fn content_type(boundary: &str) -> String {
    format!("multipart/mixed; boundary={}", boundary)
}

/// Extract the boundary parameter from a `Content-Type` header value.
pub fn boundary_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("boundary") {
            return None;
        }
        let value = value.trim().trim_matches('"');
        (!value.is_empty()).then(|| value.to_string())
    })
}

/// Encode `requests` as a batch body.
///
/// `api_root` (e.g. `/drive/v3`) prefixes every embedded request line.
pub fn encode(boundary: &str, api_root: &str, requests: &[PendingRequest]) -> Bytes {
    let root = api_root.trim_end_matches('/');
    let mut body = String::new();

    for pending in requests {
        body.push_str(&format!("--{}\r\n", boundary));
        body.push_str("Content-Type: application/http\r\n");
        body.push_str("Content-Transfer-Encoding: binary\r\n");
        body.push_str(&format!("Content-ID: <item-{}>\r\n\r\n", pending.key));
        body.push_str(&format!(
            "{} {}/{}\r\n\r\n",
            pending.request.method.as_str(),
            root,
            pending.request.path_and_query()
        ));
    }
    body.push_str(&format!("--{}--\r\n", boundary));

    Bytes::from(body)
}

/// Decode a batch reply into one raw result per correlation key.
///
/// Accepts both CRLF and bare LF line endings.
pub fn decode(boundary: &str, body: &str) -> Result<DispatchReply, DispatchError> {
    let normalized = body.replace("\r\n", "\n");
    let delimiter = format!("--{}", boundary);
    let mut reply = DispatchReply::new();

    let mut segments = normalized.split(delimiter.as_str());
    // Anything before the first delimiter is preamble.
    segments.next();

    for segment in segments {
        if segment.starts_with("--") {
            break;
        }
        let segment = segment.trim_start_matches('\n');
        if segment.trim().is_empty() {
            continue;
        }

        let (key, result) = decode_part(segment)?;
        reply.insert(key, result);
    }

    Ok(reply)
}

fn decode_part(part: &str) -> Result<(CorrelationKey, Result<RawResponse, RawError>), DispatchError> {
    let (outer_headers, inner) = part
        .split_once("\n\n")
        .ok_or_else(|| malformed("part has no embedded response"))?;

    let content_id = outer_headers
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.trim()
                .eq_ignore_ascii_case("content-id")
                .then(|| value.trim())
        })
        .ok_or_else(|| malformed("part without Content-ID"))?;
    let key = parse_content_id(content_id)?;

    let inner = inner.trim_start_matches('\n');
    let (status_line, rest) = inner.split_once('\n').unwrap_or((inner, ""));
    let status = parse_status_line(status_line)?;

    let payload = match rest.strip_prefix('\n') {
        Some(body) => body,
        None => rest.split_once("\n\n").map(|(_, body)| body).unwrap_or(""),
    }
    .trim();

    if (200..300).contains(&status) {
        let body = if payload.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(payload)
                .map_err(|e| malformed(&format!("invalid JSON in part {}: {}", key, e)))?
        };
        Ok((key, Ok(RawResponse::new(status, body))))
    } else {
        let error = serde_json::from_str::<ErrorEnvelope>(payload)
            .map(|envelope| envelope.error)
            .unwrap_or_else(|_| RawError::new(status, payload));
        Ok((key, Err(error)))
    }
}

fn parse_content_id(content_id: &str) -> Result<CorrelationKey, DispatchError> {
    content_id
        .trim_matches(|c| c == '<' || c == '>')
        .rsplit_once("item-")
        .and_then(|(_, digits)| digits.parse::<u64>().ok())
        .map(CorrelationKey::new)
        .ok_or_else(|| malformed(&format!("unrecognised Content-ID {}", content_id)))
}

fn parse_status_line(line: &str) -> Result<u16, DispatchError> {
    let mut tokens = line.split_whitespace();
    match (tokens.next(), tokens.next()) {
        (Some(version), Some(code)) if version.starts_with("HTTP/") => code
            .parse()
            .map_err(|_| malformed(&format!("invalid status line {:?}", line))),
        _ => Err(malformed(&format!("invalid status line {:?}", line))),
    }
}

fn malformed(detail: &str) -> DispatchError {
    DispatchError::Decode(detail.to_string())
}
