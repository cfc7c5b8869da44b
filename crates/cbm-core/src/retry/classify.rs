//! Classify HTTP status and curl errors into retry policy error kinds.

use super::error::TransferError;
use super::policy::ErrorKind;

/// Classify an HTTP status code for retry decisions.
pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        429 | 503 => ErrorKind::Throttled,
        408 => ErrorKind::Timeout,
        500..=599 => ErrorKind::Http5xx(code as u16),
        _ => ErrorKind::Other,
    }
}

/// Classify a curl error for retry decisions.
pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
        || e.is_partial_file()
    {
        return ErrorKind::Connection;
    }
    ErrorKind::Other
}

/// Classify a transfer error into an ErrorKind.
pub fn classify(e: &TransferError) -> ErrorKind {
    match e {
        TransferError::Curl(ce) => classify_curl_error(ce),
        TransferError::Http(code) => classify_http_status(*code),
        TransferError::PartialTransfer { .. } => ErrorKind::Connection,
        TransferError::Storage(_) => ErrorKind::Other,
    }
}
