//! Request id generation and propagation, plus masking of sensitive headers
//! in trace output

use http::HeaderName;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    sensitive_headers::{SetSensitiveRequestHeadersLayer, SetSensitiveResponseHeadersLayer},
};

use crate::ids::MakeTypedRequestId;

/// Sensitive headers that should be masked in logs
pub const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "cookie",
    "set-cookie",
    "x-api-key",
    "x-auth-token",
];

/// Generate an `x-request-id` for requests that arrive without one
///
/// Example format: `req_01h455vb4pex5vsknk084sn02q`
pub fn request_id_layer() -> SetRequestIdLayer<MakeTypedRequestId> {
    SetRequestIdLayer::x_request_id(MakeTypedRequestId)
}

/// Copy `x-request-id` from the request onto the response
pub fn request_id_propagation_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}

fn sensitive_header_names() -> Vec<HeaderName> {
    SENSITIVE_HEADERS
        .iter()
        .copied()
        .map(HeaderName::from_static)
        .collect()
}

/// Mark [`SENSITIVE_HEADERS`] on requests so trace output redacts them
///
/// Must wrap the trace layer: the span captures headers when it is made.
pub fn sensitive_headers_layer() -> SetSensitiveRequestHeadersLayer {
    SetSensitiveRequestHeadersLayer::new(sensitive_header_names())
}

/// Mark [`SENSITIVE_HEADERS`] on responses; must sit inside the trace layer
pub fn sensitive_response_headers_layer() -> SetSensitiveResponseHeadersLayer {
    SetSensitiveResponseHeadersLayer::new(sensitive_header_names())
}
