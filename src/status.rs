//! HTTP status codes as a typed enum.
//!
//! Only the codes the dispatcher and its replies emit, plus `500` for a
//! status code the transport cannot represent.
//!
//! ```rust
//! use switchboard::{ServletReply, Status};
//!
//! // literal message
//! ServletReply::new(Status::Accepted, "queued");
//!
//! // message code resolved through the localiser at render time
//! ServletReply::coded(Status::BadRequest, "item.name.missing", ["widget"]);
//! ```

/// Status codes produced by the dispatch core.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Status {
    // ── 2xx Success ───────────────────────────────────────────────────────────
    Ok,                  // 200
    Accepted,            // 202
    NoContent,           // 204

    // ── 4xx Client errors ─────────────────────────────────────────────────────
    BadRequest,          // 400
    Unauthorized,        // 401
    Forbidden,           // 403

    // ── 5xx Server errors ─────────────────────────────────────────────────────
    InternalServerError, // 500
    ServiceUnavailable,  // 503
}

impl Status {
    /// Numeric code, e.g. `400`.
    pub fn code(self) -> u16 {
        self.into()
    }
}

impl From<Status> for u16 {
    fn from(s: Status) -> u16 {
        match s {
            Status::Ok                  => 200,
            Status::Accepted            => 202,
            Status::NoContent           => 204,
            Status::BadRequest          => 400,
            Status::Unauthorized        => 401,
            Status::Forbidden           => 403,
            Status::InternalServerError => 500,
            Status::ServiceUnavailable  => 503,
        }
    }
}

impl From<Status> for http::StatusCode {
    fn from(s: Status) -> http::StatusCode {
        // every variant maps to a registered code
        http::StatusCode::from_u16(s.code()).unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR)
    }
}
