use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

/// Structured error body returned by every failing request.
///
/// `code` is a stable machine-readable reason string (`game_not_found`,
/// `duel_conflict`, ...); `message` is the human-readable narration.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct Status {
    pub code: String,
    pub message: String,
}

pub fn new_status(code: &str, message: impl Into<String>) -> Json<Status> {
    Json(Status {
        code: code.to_string(),
        message: message.into(),
    })
}

/// HTTP-mappable error response: status line plus the JSON body.
pub type ApiError = (rocket::http::Status, Json<Status>);

/// Error family for domain-layer failures.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum FaultKind {
    NotFound,
    BadRequest,
    Conflict,
}

/// A domain failure carrying the reason code and narration.
///
/// Not-found and validation faults are terminal for the request; conflicts
/// surface as 409 after internal recovery paths have been exhausted.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Fault {
    pub kind: FaultKind,
    pub code: &'static str,
    pub message: String,
}

impl Fault {
    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Fault {
            kind: FaultKind::NotFound,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Fault {
            kind: FaultKind::BadRequest,
            code,
            message: message.into(),
        }
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Fault {
            kind: FaultKind::Conflict,
            code,
            message: message.into(),
        }
    }

    pub fn response(self) -> ApiError {
        let status = match self.kind {
            FaultKind::NotFound => rocket::http::Status::NotFound,
            FaultKind::BadRequest => rocket::http::Status::BadRequest,
            FaultKind::Conflict => rocket::http::Status::Conflict,
        };
        (status, new_status(self.code, self.message))
    }
}
