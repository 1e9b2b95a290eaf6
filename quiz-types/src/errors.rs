use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ErrorKind {
    InvalidInput,
    NotStarted,
    EmptyBank,
    Persistence,
    AuthenticationRequired,
    Forbidden,
    NotFound,
    Internal,
}

/// JSON body of every non-2xx response
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ErrorResponse {
    pub kind: ErrorKind,
    pub error: String,
}
