//! Request, response and error types of the HTTP surface

pub mod ask;
pub mod error;
pub mod json;

pub use ask::{AskRequest, BatchAskRequest, BatchAskResponse, UpdateTopicsRequest};
pub use error::{ApiError, ApiErrorResponse};
pub use json::Json;
