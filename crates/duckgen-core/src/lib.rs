mod error;

pub use error::{ErrorBody, HttpError, INTERNAL_SERVER_ERROR_MESSAGE};
