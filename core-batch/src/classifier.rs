//! Maps a raw per-item reply to a success value or a [`BatchError`].
//!
//! The classifier has no idea what the caller asked for, so it only knows
//! the generic `NotFound`; operations that know their context remap it into
//! a specific kind (directory, file, drive).

use crate::error::BatchError;
use crate::request::{RawResponse, RawResult};

const REASON_USER_RATE_LIMIT: &str = "userRateLimitExceeded";
const REASON_NOT_FOUND: &str = "notFound";

/// Classify one raw reply.
pub fn classify(raw: RawResult) -> Result<RawResponse, BatchError> {
    let error = match raw {
        Ok(response) => return Ok(response),
        Err(error) => error,
    };

    if error.has_reason(REASON_USER_RATE_LIMIT) {
        return Err(BatchError::RateLimited(error));
    }

    if error.has_reason(REASON_NOT_FOUND) {
        return Err(BatchError::NotFound);
    }

    Err(BatchError::Api(error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RawError;
    use serde_json::json;

    #[test]
    fn test_success_passes_through() {
        let response = RawResponse::ok(json!({ "name": "Photos" }));
        assert_eq!(classify(Ok(response.clone())), Ok(response));
    }

    #[test]
    fn test_user_rate_limit() {
        let raw = RawError::new(403, "User rate limit exceeded").with_reason("userRateLimitExceeded");
        assert!(matches!(classify(Err(raw)), Err(BatchError::RateLimited(_))));
    }

    #[test]
    fn test_not_found() {
        let raw = RawError::new(404, "File not found: abc").with_reason("notFound");
        assert_eq!(classify(Err(raw)), Err(BatchError::NotFound));
    }

    #[test]
    fn test_rate_limit_wins_over_not_found() {
        let raw = RawError::new(403, "Mixed")
            .with_reason("notFound")
            .with_reason("userRateLimitExceeded");
        assert!(matches!(classify(Err(raw)), Err(BatchError::RateLimited(_))));
    }

    #[test]
    fn test_anything_else_is_generic() {
        let raw = RawError::new(400, "Invalid Value").with_reason("invalid");
        assert_eq!(classify(Err(raw.clone())), Err(BatchError::Api(raw)));

        let bare = RawError::new(500, "Backend Error");
        assert_eq!(classify(Err(bare.clone())), Err(BatchError::Api(bare)));
    }
}
