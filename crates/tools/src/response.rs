//! Turning [`ApiResponse`] envelopes into handler results.
//!
//! Handlers match the statuses they give a specific meaning (404, 409)
//! first and fall through to these for everything else.

use platform::ApiResponse;

use crate::error::{Result, ToolError};

/// The decoded body of a 2xx response.
pub(crate) fn into_body<T>(action: &'static str, response: ApiResponse<T>) -> Result<T> {
    if !response.is_success() {
        return Err(status_error(action, response));
    }
    response
        .into_body()
        .ok_or(ToolError::EmptyResponse { action })
}

/// Succeed on any 2xx, with or without a body.
pub(crate) fn ensure_success<T>(action: &'static str, response: ApiResponse<T>) -> Result<()> {
    if response.is_success() {
        Ok(())
    } else {
        Err(status_error(action, response))
    }
}

fn status_error<T>(action: &'static str, response: ApiResponse<T>) -> ToolError {
    ToolError::RemoteStatus {
        action,
        status: response.status,
        message: response.message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_of_success() {
        assert_eq!(into_body("get thing", ApiResponse::ok(200, 7)).unwrap(), 7);
    }

    #[test]
    fn success_without_body_is_empty_response() {
        let err = into_body("get thing", ApiResponse::<u8>::empty(200)).unwrap_err();
        assert_eq!(err.to_string(), "failed to get thing: API returned an empty response");
        assert!(ensure_success("delete thing", ApiResponse::<u8>::empty(204)).is_ok());
    }

    #[test]
    fn other_status_carries_code_and_message() {
        let err = into_body("get thing", ApiResponse::<u8>::failed(502, "bad gateway")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to get thing: API returned status 502 (bad gateway)"
        );
        let err = ensure_success("delete thing", ApiResponse::<u8>::failed(500, "")).unwrap_err();
        assert_eq!(err.to_string(), "failed to delete thing: API returned status 500");
    }
}
