//! Response envelope returned by every client operation.

/// A transported API response.
///
/// `body` is only ever `Some` for a 2xx status whose payload decoded. For
/// any other status the raw error text, if the server sent one, is kept in
/// `message`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub body: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// A 2xx response with a decoded payload.
    pub fn ok(status: u16, body: T) -> Self {
        Self {
            status,
            body: Some(body),
            message: None,
        }
    }

    /// A 2xx response without a payload.
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            body: None,
            message: None,
        }
    }

    /// A non-2xx response.
    pub fn failed(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            status,
            body: None,
            message: (!message.is_empty()).then_some(message),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn into_body(self) -> Option<T> {
        self.body
    }
}
