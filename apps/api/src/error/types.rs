use serde::Serialize;

/// API error payload.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    required_permission: Option<String>,
}

impl ErrorResponse {
    pub(super) fn new(code: &'static str, message: String) -> Self {
        Self {
            code,
            message,
            required_permission: None,
        }
    }

    pub(super) fn with_required_permission(mut self, permission: String) -> Self {
        self.required_permission = Some(permission);
        self
    }
}
