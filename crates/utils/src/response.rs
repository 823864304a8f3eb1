use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Envelope returned by every JSON endpoint.
///
/// Successful calls carry `data`; failed calls carry a human readable
/// `error` string and no data.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_shape() {
        let body = serde_json::to_value(ApiResponse::success(42)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "success": true, "data": 42, "error": null })
        );
    }

    #[test]
    fn test_error_shape() {
        let body = serde_json::to_value(ApiResponse::<()>::error("event not found")).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "event not found");
        assert!(body["data"].is_null());
    }
}
