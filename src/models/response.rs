//! 响应包装

use serde::Serialize;
use std::collections::BTreeMap;
use validator::ValidationErrors;

/// 标准API响应格式
///
/// List endpoints also carry `count`, the number of items in `data`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
            count: None,
            message: None,
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::success(data)
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    /// 列表响应
    pub fn list(items: Vec<T>) -> Self {
        Self {
            count: Some(items.len()),
            ..Self::success(items)
        }
    }
}

impl ApiResponse<()> {
    /// 无数据的成功响应
    pub fn ok(message: impl Into<String>) -> Self {
        Self::with_message((), message)
    }
}

/// 错误响应格式
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    /// Stable machine-readable code such as `NOT_FOUND` or `SELF_FOLLOW`.
    pub code: &'static str,
    pub message: String,
    /// 字段 -> 错误信息
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, Vec<String>>>,
}

impl ErrorResponse {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: ErrorDetail {
                code,
                message: message.into(),
                fields: None,
            },
        }
    }

    /// Struct-level checks are reported under `__all__`. An error without a
    /// message falls back to its validator code, e.g. `url` or `length`.
    pub fn invalid_fields(errors: &ValidationErrors) -> Self {
        let fields = errors
            .field_errors()
            .into_iter()
            .map(|(field, errors)| {
                let messages = errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("Invalid value ({})", e.code))
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect();

        Self {
            success: false,
            error: ErrorDetail {
                code: "VALIDATION_ERROR",
                message: "Validation failed".to_string(),
                fields: Some(fields),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use validator::ValidationError;

    #[test]
    fn test_list_reports_count() {
        let body = serde_json::to_value(ApiResponse::list(vec!["a", "b"])).unwrap();
        assert_eq!(body, json!({ "success": true, "data": ["a", "b"], "count": 2 }));

        let body = serde_json::to_value(ApiResponse::ok("done")).unwrap();
        assert_eq!(body, json!({ "success": true, "data": null, "message": "done" }));
    }

    #[test]
    fn test_invalid_fields_falls_back_to_code() {
        let mut errors = ValidationErrors::new();
        errors.add("website", ValidationError::new("url"));
        let body = serde_json::to_value(ErrorResponse::invalid_fields(&errors)).unwrap();

        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["fields"]["website"][0], "Invalid value (url)");
    }
}
