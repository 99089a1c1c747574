use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Success envelope: `{ "success": true, "msg": ..., <key>: <data> }`
#[derive(Debug)]
pub struct ApiResponse<T: Serialize = ()> {
    pub msg: String,
    pub data: Option<(&'static str, T)>,
    pub status_code: StatusCode,
}

impl ApiResponse<()> {
    /// Message-only response with 200 OK
    pub fn message(msg: impl Into<String>) -> Self {
        Self {
            msg: msg.into(),
            data: None,
            status_code: StatusCode::OK,
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    /// Message plus a payload stored under `key`
    pub fn with(msg: impl Into<String>, key: &'static str, data: T) -> Self {
        Self {
            msg: msg.into(),
            data: Some((key, data)),
            status_code: StatusCode::OK,
        }
    }

    /// Switch to 201 Created
    pub fn created(mut self) -> Self {
        self.status_code = StatusCode::CREATED;
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let mut envelope = Map::new();
        envelope.insert("success".into(), Value::Bool(true));
        envelope.insert("msg".into(), Value::String(self.msg));

        if let Some((key, data)) = self.data {
            match serde_json::to_value(&data) {
                Ok(value) => {
                    envelope.insert(key.into(), value);
                }
                Err(e) => {
                    tracing::error!("Failed to serialize response data: {}", e);
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({
                            "success": false,
                            "msg": "Failed to serialize response data"
                        })),
                    )
                        .into_response();
                }
            }
        }

        (self.status_code, Json(Value::Object(envelope))).into_response()
    }
}

pub type ApiResult<T = ()> = Result<ApiResponse<T>, crate::error::ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn created_envelope_carries_payload() {
        let response = ApiResponse::with("Review added successfully.", "review", json!({"rating": 5}))
            .created()
            .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_of(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["review"]["rating"], 5);
    }

    #[tokio::test]
    async fn message_envelope_has_no_payload() {
        let body = body_of(ApiResponse::message("done").into_response()).await;
        assert_eq!(body, json!({"success": true, "msg": "done"}));
    }
}
