use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header::CONTENT_TYPE, HeaderMap},
    Form,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// JSON body extractor whose rejections use the API error envelope.
///
/// An empty body reads as `{}` so that a missing body produces the usual
/// "missing field" message rather than a parse failure. No content-type is
/// required, which lets GET requests carry a body.
///
/// `application/x-www-form-urlencoded` bodies are decoded as flat forms instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_form(req.headers()) {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| ApiError::bad_request(e.body_text()))?;
            return Ok(ApiJson(value));
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;

        parse_body(&bytes).map(ApiJson)
    }
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map_or(false, |ct| {
            ct.trim_start()
                .to_ascii_lowercase()
                .starts_with("application/x-www-form-urlencoded")
        })
}

fn parse_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    let body: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        bytes
    };
    serde_json::from_slice(body).map_err(|e| ApiError::invalid_json(format!("Invalid JSON body: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::ReviewInput;

    #[test]
    fn empty_body_reads_as_empty_object() {
        let input: ReviewInput = parse_body(b"").unwrap();
        assert!(input.movie_id.is_none());
        let input: ReviewInput = parse_body(b"  \n").unwrap();
        assert!(input.rating.is_none());
    }

    #[test]
    fn malformed_body_is_invalid_json() {
        let err = parse_body::<ReviewInput>(b"{not json").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_JSON");
    }

    #[test]
    fn wrong_type_is_invalid_json() {
        let err = parse_body::<ReviewInput>(br#"{"rating": "five"}"#).unwrap_err();
        assert!(matches!(err, ApiError::InvalidJson(_)));
    }

    #[test]
    fn detects_form_content_type() {
        let mut headers = HeaderMap::new();
        assert!(!is_form(&headers));
        headers.insert(CONTENT_TYPE, "application/json".parse().unwrap());
        assert!(!is_form(&headers));
        headers.insert(
            CONTENT_TYPE,
            "Application/X-WWW-Form-Urlencoded; charset=UTF-8".parse().unwrap(),
        );
        assert!(is_form(&headers));
    }

    #[tokio::test]
    async fn form_body_decodes_flat_fields() {
        let req = Request::builder()
            .method("POST")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(axum::body::Body::from("movieId=abc&userName=ann&review=fine&rating=4"))
            .unwrap();
        let ApiJson(input) = ApiJson::<ReviewInput>::from_request(req, &()).await.unwrap();
        assert_eq!(input.movie_id.as_deref(), Some("abc"));
        assert_eq!(input.rating, Some(4));
    }
}
