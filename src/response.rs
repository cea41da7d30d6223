//! Success envelopes. Failures are rendered by `ApiError`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// `{"ok": true, "data": ...}` or `{"ok": true, "msg": "..."}`.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<&'static str>,
}

impl<T: Serialize> Envelope<T> {
    pub fn data(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            msg: None,
        }
    }
}

impl Envelope<()> {
    pub fn message(msg: &'static str) -> Self {
        Self {
            ok: true,
            data: None,
            msg: Some(msg),
        }
    }
}

/// Envelope plus the status it is sent with.
pub struct Reply<T: Serialize>(pub StatusCode, pub Envelope<T>);

impl<T: Serialize> Reply<T> {
    pub fn ok(data: T) -> Self {
        Reply(StatusCode::OK, Envelope::data(data))
    }

    pub fn created(data: T) -> Self {
        Reply(StatusCode::CREATED, Envelope::data(data))
    }
}

impl Reply<()> {
    pub fn ok_message(msg: &'static str) -> Self {
        Reply(StatusCode::OK, Envelope::message(msg))
    }

    pub fn created_message(msg: &'static str) -> Self {
        Reply(StatusCode::CREATED, Envelope::message(msg))
    }
}

impl<T: Serialize> IntoResponse for Reply<T> {
    fn into_response(self) -> Response {
        (self.0, Json(self.1)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_envelope_has_no_data_key() {
        let json = serde_json::to_string(&Envelope::message("user created")).unwrap();
        assert_eq!(json, r#"{"ok":true,"msg":"user created"}"#);
    }

    #[test]
    fn test_data_envelope() {
        let json = serde_json::to_string(&Envelope::data(vec![1, 2])).unwrap();
        assert_eq!(json, r#"{"ok":true,"data":[1,2]}"#);
    }
}
