//! Cassette data structures for recording and replaying interactions.

use serde::{Deserialize, Serialize};

/// The request half of a recorded interaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecordedRequest {
    /// HTTP method (e.g. "PROPFIND", "GET").
    pub method: String,
    /// Service-relative URL, with any shared origin stripped.
    pub url: String,
    /// Caller-provided description of what the request does.
    pub description: String,
    /// Raw request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Diagnostic decoding of `body`. Never used for replay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decoded_body: Option<serde_json::Value>,
}

/// The response half of a recorded interaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecordedResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Value of the `Content-Type` header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Value of the `Content-Location` header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_location: Option<String>,
    /// Diagnostic decoding of `body`. Never used for replay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decoded_body: Option<serde_json::Value>,
}

/// A single recorded request/response pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InteractionEntry {
    /// What was sent.
    pub request: RecordedRequest,
    /// What came back.
    pub response: RecordedResponse,
}

impl InteractionEntry {
    /// Copy of this entry with every derived `decodedBody` removed.
    #[must_use]
    pub fn without_decoded(&self) -> Self {
        let mut entry = self.clone();
        entry.request.decoded_body = None;
        entry.response.decoded_body = None;
        entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_camel_case_and_omits_absent_fields() {
        let entry = InteractionEntry {
            request: RecordedRequest {
                method: "GET".into(),
                url: "/ocs/v2.php/cloud/user".into(),
                description: "get user".into(),
                body: None,
                decoded_body: None,
            },
            response: RecordedResponse {
                status: 200,
                body: Some("{}".into()),
                content_type: Some("application/json".into()),
                content_location: None,
                decoded_body: Some(json!({})),
            },
        };

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            value,
            json!({
                "request": {
                    "method": "GET",
                    "url": "/ocs/v2.php/cloud/user",
                    "description": "get user"
                },
                "response": {
                    "status": 200,
                    "body": "{}",
                    "contentType": "application/json",
                    "decodedBody": {}
                }
            })
        );
    }

    #[test]
    fn without_decoded_strips_only_derived_fields() {
        let entry: InteractionEntry = serde_json::from_value(json!({
            "request": {
                "method": "PROPFIND",
                "url": "/remote.php/dav/files/u/",
                "description": "list",
                "body": "<d:propfind/>",
                "decodedBody": {"propfind": ""}
            },
            "response": {"status": 207, "decodedBody": {"x": 1}}
        }))
        .unwrap();

        let stripped = entry.without_decoded();
        assert!(stripped.request.decoded_body.is_none());
        assert!(stripped.response.decoded_body.is_none());
        assert_eq!(stripped.request.body.as_deref(), Some("<d:propfind/>"));
        assert_eq!(stripped.response.status, 207);
    }
}
