//! Request/response messages exchanged with the host.

use serde::{Deserialize, Serialize};

/// Request sent to a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PageRequest {
    /// Tear down and re-run the initial pass with fresh configuration.
    Refresh,
    /// Report the page's domain and processed block count.
    GetStatus,
}

/// Response to a [`PageRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageResponse {
    /// Refresh acknowledgement.
    Refreshed { success: bool },
    /// Page status.
    Status {
        domain: String,
        #[serde(rename = "processedCount")]
        processed_count: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_request_wire_format() {
        assert_eq!(
            serde_json::to_string(&PageRequest::Refresh).unwrap(),
            r#"{"type":"REFRESH"}"#
        );
        let request: PageRequest = serde_json::from_str(r#"{"type":"GET_STATUS"}"#).unwrap();
        assert_eq!(request, PageRequest::GetStatus);
        assert!(serde_json::from_str::<PageRequest>(r#"{"type":"RELOAD"}"#).is_err());
    }

    #[test]
    fn test_response_wire_format() {
        let status = PageResponse::Status {
            domain: "docs.example.com".to_owned(),
            processed_count: 3,
        };
        assert_eq!(
            serde_json::to_string(&status).unwrap(),
            r#"{"domain":"docs.example.com","processedCount":3}"#
        );
        assert_eq!(
            serde_json::to_string(&PageResponse::Refreshed { success: true }).unwrap(),
            r#"{"success":true}"#
        );

        let parsed: PageResponse =
            serde_json::from_str(r#"{"domain":"a.com","processedCount":0}"#).unwrap();
        assert_eq!(
            parsed,
            PageResponse::Status {
                domain: "a.com".to_owned(),
                processed_count: 0,
            }
        );
    }
}
