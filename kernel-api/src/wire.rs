//! Wire-format DTOs, per spec.md §6. Field shapes follow `caliber-api`'s
//! `types/*.rs` convention (`#[derive(Serialize, Deserialize)]`, explicit
//! tag fields) even though none of `caliber-api`'s transport, auth, or
//! billing machinery is in scope here.

use serde::{Deserialize, Serialize};

/// An inbound message: `{type:"request", command:<string>, ...}`. The
/// command-specific fields are left as a raw JSON object and interpreted
/// by `gateway::translate_inbound` per spec.md §4.6's command table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct InboundMessage {
    #[serde(rename = "type")]
    pub message_type: String,
    pub command: String,
    #[serde(rename = "requestId", skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// `updateType ∈ {response, event, initialState, dialogueRequest}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum UpdateType {
    Response,
    Event,
    InitialState,
    DialogueRequest,
}

/// An outbound message: `{type:"update", updateType, id, inReplyToId?,
/// payload}`, per spec.md §4.6.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct OutboundMessage {
    #[serde(rename = "type")]
    pub message_type: String,
    #[serde(rename = "updateType")]
    pub update_type: UpdateType,
    pub id: String,
    #[serde(rename = "inReplyToId", skip_serializing_if = "Option::is_none")]
    pub in_reply_to_id: Option<String>,
    pub payload: serde_json::Value,
}

/// Response status, per spec.md §6: `{status: "success"|"failure"|"error",
/// result?, message?}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum ResponseStatus {
    Success,
    Failure,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_message_captures_extra_fields() {
        let raw = serde_json::json!({
            "type": "request",
            "command": "assertKif",
            "requestId": "r1",
            "kif": "(parent alice bob)",
        });
        let parsed: InboundMessage = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.command, "assertKif");
        assert_eq!(parsed.fields.get("kif").unwrap(), "(parent alice bob)");
    }

    #[test]
    fn outbound_message_round_trips() {
        let msg = OutboundMessage {
            message_type: "update".to_string(),
            update_type: UpdateType::Response,
            id: "abc".to_string(),
            in_reply_to_id: Some("r1".to_string()),
            payload: serde_json::json!({"status": "success"}),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"updateType\":\"response\""));
        let back: OutboundMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }
}
