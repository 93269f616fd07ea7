//! Pure translation between wire JSON and kernel terms, per spec.md §4.6.
//! No transport: this module only builds/reads `serde_json::Value`s and
//! `kernel_core::Term`s, matching spec.md §1's "no particular wire
//! protocol or transport" non-goal.

use crate::wire::{InboundMessage, OutboundMessage, UpdateType};
use chrono::Utc;
use kernel_core::{Assertion, AssertionId, AssertionType, KbId, KernelError, KernelResult, Term, ValidationError};
use kernel_term::parse_term;
use uuid::Uuid;

/// Parses a raw inbound wire message and builds the `(ApiRequest
/// <requestId> <commandTerm>)` assertion spec.md §4.6 describes, ready to
/// be saved into the `api-inbox` KB by the caller.
pub fn build_api_request(raw: &str) -> KernelResult<Assertion> {
    let message: InboundMessage = serde_json::from_str(raw)
        .map_err(|e| KernelError::from(ValidationError::InvalidValue { field: "body".to_string(), reason: e.to_string() }))?;
    let request_id = message.request_id.clone().unwrap_or_else(|| Uuid::now_v7().to_string());
    let command_term = translate_inbound(&message)?;
    let kif = Term::op("ApiRequest", [Term::atom(&request_id), command_term]);

    Ok(Assertion {
        id: AssertionId::now_v7(),
        kif,
        priority: 0.9,
        timestamp: Utc::now(),
        source_note_id: None,
        justifications: Vec::new(),
        assertion_type: AssertionType::Ground,
        is_equality: false,
        is_oriented: false,
        is_negated: false,
        quantified_vars: Vec::new(),
        derivation_depth: 0,
        active: true,
        kb_id: KbId::api_inbox(),
    })
}

/// Builds the command term for a recognized command, per spec.md §4.6's
/// table. Unrecognized commands wrap the raw message.
pub fn translate_inbound(message: &InboundMessage) -> KernelResult<Term> {
    let field = |name: &str| message.fields.get(name);
    let field_str = |name: &str| -> Option<String> { field(name).and_then(|v| v.as_str()).map(str::to_string) };

    let term = match message.command.as_str() {
        "assertKif" => {
            let kif_text = field_str("kif")
                .ok_or_else(|| ValidationError::RequiredFieldMissing { field: "kif".to_string() })?;
            let terms = kernel_term::parse_all(&kif_text)
                .map_err(|e| ValidationError::InvalidValue { field: "kif".to_string(), reason: e.to_string() })?;
            Term::op("AssertKif", [Term::lst(terms)])
        }
        "runTool" => {
            let name = field_str("toolName")
                .ok_or_else(|| ValidationError::RequiredFieldMissing { field: "toolName".to_string() })?;
            let params = field("parameters").map(json_to_term).unwrap_or_else(|| Term::lst(Vec::new()));
            Term::op("RunTool", [Term::atom(name), params])
        }
        "runQuery" => {
            let query_type = field_str("queryType")
                .ok_or_else(|| ValidationError::RequiredFieldMissing { field: "queryType".to_string() })?;
            let pattern_text = field_str("pattern")
                .ok_or_else(|| ValidationError::RequiredFieldMissing { field: "pattern".to_string() })?;
            let pattern = parse_term(&pattern_text)
                .map_err(|e| ValidationError::InvalidValue { field: "pattern".to_string(), reason: e.to_string() })?;
            Term::op("RunQuery", [Term::atom(query_type), pattern])
        }
        "retract" => {
            let target = field_str("target")
                .ok_or_else(|| ValidationError::RequiredFieldMissing { field: "target".to_string() })?;
            let term = parse_term(&target).unwrap_or_else(|_| Term::atom(target));
            Term::op("Retract", [term])
        }
        "addNote" => {
            let note_type = field_str("noteType").unwrap_or_else(|| "note".to_string());
            let title = field_str("title").unwrap_or_default();
            let content = field_str("content").unwrap_or_default();
            Term::op("AddNote", [Term::atom(note_type), Term::str(title), Term::str(content)])
        }
        "updateNote" => {
            let note_id = field_str("noteId")
                .ok_or_else(|| ValidationError::RequiredFieldMissing { field: "noteId".to_string() })?;
            let updates = field("updates").map(json_to_term).unwrap_or_else(|| Term::lst(Vec::new()));
            Term::op("UpdateNote", [Term::atom(note_id), updates])
        }
        "deleteNote" => {
            let note_id = field_str("noteId")
                .ok_or_else(|| ValidationError::RequiredFieldMissing { field: "noteId".to_string() })?;
            Term::op("DeleteNote", [Term::atom(note_id)])
        }
        "cloneNote" => {
            let note_id = field_str("noteId")
                .ok_or_else(|| ValidationError::RequiredFieldMissing { field: "noteId".to_string() })?;
            Term::op("CloneNote", [Term::atom(note_id)])
        }
        "clearAll" => Term::op("ClearAll", []),
        "updateSettings" => {
            let settings = field("settings").map(json_to_term).unwrap_or_else(|| Term::lst(Vec::new()));
            Term::op("UpdateSettings", [settings])
        }
        "cancelDialogue" => {
            let dialogue_id = field_str("dialogueId")
                .ok_or_else(|| ValidationError::RequiredFieldMissing { field: "dialogueId".to_string() })?;
            Term::op("CancelDialogue", [Term::atom(dialogue_id)])
        }
        "dialogueResponse" => {
            let dialogue_id = field_str("dialogueId")
                .ok_or_else(|| ValidationError::RequiredFieldMissing { field: "dialogueId".to_string() })?;
            let response_data = field("responseData").map(json_to_term).unwrap_or_else(|| Term::lst(Vec::new()));
            Term::op("DialogueResponse", [Term::atom(dialogue_id), response_data])
        }
        "getInitialState" => Term::op("GetInitialState", []),
        "wait" => {
            let duration_ms = field("durationMs").and_then(|v| v.as_f64()).unwrap_or(0.0);
            Term::op("Wait", [Term::num(duration_ms)])
        }
        other => Term::op("UnknownCommand", [Term::atom(other), Term::str(serde_json::to_string(message).unwrap_or_default())]),
    };
    Ok(term)
}

/// `(ApiResponse <requestId> <contentTerm>)` -> `{type:"update",
/// updateType:"response", requestId, content}`.
pub fn convert_api_response_to_message(assertion: &Assertion) -> KernelResult<OutboundMessage> {
    convert_tagged(assertion, "ApiResponse", UpdateType::Response)
}

/// `(Event <contentTerm>)` -> `updateType:"event"`.
pub fn convert_event_to_message(assertion: &Assertion) -> KernelResult<OutboundMessage> {
    convert_untagged(assertion, "Event", UpdateType::Event)
}

/// `(DialogueRequest <dialogueId> <prompt> <kind> <options>)` -> wrapped
/// as a `dialogueRequest` update whose payload carries all four fields.
pub fn convert_dialogue_request_to_message(assertion: &Assertion) -> KernelResult<OutboundMessage> {
    let args = assertion.kif.args();
    if assertion.kif.operator() != Some("DialogueRequest") || args.len() != 4 {
        return Err(malformed(assertion, "DialogueRequest"));
    }
    let payload = serde_json::json!({
        "dialogueId": term_to_json(&args[0]),
        "prompt": term_to_json(&args[1]),
        "kind": term_to_json(&args[2]),
        "options": term_to_json(&args[3]),
    });
    Ok(OutboundMessage {
        message_type: "update".to_string(),
        update_type: UpdateType::DialogueRequest,
        id: Uuid::now_v7().to_string(),
        in_reply_to_id: None,
        payload,
    })
}

fn convert_tagged(assertion: &Assertion, expected_op: &str, update_type: UpdateType) -> KernelResult<OutboundMessage> {
    let args = assertion.kif.args();
    if assertion.kif.operator() != Some(expected_op) || args.len() != 2 {
        return Err(malformed(assertion, expected_op));
    }
    let request_id = term_to_json(&args[0]);
    let payload = serde_json::json!({ "requestId": request_id, "content": term_to_json(&args[1]) });
    Ok(OutboundMessage {
        message_type: "update".to_string(),
        update_type,
        id: Uuid::now_v7().to_string(),
        in_reply_to_id: request_id.as_str().map(str::to_string),
        payload,
    })
}

fn convert_untagged(assertion: &Assertion, expected_op: &str, update_type: UpdateType) -> KernelResult<OutboundMessage> {
    let args = assertion.kif.args();
    if assertion.kif.operator() != Some(expected_op) || args.len() != 1 {
        return Err(malformed(assertion, expected_op));
    }
    Ok(OutboundMessage {
        message_type: "update".to_string(),
        update_type,
        id: Uuid::now_v7().to_string(),
        in_reply_to_id: None,
        payload: term_to_json(&args[0]),
    })
}

fn malformed(assertion: &Assertion, expected_op: &str) -> KernelError {
    KernelError::from(ValidationError::InvalidValue {
        field: format!("assertion {}", assertion.id),
        reason: format!("expected a `{expected_op}` term"),
    })
}

/// Term -> JSON, per spec.md §4.6: Atom becomes a string (or number/
/// boolean when it parses as such), Str a JSON string, Num a JSON number,
/// Var `"?<name>"`, operator-led Lst `{op, args}`, other Lst a JSON array.
pub fn term_to_json(term: &Term) -> serde_json::Value {
    match term {
        Term::Atom(name) => {
            if let Ok(n) = name.parse::<f64>() {
                serde_json::json!(n)
            } else if name == "true" || name == "false" {
                serde_json::json!(name == "true")
            } else {
                serde_json::Value::String(name.clone())
            }
        }
        Term::Str(s) => serde_json::Value::String(s.clone()),
        Term::Num(n) => serde_json::json!(n),
        Term::Var(name) => serde_json::Value::String(format!("?{name}")),
        Term::Lst(items) => match items.first().and_then(Term::as_atom) {
            Some(op) => serde_json::json!({
                "op": op,
                "args": items[1..].iter().map(term_to_json).collect::<Vec<_>>(),
            }),
            None => serde_json::Value::Array(items.iter().map(term_to_json).collect()),
        },
    }
}

/// JSON -> Term, the inverse convention used when decoding inbound
/// `parameters`/`settings`/`responseData` payloads. Not specified
/// explicitly in spec.md §4.6 (which only describes the outbound
/// direction); resolved here as: strings/numbers/bools/null map to their
/// natural term, arrays map to `Lst`, a single-key object `{"k": v}` maps
/// to `(k v)` (matching the `(choice "yes")` shape in scenario S6), and a
/// multi-key object falls back to an alternating key/value `Lst`.
pub fn json_to_term(value: &serde_json::Value) -> Term {
    match value {
        serde_json::Value::Null => Term::atom("null"),
        serde_json::Value::Bool(b) => Term::atom(b.to_string()),
        serde_json::Value::Number(n) => Term::num(n.as_f64().unwrap_or(0.0)),
        serde_json::Value::String(s) => Term::str(s.clone()),
        serde_json::Value::Array(items) => Term::lst(items.iter().map(json_to_term).collect::<Vec<_>>()),
        serde_json::Value::Object(map) => {
            if let (Some(op), Some(args)) = (map.get("op").and_then(|v| v.as_str()), map.get("args").and_then(|v| v.as_array())) {
                return Term::op(op, args.iter().map(json_to_term));
            }
            if map.len() == 1 {
                let (key, val) = map.iter().next().unwrap();
                return Term::op(key.clone(), [json_to_term(val)]);
            }
            let mut items = Vec::new();
            for (key, val) in map {
                items.push(Term::atom(key.clone()));
                items.push(json_to_term(val));
            }
            Term::lst(items)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assert_kif_round_trips_through_parser() {
        let raw = serde_json::json!({
            "type": "request",
            "command": "assertKif",
            "requestId": "r1",
            "kif": "(parent alice bob)",
        })
        .to_string();
        let assertion = build_api_request(&raw).unwrap();
        assert_eq!(assertion.kif.operator(), Some("ApiRequest"));
        assert_eq!(assertion.kb_id, KbId::api_inbox());
    }

    #[test]
    fn run_query_builds_pattern_term() {
        let message = InboundMessage {
            message_type: "request".to_string(),
            command: "runQuery".to_string(),
            request_id: Some("r2".to_string()),
            fields: serde_json::json!({"queryType": "query", "pattern": "(parent ?x bob)"}).as_object().unwrap().clone(),
        };
        let term = translate_inbound(&message).unwrap();
        assert_eq!(term.operator(), Some("RunQuery"));
    }

    #[test]
    fn unknown_command_wraps_raw_message() {
        let message = InboundMessage {
            message_type: "request".to_string(),
            command: "doSomethingWeird".to_string(),
            request_id: None,
            fields: Default::default(),
        };
        let term = translate_inbound(&message).unwrap();
        assert_eq!(term.operator(), Some("UnknownCommand"));
    }

    #[test]
    fn converts_api_response_to_outbound_message() {
        let assertion = Assertion {
            id: AssertionId::now_v7(),
            kif: Term::op(
                "ApiResponse",
                [
                    Term::atom("r1"),
                    Term::op("QueryResult", [Term::atom("query"), Term::atom("SUCCESS"), Term::lst(Vec::new())]),
                ],
            ),
            priority: 0.9,
            timestamp: Utc::now(),
            source_note_id: None,
            justifications: Vec::new(),
            assertion_type: AssertionType::Ground,
            is_equality: false,
            is_oriented: false,
            is_negated: false,
            quantified_vars: Vec::new(),
            derivation_depth: 0,
            active: true,
            kb_id: KbId::api_outbox(),
        };
        let message = convert_api_response_to_message(&assertion).unwrap();
        assert_eq!(message.update_type, UpdateType::Response);
        assert_eq!(message.in_reply_to_id, Some("r1".to_string()));
    }

    #[test]
    fn dialogue_response_decodes_single_key_object() {
        let term = json_to_term(&serde_json::json!({"choice": "yes"}));
        assert_eq!(term, Term::op("choice", [Term::str("yes")]));
    }

    #[test]
    fn term_to_json_maps_operator_list_to_op_args() {
        let term = Term::op("parent", [Term::atom("alice"), Term::atom("bob")]);
        let json = term_to_json(&term);
        assert_eq!(json["op"], "parent");
        assert_eq!(json["args"][0], "alice");
    }
}
