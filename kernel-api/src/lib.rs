mod gateway;
mod wire;

pub use gateway::{
    build_api_request, convert_api_response_to_message, convert_dialogue_request_to_message,
    convert_event_to_message, json_to_term, term_to_json, translate_inbound,
};
pub use wire::{InboundMessage, OutboundMessage, ResponseStatus, UpdateType};
