//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Intent dispatcher system prompt
pub const DISPATCHER: &str = include_str!("../../prompts/dispatcher.pmt");

/// Itinerary generation prompt
pub const ITINERARY: &str = include_str!("../../prompts/itinerary.pmt");

/// Free-form travel question prompt
pub const QUESTION: &str = include_str!("../../prompts/question.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "dispatcher" => Some(DISPATCHER),
        "itinerary" => Some(ITINERARY),
        "question" => Some(QUESTION),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_embedded_dispatcher() {
        let prompt = get_embedded("dispatcher").unwrap();
        assert!(prompt.contains("plan_trip"));
        assert!(prompt.contains("CURRENT TRIP"));
        assert!(prompt.contains("0.74"));
    }

    #[test]
    fn test_get_embedded_itinerary() {
        let prompt = get_embedded("itinerary").unwrap();
        assert!(prompt.contains("JSON"));
        assert!(prompt.contains("{{destination}}"));
    }

    #[test]
    fn test_get_embedded_unknown() {
        assert!(get_embedded("plan").is_none());
    }
}
