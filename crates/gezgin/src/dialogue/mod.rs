//! Slot-filling dialogue: stages, caller-echoed context, turn payloads.
//!
//! The server keeps no session state. The full context travels out with
//! every reply and comes back with the next request, so every stage
//! re-validates the fields it depends on before acting.

pub mod engine;

pub use engine::DialogueEngine;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::gazetteer::SubPlace;

// ============================================================================
// Reply copy
// ============================================================================

pub(crate) const GREETING: &str = "Hello!\nI'll assist you step-by-step to create the perfect travel plan in Izmir!\n\nLet's start with which places would you like to visit? (You can type Çeşme, Konak.. etc)";
pub(crate) const PROMPT_LOCATIONS: &str =
    "Which locations in Izmir would you like to visit? (e.g. Çeşme, Konak...)";
pub(crate) const PROMPT_CATEGORY: &str =
    "What type of tour are you interested in? (e.g. historical sites, city life, beaches)";
pub(crate) const REPROMPT_CATEGORY: &str =
    "Please specify what type of tour you're interested in (e.g. historical sites, city life, beaches)";
pub(crate) const PROMPT_DATE: &str = "What date do you plan to travel? (e.g. 15 April)";
pub(crate) const REPROMPT_DATE: &str =
    "Please provide your travel date in a format like '15 April'.";
pub(crate) const RESTART_LOCATIONS: &str =
    "Let's start over.\nWhich locations in Izmir would you like to visit? (e.g. Çeşme, Konak...)";
pub(crate) const LOST_LOCATIONS: &str = "I couldn't find the locations. Let's start again.\nWhich places would you like to visit in Izmir? (e.g. Konak, Çeşme...)";
pub(crate) const INTERNAL_ERROR: &str =
    "Something went wrong on our side. Let's start over. Please try again.";

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    AwaitingLocations,
    AwaitingCategory,
    AwaitingDate,
    Completed,
}

/// What kind of input the next turn should carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Awaiting {
    Locations,
    Category,
    Date,
}

/// Caller-echoed dialogue state. Unknown JSON keys are tolerated and dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travel_date: Option<String>,
}

impl ConversationContext {
    /// The context a brand-new dialogue starts from.
    pub fn fresh() -> Self {
        Self {
            stage: Some(Stage::AwaitingLocations),
            locations: Vec::new(),
            category: String::new(),
            travel_date: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TurnRequest {
    pub prompt: String,
    #[serde(default)]
    pub context: Option<ConversationContext>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TurnReply {
    pub response: String,
    /// `None` serializes as `null`: the dialogue is complete.
    pub awaiting: Option<Awaiting>,
    pub context: ConversationContext,
    /// Present (possibly `null`) only on completed replies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_geojson: Option<Value>,
    /// Suggested sub-places with coordinates, only on completed replies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<SubPlace>>,
}

impl TurnReply {
    /// A guiding reply that keeps the dialogue going.
    pub(crate) fn prompting(
        response: &str,
        awaiting: Awaiting,
        context: ConversationContext,
    ) -> Self {
        Self {
            response: response.to_string(),
            awaiting: Some(awaiting),
            context,
            route_geojson: None,
            locations: None,
        }
    }

    /// The reply for an unexpected internal fault: generic message, cleared
    /// context, normal shape. Never a transport-level error.
    pub fn internal_error() -> Self {
        Self {
            response: INTERNAL_ERROR.to_string(),
            awaiting: None,
            context: ConversationContext::default(),
            route_geojson: None,
            locations: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_tolerates_unknown_keys_and_missing_fields() {
        let ctx: ConversationContext =
            serde_json::from_str(r#"{"stage": "awaiting_category", "locations": ["Konak"], "session": 42}"#)
                .unwrap();
        assert_eq!(ctx.stage, Some(Stage::AwaitingCategory));
        assert_eq!(ctx.locations, vec!["Konak"]);
        assert_eq!(ctx.category, "");
        assert_eq!(ctx.travel_date, None);
    }

    #[test]
    fn test_stage_and_awaiting_wire_names() {
        assert_eq!(
            serde_json::to_value(Stage::AwaitingLocations).unwrap(),
            serde_json::json!("awaiting_locations")
        );
        assert_eq!(
            serde_json::to_value(Awaiting::Locations).unwrap(),
            serde_json::json!("locations")
        );
    }

    #[test]
    fn test_prompting_reply_omits_completed_only_fields() {
        let reply = TurnReply::prompting(PROMPT_DATE, Awaiting::Date, ConversationContext::fresh());
        let value = serde_json::to_value(&reply).unwrap();
        assert_eq!(value["awaiting"], serde_json::json!("date"));
        assert!(value.get("route_geojson").is_none());
        assert!(value.get("locations").is_none());
    }

    #[test]
    fn test_internal_error_reply_clears_context() {
        let reply = TurnReply::internal_error();
        assert_eq!(reply.context, ConversationContext::default());
        assert!(reply.awaiting.is_none());
        let value = serde_json::to_value(&reply).unwrap();
        assert_eq!(value["awaiting"], serde_json::Value::Null);
    }
}
