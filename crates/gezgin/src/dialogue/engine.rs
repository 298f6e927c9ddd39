//! The per-turn state machine driving the slot-filling dialogue.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde_json::Value;

use crate::config::PlannerConfig;
use crate::extract::{extract_categories, extract_date, is_reset};
use crate::external::{RoutingService, VectorSearch, WeatherService};
use crate::gazetteer::Gazetteer;
use crate::itinerary::ItineraryAssembler;
use crate::search::LocationResolver;

use super::{
    Awaiting, ConversationContext, Stage, TurnReply, GREETING, LOST_LOCATIONS, PROMPT_CATEGORY,
    PROMPT_DATE, PROMPT_LOCATIONS, REPROMPT_CATEGORY, REPROMPT_DATE, RESTART_LOCATIONS,
};

pub struct DialogueEngine {
    gazetteer: Arc<Gazetteer>,
    resolver: LocationResolver,
    assembler: ItineraryAssembler,
}

impl DialogueEngine {
    pub fn new(
        gazetteer: Arc<Gazetteer>,
        vector: Arc<dyn VectorSearch>,
        weather: Arc<dyn WeatherService>,
        routing: Arc<dyn RoutingService>,
        config: &PlannerConfig,
    ) -> Self {
        let resolver = LocationResolver::new(gazetteer.clone(), vector, config.vector.top_k);
        let assembler = ItineraryAssembler::new(
            gazetteer.clone(),
            weather,
            routing,
            Duration::from_secs(config.external_timeout_secs),
        );
        Self {
            gazetteer,
            resolver,
            assembler,
        }
    }

    /// Process one turn. Transition rules, in priority order:
    ///
    /// 1. No stage yet, or a reset phrase → greeting + fresh context.
    /// 2. `awaiting_locations` → resolver; commit exact matches or re-prompt.
    /// 3. `awaiting_category` → extractor; commit sorted set or re-prompt.
    /// 4. `awaiting_date` → re-validate earlier slots, then extract the
    ///    date; on success complete within the same turn.
    /// 5. `completed` → re-validate, then assemble the itinerary.
    pub async fn process_turn(
        &self,
        prompt: &str,
        context: Option<ConversationContext>,
    ) -> Result<TurnReply> {
        let mut ctx = context.unwrap_or_default();
        tracing::debug!(stage = ?ctx.stage, "incoming turn");

        let stage = match ctx.stage {
            // A reset phrase supersedes whatever stage the caller echoed.
            Some(stage) if !is_reset(prompt) => stage,
            _ => {
                return Ok(TurnReply {
                    response: GREETING.to_string(),
                    awaiting: Some(Awaiting::Locations),
                    context: ConversationContext::fresh(),
                    route_geojson: None,
                    locations: None,
                });
            }
        };

        match stage {
            Stage::AwaitingLocations => {
                let resolution = self.resolver.resolve(prompt).await;
                if resolution.exact.is_empty() {
                    return Ok(TurnReply::prompting(PROMPT_LOCATIONS, Awaiting::Locations, ctx));
                }
                if !resolution.fuzzy.is_empty() {
                    tracing::debug!(fuzzy = ?resolution.fuzzy, "nearby candidates not committed");
                }
                ctx.locations = resolution.exact;
                ctx.stage = Some(Stage::AwaitingCategory);
                Ok(TurnReply::prompting(PROMPT_CATEGORY, Awaiting::Category, ctx))
            }

            Stage::AwaitingCategory => {
                let vocabulary = self.gazetteer.category_vocabulary();
                let found = extract_categories(prompt, &vocabulary);
                if found.is_empty() {
                    return Ok(TurnReply::prompting(REPROMPT_CATEGORY, Awaiting::Category, ctx));
                }
                let unique: BTreeSet<String> = found.into_iter().collect();
                ctx.category = unique.into_iter().collect::<Vec<_>>().join(", ");
                ctx.stage = Some(Stage::AwaitingDate);
                Ok(TurnReply::prompting(PROMPT_DATE, Awaiting::Date, ctx))
            }

            Stage::AwaitingDate => {
                // The caller may have echoed back a truncated context;
                // regress to whichever slot is gone, keeping the rest.
                if ctx.locations.is_empty() {
                    ctx.stage = Some(Stage::AwaitingLocations);
                    return Ok(TurnReply::prompting(RESTART_LOCATIONS, Awaiting::Locations, ctx));
                }
                if ctx.category.is_empty() {
                    ctx.stage = Some(Stage::AwaitingCategory);
                    return Ok(TurnReply::prompting(REPROMPT_CATEGORY, Awaiting::Category, ctx));
                }
                let Some(date) = extract_date(prompt) else {
                    return Ok(TurnReply::prompting(REPROMPT_DATE, Awaiting::Date, ctx));
                };
                ctx.travel_date = Some(date);
                ctx.stage = Some(Stage::Completed);
                // No extra round trip: assemble within this same turn.
                self.complete(ctx).await
            }

            Stage::Completed => self.complete(ctx).await,
        }
    }

    async fn complete(&self, mut ctx: ConversationContext) -> Result<TurnReply> {
        if ctx.locations.is_empty() {
            return Ok(TurnReply::prompting(
                LOST_LOCATIONS,
                Awaiting::Locations,
                ConversationContext::fresh(),
            ));
        }
        if ctx.category.is_empty() {
            ctx.stage = Some(Stage::AwaitingCategory);
            return Ok(TurnReply::prompting(REPROMPT_CATEGORY, Awaiting::Category, ctx));
        }
        let Some(travel_date) = ctx.travel_date.clone() else {
            ctx.stage = Some(Stage::AwaitingDate);
            return Ok(TurnReply::prompting(REPROMPT_DATE, Awaiting::Date, ctx));
        };

        let result = self
            .assembler
            .assemble(&ctx.locations, &ctx.category, &travel_date)
            .await;

        Ok(TurnReply {
            response: result.summary,
            awaiting: None,
            context: ctx,
            route_geojson: Some(result.route_geojson.unwrap_or(Value::Null)),
            locations: Some(result.locations),
        })
    }
}
