// src/intent/mod.rs
// C5: Intent Router (spec §4.5). Deterministic pattern matching layered on
// top of a remote NLU classifier, in strict precedence order.

pub mod agent_mapping;
pub mod cart_patterns;
pub mod compound_patterns;
pub mod direct_action;
pub mod gamification;
pub mod nlu;
pub mod types;

use nlu::{NluClassifier, NluContext};
use types::{Intent, RoutingResult};

pub struct IntentRouter<'a> {
    pub nlu: &'a dyn NluClassifier,
}

const COMPOUND_FALLBACK_CONFIDENCE_THRESHOLD: f32 = 0.6;

impl<'a> IntentRouter<'a> {
    pub async fn route(&self, message: &str, context: &NluContext) -> RoutingResult {
        if gamification::matches(message) {
            return deterministic(Intent::PlayGame, Default::default());
        }

        if let Some(action) = direct_action::parse(message) {
            let mut entities = std::collections::HashMap::new();
            entities.insert("item_id".to_string(), serde_json::Value::String(action.item_id));
            return deterministic(Intent::AddToCart, entities);
        }

        if let Some(intent) = cart_patterns::classify(message) {
            return RoutingResult {
                agent_id: agent_mapping::agent_id_for(&intent),
                agent_type: agent_mapping::agent_type_for(&intent).to_string(),
                intent,
                confidence: 0.95,
                ..Default::default()
            };
        }

        let nlu_result = match self.nlu.classify(message, context).await {
            Ok(r) => Some(r),
            Err(e) => {
                tracing::warn!(error = %e, "NLU classification failed, degrading to compound-pattern fallback");
                None
            }
        };

        let needs_fallback = match &nlu_result {
            None => true,
            Some(r) => {
                r.intent == Intent::Unknown
                    || r.confidence < COMPOUND_FALLBACK_CONFIDENCE_THRESHOLD
                    || compound_patterns::has_multi_intent_separator(message)
            }
        };

        if needs_fallback {
            if let Some(intent) = compound_patterns::classify(message) {
                return RoutingResult {
                    agent_id: agent_mapping::agent_id_for(&intent),
                    agent_type: agent_mapping::agent_type_for(&intent).to_string(),
                    intent,
                    confidence: 0.8,
                    ..Default::default()
                };
            }
        }

        match nlu_result {
            Some(r) => RoutingResult {
                agent_id: agent_mapping::agent_id_for(&r.intent),
                agent_type: agent_mapping::agent_type_for(&r.intent).to_string(),
                intent: r.intent,
                entities: r.entities,
                confidence: r.confidence,
                raw: r.raw,
                needs_clarification: r.needs_clarification,
                clarification_options: r.clarification_options,
                ..Default::default()
            },
            None => RoutingResult {
                agent_id: agent_mapping::agent_id_for(&Intent::Unknown),
                agent_type: agent_mapping::agent_type_for(&Intent::Unknown).to_string(),
                intent: Intent::Unknown,
                confidence: 0.0,
                ..Default::default()
            },
        }
    }
}

fn deterministic(intent: Intent, entities: std::collections::HashMap<String, serde_json::Value>) -> RoutingResult {
    RoutingResult {
        agent_id: agent_mapping::agent_id_for(&intent),
        agent_type: agent_mapping::agent_type_for(&intent).to_string(),
        intent,
        entities,
        confidence: 1.0,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FakeNlu(nlu::NluClassification);
    #[async_trait]
    impl NluClassifier for FakeNlu {
        async fn classify(&self, _m: &str, _c: &NluContext) -> anyhow::Result<nlu::NluClassification> {
            Ok(self.0.clone())
        }
    }

    fn ctx() -> NluContext {
        NluContext { active_module: None, active_flow_id: None, last_bot_message: None }
    }

    #[tokio::test]
    async fn gamification_beats_everything_else() {
        let nlu = FakeNlu(nlu::NluClassification {
            intent: Intent::OrderFood,
            confidence: 0.99,
            entities: Default::default(),
            raw: None,
            needs_clarification: false,
            clarification_options: vec![],
        });
        let router = IntentRouter { nlu: &nlu };
        let r = router.route("let's play game", &ctx()).await;
        assert_eq!(r.intent, Intent::PlayGame);
        assert_eq!(r.confidence, 1.0);
    }

    #[tokio::test]
    async fn direct_action_payload_routes_to_add_to_cart() {
        let nlu = FakeNlu(nlu::NluClassification {
            intent: Intent::Unknown,
            confidence: 0.0,
            entities: Default::default(),
            raw: None,
            needs_clarification: false,
            clarification_options: vec![],
        });
        let router = IntentRouter { nlu: &nlu };
        let r = router.route("add_to_cart:42", &ctx()).await;
        assert_eq!(r.intent, Intent::AddToCart);
        assert_eq!(r.entity_str("item_id"), Some("42".to_string()));
    }

    #[tokio::test]
    async fn low_confidence_unknown_falls_back_to_compound_pattern() {
        let nlu = FakeNlu(nlu::NluClassification {
            intent: Intent::Unknown,
            confidence: 0.2,
            entities: Default::default(),
            raw: None,
            needs_clarification: false,
            clarification_options: vec![],
        });
        let router = IntentRouter { nlu: &nlu };
        let r = router.route("book delivery for tomorrow", &ctx()).await;
        assert_eq!(r.intent, Intent::ParcelBooking);
    }

    #[tokio::test]
    async fn ambiguous_concrete_intent_forwards_clarification_options() {
        // A concrete best-guess intent the NLU itself flags as ambiguous
        // (not the synthetic `needs_clarification` intent string) must
        // still carry its clarification options through `route()`.
        let nlu = FakeNlu(nlu::NluClassification {
            intent: Intent::TrackOrder,
            confidence: 0.7,
            entities: Default::default(),
            raw: None,
            needs_clarification: true,
            clarification_options: vec!["today's order".to_string(), "yesterday's order".to_string()],
        });
        let router = IntentRouter { nlu: &nlu };
        let r = router.route("track my order", &ctx()).await;
        assert_eq!(r.intent, Intent::TrackOrder);
        assert!(r.needs_clarification);
        assert_eq!(r.clarification_options, vec!["today's order".to_string(), "yesterday's order".to_string()]);
    }

    #[tokio::test]
    async fn confident_nlu_result_is_used_as_is() {
        let nlu = FakeNlu(nlu::NluClassification {
            intent: Intent::Greeting,
            confidence: 0.9,
            entities: Default::default(),
            raw: None,
            needs_clarification: false,
            clarification_options: vec![],
        });
        let router = IntentRouter { nlu: &nlu };
        let r = router.route("hello there", &ctx()).await;
        assert_eq!(r.intent, Intent::Greeting);
        assert_eq!(r.confidence, 0.9);
    }
}
