// src/orchestrator/mod.rs
// C8: Message Orchestrator — the central per-message decision pipeline
// (spec §4.8). Runs the fifteen priority gates in strict order; the first
// gate to produce a response wins (spec §8 property 1).

pub mod auth;
pub mod keywords;
pub mod menus;
pub mod types;

use crate::agents::{AgentContext, AgentRegistry};
use crate::content_filter;
use crate::fire_and_forget::FireAndForgetQueue;
use crate::flow::{FlowCache, FlowDispatcher};
use crate::handoff::HandoffService;
use crate::intent::nlu::{NluClassifier, NluContext};
use crate::intent::types::{Intent, RoutingResult};
use crate::intent::IntentRouter;
use crate::language;
use once_cell::sync::Lazy;
use regex::Regex;
use crate::session::types::HistoryTurn;
use crate::session::{ConversationMode, Session, SessionStore};
use crate::session::locks::KeyedLock;
use crate::utils::buttons::{Button, LOCATION_SHARE_VALUE};
use crate::utils::phone;
use std::sync::Arc;
use std::time::Instant;
use types::{ProcessMessageRequest, ProcessMessageResponse};

pub struct Orchestrator {
    pub session_store: Arc<dyn SessionStore>,
    pub locks: Arc<KeyedLock>,
    pub nlu: Arc<dyn NluClassifier>,
    pub flow_dispatcher: Arc<dyn FlowDispatcher>,
    pub flow_cache: Arc<FlowCache>,
    pub agents: Arc<AgentRegistry>,
    pub handoff: Arc<HandoffService>,
    pub auth_client: Arc<dyn auth::AuthClient>,
    pub auth_trigger: Arc<dyn auth::AuthTrigger>,
    pub fire_and_forget: Arc<FireAndForgetQueue>,
}

/// Strong-intent set for the interruption check (spec §4.8 gate 9a) — the
/// closed vocabulary of intents that clearly start a *different* task from
/// whatever flow is already running.
fn is_strong_interrupt_intent(intent: &Intent) -> bool {
    matches!(
        intent,
        Intent::OrderFood
            | Intent::SearchProduct
            | Intent::ParcelBooking
            | Intent::BookParcel
            | Intent::TrackOrder
            | Intent::Checkout
            | Intent::CancelOrder
            | Intent::RefundRequest
            | Intent::SubmitComplaint
    )
}

fn module_for_intent(intent: &Intent) -> &'static str {
    match intent {
        Intent::OrderFood | Intent::BrowseMenu => "food",
        Intent::SearchProduct => "ecom",
        Intent::BookParcel | Intent::ParcelBooking | Intent::CreateParcelOrder | Intent::ScheduleDelivery => "parcel",
        Intent::TrackOrder | Intent::CancelOrder | Intent::ViewOrders => "tracking",
        Intent::RefundRequest | Intent::SubmitComplaint => "complaints",
        _ => "general",
    }
}

const GAME_INTENTS: &[Intent] =
    &[Intent::PlayGame, Intent::ClaimReward, Intent::ViewRewards, Intent::CheckPoints, Intent::Leaderboard, Intent::GameIntro];

fn is_location_share(message: &str) -> bool {
    message.trim() == LOCATION_SHARE_VALUE || message.trim().starts_with("location:")
}

static NEGATIVE_SENTIMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(angry|annoyed|frustrated|terrible|worst|useless|pathetic|scam|fraud)\b").unwrap()
});

fn sentiment_label(message: &str) -> &'static str {
    if NEGATIVE_SENTIMENT.is_match(message) {
        "negative"
    } else {
        "neutral"
    }
}

impl Orchestrator {
    pub async fn process_message(&self, req: ProcessMessageRequest) -> ProcessMessageResponse {
        let started = Instant::now();

        // Gate 1: content filter — synchronous, zero session I/O (spec §8
        // property 2).
        let verdict = content_filter::filter(&req.message);
        if verdict.blocked {
            let reason = verdict.reason.map(|r| r.as_str()).unwrap_or("unknown");
            return ProcessMessageResponse::text(verdict.response.unwrap_or_default(), elapsed_ms(started)).with_metadata(
                serde_json::json!({ "content_blocked": true, "reason": reason }),
            );
        }

        // Everything past this point touches the session store; serialize
        // per session key (spec §5).
        let _guard = self.locks.acquire(&req.participant_id).await;

        let mut session = match req.test_session.clone() {
            Some(s) => s,
            None => self.load_or_create_session(&req.participant_id).await,
        };

        // Gate 2: annotate detected language.
        let annotation = language::analyze(&req.message);
        session.detected_language = Some(annotation.language.clone());

        let response = self.run_gates(&mut session, &req, started).await;

        if let Err(e) = self.session_store.save(&session).await {
            tracing::error!(error = %e, key = %req.participant_id, "failed to persist session");
        }

        response
    }

    async fn load_or_create_session(&self, key: &str) -> Session {
        match self.session_store.get(key).await {
            Ok(Some(s)) => s,
            Ok(None) => Session::new(key),
            Err(e) => {
                tracing::error!(error = %e, key, "session load failed, starting an empty session");
                Session::new(key)
            }
        }
    }

    async fn run_gates(&self, session: &mut Session, req: &ProcessMessageRequest, started: Instant) -> ProcessMessageResponse {
        // Gate 3: human-takeover.
        if let ConversationMode::EscalatedToHuman(ticket) = &session.mode {
            let issue_id = ticket.frappe_issue_id.clone();
            return ProcessMessageResponse::text(
                format!("A human will assist you shortly (ticket {issue_id})."),
                elapsed_ms(started),
            )
            .with_metadata(serde_json::json!({ "escalated": true, "issueId": issue_id }));
        }

        // Gate 4: restart / reset / greeting-in-auth.
        if keywords::is_restart_message(&req.message) {
            if matches!(session.mode, ConversationMode::InFlow(_)) {
                let _ = self.flow_dispatcher.cancel_flow(&session.key).await;
            }
            session.mode = ConversationMode::Idle;
            return self.finalize(session, &req.message, "Cancelled. How can I help you?", vec![], serde_json::Value::Null, None, started);
        }
        if keywords::is_greeting_message(&req.message)
            && matches!(&session.mode, ConversationMode::Authenticating(p) if matches!(p.step, crate::session::types::AuthStep::AwaitingOtp | crate::session::types::AuthStep::AwaitingPhoneNumber))
        {
            session.mode = ConversationMode::Idle;
            // Stuck-auth greeting: fall through rather than returning.
        }

        // Gate 5: resume confirmation.
        if let ConversationMode::AwaitingResumeConfirmation { suspended_flow } = session.mode.clone() {
            session.mode = ConversationMode::Idle;
            if keywords::is_resume_yes(&req.message) {
                match self.flow_dispatcher.resume_suspended_flow(&session.key).await {
                    Ok(true) => {
                        session.mode = ConversationMode::InFlow(suspended_flow);
                        return self.finalize(session, &req.message, "Resuming where we left off.", vec![], serde_json::Value::Null, None, started);
                    }
                    Ok(false) | Err(_) => {
                        return self.finalize(
                            session,
                            &req.message,
                            "I couldn't resume that, let's start fresh. How can I help?",
                            vec![],
                            serde_json::Value::Null,
                            None,
                            started,
                        );
                    }
                }
            }
            // "no" — discard suspended_flow (already cleared) and fall through.
        }

        // Gate 6: auth-step.
        let in_auth = matches!(session.mode, ConversationMode::Authenticating(_));
        if in_auth && !is_location_share(&req.message) {
            let outcome = auth::handle_auth_step(session, &req.message, self.auth_client.as_ref()).await;
            match outcome {
                auth::AuthStepOutcome::Prompt(text) => {
                    return self.finalize(session, &req.message, &text, vec![], serde_json::Value::Null, None, started);
                }
                auth::AuthStepOutcome::Completed { auth_data } => {
                    return self.continue_after_auth(session, req, auth_data, started).await;
                }
            }
        }
        if in_auth && is_location_share(&req.message) {
            if let ConversationMode::Authenticating(pending) = &session.mode {
                if matches!(pending.step, crate::session::types::AuthStep::AwaitingName | crate::session::types::AuthStep::AwaitingEmail) {
                    session.mode = ConversationMode::Idle;
                    // Fall through with the location-share message unhandled by auth.
                }
            }
        }

        self.route_and_continue(session, req, serde_json::Value::Null, started).await
    }

    /// After auth completes mid-message, re-enters the pipeline at gate 7
    /// using the *current* message (the OTP/email reply itself does not
    /// get routed — gate 8 will pick up `pendingMessage` if one exists).
    async fn continue_after_auth(
        &self,
        session: &mut Session,
        req: &ProcessMessageRequest,
        auth_data: serde_json::Value,
        started: Instant,
    ) -> ProcessMessageResponse {
        self.route_and_continue(session, req, auth_data, started).await
    }

    async fn route_and_continue(
        &self,
        session: &mut Session,
        req: &ProcessMessageRequest,
        auth_data: serde_json::Value,
        started: Instant,
    ) -> ProcessMessageResponse {
        let active_flow = match self.flow_dispatcher.get_active_flow(&session.key).await {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(error = %e, "active-flow lookup failed");
                None
            }
        };

        // Gate 7: intent routing.
        let nlu_context = NluContext {
            active_module: session.module.clone(),
            active_flow_id: active_flow.as_ref().map(|f| f.flow_id.clone()),
            last_bot_message: None,
        };
        let router = IntentRouter { nlu: self.nlu.as_ref() };
        let mut routing = router.route(&req.message, &nlu_context).await;
        let mut message = req.message.clone();

        let personalization_eligible = session.authenticated || phone::participant_looks_like_phone(&req.participant_id);
        let user_preference_context = if personalization_eligible { req.user_preference_context.clone() } else { None };

        // Gate 8: pending-intent resume.
        if session.authenticated {
            if let Some(pending) = session.pending_intent.take() {
                routing = pending.intent;
                message = pending.message;
            }
        }

        // Gate 9: active-flow continuation.
        if let Some(flow_handle) = active_flow {
            let wait_state = self.flow_dispatcher.is_in_wait_state(&session.key).await.unwrap_or(false);
            let should_interrupt = is_strong_interrupt_intent(&routing.intent)
                && routing.confidence > 0.8
                && session.module.as_deref() != Some(module_for_intent(&routing.intent))
                && !wait_state
                && (message.chars().count() >= 20 || routing.intent.is_short_allowed_interrupt());

            if !should_interrupt {
                match self.flow_dispatcher.process_active_flow(&session.key, &message, intent_label(&routing.intent), routing.confidence).await {
                    Ok(step) => {
                        if step.completed {
                            session.mode = ConversationMode::Idle;
                        }
                        return self.finalize(session, &message, &step.response, step.buttons, step.metadata, Some(intent_label(&routing.intent)), started);
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "active flow step failed");
                        return self.finalize(
                            session,
                            &message,
                            "Sorry, something went wrong continuing that. Let's start over — how can I help?",
                            vec![],
                            serde_json::Value::Null,
                            None,
                            started,
                        );
                    }
                }
            }

            // Interrupting: suspend the active flow for possible resume.
            if let Err(e) = self.flow_dispatcher.suspend_flow(&session.key).await {
                tracing::warn!(error = %e, "failed to suspend interrupted flow");
            }
            session.mode = ConversationMode::AwaitingResumeConfirmation { suspended_flow: flow_handle };
        }

        // Gate 10: escape-intent fast path.
        if routing.intent.is_escape() || keywords::is_explicit_short_cancel(&message) {
            if matches!(session.mode, ConversationMode::InFlow(_) | ConversationMode::AwaitingResumeConfirmation { .. }) {
                let _ = self.flow_dispatcher.cancel_flow(&session.key).await;
            }
            session.mode = ConversationMode::Idle;
        }

        // Gate 11: clarification gates.
        if routing.needs_clarification {
            let nlu_classification = crate::intent::nlu::NluClassification {
                intent: routing.intent.clone(),
                confidence: routing.confidence,
                entities: routing.entities.clone(),
                raw: routing.raw.clone(),
                needs_clarification: true,
                clarification_options: routing.clarification_options.clone(),
            };
            let menu = menus::smart_clarification(&nlu_classification);
            return self.finalize(session, &message, &menu.text, menu.buttons, serde_json::Value::Null, Some("needs_clarification"), started);
        }
        if routing.intent == Intent::Unknown && routing.confidence < 0.6 {
            let menu = menus::generic_help_menu();
            return self.finalize(session, &message, &menu.text, menu.buttons, serde_json::Value::Null, Some("unknown"), started);
        }
        let looks_gibberish = message.chars().count() < 10 && !has_known_lexical_hit(&message);
        if !routing.intent.is_protected() && (routing.confidence < 0.55 || looks_gibberish) {
            let menu = menus::generic_help_menu();
            return self.finalize(session, &message, &menu.text, menu.buttons, serde_json::Value::Null, Some(intent_label(&routing.intent)), started);
        }

        // Check whether this (now-routed) intent requires auth and we are
        // not authenticated yet — begin the auth sub-state-machine (spec
        // §4.8.1 "idle + auth-required intent").
        if !session.authenticated {
            if let Some((action, module)) = auth::auth_required_action_module(&routing.intent) {
                let requires = self.auth_trigger.requires_auth(action, module).await.unwrap_or(false);
                if requires {
                    let prompt = auth::begin_auth(session, action, module, routing.clone(), &message);
                    return self.finalize(session, &message, &prompt, vec![], serde_json::Value::Null, Some(intent_label(&routing.intent)), started);
                }
            }
        }

        // Gate 12: flow start.
        if let Ok(Some(flow_def)) =
            self.flow_cache.find_flow_by_intent(self.flow_dispatcher.as_ref(), intent_label(&routing.intent), routing.module_id.as_deref(), Some(&message)).await
        {
            let init_ctx = serde_json::json!({
                "message": message,
                "intent": intent_label(&routing.intent),
                "entities": routing.entities,
                "userPreferenceContext": user_preference_context,
            });
            match self.flow_dispatcher.start_flow(&flow_def.flow_id, init_ctx).await {
                Ok(step) => {
                    session.module = flow_def.module.clone().or_else(|| Some(module_for_intent(&routing.intent).to_string()));
                    session.mode = ConversationMode::Idle;
                    let text = prepend_auth_ack(&auth_data, &step.response);
                    return self.finalize(session, &message, &text, step.buttons, step.metadata, Some(intent_label(&routing.intent)), started);
                }
                Err(e) => {
                    tracing::error!(error = %e, "flow start failed");
                }
            }
        }

        // Gate 13: game-intent handler.
        if GAME_INTENTS.contains(&routing.intent) {
            let menu = menus::game_intent_response(&routing.intent);
            let text = prepend_auth_ack(&auth_data, &menu.text);
            return self.finalize(session, &message, &text, menu.buttons, serde_json::json!({ "gameIntent": true }), Some(intent_label(&routing.intent)), started);
        }

        // Gate 14: agent fallback.
        let agent = self.agents.get_or_faq(&routing.agent_id);
        let ctx = AgentContext {
            participant_id: req.participant_id.clone(),
            message: message.clone(),
            routing: routing.clone(),
            session: session.clone(),
            user_preference_context,
        };

        let outcome = match agent {
            Some(agent) => agent.execute(&ctx).await,
            None => Ok(crate::agents::AgentOutcome::text("I'm not sure how to help with that yet.")),
        };

        match outcome {
            Ok(mut outcome) => {
                if let Some(handoff_request) = outcome.handoff.take() {
                    match self.handoff.execute(handoff_request, &ctx, session).await {
                        Ok(final_outcome) => {
                            let text = prepend_auth_ack(&auth_data, &final_outcome.response);
                            self.finalize(session, &message, &text, final_outcome.buttons, final_outcome.metadata, Some(intent_label(&routing.intent)), started)
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "handoff failed");
                            self.finalize(
                                session,
                                &message,
                                "I'm having trouble connecting you right now, please try again shortly.",
                                vec![],
                                serde_json::Value::Null,
                                Some(intent_label(&routing.intent)),
                                started,
                            )
                        }
                    }
                } else {
                    let text = prepend_auth_ack(&auth_data, &outcome.response);
                    self.finalize(session, &message, &text, outcome.buttons, outcome.metadata, Some(intent_label(&routing.intent)), started)
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "agent execution failed");
                self.finalize(
                    session,
                    &message,
                    "Sorry, I hit a snag handling that. Could you try again?",
                    vec![],
                    serde_json::Value::Null,
                    Some(intent_label(&routing.intent)),
                    started,
                )
            }
        }
    }

    /// Gate 15: post-processing, applied uniformly by every return path
    /// via `finalize`.
    fn finalize(
        &self,
        session: &mut Session,
        user_message: &str,
        text: &str,
        buttons: Vec<Button>,
        mut metadata: serde_json::Value,
        intent: Option<&str>,
        started: Instant,
    ) -> ProcessMessageResponse {
        session.push_history(HistoryTurn {
            message: user_message.to_string(),
            response: text.to_string(),
            intent: intent.map(str::to_string),
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
        });

        if let (Some(intent), Some(obj)) = (intent, metadata.as_object_mut()) {
            obj.entry("intent").or_insert_with(|| serde_json::Value::String(intent.to_string()));
        } else if metadata.is_null() {
            if let Some(intent) = intent {
                metadata = serde_json::json!({ "intent": intent });
            }
        }

        let intent_owned = intent.map(str::to_string);
        let language = session.detected_language.clone();
        let sentiment = sentiment_label(user_message).to_string();
        self.fire_and_forget.submit("training_record", async move {
            tracing::info!(intent = ?intent_owned, language = ?language, sentiment = %sentiment, "training record");
            Ok(())
        });

        ProcessMessageResponse::text(text, elapsed_ms(started)).with_metadata(metadata).with_buttons(buttons)
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

fn intent_label(intent: &Intent) -> &'static str {
    match intent {
        Intent::Greeting => "greeting",
        Intent::Chitchat => "chitchat",
        Intent::Farewell => "farewell",
        Intent::Feedback => "feedback",
        Intent::Help => "help",
        Intent::Cancel => "cancel",
        Intent::Reset => "reset",
        Intent::StartOver => "start_over",
        Intent::MainMenu => "main_menu",
        Intent::Login => "login",
        Intent::PlayGame => "play_game",
        Intent::ClaimReward => "claim_reward",
        Intent::ViewRewards => "view_rewards",
        Intent::CheckPoints => "check_points",
        Intent::Leaderboard => "leaderboard",
        Intent::GameIntro => "game_intro",
        Intent::OrderFood => "order_food",
        Intent::BrowseMenu => "browse_menu",
        Intent::SearchProduct => "search_product",
        Intent::AddToCart => "add_to_cart",
        Intent::RemoveFromCart => "remove_from_cart",
        Intent::ViewCart => "view_cart",
        Intent::UpdateQuantity => "update_quantity",
        Intent::Checkout => "checkout",
        Intent::TrackOrder => "track_order",
        Intent::CancelOrder => "cancel_order",
        Intent::Reorder => "reorder",
        Intent::RepeatOrder => "repeat_order",
        Intent::BookParcel => "book_parcel",
        Intent::ParcelBooking => "parcel_booking",
        Intent::CreateParcelOrder => "create_parcel_order",
        Intent::ScheduleDelivery => "schedule_delivery",
        Intent::RefundRequest => "refund_request",
        Intent::SubmitComplaint => "submit_complaint",
        Intent::ManageAddress => "manage_address",
        Intent::ViewProfile => "view_profile",
        Intent::ViewOrders => "view_orders",
        Intent::NeedsClarification => "needs_clarification",
        Intent::Unknown => "unknown",
    }
}

fn has_known_lexical_hit(message: &str) -> bool {
    let lower = message.to_lowercase();
    const KNOWN_WORDS: &[&str] =
        &["order", "food", "cart", "track", "parcel", "help", "hi", "hello", "menu", "cancel", "login", "search"];
    KNOWN_WORDS.iter().any(|w| lower.contains(w))
}

fn prepend_auth_ack(auth_data: &serde_json::Value, response: &str) -> String {
    if auth_data.is_null() {
        response.to_string()
    } else {
        format!("You're logged in!\n\n{response}")
    }
}
