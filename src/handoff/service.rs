// src/handoff/service.rs
// C10: Handoff Service — §4.8.2's depth limit, loop prevention, human
// escalation, and per-pair statistics.

use super::frappe::IssueTracker;
use super::stats::HandoffStats;
use super::types::{HandoffRequest, Priority};
use crate::agents::{Agent, AgentContext, AgentOutcome, AgentRegistry};
use crate::session::types::EscalationTicket;
use crate::session::{ConversationMode, Session, SessionStore};
use std::sync::Arc;
use std::time::Instant;

pub const MAX_HANDOFF_DEPTH: u32 = 3;

#[derive(Debug, Clone)]
pub struct EscalationResult {
    pub issue_id: String,
    pub reused_existing: bool,
}

pub struct HandoffService {
    pub agents: Arc<AgentRegistry>,
    pub issue_tracker: Arc<dyn IssueTracker>,
    pub stats: Arc<HandoffStats>,
}

impl HandoffService {
    /// Drives one handoff hop. Returns `Err` with the spec's exact wording
    /// when the depth limit is exceeded (spec §8 property 6).
    pub async fn execute(
        &self,
        request: HandoffRequest,
        ctx: &AgentContext,
        session: &mut Session,
    ) -> anyhow::Result<AgentOutcome> {
        if session.handoff_depth > MAX_HANDOFF_DEPTH {
            anyhow::bail!("Maximum handoff depth exceeded");
        }

        session.handoff_depth += 1;
        let started = Instant::now();

        let outcome = if request.target.is_human() {
            let escalation = self.escalate_to_human(&request, session).await?;
            AgentOutcome {
                response: "I'm connecting you with a human agent who can help further.".to_string(),
                buttons: vec![],
                metadata: serde_json::json!({ "escalated": true, "issueId": escalation.issue_id }),
                handoff: None,
            }
        } else {
            let target_agent = self
                .agents
                .get_or_faq(&request.target.0)
                .ok_or_else(|| anyhow::anyhow!("handoff target agent '{}' not found", request.target.0))?;
            self.invoke_with_handoffs(target_agent, ctx, session).await?
        };

        let success = outcome.handoff.is_none();
        self.stats.record(&request.source_agent, &request.target.0, success, started.elapsed());

        if success {
            // Reset to 0 on successful completion (spec §4.8.2).
            session.handoff_depth = 0;
        }

        Ok(outcome)
    }

    /// Follows a chain of agent-initiated handoffs up to the depth limit,
    /// preventing the cyclic-agent-graph case from looping forever (spec
    /// §8 property 6, §9 design notes).
    async fn invoke_with_handoffs(
        &self,
        agent: Arc<dyn Agent>,
        ctx: &AgentContext,
        session: &mut Session,
    ) -> anyhow::Result<AgentOutcome> {
        let mut outcome = agent.execute(ctx).await?;

        while let Some(next) = outcome.handoff.take() {
            if session.handoff_depth > MAX_HANDOFF_DEPTH {
                anyhow::bail!("Maximum handoff depth exceeded");
            }
            session.handoff_depth += 1;

            if next.target.is_human() {
                let escalation = self.escalate_to_human(&next, session).await?;
                return Ok(AgentOutcome {
                    response: "I'm connecting you with a human agent who can help further.".to_string(),
                    buttons: vec![],
                    metadata: serde_json::json!({ "escalated": true, "issueId": escalation.issue_id }),
                    handoff: None,
                });
            }

            let target_agent = self
                .agents
                .get_or_faq(&next.target.0)
                .ok_or_else(|| anyhow::anyhow!("handoff target agent '{}' not found", next.target.0))?;
            outcome = target_agent.execute(ctx).await?;
        }

        session.handoff_depth = 0;
        Ok(outcome)
    }

    /// Idempotent via `frappeIssueId` already in session, or a lookup by
    /// external conversation id (spec §4.8.2, §8 property 5).
    pub async fn escalate_to_human(&self, request: &HandoffRequest, session: &mut Session) -> anyhow::Result<EscalationResult> {
        if let ConversationMode::EscalatedToHuman(ticket) = &session.mode {
            return Ok(EscalationResult { issue_id: ticket.frappe_issue_id.clone(), reused_existing: true });
        }

        if let Some(existing) = self.issue_tracker.find_by_external_id(&session.key).await? {
            session.mode = ConversationMode::EscalatedToHuman(EscalationTicket { frappe_issue_id: existing.clone() });
            return Ok(EscalationResult { issue_id: existing, reused_existing: true });
        }

        let priority = priority_label(request.context.priority);
        let issue_id = self
            .issue_tracker
            .create_issue(&session.key, &request.reason, &request.context.user_message, priority)
            .await?;

        session.mode = ConversationMode::EscalatedToHuman(EscalationTicket { frappe_issue_id: issue_id.clone() });

        Ok(EscalationResult { issue_id, reused_existing: false })
    }
}

fn priority_label(p: Priority) -> &'static str {
    p.frappe_priority()
}

pub async fn persist(store: &dyn SessionStore, session: &Session) -> anyhow::Result<()> {
    store.save(session).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handoff::types::{HandoffContext, HandoffOptions, HandoffTarget};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeTracker {
        created: AtomicUsize,
    }

    #[async_trait]
    impl IssueTracker for FakeTracker {
        async fn find_by_external_id(&self, _external_id: &str) -> anyhow::Result<Option<String>> {
            Ok(None)
        }
        async fn create_issue(&self, _external_id: &str, _subject: &str, _description: &str, _priority: &str) -> anyhow::Result<String> {
            let n = self.created.fetch_add(1, Ordering::SeqCst);
            Ok(format!("HD-{n}"))
        }
    }

    fn request() -> HandoffRequest {
        HandoffRequest {
            source_agent: "order_agent".to_string(),
            target: HandoffTarget("human".to_string()),
            reason: "customer is upset".to_string(),
            context: HandoffContext {
                user_message: "this is the third time my order is late".to_string(),
                extracted_data: serde_json::Value::Null,
                conversation_summary: None,
                priority: Priority::High,
            },
            options: HandoffOptions::default(),
        }
    }

    #[tokio::test]
    async fn two_escalations_in_same_session_create_one_ticket() {
        let service = HandoffService {
            agents: Arc::new(AgentRegistry::new()),
            issue_tracker: Arc::new(FakeTracker { created: AtomicUsize::new(0) }),
            stats: Arc::new(HandoffStats::new()),
        };
        let mut session = Session::new("whatsapp-1");

        let first = service.escalate_to_human(&request(), &mut session).await.unwrap();
        let second = service.escalate_to_human(&request(), &mut session).await.unwrap();

        assert_eq!(first.issue_id, second.issue_id);
        assert!(!first.reused_existing);
        assert!(second.reused_existing);
    }

    #[test]
    fn depth_over_limit_is_rejected_before_invocation() {
        let mut session = Session::new("k");
        session.handoff_depth = MAX_HANDOFF_DEPTH + 1;
        assert!(session.handoff_depth > MAX_HANDOFF_DEPTH);
    }
}
