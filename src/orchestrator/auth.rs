// src/orchestrator/auth.rs
// Auth sub-state-machine (spec §4.8.1), realized as inline handlers per
// the design decision recorded in SPEC_FULL.md (spec §9 open question 3).
// States live in `Session::mode` as `ConversationMode::Authenticating`.

use crate::session::types::{AuthPending, AuthStep, PendingIntent};
use crate::session::{ConversationMode, Session};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone)]
pub struct UserProfile {
    pub user_id: i64,
    pub auth_token: String,
    pub is_personal_info: bool,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[async_trait]
pub trait AuthClient: Send + Sync {
    async fn send_otp(&self, phone: &str) -> anyhow::Result<()>;

    /// `None` on an invalid/expired code rather than an error, so callers
    /// can distinguish "retry the OTP prompt" from a transient failure.
    async fn verify_otp(&self, phone: &str, code: &str) -> anyhow::Result<Option<UserProfile>>;

    async fn update_user_info(&self, phone: &str, name: &str, email: &str) -> anyhow::Result<UserProfile>;
}

/// `(action, module)` required to start an intent that needs auth (spec §6
/// "Auth-required action/module pairs"). The *decision* of whether auth is
/// actually required for a pair belongs to an external auth-trigger
/// service (spec §6); this map only tells the orchestrator what to stash
/// as `pendingAction`/`pendingModule` once that service says yes.
pub fn auth_required_action_module(intent: &crate::intent::types::Intent) -> Option<(&'static str, &'static str)> {
    use crate::intent::types::Intent;
    match intent {
        Intent::OrderFood => Some(("search_food", "food")),
        Intent::AddToCart => Some(("add_to_cart", "food")),
        Intent::Checkout => Some(("checkout", "food")),
        Intent::TrackOrder => Some(("track_order", "tracking")),
        Intent::CancelOrder => Some(("cancel_order", "tracking")),
        Intent::BookParcel | Intent::ParcelBooking => Some(("book_delivery", "parcel")),
        Intent::CreateParcelOrder => Some(("create_order", "parcel")),
        Intent::RefundRequest | Intent::SubmitComplaint => Some(("file_complaint", "complaints")),
        Intent::ViewProfile => Some(("view_profile", "general")),
        Intent::ViewOrders => Some(("view_orders", "tracking")),
        Intent::ClaimReward => Some(("claim_reward", "general")),
        Intent::SearchProduct => Some(("browse", "ecom")),
        _ => None,
    }
}

#[async_trait]
pub trait AuthTrigger: Send + Sync {
    async fn requires_auth(&self, action: &str, module: &str) -> anyhow::Result<bool>;
}

/// Begins the auth sub-state-machine: `idle + auth-required intent` (spec
/// §4.8.1). Stashes enough of the routing result that gate 8 can restore
/// `message` verbatim once auth completes.
pub fn begin_auth(session: &mut Session, action: &str, module: &str, routing: crate::intent::types::RoutingResult, message: &str) -> String {
    session.mode = ConversationMode::Authenticating(AuthPending {
        step: AuthStep::AwaitingPhoneNumber,
        pending_action: Some(action.to_string()),
        pending_module: Some(module.to_string()),
        pending_intent: Some(PendingIntent { intent: routing, message: message.to_string() }),
        temp_phone: None,
        temp_name: None,
    });
    "To continue, could you share your phone number?".to_string()
}

static OTP_4_OR_6_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}$|^\d{6}$").unwrap());
static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

pub enum AuthStepOutcome {
    /// A response to show the user; the auth state machine is not done.
    Prompt(String),
    /// Auth completed (or was cancelled); the orchestrator should fall
    /// through to gate 8 (pending-intent resume) or gate 7 (re-route) as
    /// appropriate. `auth_data` is attached to response metadata.
    Completed { auth_data: serde_json::Value },
}

/// Drives one step of the auth sub-state-machine (spec §4.8.1). Assumes the
/// caller has already checked `session.mode` is `Authenticating` and the
/// message is not a location-share payload (spec §4.8 gate 6 exception).
pub async fn handle_auth_step(session: &mut Session, message: &str, client: &dyn AuthClient) -> AuthStepOutcome {
    if message.trim().eq_ignore_ascii_case("cancel") {
        session.mode = ConversationMode::Idle;
        return AuthStepOutcome::Prompt("Login cancelled.".to_string());
    }

    let pending = match &session.mode {
        ConversationMode::Authenticating(p) => p.clone(),
        _ => return AuthStepOutcome::Prompt("Something went wrong with login. Please try again.".to_string()),
    };

    match pending.step {
        AuthStep::AwaitingPhoneNumber => {
            let digits = crate::utils::phone::digits_only(message);
            if digits.len() < 10 {
                return AuthStepOutcome::Prompt("That doesn't look like a valid phone number — please send at least 10 digits.".to_string());
            }
            if let Err(e) = client.send_otp(&digits).await {
                tracing::warn!(error = %e, "sendOtp failed");
                return AuthStepOutcome::Prompt("I couldn't send an OTP right now, please try again in a moment.".to_string());
            }
            let mut next = pending;
            next.temp_phone = Some(digits);
            next.step = AuthStep::AwaitingOtp;
            session.mode = ConversationMode::Authenticating(next);
            AuthStepOutcome::Prompt("I've sent a one-time code to your phone. Please enter it here.".to_string())
        }

        AuthStep::AwaitingOtp => {
            let code = message.trim();
            if !code.chars().all(|c| c.is_ascii_digit()) {
                return AuthStepOutcome::Prompt(
                    "That code should be numbers only. Please re-enter the OTP, or send \"cancel\" to stop.".to_string(),
                );
            }
            if !OTP_4_OR_6_DIGITS.is_match(code) {
                return AuthStepOutcome::Prompt("Please enter the 4- or 6-digit code we sent you.".to_string());
            }

            let phone = pending.temp_phone.clone().unwrap_or_default();
            match client.verify_otp(&phone, code).await {
                Ok(Some(profile)) => finish_or_advance_name(session, pending, profile),
                Ok(None) => AuthStepOutcome::Prompt("That code didn't match. Please try again, or send \"cancel\" to stop.".to_string()),
                Err(e) => {
                    tracing::warn!(error = %e, "verifyOtp failed");
                    AuthStepOutcome::Prompt("I couldn't verify that code right now, please try again in a moment.".to_string())
                }
            }
        }

        AuthStep::AwaitingName => {
            let name = message.trim();
            if name.chars().count() < 2 {
                return AuthStepOutcome::Prompt("What name should I use for you?".to_string());
            }
            let mut next = pending;
            next.temp_name = Some(name.to_string());
            next.step = AuthStep::AwaitingEmail;
            session.mode = ConversationMode::Authenticating(next);
            AuthStepOutcome::Prompt("Thanks! And your email address?".to_string())
        }

        AuthStep::AwaitingEmail => {
            let email = message.trim();
            if !EMAIL_PATTERN.is_match(email) {
                return AuthStepOutcome::Prompt("That doesn't look like a valid email — please try again.".to_string());
            }
            let phone = pending.temp_phone.clone().unwrap_or_default();
            let name = pending.temp_name.clone().unwrap_or_default();
            match client.update_user_info(&phone, &name, email).await {
                Ok(profile) => complete_auth(session, pending, profile),
                Err(e) => {
                    tracing::warn!(error = %e, "updateUserInfo failed");
                    AuthStepOutcome::Prompt("I couldn't save that just now, please try again in a moment.".to_string())
                }
            }
        }
    }
}

fn finish_or_advance_name(session: &mut Session, pending: AuthPending, profile: UserProfile) -> AuthStepOutcome {
    if !profile.is_personal_info {
        session.authenticated = true;
        session.user_id = Some(profile.user_id);
        session.auth_token = Some(profile.auth_token);
        let mut next = pending;
        next.step = AuthStep::AwaitingName;
        session.mode = ConversationMode::Authenticating(next);
        return AuthStepOutcome::Prompt("Great, you're verified! What name should I use for you?".to_string());
    }
    complete_auth(session, pending, profile)
}

fn complete_auth(session: &mut Session, pending: AuthPending, profile: UserProfile) -> AuthStepOutcome {
    session.authenticated = true;
    session.user_id = Some(profile.user_id);
    session.auth_token = Some(profile.auth_token);
    session.pending_intent = pending.pending_intent;
    session.mode = ConversationMode::Idle;

    AuthStepOutcome::Completed {
        auth_data: serde_json::json!({
            "userId": profile.user_id,
            "name": profile.name,
            "email": profile.email,
        }),
    }
}

pub struct PhpBackendAuthClient {
    client: reqwest::Client,
    base_url: String,
}

impl PhpBackendAuthClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), base_url: base_url.into() }
    }
}

#[async_trait]
impl AuthClient for PhpBackendAuthClient {
    async fn send_otp(&self, phone: &str) -> anyhow::Result<()> {
        self.client
            .post(format!("{}/api/v1/auth/send-otp", self.base_url))
            .json(&serde_json::json!({ "phone": phone }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn verify_otp(&self, phone: &str, code: &str) -> anyhow::Result<Option<UserProfile>> {
        let resp: serde_json::Value = self
            .client
            .post(format!("{}/api/v1/auth/verify-otp", self.base_url))
            .json(&serde_json::json!({ "phone": phone, "otp": code }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if !resp["verified"].as_bool().unwrap_or(false) {
            return Ok(None);
        }

        Ok(Some(UserProfile {
            user_id: resp["userId"].as_i64().unwrap_or_default(),
            auth_token: resp["authToken"].as_str().unwrap_or_default().to_string(),
            is_personal_info: resp["isPersonalInfo"].as_i64().unwrap_or(0) != 0,
            name: resp["name"].as_str().map(str::to_string),
            email: resp["email"].as_str().map(str::to_string),
        }))
    }

    async fn update_user_info(&self, phone: &str, name: &str, email: &str) -> anyhow::Result<UserProfile> {
        let resp: serde_json::Value = self
            .client
            .post(format!("{}/api/v1/auth/update-profile", self.base_url))
            .json(&serde_json::json!({ "phone": phone, "name": name, "email": email }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(UserProfile {
            user_id: resp["userId"].as_i64().unwrap_or_default(),
            auth_token: resp["authToken"].as_str().unwrap_or_default().to_string(),
            is_personal_info: true,
            name: Some(name.to_string()),
            email: Some(email.to_string()),
        })
    }
}

pub struct PhpBackendAuthTrigger {
    client: reqwest::Client,
    base_url: String,
}

impl PhpBackendAuthTrigger {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), base_url: base_url.into() }
    }
}

#[async_trait]
impl AuthTrigger for PhpBackendAuthTrigger {
    async fn requires_auth(&self, action: &str, module: &str) -> anyhow::Result<bool> {
        let resp: serde_json::Value = self
            .client
            .get(format!("{}/api/v1/auth/requires-auth", self.base_url))
            .query(&[("action", action), ("module", module)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(resp["requiresAuth"].as_bool().unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::types::{Intent, RoutingResult};

    struct FakeAuthClient;
    #[async_trait]
    impl AuthClient for FakeAuthClient {
        async fn send_otp(&self, _phone: &str) -> anyhow::Result<()> {
            Ok(())
        }
        async fn verify_otp(&self, _phone: &str, code: &str) -> anyhow::Result<Option<UserProfile>> {
            if code == "123456" {
                Ok(Some(UserProfile { user_id: 7, auth_token: "tok".to_string(), is_personal_info: true, name: Some("Asha".to_string()), email: Some("a@b.com".to_string()) }))
            } else {
                Ok(None)
            }
        }
        async fn update_user_info(&self, _phone: &str, name: &str, email: &str) -> anyhow::Result<UserProfile> {
            Ok(UserProfile { user_id: 7, auth_token: "tok".to_string(), is_personal_info: true, name: Some(name.to_string()), email: Some(email.to_string()) })
        }
    }

    #[tokio::test]
    async fn full_happy_path_restores_pending_message_on_completion() {
        // S2: awaiting_otp with pendingIntent/pendingMessage set; OTP
        // completes auth and the pending message must survive.
        let mut session = Session::new("whatsapp-1");
        let routing = RoutingResult { intent: Intent::ParcelBooking, ..Default::default() };
        begin_auth(&mut session, "book_delivery", "parcel", routing, "send parcel to Koregaon Park");

        // Phone step.
        let client = FakeAuthClient;
        match handle_auth_step(&mut session, "9876543210", &client).await {
            AuthStepOutcome::Prompt(_) => {}
            _ => panic!("expected a prompt after phone number"),
        }
        assert!(session.is_awaiting_auth_step(&AuthStep::AwaitingOtp));

        // OTP step, profile already has personal info -> completes directly.
        match handle_auth_step(&mut session, "123456", &client).await {
            AuthStepOutcome::Completed { .. } => {}
            AuthStepOutcome::Prompt(p) => panic!("expected completion, got prompt: {p}"),
        }

        assert!(session.authenticated);
        let pending = session.pending_intent.as_ref().expect("pending intent restored");
        assert_eq!(pending.message, "send parcel to Koregaon Park");
    }

    #[tokio::test]
    async fn cancel_during_auth_resets_to_idle() {
        let mut session = Session::new("k");
        begin_auth(&mut session, "browse", "ecom", RoutingResult::default(), "search shoes");
        let client = FakeAuthClient;
        match handle_auth_step(&mut session, "cancel", &client).await {
            AuthStepOutcome::Prompt(p) => assert_eq!(p, "Login cancelled."),
            _ => panic!("expected prompt"),
        }
        assert!(matches!(session.mode, ConversationMode::Idle));
    }

    #[tokio::test]
    async fn invalid_otp_reprompts_without_advancing_state() {
        let mut session = Session::new("k");
        begin_auth(&mut session, "browse", "ecom", RoutingResult::default(), "search shoes");
        let client = FakeAuthClient;
        handle_auth_step(&mut session, "9876543210", &client).await;
        handle_auth_step(&mut session, "000000", &client).await;
        assert!(session.is_awaiting_auth_step(&AuthStep::AwaitingOtp));
        assert!(!session.authenticated);
    }
}
