// src/handoff/frappe.rs
// Support-ticket creation in the external issue tracker (spec §4.8.2,
// §6 FRAPPE_* environment variables).

use crate::config::external::FrappeConfig;
use async_trait::async_trait;

#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Looks up an existing issue by the external conversation id, so
    /// escalation stays idempotent even if `frappeIssueId` was lost from
    /// the session (spec §4.8.2, §8 property 5).
    async fn find_by_external_id(&self, external_id: &str) -> anyhow::Result<Option<String>>;

    async fn create_issue(&self, external_id: &str, subject: &str, description: &str, priority: &str) -> anyhow::Result<String>;
}

pub struct FrappeIssueTracker {
    client: reqwest::Client,
    config: FrappeConfig,
}

impl FrappeIssueTracker {
    pub fn new(config: FrappeConfig) -> Self {
        Self { client: reqwest::Client::new(), config }
    }

    fn base_url(&self) -> anyhow::Result<&str> {
        self.config.base_url.as_deref().ok_or_else(|| anyhow::anyhow!("FRAPPE_BASE_URL not configured"))
    }
}

#[async_trait]
impl IssueTracker for FrappeIssueTracker {
    async fn find_by_external_id(&self, external_id: &str) -> anyhow::Result<Option<String>> {
        let base = self.base_url()?;
        let url = format!("{}/api/resource/{}", base, self.config.issue_doctype);
        let filters = serde_json::json!([[self.config.external_id_field, "=", external_id]]);

        let resp: serde_json::Value = self
            .client
            .get(url)
            .query(&[("filters", filters.to_string())])
            .header("Authorization", self.auth_header())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(resp["data"]
            .as_array()
            .and_then(|arr| arr.first())
            .and_then(|v| v["name"].as_str())
            .map(str::to_string))
    }

    async fn create_issue(&self, external_id: &str, subject: &str, description: &str, priority: &str) -> anyhow::Result<String> {
        let base = self.base_url()?;
        let url = format!("{}/api/resource/{}", base, self.config.issue_doctype);
        let mut body = serde_json::json!({
            "subject": subject,
            "description": description,
            "priority": priority,
        });
        body.as_object_mut()
            .unwrap()
            .insert(self.config.external_id_field.clone(), serde_json::Value::String(external_id.to_string()));

        let resp: serde_json::Value = self
            .client
            .post(url)
            .header("Authorization", self.auth_header())
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        resp["data"]["name"].as_str().map(str::to_string).ok_or_else(|| anyhow::anyhow!("frappe did not return an issue name"))
    }
}

impl FrappeIssueTracker {
    fn auth_header(&self) -> String {
        format!(
            "token {}:{}",
            self.config.api_key.as_deref().unwrap_or_default(),
            self.config.api_secret.as_deref().unwrap_or_default()
        )
    }
}
