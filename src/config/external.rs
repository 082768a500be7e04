// src/config/external.rs
// Environment-driven config for every external collaborator named in spec §6.

/// Absence of `PHP_BACKEND_URL` is a fatal init error per spec §6 — unlike
/// the other externals, which degrade per spec §5/§7 instead of failing
/// startup.
#[derive(Debug, Clone)]
pub struct ExternalServicesConfig {
    pub php_backend_url: String,
    pub search_api_url: String,
    pub opensearch_url: String,
    pub embedding_service_url: String,
    pub image_ai_url: String,
    pub frappe: FrappeConfig,
    pub llm: LlmConfig,
}

/// The one LLM capability's own credentials (spec §4.4 strategy 4, §9):
/// address-extraction fallback and the canned chat completion degrade to
/// `LLM_CANNED_FALLBACK` rather than failing startup, so these are not
/// fatal-on-missing the way `PHP_BACKEND_URL` is.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct FrappeConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub issue_doctype: String,
    pub external_id_field: String,
}

impl ExternalServicesConfig {
    pub fn from_env() -> Self {
        let php_backend_url = std::env::var("PHP_BACKEND_URL")
            .or_else(|_| std::env::var("PHP_API_BASE_URL"))
            .expect("PHP_BACKEND_URL (or PHP_API_BASE_URL) must be set");

        Self {
            php_backend_url,
            search_api_url: super::env_or("SEARCH_API_URL", ""),
            opensearch_url: super::env_or("OPENSEARCH_URL", ""),
            embedding_service_url: super::env_or("EMBEDDING_SERVICE_URL", ""),
            image_ai_url: super::env_or("IMAGE_AI_URL", ""),
            frappe: FrappeConfig {
                base_url: std::env::var("FRAPPE_BASE_URL").ok(),
                api_key: std::env::var("FRAPPE_API_KEY").ok(),
                api_secret: std::env::var("FRAPPE_API_SECRET").ok(),
                issue_doctype: super::env_or("FRAPPE_ISSUE_DOCTYPE", "HD Ticket"),
                external_id_field: super::env_or("FRAPPE_EXTERNAL_ID_FIELD", "custom_conversation_id"),
            },
            llm: LlmConfig {
                api_key: super::env_or("OPENAI_API_KEY", ""),
                base_url: super::env_or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
                model: super::env_or("OPENAI_MODEL", "gpt-4o-mini"),
            },
        }
    }
}
