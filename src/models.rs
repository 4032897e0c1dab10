use serde::{Deserialize, Serialize};

use crate::prompt::Feature;

pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout")]
    pub request_timeout: u64,
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    #[serde(default = "default_language")]
    pub default_language: String,
    #[serde(default = "default_feature")]
    pub default_feature: String,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

const fn default_timeout() -> u64 {
    600
}

fn default_languages() -> Vec<String> {
    [
        "English", "Hindi", "Spanish", "French", "German", "Bengali", "Tamil", "Japanese",
    ]
    .into_iter()
    .map(ToString::to_string)
    .collect()
}

fn default_language() -> String {
    "English".to_string()
}

fn default_feature() -> String {
    Feature::AskQuestion.id().to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_key: String::new(),
            model: default_model(),
            request_timeout: default_timeout(),
            languages: default_languages(),
            default_language: default_language(),
            default_feature: default_feature(),
        }
    }
}

impl AppConfig {
    /// The configured feature, or the first one if the id is unknown.
    pub fn initial_feature(&self) -> Feature {
        self.default_feature.parse().unwrap_or(Feature::AskQuestion)
    }

    /// Languages offered in the selector, always containing the default one.
    pub fn language_choices(&self) -> Vec<String> {
        let mut languages = self.languages.clone();
        if !languages.contains(&self.default_language) {
            languages.insert(0, self.default_language.clone());
        }
        languages
    }
}
