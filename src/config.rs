use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::Result;
use crate::resource::ResourceKind;

/// Settings for selecting and rendering creatives
#[derive(Debug, Deserialize, PartialEq, Clone)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Render width used when a companion does not declare one
    pub width: u32,

    /// Render height used when a companion does not declare one
    pub height: u32,

    /// Order in which resource kinds are tried for each companion
    pub kind_priority: Vec<ResourceKind>,

    /// Click-through reported by the creative's own markup, if any
    pub web_click_through: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            width: 320,
            height: 50,
            kind_priority: vec![
                ResourceKind::StaticResource,
                ResourceKind::HtmlResource,
                ResourceKind::IFrameResource,
            ],
            web_click_through: None,
        }
    }
}

impl Settings {
    /// Parse settings from a JSON string; omitted fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load settings from a JSON file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}
