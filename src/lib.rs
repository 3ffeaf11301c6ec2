pub mod click;
pub mod config;
pub mod creatives;
pub mod error;
pub mod invoke;
pub mod models;
pub mod parser;
pub mod render;
pub mod resource;

pub use error::{Result, VastError};
pub use render::DisplaySurface;
pub use resource::{CreativeType, ResourceDocument, ResourceKind, VastResource};

pub mod async_api {
    use crate::config::Settings;
    use crate::creatives::{self, CompanionCreative};
    use crate::error::Result;
    use crate::models::Vast;

    pub async fn parse_vast(xml: &str) -> Result<Vast> {
        // Parsing is CPU-bound, so we can just wrap the sync version
        crate::parser::parse_vast(xml)
    }

    /// Parse a document and classify its companion creatives
    pub async fn resolve_companions(xml: &str, settings: &Settings) -> Result<Vec<CompanionCreative>> {
        let vast = crate::parser::parse_vast(xml)?;
        Ok(creatives::resolve_companions(&vast, settings))
    }
}
