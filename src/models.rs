use serde::{Deserialize, Serialize};

use crate::resource::{ResourceDocument, ResourceKind};

/// Represents a VAST document (Video Ad Serving Template)
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Vast {
    /// The VAST version (e.g., "2.0", "3.0", "4.0", etc.)
    pub version: String,

    /// The Ad elements within the VAST document
    pub ads: Vec<Ad>,
}

/// Represents an Ad within a VAST document
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct Ad {
    /// The ad ID
    pub id: Option<String>,

    /// The ad sequence number (for ad pods)
    pub sequence: Option<u32>,

    /// The in-line ad details
    pub inline: Option<InLine>,

    /// The wrapper ad details
    pub wrapper: Option<Wrapper>,
}

/// An InLine ad, carrying the creatives that can actually be displayed
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct InLine {
    pub ad_system: AdSystem,
    pub ad_title: String,
    pub creatives: Vec<Creative>,
}

/// A Wrapper ad. Its creatives only add to what the wrapped InLine declares,
/// so they are kept for callers but never resolved into displayable creatives.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct Wrapper {
    pub ad_system: AdSystem,

    /// The URL of the next VAST document
    pub vast_ad_tag_uri: String,

    pub creatives: Vec<Creative>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct AdSystem {
    pub name: String,
    pub version: Option<String>,
}

/// Represents a creative element
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct Creative {
    pub id: Option<String>,
    pub sequence: Option<u32>,
    pub ad_id: Option<String>,

    /// Linear ad details
    pub linear: Option<Linear>,

    /// Companions declared under `<CompanionAds>`
    pub companions: Vec<Companion>,

    /// Non-linear ads declared under `<NonLinearAds>`
    pub non_linears: Vec<NonLinear>,
}

/// Represents a linear ad
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct Linear {
    pub duration: Option<String>,

    /// `<VideoClicks><ClickThrough>`
    pub click_through: Option<String>,
}

/// Represents a companion ad
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct Companion {
    pub id: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub resources: CreativeResources,

    /// `<CompanionClickThrough>`
    pub click_through: Option<String>,
}

/// Represents a non-linear ad
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct NonLinear {
    pub id: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub resources: CreativeResources,

    /// `<NonLinearClickThrough>`
    pub click_through: Option<String>,
}

/// The resource elements a companion or non-linear may embed its creative with.
/// Any subset may be present; the classifier decides which one is usable.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct CreativeResources {
    pub static_resource: Option<StaticResource>,
    pub iframe_resource: Option<String>,
    pub html_resource: Option<String>,
}

/// `<StaticResource creativeType="...">`
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct StaticResource {
    /// The declared MIME type, e.g. "image/png"
    pub creative_type: Option<String>,
    pub uri: String,
}

impl ResourceDocument for CreativeResources {
    fn payload(&self, kind: ResourceKind) -> Option<&str> {
        match kind {
            ResourceKind::StaticResource => self.static_resource.as_ref().map(|r| r.uri.as_str()),
            ResourceKind::IFrameResource => self.iframe_resource.as_deref(),
            ResourceKind::HtmlResource => self.html_resource.as_deref(),
            ResourceKind::BlurredLastFrame => None,
        }
    }

    fn creative_type_hint(&self, kind: ResourceKind) -> Option<&str> {
        match kind {
            ResourceKind::StaticResource => self
                .static_resource
                .as_ref()
                .and_then(|r| r.creative_type.as_deref()),
            _ => None,
        }
    }
}

/// A last frame grabbed by the host's player, shown blurred once playback
/// ends and nothing better is available.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct FrameCapture {
    pub uri: String,
    pub mime_type: String,
}

impl ResourceDocument for FrameCapture {
    fn payload(&self, kind: ResourceKind) -> Option<&str> {
        match kind {
            ResourceKind::BlurredLastFrame => Some(self.uri.as_str()),
            _ => None,
        }
    }

    fn creative_type_hint(&self, kind: ResourceKind) -> Option<&str> {
        match kind {
            ResourceKind::BlurredLastFrame => Some(self.mime_type.as_str()),
            _ => None,
        }
    }
}

impl Vast {
    /// In-line ads in document order
    pub fn inline_ads(&self) -> impl Iterator<Item = (&Ad, &InLine)> {
        self.ads
            .iter()
            .filter_map(|ad| ad.inline.as_ref().map(|inline| (ad, inline)))
    }
}
