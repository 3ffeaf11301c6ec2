use std::fmt;
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VastError};

const IMAGE_MIME_FAMILY: &str = "image/";
const JAVASCRIPT_MIME: &str = "application/x-javascript";

/// The element a document author used to embed a creative
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
pub enum ResourceKind {
    StaticResource,
    IFrameResource,
    #[serde(rename = "HTMLResource")]
    HtmlResource,
    BlurredLastFrame,
}

impl ResourceKind {
    /// The element name used in VAST documents
    pub fn tag_name(self) -> &'static str {
        match self {
            ResourceKind::StaticResource => "StaticResource",
            ResourceKind::IFrameResource => "IFrameResource",
            ResourceKind::HtmlResource => "HTMLResource",
            ResourceKind::BlurredLastFrame => "BlurredLastFrame",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag_name())
    }
}

impl FromStr for ResourceKind {
    type Err = VastError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "StaticResource" => Ok(ResourceKind::StaticResource),
            "IFrameResource" => Ok(ResourceKind::IFrameResource),
            "HTMLResource" | "HtmlResource" => Ok(ResourceKind::HtmlResource),
            "BlurredLastFrame" => Ok(ResourceKind::BlurredLastFrame),
            other => Err(VastError::UnknownResourceKind(other.to_string())),
        }
    }
}

/// What a static resource actually contains
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
pub enum CreativeType {
    Image,
    JavaScript,
    None,
}

impl CreativeType {
    /// Map a declared `creativeType` attribute onto a creative type.
    ///
    /// Any `image/*` type is an image; only `application/x-javascript` counts
    /// as script. Anything else is unrecognized and yields `None` (the
    /// `Option`, not [`CreativeType::None`]).
    pub fn from_mime_hint(hint: &str) -> Option<CreativeType> {
        let hint = hint.trim().to_ascii_lowercase();
        if hint.contains(IMAGE_MIME_FAMILY) {
            Some(CreativeType::Image)
        } else if hint == JAVASCRIPT_MIME {
            Some(CreativeType::JavaScript)
        } else {
            None
        }
    }
}

impl fmt::Display for CreativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CreativeType::Image => "Image",
            CreativeType::JavaScript => "JavaScript",
            CreativeType::None => "None",
        };
        f.write_str(name)
    }
}

/// Narrow view of a parsed document: just enough to classify one resource.
///
/// Absence is reported as `None`; implementations never fail.
pub trait ResourceDocument {
    /// The raw markup or URL embedded with `kind`
    fn payload(&self, kind: ResourceKind) -> Option<&str>;

    /// The declared MIME type for `kind`. Only static and fallback kinds have one.
    fn creative_type_hint(&self, kind: ResourceKind) -> Option<&str>;
}

/// A classified creative resource, ready to be rendered at `width` x `height`
#[derive(Debug, Serialize, PartialEq, Eq, Clone)]
pub struct VastResource {
    payload: String,
    kind: ResourceKind,
    creative_type: CreativeType,
    width: u32,
    height: u32,
}

impl VastResource {
    /// Build a descriptor, rejecting kind/creative-type pairs that can never
    /// be rendered and empty payloads.
    pub fn new(
        payload: impl Into<String>,
        kind: ResourceKind,
        creative_type: CreativeType,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let payload = payload.into();
        if payload.is_empty() {
            return Err(VastError::MissingField(format!("{} payload", kind)));
        }
        if !is_consistent(kind, creative_type) {
            return Err(VastError::InconsistentResource {
                kind: kind.to_string(),
                creative_type: creative_type.to_string(),
            });
        }
        Ok(Self { payload, kind, creative_type, width, height })
    }

    /// Classify the resource `document` embeds with `kind`.
    ///
    /// Returns `None` when the payload is missing or empty, or when a static
    /// or fallback resource has no recognizable creative type.
    pub fn from_document<D>(document: &D, kind: ResourceKind, width: u32, height: u32) -> Option<Self>
    where
        D: ResourceDocument + ?Sized,
    {
        let payload = match document.payload(kind) {
            Some(payload) if !payload.is_empty() => payload,
            _ => {
                debug!("No {} payload in document", kind);
                return None;
            }
        };

        let creative_type = match kind {
            ResourceKind::IFrameResource | ResourceKind::HtmlResource => CreativeType::None,
            ResourceKind::StaticResource | ResourceKind::BlurredLastFrame => {
                let hint = document.creative_type_hint(kind);
                match hint.and_then(CreativeType::from_mime_hint) {
                    Some(creative_type) => creative_type,
                    None => {
                        debug!("Dropping {} with unusable creative type {:?}", kind, hint);
                        return None;
                    }
                }
            }
        };

        Some(Self {
            payload: payload.to_string(),
            kind,
            creative_type,
            width,
            height,
        })
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn creative_type(&self) -> CreativeType {
        self.creative_type
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

fn is_consistent(kind: ResourceKind, creative_type: CreativeType) -> bool {
    match kind {
        ResourceKind::IFrameResource | ResourceKind::HtmlResource => creative_type == CreativeType::None,
        ResourceKind::StaticResource | ResourceKind::BlurredLastFrame => creative_type != CreativeType::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreativeResources, FrameCapture, StaticResource};

    fn resources(
        static_resource: Option<&str>,
        creative_type: Option<&str>,
        iframe: Option<&str>,
        html: Option<&str>,
    ) -> CreativeResources {
        CreativeResources {
            static_resource: static_resource.map(|uri| StaticResource {
                creative_type: creative_type.map(str::to_string),
                uri: uri.to_string(),
            }),
            iframe_resource: iframe.map(str::to_string),
            html_resource: html.map(str::to_string),
        }
    }

    fn full(creative_type: Option<&str>) -> CreativeResources {
        resources(Some("StaticResource"), creative_type, Some("IFrameResource"), Some("HTMLResource"))
    }

    #[test]
    fn iframe_kind_reads_iframe_payload() {
        let resource = VastResource::from_document(&full(Some("image/jpeg")), ResourceKind::IFrameResource, 50, 100)
            .unwrap();

        assert_eq!(resource.payload(), "IFrameResource");
        assert_eq!(resource.kind(), ResourceKind::IFrameResource);
        assert_eq!(resource.creative_type(), CreativeType::None);
        assert_eq!((resource.width(), resource.height()), (50, 100));
    }

    #[test]
    fn html_kind_reads_html_payload() {
        let resource =
            VastResource::from_document(&full(Some("image/jpeg")), ResourceKind::HtmlResource, 50, 100).unwrap();

        assert_eq!(resource.payload(), "HTMLResource");
        assert_eq!(resource.kind(), ResourceKind::HtmlResource);
        assert_eq!(resource.creative_type(), CreativeType::None);
    }

    #[test]
    fn static_kind_with_image_type_is_image() {
        let resource =
            VastResource::from_document(&full(Some("image/jpeg")), ResourceKind::StaticResource, 50, 100).unwrap();

        assert_eq!(resource.payload(), "StaticResource");
        assert_eq!(resource.kind(), ResourceKind::StaticResource);
        assert_eq!(resource.creative_type(), CreativeType::Image);
    }

    #[test]
    fn static_kind_with_javascript_type_is_javascript() {
        let resource = VastResource::from_document(
            &full(Some("application/x-javascript")),
            ResourceKind::StaticResource,
            50,
            100,
        )
        .unwrap();

        assert_eq!(resource.payload(), "StaticResource");
        assert_eq!(resource.creative_type(), CreativeType::JavaScript);
    }

    #[test]
    fn static_kind_without_creative_type_is_absent() {
        assert!(VastResource::from_document(&full(None), ResourceKind::StaticResource, 50, 100).is_none());
    }

    #[test]
    fn static_kind_with_invalid_creative_type_is_absent() {
        let document = full(Some("INVALID_CREATIVE_TYPE"));
        assert!(VastResource::from_document(&document, ResourceKind::StaticResource, 50, 100).is_none());
    }

    #[test]
    fn empty_document_yields_nothing_for_any_kind() {
        let document = resources(None, None, None, None);
        for kind in [
            ResourceKind::StaticResource,
            ResourceKind::IFrameResource,
            ResourceKind::HtmlResource,
            ResourceKind::BlurredLastFrame,
        ] {
            assert!(VastResource::from_document(&document, kind, 50, 100).is_none(), "{kind}");
        }
    }

    #[test]
    fn empty_payload_is_treated_as_missing() {
        let document = resources(Some(""), Some("image/png"), Some(""), Some(""));
        assert!(VastResource::from_document(&document, ResourceKind::IFrameResource, 1, 1).is_none());
        assert!(VastResource::from_document(&document, ResourceKind::HtmlResource, 1, 1).is_none());
        assert!(VastResource::from_document(&document, ResourceKind::StaticResource, 1, 1).is_none());
    }

    #[test]
    fn blurred_last_frame_uses_fallback_field() {
        let capture = FrameCapture { uri: "file:///frame.png".into(), mime_type: "image/png".into() };

        let resource = VastResource::from_document(&capture, ResourceKind::BlurredLastFrame, 320, 180).unwrap();
        assert_eq!(resource.payload(), "file:///frame.png");
        assert_eq!(resource.creative_type(), CreativeType::Image);

        // the capture is not a primary resource
        assert!(VastResource::from_document(&capture, ResourceKind::StaticResource, 320, 180).is_none());
    }

    #[test]
    fn mime_hint_is_trimmed_and_case_insensitive() {
        assert_eq!(CreativeType::from_mime_hint(" IMAGE/PNG "), Some(CreativeType::Image));
        assert_eq!(CreativeType::from_mime_hint("application/x-javascript"), Some(CreativeType::JavaScript));
        assert_eq!(CreativeType::from_mime_hint("application/javascript"), None);
        assert_eq!(CreativeType::from_mime_hint(""), None);
    }

    #[test]
    fn constructor_enforces_kind_and_creative_type_pairs() {
        let resource = VastResource::new("resource", ResourceKind::StaticResource, CreativeType::Image, 50, 100).unwrap();
        assert_eq!(resource.payload(), "resource");
        assert_eq!(resource.kind(), ResourceKind::StaticResource);
        assert_eq!(resource.creative_type(), CreativeType::Image);

        assert!(matches!(
            VastResource::new("resource", ResourceKind::StaticResource, CreativeType::None, 50, 100),
            Err(VastError::InconsistentResource { .. })
        ));
        assert!(matches!(
            VastResource::new("resource", ResourceKind::HtmlResource, CreativeType::Image, 50, 100),
            Err(VastError::InconsistentResource { .. })
        ));
        assert!(matches!(
            VastResource::new("", ResourceKind::HtmlResource, CreativeType::None, 50, 100),
            Err(VastError::MissingField(_))
        ));
    }

    #[test]
    fn inconsistent_descriptor_refuses_to_render() {
        let resource = VastResource {
            payload: "resource".into(),
            kind: ResourceKind::StaticResource,
            creative_type: CreativeType::None,
            width: 50,
            height: 100,
        };
        let mut surface = String::new();

        assert!(matches!(resource.render(&mut surface), Err(VastError::InconsistentResource { .. })));
        assert!(surface.is_empty());
    }

    #[test]
    fn unknown_kind_name_fails_fast() {
        assert_eq!("HTMLResource".parse::<ResourceKind>().unwrap(), ResourceKind::HtmlResource);
        assert!(matches!(
            "VideoResource".parse::<ResourceKind>(),
            Err(VastError::UnknownResourceKind(name)) if name == "VideoResource"
        ));
    }
}
