use log::debug;
use serde::Serialize;

use crate::config::Settings;
use crate::models::{FrameCapture, Vast};
use crate::resource::{ResourceDocument, ResourceKind, VastResource};

/// Where in the document a creative was declared
#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
pub enum Placement {
    Companion,
    NonLinear,
}

/// A companion or non-linear creative that can be rendered
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct CompanionCreative {
    pub ad_id: Option<String>,
    pub element_id: Option<String>,
    pub placement: Placement,
    pub resource: VastResource,

    /// The click-through declared in the document for this element
    pub click_through: Option<String>,
}

impl CompanionCreative {
    /// Resolve the click-through against whatever the creative's markup reported
    pub fn click_through_url<'a>(&'a self, web_embedded: Option<&'a str>) -> Option<&'a str> {
        self.resource
            .click_through_url(self.click_through.as_deref(), web_embedded)
    }
}

/// Return the first kind in `priority` that `document` can represent
pub fn select_resource<D>(
    document: &D,
    priority: &[ResourceKind],
    width: u32,
    height: u32,
) -> Option<VastResource>
where
    D: ResourceDocument + ?Sized,
{
    priority
        .iter()
        .find_map(|&kind| VastResource::from_document(document, kind, width, height))
}

/// Classify every companion and non-linear of every in-line ad.
///
/// Elements with nothing representable are skipped; their siblings are still
/// processed. Wrapper creatives are not resolved: they only decorate the
/// in-line ad the wrapper points at, which lives in another document.
pub fn resolve_companions(vast: &Vast, settings: &Settings) -> Vec<CompanionCreative> {
    let mut creatives = Vec::new();

    for (ad, inline) in vast.inline_ads() {
        for creative in &inline.creatives {
            let elements = creative
                .companions
                .iter()
                .map(|c| (Placement::Companion, &c.id, c.width, c.height, &c.resources, &c.click_through))
                .chain(
                    creative
                        .non_linears
                        .iter()
                        .map(|n| (Placement::NonLinear, &n.id, n.width, n.height, &n.resources, &n.click_through)),
                );

            for (placement, id, width, height, resources, click_through) in elements {
                let width = width.unwrap_or(settings.width);
                let height = height.unwrap_or(settings.height);

                match select_resource(resources, &settings.kind_priority, width, height) {
                    Some(resource) => creatives.push(CompanionCreative {
                        ad_id: ad.id.clone(),
                        element_id: id.clone(),
                        placement,
                        resource,
                        click_through: click_through.clone(),
                    }),
                    None => debug!("Skipping {:?} {:?} of ad {:?}: no usable resource", placement, id, ad.id),
                }
            }
        }
    }

    creatives
}

/// The blurred last frame shown once playback ends without a companion
pub fn blurred_last_frame(capture: &FrameCapture, width: u32, height: u32) -> Option<VastResource> {
    VastResource::from_document(capture, ResourceKind::BlurredLastFrame, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Ad, Companion, Creative, CreativeResources, InLine, NonLinear, StaticResource, Wrapper};
    use crate::resource::CreativeType;

    fn static_image(uri: &str) -> CreativeResources {
        CreativeResources {
            static_resource: Some(StaticResource { creative_type: Some("image/png".into()), uri: uri.into() }),
            ..Default::default()
        }
    }

    fn document(creative: Creative) -> Vast {
        Vast {
            version: "3.0".into(),
            ads: vec![Ad {
                id: Some("ad-1".into()),
                inline: Some(InLine { creatives: vec![creative], ..Default::default() }),
                ..Default::default()
            }],
        }
    }

    #[test]
    fn priority_order_decides_between_resources() {
        let resources = CreativeResources {
            html_resource: Some("<b>html</b>".into()),
            ..static_image("https://cdn.example.com/a.png")
        };

        let first = select_resource(&resources, &Settings::default().kind_priority, 300, 250).unwrap();
        assert_eq!(first.kind(), ResourceKind::StaticResource);

        let html_first = select_resource(
            &resources,
            &[ResourceKind::HtmlResource, ResourceKind::StaticResource],
            300,
            250,
        )
        .unwrap();
        assert_eq!(html_first.kind(), ResourceKind::HtmlResource);
    }

    #[test]
    fn unusable_static_falls_through_to_next_kind() {
        let resources = CreativeResources {
            static_resource: Some(StaticResource { creative_type: None, uri: "a.png".into() }),
            iframe_resource: Some("https://example.com/frame".into()),
            ..Default::default()
        };

        let resource = select_resource(&resources, &Settings::default().kind_priority, 300, 250).unwrap();
        assert_eq!(resource.kind(), ResourceKind::IFrameResource);
    }

    #[test]
    fn companions_use_own_size_and_skip_unusable_siblings() {
        let vast = document(Creative {
            companions: vec![
                Companion {
                    id: Some("empty".into()),
                    width: Some(300),
                    height: Some(250),
                    ..Default::default()
                },
                Companion {
                    id: Some("banner".into()),
                    width: Some(300),
                    height: Some(250),
                    resources: static_image("https://cdn.example.com/banner.png"),
                    click_through: Some("https://advertiser.example.com".into()),
                },
            ],
            non_linears: vec![NonLinear {
                id: Some("overlay".into()),
                resources: CreativeResources { html_resource: Some("<div>overlay</div>".into()), ..Default::default() },
                ..Default::default()
            }],
            ..Default::default()
        });

        let creatives = resolve_companions(&vast, &Settings::default());
        assert_eq!(creatives.len(), 2);

        let banner = &creatives[0];
        assert_eq!(banner.element_id.as_deref(), Some("banner"));
        assert_eq!(banner.ad_id.as_deref(), Some("ad-1"));
        assert_eq!(banner.placement, Placement::Companion);
        assert_eq!((banner.resource.width(), banner.resource.height()), (300, 250));
        assert_eq!(banner.click_through_url(Some("web")), Some("https://advertiser.example.com"));

        let overlay = &creatives[1];
        assert_eq!(overlay.placement, Placement::NonLinear);
        assert_eq!((overlay.resource.width(), overlay.resource.height()), (320, 50));
        assert_eq!(overlay.click_through_url(None), None);
    }

    #[test]
    fn wrapper_creatives_are_not_resolved() {
        let companion = |id: &str| Companion {
            id: Some(id.into()),
            resources: static_image("https://cdn.example.com/banner.png"),
            ..Default::default()
        };
        let mut vast = document(Creative { companions: vec![companion("inline")], ..Default::default() });
        vast.ads.insert(
            0,
            Ad {
                id: Some("wrapped".into()),
                wrapper: Some(Wrapper {
                    vast_ad_tag_uri: "https://ads.example.com/next.xml".into(),
                    creatives: vec![Creative { companions: vec![companion("wrapper")], ..Default::default() }],
                    ..Default::default()
                }),
                ..Default::default()
            },
        );

        let creatives = resolve_companions(&vast, &Settings::default());

        assert_eq!(creatives.len(), 1);
        assert_eq!(creatives[0].element_id.as_deref(), Some("inline"));
        assert_eq!(creatives[0].ad_id.as_deref(), Some("ad-1"));
    }

    #[test]
    fn blurred_last_frame_from_capture() {
        let capture = FrameCapture { uri: "file:///tmp/last.jpg".into(), mime_type: "image/jpeg".into() };
        let resource = blurred_last_frame(&capture, 640, 360).unwrap();

        assert_eq!(resource.creative_type(), CreativeType::Image);
        assert_eq!(resource.markup().unwrap(), "file:///tmp/last.jpg");
        assert_eq!(resource.click_through_url(Some("xml"), Some("web")), Some("xml"));
    }
}
