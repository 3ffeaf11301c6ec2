use log::{error, trace};

use crate::error::{Result, VastError};
use crate::resource::{CreativeType, ResourceKind, VastResource};

/// Whatever displays the creative. The engine only ever writes to it.
///
/// A surface that could not take the markup reports it, so the caller can
/// move on to another resource.
pub trait DisplaySurface {
    fn load_markup(&mut self, markup: &str) -> Result<()>;
}

impl DisplaySurface for String {
    fn load_markup(&mut self, markup: &str) -> Result<()> {
        self.clear();
        self.push_str(markup);
        Ok(())
    }
}

impl VastResource {
    /// The exact markup a surface should load for this resource
    pub fn markup(&self) -> Result<String> {
        let payload = self.payload();
        let markup = match (self.kind(), self.creative_type()) {
            (ResourceKind::IFrameResource, CreativeType::None) => format!(
                "<iframe frameborder=\"0\" scrolling=\"no\" marginheight=\"0\" marginwidth=\"0\" \
                 style=\"border: 0px; margin: 0px;\" width=\"{}\" height=\"{}\" src=\"{}\"></iframe>",
                self.width(),
                self.height(),
                payload
            ),
            (ResourceKind::HtmlResource, CreativeType::None) => payload.to_string(),
            (ResourceKind::StaticResource, CreativeType::Image)
            | (ResourceKind::BlurredLastFrame, CreativeType::Image) => payload.to_string(),
            (ResourceKind::StaticResource, CreativeType::JavaScript)
            | (ResourceKind::BlurredLastFrame, CreativeType::JavaScript) => {
                format!("<script src=\"{}\"></script>", payload)
            }
            (kind, creative_type) => {
                error!("Refusing to render {} with creative type {}", kind, creative_type);
                return Err(VastError::InconsistentResource {
                    kind: kind.to_string(),
                    creative_type: creative_type.to_string(),
                });
            }
        };
        Ok(markup)
    }

    /// Load this resource's markup into `surface`. Nothing is loaded when the
    /// descriptor is inconsistent; surface failures are passed through.
    pub fn render<S>(&self, surface: &mut S) -> Result<()>
    where
        S: DisplaySurface + ?Sized,
    {
        let markup = self.markup()?;
        trace!("Loading {} markup: {}", self.kind(), markup);
        surface.load_markup(&markup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSurface {
        loads: Vec<String>,
    }

    impl DisplaySurface for RecordingSurface {
        fn load_markup(&mut self, markup: &str) -> Result<()> {
            self.loads.push(markup.to_string());
            Ok(())
        }
    }

    fn rendered(kind: ResourceKind, creative_type: CreativeType) -> Vec<String> {
        let resource = VastResource::new("resource", kind, creative_type, 50, 100).unwrap();
        let mut surface = RecordingSurface::default();
        resource.render(&mut surface).unwrap();
        surface.loads
    }

    #[test]
    fn iframe_resource_loads_iframe_markup() {
        assert_eq!(
            rendered(ResourceKind::IFrameResource, CreativeType::None),
            vec![
                "<iframe frameborder=\"0\" scrolling=\"no\" marginheight=\"0\" marginwidth=\"0\" \
                 style=\"border: 0px; margin: 0px;\" width=\"50\" height=\"100\" src=\"resource\"></iframe>"
                    .to_string()
            ]
        );
    }

    #[test]
    fn html_resource_loads_payload() {
        assert_eq!(rendered(ResourceKind::HtmlResource, CreativeType::None), vec!["resource"]);
    }

    #[test]
    fn static_image_loads_payload() {
        assert_eq!(rendered(ResourceKind::StaticResource, CreativeType::Image), vec!["resource"]);
    }

    #[test]
    fn static_javascript_loads_script_tag() {
        assert_eq!(
            rendered(ResourceKind::StaticResource, CreativeType::JavaScript),
            vec!["<script src=\"resource\"></script>"]
        );
    }

    #[test]
    fn blurred_last_frame_image_loads_payload() {
        assert_eq!(rendered(ResourceKind::BlurredLastFrame, CreativeType::Image), vec!["resource"]);
    }

    #[test]
    fn blurred_last_frame_javascript_loads_script_tag() {
        assert_eq!(
            rendered(ResourceKind::BlurredLastFrame, CreativeType::JavaScript),
            vec!["<script src=\"resource\"></script>"]
        );
    }

    #[test]
    fn string_surface_keeps_last_load_only() {
        let mut surface = String::from("stale");
        VastResource::new("<p>ad</p>", ResourceKind::HtmlResource, CreativeType::None, 1, 1)
            .unwrap()
            .render(&mut surface)
            .unwrap();
        assert_eq!(surface, "<p>ad</p>");
    }

    struct DetachedSurface;

    impl DisplaySurface for DetachedSurface {
        fn load_markup(&mut self, _markup: &str) -> Result<()> {
            Err(VastError::Other("surface detached".into()))
        }
    }

    #[test]
    fn surface_failure_fails_render() {
        let resource = VastResource::new("<p>ad</p>", ResourceKind::HtmlResource, CreativeType::None, 1, 1).unwrap();
        let result = resource.render(&mut DetachedSurface);
        assert!(matches!(result, Err(VastError::Other(message)) if message == "surface detached"));
    }
}
