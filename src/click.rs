use crate::resource::{CreativeType, ResourceKind, VastResource};

impl VastResource {
    /// Whether a click on this resource is reported by the web surface it
    /// renders in. Images and the blurred last frame are drawn natively and
    /// never report clicks of their own.
    pub fn reports_own_clicks(&self) -> bool {
        !(self.creative_type() == CreativeType::Image || self.kind() == ResourceKind::BlurredLastFrame)
    }

    /// Pick the click-through URL that applies to this resource.
    ///
    /// `structured` comes from the VAST document, `web_embedded` from the
    /// creative's own markup. There is no fallback between the two: a missing
    /// preferred URL means no click-through. Empty strings count as missing.
    pub fn click_through_url<'a>(
        &self,
        structured: Option<&'a str>,
        web_embedded: Option<&'a str>,
    ) -> Option<&'a str> {
        let preferred = if self.reports_own_clicks() { web_embedded } else { structured };
        preferred.filter(|url| !url.is_empty())
    }
}
