use crate::error::{Result, VastError};
use crate::models::*;
use log::warn;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::str::from_utf8;

const SUPPORTED_MAJOR_VERSIONS: [&str; 3] = ["2", "3", "4"];

/// Parse a VAST XML string into a Vast struct
pub fn parse_vast(xml: &str) -> Result<Vast> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut vast = Vast {
        version: String::new(),
        ads: Vec::new(),
    };

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"VAST" => {
                vast.version = attribute(e, b"version")
                    .ok_or_else(|| VastError::MissingField("VAST version".to_string()))?;
                check_version(&vast.version)?;

                vast.ads = parse_ads(&mut reader)?;
                break;
            }
            Ok(Event::Empty(ref e)) if e.name().as_ref() == b"VAST" => {
                // <VAST version="3.0"/> is the standard "no ad" response
                vast.version = attribute(e, b"version")
                    .ok_or_else(|| VastError::MissingField("VAST version".to_string()))?;
                check_version(&vast.version)?;
                break;
            }
            Ok(Event::Eof) => return Err(VastError::MissingField("VAST element".to_string())),
            Err(e) => return Err(VastError::XmlParseError(e)),
            _ => (),
        }
        buf.clear();
    }

    Ok(vast)
}

fn check_version(version: &str) -> Result<()> {
    let major = version.split('.').next().unwrap_or_default().trim();
    if SUPPORTED_MAJOR_VERSIONS.contains(&major) {
        Ok(())
    } else {
        Err(VastError::InvalidVersion(version.to_string()))
    }
}

/// Read an attribute value, unescaped. Malformed attributes are ignored.
fn attribute(start: &BytesStart, name: &[u8]) -> Option<String> {
    start
        .attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == name)
        .and_then(|attr| attr.unescape_value().ok().map(|value| value.into_owned()))
}

fn numeric_attribute(start: &BytesStart, name: &[u8]) -> Option<u32> {
    let value = attribute(start, name)?;
    match value.trim().parse::<u32>() {
        Ok(number) => Some(number),
        Err(_) => {
            warn!("Ignoring non-numeric {} attribute: {:?}", String::from_utf8_lossy(name), value);
            None
        }
    }
}

/// Parse Ad elements from the VAST XML
fn parse_ads(reader: &mut Reader<&[u8]>) -> Result<Vec<Ad>> {
    let mut ads = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"Ad" => {
                let ad = parse_ad_element(reader, e)?;
                ads.push(ad);
            }
            Ok(Event::Start(ref e)) => {
                skip_element(reader, e.name().as_ref())?;
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"VAST" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(VastError::XmlParseError(e)),
            _ => (),
        }
        buf.clear();
    }

    Ok(ads)
}

/// Parse a single Ad element
fn parse_ad_element(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<Ad> {
    let mut ad = Ad {
        id: attribute(start, b"id"),
        sequence: numeric_attribute(start, b"sequence"),
        inline: None,
        wrapper: None,
    };

    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"InLine" => {
                    ad.inline = Some(parse_inline_element(reader)?);
                }
                b"Wrapper" => {
                    ad.wrapper = Some(parse_wrapper_element(reader)?);
                }
                _ => {
                    skip_element(reader, e.name().as_ref())?;
                }
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"Ad" => break,
            Ok(Event::Eof) => return Err(unexpected_eof()),
            Err(e) => return Err(VastError::XmlParseError(e)),
            _ => (),
        }
        buf.clear();
    }

    Ok(ad)
}

/// Parse an InLine element
fn parse_inline_element(reader: &mut Reader<&[u8]>) -> Result<InLine> {
    let mut inline = InLine::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"AdSystem" => {
                    inline.ad_system = parse_ad_system(reader, e)?;
                }
                b"AdTitle" => {
                    inline.ad_title = read_text_element(reader)?;
                }
                b"Creatives" => {
                    inline.creatives = parse_creatives(reader)?;
                }
                _ => {
                    skip_element(reader, e.name().as_ref())?;
                }
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"InLine" => break,
            Ok(Event::Eof) => return Err(unexpected_eof()),
            Err(e) => return Err(VastError::XmlParseError(e)),
            _ => (),
        }
        buf.clear();
    }

    Ok(inline)
}

/// Parse a Wrapper element
fn parse_wrapper_element(reader: &mut Reader<&[u8]>) -> Result<Wrapper> {
    let mut wrapper = Wrapper::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"AdSystem" => {
                    wrapper.ad_system = parse_ad_system(reader, e)?;
                }
                b"VASTAdTagURI" => {
                    wrapper.vast_ad_tag_uri = read_text_element(reader)?;
                }
                b"Creatives" => {
                    wrapper.creatives = parse_creatives(reader)?;
                }
                _ => {
                    skip_element(reader, e.name().as_ref())?;
                }
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"Wrapper" => break,
            Ok(Event::Eof) => return Err(unexpected_eof()),
            Err(e) => return Err(VastError::XmlParseError(e)),
            _ => (),
        }
        buf.clear();
    }

    if wrapper.vast_ad_tag_uri.is_empty() {
        warn!("Wrapper without VASTAdTagURI");
    }

    Ok(wrapper)
}

fn unexpected_eof() -> VastError {
    VastError::Other("Unexpected end of file".to_string())
}

/// Read the content of an element whose start tag was just read.
///
/// Text and CDATA parts are concatenated and unescaped. When the element has
/// child elements, as an inline `<HTMLResource>` does, its inner markup is
/// returned as written instead.
fn read_text_element(reader: &mut Reader<&[u8]>) -> Result<String> {
    // Whitespace between inline tags is part of the markup
    reader.trim_text(false);
    let content = read_element_content(reader);
    reader.trim_text(true);
    content
}

fn read_element_content(reader: &mut Reader<&[u8]>) -> Result<String> {
    let decoder = reader.decoder();
    let mut text = String::new();
    let mut markup = String::new();
    let mut nested = false;
    let mut depth = 0usize;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Text(e)) => {
                text.push_str(&e.unescape()?);
                markup.push_str(&decoder.decode(&e)?);
            }
            Ok(Event::CData(e)) => match from_utf8(&e) {
                Ok(value) => {
                    text.push_str(value);
                    markup.push_str(value);
                }
                Err(_) => warn!("Dropping CDATA section that is not valid UTF-8"),
            },
            Ok(Event::Start(e)) => {
                nested = true;
                depth += 1;
                markup.push('<');
                markup.push_str(&decoder.decode(&e)?);
                markup.push('>');
            }
            Ok(Event::Empty(e)) => {
                nested = true;
                markup.push('<');
                markup.push_str(&decoder.decode(&e)?);
                markup.push_str("/>");
            }
            Ok(Event::End(e)) => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
                markup.push_str("</");
                markup.push_str(&decoder.decode(&e)?);
                markup.push('>');
            }
            Ok(Event::Eof) => return Err(unexpected_eof()),
            Err(e) => return Err(VastError::XmlParseError(e)),
            _ => (),
        }
        buf.clear();
    }

    let content = if nested { markup } else { text };
    Ok(content.trim().to_string())
}

/// Skip the rest of an element whose start tag was just read
fn skip_element(reader: &mut Reader<&[u8]>, name: &[u8]) -> Result<()> {
    let mut buf = Vec::new();
    let mut depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == name => depth += 1,
            Ok(Event::End(ref e)) if e.name().as_ref() == name => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            Ok(Event::Eof) => return Err(unexpected_eof()),
            Err(e) => return Err(VastError::XmlParseError(e)),
            _ => (),
        }
        buf.clear();
    }

    Ok(())
}

/// Parse AdSystem element
fn parse_ad_system(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<AdSystem> {
    Ok(AdSystem {
        version: attribute(start, b"version"),
        name: read_text_element(reader)?,
    })
}

/// Parse Creatives element
fn parse_creatives(reader: &mut Reader<&[u8]>) -> Result<Vec<Creative>> {
    let mut creatives = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"Creative" => {
                let creative = parse_creative(reader, e)?;
                creatives.push(creative);
            }
            Ok(Event::Start(ref e)) => {
                skip_element(reader, e.name().as_ref())?;
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"Creatives" => break,
            Ok(Event::Eof) => return Err(unexpected_eof()),
            Err(e) => return Err(VastError::XmlParseError(e)),
            _ => (),
        }
        buf.clear();
    }

    Ok(creatives)
}

/// Parse Creative element
fn parse_creative(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<Creative> {
    let mut creative = Creative {
        id: attribute(start, b"id"),
        sequence: numeric_attribute(start, b"sequence"),
        ad_id: attribute(start, b"adId").or_else(|| attribute(start, b"AdID")),
        ..Default::default()
    };

    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"Linear" => {
                    creative.linear = Some(parse_linear(reader)?);
                }
                b"CompanionAds" => {
                    creative.companions = parse_companion_ads(reader)?;
                }
                b"NonLinearAds" => {
                    creative.non_linears = parse_non_linear_ads(reader)?;
                }
                _ => {
                    skip_element(reader, e.name().as_ref())?;
                }
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"Creative" => break,
            Ok(Event::Eof) => return Err(unexpected_eof()),
            Err(e) => return Err(VastError::XmlParseError(e)),
            _ => (),
        }
        buf.clear();
    }

    Ok(creative)
}

/// Parse Linear element
fn parse_linear(reader: &mut Reader<&[u8]>) -> Result<Linear> {
    let mut linear = Linear::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"Duration" => {
                    linear.duration = Some(read_text_element(reader)?);
                }
                b"VideoClicks" => {
                    linear.click_through = parse_video_clicks(reader)?;
                }
                _ => {
                    skip_element(reader, e.name().as_ref())?;
                }
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"Linear" => break,
            Ok(Event::Eof) => return Err(unexpected_eof()),
            Err(e) => return Err(VastError::XmlParseError(e)),
            _ => (),
        }
        buf.clear();
    }

    Ok(linear)
}

/// Parse VideoClicks element, keeping only the ClickThrough
fn parse_video_clicks(reader: &mut Reader<&[u8]>) -> Result<Option<String>> {
    let mut click_through = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"ClickThrough" => {
                    click_through = non_empty(read_text_element(reader)?);
                }
                _ => {
                    skip_element(reader, e.name().as_ref())?;
                }
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"VideoClicks" => break,
            Ok(Event::Eof) => return Err(unexpected_eof()),
            Err(e) => return Err(VastError::XmlParseError(e)),
            _ => (),
        }
        buf.clear();
    }

    Ok(click_through)
}

/// Parse CompanionAds element
fn parse_companion_ads(reader: &mut Reader<&[u8]>) -> Result<Vec<Companion>> {
    let mut companions = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"Companion" => {
                let mut companion = Companion {
                    id: attribute(e, b"id"),
                    width: numeric_attribute(e, b"width"),
                    height: numeric_attribute(e, b"height"),
                    ..Default::default()
                };
                companion.click_through =
                    parse_resource_element(reader, b"Companion", b"CompanionClickThrough", &mut companion.resources)?;
                companions.push(companion);
            }
            Ok(Event::Start(ref e)) => {
                skip_element(reader, e.name().as_ref())?;
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"CompanionAds" => break,
            Ok(Event::Eof) => return Err(unexpected_eof()),
            Err(e) => return Err(VastError::XmlParseError(e)),
            _ => (),
        }
        buf.clear();
    }

    Ok(companions)
}

/// Parse NonLinearAds element
fn parse_non_linear_ads(reader: &mut Reader<&[u8]>) -> Result<Vec<NonLinear>> {
    let mut non_linears = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"NonLinear" => {
                let mut non_linear = NonLinear {
                    id: attribute(e, b"id"),
                    width: numeric_attribute(e, b"width"),
                    height: numeric_attribute(e, b"height"),
                    ..Default::default()
                };
                non_linear.click_through = parse_resource_element(
                    reader,
                    b"NonLinear",
                    b"NonLinearClickThrough",
                    &mut non_linear.resources,
                )?;
                non_linears.push(non_linear);
            }
            Ok(Event::Start(ref e)) => {
                skip_element(reader, e.name().as_ref())?;
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"NonLinearAds" => break,
            Ok(Event::Eof) => return Err(unexpected_eof()),
            Err(e) => return Err(VastError::XmlParseError(e)),
            _ => (),
        }
        buf.clear();
    }

    Ok(non_linears)
}

/// Read the resource children of a Companion or NonLinear element into
/// `resources` and return its click-through.
///
/// Only the first occurrence of each resource element is kept.
fn parse_resource_element(
    reader: &mut Reader<&[u8]>,
    element: &[u8],
    click_through_tag: &[u8],
    resources: &mut CreativeResources,
) -> Result<Option<String>> {
    let mut click_through = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = e.name();
                match name.as_ref() {
                    b"StaticResource" => {
                        let creative_type = attribute(e, b"creativeType");
                        let uri = read_text_element(reader)?;
                        if resources.static_resource.is_none() && !uri.is_empty() {
                            resources.static_resource = Some(StaticResource { creative_type, uri });
                        }
                    }
                    b"IFrameResource" => {
                        let uri = non_empty(read_text_element(reader)?);
                        resources.iframe_resource = resources.iframe_resource.take().or(uri);
                    }
                    b"HTMLResource" => {
                        let html = non_empty(read_text_element(reader)?);
                        resources.html_resource = resources.html_resource.take().or(html);
                    }
                    tag if tag == click_through_tag => {
                        click_through = non_empty(read_text_element(reader)?);
                    }
                    tag => {
                        skip_element(reader, tag)?;
                    }
                }
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == element => break,
            Ok(Event::Eof) => return Err(unexpected_eof()),
            Err(e) => return Err(VastError::XmlParseError(e)),
            _ => (),
        }
        buf.clear();
    }

    Ok(click_through)
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() { None } else { Some(text) }
}
