// Image-build collaborator: turns downloaded avatar bytes into a displayable
// handle.
//
// Vector decoding and rasterization belong to the host. What ships here is a
// header probe that accepts SVG documents and records their intrinsic size,
// enough for a terminal host to show that an avatar is present.

use std::sync::Arc;

use crate::error::LoadError;

/// Opaque, cheap-to-clone handle to a built avatar image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageHandle(Arc<ImageData>);

#[derive(Debug, PartialEq)]
struct ImageData {
    size: Option<(f32, f32)>,
    byte_len: usize,
}

impl ImageHandle {
    pub fn new(size: Option<(f32, f32)>, byte_len: usize) -> Self {
        ImageHandle(Arc::new(ImageData { size, byte_len }))
    }

    /// Intrinsic `(width, height)`, when the source declared one.
    pub fn size(&self) -> Option<(f32, f32)> {
        self.0.size
    }

    pub fn byte_len(&self) -> usize {
        self.0.byte_len
    }
}

/// Builds a displayable image from raw bytes. A failure counts as a retryable
/// attempt of the avatar job that produced the bytes.
pub trait ImageBuilder: Send + Sync {
    fn build(&self, bytes: &[u8]) -> Result<ImageHandle, LoadError>;
}

/// Accepts any UTF-8 document with an `<svg>` root element.
#[derive(Debug, Default, Clone, Copy)]
pub struct SvgHeaderProbe;

impl ImageBuilder for SvgHeaderProbe {
    fn build(&self, bytes: &[u8]) -> Result<ImageHandle, LoadError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| LoadError::Build(format!("avatar is not UTF-8: {e}")))?;
        let tag = svg_open_tag(text)
            .ok_or_else(|| LoadError::Build("no <svg> root element".to_string()))?;

        let width = attribute(tag, "width").and_then(parse_length);
        let height = attribute(tag, "height").and_then(parse_length);
        let size = match (width, height) {
            (Some(w), Some(h)) => Some((w, h)),
            _ => attribute(tag, "viewBox").and_then(view_box_size),
        };

        Ok(ImageHandle::new(size, bytes.len()))
    }
}

/// The text of the `<svg ...>` opening tag, without the angle brackets.
fn svg_open_tag(text: &str) -> Option<&str> {
    let mut search_from = 0;
    while let Some(found) = text[search_from..].find("<svg") {
        let start = search_from + found + 1;
        let after = text.as_bytes().get(start + 3).copied();
        if matches!(after, Some(b) if b.is_ascii_whitespace() || b == b'>' || b == b'/') {
            let end = text[start..].find('>')? + start;
            return Some(text[start..end].trim_end_matches('/'));
        }
        search_from = start;
    }
    None
}

/// Value of attribute `name` in an opening tag, quoted with `"` or `'`.
fn attribute<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let bytes = tag.as_bytes();
    let mut search_from = 0;
    while let Some(found) = tag[search_from..].find(name) {
        let start = search_from + found;
        search_from = start + name.len();

        let preceded_by_space = start > 0 && bytes[start - 1].is_ascii_whitespace();
        if !preceded_by_space {
            continue;
        }
        let rest = tag[search_from..].trim_start();
        let Some(rest) = rest.strip_prefix('=') else {
            continue;
        };
        let rest = rest.trim_start();
        let quote = rest.chars().next()?;
        if quote != '"' && quote != '\'' {
            continue;
        }
        let value = &rest[1..];
        let end = value.find(quote)?;
        return Some(&value[..end]);
    }
    None
}

fn parse_length(value: &str) -> Option<f32> {
    let trimmed = value.trim().trim_end_matches("px");
    trimmed.parse::<f32>().ok().filter(|v| v.is_finite() && *v > 0.0)
}

fn view_box_size(value: &str) -> Option<(f32, f32)> {
    let numbers: Vec<f32> = value
        .split(|c: char| c.is_ascii_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    match numbers.as_slice() {
        [_, _, w, h] if *w > 0.0 && *h > 0.0 => Some((*w, *h)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_reads_width_and_height() {
        let svg = br#"<?xml version="1.0"?>
<svg width="283.9" height="283.9" xmlns="http://www.w3.org/2000/svg">
  <line x1="1" y1="2" x2="3" y2="4" stroke-width="1"/>
</svg>"#;
        let handle = SvgHeaderProbe.build(svg).expect("valid svg");
        assert_eq!(handle.size(), Some((283.9, 283.9)));
        assert_eq!(handle.byte_len(), svg.len());
    }

    #[test]
    fn probe_falls_back_to_view_box() {
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 64 48"><g/></svg>"#;
        let handle = SvgHeaderProbe.build(svg).unwrap();
        assert_eq!(handle.size(), Some((64.0, 48.0)));
    }

    #[test]
    fn stroke_width_is_not_width() {
        let svg = br#"<svg stroke-width='2' height='10px' width='12px'></svg>"#;
        let handle = SvgHeaderProbe.build(svg).unwrap();
        assert_eq!(handle.size(), Some((12.0, 10.0)));
    }

    #[test]
    fn sizeless_svg_still_builds() {
        let handle = SvgHeaderProbe.build(b"<svg></svg>").unwrap();
        assert_eq!(handle.size(), None);
    }

    #[test]
    fn non_svg_is_build_error() {
        assert!(matches!(
            SvgHeaderProbe.build(b"<html><body/></html>"),
            Err(LoadError::Build(_))
        ));
        assert!(matches!(
            SvgHeaderProbe.build(b"<svgfoo/>"),
            Err(LoadError::Build(_))
        ));
        assert!(matches!(
            SvgHeaderProbe.build(&[0xc3, 0x28]),
            Err(LoadError::Build(_))
        ));
    }
}
