//! Text measurement and rasterization.
//!
//! The menu core only needs a small capability surface from its text
//! collaborator: pixel width of a string, a coverage mask for it, and the
//! font line height. [`TextShaper`] captures that surface; [`FontShaper`]
//! implements it with fontdue, applying pair kerning between glyphs.

use std::fs;
use std::path::{Path, PathBuf};

use fontdue::{Font, FontSettings};
use thiserror::Error;

use crate::draw::AlphaMask;

#[derive(Debug, Error)]
pub enum FontError {
    #[error("font not found: {0}")]
    NotFound(String),
    #[error("invalid font spec option: {0}")]
    InvalidSpec(String),
    #[error("failed to read font: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse font: {0}")]
    Parse(String),
}

/// Capability surface consumed by layout and drawing.
pub trait TextShaper {
    /// Advance width of `text` in pixels, kerning included.
    fn measure(&self, text: &str) -> i32;
    /// Line height in pixels; every labeled item is at least this tall.
    fn line_height(&self) -> i32;
    /// Rasterize `text` into a line-height-tall coverage mask.
    fn render(&self, text: &str) -> AlphaMask;
}

/// Fontdue-backed shaper.
#[derive(Debug)]
pub struct FontShaper {
    font: Font,
    px: f32,
}

impl FontShaper {
    /// Load a font from a spec string, `"file.ttf"` or `"file.ttf:size=12"`.
    ///
    /// The file is looked up in every `$FONTPATH` entry, then in the
    /// standard font directories (searched one level of subdirectories
    /// deep, as distro font packages install into per-family folders).
    pub fn from_spec(spec: &str) -> Result<Self, FontError> {
        let mut parts = spec.split(':');
        let name = parts.next().unwrap_or_default();
        let mut px = 12.0f32;
        for opt in parts {
            match opt.split_once('=') {
                Some(("size", v)) => {
                    px = v
                        .parse()
                        .map_err(|_| FontError::InvalidSpec(opt.to_string()))?;
                }
                // dpi/hinting options are accepted and ignored
                Some(("dpi", _)) | Some(("hinting", _)) => {}
                _ => return Err(FontError::InvalidSpec(opt.to_string())),
            }
        }

        let path =
            resolve_font(name).ok_or_else(|| FontError::NotFound(name.to_string()))?;
        Self::from_file(&path, px)
    }

    pub fn from_file(path: &Path, px: f32) -> Result<Self, FontError> {
        let bytes = fs::read(path)?;
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|e| FontError::Parse(e.to_string()))?;
        Ok(Self { font, px })
    }

    fn metrics(&self) -> fontdue::LineMetrics {
        // fontdue only returns None for fonts without horizontal metrics,
        // which cannot render menu labels anyway
        self.font
            .horizontal_line_metrics(self.px)
            .unwrap_or(fontdue::LineMetrics {
                ascent: self.px,
                descent: 0.0,
                line_gap: 0.0,
                new_line_size: self.px,
            })
    }
}

impl TextShaper for FontShaper {
    fn measure(&self, text: &str) -> i32 {
        let mut width = 0.0f32;
        let mut prev: Option<char> = None;
        for chr in text.chars() {
            if let Some(prev) = prev {
                width += self.font.horizontal_kern(prev, chr, self.px).unwrap_or(0.0);
            }
            width += self.font.metrics(chr, self.px).advance_width;
            prev = Some(chr);
        }
        width.ceil() as i32
    }

    fn line_height(&self) -> i32 {
        self.metrics().new_line_size.ceil() as i32
    }

    fn render(&self, text: &str) -> AlphaMask {
        let line = self.metrics();
        let mut mask = AlphaMask::new(self.measure(text), self.line_height());
        let ascent = line.ascent;

        let mut pen = 0.0f32;
        let mut prev: Option<char> = None;
        for chr in text.chars() {
            if let Some(prev) = prev {
                pen += self.font.horizontal_kern(prev, chr, self.px).unwrap_or(0.0);
            }
            let (metrics, bitmap) = self.font.rasterize(chr, self.px);
            let x0 = (pen + metrics.xmin as f32).round() as i32;
            let y0 = (ascent - metrics.height as f32 - metrics.ymin as f32).round() as i32;
            for row in 0..metrics.height as i32 {
                for col in 0..metrics.width as i32 {
                    let (x, y) = (x0 + col, y0 + row);
                    if x < 0 || y < 0 || x >= mask.width || y >= mask.height {
                        continue;
                    }
                    let src = bitmap[(row * metrics.width as i32 + col) as usize];
                    let dst = &mut mask.data[(y * mask.width + x) as usize];
                    *dst = (*dst).max(src);
                }
            }
            pen += metrics.advance_width;
            prev = Some(chr);
        }
        mask
    }
}

fn resolve_font(name: &str) -> Option<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();
    if let Ok(fontpath) = std::env::var("FONTPATH") {
        dirs.extend(fontpath.split(':').filter(|p| !p.is_empty()).map(PathBuf::from));
    }
    dirs.push(PathBuf::from("/usr/share/fonts"));
    dirs.push(PathBuf::from("/usr/local/share/fonts"));
    if let Ok(home) = std::env::var("HOME") {
        dirs.push(PathBuf::from(home).join(".local/share/fonts"));
    }

    for dir in dirs {
        let direct = dir.join(name);
        if direct.is_file() {
            return Some(direct);
        }
        // one level of per-family subdirectories
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let sub = entry.path().join(name);
            if sub.is_file() {
                return Some(sub);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_rejects_unknown_option() {
        let err = FontShaper::from_spec("whatever.ttf:bold=yes").unwrap_err();
        assert!(matches!(err, FontError::InvalidSpec(_)));
    }

    #[test]
    fn test_spec_rejects_bad_size() {
        let err = FontShaper::from_spec("whatever.ttf:size=big").unwrap_err();
        assert!(matches!(err, FontError::InvalidSpec(_)));
    }

    #[test]
    fn test_missing_font_is_not_found() {
        std::env::remove_var("FONTPATH");
        let err = FontShaper::from_spec("definitely-not-a-font-file.ttf").unwrap_err();
        assert!(matches!(err, FontError::NotFound(_)));
    }
}
