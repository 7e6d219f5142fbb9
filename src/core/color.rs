//! Hex color values and the fixed-point alert blend.

#![allow(missing_docs)]

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, XsmonError};

/// Opaque color, `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Color with straight (non-premultiplied) alpha, `#RRGGBBAA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgb {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// TrueColor pixel value (`0x00RRGGBB`).
    #[must_use]
    pub const fn pixel(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }
}

impl Rgba {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Composite `accent` over `base`.
///
/// Each channel is `(fg * (a + 1) + bg * (255 - a)) >> 8`. The `+1` bias makes
/// a fully opaque accent reproduce itself exactly; alpha 0 leaves a black base
/// untouched. Callers depend on this exact integer result.
#[must_use]
pub fn blend(base: Rgb, accent: Rgba) -> Rgb {
    let alpha = u32::from(accent.a);
    let channel = |fg: u8, bg: u8| -> u8 {
        let mixed = (u32::from(fg) * (alpha + 1) + u32::from(bg) * (0xFF - alpha)) >> 8;
        // mixed <= 255 * 256 >> 8 == 255
        #[allow(clippy::cast_possible_truncation)]
        {
            mixed as u8
        }
    };
    Rgb::new(
        channel(accent.r, base.r),
        channel(accent.g, base.g),
        channel(accent.b, base.b),
    )
}

/// Normal and alert color pairs for one icon, derived once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub foreground: Rgb,
    pub background: Rgb,
    pub alert_foreground: Rgb,
    pub alert_background: Rgb,
}

impl Palette {
    #[must_use]
    pub fn new(foreground: Rgb, background: Rgb, alert: Rgba) -> Self {
        Self {
            foreground,
            background,
            alert_foreground: blend(foreground, alert),
            alert_background: blend(background, alert),
        }
    }

    /// `(foreground, background)` for the requested mode.
    #[must_use]
    pub const fn pair(&self, alert: bool) -> (Rgb, Rgb) {
        if alert {
            (self.alert_foreground, self.alert_background)
        } else {
            (self.foreground, self.background)
        }
    }
}

fn parse_hex(raw: &str, allowed: &[usize]) -> Result<Vec<u8>> {
    let invalid = |details: String| XsmonError::InvalidColor {
        value: raw.to_string(),
        details,
    };
    let digits = raw
        .trim()
        .strip_prefix('#')
        .ok_or_else(|| invalid("expected a leading '#'".to_string()))?;
    if !allowed.contains(&digits.len()) {
        return Err(invalid(format!(
            "expected {} hex digits, got {}",
            allowed
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" or "),
            digits.len()
        )));
    }
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid("contains non-hex characters".to_string()));
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&digits[i..i + 2], 16).map_err(|error| invalid(error.to_string()))
        })
        .collect()
}

impl FromStr for Rgb {
    type Err = XsmonError;

    fn from_str(raw: &str) -> Result<Self> {
        let bytes = parse_hex(raw, &[6])?;
        Ok(Self::new(bytes[0], bytes[1], bytes[2]))
    }
}

impl FromStr for Rgba {
    type Err = XsmonError;

    /// Six digits mean a fully opaque accent.
    fn from_str(raw: &str) -> Result<Self> {
        let bytes = parse_hex(raw, &[6, 8])?;
        Ok(Self::new(
            bytes[0],
            bytes[1],
            bytes[2],
            bytes.get(3).copied().unwrap_or(0xFF),
        ))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:02X}{:02X}{:02X}{:02X}",
            self.r, self.g, self.b, self.a
        )
    }
}

impl TryFrom<String> for Rgb {
    type Error = XsmonError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl TryFrom<String> for Rgba {
    type Error = XsmonError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

impl From<Rgba> for String {
    fn from(value: Rgba) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{Palette, Rgb, Rgba, blend};

    #[test]
    fn opaque_accent_over_black_yields_accent() {
        let out = blend(Rgb::new(0, 0, 0), "#FF0000FF".parse().unwrap());
        assert_eq!(out, Rgb::new(0xFF, 0, 0));
    }

    #[test]
    fn transparent_accent_over_black_is_unchanged() {
        let out = blend(Rgb::new(0, 0, 0), "#FF000000".parse().unwrap());
        assert_eq!(out, Rgb::new(0, 0, 0));
    }

    #[test]
    fn blend_keeps_the_plus_one_bias() {
        // 255 * (0xCC + 1) >> 8 == 204; 0x10 * (255 - 0xCC) >> 8 == 3
        let out = blend("#101114".parse().unwrap(), "#FF0000CC".parse().unwrap());
        assert_eq!(out.r, ((255 * 205 + 0x10 * 51) >> 8) as u8);
        assert_eq!(out.g, ((0x11 * 51) >> 8) as u8);
        assert_eq!(out.b, ((0x14 * 51) >> 8) as u8);
    }

    #[test]
    fn palette_derives_both_alert_colors() {
        let accent: Rgba = "#FF0000FF".parse().unwrap();
        let palette = Palette::new(Rgb::new(0, 0xFF, 0), Rgb::new(0, 0, 0), accent);
        assert_eq!(palette.pair(false), (Rgb::new(0, 0xFF, 0), Rgb::new(0, 0, 0)));
        assert_eq!(
            palette.pair(true),
            (Rgb::new(0xFF, 0, 0), Rgb::new(0xFF, 0, 0))
        );
    }

    #[test]
    fn parses_and_prints_hex() {
        let rgb: Rgb = "#8ae234".parse().unwrap();
        assert_eq!(rgb, Rgb::new(0x8A, 0xE2, 0x34));
        assert_eq!(rgb.to_string(), "#8AE234");
        assert_eq!(rgb.pixel(), 0x008A_E234);

        let opaque: Rgba = "#AD7FA8".parse().unwrap();
        assert_eq!(opaque.a, 0xFF);
        assert_eq!(opaque.to_string(), "#AD7FA8FF");
    }

    #[test]
    fn rejects_malformed_colors() {
        for raw in ["101114", "#10111", "#1011145", "#GG1114", "", "#"] {
            let err = raw.parse::<Rgb>().expect_err(raw);
            assert_eq!(err.code(), "XSM-1004", "{raw}");
        }
        assert!("#FF0000CC".parse::<Rgb>().is_err());
        assert!("#FF0000C".parse::<Rgba>().is_err());
    }

    #[test]
    fn serde_uses_hex_strings() {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Holder {
            color: Rgb,
        }
        let parsed: Holder = toml::from_str("color = \"#101114\"").unwrap();
        assert_eq!(parsed.color, Rgb::new(0x10, 0x11, 0x14));
        let out = toml::to_string(&parsed).unwrap();
        assert!(out.contains("\"#101114\""));
        assert!(toml::from_str::<Holder>("color = \"red\"").is_err());
    }
}
