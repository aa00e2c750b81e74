use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// An sRGB color with straight alpha, rendered as CSS `rgba(...)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ColorError {
    #[error("Unrecognized color {0:?}")]
    Unrecognized(String),
}

const NAMED_COLORS: &[(&str, (u8, u8, u8))] = &[
    ("black", (0, 0, 0)),
    ("white", (255, 255, 255)),
    ("red", (255, 0, 0)),
    ("green", (0, 128, 0)),
    ("lime", (0, 255, 0)),
    ("blue", (0, 0, 255)),
    ("yellow", (255, 255, 0)),
    ("orange", (255, 165, 0)),
    ("purple", (128, 0, 128)),
    ("magenta", (255, 0, 255)),
    ("fuchsia", (255, 0, 255)),
    ("cyan", (0, 255, 255)),
    ("aqua", (0, 255, 255)),
    ("pink", (255, 192, 203)),
    ("brown", (165, 42, 42)),
    ("gray", (128, 128, 128)),
    ("grey", (128, 128, 128)),
    ("navy", (0, 0, 128)),
    ("teal", (0, 128, 128)),
    ("olive", (128, 128, 0)),
    ("maroon", (128, 0, 0)),
    ("silver", (192, 192, 192)),
];

impl Rgba {
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Parse `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(...)`, `rgba(...)` or a
    /// basic CSS color name.
    pub fn parse(input: &str) -> Result<Self, ColorError> {
        let trimmed = input.trim();
        let unrecognized = || ColorError::Unrecognized(input.to_string());

        if let Some(hex) = trimmed.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(unrecognized);
        }

        if let Some(caps) = functional_regex().captures(trimmed) {
            let channel = |i: usize| caps[i].parse::<u8>().ok();
            let (r, g, b) = match (channel(1), channel(2), channel(3)) {
                (Some(r), Some(g), Some(b)) => (r, g, b),
                _ => return Err(unrecognized()),
            };
            let a = match caps.get(4) {
                Some(alpha) => alpha.as_str().parse::<f32>().map_err(|_| unrecognized())?,
                None => 1.0,
            };
            return Ok(Self::rgb(r, g, b).with_alpha(a));
        }

        let lower = trimmed.to_ascii_lowercase();
        NAMED_COLORS
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|&(_, (r, g, b))| Self::rgb(r, g, b))
            .ok_or_else(unrecognized)
    }

    /// Same color at the given opacity, clamped to `0.0..=1.0`
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            a: alpha.clamp(0.0, 1.0),
            ..self
        }
    }

    pub fn to_css(&self) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

impl FromStr for Rgba {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Re-render a CSS color at a new opacity
pub fn change_alpha(css: &str, alpha: f32) -> Result<String, ColorError> {
    Ok(Rgba::parse(css)?.with_alpha(alpha).to_css())
}

fn functional_regex() -> &'static Regex {
    static FUNCTIONAL: OnceLock<Regex> = OnceLock::new();
    FUNCTIONAL.get_or_init(|| {
        Regex::new(
            r"(?i)^rgba?\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*(?:,\s*([0-9]*\.?[0-9]+)\s*)?\)$",
        )
        .expect("Invalid rgba regex")
    })
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let pair = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);

    match hex.len() {
        3 => Some(Rgba::rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
        6 => Some(Rgba::rgb(pair(0)?, pair(2)?, pair(4)?)),
        8 => Some(Rgba::rgb(pair(0)?, pair(2)?, pair(4)?).with_alpha(f32::from(pair(6)?) / 255.0)),
        _ => None,
    }
}
