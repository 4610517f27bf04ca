//! Text normalization and the "human interpretable" heuristic

use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static PUNCTUATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r##"[\x{2000}-\x{206F}\x{2E00}-\x{2E7F}\\'!"#$%&£¢¥§€()*+,\-./:;<=>?@\[\]^_`{|}~±]"##).unwrap()
});

static EMOJI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\p{Extended_Pictographic}\x{FE0F}\x{200D}\x{20E3}\x{1F3FB}-\x{1F3FF}]").unwrap()
});

static NON_BMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\x{1D400}-\x{1D7FF}\x{10000}-\x{10FFFF}\x{E000}-\x{F8FF}\x{2190}-\x{21FF}\x{2600}-\x{27BF}]").unwrap()
});

/// Glyphs commonly used as stand-alone icons
const ICON_GLYPHS: &[&str] = &["x", "i", "×"];

/// Collapse whitespace (including no-break spaces) and trim
pub fn sanitize(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\u{a0}', " ");
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

pub fn remove_punctuation(text: &str) -> String {
    PUNCTUATION.replace_all(text, "").into_owned()
}

/// Which groups of code points [`remove_unicode`] strips
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnicodeFilter {
    pub emoji: bool,
    pub non_bmp: bool,
    pub punctuations: bool,
}

impl Default for UnicodeFilter {
    fn default() -> Self {
        Self {
            emoji: true,
            non_bmp: true,
            punctuations: false,
        }
    }
}

pub fn remove_unicode(text: &str, filter: UnicodeFilter) -> String {
    let mut out = text.to_string();
    if filter.emoji {
        out = EMOJI.replace_all(&out, "").into_owned();
    }
    if filter.non_bmp {
        out = NON_BMP.replace_all(&out, "").into_owned();
    }
    if filter.punctuations {
        out = remove_punctuation(&out);
    }
    out
}

/// Whether a label reads as words: 0 for empty, icon glyphs, punctuation
/// or symbol-only strings, 1 otherwise. Icon glyphs match exactly, so "I"
/// and " x " are words.
pub fn is_human_interpretable(text: &str) -> f64 {
    if text.is_empty() {
        return 0.0;
    }
    if ICON_GLYPHS.contains(&text) {
        return 0.0;
    }
    if sanitize(&remove_punctuation(text)).is_empty() {
        return 0.0;
    }
    if sanitize(&remove_unicode(text, UnicodeFilter::default())).is_empty() {
        return 0.0;
    }
    1.0
}

/// Space-separated tokens
pub fn token_list(value: &str) -> Vec<String> {
    value.split_ascii_whitespace().map(str::to_string).collect()
}
