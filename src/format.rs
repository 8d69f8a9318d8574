//! Number formatting shared by tick labels, colorbars, and annotation legends.

use num_format::{Locale, ToFormattedString};
use serde::{Deserialize, Serialize};

/// How a raw value is turned into label text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ValueFormat {
    /// Rounded to 3 decimals, trailing zeros trimmed (`1234.5`).
    #[default]
    Plain,
    /// Rounded to 3 decimals with locale digit grouping (`1,234.5`).
    Grouped,
    /// Thousands with a `K` suffix (`12.3K`).
    Thousands,
    /// Millions with an `M` suffix (`2.5M`).
    Millions,
    /// Value already in percent units (`12.5%`).
    Percent,
}

impl ValueFormat {
    pub fn format(self, v: f64, locale: &Locale) -> String {
        match self {
            ValueFormat::Plain => trim_decimal(round_to(v, 3), 3),
            ValueFormat::Grouped => grouped(v, 3, locale),
            ValueFormat::Thousands => format!("{}K", trim_decimal(round_to(v / 1.0e3, 1), 1)),
            ValueFormat::Millions => format!("{}M", trim_decimal(round_to(v / 1.0e6, 2), 2)),
            ValueFormat::Percent => format!("{}%", trim_decimal(round_to(v, 1), 1)),
        }
    }
}

/// Map a user-provided locale tag to a `num_format::Locale`.
///
/// Supported tags (case-insensitive): `en`, `us`, `en_US`, `de`, `de_DE`, `german`,
/// `fr`, `es`, `it`, `pt`, `nl`. Defaults to English.
pub fn map_locale(tag: &str) -> &'static Locale {
    match tag.to_lowercase().as_str() {
        "de" | "de_de" | "german" => &Locale::de,
        "fr" | "fr_fr" => &Locale::fr,
        "es" | "es_es" => &Locale::es,
        "it" | "it_it" => &Locale::it,
        "pt" | "pt_pt" | "pt_br" => &Locale::pt,
        "nl" | "nl_nl" => &Locale::nl,
        _ => &Locale::en,
    }
}

/// Round half away from zero to `decimals` places.
pub fn round_to(v: f64, decimals: u32) -> f64 {
    let f = 10f64.powi(decimals as i32);
    (v * f).round() / f
}

/// Fixed-point text with trailing zeros (and a bare trailing dot) removed.
pub fn trim_decimal(v: f64, decimals: usize) -> String {
    let s = format!("{:.*}", decimals, v);
    let s = if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    };
    if s == "-0" { "0".to_string() } else { s }
}

/// Locale-grouped integer part plus up to `decimals` fractional digits.
pub fn grouped(v: f64, decimals: usize, locale: &Locale) -> String {
    let rounded = round_to(v, decimals as u32);
    let int_part = rounded.abs().trunc() as i64;
    let mut out = int_part.to_formatted_string(locale);

    let frac = trim_decimal(rounded.abs().fract(), decimals);
    if let Some(digits) = frac.strip_prefix("0.") {
        out.push_str(locale.decimal());
        out.push_str(digits);
    }
    if rounded < 0.0 && out.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.insert(0, '-');
    }
    out
}

/// Short point annotation used on area charts: value rounded to hundreds, then
/// whole thousands (`12_345` -> `~12K`).
pub fn approx_thousands(v: f64) -> String {
    let hundreds = (v / 100.0).round() * 100.0;
    format!("~{}K", (hundreds / 1000.0).floor() as i64)
}
