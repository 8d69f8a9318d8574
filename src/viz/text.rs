//! Text measurement, truncation, and wrapping.
//!
//! Plotters has no text measuring on the `ab_glyph` path, so widths are estimated
//! from the character count.

/// Heuristic pixel width of `text` at `font_px`.
pub fn estimate_text_width_px(text: &str, font_px: u32) -> u32 {
    ((text.chars().count() as f32) * (font_px as f32) * 0.60).ceil() as u32
}

/// Largest number of characters that fit into `max_px`.
fn chars_fitting(font_px: u32, max_px: u32) -> usize {
    let per_char = (font_px as f32 * 0.60).max(1.0);
    (max_px as f32 / per_char + 1e-4).floor() as usize
}

/// Truncate to fit `max_px`, ending in a single ellipsis when cut.
pub fn truncate_to_width(text: &str, font_px: u32, max_px: u32) -> String {
    if estimate_text_width_px(text, font_px) <= max_px {
        return text.to_string();
    }
    let keep = chars_fitting(font_px, max_px).saturating_sub(1);
    if keep == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(keep).collect();
    out.push('…');
    out
}

/// Wrap on whitespace to lines no wider than `max_px`. Words longer than a line
/// are hard-broken by characters.
pub fn wrap_text_to_width(text: &str, font_px: u32, max_px: u32) -> Vec<String> {
    let per_line = chars_fitting(font_px, max_px).max(1);
    let mut lines: Vec<String> = Vec::new();
    let mut cur = String::new();

    for word in text.split_whitespace() {
        let needed = if cur.is_empty() {
            word.chars().count()
        } else {
            cur.chars().count() + 1 + word.chars().count()
        };
        if needed <= per_line {
            if !cur.is_empty() {
                cur.push(' ');
            }
            cur.push_str(word);
            continue;
        }
        if !cur.is_empty() {
            lines.push(std::mem::take(&mut cur));
        }
        let chars: Vec<char> = word.chars().collect();
        let mut chunks = chars.chunks(per_line).peekable();
        while let Some(chunk) = chunks.next() {
            let piece: String = chunk.iter().collect();
            if chunks.peek().is_some() {
                lines.push(piece);
            } else {
                cur = piece;
            }
        }
    }
    if !cur.is_empty() {
        lines.push(cur);
    }
    lines
}
