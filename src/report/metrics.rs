//! Helvetica width metrics for layout math. Values are AFM character
//! widths in 1/1000 em for the printable ASCII range; everything else is
//! approximated by its diacritic-stripped equivalent.

use crate::text::fold_diacritics;

pub const MM_TO_PT: f64 = 2.834_645_669;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontKind {
    Regular,
    Bold,
    Oblique,
}

#[rustfmt::skip]
const REGULAR: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

fn char_units(c: char, font: FontKind) -> u16 {
    let table = match font {
        FontKind::Bold => &BOLD,
        FontKind::Regular | FontKind::Oblique => &REGULAR,
    };
    if ('\u{20}'..='\u{7e}').contains(&c) {
        return table[c as usize - 0x20];
    }
    // accented letters measure like their base letter
    let folded = fold_diacritics(&c.to_string());
    match folded.chars().next() {
        Some(base) if ('\u{20}'..='\u{7e}').contains(&base) => table[base as usize - 0x20],
        _ => 556,
    }
}

/// Rendered width of `text` at `size_pt`, in points.
pub fn text_width_pt(text: &str, font: FontKind, size_pt: f64) -> f64 {
    let units: u32 = text.chars().map(|c| char_units(c, font) as u32).sum();
    units as f64 * size_pt / 1000.0
}

/// Same width expressed in millimeters, the layout engine's unit.
pub fn text_width_mm(text: &str, font: FontKind, size_pt: f64) -> f64 {
    text_width_pt(text, font, size_pt) / MM_TO_PT
}

/// Greedy word wrap to `max_width_mm`. Words wider than the limit get a
/// line of their own rather than being split.
pub fn wrap(
    text: &str,
    font: FontKind,
    size_pt: f64,
    max_width_mm: f64,
    first_line_indent_mm: f64,
) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut limit = max_width_mm - first_line_indent_mm;

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if current.is_empty() || text_width_mm(&candidate, font, size_pt) <= limit {
            current = candidate;
        } else {
            lines.push(std::mem::take(&mut current));
            limit = max_width_mm;
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
