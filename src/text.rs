//! Text normalization shared by the segmenter, the extractors and the renderer.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Strip diacritics, drop stray accent marks and upper-case.
///
/// Mirrors the canonical form the extraction backend is contractually
/// required to emit for names: "CAIXA ALTA SEM ACENTO".
pub fn clean_upper(text: &str) -> String {
    fold_diacritics(text).to_uppercase().trim().to_string()
}

/// NFD decomposition with combining marks and loose accent characters
/// dropped: "José" becomes "Jose" whether the input was precomposed or not.
pub fn fold_diacritics(text: &str) -> String {
    text.nfd()
        .filter(|&c| !is_combining_mark(c))
        .filter(|c| !matches!(c, '´' | '`' | '^' | '~'))
        .collect()
}

/// Keep only digits; if at least 11 remain, keep the last 11 (the CPF
/// proper, shedding any leading document prefix digits).
pub fn clean_cpf(text: &str) -> Option<String> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() >= 11 {
        Some(digits[digits.len() - 11..].to_string())
    } else if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}

/// Collapse any whitespace run to a single space and trim.
pub fn collapse_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
