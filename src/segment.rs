//! Page segmentation: decides whether a decoded page starts a new occurrence.

use std::sync::LazyLock;

use regex::Regex;

use crate::text::clean_upper;

/// "4+ digit number - DD/MM/YYYY" anchored at the start of the cleaned page.
static OCCURRENCE_HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d{4,}\s*-\s*\d{2}/\d{2}/\d{4}").unwrap());

/// Letterhead phrases removed before testing for an occurrence header.
/// Compared against diacritic-stripped upper-case text.
const DEFAULT_BOILERPLATE: &[&str] = &[
    "RESERVADO",
    "GOVERNO DO ESTADO DO RIO DE JANEIRO",
    "SECRETARIA DE ESTADO DA POLICIA MILITAR",
    "SUBSECRETARIA DE INTELIGENCIA",
    "SUMARIO DE INFORMACOES",
];

/// Boilerplate list and header pattern kept as data so new document layouts
/// can be calibrated without touching the classification algorithm.
#[derive(Debug, Clone)]
pub struct SegmenterConfig {
    pub boilerplate: Vec<String>,
    pub header_pattern: Regex,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            boilerplate: DEFAULT_BOILERPLATE.iter().map(|s| s.to_string()).collect(),
            header_pattern: OCCURRENCE_HEADER_RE.clone(),
        }
    }
}

impl SegmenterConfig {
    /// Classify a single page independently of its neighbors: true iff,
    /// after normalizing and removing every known boilerplate phrase, the
    /// remaining text opens with an occurrence header.
    ///
    /// Known limitation: a start page preceded by leftover boilerplate not
    /// in the removal list reads as a continuation. That is accepted — the
    /// fix is extending `boilerplate`, not second-guessing the pattern.
    pub fn classify(&self, page_text: &str) -> bool {
        let mut cleaned = clean_upper(page_text);
        for phrase in &self.boilerplate {
            cleaned = cleaned.replace(phrase.as_str(), "");
        }
        self.header_pattern.is_match(cleaned.trim_start())
    }
}

/// Per-page plain text plus its boundary classification. Immutable once
/// produced; page numbers are 1-based and contiguous.
#[derive(Debug, Clone)]
pub struct DecodedPage {
    pub page_number: usize,
    pub text: String,
    pub is_occurrence_start: bool,
}

/// Annotate a sequence of raw page texts with boundary flags.
pub fn annotate_pages(config: &SegmenterConfig, texts: Vec<String>) -> Vec<DecodedPage> {
    texts
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            let is_occurrence_start = config.classify(&text);
            DecodedPage {
                page_number: i + 1,
                text,
                is_occurrence_start,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(text: &str) -> bool {
        SegmenterConfig::default().classify(text)
    }

    #[test]
    fn header_page_starts_occurrence() {
        assert!(classify(
            "49294 - 20/12/2025 06:00:13 - 10BPM-19DEZ2025-03 FATO: ROUBO DE VEICULO"
        ));
    }

    #[test]
    fn boilerplate_before_header_is_removed() {
        assert!(classify(
            "RESERVADO GOVERNO DO ESTADO DO RIO DE JANEIRO \
             SUMÁRIO DE INFORMAÇÕES 49294 - 20/12/2025 06:00:13 - 10BPM"
        ));
    }

    #[test]
    fn boilerplate_only_never_starts_occurrence() {
        assert!(!classify(
            "RESERVADO SECRETARIA DE ESTADO DA POLÍCIA MILITAR SUBSECRETARIA DE INTELIGÊNCIA"
        ));
        assert!(!classify(""));
    }

    #[test]
    fn continuation_text_is_not_a_start() {
        assert!(!classify("e o autor evadiu-se em seguida. Testemunha informou que..."));
        // date without the leading occurrence number
        assert!(!classify("no dia 20/12/2025 os policiais..."));
        // number too short
        assert!(!classify("123 - 20/12/2025 restante"));
    }

    #[test]
    fn unlisted_boilerplate_masks_header() {
        // Accepted false negative: an unknown banner ahead of the header.
        assert!(!classify("PAGINA 4 DE 90 49294 - 20/12/2025 06:00:13"));
    }

    #[test]
    fn annotate_numbers_pages_from_one() {
        let pages = annotate_pages(
            &SegmenterConfig::default(),
            vec!["49294 - 20/12/2025 resto".into(), "continuação".into()],
        );
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].page_number, 1);
        assert!(pages[0].is_occurrence_start);
        assert_eq!(pages[1].page_number, 2);
        assert!(!pages[1].is_occurrence_start);
    }
}
