//! Deterministic pattern-based extractor. The design reference for the
//! backend strategy: both must produce the same record schema.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::{ExtractError, Extractor};
use crate::model::{
    InvolvedPerson, PoliceOccurrence, FACT_NOT_IDENTIFIED, NARRATIVE_NOT_FOUND, NOT_INFORMED,
};
use crate::text::{clean_cpf, clean_upper, collapse_ws};

/// Occurrence header: 5+ digit number (optional /year), separator text,
/// then a DD/MM/YYYY date. Each match opens a record block.
static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{5,}(?:/\d+)?)\s+.*?\s+(\d{2}/\d{2}/\d{4})").unwrap());

/// Optional header tail right after the date: time of day and unit suffix.
static HEADER_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d{2}:\d{2}:\d{2})").unwrap());
static HEADER_UNIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*-\s*(\S+)").unwrap());

/// Fact follows the first organizational-unit marker, up to end of line.
static FACT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:BPM|CIPM|PEL|CIA|UNIDADE)\s*[-–—:]?\s*([^\n\r]+)").unwrap()
});

/// Role keywords splitting the block into per-person segments.
static PERSON_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)ACUSADO|SUSPEITO|ENVOLVIDO|CONDUZIDO|AUTOR|INDICIADO|INFRATOR").unwrap()
});

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[:\-–]?\s*([^\n\r,;]{3,})").unwrap());
static LABEL_AS_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(CPF|MAE|DATA|NASC)").unwrap());
static CPF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:CPF|DOC)\s*[:\-–]?\s*([\d.\-]{11,15})").unwrap());
static BIRTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:NASC|NASCIMENTO|DATA\s+NASC|DN)\s*[:\-–]?\s*(\d{2}/\d{2}/\d{4})").unwrap()
});
static MOTHER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:MAE|GENITORA|FILIACAO)\s*[:\-–]?\s*([^\n\r,;]{3,})").unwrap()
});

/// Narrative opens with the locale-specific incident phrase and runs to the
/// end of the block (including any trailing LinkGeo reference).
static NARRATIVE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)No dia").unwrap());

const ESCALATION_MARKERS: &[&str] = &["EMBRIAGUEZ", "HOMICIDIO", "DROGAS", "ARMA"];

#[derive(Debug, Default, Clone)]
pub struct PatternExtractor;

impl PatternExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous core; the trait impl just wraps it.
    pub fn extract_sync(&self, text: &str) -> Vec<PoliceOccurrence> {
        let matches: Vec<_> = HEADER_RE.captures_iter(text).collect();
        if matches.is_empty() {
            debug!("no occurrence headers found in sub-batch text");
            return Vec::new();
        }

        let mut occurrences = Vec::new();
        for (i, caps) in matches.iter().enumerate() {
            let start = caps.get(0).unwrap().start();
            let end = matches
                .get(i + 1)
                .map(|next| next.get(0).unwrap().start())
                .unwrap_or(text.len());
            let block = &text[start..end];

            let upper = block.to_uppercase();
            let only_accident = upper.contains("ACIDENTE DE TRANSITO")
                && !ESCALATION_MARKERS.iter().any(|m| upper.contains(m));
            if only_accident {
                continue;
            }

            let header_end = caps.get(0).unwrap().end() - start;
            occurrences.push(PoliceOccurrence {
                id: compose_id(&caps[0], &block[header_end..]),
                date: caps[2].to_string(),
                fact: extract_fact(block),
                // non-crime blocks were filtered above, so the flag holds
                // by construction
                is_crime: true,
                narrative: extract_narrative(block),
                involved: extract_involved(block),
            });
        }

        occurrences
    }
}

impl Extractor for PatternExtractor {
    async fn extract(&self, text: &str) -> Result<Vec<PoliceOccurrence>, ExtractError> {
        Ok(self.extract_sync(text))
    }
}

/// Assemble the composite id: the matched "number - date" span, extended
/// with an immediately following HH:MM:SS and "- unit" token when present.
fn compose_id(header: &str, rest: &str) -> String {
    let mut id = collapse_ws(header);
    let mut rest = rest;
    if let Some(caps) = HEADER_TIME_RE.captures(rest) {
        id.push(' ');
        id.push_str(&caps[1]);
        rest = &rest[caps.get(0).unwrap().end()..];
    }
    if let Some(caps) = HEADER_UNIT_RE.captures(rest) {
        id.push_str(" - ");
        id.push_str(&caps[1]);
    }
    id
}

fn extract_fact(block: &str) -> String {
    match FACT_RE.captures(block) {
        Some(caps) => {
            let raw = caps[1].trim();
            // value ends at the first run of two-or-more spaces
            let value = raw.split("  ").next().unwrap_or(raw);
            clean_upper(value)
        }
        None => FACT_NOT_IDENTIFIED.to_string(),
    }
}

fn extract_involved(block: &str) -> Vec<InvolvedPerson> {
    let mut involved: Vec<InvolvedPerson> = Vec::new();

    // first split item is the text before any role keyword
    for segment in PERSON_SPLIT_RE.split(block).skip(1) {
        let Some(name_caps) = NAME_RE.captures(segment) else {
            continue;
        };
        let raw_name = name_caps[1].trim();
        if raw_name.len() < 3 || LABEL_AS_NAME_RE.is_match(raw_name) {
            continue;
        }
        let name = clean_upper(raw_name);
        if involved.iter().any(|p| p.name == name) {
            continue;
        }

        let cpf = CPF_RE
            .captures(segment)
            .and_then(|c| clean_cpf(&c[1]))
            .unwrap_or_else(|| NOT_INFORMED.to_string());
        let birth_date = BIRTH_RE
            .captures(segment)
            .map(|c| c[1].to_string())
            .unwrap_or_else(|| NOT_INFORMED.to_string());
        let mother_name = MOTHER_RE
            .captures(segment)
            .map(|c| clean_upper(&c[1]))
            .unwrap_or_else(|| NOT_INFORMED.to_string());

        involved.push(InvolvedPerson {
            name,
            cpf,
            birth_date,
            mother_name,
            condition: "Identificado".to_string(),
        });
    }

    involved
}

fn extract_narrative(block: &str) -> String {
    match NARRATIVE_RE.find(block) {
        Some(m) => block[m.start()..].trim().to_string(),
        None => NARRATIVE_NOT_FOUND.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
49294 - 20/12/2025 06:00:13 - 10BPM-19DEZ2025-03  \
10BPM - ROUBO DE VEICULO  \
ACUSADO: JOÃO DA SILVA, CPF: 123.456.789-01, NASC: 01/02/1990, MAE: MARIA DA SILVA\n\
SUSPEITO: PEDRO SOUZA\n\
No dia 20/12/2025, por volta das 06:00, policiais do 10BPM foram acionados. \
LinkGeo: https://maps.example/abc";

    fn extract(text: &str) -> Vec<PoliceOccurrence> {
        PatternExtractor::new().extract_sync(text)
    }

    #[test]
    fn composes_full_header_id() {
        let occ = extract(SAMPLE);
        assert_eq!(occ.len(), 1);
        assert_eq!(occ[0].id, "49294 - 20/12/2025 06:00:13 - 10BPM-19DEZ2025-03");
        assert_eq!(occ[0].date, "20/12/2025");
    }

    #[test]
    fn id_without_time_or_unit_tail() {
        let occ = extract("50001 - 03/01/2026 CIA - FURTO  No dia 03/01/2026 nada mais.");
        assert_eq!(occ[0].id, "50001 - 03/01/2026");
    }

    #[test]
    fn fact_follows_unit_marker_and_stops_at_double_space() {
        let occ = extract(
            "50000 - 20/12/2025 06:00:13  10BPM - ROUBO DE VEICULO  \
             No dia 20/12/2025 os fatos.",
        );
        assert_eq!(occ[0].fact, "ROUBO DE VEICULO");
        assert!(occ[0].is_crime);
    }

    #[test]
    fn unit_marker_inside_header_tail_shadows_the_fact() {
        // first marker hit wins, even when it sits inside the header's own
        // unit reference
        let occ = extract(SAMPLE);
        assert_eq!(occ[0].fact, "19DEZ2025-03");
    }

    #[test]
    fn missing_unit_marker_yields_fact_sentinel() {
        let occ = extract("50002 - 04/01/2026 texto sem marcador  No dia 04/01/2026 algo.");
        assert_eq!(occ[0].fact, FACT_NOT_IDENTIFIED);
    }

    #[test]
    fn involved_fields_and_sentinels() {
        let occ = extract(SAMPLE);
        let people = &occ[0].involved;
        assert_eq!(people.len(), 2);

        assert_eq!(people[0].name, "JOAO DA SILVA");
        assert_eq!(people[0].cpf, "12345678901");
        assert_eq!(people[0].birth_date, "01/02/1990");
        assert_eq!(people[0].mother_name, "MARIA DA SILVA");

        assert_eq!(people[1].name, "PEDRO SOUZA");
        assert_eq!(people[1].cpf, NOT_INFORMED);
        assert_eq!(people[1].birth_date, NOT_INFORMED);
        assert_eq!(people[1].mother_name, NOT_INFORMED);
    }

    #[test]
    fn duplicate_names_in_one_block_are_dropped() {
        let occ = extract(
            "50003 - 05/01/2026 10BPM - ROUBO  \
             ACUSADO: JOSÉ LIMA, CPF: 111.222.333-44 CONDUZIDO: JOSE LIMA\n\
             No dia 05/01/2026 os fatos.",
        );
        assert_eq!(occ[0].involved.len(), 1);
        assert_eq!(occ[0].involved[0].name, "JOSE LIMA");
    }

    #[test]
    fn field_label_captured_as_name_is_discarded() {
        let occ = extract(
            "50004 - 06/01/2026 10BPM - ROUBO  ENVOLVIDO CPF: 999.888.777-66 \
             No dia 06/01/2026 os fatos.",
        );
        assert!(occ[0].involved.is_empty());
    }

    #[test]
    fn narrative_runs_to_end_of_block_with_geolocation() {
        let occ = extract(SAMPLE);
        assert!(occ[0].narrative.starts_with("No dia 20/12/2025"));
        assert!(occ[0].narrative.ends_with("LinkGeo: https://maps.example/abc"));
    }

    #[test]
    fn narrative_sentinel_when_opening_phrase_absent() {
        let occ = extract("50005 - 07/01/2026 10BPM - FURTO  sem relato disponivel");
        assert_eq!(occ[0].narrative, NARRATIVE_NOT_FOUND);
    }

    #[test]
    fn accident_without_escalation_is_omitted() {
        let occ = extract(
            "50006 - 08/01/2026 10BPM - ACIDENTE DE TRANSITO  \
             No dia 08/01/2026 colisão sem vítimas.",
        );
        assert!(occ.is_empty());
    }

    #[test]
    fn accident_with_escalation_marker_is_kept() {
        let occ = extract(
            "50007 - 09/01/2026 10BPM - ACIDENTE DE TRANSITO COM EMBRIAGUEZ  \
             No dia 09/01/2026 condutor embriagado.",
        );
        assert_eq!(occ.len(), 1);
    }

    #[test]
    fn zero_headers_is_empty_not_error() {
        assert!(extract("texto qualquer sem cabeçalho").is_empty());
        assert!(extract("").is_empty());
    }

    #[test]
    fn consecutive_headers_split_into_blocks() {
        let occ = extract(
            "50008 - 10/01/2026 10BPM - ROUBO  No dia 10/01/2026 primeiro fato. \
             50009 - 11/01/2026 10BPM - FURTO  No dia 11/01/2026 segundo fato.",
        );
        assert_eq!(occ.len(), 2);
        assert!(occ[0].narrative.contains("primeiro fato"));
        assert!(!occ[0].narrative.contains("segundo fato"));
        assert!(occ[1].narrative.contains("segundo fato"));
    }
}
