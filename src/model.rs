//! Canonical record schema shared by both extraction strategies, plus the
//! cross-batch result set.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Placeholder for any person field that could not be located in source text.
pub const NOT_INFORMED: &str = "Não informado";
/// Placeholder fact when no unit marker is found in an occurrence block.
pub const FACT_NOT_IDENTIFIED: &str = "FATO NÃO IDENTIFICADO";
/// Placeholder narrative when the incident-opening phrase is absent.
pub const NARRATIVE_NOT_FOUND: &str = "NARRATIVA NÃO LOCALIZADA";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvolvedPerson {
    pub name: String,
    pub cpf: String,
    #[serde(default = "not_informed")]
    pub birth_date: String,
    #[serde(default = "not_informed")]
    pub mother_name: String,
    #[serde(default = "not_informed")]
    pub condition: String,
}

fn not_informed() -> String {
    NOT_INFORMED.to_string()
}

/// One self-contained incident record. `id` is the full composite header
/// ("number - datetime - unit/reference") and the natural dedup key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoliceOccurrence {
    pub id: String,
    pub date: String,
    pub fact: String,
    pub is_crime: bool,
    pub narrative: String,
    #[serde(default)]
    pub involved: Vec<InvolvedPerson>,
}

/// Merged records across all sub-batches, keyed by occurrence id.
/// Iteration order carries no meaning; consumers sort before rendering.
#[derive(Debug, Default)]
pub struct ResultSet {
    records: HashMap<String, PoliceOccurrence>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite by id. Later sub-batches win over earlier
    /// duplicates, which makes repeated merges idempotent.
    pub fn merge(&mut self, records: Vec<PoliceOccurrence>) {
        for record in records {
            self.records.insert(record.id.clone(), record);
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records sorted by id, for deterministic downstream output.
    pub fn sorted(&self) -> Vec<PoliceOccurrence> {
        let mut out: Vec<_> = self.records.values().cloned().collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    #[cfg(test)]
    pub fn get(&self, id: &str) -> Option<&PoliceOccurrence> {
        self.records.get(id)
    }
}

/// Level of detail for the generated report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportSubType {
    /// Person data plus the full narrative.
    Complete,
    /// Names and identifiers only; narratives omitted.
    PersonalDataOnly,
}

/// Per-render styling knobs. Pure value object, supplied on each call.
#[derive(Debug, Clone)]
pub struct StyleConfig {
    pub separator_color: String,
    pub data_color: String,
    pub data_bold: bool,
    pub fact_color: String,
    pub fact_bold: bool,
    pub report_sub_type: ReportSubType,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            separator_color: "#000000".to_string(),
            data_color: "#FF0000".to_string(),
            data_bold: true,
            fact_color: "#0000FF".to_string(),
            fact_bold: true,
            report_sub_type: ReportSubType::Complete,
        }
    }
}

#[cfg(test)]
pub fn occurrence(id: &str, fact: &str) -> PoliceOccurrence {
    PoliceOccurrence {
        id: id.to_string(),
        date: "01/01/2024".to_string(),
        fact: fact.to_string(),
        is_crime: true,
        narrative: "No dia 01/01/2024 os fatos ocorreram. LinkGeo: https://maps.example/x"
            .to_string(),
        involved: Vec::new(),
    }
}
