//! Pure layout: turns records into positioned page operations, in
//! millimeters on A4, top-down. No PDF types here, which keeps pagination
//! and justification testable without parsing output bytes.

use crate::model::{PoliceOccurrence, ReportSubType, StyleConfig, NARRATIVE_NOT_FOUND, NOT_INFORMED};
use crate::report::metrics::{text_width_mm, wrap, FontKind};
use crate::text::{clean_upper, collapse_ws};

pub const PAGE_W: f64 = 210.0;
pub const PAGE_H: f64 = 297.0;
const MARGIN: f64 = 15.0;
const BODY_PT: f64 = 11.0;
const NOTE_PT: f64 = 9.0;
const LINE_H: f64 = 6.0;
const START_Y: f64 = 25.0;
const BOTTOM_LIMIT: f64 = PAGE_H - 20.0;
const NARRATIVE_INDENT: f64 = 15.0;
const BODY_W: f64 = PAGE_W - 2.0 * MARGIN;

const CLASSIFICATION: &str = "RESERVADO";
const CLASSIFICATION_COLOR: &str = "#FF0000";
const INK: &str = "#000000";

const OMISSION_NOTE: &str =
    "Dados pessoais omitidos para ocorrências não classificadas como crime.";

#[derive(Debug, Clone)]
pub struct TextOp {
    pub x_mm: f64,
    pub y_mm: f64,
    pub text: String,
    pub font: FontKind,
    pub size_pt: f64,
    pub color: String,
}

#[derive(Debug, Clone)]
pub struct RuleOp {
    pub x1_mm: f64,
    pub y_mm: f64,
    pub x2_mm: f64,
    pub width_mm: f64,
    pub color: String,
}

#[derive(Debug, Clone)]
pub enum PageOp {
    Text(TextOp),
    Rule(RuleOp),
}

#[derive(Debug)]
pub struct Layout {
    pub pages: Vec<Vec<PageOp>>,
}

/// Lay out the full report. Records are rendered in the order given.
pub fn layout_report(records: &[PoliceOccurrence], style: &StyleConfig) -> Layout {
    let mut engine = Engine::new(style);
    for record in records {
        engine.record(record);
    }
    engine.finish()
}

struct Engine<'a> {
    style: &'a StyleConfig,
    pages: Vec<Vec<PageOp>>,
    ops: Vec<PageOp>,
    y: f64,
}

impl<'a> Engine<'a> {
    fn new(style: &'a StyleConfig) -> Self {
        let mut engine = Self {
            style,
            pages: Vec::new(),
            ops: Vec::new(),
            y: START_Y,
        };
        engine.markings();
        engine
    }

    /// Classification banner top and bottom of every page.
    fn markings(&mut self) {
        let w = text_width_mm(CLASSIFICATION, FontKind::Bold, BODY_PT);
        for y in [15.0, PAGE_H - 10.0] {
            self.ops.push(PageOp::Text(TextOp {
                x_mm: (PAGE_W - w) / 2.0,
                y_mm: y,
                text: CLASSIFICATION.to_string(),
                font: FontKind::Bold,
                size_pt: BODY_PT,
                color: CLASSIFICATION_COLOR.to_string(),
            }));
        }
    }

    fn ensure(&mut self, needed_mm: f64) {
        if self.y + needed_mm > BOTTOM_LIMIT {
            self.pages.push(std::mem::take(&mut self.ops));
            self.markings();
            self.y = START_Y;
        }
    }

    fn text(&mut self, x: f64, text: &str, font: FontKind, size_pt: f64, color: &str) {
        self.ops.push(PageOp::Text(TextOp {
            x_mm: x,
            y_mm: self.y,
            text: text.to_string(),
            font,
            size_pt,
            color: color.to_string(),
        }));
    }

    fn record(&mut self, record: &PoliceOccurrence) {
        self.ensure(40.0);
        self.text(MARGIN, &record.id, FontKind::Bold, BODY_PT, INK);
        self.y += 10.0;

        let label = "FATO: ";
        self.text(MARGIN, label, FontKind::Bold, BODY_PT, INK);
        let fact_font = if self.style.fact_bold {
            FontKind::Bold
        } else {
            FontKind::Regular
        };
        let x = MARGIN + text_width_mm(label, FontKind::Bold, BODY_PT);
        let fact_color = self.style.fact_color.clone();
        self.text(x, &clean_upper(&record.fact), fact_font, BODY_PT, &fact_color);
        self.y += 10.0;

        if record.is_crime {
            self.persons(record);
        } else {
            self.ensure(8.0);
            self.text(MARGIN, OMISSION_NOTE, FontKind::Oblique, NOTE_PT, INK);
            self.y += 8.0;
        }

        if self.style.report_sub_type == ReportSubType::Complete {
            self.narrative(&record.narrative);
        }

        self.y += 5.0;
        self.ensure(10.0);
        self.ops.push(PageOp::Rule(RuleOp {
            x1_mm: MARGIN,
            y_mm: self.y,
            x2_mm: PAGE_W - MARGIN,
            width_mm: 0.8,
            color: self.style.separator_color.clone(),
        }));
        self.y += 15.0;
    }

    fn persons(&mut self, record: &PoliceOccurrence) {
        if record.involved.is_empty() {
            // keep the layout shape even when nobody was identified
            self.ensure(35.0);
            self.person_rows(None);
            return;
        }

        for (i, person) in record.involved.iter().enumerate() {
            self.ensure(35.0);
            self.text(MARGIN, &format!("{}.", i + 1), FontKind::Bold, BODY_PT, INK);
            self.person_rows(Some(person));
        }
    }

    fn person_rows(&mut self, person: Option<&crate::model::InvolvedPerson>) {
        let base_y = self.y;
        let rows: [(&str, &str); 4] = match person {
            Some(p) => [
                ("NOME: ", p.name.as_str()),
                ("CPF: ", p.cpf.as_str()),
                ("DATA DE NASC: ", p.birth_date.as_str()),
                ("NOME DA MAE: ", p.mother_name.as_str()),
            ],
            None => [
                ("NOME: ", ""),
                ("CPF: ", ""),
                ("DATA DE NASC: ", ""),
                ("NOME DA MAE: ", ""),
            ],
        };
        for (row, (label, value)) in rows.iter().enumerate() {
            self.y = base_y + row as f64 * LINE_H;
            self.data_row(MARGIN + 10.0, label, value);
        }
        self.y = base_y + 28.0;
    }

    fn data_row(&mut self, x: f64, label: &str, value: &str) {
        self.text(x, label, FontKind::Regular, BODY_PT, INK);
        let value_x = x + text_width_mm(label, FontKind::Regular, BODY_PT);
        if is_missing(value) {
            self.text(value_x, NOT_INFORMED, FontKind::Oblique, BODY_PT, INK);
        } else {
            let font = if self.style.data_bold {
                FontKind::Bold
            } else {
                FontKind::Regular
            };
            let data_color = self.style.data_color.clone();
            self.text(value_x, &clean_upper(value), font, BODY_PT, &data_color);
        }
    }

    fn narrative(&mut self, narrative: &str) {
        let mut text = collapse_ws(narrative);
        if text.is_empty() {
            text = NARRATIVE_NOT_FOUND.to_string();
        }
        let lines = wrap(&text, FontKind::Regular, BODY_PT, BODY_W, NARRATIVE_INDENT);
        let last = lines.len().saturating_sub(1);

        for (i, line) in lines.iter().enumerate() {
            self.ensure(LINE_H);
            let x = if i == 0 { MARGIN + NARRATIVE_INDENT } else { MARGIN };
            let width = if i == 0 { BODY_W - NARRATIVE_INDENT } else { BODY_W };
            if i < last {
                self.justified_line(line, x, width);
            } else {
                self.text(x, line, FontKind::Regular, BODY_PT, INK);
            }
            self.y += LINE_H;
        }
    }

    /// Stretch inter-word gaps so the line fills `width_mm` exactly.
    fn justified_line(&mut self, line: &str, x_mm: f64, width_mm: f64) {
        let words: Vec<&str> = line.split(' ').collect();
        if words.len() < 2 {
            self.text(x_mm, line, FontKind::Regular, BODY_PT, INK);
            return;
        }

        let words_w: f64 = words
            .iter()
            .map(|w| text_width_mm(w, FontKind::Regular, BODY_PT))
            .sum();
        let gap = (width_mm - words_w) / (words.len() - 1) as f64;

        let mut x = x_mm;
        for word in words {
            self.text(x, word, FontKind::Regular, BODY_PT, INK);
            x += text_width_mm(word, FontKind::Regular, BODY_PT) + gap;
        }
    }

    fn finish(mut self) -> Layout {
        self.pages.push(self.ops);
        Layout { pages: self.pages }
    }
}

/// Values that render as the italic placeholder instead of styled data.
fn is_missing(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "" | "não informado" | "nao informado" | "null" | "undefined"
    )
}
