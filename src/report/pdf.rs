//! PDF emission: serializes layout operations into an A4 document with the
//! three standard Helvetica faces. Coordinates arrive top-down in
//! millimeters and are flipped into PDF user space here.

use anyhow::{Context, Result};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};

use crate::report::layout::{Layout, PageOp, RuleOp, TextOp, PAGE_H, PAGE_W};
use crate::report::metrics::{FontKind, MM_TO_PT};

/// Render a layout into the bytes of a finished PDF file.
pub fn render(layout: &Layout) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let fonts = dictionary! {
        "F1" => doc.add_object(standard_font("Helvetica")),
        "F2" => doc.add_object(standard_font("Helvetica-Bold")),
        "F3" => doc.add_object(standard_font("Helvetica-Oblique")),
    };
    let resources_id = doc.add_object(dictionary! { "Font" => fonts });

    let mut kids: Vec<Object> = Vec::with_capacity(layout.pages.len());
    for ops in &layout.pages {
        let content = page_content(ops);
        let encoded = content.encode().context("failed to encode page content")?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                Object::Real((PAGE_W * MM_TO_PT) as f32),
                Object::Real((PAGE_H * MM_TO_PT) as f32),
            ],
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).context("failed to serialize document")?;
    Ok(buffer)
}

fn standard_font(base: &str) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base,
        "Encoding" => "WinAnsiEncoding",
    }
}

fn page_content(ops: &[PageOp]) -> Content {
    let mut operations = Vec::new();
    for op in ops {
        match op {
            PageOp::Text(text) => emit_text(&mut operations, text),
            PageOp::Rule(rule) => emit_rule(&mut operations, rule),
        }
    }
    Content { operations }
}

fn emit_text(operations: &mut Vec<Operation>, op: &TextOp) {
    let (r, g, b) = parse_hex_color(&op.color);
    let font = match op.font {
        FontKind::Regular => "F1",
        FontKind::Bold => "F2",
        FontKind::Oblique => "F3",
    };

    operations.push(Operation::new("BT", vec![]));
    operations.push(Operation::new("Tf", vec![font.into(), (op.size_pt as f32).into()]));
    operations.push(Operation::new("rg", vec![r.into(), g.into(), b.into()]));
    operations.push(Operation::new(
        "Td",
        vec![pt(op.x_mm).into(), pt_flipped(op.y_mm).into()],
    ));
    operations.push(Operation::new(
        "Tj",
        vec![Object::String(win_ansi(&op.text), StringFormat::Literal)],
    ));
    operations.push(Operation::new("ET", vec![]));
}

fn emit_rule(operations: &mut Vec<Operation>, op: &RuleOp) {
    let (r, g, b) = parse_hex_color(&op.color);
    operations.push(Operation::new("w", vec![pt(op.width_mm).into()]));
    operations.push(Operation::new("RG", vec![r.into(), g.into(), b.into()]));
    operations.push(Operation::new(
        "m",
        vec![pt(op.x1_mm).into(), pt_flipped(op.y_mm).into()],
    ));
    operations.push(Operation::new(
        "l",
        vec![pt(op.x2_mm).into(), pt_flipped(op.y_mm).into()],
    ));
    operations.push(Operation::new("S", vec![]));
}

fn pt(mm: f64) -> f32 {
    (mm * MM_TO_PT) as f32
}

/// Layout y grows downward; PDF user space grows upward.
fn pt_flipped(y_mm: f64) -> f32 {
    ((PAGE_H - y_mm) * MM_TO_PT) as f32
}

/// Hex "#RRGGBB" to 0..1 components; malformed input falls back to black.
fn parse_hex_color(color: &str) -> (f32, f32, f32) {
    let hex = color.trim_start_matches('#');
    if hex.len() >= 6 {
        let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(0) as f32 / 255.0;
        let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(0) as f32 / 255.0;
        let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(0) as f32 / 255.0;
        (r, g, b)
    } else {
        (0.0, 0.0, 0.0)
    }
}

/// WinAnsi byte encoding. Latin-1 covers Portuguese; the few typographic
/// characters the narratives carry get their CP-1252 slots.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201c}' => 0x93,
            '\u{201d}' => 0x94,
            c if (c as u32) <= 0xFF => c as u8,
            _ => b'?',
        })
        .collect()
}
