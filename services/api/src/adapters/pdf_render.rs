//! services/api/src/adapters/pdf_render.rs
//!
//! Implements the `PaperRenderer` port with `genpdf`.
//!
//! A paper is first laid out as a list of [`Block`]s (pure, testable), then each
//! block is turned into genpdf elements on an A4 page.

use genpdf::elements::{Break, FrameCellDecorator, Paragraph, TableLayout};
use genpdf::style::Style;
use genpdf::{Alignment, Document, Element, PaperSize, SimplePageDecorator};
use portal_core::domain::{PaperMeta, PaperSection, PaperSet, Question};
use portal_core::generator::{max_marks, UNIT_MARKS};
use portal_core::ports::{PaperRenderer, PortError, PortResult};
use std::path::PathBuf;

const FALLBACK_CODE: &str = "XXXXXX";
const FALLBACK_REGULATION: &str = "R20";
const FALLBACK_SUBJECT: &str = "SUBJECT NAME";
const BODY_FONT_SIZE: u8 = 10;

/// One visual block of a paper, top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Boxed header row: O.P.Code, regulation, H.T.No.
    HeaderRow {
        code: String,
        regulation: String,
    },
    Title(String),
    Subtitle(String),
    /// Left and right aligned text on one line.
    Split(String, String),
    UnitHeading(String),
    Question(String),
    Or,
    Gap,
}

/// Lays out a paper without touching fonts.
pub fn layout_paper(
    set: &PaperSet,
    meta: &PaperMeta,
    institution: &str,
    exam_title: &str,
) -> Vec<Block> {
    fn or_default(value: &str, fallback: &str) -> String {
        let value = value.trim();
        if value.is_empty() {
            fallback.to_string()
        } else {
            value.to_string()
        }
    }

    let units = set.sections.len();
    let total = max_marks(units);
    let exam_line = match meta.semester.trim() {
        "" => exam_title.to_string(),
        sem => format!("Semester {} {}", sem, exam_title),
    };

    let mut blocks = vec![
        Block::HeaderRow {
            code: or_default(&meta.subject_code, FALLBACK_CODE),
            regulation: or_default(&meta.regulation, FALLBACK_REGULATION),
        },
        Block::Gap,
        Block::Title(institution.to_string()),
        Block::Subtitle("(AUTONOMOUS)".to_string()),
        Block::Gap,
        Block::Title(exam_line),
        Block::Title(or_default(&meta.subject_name, FALLBACK_SUBJECT).to_uppercase()),
        Block::Subtitle(set.label()),
        Block::Split(
            "Time: 3 Hours".to_string(),
            format!("Max. Marks: {}", total),
        ),
        Block::Subtitle(format!(
            "(Answer all {units} Units {units} x {UNIT_MARKS} = {total} Marks)"
        )),
        Block::Gap,
    ];

    let mut number = 0;
    for (index, section) in set.sections.iter().enumerate() {
        blocks.extend(section_blocks(index + 1, section, &mut number));
    }
    blocks
}

fn section_blocks(position: usize, section: &PaperSection, number: &mut u32) -> Vec<Block> {
    let mut blocks = vec![Block::UnitHeading(format!("UNIT-{}", position))];

    *number += 1;
    blocks.push(Block::Question(question_line(*number, &section.primary)));
    if let Some(alternative) = &section.alternative {
        blocks.push(Block::Or);
        *number += 1;
        blocks.push(Block::Question(question_line(*number, alternative)));
    }
    blocks.push(Block::Gap);
    blocks
}

fn question_line(number: u32, question: &Question) -> String {
    let text = question
        .text
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(" ");

    let mut tags = Vec::new();
    if let Some(co) = question.meta.course_outcome {
        tags.push(format!("CO{}", co));
    }
    if let Some(level) = question.meta.level {
        tags.push(format!("L{}", level));
    }

    if tags.is_empty() {
        format!("{}. {} [{} Marks]", number, text, UNIT_MARKS)
    } else {
        format!("{}. {} ({}) [{} Marks]", number, text, tags.join(" "), UNIT_MARKS)
    }
}

/// Renders paper sets to A4 PDFs with the configured TrueType family.
#[derive(Clone, Debug)]
pub struct GenPdfRenderer {
    fonts_dir: PathBuf,
    font_family: String,
    institution: String,
    exam_title: String,
}

impl GenPdfRenderer {
    /// Checks the font family loads before accepting the configuration.
    pub fn new(
        fonts_dir: impl Into<PathBuf>,
        font_family: impl Into<String>,
        institution: impl Into<String>,
        exam_title: impl Into<String>,
    ) -> PortResult<Self> {
        let renderer = Self {
            fonts_dir: fonts_dir.into(),
            font_family: font_family.into(),
            institution: institution.into(),
            exam_title: exam_title.into(),
        };
        renderer.load_fonts()?;
        Ok(renderer)
    }

    fn load_fonts(&self) -> PortResult<genpdf::fonts::FontFamily<genpdf::fonts::FontData>> {
        genpdf::fonts::from_files(&self.fonts_dir, &self.font_family, None).map_err(|e| {
            PortError::Unexpected(format!(
                "failed to load font family {} from {}: {}",
                self.font_family,
                self.fonts_dir.display(),
                e
            ))
        })
    }

    fn push_block(doc: &mut Document, block: Block) -> Result<(), genpdf::error::Error> {
        let bold = Style::new().bold();
        match block {
            Block::HeaderRow { code, regulation } => {
                let mut table = TableLayout::new(vec![3, 2, 5]);
                table.set_cell_decorator(FrameCellDecorator::new(true, true, false));
                table
                    .row()
                    .element(Paragraph::new(format!("O.P.Code: {}", code)).styled(bold))
                    .element(Paragraph::new(regulation).styled(bold))
                    .element(Paragraph::new("H.T.No.").styled(bold))
                    .push()?;
                doc.push(table);
            }
            Block::Title(text) => doc.push(
                Paragraph::new(text)
                    .aligned(Alignment::Center)
                    .styled(bold.with_font_size(11)),
            ),
            Block::Subtitle(text) => doc.push(
                Paragraph::new(text)
                    .aligned(Alignment::Center)
                    .styled(Style::new().with_font_size(9)),
            ),
            Block::Split(left, right) => {
                let mut table = TableLayout::new(vec![1, 1]);
                table
                    .row()
                    .element(Paragraph::new(left).styled(bold))
                    .element(Paragraph::new(right).aligned(Alignment::Right).styled(bold))
                    .push()?;
                doc.push(table);
            }
            Block::UnitHeading(text) => {
                doc.push(Break::new(1));
                doc.push(Paragraph::new(text).aligned(Alignment::Center).styled(bold));
                doc.push(Break::new(1));
            }
            Block::Question(text) => doc.push(Paragraph::new(text)),
            Block::Or => {
                doc.push(Break::new(0.5));
                doc.push(Paragraph::new("OR").aligned(Alignment::Center).styled(bold));
                doc.push(Break::new(0.5));
            }
            Block::Gap => doc.push(Break::new(1)),
        }
        Ok(())
    }
}

impl PaperRenderer for GenPdfRenderer {
    fn render(&self, set: &PaperSet, meta: &PaperMeta) -> PortResult<Vec<u8>> {
        let mut doc = Document::new(self.load_fonts()?);
        doc.set_title(format!("{} {}", meta.subject_name.trim(), set.label()).trim().to_string());
        doc.set_paper_size(PaperSize::A4);
        doc.set_font_size(BODY_FONT_SIZE);
        doc.set_line_spacing(1.25);

        let mut decorator = SimplePageDecorator::new();
        decorator.set_margins(14);
        doc.set_page_decorator(decorator);

        let render_err = |e: genpdf::error::Error| PortError::Unexpected(format!("pdf render failed: {}", e));
        for block in layout_paper(set, meta, &self.institution, &self.exam_title) {
            Self::push_block(&mut doc, block).map_err(render_err)?;
        }

        let mut out = Vec::new();
        doc.render(&mut out).map_err(render_err)?;
        Ok(out)
    }
}
