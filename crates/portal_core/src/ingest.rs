//! crates/portal_core/src/ingest.rs
//!
//! Turns the extracted text of a question-bank PDF into questions grouped by unit.
//!
//! The text is walked line by line. Unit headings switch the current unit, numbered
//! lines open a new question block, and continuation lines are appended to the open
//! block. When a block closes, page furniture is stripped and the `[L2][CO1][12M]`
//! style tags are lifted into [`QuestionMeta`].

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::domain::{ParsedQuestionBank, Question, QuestionMeta, UnitPools};

const DEFAULT_UNIT: u32 = 1;

lazy_static! {
    static ref UNIT_HEADING: Regex = Regex::new(r"(?i)^UNIT[\s:–-]*([IVXLC]+|\d+)\b").unwrap();
    static ref QUESTION_START: Regex = Regex::new(r"^(\d{1,2})[.)\s]\s*").unwrap();
    static ref NOISE: Vec<Regex> = [
        r"(?i)^Prepared by",
        r"(?i)^Section\s+[IVX]+\b",
        r"(?i)^No\.?\s*of\s*workers",
        r"(?i)^Page\s+\d+",
        r"(?i)^Course\s+Code",
        r"(?i)^Regulation",
        r"(?i)^H\.T\.No",
        r"(?i)^Subject\s+with",
        r"(?i)^Question\s+Bank",
        r"(?i)^Year\s*&\s*Sem",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect();
    static ref FOOTER: Vec<Regex> = [
        r"(?im)^\s*Course Code\s*:?.*$",
        r"(?im)^\s*Regulation\s*:?.*$",
        r"(?i)H\.T\.No\..*",
        r"\b\d+[A-Z]{2}\d+\b.*",
        r"(?m)^\s*R\d+\s*$",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect();
    static ref BRACKET_META: Regex =
        Regex::new(r"(?i)\[\s*L\s*(\d+)\s*\]\s*\[\s*CO\s*(\d+)\s*\]\s*\[\s*(\d+)\s*M\s*\]").unwrap();
    static ref PLAIN_META: Regex = Regex::new(r"(?i)\bCO\s*(\d+)\s+L\s*(\d+)\s+(\d+)\s*M\b").unwrap();
}

/// Line-oriented parser for question-bank text.
#[derive(Debug, Clone, Default)]
pub struct QuestionBankParser {
    /// Upper-cased first word of the institution banner printed on every page.
    banner: Option<String>,
}

impl QuestionBankParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also drops lines starting with the first word of `institution`.
    pub fn with_banner(institution: &str) -> Self {
        let banner = institution
            .split_whitespace()
            .next()
            .map(|w| w.to_uppercase());
        Self { banner }
    }

    pub fn parse(&self, text: &str) -> UnitPools {
        let mut pools = UnitPools::new();
        let mut current_unit = DEFAULT_UNIT;
        let mut block: Vec<&str> = Vec::new();

        for line in text.lines().map(str::trim) {
            if line.is_empty() || self.is_noise(line) {
                continue;
            }

            if let Some(caps) = UNIT_HEADING.captures(line) {
                flush_block(&mut block, current_unit, &mut pools);
                if let Some(unit) = unit_number(&caps[1]) {
                    current_unit = unit;
                }
                continue;
            }

            if QUESTION_START.is_match(line) {
                flush_block(&mut block, current_unit, &mut pools);
                block.push(line);
            } else if line.eq_ignore_ascii_case("OR") {
                continue;
            } else if !block.is_empty() {
                block.push(line);
            }
        }
        flush_block(&mut block, current_unit, &mut pools);

        pools
    }

    fn is_noise(&self, line: &str) -> bool {
        if NOISE.iter().any(|re| re.is_match(line)) {
            return true;
        }
        match &self.banner {
            Some(banner) => line.to_uppercase().starts_with(banner.as_str()),
            None => false,
        }
    }
}

/// Builds a [`ParsedQuestionBank`] for `text` with the given handle.
pub fn parse_question_bank(
    parser: &QuestionBankParser,
    parsed_id: impl Into<String>,
    source_filename: impl Into<String>,
    text: &str,
) -> ParsedQuestionBank {
    ParsedQuestionBank {
        parsed_id: parsed_id.into(),
        source_filename: source_filename.into(),
        units: parser.parse(text),
    }
}

fn flush_block(block: &mut Vec<&str>, unit: u32, pools: &mut UnitPools) {
    if block.is_empty() {
        return;
    }
    let raw = block.join("\n");
    block.clear();

    if let Some(question) = build_question(&raw, unit) {
        pools.entry(unit).or_default().push(question);
    }
}

fn build_question(raw: &str, unit: u32) -> Option<Question> {
    let mut cleaned = raw.to_string();
    for re in FOOTER.iter() {
        cleaned = re.replace_all(&cleaned, "").into_owned();
    }

    let (cleaned, meta) = extract_meta(&cleaned);
    let cleaned = normalize_lines(&cleaned);

    let (number, text) = match QUESTION_START.captures(&cleaned) {
        Some(caps) => {
            let whole = caps.get(0).map_or(0, |m| m.end());
            (caps[1].parse().ok(), cleaned[whole..].trim().to_string())
        }
        None => (None, cleaned.clone()),
    };

    if text.is_empty() || text.eq_ignore_ascii_case("OR") {
        return None;
    }

    Some(Question {
        unit,
        number,
        text,
        meta,
    })
}

/// Lifts the metadata tags out of a question. The bracketed form wins over the plain one.
pub fn extract_meta(text: &str) -> (String, QuestionMeta) {
    fn num(caps: &Captures, i: usize) -> Option<u32> {
        caps.get(i).and_then(|m| m.as_str().parse().ok())
    }

    if let Some(caps) = BRACKET_META.captures(text) {
        let meta = QuestionMeta {
            level: num(&caps, 1),
            course_outcome: num(&caps, 2),
            marks: num(&caps, 3),
        };
        return (BRACKET_META.replace_all(text, "").trim().to_string(), meta);
    }

    if let Some(caps) = PLAIN_META.captures(text) {
        let meta = QuestionMeta {
            course_outcome: num(&caps, 1),
            level: num(&caps, 2),
            marks: num(&caps, 3),
        };
        return (PLAIN_META.replace_all(text, "").trim().to_string(), meta);
    }

    (text.trim().to_string(), QuestionMeta::default())
}

fn normalize_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Accepts `IV`, `4` and the like.
fn unit_number(token: &str) -> Option<u32> {
    if let Ok(n) = token.parse::<u32>() {
        return (n > 0).then_some(n);
    }
    roman_to_u32(token)
}

fn roman_to_u32(token: &str) -> Option<u32> {
    let values: Vec<u32> = token
        .chars()
        .map(|c| match c.to_ascii_uppercase() {
            'I' => Some(1),
            'V' => Some(5),
            'X' => Some(10),
            'L' => Some(50),
            'C' => Some(100),
            _ => None,
        })
        .collect::<Option<_>>()?;

    // A symbol smaller than its right neighbour is subtracted instead of added.
    let subtractive: u32 = values
        .windows(2)
        .filter(|w| w[1] > w[0])
        .map(|w| w[0])
        .sum();
    let total = values.iter().sum::<u32>().saturating_sub(2 * subtractive);
    (total > 0).then_some(total)
}

/// Serializes a parsed bank to CSV for manual validation.
pub fn export_csv(bank: &ParsedQuestionBank) -> Result<Vec<u8>, csv::Error> {
    fn opt(v: Option<u32>) -> String {
        v.map(|n| n.to_string()).unwrap_or_default()
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "unit",
        "question_number",
        "question_text",
        "taxonomy_level",
        "course_outcome",
        "marks",
    ])?;
    for question in bank.units.values().flatten() {
        writer.write_record([
            question.unit.to_string(),
            opt(question.number),
            question.text.clone(),
            opt(question.meta.level),
            opt(question.meta.course_outcome),
            opt(question.meta.marks),
        ])?;
    }
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
SIDDHARTH INSTITUTE OF ENGINEERING & TECHNOLOGY
Question Bank
Subject with Code: Data Structures (20CS0501)
UNIT-I
1. a) Define an abstract data type. [L1][CO1][2M]
H.T.No. __________
b) Explain stacks with
Section IV
an example. [L2][CO1][10M]
OR
2. What is a queue? CO1 L2 12M
Prepared by: Dr. K. Rao
Year & Sem: II B.Tech & I Sem
No. of workers: 2
Page 1
UNIT II
3) Explain linked lists [ L3 ] [ CO2 ] [ 12M ]
4. Describe how register R3
is saved across calls. [L2][CO2][12M]
5 Explain trees
Course Code: 20CS0501
R20
";

    fn parse(text: &str) -> UnitPools {
        QuestionBankParser::with_banner("SIDDHARTH INSTITUTE").parse(text)
    }

    #[test]
    fn groups_questions_by_unit() {
        let pools = parse(SAMPLE);
        assert_eq!(pools.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(pools[&1].len(), 2);
        assert_eq!(pools[&2].len(), 3);
    }

    #[test]
    fn continuation_lines_join_the_open_block() {
        let pools = parse(SAMPLE);
        let first = &pools[&1][0];
        assert_eq!(first.number, Some(1));
        assert_eq!(
            first.text,
            "a) Define an abstract data type.\nb) Explain stacks with\nan example."
        );
    }

    #[test]
    fn noise_lines_inside_blocks_are_dropped() {
        let pools = parse(SAMPLE);
        let all: Vec<&str> = pools.values().flatten().map(|q| q.text.as_str()).collect();
        for noise in ["H.T.No", "Section", "Prepared", "Year & Sem", "workers", "Page"] {
            assert!(all.iter().all(|t| !t.contains(noise)), "{} leaked", noise);
        }
        assert_eq!(pools[&1][1].text, "What is a queue?");
    }

    #[test]
    fn register_names_at_line_end_survive() {
        let pools = parse(SAMPLE);
        let q = &pools[&2][1];
        assert_eq!(q.number, Some(4));
        assert_eq!(q.text, "Describe how register R3\nis saved across calls.");
        assert_eq!(q.meta.marks, Some(12));
    }

    #[test]
    fn bracket_metadata_is_lifted() {
        let pools = parse(SAMPLE);
        let q = &pools[&2][0];
        assert_eq!(q.number, Some(3));
        assert_eq!(q.text, "Explain linked lists");
        assert_eq!(
            q.meta,
            QuestionMeta {
                level: Some(3),
                course_outcome: Some(2),
                marks: Some(12)
            }
        );
    }

    #[test]
    fn plain_metadata_is_lifted() {
        let pools = parse(SAMPLE);
        let q = &pools[&1][1];
        assert_eq!(q.text, "What is a queue?");
        assert_eq!(q.meta.course_outcome, Some(1));
        assert_eq!(q.meta.level, Some(2));
        assert_eq!(q.meta.marks, Some(12));
    }

    #[test]
    fn footer_artifacts_are_stripped() {
        let pools = parse(SAMPLE);
        let q = &pools[&2][2];
        assert_eq!(q.text, "Explain trees");
        assert!(q.meta.is_empty());
    }

    #[test]
    fn text_without_units_lands_in_unit_one() {
        let pools = parse("1. First question\n2. Second question\n");
        assert_eq!(pools.len(), 1);
        assert_eq!(pools[&1].len(), 2);
    }

    #[test]
    fn lines_before_first_question_are_ignored() {
        let pools = parse("Some preamble text\nUNIT 3\nintro line\n1. Only question\n");
        assert_eq!(pools.len(), 1);
        assert_eq!(pools[&3][0].text, "Only question");
    }

    #[test]
    fn prose_mentioning_units_is_not_a_heading() {
        let pools = parse("1. Explain the\nunit circle\nUnit vectors too\n2. Define a unit vector\n");
        assert_eq!(pools.len(), 1);
        assert_eq!(pools[&1].len(), 2);
        assert_eq!(pools[&1][0].text, "Explain the\nunit circle\nUnit vectors too");
    }

    #[test]
    fn roman_numerals_convert() {
        assert_eq!(roman_to_u32("IV"), Some(4));
        assert_eq!(roman_to_u32("ix"), Some(9));
        assert_eq!(roman_to_u32("XII"), Some(12));
        assert_eq!(roman_to_u32("Q"), None);
        assert_eq!(unit_number("0"), None);
        assert_eq!(unit_number("5"), Some(5));
    }

    #[test]
    fn csv_export_has_header_and_rows() {
        let bank = parse_question_bank(&QuestionBankParser::new(), "id", "qb.pdf", SAMPLE);
        let csv = String::from_utf8(export_csv(&bank).unwrap()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("unit,question_number,question_text,taxonomy_level,course_outcome,marks")
        );
        assert!(csv.contains("2,3,Explain linked lists,3,2,12"));
    }
}
