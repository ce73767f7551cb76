use crate::model::TextBlock;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Facts printed on the ticket itself, read from the OCR text.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TicketInfo {
    pub ticket_number: Option<String>,
    pub case_number: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub speed: Option<String>,
    pub violation_code: Option<String>,
    pub badge_number: Option<String>,
    pub court_date: Option<String>,
}

static RE_TICKET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)ticket\s*#?\s*(\d+)").expect("valid ticket regex"));
static RE_CASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)case\s*#?\s*(\d+)").expect("valid case regex"));
static RE_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})").expect("valid date regex"));
static RE_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d{1,2}:\d{2}\s*[ap]m)").expect("valid time regex"));
static RE_SPEED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*mph").expect("valid speed regex"));
static RE_VIOLATION_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z]{2,4}\s*\d+\.\d+)").expect("valid violation code regex"));
static RE_BADGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)badge\s*#?\s*(\d+)").expect("valid badge regex"));
static RE_COURT_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)court.*?(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})").expect("valid court date regex"));

/// Scan the printed ticket text for well-known fields.
///
/// All block texts are joined with spaces; each field takes the first match.
pub fn scan_ticket_text(blocks: &[TextBlock]) -> TicketInfo {
    let text = blocks.iter().map(|b| b.text()).collect::<Vec<_>>().join(" ");
    let first = |re: &Regex| re.captures(&text).map(|c| c[1].to_string());

    TicketInfo {
        ticket_number: first(&RE_TICKET),
        case_number: first(&RE_CASE),
        date: first(&RE_DATE),
        time: first(&RE_TIME),
        speed: first(&RE_SPEED),
        violation_code: first(&RE_VIOLATION_CODE),
        badge_number: first(&RE_BADGE),
        court_date: first(&RE_COURT_DATE),
    }
}
