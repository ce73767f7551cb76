pub mod domain;
pub mod rules;

pub use domain::{parse_domain_conversation, DomainField, DomainFields};

use regex::Regex;
use rules::dedup_stable;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;
use tracing::debug;

/// Kinds of values pulled out of a conversation transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Date,
    Email,
    Phone,
    SsnLikeNumber,
    Name,
    Location,
    Violation,
    BadgeNumber,
    SpeedPair,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Date => "date",
            EntityKind::Email => "email",
            EntityKind::Phone => "phone",
            EntityKind::SsnLikeNumber => "ssn_like_number",
            EntityKind::Name => "name",
            EntityKind::Location => "location",
            EntityKind::Violation => "violation",
            EntityKind::BadgeNumber => "badge_number",
            EntityKind::SpeedPair => "speed_pair",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// "going 45 in a 25": the observed speed and the posted limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeedPair {
    pub speed: String,
    pub limit: String,
}

impl fmt::Display for SpeedPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in a {}", self.speed, self.limit)
    }
}

/// One typed value, flattened for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptEntity {
    pub kind: EntityKind,
    pub value: String,
}

/// Every entity found in a transcript, one list per kind.
///
/// Each list is in the order values first appear in the text, without
/// repeats.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TranscriptEntities {
    pub dates: Vec<String>,
    pub emails: Vec<String>,
    pub phone_numbers: Vec<String>,
    pub numbers: Vec<String>,
    pub names: Vec<String>,
    pub locations: Vec<String>,
    pub violations: Vec<String>,
    pub badge_numbers: Vec<String>,
    pub speed_pairs: Vec<SpeedPair>,
}

impl TranscriptEntities {
    pub fn first(&self, kind: EntityKind) -> Option<String> {
        match kind {
            EntityKind::SpeedPair => self.speed_pairs.first().map(ToString::to_string),
            _ => self.list(kind).and_then(|l| l.first().cloned()),
        }
    }

    fn list(&self, kind: EntityKind) -> Option<&Vec<String>> {
        match kind {
            EntityKind::Date => Some(&self.dates),
            EntityKind::Email => Some(&self.emails),
            EntityKind::Phone => Some(&self.phone_numbers),
            EntityKind::SsnLikeNumber => Some(&self.numbers),
            EntityKind::Name => Some(&self.names),
            EntityKind::Location => Some(&self.locations),
            EntityKind::Violation => Some(&self.violations),
            EntityKind::BadgeNumber => Some(&self.badge_numbers),
            EntityKind::SpeedPair => None,
        }
    }

    /// All entities flattened, grouped by kind.
    pub fn entities(&self) -> Vec<TranscriptEntity> {
        const KINDS: [EntityKind; 8] = [
            EntityKind::Date,
            EntityKind::Email,
            EntityKind::Phone,
            EntityKind::SsnLikeNumber,
            EntityKind::Name,
            EntityKind::Location,
            EntityKind::Violation,
            EntityKind::BadgeNumber,
        ];
        let mut out: Vec<TranscriptEntity> = KINDS
            .iter()
            .flat_map(|&kind| {
                self.list(kind)
                    .into_iter()
                    .flatten()
                    .map(move |value| TranscriptEntity {
                        kind,
                        value: value.clone(),
                    })
            })
            .collect();
        out.extend(self.speed_pairs.iter().map(|p| TranscriptEntity {
            kind: EntityKind::SpeedPair,
            value: p.to_string(),
        }));
        out
    }

    pub fn len(&self) -> usize {
        self.dates.len()
            + self.emails.len()
            + self.phone_numbers.len()
            + self.numbers.len()
            + self.names.len()
            + self.locations.len()
            + self.violations.len()
            + self.badge_numbers.len()
            + self.speed_pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

const MONTHS: &str =
    "January|February|March|April|May|June|July|August|September|October|November|December";

static DATE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\b\d{1,2}[/-]\d{1,2}[/-]\d{2,4}\b".to_string(),
        format!(r"(?i)\b(?:{MONTHS})\s+\d{{1,2}},?\s+\d{{4}}\b"),
        format!(r"(?i)\b\d{{1,2}}\s+(?:{MONTHS})\s+\d{{4}}\b"),
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid date pattern"))
    .collect()
});

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("valid email pattern")
});

static PHONE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\(\d{3}\)\s*\d{3}[-.]?\d{4}",
        r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b",
        r"\b\d{10}\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid phone pattern"))
    .collect()
});

static NUMBER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"\b\d{3}-\d{2}-\d{4}\b", r"\b\d{2,}\b"]
        .iter()
        .map(|p| Regex::new(p).expect("valid number pattern"))
        .collect()
});

static NAME_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\b(?i:my name is|i am|i'm|this is)\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+){1,2})",
        r"\b(?i:full name|name)\s*(?i:is|:)\s*([A-Z][a-z]+(?:\s+[A-Z][a-z]+){1,2})",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid name pattern"))
    .collect()
});

static SPEED_PAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s+in\s+a\s+(\d+)").expect("valid speed pair pattern"));

/// Spans led by one of these are an officer or a title, not a person's name.
const TITLES: &[&str] = &["Officer", "Deputy", "Trooper", "Sergeant", "Detective"];

/// Matches of `patterns` in text order, first occurrence kept.
fn scan(patterns: &[Regex], text: &str, group: usize) -> Vec<String> {
    let mut found: Vec<(usize, String)> = patterns
        .iter()
        .flat_map(|re| {
            re.captures_iter(text).filter_map(move |c| {
                let m = c.get(group)?;
                Some((m.start(), m.as_str().to_string()))
            })
        })
        .collect();
    found.sort_by_key(|(start, _)| *start);
    dedup_stable(found.into_iter().map(|(_, v)| v).collect())
}

/// Person names introduced in the conversation.
///
/// The trigger phrase is case-insensitive but every name token must be
/// capitalized.
pub fn extract_names(text: &str) -> Vec<String> {
    scan(&NAME_PATTERNS, text, 1)
        .into_iter()
        .filter(|name| {
            name.split_whitespace()
                .next()
                .is_some_and(|first| !TITLES.contains(&first))
        })
        .collect()
}

/// Extract typed entities from a transcript.
pub fn parse(transcript: &str) -> TranscriptEntities {
    let lower = transcript.to_lowercase();

    let speed_pairs = {
        let mut seen = Vec::new();
        for c in SPEED_PAIR.captures_iter(transcript) {
            let pair = SpeedPair {
                speed: c[1].to_string(),
                limit: c[2].to_string(),
            };
            if !seen.contains(&pair) {
                seen.push(pair);
            }
        }
        seen
    };

    let entities = TranscriptEntities {
        dates: scan(&DATE_PATTERNS, transcript, 0),
        emails: scan(std::slice::from_ref(&*EMAIL_PATTERN), transcript, 0),
        phone_numbers: scan(&PHONE_PATTERNS, transcript, 0),
        numbers: scan(&NUMBER_PATTERNS, transcript, 0),
        names: extract_names(transcript),
        locations: domain::LOCATION_RULES
            .all_matches(&lower)
            .iter()
            .map(|l| rules::title_case(l))
            .collect(),
        violations: domain::VIOLATION_RULES.all_matches(&lower),
        badge_numbers: domain::BADGE_RULES.all_matches(&lower),
        speed_pairs,
    };

    debug!(entities = entities.len(), "transcript parsed");
    entities
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_my_name_is() {
        let e = parse("Hello. My name is John Smith.");
        assert_eq!(e.names, vec!["John Smith"]);
    }

    #[test]
    fn test_name_tokens_must_be_capitalized() {
        let e = parse("my name is john smith");
        assert!(e.names.is_empty());
        let e = parse("MY NAME IS Jane Ann Doe and more");
        assert_eq!(e.names, vec!["Jane Ann Doe"]);
    }

    #[test]
    fn test_officer_introduction_is_not_a_person_name() {
        let e = parse("This is Officer Johnson speaking. I am Maria Lopez.");
        assert_eq!(e.names, vec!["Maria Lopez"]);
    }

    #[test]
    fn test_dates_in_text_order() {
        let e = parse("Born March 3, 1990, hired 01/15/2024 and again 01/15/2024, left 4 July 2023");
        assert_eq!(e.dates, vec!["March 3, 1990", "01/15/2024", "4 July 2023"]);
    }

    #[test]
    fn test_emails_and_phones() {
        let e = parse("Reach me at jane.doe@example.com or (555) 123-4567, or 555.987.6543.");
        assert_eq!(e.emails, vec!["jane.doe@example.com"]);
        assert_eq!(e.phone_numbers, vec!["(555) 123-4567", "555.987.6543"]);
    }

    #[test]
    fn test_ten_digit_phone_reported_once() {
        let e = parse("call 5551234567 now");
        assert_eq!(e.phone_numbers, vec!["5551234567"]);
    }

    #[test]
    fn test_numbers_include_dashed_ssn() {
        let e = parse("SSN 123-45-6789, badge 5847, 5847 again");
        assert_eq!(e.numbers[0], "123-45-6789");
        assert!(e.numbers.contains(&"5847".to_string()));
        assert_eq!(e.numbers.iter().filter(|n| *n == "5847").count(), 1);
    }

    #[test]
    fn test_domain_entities() {
        let e = parse(
            "Badge number 5847. You were doing 45 in a 25 zone on Main Street. \
             I'm citing you for speeding.",
        );
        assert_eq!(e.badge_numbers, vec!["5847"]);
        assert_eq!(e.locations, vec!["Main Street"]);
        assert_eq!(e.violations, vec!["speeding"]);
        assert_eq!(
            e.speed_pairs,
            vec![SpeedPair {
                speed: "45".into(),
                limit: "25".into()
            }]
        );
        assert_eq!(e.first(EntityKind::SpeedPair).as_deref(), Some("45 in a 25"));
    }

    #[test]
    fn test_empty_transcript() {
        let e = parse("");
        assert!(e.is_empty());
        assert!(e.entities().is_empty());
        assert!(e.first(EntityKind::Date).is_none());
    }

    #[test]
    fn test_entities_flattened() {
        let e = parse("My name is John Smith, email john@example.org");
        let flat = e.entities();
        assert!(flat.contains(&TranscriptEntity {
            kind: EntityKind::Name,
            value: "John Smith".into()
        }));
        assert!(flat.iter().any(|t| t.kind == EntityKind::Email));
        assert_eq!(flat.len(), e.len());
    }
}
