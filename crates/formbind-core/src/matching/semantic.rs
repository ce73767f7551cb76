use crate::config::schema::MatchConfig;
use crate::transcript::{extract_names, DomainField, DomainFields, TranscriptEntities};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

/// Which stage of the lookup produced a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    Domain,
    FieldType,
    Context,
}

impl MatchSource {
    pub fn confidence(self, config: &MatchConfig) -> f32 {
        match self {
            MatchSource::Domain | MatchSource::FieldType => config.keyword_confidence,
            MatchSource::Context => config.context_confidence,
        }
    }
}

/// A value found for a label, with the rule that found it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SemanticMatch {
    pub value: String,
    pub rule: String,
    pub source: MatchSource,
}

/// Label keywords mapped onto a citation field.
pub struct DomainRule {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
    /// Citation fact the value is read from.
    pub field: DomainField,
}

/// Citation-form captions, most specific first. "speed limit" must be tried
/// before "speed" and "name" comes last so "Officer Name" stays an officer.
pub const DOMAIN_RULES: &[DomainRule] = &[
    DomainRule { name: "officer", keywords: &["officer"], field: DomainField::OfficerName },
    DomainRule { name: "badge", keywords: &["badge"], field: DomainField::BadgeNumber },
    DomainRule { name: "speed_limit", keywords: &["speed limit", "limit"], field: DomainField::SpeedLimit },
    DomainRule { name: "speed", keywords: &["speed"], field: DomainField::Speed },
    DomainRule { name: "violation", keywords: &["violation", "offense", "offence"], field: DomainField::Violation },
    DomainRule { name: "location", keywords: &["location"], field: DomainField::Location },
    DomainRule { name: "license", keywords: &["driver license", "license"], field: DomainField::LicenseNumber },
    DomainRule { name: "name", keywords: &["name"], field: DomainField::DriverName },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Name,
    Date,
    Email,
    Phone,
    Address,
    City,
    State,
    Zip,
    Ssn,
    EmployeeId,
    Department,
    Position,
    Salary,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Name => "name",
            FieldType::Date => "date",
            FieldType::Email => "email",
            FieldType::Phone => "phone",
            FieldType::Address => "address",
            FieldType::City => "city",
            FieldType::State => "state",
            FieldType::Zip => "zip",
            FieldType::Ssn => "ssn",
            FieldType::EmployeeId => "employee_id",
            FieldType::Department => "department",
            FieldType::Position => "position",
            FieldType::Salary => "salary",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// General form captions. The first type with a keyword contained in the
/// label decides the retrieval rule.
pub const FIELD_TYPE_KEYWORDS: &[(FieldType, &[&str])] = &[
    (
        FieldType::Name,
        &["name", "full name", "your name", "applicant name", "employee name", "person name"],
    ),
    (FieldType::Date, &["date", "when", "day", "dob", "birth", "birthday"]),
    (FieldType::Email, &["email", "e-mail", "electronic mail", "email address"]),
    (FieldType::Phone, &["phone", "telephone", "mobile", "cell", "contact number", "tel"]),
    (FieldType::Address, &["address", "street", "residence", "location", "where you live"]),
    (FieldType::City, &["city", "town", "municipality"]),
    (FieldType::State, &["state", "province"]),
    (FieldType::Zip, &["zip", "postal", "zip code", "postal code"]),
    (FieldType::Ssn, &["ssn", "social security", "social security number"]),
    (FieldType::EmployeeId, &["employee id", "employee number", "staff id", "worker id"]),
    (FieldType::Department, &["department", "dept", "division", "unit"]),
    (FieldType::Position, &["position", "title", "job title", "role", "designation"]),
    (FieldType::Salary, &["salary", "wage", "pay", "compensation", "income"]),
];

/// State abbreviations recognized as whole uppercase words.
pub const STATE_ABBREVIATIONS: &[&str] = &["CA", "NY", "TX", "FL", "IL", "PA", "OH", "GA", "NC", "MI"];

static ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:my address is|address is|i live at|live at|reside at)\s+([^.,\n]+)")
        .expect("valid address pattern")
});
static CITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:city|town)\s*(?:is|:)\s*([A-Za-z\s]+?)(?:,|\.|$)").expect("valid city pattern")
});
static STATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\b({})\b", STATE_ABBREVIATIONS.join("|"))).expect("valid state pattern")
});
static ZIP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{5}\b").expect("valid zip pattern"));
static SSN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{3}-?\d{2}-?\d{4}$").expect("valid ssn pattern"));
static DEPARTMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:department|dept|division)\s*(?:is|:)\s*([A-Za-z\s]+?)(?:,|\.|$)")
        .expect("valid department pattern")
});
static POSITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:position|title|role)\s*(?:is|:)\s*([A-Za-z\s]+?)(?:,|\.|$)")
        .expect("valid position pattern")
});
static SALARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:salary|pay|compensation)\s*(?:is|:)\s*\$?([0-9,]+)").expect("valid salary pattern")
});

/// Label text as used for keyword lookup: lowercased, trailing colon removed.
pub fn normalize_label(label: &str) -> String {
    label.trim().trim_end_matches(':').trim().to_lowercase()
}

/// The field type whose keywords first appear in `label`.
pub fn field_type_for(label: &str) -> Option<FieldType> {
    let label = normalize_label(label);
    FIELD_TYPE_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| label.contains(kw)))
        .map(|(field_type, _)| *field_type)
}

/// Looks values up for field labels from what was said.
pub struct SemanticMatcher<'a> {
    entities: &'a TranscriptEntities,
    transcript: &'a str,
    domain: Option<&'a DomainFields>,
}

impl<'a> SemanticMatcher<'a> {
    pub fn new(entities: &'a TranscriptEntities, transcript: &'a str) -> Self {
        Self {
            entities,
            transcript,
            domain: None,
        }
    }

    /// Consult citation fields before the general keyword table.
    pub fn with_domain(mut self, domain: &'a DomainFields) -> Self {
        self.domain = Some(domain);
        self
    }

    /// Find a value for `label`.
    ///
    /// Domain rules are skipped when their value is absent. A field-type
    /// keyword hit is final even when its retrieval finds nothing; the
    /// context fallback runs only when no keyword matched.
    pub fn lookup(&self, label: &str) -> Option<SemanticMatch> {
        let normalized = normalize_label(label);
        if normalized.is_empty() {
            return None;
        }

        if let Some(found) = self.domain_lookup(&normalized) {
            return Some(found);
        }

        if let Some(field_type) = field_type_for(&normalized) {
            return self.retrieve(field_type).map(|value| SemanticMatch {
                value,
                rule: field_type.as_str().to_string(),
                source: MatchSource::FieldType,
            });
        }

        context_value(label, self.transcript).map(|value| SemanticMatch {
            value,
            rule: "context".to_string(),
            source: MatchSource::Context,
        })
    }

    fn domain_lookup(&self, normalized: &str) -> Option<SemanticMatch> {
        let domain = self.domain?;
        DOMAIN_RULES.iter().find_map(|rule| {
            if !rule.keywords.iter().any(|kw| normalized.contains(kw)) {
                return None;
            }
            domain.get(rule.field).map(|value| SemanticMatch {
                value: value.to_string(),
                rule: rule.name.to_string(),
                source: MatchSource::Domain,
            })
        })
    }

    fn retrieve(&self, field_type: FieldType) -> Option<String> {
        let entities = self.entities;
        let text = self.transcript;
        match field_type {
            FieldType::Date => entities.dates.first().cloned(),
            FieldType::Email => entities.emails.first().cloned(),
            FieldType::Phone => entities.phone_numbers.first().cloned(),
            FieldType::Name => extract_names(text).into_iter().next(),
            FieldType::Address => {
                capture(&ADDRESS, text).or_else(|| entities.locations.first().cloned())
            }
            FieldType::City => capture(&CITY, text),
            FieldType::State => capture(&STATE, text),
            FieldType::Zip => ZIP.find(text).map(|m| m.as_str().to_string()),
            FieldType::Ssn => entities.numbers.iter().find(|n| SSN.is_match(n)).cloned(),
            FieldType::EmployeeId => entities
                .numbers
                .iter()
                .find(|n| (4..=8).contains(&n.replace('-', "").len()))
                .cloned(),
            FieldType::Department => capture(&DEPARTMENT, text),
            FieldType::Position => capture(&POSITION, text),
            FieldType::Salary => capture(&SALARY, text),
        }
    }
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    let value = re.captures(text)?.get(1)?.as_str().trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// "<label> is X" or "the <label> is X" anywhere in the transcript.
pub fn context_value(label: &str, transcript: &str) -> Option<String> {
    let label = label.trim().trim_end_matches(':').trim();
    if label.is_empty() {
        return None;
    }
    let escaped = regex::escape(label);
    let patterns = [
        format!(r"(?i){escaped}\s*(?:is|:|=)\s*([^\n,.]+)"),
        format!(r"(?i)(?:my|the|our)\s+{escaped}\s*(?:is|:|=)\s*([^\n,.]+)"),
    ];
    patterns.iter().find_map(|p| {
        let re = Regex::new(p).ok()?;
        capture(&re, transcript)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::{parse, parse_domain_conversation};

    fn lookup(label: &str, transcript: &str) -> Option<SemanticMatch> {
        let entities = parse(transcript);
        SemanticMatcher::new(&entities, transcript).lookup(label)
    }

    #[test]
    fn test_date_of_birth_uses_first_date() {
        let entities = TranscriptEntities {
            dates: vec!["01/15/2024".into()],
            ..Default::default()
        };
        let m = SemanticMatcher::new(&entities, "").lookup("Date of Birth:").unwrap();
        assert_eq!(m.value, "01/15/2024");
        assert_eq!(m.rule, "date");
        assert_eq!(m.source, MatchSource::FieldType);
    }

    #[test]
    fn test_name_from_transcript() {
        let m = lookup("Full Name", "Hi, my name is John Smith.").unwrap();
        assert_eq!(m.value, "John Smith");
        assert_eq!(m.rule, "name");
    }

    #[test]
    fn test_keyword_hit_is_final_even_when_empty() {
        // "Email" matches a keyword; the context sentence is never consulted.
        assert!(lookup("Email", "email is unknown to me").is_none());
    }

    #[test]
    fn test_context_fallback() {
        let m = lookup("Vehicle:", "The vehicle is a blue sedan, parked.").unwrap();
        assert_eq!(m.value, "a blue sedan");
        assert_eq!(m.source, MatchSource::Context);
    }

    #[test]
    fn test_unmatched_label_without_context() {
        assert!(lookup("Vehicle", "nothing relevant was said").is_none());
        assert!(lookup("  :  ", "anything").is_none());
    }

    #[test]
    fn test_address_components() {
        let t = "I live at 42 Oak Lane, the city is Springfield. It is in OH 43004.";
        assert_eq!(lookup("Address", t).unwrap().value, "42 Oak Lane");
        assert_eq!(lookup("City", t).unwrap().value, "Springfield");
        assert_eq!(lookup("State", t).unwrap().value, "OH");
        assert_eq!(lookup("Zip Code", t).unwrap().value, "43004");
    }

    #[test]
    fn test_state_needs_whole_uppercase_word() {
        assert!(lookup("State", "we went to Ohio and came back").is_none());
        assert!(lookup("State", "I was in a car").is_none());
    }

    #[test]
    fn test_ssn_and_employee_id() {
        let t = "My SSN is 123-45-6789 and my badge 12345.";
        assert_eq!(lookup("SSN", t).unwrap().value, "123-45-6789");
        let t = "Employee number 4821, extension 12.";
        assert_eq!(lookup("Employee ID", t).unwrap().value, "4821");
    }

    #[test]
    fn test_job_info() {
        let t = "My department is Engineering. My role is Team Lead. Salary: $85,000";
        assert_eq!(lookup("Department", t).unwrap().value, "Engineering");
        assert_eq!(lookup("Position", t).unwrap().value, "Team Lead");
        assert_eq!(lookup("Salary", t).unwrap().value, "85,000");
    }

    #[test]
    fn test_domain_rules_come_first() {
        let t = "I'm Officer Martinez, badge number 5847. You were doing 45 in a 25 zone. \
                 My name is Robert Chen.";
        let entities = parse(t);
        let domain = parse_domain_conversation(t);
        let matcher = SemanticMatcher::new(&entities, t).with_domain(&domain);

        let m = matcher.lookup("Officer Name:").unwrap();
        assert_eq!((m.value.as_str(), m.rule.as_str()), ("Martinez", "officer"));
        assert_eq!(matcher.lookup("Speed Limit").unwrap().value, "25");
        assert_eq!(matcher.lookup("Speed").unwrap().value, "45");
        assert_eq!(matcher.lookup("Driver Name").unwrap().value, "Robert Chen");
        assert_eq!(matcher.lookup("Badge #").unwrap().source, MatchSource::Domain);
    }

    #[test]
    fn test_absent_domain_value_falls_through() {
        let t = "The location is the north lot";
        let entities = parse(t);
        let domain = parse_domain_conversation(t);
        let matcher = SemanticMatcher::new(&entities, t).with_domain(&domain);
        // No street pattern, so the address keyword rule decides, finds
        // nothing, and the context sentence is not consulted.
        assert!(domain.location.is_none());
        assert!(matcher.lookup("Location").is_none());

        let t = "I live at 9 Elm Court";
        let entities = parse(t);
        let domain = parse_domain_conversation(t);
        let m = SemanticMatcher::new(&entities, t)
            .with_domain(&domain)
            .lookup("Location")
            .unwrap();
        assert_eq!(m.source, MatchSource::FieldType);
        assert_eq!(m.rule, "address");
        assert_eq!(m.value, "9 Elm Court");
    }

    #[test]
    fn test_confidence_by_source() {
        let cfg = MatchConfig::default();
        assert_eq!(MatchSource::Domain.confidence(&cfg), 0.8);
        assert_eq!(MatchSource::FieldType.confidence(&cfg), 0.8);
        assert_eq!(MatchSource::Context.confidence(&cfg), 0.5);
    }
}
