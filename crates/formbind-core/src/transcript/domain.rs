use super::extract_names;
use super::rules::{title_case, RuleChain};
use serde::Serialize;
use std::sync::LazyLock;
use tracing::debug;

/// Citation facts stated during a traffic stop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DomainFields {
    pub officer_name: Option<String>,
    pub badge_number: Option<String>,
    pub violation: Option<String>,
    pub speed: Option<String>,
    pub speed_limit: Option<String>,
    pub location: Option<String>,
    pub driver_name: Option<String>,
    pub license_number: Option<String>,
}

/// One citation fact of [`DomainFields`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainField {
    OfficerName,
    BadgeNumber,
    Violation,
    Speed,
    SpeedLimit,
    Location,
    DriverName,
    LicenseNumber,
}

impl DomainField {
    pub const ALL: [DomainField; 8] = [
        DomainField::OfficerName,
        DomainField::BadgeNumber,
        DomainField::Violation,
        DomainField::Speed,
        DomainField::SpeedLimit,
        DomainField::Location,
        DomainField::DriverName,
        DomainField::LicenseNumber,
    ];

    /// Serialized name, as in the JSON output of [`DomainFields`].
    pub fn as_str(self) -> &'static str {
        match self {
            DomainField::OfficerName => "officer_name",
            DomainField::BadgeNumber => "badge_number",
            DomainField::Violation => "violation",
            DomainField::Speed => "speed",
            DomainField::SpeedLimit => "speed_limit",
            DomainField::Location => "location",
            DomainField::DriverName => "driver_name",
            DomainField::LicenseNumber => "license_number",
        }
    }
}

impl DomainFields {
    pub fn get(&self, field: DomainField) -> Option<&str> {
        let value = match field {
            DomainField::OfficerName => &self.officer_name,
            DomainField::BadgeNumber => &self.badge_number,
            DomainField::Violation => &self.violation,
            DomainField::Speed => &self.speed,
            DomainField::SpeedLimit => &self.speed_limit,
            DomainField::Location => &self.location,
            DomainField::DriverName => &self.driver_name,
            DomainField::LicenseNumber => &self.license_number,
        };
        value.as_deref()
    }

    /// `(field, value)` for every field that was found.
    pub fn present(&self) -> Vec<(&'static str, &str)> {
        DomainField::ALL
            .into_iter()
            .filter_map(|field| self.get(field).map(|v| (field.as_str(), v)))
            .collect()
    }
}

// All chains run against the lowercased transcript.

pub static OFFICER_RULES: LazyLock<RuleChain> = LazyLock::new(|| {
    RuleChain::new(&[
        ("officer_introduction", r"\b(?:i'm|i am|this is)\s+officer\s+(\w+)", 1),
        ("officer_speaking", r"\bofficer\s+(\w+)\s+(?:here|speaking)", 1),
    ])
});

pub static BADGE_RULES: LazyLock<RuleChain> = LazyLock::new(|| {
    RuleChain::new(&[("badge_number", r"\bbadge\s+(?:number\s+|#\s*)?(\d+)", 1)])
});

pub static SPEED_RULES: LazyLock<RuleChain> = LazyLock::new(|| {
    RuleChain::new(&[
        ("observed_speed", r"\b(?:going|doing|clocked at)\s+(\d+)\s+(?:mph|miles)", 1),
        ("speed_in_zone", r"\b(\d+)\s+in\s+a\s+(\d+)(?:\s+zone)?", 1),
    ])
});

pub static SPEED_LIMIT_RULES: LazyLock<RuleChain> = LazyLock::new(|| {
    RuleChain::new(&[
        ("speed_in_zone", r"\b(\d+)\s+in\s+a\s+(\d+)(?:\s+zone)?", 2),
        ("stated_limit", r"\bspeed\s+limit\s+(?:is\s+)?(\d+)", 1),
    ])
});

pub static VIOLATION_RULES: LazyLock<RuleChain> = LazyLock::new(|| {
    RuleChain::new(&[
        (
            "cited_for",
            r"\b(?:citing you for|violation is|for)\s+([^.,]+?)(?:\.|,|$)",
            1,
        ),
        (
            "named_offence",
            r"\b(speeding|running a (?:red light|stop sign)|illegal (?:turn|parking))",
            1,
        ),
        ("failure_to", r"\b(failure to (?:stop|yield|signal))", 1),
    ])
});

pub static LOCATION_RULES: LazyLock<RuleChain> = LazyLock::new(|| {
    RuleChain::new(&[
        (
            "street",
            r"\b(?:at|on|near)\s+(\w+\s+(?:street|avenue|road|boulevard|highway))",
            1,
        ),
        ("intersection", r"\bintersection of\s+(\w+\s+and\s+\w+)", 1),
        ("mile_marker", r"\b(mile marker\s+\d+)", 1),
    ])
});

pub static LICENSE_RULES: LazyLock<RuleChain> = LazyLock::new(|| {
    RuleChain::new(&[(
        "license_number",
        r"\blicense\s+(?:number\s+)?(?:is\s+)?([a-z0-9]*\d[a-z0-9]*)\b",
        1,
    )])
});

/// Pull citation facts out of a traffic-stop conversation.
///
/// Each field is decided by its own ordered rule chain; the first rule that
/// matches wins. The driver is the first person introduced by name who is
/// not an officer.
pub fn parse_domain_conversation(transcript: &str) -> DomainFields {
    let lower = transcript.to_lowercase();
    let value = |chain: &RuleChain| chain.first_match(&lower).map(|hit| hit.value);

    let fields = DomainFields {
        officer_name: value(&OFFICER_RULES).map(|v| title_case(&v)),
        badge_number: value(&BADGE_RULES),
        violation: value(&VIOLATION_RULES),
        speed: value(&SPEED_RULES),
        speed_limit: value(&SPEED_LIMIT_RULES),
        location: value(&LOCATION_RULES).map(|v| title_case(&v)),
        driver_name: extract_names(transcript).into_iter().next(),
        license_number: value(&LICENSE_RULES).map(|v| v.to_uppercase()),
    };

    debug!(found = fields.present().len(), "domain fields parsed");
    fields
}
