//! Temporal intent extraction from free-text queries.
//!
//! Detection walks [`RULES`] in order and the first matching rule names the
//! [`TemporalCue`]. Target-time resolution is separate and has its own
//! precedence (see [`parse`]): an explicit clock time anywhere in the query
//! always wins over a day-part such as "tomorrow".

use std::sync::LazyLock;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalCue {
    ClockTime,
    AtHour,
    TomorrowMorning,
    TomorrowAfternoon,
    TomorrowNight,
    Tomorrow,
    Tonight,
    ThisAfternoon,
    WhenWill,
    HowLongUntil,
    PrecipitationChange,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemporalIntent {
    pub is_temporal: bool,
    pub cue: Option<TemporalCue>,
    pub target_time: Option<NaiveDateTime>,
}

impl TemporalIntent {
    pub fn none() -> Self {
        Self { is_temporal: false, cue: None, target_time: None }
    }
}

struct TemporalRule {
    cue: TemporalCue,
    regex: Regex,
}

const CLOCK_PATTERN: &str = r"\b(\d{1,2})(?::(\d{2}))?\s*(am\b|pm\b|a\.m\.|p\.m\.)";
const AT_HOUR_PATTERN: &str = r"\bat\s+(\d{1,2})(?::(\d{2}))?\b";

/// Detection rules, highest precedence first.
static RULES: LazyLock<Vec<TemporalRule>> = LazyLock::new(|| {
    [
        (TemporalCue::ClockTime, CLOCK_PATTERN),
        (TemporalCue::AtHour, AT_HOUR_PATTERN),
        (TemporalCue::TomorrowMorning, r"\btomorrow\s+morning\b"),
        (TemporalCue::TomorrowAfternoon, r"\btomorrow\s+afternoon\b"),
        (TemporalCue::TomorrowNight, r"\btomorrow\s+(?:night|evening)\b"),
        (TemporalCue::Tomorrow, r"\btomorrow\b"),
        (TemporalCue::Tonight, r"\btonight\b"),
        (TemporalCue::ThisAfternoon, r"\bthis\s+afternoon\b"),
        (TemporalCue::WhenWill, r"\bwhen\s+will\b"),
        (TemporalCue::HowLongUntil, r"\bhow\s+long\s+until\b"),
        (TemporalCue::PrecipitationChange, r"\b(?:stop|start)\s+(?:raining|snowing)\b"),
    ]
    .into_iter()
    .map(|(cue, pattern)| TemporalRule { cue, regex: compile(pattern) })
    .collect()
});

static CLOCK_RE: LazyLock<Regex> = LazyLock::new(|| compile(CLOCK_PATTERN));
static AT_HOUR_RE: LazyLock<Regex> = LazyLock::new(|| compile(AT_HOUR_PATTERN));

/// Trailing clauses removed before geocoding, applied until nothing changes.
static TRAILING_QUALIFIERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\s+(?:at\s+)?\d{1,2}(?::\d{2})?\s*(?:am|pm|a\.m\.?|p\.m\.?)$",
        r"\s+at\s+\d{1,2}(?::\d{2})?$",
        r"\s+(?:tonight|today|now)$",
        r"\s+this\s+(?:morning|afternoon|evening)$",
        r"\s+tomorrow(?:\s+(?:morning|afternoon|night|evening))?$",
        r"\s+(?:when\s+will|how\s+long\s+until|will\s+it)\b.*$",
        // Topic words asked about a place, e.g. "Buffalo snow" or "Denver in January".
        r"\s+(?:in\s+)?(?:snow(?:fall)?|storms?|accumulations?|blizzards?|weather|forecast|totals?)$",
        r"\s+(?:in\s+)?(?:december|january|february)$",
    ]
    .into_iter()
    .map(compile)
    .collect()
});

static LEADING_QUESTION: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^(?:when\s+will|how\s+long\s+until|will\s+it)\b.*?\bin\s+"));

/// Question lead-ins without "in", e.g. "how long until snow Denver".
static LEADING_CUE: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"^(?:when\s+will|how\s+long\s+until|will)\s+(?:it\s+)?(?:(?:stop|start)\s+)?(?:snow(?:ing)?|rain(?:ing)?|storm(?:ing)?)\s+",
    )
});

fn compile(pattern: &str) -> Regex {
    Regex::new(&format!("(?i){pattern}")).expect("built-in temporal pattern must compile")
}

/// Extract temporal intent from `query` relative to local wall time `now`.
///
/// Target precedence: explicit clock time, then day-part, then `now`.
pub fn parse(query: &str, now: NaiveDateTime) -> TemporalIntent {
    let Some(rule) = RULES.iter().find(|rule| rule.regex.is_match(query)) else {
        return TemporalIntent::none();
    };

    let target = explicit_clock_time(query, now)
        .or_else(|| day_part_time(query, now))
        .unwrap_or(now);

    TemporalIntent { is_temporal: true, cue: Some(rule.cue), target_time: Some(target) }
}

/// Remove trailing temporal clauses so the rest can be geocoded.
pub fn strip_qualifiers(query: &str) -> String {
    let mut current = trim_query(query).to_string();

    if let Some(m) = LEADING_QUESTION.find(&current).or_else(|| LEADING_CUE.find(&current)) {
        current = trim_query(&current[m.end()..]).to_string();
    }

    loop {
        let before = current.len();
        for re in TRAILING_QUALIFIERS.iter() {
            current = trim_query(&re.replace(&current, "")).to_string();
        }
        if current.len() == before {
            break;
        }
    }

    current
}

fn trim_query(s: &str) -> &str {
    s.trim().trim_end_matches([',', '?', '!', '.', ' '])
}

fn explicit_clock_time(query: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let (hour, minute) = CLOCK_RE
        .captures_iter(query)
        .find_map(|caps| {
            let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
            let minute = parse_minute(caps.get(2))?;
            let meridiem = caps.get(3)?.as_str().to_ascii_lowercase();
            to_24h(hour, &meridiem).map(|h| (h, minute))
        })
        .or_else(|| {
            AT_HOUR_RE.captures_iter(query).find_map(|caps| {
                let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
                let minute = parse_minute(caps.get(2))?;
                (hour < 24).then_some((hour, minute))
            })
        })?;

    let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
    let candidate = now.date().and_time(time);
    if candidate > now {
        Some(candidate)
    } else {
        Some(candidate + Duration::days(1))
    }
}

fn parse_minute(m: Option<regex::Match<'_>>) -> Option<u32> {
    match m {
        None => Some(0),
        Some(m) => m.as_str().parse().ok().filter(|min| *min < 60),
    }
}

fn to_24h(hour: u32, meridiem: &str) -> Option<u32> {
    if !(1..=12).contains(&hour) {
        return None;
    }
    let pm = meridiem.starts_with('p');
    Some(match (hour, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, true) => h + 12,
        (h, false) => h,
    })
}

fn day_part_time(query: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let today = now.date();
    let tomorrow = today.succ_opt()?;

    let cue = RULES
        .iter()
        .filter(|rule| {
            matches!(
                rule.cue,
                TemporalCue::TomorrowMorning
                    | TemporalCue::TomorrowAfternoon
                    | TemporalCue::TomorrowNight
                    | TemporalCue::Tomorrow
                    | TemporalCue::Tonight
                    | TemporalCue::ThisAfternoon
            )
        })
        .find(|rule| rule.regex.is_match(query))?
        .cue;

    match cue {
        TemporalCue::TomorrowMorning => at_hour(tomorrow, 8),
        TemporalCue::TomorrowAfternoon => at_hour(tomorrow, 14),
        TemporalCue::TomorrowNight => at_hour(tomorrow, 20),
        TemporalCue::Tomorrow => at_hour(tomorrow, 12),
        TemporalCue::Tonight => at_hour(today, 20).map(|t| t.max(now)),
        TemporalCue::ThisAfternoon => at_hour(today, 15).filter(|t| *t > now),
        _ => None,
    }
}

fn at_hour(date: NaiveDate, hour: u32) -> Option<NaiveDateTime> {
    date.and_hms_opt(hour, 0, 0)
}
