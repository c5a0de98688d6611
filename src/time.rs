use once_cell::sync::Lazy;
use regex::Regex;

static HOURS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*hour").expect("valid hours regex"));
static MINUTES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*minute").expect("valid minutes regex"));
static SECONDS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*second").expect("valid seconds regex"));

/// Formats seconds as `M:SS`, or `H:MM:SS` once an hour is reached.
/// Negative input is shown as `0:00`.
pub fn format_time(secs: i64) -> String {
    let secs = secs.max(0);
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("{} {}", n, unit)
    } else {
        format!("{} {}s", n, unit)
    }
}

/// Long form used in task tables, e.g. `1 hour 2 minutes 3 seconds`.
pub fn format_duration(secs: i64) -> String {
    let secs = secs.max(0);
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;

    format!(
        "{} {} {}",
        plural(h, "hour"),
        plural(m, "minute"),
        plural(s, "second")
    )
}

// Amount captured by `re`, 0 when the unit is absent. Numbers too large for
// a u64 give None.
fn amount(re: &Regex, text: &str) -> Option<u64> {
    match re.captures(text) {
        Some(caps) => caps[1].parse().ok(),
        None => Some(0),
    }
}

/// Parses text like `"1 hour 2 minutes 3 seconds"`. Missing units count as
/// zero, so unrecognised text yields `Some(0)`; empty input yields `None`.
pub fn parse_human_duration(input: &str) -> Option<u64> {
    if input.is_empty() {
        return None;
    }
    let lower = input.to_lowercase();

    let h = amount(&HOURS_RE, &lower)?;
    let m = amount(&MINUTES_RE, &lower)?;
    let s = amount(&SECONDS_RE, &lower)?;

    h.checked_mul(3600)?
        .checked_add(m.checked_mul(60)?)?
        .checked_add(s)
}

/// Parses `H:MM:SS`. Minutes and seconds must be within 0..=59.
pub fn parse_hms_duration(input: &str) -> Option<u64> {
    if input.is_empty() {
        return None;
    }
    let parts: Vec<&str> = input.split(':').map(str::trim).collect();
    if parts.len() != 3 {
        return None;
    }

    let mut values = [0u64; 3];
    for (value, part) in values.iter_mut().zip(&parts) {
        if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        *value = part.parse().ok()?;
    }

    let [h, m, s] = values;
    if m > 59 || s > 59 {
        return None;
    }
    h.checked_mul(3600)?.checked_add(m * 60 + s)
}

/// Accepts either `H:MM:SS` or the long human form.
pub fn parse_duration(input: &str) -> Option<u64> {
    let input = input.trim();
    if input.contains(':') {
        return parse_hms_duration(input);
    }
    parse_human_duration(input)
}

/// A task length in whole seconds: positive and within `i64`.
pub fn parse_task_duration(input: &str) -> Option<i64> {
    let secs = parse_duration(input)?;
    match i64::try_from(secs) {
        Ok(secs) if secs > 0 => Some(secs),
        _ => None,
    }
}
