//! Display formatting shared by dashboard front-ends

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

/// Format an amount as US dollars, e.g. `$1,234.56` or `-$40.00`
pub fn format_usd(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.2}", rounded.abs());
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}${}.{}", if negative { "-" } else { "" }, grouped, cents)
}

/// Human "time ago" string, switching to a calendar date after a week
pub fn format_relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds().max(0);

    if secs < 60 {
        return plural(secs, "sec", "secs");
    }
    let mins = secs / 60;
    if mins < 60 {
        return plural(mins, "min", "mins");
    }
    let hours = mins / 60;
    if hours < 24 {
        return plural(hours, "hour", "hours");
    }
    let days = hours / 24;
    if days < 7 {
        return plural(days, "day", "days");
    }
    then.format("%b %d, %Y").to_string()
}

fn plural(n: i64, one: &str, many: &str) -> String {
    if n == 1 {
        format!("1 {} ago", one)
    } else {
        format!("{} {} ago", n, many)
    }
}
