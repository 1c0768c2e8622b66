//! SDMX time period grammar.
//!
//! Supports Gregorian periods (YYYY, YYYY-MM, YYYY-MM-DD), reporting periods
//! (YYYY-A1, -S1..2, -T1..3, -Q1..4, -M01..12, -W1..53, -D001..366), ISO
//! date-times and time ranges (`start/duration`).

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use sdmx_model::FacetValueType;

/// Year or year-month.
static GREGORIAN_MONTH_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(19|[2-9][0-9])\d{2}(-(0[1-9]|1[012]))?$").expect("Invalid Gregorian regex")
});

static REPORTING_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(19|[2-9][0-9])\d{2}-(A1|S[1-2]|Q[1-4]|T[1-3]|M(0[1-9]|1[012])|W(5[0-3]|[1-4][0-9]|[1-9])|D(00[1-9]|0[1-9][0-9]|[12][0-9][0-9]|3[0-5][0-9]|36[0-6]))$",
    )
    .expect("Invalid reporting period regex")
});

static DURATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?P(\d+Y)?(\d+M)?(\d+W)?(\d+D)?(T(\d+H)?(\d+M)?(\d+(\.\d+)?S)?)?$")
        .expect("Invalid duration regex")
});

/// Check a value against a time period data type.
pub fn is_valid(text_type: FacetValueType, value: &str) -> bool {
    use FacetValueType as T;
    match text_type {
        T::ObservationalTimePeriod | T::StandardTimePeriod => {
            is_reporting(value) || is_basic(value)
        }
        T::BasicTimePeriod => is_basic(value),
        T::GregorianTimePeriod => is_gregorian(value),
        T::GregorianYear => value.len() == 4 && GREGORIAN_MONTH_REGEX.is_match(value),
        T::GregorianYearMonth => value.len() == 7 && GREGORIAN_MONTH_REGEX.is_match(value),
        T::GregorianDay => is_date(value),
        T::ReportingTimePeriod => is_reporting(value),
        T::ReportingYear => is_reporting_kind(value, 'A'),
        T::ReportingSemester => is_reporting_kind(value, 'S'),
        T::ReportingTrimester => is_reporting_kind(value, 'T'),
        T::ReportingQuarter => is_reporting_kind(value, 'Q'),
        T::ReportingMonth => is_reporting_kind(value, 'M'),
        T::ReportingWeek => is_reporting_kind(value, 'W'),
        T::ReportingDay => is_reporting_kind(value, 'D'),
        T::DateTime => is_datetime(value),
        T::TimeRange => is_time_range(value),
        T::Duration => is_duration(value),
        _ => true,
    }
}

fn is_basic(value: &str) -> bool {
    is_gregorian(value) || is_datetime(value) || is_time_range(value)
}

fn is_gregorian(value: &str) -> bool {
    GREGORIAN_MONTH_REGEX.is_match(value) || is_date(value)
}

fn is_reporting(value: &str) -> bool {
    REPORTING_REGEX.is_match(value)
}

fn is_reporting_kind(value: &str, period: char) -> bool {
    is_reporting(value) && value[5..].starts_with(period)
}

fn is_date(value: &str) -> bool {
    value.len() == 10
        && value.is_ascii()
        && GREGORIAN_MONTH_REGEX.is_match(&value[..7])
        && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

fn is_datetime(value: &str) -> bool {
    DateTime::parse_from_rfc3339(value).is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
}

fn is_duration(value: &str) -> bool {
    DURATION_REGEX.is_match(value)
        && !value.ends_with('P')
        && !value.ends_with('T')
}

fn is_time_range(value: &str) -> bool {
    let Some((start, duration)) = value.split_once('/') else {
        return false;
    };
    (is_date(start) || is_datetime(start)) && is_duration(duration)
}
