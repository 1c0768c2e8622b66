//! Text-format checks: data type coercion and facet constraints.

use sdmx_common::parse_f64;
use sdmx_model::{Facet, FacetType, FacetValueType};

use crate::rules::ComponentRule;

/// First facet or type failure for a non-empty value, as a reason.
pub(crate) fn check(rule: &ComponentRule, value: &str) -> Option<String> {
    if let Some(text_type) = rule.text_type
        && !text_type.is_time_period()
        && !conforms_to_type(text_type, value)
    {
        return Some(format!("value {value} is not a valid {text_type}"));
    }

    let numeric = parse_f64(value);
    let length = value.chars().count();
    for facet in &rule.facets {
        let failed = match facet.facet_type {
            FacetType::MinLength => facet.as_usize().is_some_and(|min| length < min),
            FacetType::MaxLength => facet.as_usize().is_some_and(|max| length > max),
            FacetType::MinValue => below(numeric, facet.as_f64()),
            FacetType::MaxValue => above(numeric, facet.as_f64()),
            FacetType::StartValue => below(numeric, facet.as_f64()),
            FacetType::EndValue => above(numeric, facet.as_f64()),
            FacetType::Decimals => facet
                .as_usize()
                .is_some_and(|max| numeric.is_some() && fraction_digits(value) > max),
            FacetType::Pattern => rule.pattern.as_ref().is_some_and(|re| !re.is_match(value)),
            FacetType::StartTime => before_time(value, &facet.facet_value),
            FacetType::EndTime => before_time(&facet.facet_value, value),
            FacetType::IsSequence | FacetType::Interval | FacetType::TimeInterval => false,
        };
        if failed {
            return Some(format!(
                "value {value} not compliant with {} : {}",
                facet.facet_type.as_str(),
                facet.facet_value
            ));
        }
    }

    check_sequence(rule, value, numeric)
}

/// A numeric facet fails for values that are not numbers at all.
fn below(value: Option<f64>, bound: Option<f64>) -> bool {
    match (value, bound) {
        (Some(v), Some(b)) => v < b,
        (None, Some(_)) => true,
        _ => false,
    }
}

fn above(value: Option<f64>, bound: Option<f64>) -> bool {
    match (value, bound) {
        (Some(v), Some(b)) => v > b,
        (None, Some(_)) => true,
        _ => false,
    }
}

/// Compare on the shared prefix so `2020` and `2020-01-01` line up.
fn before_time(value: &str, bound: &str) -> bool {
    let common = value.len().min(bound.len());
    match (value.get(..common), bound.get(..common)) {
        (Some(v), Some(b)) => v < b,
        _ => false,
    }
}

fn fraction_digits(value: &str) -> usize {
    let mantissa = value.split(['e', 'E']).next().unwrap_or(value);
    mantissa
        .split_once('.')
        .map_or(0, |(_, fraction)| fraction.len())
}

fn check_sequence(rule: &ComponentRule, value: &str, numeric: Option<f64>) -> Option<String> {
    let is_sequence = rule
        .facet(FacetType::IsSequence)
        .and_then(Facet::as_bool)
        .unwrap_or(false);
    if !is_sequence {
        return None;
    }
    let start = rule.facet(FacetType::StartValue)?.as_f64()?;
    let interval = rule.facet(FacetType::Interval)?.as_f64()?;
    let v = numeric?;
    if interval <= 0.0 {
        return None;
    }
    let steps = (v - start) / interval;
    if (steps - steps.round()).abs() > 1e-9 {
        return Some(format!(
            "value {value} not compliant with sequence : {start} (interval: {interval})"
        ));
    }
    None
}

fn conforms_to_type(text_type: FacetValueType, value: &str) -> bool {
    use FacetValueType as T;
    match text_type {
        T::Count => value.bytes().all(|b| b.is_ascii_digit()),
        t if t.is_integer() => {
            let digits = value.strip_prefix(['-', '+']).unwrap_or(value);
            !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
        }
        T::Numeric => value.bytes().all(|b| b.is_ascii_digit()),
        t if t.is_numeric() => parse_f64(value).is_some(),
        T::Boolean => matches!(value, "true" | "false" | "1" | "0"),
        T::Alpha => value.chars().all(char::is_alphabetic),
        T::AlphaNumeric => value.chars().all(char::is_alphanumeric),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Role;

    fn rule(text_type: Option<FacetValueType>, facets: Vec<Facet>) -> ComponentRule {
        ComponentRule {
            id: "OBS_VALUE".to_string(),
            role: Role::Measure,
            mandatory: true,
            level: None,
            codelist: None,
            text_type,
            facets,
            pattern: None,
        }
    }

    #[test]
    fn test_text_type() {
        let integer = rule(Some(FacetValueType::Integer), vec![]);
        assert!(check(&integer, "-42").is_none());
        assert!(check(&integer, "4.2").is_some());

        let double = rule(Some(FacetValueType::Double), vec![]);
        assert!(check(&double, "3.5").is_none());
        assert!(check(&double, "three").is_some());

        let alpha = rule(Some(FacetValueType::Alpha), vec![]);
        assert!(check(&alpha, "ABC").is_none());
        assert!(check(&alpha, "AB1").is_some());
    }

    #[test]
    fn test_length_and_range() {
        let r = rule(
            None,
            vec![
                Facet::new(FacetType::MaxLength, "3"),
                Facet::new(FacetType::MinValue, "0"),
            ],
        );
        assert!(check(&r, "12").is_none());
        assert!(check(&r, "1234").is_some());
        assert!(check(&r, "-1").is_some());
    }

    #[test]
    fn test_decimals() {
        let r = rule(Some(FacetValueType::Decimal), vec![Facet::new(FacetType::Decimals, "2")]);
        assert!(check(&r, "1.25").is_none());
        assert!(check(&r, "1.255").is_some());
    }

    #[test]
    fn test_sequence() {
        let r = rule(
            Some(FacetValueType::Integer),
            vec![
                Facet::new(FacetType::IsSequence, "true"),
                Facet::new(FacetType::StartValue, "10"),
                Facet::new(FacetType::Interval, "5"),
            ],
        );
        assert!(check(&r, "20").is_none());
        assert!(check(&r, "22").is_some());
        assert!(check(&r, "5").is_some());
    }

    #[test]
    fn test_time_bounds() {
        let r = rule(None, vec![Facet::new(FacetType::StartTime, "2000-01-01")]);
        assert!(check(&r, "2001").is_none());
        assert!(check(&r, "1999-12").is_some());
    }
}
