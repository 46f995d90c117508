//! Field-level badge validation, independent of any storage engine.
//!
//! [`validate_fields`] turns a [`BadgeInput`] into [`BadgeFields`]: it
//! trims, applies defaults for absent fields and checks every per-field
//! rule. All failures are collected so the caller can report them at once.
//! No cross-field validation is performed (an end date before
//! the start date is accepted).

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use super::badge::{
    BadgeFields, BadgeInput, DEFAULT_COLOR, DEFAULT_URGENCY_THRESHOLD_SECS, TimerPosition,
    TimerSize, UrgencyNotification,
};

/// Minimum length of a timer name, in characters, after trimming.
pub const MIN_NAME_CHARS: usize = 3;

/// Maximum length of a promotion description, in characters, after trimming.
pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// Largest accepted urgency trigger threshold, in seconds. Every store
/// backend must be able to hold it as a signed 64-bit integer.
pub const MAX_URGENCY_THRESHOLD_SECS: u64 = i64::MAX.unsigned_abs();

#[allow(clippy::expect_used)]
static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{2}/[0-9]{2}/[0-9]{4}$").expect("valid date regex"));

#[allow(clippy::expect_used)]
static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{2}:[0-9]{2}$").expect("valid time regex"));

#[allow(clippy::expect_used)]
static COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("valid color regex"));

/// A single field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// JSON field name (camelCase).
    pub field: &'static str,
    /// Human-readable message.
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// All field failures for one payload, in field order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl std::error::Error for ValidationErrors {}

impl ValidationErrors {
    /// Returns `true` if `field` is among the failures.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Badge validation failed: ")?;
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        f.write_str(&parts.join(", "))
    }
}

/// Validates `input` and fills defaults for every absent optional field.
///
/// # Errors
///
/// Returns [`ValidationErrors`] listing every field that failed.
pub fn validate_fields(input: &BadgeInput) -> Result<BadgeFields, ValidationErrors> {
    let mut errors = Vec::new();

    let timer_name = input.timer_name.as_deref().map(str::trim).unwrap_or_default();
    if timer_name.is_empty() {
        errors.push(FieldError::new("timerName", "Timer name is required"));
    } else if timer_name.chars().count() < MIN_NAME_CHARS {
        errors.push(FieldError::new(
            "timerName",
            "Timer name must be at least 3 characters",
        ));
    }

    let start_date = check_pattern(
        &mut errors,
        "startDate",
        input.start_date.as_deref(),
        &DATE_RE,
        "Start date must be in MM/DD/YYYY format or empty",
    );
    let start_time = check_pattern(
        &mut errors,
        "startTime",
        input.start_time.as_deref(),
        &TIME_RE,
        "Start time must be in HH:MM format or empty",
    );
    let end_date = check_pattern(
        &mut errors,
        "endDate",
        input.end_date.as_deref(),
        &DATE_RE,
        "End date must be in MM/DD/YYYY format or empty",
    );
    let end_time = check_pattern(
        &mut errors,
        "endTime",
        input.end_time.as_deref(),
        &TIME_RE,
        "End time must be in HH:MM format or empty",
    );

    let promotion_description = input
        .promotion_description
        .as_deref()
        .map(str::trim)
        .unwrap_or_default();
    if promotion_description.chars().count() > MAX_DESCRIPTION_CHARS {
        errors.push(FieldError::new(
            "promotionDescription",
            "Promotion description cannot exceed 500 characters",
        ));
    }

    let color = input.color.as_deref().unwrap_or(DEFAULT_COLOR);
    if !COLOR_RE.is_match(color) {
        errors.push(FieldError::new(
            "color",
            "Color must be a valid hex color (e.g., #RRGGBB)",
        ));
    }

    let timer_size = check_enum::<TimerSize>(
        &mut errors,
        "timerSize",
        input.timer_size.as_deref(),
        "Timer size must be Small, Medium, or Large",
    );
    let timer_position = check_enum::<TimerPosition>(
        &mut errors,
        "timerPosition",
        input.timer_position.as_deref(),
        "Timer position must be Top, Bottom, Left, or Right",
    );
    let urgency_notification = check_enum::<UrgencyNotification>(
        &mut errors,
        "urgencyNotification",
        input.urgency_notification.as_deref(),
        "Urgency notification must be Color pulse, Notification banner, or None",
    );

    let urgency_trigger_threshold = match parse_threshold(input.urgency_trigger_threshold.as_ref())
    {
        Ok(secs) => secs,
        Err(message) => {
            errors.push(FieldError::new("urgencyTriggerThreshold", message));
            DEFAULT_URGENCY_THRESHOLD_SECS
        }
    };

    if !errors.is_empty() {
        return Err(ValidationErrors(errors));
    }

    Ok(BadgeFields {
        timer_name: timer_name.to_string(),
        start_date,
        start_time,
        end_date,
        end_time,
        promotion_description: promotion_description.to_string(),
        color: color.to_string(),
        timer_size,
        timer_position,
        urgency_notification,
        urgency_trigger_threshold,
    })
}

fn check_pattern(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: Option<&str>,
    pattern: &Regex,
    message: &str,
) -> String {
    let value = value.unwrap_or_default();
    if !value.is_empty() && !pattern.is_match(value) {
        errors.push(FieldError::new(field, message));
    }
    value.to_string()
}

fn check_enum<T>(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: Option<&str>,
    message: &str,
) -> T
where
    T: std::str::FromStr + Default,
{
    match value {
        None => T::default(),
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            errors.push(FieldError::new(field, message));
            T::default()
        }),
    }
}

/// Accepts a non-negative whole number of seconds given either as a JSON
/// number or as a numeric string. `null` and absence mean the default.
fn parse_threshold(value: Option<&serde_json::Value>) -> Result<u64, &'static str> {
    const NEGATIVE: &str = "Urgency trigger threshold cannot be negative";
    const NOT_WHOLE: &str = "Urgency trigger threshold must be a whole number of seconds";
    const TOO_LARGE: &str = "Urgency trigger threshold is too large";

    let number = match value {
        None | Some(serde_json::Value::Null) => return Ok(DEFAULT_URGENCY_THRESHOLD_SECS),
        Some(serde_json::Value::Number(n)) => n.clone(),
        Some(serde_json::Value::String(s)) => s
            .trim()
            .parse::<serde_json::Number>()
            .map_err(|_| NOT_WHOLE)?,
        Some(_) => return Err(NOT_WHOLE),
    };

    let secs = if let Some(secs) = number.as_u64() {
        secs
    } else if number.as_i64().is_some() {
        return Err(NEGATIVE);
    } else {
        match number.as_f64() {
            Some(f) if f < 0.0 => return Err(NEGATIVE),
            // Saturating cast; anything past the cap is rejected below.
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            Some(f) if f.is_finite() && f.fract() == 0.0 => f as u64,
            _ => return Err(NOT_WHOLE),
        }
    };
    if secs > MAX_URGENCY_THRESHOLD_SECS {
        return Err(TOO_LARGE);
    }
    Ok(secs)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(name: &str) -> BadgeInput {
        BadgeInput {
            timer_name: Some(name.to_string()),
            ..BadgeInput::default()
        }
    }

    #[test]
    fn defaults_fill_every_optional_field() {
        let Ok(fields) = validate_fields(&input("Sale")) else {
            panic!("minimal input should validate");
        };
        assert_eq!(fields, BadgeFields::with_name("Sale"));
    }

    #[test]
    fn name_is_trimmed_before_length_check() {
        let Err(errors) = validate_fields(&input("  ab  ")) else {
            panic!("two-character name should fail");
        };
        assert!(errors.has_field("timerName"));

        let Ok(fields) = validate_fields(&input("  Sale  ")) else {
            panic!("trimmed name should validate");
        };
        assert_eq!(fields.timer_name, "Sale");
    }

    #[test]
    fn date_and_time_patterns() {
        let mut bad = input("Sale");
        bad.start_date = Some("2025-08-01".to_string());
        bad.end_time = Some("9:30".to_string());
        let Err(errors) = validate_fields(&bad) else {
            panic!("bad formats should fail");
        };
        assert!(errors.has_field("startDate"));
        assert!(errors.has_field("endTime"));
        assert_eq!(errors.0.len(), 2);

        let mut good = input("Sale");
        good.start_date = Some("08/01/2025".to_string());
        good.start_time = Some("09:30".to_string());
        good.end_date = Some(String::new());
        assert!(validate_fields(&good).is_ok());

        let mut arabic_indic = input("Sale");
        arabic_indic.start_date = Some("٠٨/٠١/٢٠٢٥".to_string());
        arabic_indic.start_time = Some("١٢:٣٠".to_string());
        let Err(errors) = validate_fields(&arabic_indic) else {
            panic!("non-ASCII digits should fail");
        };
        assert!(errors.has_field("startDate"));
        assert!(errors.has_field("startTime"));
    }

    #[test]
    fn end_before_start_is_not_checked() {
        let mut payload = input("Sale");
        payload.start_date = Some("08/10/2025".to_string());
        payload.end_date = Some("08/01/2025".to_string());
        assert!(validate_fields(&payload).is_ok());
    }

    #[test]
    fn color_must_be_six_digit_hex() {
        for bad in ["78CCB3", "#78CCB", "#GGGGGG", ""] {
            let mut payload = input("Sale");
            payload.color = Some(bad.to_string());
            let Err(errors) = validate_fields(&payload) else {
                panic!("{bad:?} should be rejected");
            };
            assert!(errors.has_field("color"));
        }
        let mut payload = input("Sale");
        payload.color = Some("#ff00aa".to_string());
        assert!(validate_fields(&payload).is_ok());
    }

    #[test]
    fn description_limit_counts_characters() {
        let mut payload = input("Sale");
        payload.promotion_description = Some("é".repeat(500));
        assert!(validate_fields(&payload).is_ok());
        payload.promotion_description = Some("é".repeat(501));
        let Err(errors) = validate_fields(&payload) else {
            panic!("501 characters should fail");
        };
        assert!(errors.has_field("promotionDescription"));
    }

    #[test]
    fn enum_membership() {
        let mut payload = input("Sale");
        payload.timer_size = Some("Huge".to_string());
        payload.timer_position = Some("Right".to_string());
        let Err(errors) = validate_fields(&payload) else {
            panic!("unknown size should fail");
        };
        assert!(errors.has_field("timerSize"));
        assert!(!errors.has_field("timerPosition"));
    }

    #[test]
    fn threshold_accepts_numbers_and_numeric_strings() {
        for (raw, expected) in [
            (json!(7200), 7200),
            (json!("1800"), 1800),
            (json!(0), 0),
            (json!(3600.0), 3600),
            (json!(null), DEFAULT_URGENCY_THRESHOLD_SECS),
        ] {
            let mut payload = input("Sale");
            payload.urgency_trigger_threshold = Some(raw);
            let Ok(fields) = validate_fields(&payload) else {
                panic!("threshold should validate");
            };
            assert_eq!(fields.urgency_trigger_threshold, expected);
        }
    }

    #[test]
    fn threshold_rejects_negative_and_fractional() {
        for raw in [json!(-1), json!(-0.5), json!(1.5), json!("soon"), json!(true)] {
            let mut payload = input("Sale");
            payload.urgency_trigger_threshold = Some(raw);
            let Err(errors) = validate_fields(&payload) else {
                panic!("threshold should be rejected");
            };
            assert!(errors.has_field("urgencyTriggerThreshold"));
        }
    }

    #[test]
    fn threshold_is_capped_at_signed_64_bit_range() {
        let mut payload = input("Sale");
        payload.urgency_trigger_threshold = Some(json!(MAX_URGENCY_THRESHOLD_SECS));
        let Ok(fields) = validate_fields(&payload) else {
            panic!("i64::MAX seconds should validate");
        };
        assert_eq!(fields.urgency_trigger_threshold, MAX_URGENCY_THRESHOLD_SECS);

        for raw in [
            json!(MAX_URGENCY_THRESHOLD_SECS + 1),
            json!(u64::MAX),
            json!("18446744073709551615"),
            json!(1.0e19),
        ] {
            let mut payload = input("Sale");
            payload.urgency_trigger_threshold = Some(raw);
            let Err(errors) = validate_fields(&payload) else {
                panic!("threshold past i64::MAX should be rejected");
            };
            let Some(error) = errors.0.iter().find(|e| e.field == "urgencyTriggerThreshold") else {
                panic!("threshold error expected");
            };
            assert_eq!(error.message, "Urgency trigger threshold is too large");
        }
    }

    #[test]
    fn display_lists_every_field() {
        let mut payload = input("ab");
        payload.color = Some("red".to_string());
        let Err(errors) = validate_fields(&payload) else {
            panic!("should fail");
        };
        let message = errors.to_string();
        assert!(message.starts_with("Badge validation failed: "));
        assert!(message.contains("timerName: Timer name must be at least 3 characters"));
        assert!(message.contains("color: Color must be a valid hex color"));
    }
}
