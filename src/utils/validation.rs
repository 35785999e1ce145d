use chrono::{Datelike, NaiveDate, NaiveDateTime, Utc};
use validator::{ValidationError, ValidationErrors};

use crate::errors::FieldErrors;

/// Custom validator wired into the employee form derive.
pub fn validate_adult(date_of_birth: &NaiveDate) -> Result<(), ValidationError> {
    if !is_adult(*date_of_birth, Utc::now().date_naive()) {
        let mut error = ValidationError::new("underage");
        error.message = Some("Employee must be at least 18 years old.".into());
        return Err(error);
    }
    Ok(())
}

/// Age by year subtraction with a month/day tiebreak on the 18th year.
/// Not calendar-exact around leap days, matching the product rule.
pub fn is_adult(date_of_birth: NaiveDate, today: NaiveDate) -> bool {
    let years = today.year() - date_of_birth.year();
    if years != 18 {
        return years > 18;
    }
    (today.month(), today.day()) >= (date_of_birth.month(), date_of_birth.day())
}

/// Flattens `validator` output into the field -> message map handlers
/// report. The first message per field wins; already-reported fields are
/// left untouched.
pub fn collect_field_errors(outcome: Result<(), ValidationErrors>, errors: &mut FieldErrors) {
    let failures = match outcome {
        Ok(()) => return,
        Err(failures) => failures,
    };
    for (field, field_failures) in failures.field_errors() {
        let message = field_failures
            .iter()
            .find_map(|failure| failure.message.as_ref())
            .map(|message| message.to_string())
            .unwrap_or_else(|| format!("{} is invalid.", field));
        errors.entry(field.to_string()).or_insert(message);
    }
}

/// `datetime-local` inputs submit `YYYY-MM-DDTHH:MM`, optionally with
/// seconds.
pub fn parse_datetime_local(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
        .ok()
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Shared shift-time rules for timesheet create and update: both times
/// present, parseable, and strictly ordered. Violations land under the
/// `time` key; the parsed pair is returned only when every check passes.
pub fn parse_shift_times(
    start: &str,
    end: &str,
    errors: &mut FieldErrors,
) -> Option<(NaiveDateTime, NaiveDateTime)> {
    if start.trim().is_empty() || end.trim().is_empty() {
        errors.insert(
            "time".to_string(),
            "Both start and end time are required.".to_string(),
        );
        return None;
    }

    let parsed = match (parse_datetime_local(start), parse_datetime_local(end)) {
        (Some(start_time), Some(end_time)) => (start_time, end_time),
        _ => {
            errors.insert(
                "time".to_string(),
                "Start and end time must be valid date-times.".to_string(),
            );
            return None;
        }
    };

    if parsed.1 <= parsed.0 {
        errors.insert(
            "time".to_string(),
            "End time must be after start time.".to_string(),
        );
        return None;
    }

    Some(parsed)
}
