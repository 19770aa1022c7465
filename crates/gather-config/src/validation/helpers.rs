//! Shared validation helpers.

/// Push an error if `value` is outside `[min, max]`.
pub(crate) fn validate_range(errors: &mut Vec<String>, name: &str, value: u64, min: u64, max: u64) {
    if value < min || value > max {
        errors.push(format!("{name} = {value} is out of range [{min}, {max}]"));
    }
}

/// Push an error if `value` is empty.
pub(crate) fn require_non_empty(errors: &mut Vec<String>, name: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(format!("{name} is required"));
    }
}

/// Push an error unless `value` starts with one of `schemes`.
pub(crate) fn require_scheme(errors: &mut Vec<String>, name: &str, value: &str, schemes: &[&str]) {
    if !value.is_empty() && !schemes.iter().any(|s| value.starts_with(s)) {
        errors.push(format!(
            "{name} must start with one of {}",
            schemes.join(", ")
        ));
    }
}
