//! Common validation utilities.

use validator::ValidationError;

lazy_static::lazy_static! {
    /// Kenyan mobile number in any accepted input form.
    static ref MSISDN_REGEX: regex::Regex =
        regex::Regex::new(r"^(?:\+?254|0)?([17]\d{8})$").unwrap();

    /// Non-negative decimal with at most two fractional digits.
    static ref DECIMAL_AMOUNT_REGEX: regex::Regex =
        regex::Regex::new(r"^(\d{1,12})(?:\.(\d{1,2}))?$").unwrap();
}

/// Normalizes a Kenyan mobile number to the `2547XXXXXXXX` form used by
/// mobile-money providers.
///
/// Accepts `07XXXXXXXX`, `01XXXXXXXX`, `7XXXXXXXX`, `2547XXXXXXXX` and
/// `+2547XXXXXXXX`, ignoring spaces and dashes.
pub fn normalize_msisdn(input: &str) -> Option<String> {
    let compact: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();

    MSISDN_REGEX
        .captures(&compact)
        .and_then(|caps| caps.get(1))
        .map(|subscriber| format!("254{}", subscriber.as_str()))
}

/// Validates that a phone number can be normalized to a Kenyan MSISDN.
pub fn validate_msisdn(phone: &str) -> Result<(), ValidationError> {
    if normalize_msisdn(phone).is_some() {
        Ok(())
    } else {
        let mut err = ValidationError::new("msisdn_format");
        err.message = Some("Phone number must be a valid Kenyan mobile number".into());
        Err(err)
    }
}

/// Validates that a string is not empty after trimming.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be blank".into());
        Err(err)
    } else {
        Ok(())
    }
}

/// Parses a decimal amount such as `"65.00"` into minor units (`6500`).
///
/// Returns `None` for negative, malformed, or over-precise values.
pub fn parse_decimal_minor(value: &str) -> Option<i64> {
    let caps = DECIMAL_AMOUNT_REGEX.captures(value.trim())?;
    let major: i64 = caps.get(1)?.as_str().parse().ok()?;
    let minor = match caps.get(2).map(|m| m.as_str()) {
        None => 0,
        Some(frac) if frac.len() == 1 => frac.parse::<i64>().ok()? * 10,
        Some(frac) => frac.parse::<i64>().ok()?,
    };

    major.checked_mul(100)?.checked_add(minor)
}

/// Formats minor units as a decimal string with two fractional digits.
pub fn format_minor(amount_minor: i64) -> String {
    let sign = if amount_minor < 0 { "-" } else { "" };
    let abs = amount_minor.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Lowercases and trims an email address for use as a lookup key.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_msisdn_forms() {
        assert_eq!(normalize_msisdn("0712345678").as_deref(), Some("254712345678"));
        assert_eq!(normalize_msisdn("712345678").as_deref(), Some("254712345678"));
        assert_eq!(normalize_msisdn("254712345678").as_deref(), Some("254712345678"));
        assert_eq!(normalize_msisdn("+254712345678").as_deref(), Some("254712345678"));
        assert_eq!(normalize_msisdn("0112345678").as_deref(), Some("254112345678"));
    }

    #[test]
    fn test_normalize_msisdn_ignores_separators() {
        assert_eq!(
            normalize_msisdn("0712 345-678").as_deref(),
            Some("254712345678")
        );
    }

    #[test]
    fn test_normalize_msisdn_rejects_invalid() {
        assert!(normalize_msisdn("").is_none());
        assert!(normalize_msisdn("N/A").is_none());
        assert!(normalize_msisdn("0812345678").is_none());
        assert!(normalize_msisdn("07123456").is_none());
        assert!(normalize_msisdn("2557123456789").is_none());
    }

    #[test]
    fn test_validate_msisdn_error_message() {
        let err = validate_msisdn("12345").unwrap_err();
        assert_eq!(
            err.message.unwrap().to_string(),
            "Phone number must be a valid Kenyan mobile number"
        );
    }

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("QWE123").is_ok());
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank("   ").is_err());
    }

    #[test]
    fn test_parse_decimal_minor() {
        assert_eq!(parse_decimal_minor("65.00"), Some(6500));
        assert_eq!(parse_decimal_minor("6.5"), Some(650));
        assert_eq!(parse_decimal_minor("49"), Some(4900));
        assert_eq!(parse_decimal_minor(" 2340.00 "), Some(234000));
        assert_eq!(parse_decimal_minor("0.05"), Some(5));
    }

    #[test]
    fn test_parse_decimal_minor_rejects_malformed() {
        assert_eq!(parse_decimal_minor("-1.00"), None);
        assert_eq!(parse_decimal_minor("1.005"), None);
        assert_eq!(parse_decimal_minor("abc"), None);
        assert_eq!(parse_decimal_minor(""), None);
        assert_eq!(parse_decimal_minor("1,000"), None);
    }

    #[test]
    fn test_format_minor() {
        assert_eq!(format_minor(650), "6.50");
        assert_eq!(format_minor(234000), "2340.00");
        assert_eq!(format_minor(5), "0.05");
        assert_eq!(format_minor(-150), "-1.50");
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  User@Example.COM "), "user@example.com");
    }
}
