/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Strips everything except ASCII digits. Used to normalise CPFs, CEPs and phone numbers that users type with
/// punctuation.
pub fn digits_only(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Lower-cases and trims an email address so that lookups are not sensitive to how the customer typed it.
pub fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}
