//! Field validators for customer-supplied data.
//!
//! CPF and CEP values are accepted with or without their usual punctuation (`529.982.247-25`, `01310-100`). The
//! normalized forms stored on orders are digits only.
use ogw_common::helpers::digits_only;
use once_cell::sync::OnceCell;
use regex::Regex;
use thiserror::Error;

const STATES: [&str; 27] = [
    "AC", "AL", "AP", "AM", "BA", "CE", "DF", "ES", "GO", "MA", "MT", "MS", "MG", "PA", "PB", "PR", "PE", "PI", "RJ",
    "RN", "RS", "RO", "RR", "SC", "SP", "SE", "TO",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {field}: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new<F: Into<String>, R: Into<String>>(field: F, reason: R) -> Self {
        Self { field: field.into(), reason: reason.into() }
    }
}

fn email_pattern() -> Result<&'static Regex, ValidationError> {
    static EMAIL: OnceCell<Regex> = OnceCell::new();
    EMAIL
        .get_or_try_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$"))
        .map_err(|e| ValidationError::new("email", format!("pattern error. {e}")))
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email_pattern()?.is_match(email.trim()) {
        Ok(())
    } else {
        Err(ValidationError::new("email", format!("'{email}' is not an email address")))
    }
}

/// Returns the 8-digit CEP.
pub fn normalize_postal_code(cep: &str) -> Result<String, ValidationError> {
    let cleaned = cep.trim();
    if cleaned.chars().any(|c| !(c.is_ascii_digit() || c == '-' || c == '.' || c == ' ')) {
        return Err(ValidationError::new("postal_code", format!("'{cep}' contains invalid characters")));
    }
    let digits = digits_only(cleaned);
    if digits.len() == 8 {
        Ok(digits)
    } else {
        Err(ValidationError::new("postal_code", "a CEP has 8 digits"))
    }
}

/// Returns the upper-cased two-letter state code.
pub fn normalize_state(uf: &str) -> Result<String, ValidationError> {
    let uf = uf.trim().to_ascii_uppercase();
    if STATES.contains(&uf.as_str()) {
        Ok(uf)
    } else {
        Err(ValidationError::new("state", format!("'{uf}' is not a Brazilian state")))
    }
}

/// Checks the CPF check digits and returns the 11-digit CPF.
pub fn normalize_cpf(cpf: &str) -> Result<String, ValidationError> {
    let digits = digits_only(cpf);
    if digits.len() != 11 {
        return Err(ValidationError::new("cpf", "a CPF has 11 digits"));
    }
    let d: Vec<u32> = digits.chars().filter_map(|c| c.to_digit(10)).collect();
    if d.iter().all(|&x| x == d[0]) {
        return Err(ValidationError::new("cpf", "check digits do not match"));
    }
    let check = |len: usize| {
        let sum: u32 = d[..len].iter().enumerate().map(|(i, x)| x * (len as u32 + 1 - i as u32)).sum();
        let rem = (sum * 10) % 11;
        if rem == 10 {
            0
        } else {
            rem
        }
    };
    if check(9) == d[9] && check(10) == d[10] {
        Ok(digits)
    } else {
        Err(ValidationError::new("cpf", "check digits do not match"))
    }
}

pub fn require_non_empty(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new(field, "must not be empty"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn cpf() {
        assert_eq!(normalize_cpf("529.982.247-25").unwrap(), "52998224725");
        assert_eq!(normalize_cpf("52998224725").unwrap(), "52998224725");
        assert_eq!(normalize_cpf("111.444.777-35").unwrap(), "11144477735");
        assert!(normalize_cpf("529.982.247-26").is_err());
        assert!(normalize_cpf("111.111.111-11").is_err());
        assert!(normalize_cpf("1234").is_err());
    }

    #[test]
    fn postal_codes() {
        assert_eq!(normalize_postal_code("01310-100").unwrap(), "01310100");
        assert_eq!(normalize_postal_code(" 01310100 ").unwrap(), "01310100");
        assert!(normalize_postal_code("0131010").is_err());
        assert!(normalize_postal_code("01310-10a").is_err());
    }

    #[test]
    fn states_and_emails() {
        assert_eq!(normalize_state("sp").unwrap(), "SP");
        assert!(normalize_state("XX").is_err());
        assert!(validate_email("ana@example.com").is_ok());
        assert!(validate_email("ana@example").is_err());
        assert!(validate_email("ana example@x.com").is_err());
        let err = validate_email("").unwrap_err();
        assert_eq!(err.field, "email");
    }
}
