use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identity record owned by the external user directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub base_salary: Decimal,
    pub document_number: String,
    pub email: String,
}

impl UserProfile {
    /// Given name and surname joined by a single space, skipping absent parts.
    pub fn full_name(&self) -> String {
        [self.name.as_deref(), self.surname.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn profile(name: Option<&str>, surname: Option<&str>) -> UserProfile {
        UserProfile {
            name: name.map(str::to_string),
            surname: surname.map(str::to_string),
            base_salary: dec!(4000),
            document_number: "1".to_string(),
            email: "a@b.c".to_string(),
        }
    }

    #[test]
    fn test_full_name_joins_present_parts() {
        assert_eq!(profile(Some("Ana"), Some("Ruiz")).full_name(), "Ana Ruiz");
        assert_eq!(profile(Some("Ana"), None).full_name(), "Ana");
        assert_eq!(profile(None, Some("Ruiz")).full_name(), "Ruiz");
        assert_eq!(profile(None, None).full_name(), "");
    }
}
