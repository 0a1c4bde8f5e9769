use tessera_shared::constants::{MAX_IDENTIFIER_LEN, RESERVED_ENTRY_KEY};

use crate::error::{Result, StoreError};

/// Identifiers are 1-64 ASCII letters, digits, `_` or `-`, starting with a
/// letter.  The same rule covers apps, models, fields and enumerations.
pub fn validate_identifier(identifier: &str) -> Result<()> {
    let mut chars = identifier.chars();
    let Some(first) = chars.next() else {
        return Err(StoreError::Invalid("identifier must not be empty".into()));
    };
    if identifier.len() > MAX_IDENTIFIER_LEN {
        return Err(StoreError::Invalid(format!(
            "identifier '{identifier}' exceeds {MAX_IDENTIFIER_LEN} characters"
        )));
    }
    if !first.is_ascii_alphabetic()
        || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(StoreError::Invalid(format!(
            "identifier '{identifier}' must start with a letter and contain only letters, digits, '_' or '-'"
        )));
    }
    Ok(())
}

/// Field identifiers additionally may not shadow the entry id.
pub fn validate_field_identifier(identifier: &str) -> Result<()> {
    validate_identifier(identifier)?;
    if identifier == RESERVED_ENTRY_KEY {
        return Err(StoreError::Invalid(format!(
            "'{RESERVED_ENTRY_KEY}' is reserved for the entry id"
        )));
    }
    Ok(())
}

pub(crate) fn require_non_empty(what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(StoreError::Invalid(format!("{what} must not be empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_identifiers() {
        for ok in ["article", "blogPost", "hero_image", "v2-title"] {
            assert!(validate_identifier(ok).is_ok(), "{ok}");
        }
    }

    #[test]
    fn rejects_malformed_identifiers() {
        for bad in ["", "1st", "has space", "semi;colon", "_lead"] {
            assert!(validate_identifier(bad).is_err(), "{bad}");
        }
        assert!(validate_identifier(&"a".repeat(MAX_IDENTIFIER_LEN + 1)).is_err());
    }

    #[test]
    fn field_identifier_cannot_be_id() {
        assert!(matches!(
            validate_field_identifier("id"),
            Err(StoreError::Invalid(_))
        ));
        assert!(validate_field_identifier("identity").is_ok());
    }
}
