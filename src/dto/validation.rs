//! Validation helpers for DTOs.

use validator::ValidationError;

/// Length of a room invitation code.
pub const INVITATION_CODE_LEN: usize = 6;

/// Validates that an invitation code is exactly 6 ASCII alphanumeric characters.
///
/// Surrounding whitespace is ignored; case is not significant.
///
/// # Examples
///
/// ```ignore
/// validate_invitation_code("AB12CD") // Ok
/// validate_invitation_code("ab12cd") // Ok
/// validate_invitation_code("AB12C")  // Err - too short
/// validate_invitation_code("AB-12C") // Err - not alphanumeric
/// ```
pub fn validate_invitation_code(code: &str) -> Result<(), ValidationError> {
    let code = code.trim();
    let len = code.chars().count();
    if len != INVITATION_CODE_LEN {
        let mut err = ValidationError::new("invitation_code_length");
        err.message = Some(
            format!("El código debe tener {INVITATION_CODE_LEN} caracteres (tiene {len})").into(),
        );
        return Err(err);
    }

    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        let mut err = ValidationError::new("invitation_code_format");
        err.message = Some("El código solo puede contener letras y números".into());
        return Err(err);
    }

    Ok(())
}

/// Canonical form of an invitation code as the backend stores it.
pub fn normalize_invitation_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}
