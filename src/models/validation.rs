use super::{CustomerInfo, ValidationError, ValidationResult};

/// Trait for validating input models
pub trait Validate {
    fn validate(&self) -> ValidationResult<()>;
}

/// Validation constants
pub const MAX_CUSTOMER_NAME_LENGTH: usize = 200;
pub const MAX_CUSTOMER_EMAIL_LENGTH: usize = 254;
pub const MAX_CUSTOMER_PHONE_LENGTH: usize = 30;
pub const MAX_DELIVERY_ADDRESS_LENGTH: usize = 500;

impl Validate for CustomerInfo {
    fn validate(&self) -> ValidationResult<()> {
        validate_required_field("customer_name", &self.name, MAX_CUSTOMER_NAME_LENGTH)?;
        validate_required_field("customer_email", &self.email, MAX_CUSTOMER_EMAIL_LENGTH)?;
        validate_required_field("customer_phone", &self.phone, MAX_CUSTOMER_PHONE_LENGTH)?;
        validate_required_field("delivery_address", &self.address, MAX_DELIVERY_ADDRESS_LENGTH)?;
        Ok(())
    }
}

/// Validate that a required checkout field is non-empty (after trimming)
/// and within its length bound.
pub fn validate_required_field(
    field: &str,
    value: &str,
    max_length: usize,
) -> ValidationResult<()> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::RequiredField {
            field: field.to_string(),
        });
    }

    if trimmed.len() > max_length {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max_length,
            actual_length: trimmed.len(),
        });
    }

    if trimmed
        .chars()
        .any(|c| c.is_control() && c != '\n' && c != '\r' && c != '\t')
    {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: "Contains invalid control characters".to_string(),
        });
    }

    Ok(())
}
