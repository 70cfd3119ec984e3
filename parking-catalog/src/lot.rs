use parking_core::LedgerError;
use parking_shared::LotDraft;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum LotError {
    #[error("{0} must not be empty")]
    MissingField(&'static str),

    #[error("Hourly rate must be a non-negative number, got {0}")]
    InvalidRate(f64),

    #[error("Capacity must not be negative, got {0}")]
    InvalidCapacity(i32),
}

impl From<LotError> for LedgerError {
    fn from(err: LotError) -> Self {
        LedgerError::Validation(err.to_string())
    }
}

/// Trim text fields and check ranges before a lot is stored.
pub fn validate_draft(draft: LotDraft) -> Result<LotDraft, LotError> {
    let location = required("location", &draft.location)?;
    let address = required("address", &draft.address)?;
    let postal_code = required("postal code", &draft.postal_code)?;

    if !draft.hourly_rate.is_finite() || draft.hourly_rate < 0.0 {
        return Err(LotError::InvalidRate(draft.hourly_rate));
    }
    if draft.capacity < 0 {
        return Err(LotError::InvalidCapacity(draft.capacity));
    }

    Ok(LotDraft {
        location,
        address,
        postal_code,
        ..draft
    })
}

fn required(field: &'static str, value: &str) -> Result<String, LotError> {
    let value = value.trim();
    if value.is_empty() {
        Err(LotError::MissingField(field))
    } else {
        Ok(value.to_string())
    }
}
