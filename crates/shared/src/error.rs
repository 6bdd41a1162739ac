use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Step;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Validation,
    InvalidTransition,
    PreconditionFailed,
}

/// Draft fields a validation failure can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    PackageTier,
    Destination,
    CheckIn,
    CheckOut,
    Adults,
    Children,
    Hotel,
    AddOn,
    LineItem,
    PromoCode,
    BookingNumber,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PackageTier => "package_tier",
            Self::Destination => "destination",
            Self::CheckIn => "check_in",
            Self::CheckOut => "check_out",
            Self::Adults => "adults",
            Self::Children => "children",
            Self::Hotel => "hotel",
            Self::AddOn => "add_on",
            Self::LineItem => "line_item",
            Self::PromoCode => "promo_code",
            Self::BookingNumber => "booking_number",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    SelectPackage,
    SubmitSearch,
    SelectHotel,
    AddOn,
    RemoveItem,
    ConfirmReview,
    ApplyPromo,
    Pay,
    Back,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SelectPackage => "select_package",
            Self::SubmitSearch => "submit_search",
            Self::SelectHotel => "select_hotel",
            Self::AddOn => "add_on",
            Self::RemoveItem => "remove_item",
            Self::ConfirmReview => "confirm_review",
            Self::ApplyPromo => "apply_promo",
            Self::Pay => "pay",
            Self::Back => "back",
        };
        f.write_str(name)
    }
}

/// Rejection reasons for a flow operation. A rejected operation never
/// changes controller state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("invalid {field}: {message}")]
    Validation { field: Field, message: String },
    #[error("{operation} is not allowed at step {step}")]
    InvalidTransition { operation: Operation, step: Step },
    #[error("{operation} precondition failed: {reason}")]
    PreconditionFailed { operation: Operation, reason: String },
}

impl FlowError {
    pub fn validation(field: Field, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn invalid_transition(operation: Operation, step: Step) -> Self {
        Self::InvalidTransition { operation, step }
    }

    pub fn precondition(operation: Operation, reason: impl Into<String>) -> Self {
        Self::PreconditionFailed {
            operation,
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { .. } => ErrorCode::Validation,
            Self::InvalidTransition { .. } => ErrorCode::InvalidTransition,
            Self::PreconditionFailed { .. } => ErrorCode::PreconditionFailed,
        }
    }

    pub fn field(&self) -> Option<Field> {
        match self {
            Self::Validation { field, .. } => Some(*field),
            _ => None,
        }
    }

    /// Validation failures are for the user to fix; the others point at a
    /// screen that offered an action it should not have.
    pub fn is_user_correctable(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

/// Serializable form of [`FlowError`] handed to screens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: ErrorCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<Field>,
    pub message: String,
}

impl ErrorPayload {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            field: None,
            message: message.into(),
        }
    }
}

impl From<FlowError> for ErrorPayload {
    fn from(value: FlowError) -> Self {
        Self {
            code: value.code(),
            field: value.field(),
            message: value.to_string(),
        }
    }
}

impl From<&FlowError> for ErrorPayload {
    fn from(value: &FlowError) -> Self {
        value.clone().into()
    }
}
