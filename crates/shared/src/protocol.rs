use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    domain::{AddOnId, BookingDraft, BookingNumber, HotelRef, PackageTier, PaymentMethod, Step},
    error::ErrorPayload,
};

/// Raw search form as submitted by a screen. Guest counts are signed so a
/// bad counter reaches validation instead of failing to deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub destination: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub adults: i64,
    pub children: i64,
}

impl SearchRequest {
    pub fn new(
        destination: impl Into<String>,
        check_in: NaiveDate,
        check_out: NaiveDate,
        adults: i64,
        children: i64,
    ) -> Self {
        Self {
            destination: destination.into(),
            check_in,
            check_out,
            adults,
            children,
        }
    }
}

/// A screen's request to move the flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Intent {
    Start,
    SelectPackage {
        tier: PackageTier,
    },
    SubmitSearch(SearchRequest),
    SelectHotel {
        hotel: HotelRef,
        /// Falls back to the catalog price when omitted.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        price_cents: Option<u64>,
    },
    AddOn {
        add_on: AddOnId,
    },
    RemoveItem {
        index: usize,
    },
    ConfirmReview,
    ApplyPromo {
        code: String,
    },
    Pay {
        method: PaymentMethod,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        promo_code: Option<String>,
    },
    Back,
    Reset,
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Intent::Start => "start",
            Intent::SelectPackage { .. } => "select_package",
            Intent::SubmitSearch(_) => "submit_search",
            Intent::SelectHotel { .. } => "select_hotel",
            Intent::AddOn { .. } => "add_on",
            Intent::RemoveItem { .. } => "remove_item",
            Intent::ConfirmReview => "confirm_review",
            Intent::ApplyPromo { .. } => "apply_promo",
            Intent::Pay { .. } => "pay",
            Intent::Back => "back",
            Intent::Reset => "reset",
        }
    }
}

/// Immutable copy of the flow handed to screens after every intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowSnapshot {
    pub step: Step,
    pub draft: BookingDraft,
    pub total_cents: u64,
}

/// Notifications for presentation side-channels (narration, effects).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum FlowEvent {
    StepChanged {
        from: Step,
        to: Step,
    },
    DraftReset,
    BookingConfirmed {
        booking_number: BookingNumber,
        tier: PackageTier,
        method: PaymentMethod,
        total_cents: u64,
    },
    IntentRejected {
        intent: String,
        step: Step,
        error: ErrorPayload,
    },
}

/// Result line written by the replay driver for each intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IntentOutcome {
    Applied { snapshot: FlowSnapshot },
    Rejected { step: Step, error: ErrorPayload },
}
