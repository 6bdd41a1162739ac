use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Field, FlowError};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

id_newtype!(HotelRef);
id_newtype!(AddOnId);

pub const DEFAULT_ADULTS: u32 = 2;
pub const DEFAULT_CHILDREN: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageTier {
    Low,
    Premium,
}

impl PackageTier {
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low Budget",
            Self::Premium => "Premium Budget",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Premium => "premium",
        }
    }

    pub fn booking_prefix(self) -> &'static str {
        match self {
            Self::Low => "LOWB",
            Self::Premium => "PREM",
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "LOWB" => Some(Self::Low),
            "PREM" => Some(Self::Premium),
            _ => None,
        }
    }
}

/// Stages of the booking flow in their linear order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    PackageSelect,
    Search,
    ViewHotel,
    Review,
    Payment,
    Confirmation,
}

impl Step {
    pub const ALL: [Step; 6] = [
        Step::PackageSelect,
        Step::Search,
        Step::ViewHotel,
        Step::Review,
        Step::Payment,
        Step::Confirmation,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// The step `back()` returns to. Only the four middle steps have one.
    pub fn previous(self) -> Option<Self> {
        match self {
            Self::PackageSelect | Self::Confirmation => None,
            other => Self::from_index(other.index() - 1),
        }
    }

    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    pub fn is_terminal(self) -> bool {
        self == Self::Confirmation
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::PackageSelect => "Build Your Own Package",
            Self::Search => "Search",
            Self::ViewHotel => "Select Hotel",
            Self::Review => "Review Checkout",
            Self::Payment => "Payment",
            Self::Confirmation => "Booking Confirmation",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PackageSelect => "package_select",
            Self::Search => "search",
            Self::ViewHotel => "view_hotel",
            Self::Review => "review",
            Self::Payment => "payment",
            Self::Confirmation => "confirmation",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[serde(rename = "ewallet")]
    EWallet,
    Fpx,
    Card,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] = [Self::EWallet, Self::Fpx, Self::Card];

    pub fn label(self) -> &'static str {
        match self {
            Self::EWallet => "eWallet",
            Self::Fpx => "FPX",
            Self::Card => "Credit / Debit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineItemKind {
    Stay,
    Dine,
    Leisure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub kind: LineItemKind,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub price_cents: u64,
    /// Catalog add-on this item came from; `None` for the stay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_on: Option<AddOnId>,
}

impl LineItem {
    pub fn stay(label: impl Into<String>, price_cents: u64) -> Self {
        Self {
            kind: LineItemKind::Stay,
            label: label.into(),
            details: None,
            price_cents,
            add_on: None,
        }
    }

    pub fn is_add_on(&self, id: &AddOnId) -> bool {
        self.add_on.as_ref() == Some(id)
    }
}

/// Confirmation reference shown after payment, e.g. `PREM12637`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BookingNumber(String);

impl BookingNumber {
    pub const DIGITS: usize = 5;

    pub fn new(tier: PackageTier, serial: u32) -> Self {
        Self(format!(
            "{}{:0width$}",
            tier.booking_prefix(),
            serial % 100_000,
            width = Self::DIGITS
        ))
    }

    pub fn parse(raw: &str) -> Result<Self, FlowError> {
        let invalid = || FlowError::validation(Field::BookingNumber, format!("malformed booking number '{raw}'"));
        if raw.len() != 4 + Self::DIGITS || !raw.is_ascii() {
            return Err(invalid());
        }
        let (prefix, digits) = raw.split_at(4);
        if PackageTier::from_prefix(prefix).is_none() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        Ok(Self(raw.to_string()))
    }

    pub fn tier(&self) -> Option<PackageTier> {
        PackageTier::from_prefix(&self.0[..4])
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookingNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for BookingNumber {
    type Error = FlowError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<BookingNumber> for String {
    fn from(value: BookingNumber) -> Self {
        value.0
    }
}

/// Accumulating record of one booking session. Only the flow controller
/// mutates it; everything else sees `&BookingDraft` or a clone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDraft {
    pub package_tier: Option<PackageTier>,
    pub destination: String,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub adults: u32,
    pub children: u32,
    pub selected_hotel: Option<HotelRef>,
    pub line_items: Vec<LineItem>,
    pub promo_code: Option<String>,
    pub discount_cents: u64,
    pub payment_method: Option<PaymentMethod>,
    pub booking_number: Option<BookingNumber>,
}

impl Default for BookingDraft {
    fn default() -> Self {
        Self {
            package_tier: None,
            destination: String::new(),
            check_in: None,
            check_out: None,
            adults: DEFAULT_ADULTS,
            children: DEFAULT_CHILDREN,
            selected_hotel: None,
            line_items: Vec::new(),
            promo_code: None,
            discount_cents: 0,
            payment_method: None,
            booking_number: None,
        }
    }
}

impl BookingDraft {
    /// Sum of all line items, saturating at `u64::MAX`.
    pub fn subtotal_cents(&self) -> u64 {
        self.line_items
            .iter()
            .fold(0u64, |acc, item| acc.saturating_add(item.price_cents))
    }

    /// Sum of all line items plus `extra`, or `None` if it does not fit in a `u64`.
    pub fn checked_subtotal_with(&self, extra: u64) -> Option<u64> {
        self.line_items
            .iter()
            .try_fold(extra, |acc, item| acc.checked_add(item.price_cents))
    }

    pub fn total_cents(&self) -> u64 {
        self.subtotal_cents().saturating_sub(self.discount_cents)
    }

    pub fn nights(&self) -> Option<i64> {
        match (self.check_in, self.check_out) {
            (Some(check_in), Some(check_out)) => Some((check_out - check_in).num_days()),
            _ => None,
        }
    }

    pub fn stay_item(&self) -> Option<&LineItem> {
        self.line_items
            .iter()
            .find(|item| item.kind == LineItemKind::Stay)
    }

    pub fn guests(&self) -> u32 {
        self.adults + self.children
    }
}

/// Formats cents as the prototype's ringgit display, e.g. `RM 1,295` or `RM 12.50`.
pub fn format_ringgit(cents: u64) -> String {
    let whole = cents / 100;
    let fraction = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if fraction == 0 {
        format!("RM {grouped}")
    } else {
        format!("RM {grouped}.{fraction:02}")
    }
}
