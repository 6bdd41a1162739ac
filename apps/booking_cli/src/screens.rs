//! Text screens for each flow step plus the view-local search form.
//!
//! Screens are pure functions of the step, the draft and the catalog; they
//! never hold on to a draft between intents.

use std::fmt::Write as _;

use booking_core::Catalog;
use chrono::NaiveDate;
use shared::{
    domain::{format_ringgit, BookingDraft, LineItem, PaymentMethod, Step, DEFAULT_ADULTS},
    protocol::{Intent, SearchRequest},
};

/// Route path a browser front end would show for the step.
pub fn route_path(step: Step, draft: &BookingDraft) -> String {
    match step {
        Step::PackageSelect => "/".to_string(),
        Step::Search => match draft.package_tier {
            Some(tier) => format!("/search/{}", tier.slug()),
            None => "/search".to_string(),
        },
        Step::ViewHotel => "/view".to_string(),
        Step::Review => "/review".to_string(),
        Step::Payment => "/payment".to_string(),
        Step::Confirmation => "/confirmation".to_string(),
    }
}

pub fn render(step: Step, draft: &BookingDraft, catalog: &Catalog) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==  [{}]", step.title(), route_path(step, draft));
    if let Some(tier) = draft.package_tier {
        if step != Step::PackageSelect && step != Step::Confirmation {
            let _ = writeln!(out, "Selected ({})", tier.label());
        }
    }

    match step {
        Step::PackageSelect => render_packages(&mut out, catalog),
        Step::Search => render_search(&mut out, draft),
        Step::ViewHotel => render_hotels(&mut out, draft, catalog),
        Step::Review => render_review(&mut out, draft, catalog),
        Step::Payment => render_payment(&mut out, draft, catalog),
        Step::Confirmation => render_confirmation(&mut out, draft, catalog),
    }
    out
}

pub fn display_date(date: NaiveDate) -> String {
    date.format("%-d %b, %Y").to_string()
}

fn render_packages(out: &mut String, catalog: &Catalog) {
    for package in &catalog.packages {
        let _ = writeln!(out, "[{}] {}", package.tier.slug(), package.title);
        let _ = writeln!(out, "    {}", package.description);
    }
}

fn render_search(out: &mut String, draft: &BookingDraft) {
    let destination = if draft.destination.is_empty() {
        "Search Destinations"
    } else {
        draft.destination.as_str()
    };
    let _ = writeln!(out, "Destination: {destination}");
    if let (Some(check_in), Some(check_out)) = (draft.check_in, draft.check_out) {
        let _ = writeln!(
            out,
            "Dates: {} - {}",
            display_date(check_in),
            display_date(check_out)
        );
    }
    let _ = writeln!(out, "Adult: {}", draft.adults);
    let _ = writeln!(out, "Children: {}", draft.children);
}

fn render_hotels(out: &mut String, draft: &BookingDraft, catalog: &Catalog) {
    for hotel in &catalog.hotels {
        let marker = if draft.selected_hotel.as_ref() == Some(&hotel.hotel) {
            "[x]"
        } else {
            "[ ]"
        };
        let _ = writeln!(out, "{marker} {} ({})", hotel.name, hotel.hotel);
        let _ = writeln!(out, "    {}", hotel.location);
        let _ = writeln!(out, "    {}", hotel.room);
        for amenity in &hotel.amenities {
            let _ = writeln!(out, "    {amenity}");
        }
        let _ = writeln!(out, "    {}", format_ringgit(hotel.price_cents));
    }
    if let Some(stay) = draft.stay_item() {
        let _ = writeln!(out, "Your Package");
        render_item(out, stay);
    }
}

fn render_review(out: &mut String, draft: &BookingDraft, catalog: &Catalog) {
    render_package_box(out, draft);
    let available: Vec<_> = catalog
        .add_ons
        .iter()
        .filter(|offer| !draft.line_items.iter().any(|item| item.is_add_on(&offer.id)))
        .collect();
    if !available.is_empty() {
        let _ = writeln!(out, "Add On:");
        for offer in available {
            let _ = writeln!(
                out,
                "  + {} ({}) {}",
                offer.label,
                offer.id,
                format_ringgit(offer.price_cents)
            );
        }
    }
}

fn render_payment(out: &mut String, draft: &BookingDraft, catalog: &Catalog) {
    render_package_box(out, draft);
    match &draft.promo_code {
        Some(code) => {
            let _ = writeln!(out, "Promo Code: {code}");
            if draft.discount_cents > 0 {
                let description = catalog
                    .promo(code)
                    .and_then(|promo| promo.description.clone())
                    .unwrap_or_else(|| "off entire package".to_string());
                let _ = writeln!(
                    out,
                    "- {} ({description})",
                    format_ringgit(draft.discount_cents)
                );
            }
        }
        None => {
            let _ = writeln!(out, "Promo Code: (none)");
        }
    }
    let _ = writeln!(
        out,
        "Total Payable Amount: {}",
        format_ringgit(draft.total_cents())
    );
    let methods: Vec<_> = PaymentMethod::ALL.iter().map(|m| m.label()).collect();
    let _ = writeln!(out, "Select Payment Method: {}", methods.join(" | "));
}

fn render_confirmation(out: &mut String, draft: &BookingDraft, catalog: &Catalog) {
    let _ = writeln!(out, "Your Booking is Confirmed!");
    if let Some(package) = draft.package_tier.and_then(|tier| catalog.package(tier)) {
        if package.reward_points > 0 {
            let _ = writeln!(out, "{} points earned!", package.reward_points);
        }
    }
    if let Some(tier) = draft.package_tier {
        let _ = writeln!(
            out,
            "You have successfully booked the {} package",
            tier.label().to_lowercase()
        );
    }
    if let (Some(check_in), Some(check_out), Some(nights)) =
        (draft.check_in, draft.check_out, draft.nights())
    {
        let _ = writeln!(
            out,
            "From {} to {} ({nights} nights)",
            display_date(check_in),
            display_date(check_out)
        );
    }
    if let Some(number) = &draft.booking_number {
        let _ = writeln!(out, "Booking Number: {number}");
    }
    for item in &draft.line_items {
        let _ = writeln!(out, "  {}", item.label);
    }
    let method = draft
        .payment_method
        .map(|method| method.label())
        .unwrap_or("unknown method");
    let _ = writeln!(
        out,
        "{} (Paid full amount with {method})",
        format_ringgit(draft.total_cents())
    );
}

fn render_package_box(out: &mut String, draft: &BookingDraft) {
    let _ = writeln!(out, "Your Package");
    for (index, item) in draft.line_items.iter().enumerate() {
        let _ = write!(out, "{index}. ");
        render_item(out, item);
    }
    let _ = writeln!(out, "Total: {}", format_ringgit(draft.subtotal_cents()));
}

fn render_item(out: &mut String, item: &LineItem) {
    let _ = writeln!(out, "{}  {}", item.label, format_ringgit(item.price_cents));
    if let Some(details) = &item.details {
        let _ = writeln!(out, "   {details}");
    }
}

/// View-local state of the search screen. Nothing here reaches the draft
/// until [`SearchForm::to_intent`] is submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchForm {
    pub destination: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    adults: u32,
    children: u32,
}

impl SearchForm {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Self {
        Self {
            destination: String::new(),
            check_in,
            check_out,
            adults: DEFAULT_ADULTS,
            children: 0,
        }
    }

    pub fn adults(&self) -> u32 {
        self.adults
    }

    pub fn children(&self) -> u32 {
        self.children
    }

    pub fn increment_adults(&mut self) {
        self.adults = self.adults.saturating_add(1);
    }

    pub fn decrement_adults(&mut self) {
        self.adults = self.adults.saturating_sub(1).max(1);
    }

    pub fn increment_children(&mut self) {
        self.children = self.children.saturating_add(1);
    }

    pub fn decrement_children(&mut self) {
        self.children = self.children.saturating_sub(1);
    }

    pub fn to_intent(&self) -> Intent {
        Intent::SubmitSearch(SearchRequest::new(
            self.destination.clone(),
            self.check_in,
            self.check_out,
            i64::from(self.adults),
            i64::from(self.children),
        ))
    }
}

#[cfg(test)]
#[path = "tests/screens_tests.rs"]
mod tests;
