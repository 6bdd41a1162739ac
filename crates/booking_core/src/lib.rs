use std::sync::Arc;

use shared::{
    domain::{
        AddOnId, BookingDraft, BookingNumber, HotelRef, LineItem, LineItemKind, PackageTier,
        PaymentMethod, Step,
    },
    error::{ErrorPayload, Field, FlowError, Operation},
    protocol::{FlowEvent, FlowSnapshot, Intent, SearchRequest},
};
use tracing::{debug, info, warn};

pub mod catalog;
pub mod issuer;
pub mod pricing;

pub use catalog::{AddOnOffer, Catalog, CatalogError, HotelOffer, PackageOffer, PromoOffer};
pub use issuer::{BookingNumberIssuer, RandomIssuer, SequentialIssuer};
pub use pricing::{quote_promo, PromoQuote};

/// Side-channel listener for flow changes (narration, celebration effects).
/// Observers only ever see the draft by shared reference.
pub trait FlowObserver: Send {
    fn on_event(&self, event: &FlowEvent, draft: &BookingDraft);
}

/// Owns the current step and the booking draft. Every operation checks the
/// current step first and leaves all state untouched when it fails.
pub struct BookingFlowController {
    catalog: Arc<Catalog>,
    issuer: Box<dyn BookingNumberIssuer>,
    observers: Vec<Box<dyn FlowObserver>>,
    step: Step,
    draft: BookingDraft,
}

impl BookingFlowController {
    pub fn new(catalog: Arc<Catalog>, issuer: impl BookingNumberIssuer + 'static) -> Self {
        Self {
            catalog,
            issuer: Box::new(issuer),
            observers: Vec::new(),
            step: Step::PackageSelect,
            draft: BookingDraft::default(),
        }
    }

    pub fn with_observer(mut self, observer: impl FlowObserver + 'static) -> Self {
        self.add_observer(observer);
        self
    }

    pub fn add_observer(&mut self, observer: impl FlowObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    pub fn total_cents(&self) -> u64 {
        self.draft.total_cents()
    }

    pub fn snapshot(&self) -> FlowSnapshot {
        FlowSnapshot {
            step: self.step,
            draft: self.draft.clone(),
            total_cents: self.draft.total_cents(),
        }
    }

    pub fn start(&mut self) {
        let from = self.step;
        self.step = Step::PackageSelect;
        self.draft = BookingDraft::default();
        info!(from = %from, "flow: started at package selection");
        self.emit(FlowEvent::DraftReset);
        if from != Step::PackageSelect {
            self.emit(FlowEvent::StepChanged {
                from,
                to: Step::PackageSelect,
            });
        }
    }

    pub fn reset(&mut self) {
        self.start();
    }

    pub fn select_package(&mut self, tier: PackageTier) -> Result<(), FlowError> {
        let result = self.try_select_package(tier);
        self.finish(Operation::SelectPackage, result)
    }

    pub fn submit_search(&mut self, request: SearchRequest) -> Result<(), FlowError> {
        let result = self.try_submit_search(request);
        self.finish(Operation::SubmitSearch, result)
    }

    /// Picks a hotel at an explicit price. Re-entering from Review through
    /// `back()` replaces the previous stay.
    pub fn select_hotel(&mut self, hotel: HotelRef, price_cents: u64) -> Result<(), FlowError> {
        let result = self.try_select_hotel(hotel, price_cents);
        self.finish(Operation::SelectHotel, result)
    }

    pub fn select_catalog_hotel(&mut self, hotel: &HotelRef) -> Result<(), FlowError> {
        let result = self.try_select_catalog_hotel(hotel);
        self.finish(Operation::SelectHotel, result)
    }

    pub fn add_on(&mut self, id: &AddOnId) -> Result<(), FlowError> {
        let result = self.try_add_on(id);
        self.finish(Operation::AddOn, result)
    }

    pub fn remove_item(&mut self, index: usize) -> Result<LineItem, FlowError> {
        let result = self.try_remove_item(index);
        self.finish(Operation::RemoveItem, result)
    }

    pub fn confirm_review(&mut self) -> Result<(), FlowError> {
        let result = self.try_confirm_review();
        self.finish(Operation::ConfirmReview, result)
    }

    pub fn apply_promo(&mut self, code: &str) -> Result<PromoQuote, FlowError> {
        let result = self.try_apply_promo(code);
        self.finish(Operation::ApplyPromo, result)
    }

    pub fn pay(
        &mut self,
        method: PaymentMethod,
        promo_code: Option<&str>,
    ) -> Result<BookingNumber, FlowError> {
        let result = self.try_pay(method, promo_code);
        self.finish(Operation::Pay, result)
    }

    /// Moves one step left. Draft fields keep whatever the later steps wrote.
    pub fn back(&mut self) -> Result<(), FlowError> {
        let result = match self.step.previous() {
            Some(previous) => {
                self.advance(previous);
                Ok(())
            }
            None => Err(FlowError::invalid_transition(Operation::Back, self.step)),
        };
        self.finish(Operation::Back, result)
    }

    pub fn apply(&mut self, intent: Intent) -> Result<FlowSnapshot, FlowError> {
        debug!(intent = intent.name(), step = %self.step, "flow: applying intent");
        match intent {
            Intent::Start => self.start(),
            Intent::Reset => self.reset(),
            Intent::SelectPackage { tier } => self.select_package(tier)?,
            Intent::SubmitSearch(request) => self.submit_search(request)?,
            Intent::SelectHotel {
                hotel,
                price_cents: Some(price_cents),
            } => self.select_hotel(hotel, price_cents)?,
            Intent::SelectHotel {
                hotel,
                price_cents: None,
            } => self.select_catalog_hotel(&hotel)?,
            Intent::AddOn { add_on } => self.add_on(&add_on)?,
            Intent::RemoveItem { index } => {
                self.remove_item(index)?;
            }
            Intent::ConfirmReview => self.confirm_review()?,
            Intent::ApplyPromo { code } => {
                self.apply_promo(&code)?;
            }
            Intent::Pay { method, promo_code } => {
                self.pay(method, promo_code.as_deref())?;
            }
            Intent::Back => self.back()?,
        }
        Ok(self.snapshot())
    }

    fn try_select_package(&mut self, tier: PackageTier) -> Result<(), FlowError> {
        self.ensure_step(Operation::SelectPackage, Step::PackageSelect)?;
        if self.catalog.package(tier).is_none() {
            return Err(FlowError::validation(
                Field::PackageTier,
                format!("{} is not offered", tier.label()),
            ));
        }

        if self.draft != BookingDraft::default() {
            debug!("flow: package re-selected, discarding previous draft");
        }
        self.draft = BookingDraft {
            package_tier: Some(tier),
            ..BookingDraft::default()
        };
        info!(tier = tier.slug(), "flow: package selected");
        self.advance(Step::Search);
        Ok(())
    }

    fn try_submit_search(&mut self, request: SearchRequest) -> Result<(), FlowError> {
        self.ensure_step(Operation::SubmitSearch, Step::Search)?;

        if request.adults < 1 {
            return Err(FlowError::validation(
                Field::Adults,
                "at least one adult is required",
            ));
        }
        if request.children < 0 {
            return Err(FlowError::validation(
                Field::Children,
                "children cannot be negative",
            ));
        }
        if request.check_in >= request.check_out {
            return Err(FlowError::validation(
                Field::CheckOut,
                "check-out must be after check-in",
            ));
        }
        let adults = u32::try_from(request.adults)
            .map_err(|_| FlowError::validation(Field::Adults, "too many adults"))?;
        let children = u32::try_from(request.children)
            .map_err(|_| FlowError::validation(Field::Children, "too many children"))?;

        self.draft.destination = request.destination.trim().to_string();
        self.draft.check_in = Some(request.check_in);
        self.draft.check_out = Some(request.check_out);
        self.draft.adults = adults;
        self.draft.children = children;
        info!(
            destination = %self.draft.destination,
            check_in = %request.check_in,
            check_out = %request.check_out,
            adults,
            children,
            "flow: search submitted"
        );
        self.advance(Step::ViewHotel);
        Ok(())
    }

    fn try_select_catalog_hotel(&mut self, hotel: &HotelRef) -> Result<(), FlowError> {
        self.ensure_step(Operation::SelectHotel, Step::ViewHotel)?;
        let price_cents = self
            .catalog
            .hotel(hotel)
            .map(|offer| offer.price_cents)
            .ok_or_else(|| FlowError::validation(Field::Hotel, format!("unknown hotel '{hotel}'")))?;
        self.try_select_hotel(hotel.clone(), price_cents)
    }

    fn try_select_hotel(&mut self, hotel: HotelRef, price_cents: u64) -> Result<(), FlowError> {
        self.ensure_step(Operation::SelectHotel, Step::ViewHotel)?;

        let fits = self
            .draft
            .line_items
            .iter()
            .filter(|item| item.kind != LineItemKind::Stay)
            .try_fold(price_cents, |acc, item| acc.checked_add(item.price_cents))
            .is_some();
        if !fits {
            return Err(FlowError::validation(
                Field::LineItem,
                "package total exceeds the supported amount",
            ));
        }

        let stay = match self.catalog.hotel(&hotel) {
            Some(offer) => LineItem {
                details: Some(offer.room.clone()),
                ..LineItem::stay(format!("Stay Selected {}", offer.name), price_cents)
            },
            None => LineItem::stay(format!("Stay Selected {hotel}"), price_cents),
        };

        match self
            .draft
            .line_items
            .iter()
            .position(|item| item.kind == LineItemKind::Stay)
        {
            Some(index) => {
                self.draft.line_items.remove(index);
                self.draft.line_items.insert(0, stay);
            }
            None => self.draft.line_items.insert(0, stay),
        }
        info!(hotel = %hotel, price_cents, "flow: hotel selected");
        self.draft.selected_hotel = Some(hotel);
        self.advance(Step::Review);
        Ok(())
    }

    fn try_add_on(&mut self, id: &AddOnId) -> Result<(), FlowError> {
        self.ensure_step(Operation::AddOn, Step::Review)?;
        let offer = self
            .catalog
            .add_on(id)
            .ok_or_else(|| FlowError::validation(Field::AddOn, format!("unknown add-on '{id}'")))?;

        let already_added = self
            .draft
            .line_items
            .iter()
            .any(|item| item.is_add_on(&offer.id));
        if already_added {
            return Err(FlowError::validation(
                Field::AddOn,
                format!("'{}' is already in the package", offer.label),
            ));
        }
        if self.draft.checked_subtotal_with(offer.price_cents).is_none() {
            return Err(FlowError::validation(
                Field::LineItem,
                "package total exceeds the supported amount",
            ));
        }

        self.draft.line_items.push(offer.to_line_item());
        info!(add_on = %id, price_cents = offer.price_cents, "flow: add-on included");
        Ok(())
    }

    fn try_remove_item(&mut self, index: usize) -> Result<LineItem, FlowError> {
        self.ensure_step(Operation::RemoveItem, Step::Review)?;
        if index >= self.draft.line_items.len() {
            return Err(FlowError::validation(
                Field::LineItem,
                format!("no line item at position {index}"),
            ));
        }

        let removed = self.draft.line_items.remove(index);
        if removed.kind == LineItemKind::Stay {
            self.draft.selected_hotel = None;
        }
        info!(label = %removed.label, "flow: line item removed");
        Ok(removed)
    }

    fn try_confirm_review(&mut self) -> Result<(), FlowError> {
        self.ensure_step(Operation::ConfirmReview, Step::Review)?;
        if self.draft.selected_hotel.is_none() {
            return Err(FlowError::precondition(
                Operation::ConfirmReview,
                "no hotel selected",
            ));
        }
        if self.draft.line_items.is_empty() {
            return Err(FlowError::precondition(
                Operation::ConfirmReview,
                "package has no line items",
            ));
        }

        if let Some(code) = self.draft.promo_code.clone() {
            if let Some(quote) = quote_promo(&self.catalog, &code, self.draft.subtotal_cents()) {
                self.store_promo(&quote);
            }
        }
        self.advance(Step::Payment);
        Ok(())
    }

    fn try_apply_promo(&mut self, code: &str) -> Result<PromoQuote, FlowError> {
        self.ensure_step(Operation::ApplyPromo, Step::Payment)?;
        let quote = quote_promo(&self.catalog, code, self.draft.subtotal_cents())
            .ok_or_else(|| FlowError::validation(Field::PromoCode, "promo code is empty"))?;
        self.store_promo(&quote);
        Ok(quote)
    }

    fn try_pay(
        &mut self,
        method: PaymentMethod,
        promo_code: Option<&str>,
    ) -> Result<BookingNumber, FlowError> {
        self.ensure_step(Operation::Pay, Step::Payment)?;
        let tier = self
            .draft
            .package_tier
            .ok_or_else(|| FlowError::precondition(Operation::Pay, "no package selected"))?;

        let code = promo_code
            .filter(|code| !code.trim().is_empty())
            .map(str::to_string)
            .or_else(|| self.draft.promo_code.clone());
        if let Some(code) = code {
            if let Some(quote) = quote_promo(&self.catalog, &code, self.draft.subtotal_cents()) {
                self.store_promo(&quote);
            }
        }

        let booking_number = self.issuer.issue(tier);
        self.draft.payment_method = Some(method);
        self.draft.booking_number = Some(booking_number.clone());
        let total_cents = self.draft.total_cents();
        info!(
            booking_number = %booking_number,
            method = method.label(),
            total_cents,
            discount_cents = self.draft.discount_cents,
            "flow: payment accepted"
        );

        self.advance(Step::Confirmation);
        self.emit(FlowEvent::BookingConfirmed {
            booking_number: booking_number.clone(),
            tier,
            method,
            total_cents,
        });
        Ok(booking_number)
    }

    fn store_promo(&mut self, quote: &PromoQuote) {
        if !quote.recognized {
            debug!(code = %quote.code, "flow: promo code not recognised");
        }
        self.draft.promo_code = Some(quote.code.clone());
        self.draft.discount_cents = quote.discount_cents;
    }

    fn ensure_step(&self, operation: Operation, expected: Step) -> Result<(), FlowError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(FlowError::invalid_transition(operation, self.step))
        }
    }

    fn advance(&mut self, to: Step) {
        let from = self.step;
        self.step = to;
        info!(from = %from, to = %to, "flow: step changed");
        self.emit(FlowEvent::StepChanged { from, to });
    }

    fn finish<T>(&self, operation: Operation, result: Result<T, FlowError>) -> Result<T, FlowError> {
        if let Err(err) = &result {
            warn!(operation = %operation, step = %self.step, "flow: rejected: {err}");
            self.emit(FlowEvent::IntentRejected {
                intent: operation.to_string(),
                step: self.step,
                error: ErrorPayload::from(err),
            });
        }
        result
    }

    fn emit(&self, event: FlowEvent) {
        for observer in &self.observers {
            observer.on_event(&event, &self.draft);
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
