use super::*;
use chrono::NaiveDate;
use shared::error::ErrorCode;
use std::sync::Mutex;

#[derive(Clone, Default)]
struct RecordingObserver {
    events: Arc<Mutex<Vec<FlowEvent>>>,
}

impl RecordingObserver {
    fn events(&self) -> Vec<FlowEvent> {
        self.events.lock().expect("events lock").clone()
    }
}

impl FlowObserver for RecordingObserver {
    fn on_event(&self, event: &FlowEvent, _draft: &BookingDraft) {
        self.events.lock().expect("events lock").push(event.clone());
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn kl_search() -> SearchRequest {
    SearchRequest::new("Kuala Lumpur", date(2026, 11, 10), date(2026, 11, 13), 2, 0)
}

fn controller() -> BookingFlowController {
    BookingFlowController::new(
        Arc::new(Catalog::default()),
        SequentialIssuer::starting_at(12_637),
    )
}

fn controller_at(step: Step) -> BookingFlowController {
    let mut flow = controller();
    flow.start();
    if step == Step::PackageSelect {
        return flow;
    }
    flow.select_package(PackageTier::Premium).expect("package");
    if step == Step::Search {
        return flow;
    }
    flow.submit_search(kl_search()).expect("search");
    if step == Step::ViewHotel {
        return flow;
    }
    flow.select_hotel(HotelRef::new("ocean-view"), 80_000)
        .expect("hotel");
    if step == Step::Review {
        return flow;
    }
    flow.confirm_review().expect("review");
    if step == Step::Payment {
        return flow;
    }
    flow.pay(PaymentMethod::Card, None).expect("pay");
    flow
}

#[test]
fn start_resets_step_and_draft() {
    let mut flow = controller_at(Step::Confirmation);
    flow.start();
    assert_eq!(flow.step(), Step::PackageSelect);
    assert_eq!(flow.draft(), &BookingDraft::default());
}

#[test]
fn select_package_advances_to_search() {
    let mut flow = controller();
    flow.select_package(PackageTier::Low).expect("select");
    assert_eq!(flow.step(), Step::Search);
    assert_eq!(flow.draft().package_tier, Some(PackageTier::Low));
}

#[test]
fn select_package_outside_package_step_is_rejected() {
    let mut flow = controller_at(Step::Search);
    let before = flow.snapshot();
    let err = flow
        .select_package(PackageTier::Low)
        .expect_err("wrong step");
    assert_eq!(
        err,
        FlowError::invalid_transition(Operation::SelectPackage, Step::Search)
    );
    assert_eq!(flow.snapshot(), before);
}

#[test]
fn select_package_rejects_tier_missing_from_catalog() {
    let mut catalog = Catalog::default();
    catalog.packages.retain(|p| p.tier == PackageTier::Low);
    let mut flow = BookingFlowController::new(Arc::new(catalog), SequentialIssuer::starting_at(1));
    let err = flow
        .select_package(PackageTier::Premium)
        .expect_err("not offered");
    assert_eq!(err.field(), Some(Field::PackageTier));
    assert_eq!(flow.step(), Step::PackageSelect);
}

#[test]
fn submit_search_stores_values_and_advances() {
    let mut flow = controller_at(Step::Search);
    flow.submit_search(SearchRequest::new(
        "  Kuala Lumpur ",
        date(2026, 11, 10),
        date(2026, 11, 13),
        3,
        1,
    ))
    .expect("search");
    let draft = flow.draft();
    assert_eq!(flow.step(), Step::ViewHotel);
    assert_eq!(draft.destination, "Kuala Lumpur");
    assert_eq!(draft.adults, 3);
    assert_eq!(draft.children, 1);
    assert_eq!(draft.nights(), Some(3));
}

#[test]
fn submit_search_with_no_adults_is_a_validation_error() {
    let mut flow = controller_at(Step::Search);
    let before = flow.snapshot();
    let mut request = kl_search();
    request.adults = 0;

    let err = flow.submit_search(request).expect_err("no adults");
    assert_eq!(err.code(), ErrorCode::Validation);
    assert_eq!(err.field(), Some(Field::Adults));
    assert_eq!(flow.step(), Step::Search);
    assert_eq!(flow.snapshot(), before);
}

#[test]
fn submit_search_rejects_negative_children() {
    let mut flow = controller_at(Step::Search);
    let mut request = kl_search();
    request.children = -1;
    let err = flow.submit_search(request).expect_err("negative");
    assert_eq!(err.field(), Some(Field::Children));
    assert_eq!(flow.step(), Step::Search);
}

#[test]
fn submit_search_rejects_inverted_or_empty_date_range() {
    let mut flow = controller_at(Step::Search);
    for (check_in, check_out) in [
        (date(2026, 11, 13), date(2026, 11, 10)),
        (date(2026, 11, 10), date(2026, 11, 10)),
    ] {
        let request = SearchRequest::new("Kuala Lumpur", check_in, check_out, 2, 0);
        let err = flow.submit_search(request).expect_err("bad range");
        assert_eq!(err.field(), Some(Field::CheckOut));
    }
    assert_eq!(flow.step(), Step::Search);
    assert_eq!(flow.draft().check_in, None);
}

#[test]
fn submit_search_at_package_select_is_invalid_transition() {
    let mut flow = controller();
    let before = flow.snapshot();
    let err = flow.submit_search(kl_search()).expect_err("wrong step");
    assert_eq!(err.code(), ErrorCode::InvalidTransition);
    assert_eq!(flow.snapshot(), before);
}

#[test]
fn select_hotel_adds_stay_item_and_advances() {
    let flow = controller_at(Step::Review);
    let draft = flow.draft();
    assert_eq!(draft.selected_hotel, Some(HotelRef::new("ocean-view")));
    assert_eq!(draft.line_items.len(), 1);
    assert_eq!(draft.line_items[0].label, "Stay Selected Ocean View Hotel");
    assert_eq!(draft.line_items[0].price_cents, 80_000);
}

#[test]
fn reselecting_hotel_after_back_replaces_stay() {
    let mut flow = controller_at(Step::Review);
    flow.add_on(&AddOnId::new("hornbill")).expect("add-on");
    flow.back().expect("back");
    assert_eq!(flow.step(), Step::ViewHotel);

    flow.select_hotel(HotelRef::new("riverside"), 55_000)
        .expect("reselect");
    let draft = flow.draft();
    assert_eq!(draft.line_items.len(), 2);
    assert_eq!(draft.line_items[0].kind, LineItemKind::Stay);
    assert_eq!(draft.line_items[0].label, "Stay Selected riverside");
    assert_eq!(draft.line_items[0].price_cents, 55_000);
    assert_eq!(draft.subtotal_cents(), 55_000 + 13_000);
}

#[test]
fn select_hotel_outside_view_step_is_rejected() {
    let mut flow = controller_at(Step::Review);
    let err = flow
        .select_hotel(HotelRef::new("ocean-view"), 1)
        .expect_err("already finalized");
    assert_eq!(
        err,
        FlowError::invalid_transition(Operation::SelectHotel, Step::Review)
    );
    assert_eq!(flow.draft().line_items[0].price_cents, 80_000);
}

#[test]
fn select_catalog_hotel_uses_catalog_price() {
    let mut flow = controller_at(Step::ViewHotel);
    let err = flow
        .select_catalog_hotel(&HotelRef::new("nowhere"))
        .expect_err("unknown");
    assert_eq!(err.field(), Some(Field::Hotel));
    assert_eq!(flow.step(), Step::ViewHotel);

    flow.select_catalog_hotel(&HotelRef::new("ocean-view"))
        .expect("known hotel");
    assert_eq!(flow.total_cents(), 80_000);
}

#[test]
fn add_ons_build_up_the_package() {
    let mut flow = controller_at(Step::Review);
    for id in ["tamarind-spring", "hornbill", "sunway-lagoon"] {
        flow.add_on(&AddOnId::new(id)).expect("add-on");
    }
    assert_eq!(flow.total_cents(), 132_000);

    let err = flow
        .add_on(&AddOnId::new("hornbill"))
        .expect_err("duplicate");
    assert_eq!(err.field(), Some(Field::AddOn));
    let err = flow
        .add_on(&AddOnId::new("karaoke"))
        .expect_err("unknown");
    assert_eq!(err.field(), Some(Field::AddOn));
    assert_eq!(flow.draft().line_items.len(), 4);
}

#[test]
fn confirm_review_without_hotel_fails_precondition() {
    let mut flow = controller_at(Step::Review);
    flow.add_on(&AddOnId::new("sunway-lagoon")).expect("add-on");
    let removed = flow.remove_item(0).expect("remove stay");
    assert_eq!(removed.kind, LineItemKind::Stay);
    assert_eq!(flow.draft().selected_hotel, None);

    let err = flow.confirm_review().expect_err("no hotel");
    assert_eq!(err.code(), ErrorCode::PreconditionFailed);
    assert_eq!(flow.step(), Step::Review);
}

#[test]
fn remove_item_out_of_range_is_rejected() {
    let mut flow = controller_at(Step::Review);
    let err = flow.remove_item(5).expect_err("range");
    assert_eq!(err.field(), Some(Field::LineItem));
    assert_eq!(flow.draft().line_items.len(), 1);
}

#[test]
fn confirm_review_advances_to_payment() {
    let mut flow = controller_at(Step::Review);
    flow.confirm_review().expect("confirm");
    assert_eq!(flow.step(), Step::Payment);
}

#[test]
fn apply_promo_previews_discount() {
    let mut flow = controller_at(Step::Payment);
    let quote = flow.apply_promo("LEIS67P").expect("promo");
    assert!(quote.recognized);
    assert_eq!(flow.draft().discount_cents, 2_500);
    assert_eq!(flow.total_cents(), 77_500);

    let err = flow.apply_promo("  ").expect_err("blank");
    assert_eq!(err.field(), Some(Field::PromoCode));
    assert_eq!(flow.draft().promo_code.as_deref(), Some("LEIS67P"));
}

#[test]
fn apply_promo_outside_payment_is_rejected() {
    let mut flow = controller_at(Step::Review);
    let err = flow.apply_promo("leis67p").expect_err("wrong step");
    assert_eq!(err.code(), ErrorCode::InvalidTransition);
    assert_eq!(flow.draft().promo_code, None);
}

#[test]
fn pay_issues_booking_number_and_confirms() {
    let mut flow = controller_at(Step::Payment);
    let number = flow
        .pay(PaymentMethod::Fpx, Some("leis67p"))
        .expect("pay");
    assert_eq!(number.as_str(), "PREM12637");
    assert_eq!(flow.step(), Step::Confirmation);
    let draft = flow.draft();
    assert_eq!(draft.booking_number, Some(number));
    assert_eq!(draft.payment_method, Some(PaymentMethod::Fpx));
    assert_eq!(draft.discount_cents, 2_500);
}

#[test]
fn pay_keeps_previously_applied_promo() {
    let mut flow = controller_at(Step::Payment);
    flow.apply_promo("leis67p").expect("promo");
    flow.pay(PaymentMethod::EWallet, Some("")).expect("pay");
    assert_eq!(flow.draft().discount_cents, 2_500);
}

#[test]
fn pay_with_unknown_promo_gives_no_discount() {
    let mut flow = controller_at(Step::Payment);
    flow.pay(PaymentMethod::Card, Some("BOGUS")).expect("pay");
    assert_eq!(flow.draft().promo_code.as_deref(), Some("BOGUS"));
    assert_eq!(flow.draft().discount_cents, 0);
    assert_eq!(flow.total_cents(), 80_000);
}

#[test]
fn pay_allows_zero_total() {
    let mut flow = controller_at(Step::ViewHotel);
    flow.select_hotel(HotelRef::new("ocean-view"), 0)
        .expect("free stay");
    flow.confirm_review().expect("review");
    flow.pay(PaymentMethod::Card, Some("leis67p")).expect("pay");
    assert_eq!(flow.total_cents(), 0);
    assert_eq!(flow.step(), Step::Confirmation);
}

#[test]
fn pay_outside_payment_is_rejected() {
    let mut flow = controller_at(Step::Review);
    let err = flow.pay(PaymentMethod::Card, None).expect_err("wrong step");
    assert_eq!(
        err,
        FlowError::invalid_transition(Operation::Pay, Step::Review)
    );
    assert_eq!(flow.draft().booking_number, None);
}

#[test]
fn back_moves_one_step_and_keeps_fields() {
    for step in [Step::Search, Step::ViewHotel, Step::Review, Step::Payment] {
        let mut flow = controller_at(step);
        let before = flow.draft().clone();
        flow.back().expect("back");
        assert_eq!(Some(flow.step()), step.previous());
        assert_eq!(flow.draft(), &before);
    }
}

#[test]
fn back_keeps_applied_promo() {
    let mut flow = controller_at(Step::Payment);
    flow.apply_promo("leis67p").expect("promo");
    flow.back().expect("back");
    assert_eq!(flow.step(), Step::Review);
    assert_eq!(flow.draft().discount_cents, 2_500);
}

#[test]
fn back_is_rejected_at_entry_and_confirmation() {
    for step in [Step::PackageSelect, Step::Confirmation] {
        let mut flow = controller_at(step);
        let before = flow.snapshot();
        let err = flow.back().expect_err("no previous step");
        assert_eq!(err, FlowError::invalid_transition(Operation::Back, step));
        assert_eq!(flow.snapshot(), before);
    }
}

#[test]
fn confirmation_is_terminal_until_reset() {
    let mut flow = controller_at(Step::Confirmation);
    assert!(flow.select_package(PackageTier::Low).is_err());
    assert!(flow.pay(PaymentMethod::Card, None).is_err());
    assert_eq!(flow.step(), Step::Confirmation);

    flow.reset();
    assert_eq!(flow.step(), Step::PackageSelect);
    assert_eq!(flow.draft().booking_number, None);
}

#[test]
fn apply_dispatches_intents() {
    let mut flow = controller();
    flow.apply(Intent::SelectPackage {
        tier: PackageTier::Premium,
    })
    .expect("package");
    flow.apply(Intent::SubmitSearch(kl_search())).expect("search");
    let snapshot = flow
        .apply(Intent::SelectHotel {
            hotel: HotelRef::new("ocean-view"),
            price_cents: None,
        })
        .expect("hotel");
    assert_eq!(snapshot.step, Step::Review);
    assert_eq!(snapshot.total_cents, 80_000);

    let err = flow
        .apply(Intent::Pay {
            method: PaymentMethod::Card,
            promo_code: None,
        })
        .expect_err("not at payment");
    assert_eq!(err.code(), ErrorCode::InvalidTransition);

    let snapshot = flow.apply(Intent::Reset).expect("reset");
    assert_eq!(snapshot.step, Step::PackageSelect);
}

#[test]
fn observers_see_transitions_rejections_and_confirmation() {
    let observer = RecordingObserver::default();
    let mut flow = controller().with_observer(observer.clone());

    flow.select_package(PackageTier::Premium).expect("package");
    let _ = flow.confirm_review();
    let events = observer.events();
    assert_eq!(
        events[0],
        FlowEvent::StepChanged {
            from: Step::PackageSelect,
            to: Step::Search
        }
    );
    assert!(matches!(
        &events[1],
        FlowEvent::IntentRejected { intent, step: Step::Search, error }
            if intent == "confirm_review" && error.code == ErrorCode::InvalidTransition
    ));

    flow.submit_search(kl_search()).expect("search");
    flow.select_hotel(HotelRef::new("ocean-view"), 80_000)
        .expect("hotel");
    flow.confirm_review().expect("review");
    flow.pay(PaymentMethod::Card, Some("leis67p")).expect("pay");
    let last = observer.events().pop().expect("event");
    assert!(matches!(
        last,
        FlowEvent::BookingConfirmed {
            tier: PackageTier::Premium,
            total_cents: 77_500,
            ..
        }
    ));

    flow.reset();
    let tail: Vec<_> = observer.events().into_iter().rev().take(2).collect();
    assert_eq!(
        tail,
        vec![
            FlowEvent::StepChanged {
                from: Step::Confirmation,
                to: Step::PackageSelect
            },
            FlowEvent::DraftReset,
        ]
    );
}

#[test]
fn oversized_prices_are_rejected_before_the_total_overflows() {
    let mut flow = controller_at(Step::ViewHotel);
    flow.select_hotel(HotelRef::new("x"), u64::MAX)
        .expect("a single stay fits");
    let before = flow.snapshot();

    let err = flow
        .add_on(&AddOnId::new("hornbill"))
        .expect_err("add-on would overflow");
    assert_eq!(err.field(), Some(Field::LineItem));
    assert_eq!(flow.snapshot(), before);
    assert_eq!(flow.total_cents(), u64::MAX);
}

#[test]
fn reselecting_an_oversized_hotel_keeps_existing_add_ons_intact() {
    let mut flow = controller_at(Step::Review);
    flow.add_on(&AddOnId::new("hornbill")).expect("add-on");
    flow.back().expect("back");
    let before = flow.snapshot();

    let err = flow
        .select_hotel(HotelRef::new("x"), u64::MAX)
        .expect_err("stay plus add-on would overflow");
    assert_eq!(err.field(), Some(Field::LineItem));
    assert_eq!(flow.snapshot(), before);
    assert_eq!(flow.step(), Step::ViewHotel);
}

#[test]
fn reentering_package_selection_starts_a_fresh_draft() {
    let mut flow = controller_at(Step::Review);
    for _ in 0..3 {
        flow.back().expect("back");
    }
    assert_eq!(flow.step(), Step::PackageSelect);
    assert_eq!(flow.draft().destination, "Kuala Lumpur");

    flow.select_package(PackageTier::Low).expect("package");
    let expected = BookingDraft {
        package_tier: Some(PackageTier::Low),
        ..BookingDraft::default()
    };
    assert_eq!(flow.draft(), &expected);
    assert_eq!(flow.step(), Step::Search);
}

#[test]
fn promo_is_requoted_when_review_is_confirmed_again() {
    let mut flow = controller_at(Step::ViewHotel);
    flow.select_hotel(HotelRef::new("budget-inn"), 1_000)
        .expect("hotel");
    flow.confirm_review().expect("review");
    let quote = flow.apply_promo("leis67p").expect("promo");
    assert_eq!(quote.discount_cents, 1_000);

    flow.back().expect("back");
    flow.add_on(&AddOnId::new("hornbill")).expect("add-on");
    flow.confirm_review().expect("review");
    let payment_total = flow.snapshot().total_cents;
    assert_eq!(payment_total, 11_500);

    flow.pay(PaymentMethod::Card, None).expect("pay");
    assert_eq!(flow.total_cents(), payment_total);
}

#[test]
fn add_ons_are_matched_by_catalog_id() {
    let toml = r#"
[[packages]]
tier = "premium"
title = "Premium Budget Package"
description = "Premium"
nights = 3

[[hotels]]
hotel = "ocean-view"
name = "Ocean View Hotel"
location = "Kuala Lumpur"
room = "Triple Room"
price_cents = 80000

[[add_ons]]
id = "spa-morning"
kind = "leisure"
label = "Spa Session"
price_cents = 10000

[[add_ons]]
id = "spa-evening"
kind = "leisure"
label = "Spa Session"
price_cents = 12000
"#;
    let catalog = Catalog::from_toml_str(toml).expect("catalog");
    let mut flow = BookingFlowController::new(Arc::new(catalog), SequentialIssuer::starting_at(1));
    flow.select_package(PackageTier::Premium).expect("package");
    flow.submit_search(kl_search()).expect("search");
    flow.select_catalog_hotel(&HotelRef::new("ocean-view"))
        .expect("hotel");

    flow.add_on(&AddOnId::new("spa-morning")).expect("morning");
    flow.add_on(&AddOnId::new("spa-evening")).expect("evening");
    let err = flow
        .add_on(&AddOnId::new("spa-morning"))
        .expect_err("duplicate id");
    assert_eq!(err.field(), Some(Field::AddOn));
    assert_eq!(flow.draft().subtotal_cents(), 102_000);
}
