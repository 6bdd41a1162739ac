use std::io::{BufRead, Write};

use anyhow::Context;
use booking_core::BookingFlowController;
use chrono::NaiveDate;
use shared::{
    domain::{PackageTier, PaymentMethod},
    error::{ErrorCode, ErrorPayload},
    protocol::{Intent, IntentOutcome},
};

use crate::{
    presenter::{Notice, NoticeCategory},
    screens::{render, SearchForm},
    settings::OutputFormat,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub applied: usize,
    pub rejected: usize,
}

impl ReplaySummary {
    fn record(&mut self, outcome: &IntentOutcome) {
        match outcome {
            IntentOutcome::Applied { .. } => self.applied += 1,
            IntentOutcome::Rejected { .. } => self.rejected += 1,
        }
    }
}

/// Applies one JSON intent per line. Blank lines and `#` comments are
/// skipped; malformed lines are reported and the replay carries on.
pub fn replay<R: BufRead, W: Write>(
    flow: &mut BookingFlowController,
    reader: R,
    out: &mut W,
    format: OutputFormat,
) -> anyhow::Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line.context("failed to read intent line")?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let outcome = match serde_json::from_str::<Intent>(trimmed) {
            Ok(intent) => apply(flow, intent),
            Err(err) => {
                tracing::warn!(line = index + 1, "replay: malformed intent: {err}");
                IntentOutcome::Rejected {
                    step: flow.step(),
                    error: ErrorPayload::new(
                        ErrorCode::Validation,
                        format!("line {}: malformed intent: {err}", index + 1),
                    ),
                }
            }
        };
        summary.record(&outcome);
        write_outcome(flow, out, &outcome, format)?;
    }

    Ok(summary)
}

/// Walks the reference booking through the same intents a user would tap.
pub fn run_demo<W: Write>(
    flow: &mut BookingFlowController,
    out: &mut W,
    format: OutputFormat,
) -> anyhow::Result<ReplaySummary> {
    let catalog = flow.catalog();
    let tier = catalog
        .package(PackageTier::Premium)
        .or_else(|| catalog.packages.first())
        .map(|package| package.tier)
        .context("catalog has no packages")?;
    let hotel = catalog
        .hotels
        .first()
        .map(|offer| offer.hotel.clone())
        .context("catalog has no hotels to demo")?;
    let add_ons: Vec<_> = catalog.add_ons.iter().map(|offer| offer.id.clone()).collect();
    let promo = catalog.promo_codes.first().map(|promo| promo.code.clone());

    let check_in = NaiveDate::from_ymd_opt(2026, 11, 10).context("demo check-in date")?;
    let check_out = NaiveDate::from_ymd_opt(2026, 11, 13).context("demo check-out date")?;
    let mut form = SearchForm::new(check_in, check_out);
    form.destination = "Kuala Lumpur".to_string();

    let mut intents = vec![
        Intent::Start,
        Intent::SelectPackage { tier },
        form.to_intent(),
        Intent::SelectHotel {
            hotel,
            price_cents: None,
        },
    ];
    intents.extend(add_ons.into_iter().map(|add_on| Intent::AddOn { add_on }));
    intents.push(Intent::ConfirmReview);
    if let Some(code) = promo {
        intents.push(Intent::ApplyPromo { code });
    }
    intents.push(Intent::Pay {
        method: PaymentMethod::Card,
        promo_code: None,
    });

    let mut summary = ReplaySummary::default();
    for intent in intents {
        let outcome = apply(flow, intent);
        summary.record(&outcome);
        write_outcome(flow, out, &outcome, format)?;
    }
    Ok(summary)
}

fn apply(flow: &mut BookingFlowController, intent: Intent) -> IntentOutcome {
    match flow.apply(intent) {
        Ok(snapshot) => IntentOutcome::Applied { snapshot },
        Err(err) => IntentOutcome::Rejected {
            step: flow.step(),
            error: err.into(),
        },
    }
}

fn write_outcome<W: Write>(
    flow: &BookingFlowController,
    out: &mut W,
    outcome: &IntentOutcome,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer(&mut *out, outcome).context("failed to encode outcome")?;
            writeln!(out)?;
        }
        OutputFormat::Text => match outcome {
            IntentOutcome::Applied { snapshot } => {
                writeln!(out, "{}", render(snapshot.step, &snapshot.draft, flow.catalog()))?;
            }
            IntentOutcome::Rejected { step, error } => {
                let notice = Notice::from_payload(error, *step);
                let marker = match notice.category() {
                    NoticeCategory::Input => "!",
                    NoticeCategory::Navigation => "!!",
                };
                writeln!(out, "{marker} {}", notice.message())?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
