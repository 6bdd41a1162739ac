//! Turns controller rejections into messages a screen can show, and hosts
//! the presentation side-channels that listen to flow events.

use std::sync::Arc;

use booking_core::{Catalog, FlowObserver};
use shared::{
    domain::{format_ringgit, BookingDraft, Step},
    error::{ErrorCode, ErrorPayload},
    protocol::FlowEvent,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeCategory {
    /// The user can fix the input and retry.
    Input,
    /// The screen offered an action the current step does not allow.
    Navigation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    category: NoticeCategory,
    message: String,
}

impl Notice {
    pub fn from_payload(payload: &ErrorPayload, step: Step) -> Self {
        match payload.code {
            ErrorCode::Validation => Self {
                category: NoticeCategory::Input,
                message: payload.message.clone(),
            },
            ErrorCode::InvalidTransition => Self {
                category: NoticeCategory::Navigation,
                message: format!(
                    "That action is not available on the {} screen.",
                    step.title()
                ),
            },
            ErrorCode::PreconditionFailed => Self {
                category: NoticeCategory::Navigation,
                message: format!("Cannot continue yet: {}", payload.message),
            },
        }
    }

    pub fn category(&self) -> NoticeCategory {
        self.category
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Logs the headline a narrated screen would read aloud on entry.
pub struct NarrationObserver {
    catalog: Arc<Catalog>,
}

impl NarrationObserver {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    pub fn headline(&self, step: Step, draft: &BookingDraft) -> String {
        match (step, draft.package_tier.and_then(|tier| self.catalog.package(tier))) {
            (Step::Search, Some(package)) => format!("{}. {}", package.title, package.description),
            _ => step.title().to_string(),
        }
    }
}

impl FlowObserver for NarrationObserver {
    fn on_event(&self, event: &FlowEvent, draft: &BookingDraft) {
        if let FlowEvent::StepChanged { to, .. } = event {
            tracing::info!(target: "narration", step = %to, "{}", self.headline(*to, draft));
        }
    }
}

/// Stands in for the confetti scene shown after payment.
pub struct CelebrationObserver {
    catalog: Arc<Catalog>,
}

impl CelebrationObserver {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }
}

impl FlowObserver for CelebrationObserver {
    fn on_event(&self, event: &FlowEvent, _draft: &BookingDraft) {
        if let FlowEvent::BookingConfirmed {
            booking_number,
            tier,
            total_cents,
            ..
        } = event
        {
            let points = self
                .catalog
                .package(*tier)
                .map(|package| package.reward_points)
                .unwrap_or_default();
            tracing::info!(
                target: "celebration",
                booking_number = %booking_number,
                points,
                "booking confirmed for {}, {points} points earned",
                format_ringgit(*total_cents)
            );
        }
    }
}
