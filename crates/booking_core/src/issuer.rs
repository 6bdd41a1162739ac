use std::collections::HashSet;

use shared::domain::{BookingNumber, PackageTier};
use uuid::Uuid;

const SERIAL_SPACE: u32 = 100_000;

/// Source of booking numbers handed out when payment succeeds.
pub trait BookingNumberIssuer: Send {
    fn issue(&mut self, tier: PackageTier) -> BookingNumber;
}

impl<T: BookingNumberIssuer + ?Sized> BookingNumberIssuer for Box<T> {
    fn issue(&mut self, tier: PackageTier) -> BookingNumber {
        (**self).issue(tier)
    }
}

/// Random five-digit serials, never repeating within one issuer.
#[derive(Debug, Default)]
pub struct RandomIssuer {
    issued: HashSet<u32>,
}

impl RandomIssuer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BookingNumberIssuer for RandomIssuer {
    fn issue(&mut self, tier: PackageTier) -> BookingNumber {
        if self.issued.len() as u32 >= SERIAL_SPACE {
            self.issued.clear();
        }
        loop {
            let serial = (Uuid::new_v4().as_u128() % u128::from(SERIAL_SPACE)) as u32;
            if self.issued.insert(serial) {
                return BookingNumber::new(tier, serial);
            }
        }
    }
}

/// Counts up from a seed. Deterministic output for scripted runs.
#[derive(Debug, Clone)]
pub struct SequentialIssuer {
    next: u32,
}

impl SequentialIssuer {
    pub fn starting_at(seed: u32) -> Self {
        Self {
            next: seed % SERIAL_SPACE,
        }
    }
}

impl BookingNumberIssuer for SequentialIssuer {
    fn issue(&mut self, tier: PackageTier) -> BookingNumber {
        let serial = self.next;
        self.next = (self.next + 1) % SERIAL_SPACE;
        BookingNumber::new(tier, serial)
    }
}
