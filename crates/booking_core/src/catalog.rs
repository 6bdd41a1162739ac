//! Read-only offer catalog injected into the flow controller.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use shared::domain::{AddOnId, HotelRef, LineItem, LineItemKind, PackageTier};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("catalog has no packages")]
    NoPackages,
    #[error("package tier {0:?} is listed more than once")]
    DuplicateTier(PackageTier),
    #[error("hotel '{0}' is listed more than once")]
    DuplicateHotel(HotelRef),
    #[error("add-on '{0}' is listed more than once")]
    DuplicateAddOn(AddOnId),
    #[error("add-on '{0}' cannot be a stay; stays come from hotels")]
    StayAddOn(AddOnId),
    #[error("promo code '{0}' is listed more than once")]
    DuplicatePromo(String),
    #[error("promo code entry is blank")]
    BlankPromo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageOffer {
    pub tier: PackageTier,
    pub title: String,
    pub description: String,
    pub nights: u32,
    #[serde(default)]
    pub reward_points: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotelOffer {
    pub hotel: HotelRef,
    pub name: String,
    pub location: String,
    pub room: String,
    #[serde(default)]
    pub amenities: Vec<String>,
    pub price_cents: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddOnOffer {
    pub id: AddOnId,
    pub kind: LineItemKind,
    pub label: String,
    #[serde(default)]
    pub details: Option<String>,
    pub price_cents: u64,
}

impl AddOnOffer {
    pub fn to_line_item(&self) -> LineItem {
        LineItem {
            kind: self.kind,
            label: self.label.clone(),
            details: self.details.clone(),
            price_cents: self.price_cents,
            add_on: Some(self.id.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromoOffer {
    pub code: String,
    pub discount_cents: u64,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub packages: Vec<PackageOffer>,
    #[serde(default)]
    pub hotels: Vec<HotelOffer>,
    #[serde(default)]
    pub add_ons: Vec<AddOnOffer>,
    #[serde(default)]
    pub promo_codes: Vec<PromoOffer>,
}

impl Catalog {
    pub fn from_toml_str(raw: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = toml::from_str(raw)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.packages.is_empty() {
            return Err(CatalogError::NoPackages);
        }

        let mut tiers = HashSet::new();
        for package in &self.packages {
            if !tiers.insert(package.tier) {
                return Err(CatalogError::DuplicateTier(package.tier));
            }
        }

        let mut hotels = HashSet::new();
        for hotel in &self.hotels {
            if !hotels.insert(&hotel.hotel) {
                return Err(CatalogError::DuplicateHotel(hotel.hotel.clone()));
            }
        }

        let mut add_ons = HashSet::new();
        for add_on in &self.add_ons {
            if add_on.kind == LineItemKind::Stay {
                return Err(CatalogError::StayAddOn(add_on.id.clone()));
            }
            if !add_ons.insert(&add_on.id) {
                return Err(CatalogError::DuplicateAddOn(add_on.id.clone()));
            }
        }

        let mut codes = HashSet::new();
        for promo in &self.promo_codes {
            let normalized = normalize_code(&promo.code);
            if normalized.is_empty() {
                return Err(CatalogError::BlankPromo);
            }
            if !codes.insert(normalized) {
                return Err(CatalogError::DuplicatePromo(promo.code.clone()));
            }
        }

        Ok(())
    }

    pub fn package(&self, tier: PackageTier) -> Option<&PackageOffer> {
        self.packages.iter().find(|package| package.tier == tier)
    }

    pub fn hotel(&self, hotel: &HotelRef) -> Option<&HotelOffer> {
        self.hotels.iter().find(|offer| &offer.hotel == hotel)
    }

    pub fn add_on(&self, id: &AddOnId) -> Option<&AddOnOffer> {
        self.add_ons.iter().find(|offer| &offer.id == id)
    }

    /// Promo codes match case-insensitively, ignoring surrounding whitespace.
    pub fn promo(&self, code: &str) -> Option<&PromoOffer> {
        let wanted = normalize_code(code);
        self.promo_codes
            .iter()
            .find(|promo| normalize_code(&promo.code) == wanted)
    }
}

fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_lowercase()
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            packages: vec![
                PackageOffer {
                    tier: PackageTier::Low,
                    title: "Low Budget Package".into(),
                    description:
                        "3 night stay (Buffet breakfast) Camping dinner Arrangement and Hiking"
                            .into(),
                    nights: 3,
                    reward_points: 500,
                },
                PackageOffer {
                    tier: PackageTier::Premium,
                    title: "Premium Budget Package".into(),
                    description: "7 night stay (Buffet breakfast) Camping dinner Arrangement and one picnic arrangement".into(),
                    nights: 7,
                    reward_points: 1000,
                },
            ],
            hotels: vec![HotelOffer {
                hotel: HotelRef::new("ocean-view"),
                name: "Ocean View Hotel".into(),
                location: "Kuala Lumpur".into(),
                room: "Triple Room (Full Board)".into(),
                amenities: vec!["Spa Included (2 Pax)".into()],
                price_cents: 80_000,
            }],
            add_ons: vec![
                AddOnOffer {
                    id: AddOnId::new("tamarind-spring"),
                    kind: LineItemKind::Dine,
                    label: "Dine 1: Tamarind Spring".into(),
                    details: Some("Dinner for 2 Pax".into()),
                    price_cents: 17_000,
                },
                AddOnOffer {
                    id: AddOnId::new("hornbill"),
                    kind: LineItemKind::Dine,
                    label: "Dine 2: Hornbill Restaurant".into(),
                    details: Some("Breakfast for 2 Pax".into()),
                    price_cents: 13_000,
                },
                AddOnOffer {
                    id: AddOnId::new("sunway-lagoon"),
                    kind: LineItemKind::Leisure,
                    label: "Leisure Activity: Sunway Lagoon".into(),
                    details: Some("Water & Theme Park".into()),
                    price_cents: 22_000,
                },
            ],
            promo_codes: vec![PromoOffer {
                code: "leis67p".into(),
                discount_cents: 2_500,
                description: Some("RM 25 off entire package".into()),
            }],
        }
    }
}

#[cfg(test)]
#[path = "tests/catalog_tests.rs"]
mod tests;
