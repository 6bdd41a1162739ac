use crate::catalog::Catalog;

/// Discount worked out for a promo code against the current subtotal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromoQuote {
    pub code: String,
    pub discount_cents: u64,
    pub recognized: bool,
}

/// Quotes a promo code. Known codes give their fixed discount capped at the
/// subtotal; unknown codes are kept but give nothing. Blank input is `None`.
pub fn quote_promo(catalog: &Catalog, code: &str, subtotal_cents: u64) -> Option<PromoQuote> {
    let code = code.trim();
    if code.is_empty() {
        return None;
    }

    let quote = match catalog.promo(code) {
        Some(promo) => PromoQuote {
            code: code.to_string(),
            discount_cents: promo.discount_cents.min(subtotal_cents),
            recognized: true,
        },
        None => PromoQuote {
            code: code.to_string(),
            discount_cents: 0,
            recognized: false,
        },
    };
    Some(quote)
}
