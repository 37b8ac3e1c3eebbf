use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Converts stored source-currency amounts into the display currency with a
/// fixed, configured exchange rate, and renders them for the storefront.
///
/// The rate is static configuration; there is exactly one converter per
/// process so the conversion policy has a single definition.
#[derive(Debug, Clone)]
pub struct PricingConverter {
    rate: Decimal,
    symbol: String,
}

impl PricingConverter {
    /// Create a converter with a fixed exchange rate and currency symbol
    pub fn new(rate: Decimal, symbol: impl Into<String>) -> Self {
        Self {
            rate,
            symbol: symbol.into(),
        }
    }

    /// The configured exchange rate
    pub fn rate(&self) -> Decimal {
        self.rate
    }

    /// Convert a source-currency amount into the display currency
    pub fn convert(&self, amount: Decimal) -> Decimal {
        amount * self.rate
    }

    /// Render a display-currency amount with the currency symbol, thousands
    /// separators and zero decimal places.
    pub fn format(&self, amount: Decimal) -> String {
        let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);
        let units = rounded.to_i128().unwrap_or_default();
        let sign = if units < 0 { "-" } else { "" };

        format!("{}{}{}", sign, self.symbol, group_thousands(units.unsigned_abs()))
    }
}

/// Insert a comma every three digits, counting from the right
fn group_thousands(value: u128) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    grouped
}
