use serde::{Deserialize, Serialize};

/// Currencies the storefront displays. Prices are stored in USD and
/// converted to ARS with the configured blue rate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Ars,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Ars => "ARS",
        }
    }

    fn symbol(&self) -> &'static str {
        "$"
    }

    /// Thousands separator of the currency's display locale (en-US / es-AR).
    fn grouping(&self) -> char {
        match self {
            Currency::Usd => ',',
            Currency::Ars => '.',
        }
    }

    /// es-AR puts a non-breaking space between symbol and amount.
    fn spacer(&self) -> &'static str {
        match self {
            Currency::Usd => "",
            Currency::Ars => "\u{a0}",
        }
    }
}

/// Applies a percentage discount and rounds up to a whole unit.
///
/// The result is never below the exact discounted value. `discount_percent`
/// is not range-checked: values outside `[0, 100]` flow through the arithmetic.
pub fn discounted_price(base_price: f64, discount_percent: f64) -> f64 {
    let discount = (base_price * discount_percent) / 100.0;
    (base_price - discount).ceil()
}

/// Converts a reference-currency amount with `rate`, rounding up to a whole unit.
pub fn convert(amount: f64, rate: f64) -> f64 {
    (amount * rate).ceil()
}

/// Formats `amount` with no fractional digits in the locale of `currency`.
pub fn format_currency(amount: f64, currency: Currency) -> String {
    let prefix = format!("{}{}", currency.symbol(), currency.spacer());

    if amount.is_nan() {
        return format!("{}NaN", prefix);
    }
    if amount.is_infinite() {
        let sign = if amount < 0.0 { "-" } else { "" };
        return format!("{}{}∞", sign, prefix);
    }

    let rounded = amount.round();
    // Negative amounts keep their sign even when they round to zero.
    let sign = if amount.is_sign_negative() { "-" } else { "" };
    let digits = format!("{:.0}", rounded.abs());

    format!("{}{}{}", sign, prefix, group_digits(&digits, currency.grouping()))
}

fn group_digits(digits: &str, separator: char) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(ch);
    }
    out
}

/// A fully computed price for one product as seen by one viewer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceQuote {
    pub discount_percent: f64,
    pub usd: f64,
    pub ars: f64,
    pub usd_display: String,
    pub ars_display: String,
}

impl PriceQuote {
    pub fn compute(base_price_usd: f64, discount_percent: f64, blue_rate: f64) -> Self {
        let usd = discounted_price(base_price_usd, discount_percent);
        let ars = convert(usd, blue_rate);

        Self {
            discount_percent,
            usd,
            ars,
            usd_display: format_currency(usd, Currency::Usd),
            ars_display: format_currency(ars, Currency::Ars),
        }
    }
}
