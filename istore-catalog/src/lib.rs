pub mod pricing;
pub mod loyalty;
pub mod filter;

pub use pricing::{convert, discounted_price, format_currency, Currency, PriceQuote};
pub use loyalty::{LevelProgress, LevelTable, PriceVisibility};
pub use filter::ProductFilter;
