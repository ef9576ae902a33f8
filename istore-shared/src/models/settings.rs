use serde::{Deserialize, Serialize};

pub const BLUE_RATE_KEY: &str = "blue_rate";
pub const WHATSAPP_NUMBER_KEY: &str = "whatsapp_number";
pub const DEFAULT_BLUE_RATE: f64 = 1300.0;

/// Global storefront settings, stored as key/value rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    pub blue_rate: f64,
    pub whatsapp_number: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            blue_rate: DEFAULT_BLUE_RATE,
            whatsapp_number: String::new(),
        }
    }
}

impl Settings {
    /// Builds settings from raw rows. Missing or unparsable values fall back to defaults;
    /// unknown keys are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut settings = Settings::default();
        for (key, value) in pairs {
            match key.as_ref() {
                BLUE_RATE_KEY => {
                    if let Ok(rate) = value.as_ref().trim().parse::<f64>() {
                        settings.blue_rate = rate;
                    }
                }
                WHATSAPP_NUMBER_KEY => settings.whatsapp_number = value.as_ref().to_string(),
                _ => {}
            }
        }
        settings
    }
}
