//! Hand-off of a reservation to the seller's WhatsApp chat. The storefront only
//! builds the deep link; the customer's client sends the message.

use istore_catalog::PriceQuote;
use istore_shared::Product;
use url::Url;

const WHATSAPP_BASE: &str = "https://wa.me/";
const VISITOR: &str = "Visitante";

/// Pre-filled chat message announcing a reservation.
pub fn reservation_message(product: &Product, quote: &PriceQuote, requester_email: Option<&str>) -> String {
    format!(
        "Hola! Quiero reservar: {} {} {}. \nPrecio: {} / {}. \nMi email: {}",
        product.model,
        product.storage,
        product.color,
        quote.usd_display,
        quote.ars_display,
        requester_email.unwrap_or(VISITOR),
    )
}

/// `https://wa.me/<number>?text=<message>`. Anything but digits is dropped from
/// the number, wa.me rejects `+`, spaces and dashes.
pub fn whatsapp_link(number: &str, message: &str) -> Result<Url, url::ParseError> {
    let digits: String = number.chars().filter(|c| c.is_ascii_digit()).collect();
    let chat = Url::parse(WHATSAPP_BASE)?.join(&digits)?;
    Url::parse_with_params(chat.as_str(), &[("text", message)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use istore_shared::{ProductCondition, ProductStatus};
    use uuid::Uuid;

    fn product() -> Product {
        Product {
            id: Uuid::new_v4(),
            model: "iPhone 14 Pro".to_string(),
            storage: "256GB".to_string(),
            color: "Morado".to_string(),
            condition: ProductCondition::Sealed,
            battery_health: None,
            box_included: true,
            accessories: Some("Cable".to_string()),
            warranty_days: 365,
            description: String::new(),
            status: ProductStatus::Available,
            base_price_usd: 100.0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_message_for_customer() {
        let quote = PriceQuote::compute(100.0, 10.0, 1200.0);
        let message = reservation_message(&product(), &quote, Some("ana@example.com"));
        assert_eq!(
            message,
            "Hola! Quiero reservar: iPhone 14 Pro 256GB Morado. \nPrecio: $90 / $\u{a0}108.000. \nMi email: ana@example.com"
        );
    }

    #[test]
    fn test_message_for_visitor() {
        let quote = PriceQuote::compute(100.0, 0.0, 1000.0);
        let message = reservation_message(&product(), &quote, None);
        assert!(message.ends_with("Mi email: Visitante"));
        assert!(message.contains("$100 / $\u{a0}100.000"));
    }

    #[test]
    fn test_link_carries_message() {
        let message = "Hola! Quiero reservar: iPhone 13.\nMi email: Visitante";
        let link = whatsapp_link("+54 9 11 5555-0000", message).unwrap();

        assert_eq!(link.host_str(), Some("wa.me"));
        assert_eq!(link.path(), "/5491155550000");
        let text = link
            .query_pairs()
            .find(|(k, _)| k == "text")
            .map(|(_, v)| v.into_owned());
        assert_eq!(text.as_deref(), Some(message));
    }
}
