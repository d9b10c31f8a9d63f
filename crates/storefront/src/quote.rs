//! WhatsApp quote deep links.
//!
//! The storefront has no checkout; a "quote" is a prefilled WhatsApp
//! message standing in for an order. Building one is pure string work:
//! normalize the configured number to digits, render the message (the
//! admin-configured template or the default Spanish copy), and URL-encode
//! it into a `wa.me` link. No network call happens here.

use thiserror::Error;
use url::Url;

use varmina_core::{BrandSettings, Currency, Price, Product};

use crate::cart::ResolvedLine;

/// Failures building a quote link.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuoteError {
    /// The brand settings carry no usable WhatsApp number.
    #[error("Número de WhatsApp no configurado")]
    MissingWhatsappNumber,
}

/// Build the quote link for the whole cart.
///
/// # Errors
///
/// Returns [`QuoteError::MissingWhatsappNumber`] when the settings have
/// no digits to dial.
pub fn cart_quote_url(
    settings: &BrandSettings,
    lines: &[ResolvedLine],
    currency: Currency,
) -> Result<Url, QuoteError> {
    let phone = normalized_phone(settings)?;
    let rate = settings.usd_exchange_rate;

    let total = lines
        .iter()
        .fold(Price::new(0), |acc, line| acc.plus(line.line_total()));
    let total_display = total.display(currency, rate);

    let header = settings.whatsapp_template.as_deref().map_or_else(
        || {
            format!(
                "Hola *{}*, me interesan las siguientes piezas:\n\n",
                settings.brand_name
            )
        },
        |template| {
            let rendered = template
                .replace("{{brand_name}}", &settings.brand_name)
                .replace("{{total_price}}", &total_display);
            format!("{rendered}\n\n")
        },
    );

    let items_list = lines
        .iter()
        .map(|line| {
            let variant = line
                .variant
                .as_deref()
                .map(|v| format!(" [{v}]"))
                .unwrap_or_default();
            format!(
                "💎 *{}{}* (x{})\n   Precio: {}\n   Ref: {}",
                line.product.name,
                variant,
                line.quantity,
                line.unit_price.display(currency, rate),
                line.product.id.short_ref()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    // The custom template already carries the total; the default copy
    // appends it as a footer.
    let footer = if settings.whatsapp_template.is_some() {
        String::new()
    } else {
        format!("\n\nTotal Estimado: {total_display}\n\nQuedo atento a su respuesta.")
    };

    wa_me_url(&phone, &format!("{header}{items_list}{footer}"))
}

/// Build a consultation link for a single product.
///
/// # Errors
///
/// Returns [`QuoteError::MissingWhatsappNumber`] when the settings have
/// no digits to dial.
pub fn product_quote_url(
    settings: &BrandSettings,
    product: &Product,
    currency: Currency,
) -> Result<Url, QuoteError> {
    let phone = normalized_phone(settings)?;
    let rate = settings.usd_exchange_rate;
    let price_display = product.price.display(currency, rate);

    let message = settings.whatsapp_template.as_deref().map_or_else(
        || {
            format!(
                "Hola *{}*, me interesa *{}* (Ref: {}).\nPrecio: {}",
                settings.brand_name,
                product.name,
                product.id.short_ref(),
                price_display
            )
        },
        |template| {
            template
                .replace("{{brand_name}}", &settings.brand_name)
                .replace("{{product_name}}", &product.name)
                .replace("{{product_id}}", product.id.short_ref())
                .replace("{{total_price}}", &price_display)
        },
    );

    wa_me_url(&phone, &message)
}

/// The configured number reduced to digits.
fn normalized_phone(settings: &BrandSettings) -> Result<String, QuoteError> {
    let phone: String = settings
        .whatsapp_number
        .as_deref()
        .unwrap_or_default()
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    if phone.is_empty() {
        return Err(QuoteError::MissingWhatsappNumber);
    }
    Ok(phone)
}

fn wa_me_url(phone: &str, message: &str) -> Result<Url, QuoteError> {
    let raw = format!("https://wa.me/{phone}?text={}", urlencoding::encode(message));
    // The phone is digits and the text is percent-encoded; parsing can
    // only fail on an empty phone, which was rejected above.
    Url::parse(&raw).map_err(|_| QuoteError::MissingWhatsappNumber)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use varmina_core::{ErpMetadata, ExchangeRate, ProductId, ProductStatus};

    fn settings(number: Option<&str>, template: Option<&str>) -> BrandSettings {
        BrandSettings {
            whatsapp_number: number.map(str::to_owned),
            whatsapp_template: template.map(str::to_owned),
            usd_exchange_rate: ExchangeRate::from_f64(950.0),
            ..BrandSettings::default()
        }
    }

    fn product(id: &str, name: &str, clp: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_owned(),
            description: String::new(),
            price: Price::new(clp),
            images: vec![],
            status: ProductStatus::InStock,
            collection: None,
            category: None,
            badge: None,
            variants: vec![],
            stock: None,
            whatsapp_clicks: 0,
            erp: ErpMetadata::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn line(product: Product, quantity: u32, variant: Option<&str>) -> ResolvedLine {
        let unit_price = product.price;
        ResolvedLine {
            product,
            quantity,
            variant: variant.map(str::to_owned),
            unit_price,
        }
    }

    #[test]
    fn cart_quote_includes_items_and_total() {
        let settings = settings(Some("+56 9 0000 0000"), None);
        let lines = [line(
            product("9f0c2a51-aaaa", "Collar Luz de Luna", 11_875_000),
            2,
            None,
        )];

        let url = cart_quote_url(&settings, &lines, Currency::Clp).unwrap();
        assert!(url.as_str().starts_with("https://wa.me/56900000000?text="));

        let decoded = urlencoding::decode(url.as_str()).unwrap();
        assert!(decoded.contains("Collar Luz de Luna"));
        assert!(decoded.contains("(x2)"));
        assert!(decoded.contains("Ref: 9f0c2a51"));
        assert!(decoded.contains("Total Estimado: $23.750.000"));
        assert!(decoded.contains("Varmina Joyas"));
    }

    #[test]
    fn template_replaces_placeholders_and_drops_footer() {
        let settings = settings(
            Some("56900000000"),
            Some("Pedido para {{brand_name}} por {{total_price}}:"),
        );
        let lines = [line(product("p1", "Anillo Sol Real", 3_990_000), 1, None)];

        let decoded =
            urlencoding::decode(cart_quote_url(&settings, &lines, Currency::Clp).unwrap().as_str())
                .unwrap()
                .into_owned();
        assert!(decoded.contains("Pedido para Varmina Joyas por $3.990.000:"));
        assert!(!decoded.contains("Total Estimado"));
    }

    #[test]
    fn usd_quotes_convert_with_ceiling() {
        let settings = settings(Some("56900000000"), None);
        let lines = [line(product("p1", "Colgante Celestial", 2_945_000), 1, None)];

        let decoded =
            urlencoding::decode(cart_quote_url(&settings, &lines, Currency::Usd).unwrap().as_str())
                .unwrap()
                .into_owned();
        // ceil(2_945_000 / 950) = 3100
        assert!(decoded.contains("USD $3,100"));
    }

    #[test]
    fn variant_names_appear_in_brackets() {
        let settings = settings(Some("56900000000"), None);
        let lines = [line(
            product("p1", "Alianza Negro Eterno", 1_710_000),
            1,
            Some("Oro Negro"),
        )];

        let decoded =
            urlencoding::decode(cart_quote_url(&settings, &lines, Currency::Clp).unwrap().as_str())
                .unwrap()
                .into_owned();
        assert!(decoded.contains("Alianza Negro Eterno [Oro Negro]"));
    }

    #[test]
    fn product_quote_renders_product_placeholders() {
        let settings = settings(
            Some("56900000000"),
            Some("Consulta: {{product_name}} ({{product_id}}) de {{brand_name}}"),
        );
        let product = product("9f0c2a51-bbbb", "Pulsera Zafiro Océano", 23_750_000);

        let decoded = urlencoding::decode(
            product_quote_url(&settings, &product, Currency::Clp)
                .unwrap()
                .as_str(),
        )
        .unwrap()
        .into_owned();
        assert!(decoded.contains("Consulta: Pulsera Zafiro Océano (9f0c2a51) de Varmina Joyas"));
    }

    #[test]
    fn missing_number_is_rejected() {
        let unconfigured = settings(None, None);
        assert_eq!(
            cart_quote_url(&unconfigured, &[], Currency::Clp).unwrap_err(),
            QuoteError::MissingWhatsappNumber
        );
        let blank = settings(Some("no digits"), None);
        assert_eq!(
            product_quote_url(&blank, &product("p", "X", 1), Currency::Clp).unwrap_err(),
            QuoteError::MissingWhatsappNumber
        );
    }
}
