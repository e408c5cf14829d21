use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use super::GatewayError;

pub const CHECKOUT_CURRENCY: &str = "usd";
pub const ALLOWED_SHIPPING_COUNTRIES: [&str; 3] = ["GB", "US", "CA"];

const STRIPE_BASE_URL: &str = "https://api.stripe.com";

/// One priced line of a hosted checkout session. `unit_amount` always comes
/// from the catalog record, never from client input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentLineItem {
    pub name: String,
    pub image: String,
    pub unit_amount: i64,
    pub quantity: i32,
}

#[derive(Debug, Clone)]
pub struct CheckoutSessionParams {
    pub order_id: Uuid,
    pub line_items: Vec<PaymentLineItem>,
    pub success_url: String,
    pub cancel_url: String,
    /// Image references of the ordered items, echoed back through session
    /// metadata for the provider's hosted success page.
    pub item_images: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Hosted payment-session creation. Injected into [`crate::state::AppState`]
/// so services never reach for a process-global client.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout_session(
        &self,
        params: CheckoutSessionParams,
    ) -> Result<CheckoutSession, GatewayError>;
}

/// Stripe Checkout client. The session endpoint takes a form-encoded body
/// with bracketed keys, authenticated with the secret key as basic-auth user.
pub struct StripeGateway {
    client: reqwest::Client,
    secret_key: String,
    base_url: String,
}

impl StripeGateway {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret_key: secret_key.into(),
            base_url: STRIPE_BASE_URL.to_string(),
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_checkout_session(
        &self,
        params: CheckoutSessionParams,
    ) -> Result<CheckoutSession, GatewayError> {
        let form = encode_session_form(&params);
        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.base_url))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                service: "stripe",
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<CheckoutSession>()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))
    }
}

fn encode_session_form(params: &CheckoutSessionParams) -> Vec<(String, String)> {
    let mut form: Vec<(String, String)> = vec![
        ("mode".into(), "payment".into()),
        ("payment_method_types[0]".into(), "card".into()),
        ("success_url".into(), params.success_url.clone()),
        ("cancel_url".into(), params.cancel_url.clone()),
    ];

    for (i, country) in ALLOWED_SHIPPING_COUNTRIES.iter().enumerate() {
        form.push((
            format!("shipping_address_collection[allowed_countries][{i}]"),
            (*country).to_string(),
        ));
    }

    for (i, item) in params.line_items.iter().enumerate() {
        form.push((
            format!("line_items[{i}][price_data][currency]"),
            CHECKOUT_CURRENCY.to_string(),
        ));
        form.push((
            format!("line_items[{i}][price_data][product_data][name]"),
            item.name.clone(),
        ));
        form.push((
            format!("line_items[{i}][price_data][product_data][images][0]"),
            item.image.clone(),
        ));
        form.push((
            format!("line_items[{i}][price_data][unit_amount]"),
            item.unit_amount.to_string(),
        ));
        form.push((format!("line_items[{i}][quantity]"), item.quantity.to_string()));
    }

    form.push(("metadata[orderId]".into(), params.order_id.to_string()));
    form.push((
        "metadata[images]".into(),
        serde_json::to_string(&params.item_images).unwrap_or_else(|_| "[]".into()),
    ));

    form
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> CheckoutSessionParams {
        CheckoutSessionParams {
            order_id: Uuid::nil(),
            line_items: vec![
                PaymentLineItem {
                    name: "Pad Thai".into(),
                    image: "https://img.example/pad-thai.png".into(),
                    unit_amount: 150,
                    quantity: 2,
                },
                PaymentLineItem {
                    name: "Spring Rolls".into(),
                    image: "https://img.example/rolls.png".into(),
                    unit_amount: 450,
                    quantity: 1,
                },
            ],
            success_url: "http://front.example/order/status".into(),
            cancel_url: "http://front.example/cart".into(),
            item_images: vec![
                "https://img.example/pad-thai.png".into(),
                "https://img.example/rolls.png".into(),
            ],
        }
    }

    fn value_of<'a>(form: &'a [(String, String)], key: &str) -> Option<&'a str> {
        form.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    #[test]
    fn session_form_carries_catalog_unit_amounts() {
        let form = encode_session_form(&params());

        assert_eq!(
            value_of(&form, "line_items[0][price_data][unit_amount]"),
            Some("150")
        );
        assert_eq!(value_of(&form, "line_items[0][quantity]"), Some("2"));
        assert_eq!(
            value_of(&form, "line_items[1][price_data][unit_amount]"),
            Some("450")
        );
        assert_eq!(
            value_of(&form, "line_items[0][price_data][currency]"),
            Some(CHECKOUT_CURRENCY)
        );
    }

    #[test]
    fn session_form_restricts_shipping_countries() {
        let form = encode_session_form(&params());

        for (i, country) in ALLOWED_SHIPPING_COUNTRIES.iter().enumerate() {
            assert_eq!(
                value_of(
                    &form,
                    &format!("shipping_address_collection[allowed_countries][{i}]")
                ),
                Some(*country)
            );
        }
    }

    #[test]
    fn session_form_metadata_references_order_and_images() {
        let form = encode_session_form(&params());

        assert_eq!(
            value_of(&form, "metadata[orderId]"),
            Some(Uuid::nil().to_string().as_str())
        );
        let images: Vec<String> =
            serde_json::from_str(value_of(&form, "metadata[images]").unwrap()).unwrap();
        assert_eq!(images.len(), 2);
        assert!(images[0].contains("pad-thai"));
    }
}
