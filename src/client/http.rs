use async_trait::async_trait;
use reqwest::{header, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{instrument, warn};

use super::{Card, CommerceApi, CreateOrderResponse, PaymentIntentResponse, SaveCardInput, ShopperToken, VerifyCheckoutInput};
use crate::domain::aggregates::{Order, OrderInput, VerifiedCheckoutResponse};
use crate::domain::value_objects::TrackingNumber;
use crate::{CheckoutError, Result};

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// JSON/HTTPS client for the commerce API.
#[derive(Clone, Debug)]
pub struct HttpCommerceApi {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

/// Rejects ids that would change the remote path once placed in it.
fn path_id(id: &str) -> Result<&str> {
    let id = id.trim();
    if id.is_empty() || id == "." || id == ".." || id.contains(['/', '\\', '?', '#']) {
        return Err(CheckoutError::InvalidIdentifier(id.to_string()));
    }
    Ok(id)
}

impl HttpCommerceApi {
    pub fn new(base_url: impl AsRef<str>, token: Option<String>, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url.as_ref()).map_err(|e| CheckoutError::Configuration(format!("COMMERCE_API_URL: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(CheckoutError::Configuration(format!("COMMERCE_API_URL cannot be a base URL: {base_url}")));
        }
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        headers.insert("x-requested-with", header::HeaderValue::from_static("XMLHttpRequest"));
        let client = reqwest::Client::builder().default_headers(headers).timeout(timeout).build()?;
        Ok(Self { client, base_url, token })
    }

    /// Base URL with `segments` appended, each percent-encoded as a single path segment.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, url: Url, token: Option<&str>) -> RequestBuilder {
        let req = self.client.request(method, url);
        match token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Shopper's token, or the service token for guests.
    fn token_or_service<'a>(&'a self, shopper: &'a ShopperToken) -> Option<&'a str> {
        shopper.token().or(self.token.as_deref())
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
        let res = req.send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(Self::remote_error(status, res).await);
        }
        res.json::<T>().await.map_err(|e| CheckoutError::InvalidResponse(e.to_string()))
    }

    async fn remote_error(status: StatusCode, res: reqwest::Response) -> CheckoutError {
        let body = res.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());
        warn!(status = status.as_u16(), %message, "commerce API returned an error");
        CheckoutError::Remote { status: status.as_u16(), message }
    }
}

#[async_trait]
impl CommerceApi for HttpCommerceApi {
    #[instrument(skip_all, fields(products = input.products.len()))]
    async fn verify_checkout(&self, shopper: &ShopperToken, input: &VerifyCheckoutInput) -> Result<VerifiedCheckoutResponse> {
        let url = self.endpoint(&["orders", "checkout", "verify"]);
        self.send(self.request(Method::POST, url, self.token_or_service(shopper)).json(input)).await
    }

    #[instrument(skip_all, fields(gateway = %input.payment_gateway))]
    async fn create_order(&self, shopper: &ShopperToken, input: &OrderInput) -> Result<CreateOrderResponse> {
        let url = self.endpoint(&["orders"]);
        self.send(self.request(Method::POST, url, self.token_or_service(shopper)).json(input)).await
    }

    #[instrument(skip(self, shopper))]
    async fn get_payment_intent(&self, shopper: &ShopperToken, tracking_number: &TrackingNumber) -> Result<PaymentIntentResponse> {
        let url = self.endpoint(&["payment-intent"]);
        let req = self.request(Method::GET, url, shopper.token()).query(&[("tracking_number", tracking_number.as_str())]);
        self.send(req).await
    }

    #[instrument(skip(self, shopper))]
    async fn get_order(&self, shopper: &ShopperToken, tracking_number: &TrackingNumber) -> Result<Order> {
        let url = self.endpoint(&["orders", "tracking-number", path_id(tracking_number.as_str())?]);
        self.send(self.request(Method::GET, url, shopper.token())).await
    }

    async fn cards(&self, shopper: &ShopperToken) -> Result<Vec<Card>> {
        self.send(self.request(Method::GET, self.endpoint(&["cards"]), shopper.token())).await
    }

    async fn save_card(&self, shopper: &ShopperToken, input: &SaveCardInput) -> Result<Card> {
        let url = self.endpoint(&["save-payment-method"]);
        self.send(self.request(Method::POST, url, shopper.token()).json(input)).await
    }

    async fn set_default_card(&self, shopper: &ShopperToken, card_id: &str) -> Result<Card> {
        let body = serde_json::json!({ "method_id": path_id(card_id)? });
        let url = self.endpoint(&["set-default-card"]);
        self.send(self.request(Method::POST, url, shopper.token()).json(&body)).await
    }

    async fn delete_card(&self, shopper: &ShopperToken, card_id: &str) -> Result<()> {
        let url = self.endpoint(&["cards", path_id(card_id)?]);
        let res = self.request(Method::DELETE, url, shopper.token()).send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(Self::remote_error(status, res).await);
        }
        Ok(())
    }
}
