//! HTTP access to the QuickCart API.

use async_trait::async_trait;
use reqwest::Response;
use serde::de::DeserializeOwned;
use url::Url;

use quickcart_core::api::{CartSnapshot, CartView, CheckoutResponse, ErrorBody, SyncResponse};
use quickcart_core::{Order, Product, UserId};

use crate::error::{ClientError, Result};

/// Default server address.
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// The server calls the cart controller makes.
#[async_trait]
pub trait CartApi: Send + Sync {
    async fn list_products(&self) -> Result<Vec<Product>>;

    async fn fetch_cart(&self, user_id: &UserId) -> Result<CartView>;

    /// Overwrite the server cart with `snapshot`.
    async fn sync_cart(&self, snapshot: &CartSnapshot) -> Result<()>;

    async fn checkout(&self, snapshot: &CartSnapshot) -> Result<CheckoutResponse>;

    async fn list_orders(&self, user_id: &UserId) -> Result<Vec<Order>>;
}

/// [`CartApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpCartApi {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpCartApi {
    /// Create a client for the server at `base_url`.
    ///
    /// A path prefix such as `http://host/api` is kept; every endpoint is
    /// resolved below it.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Url` if `base_url` is not a valid URL or
    /// cannot carry a path.
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase.into());
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
        })
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `path` relative to the base URL, e.g. `cart/sync`.
    fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// `{collection}/{user_id}` with the user id percent-encoded as one
    /// path segment.
    fn user_url(&self, collection: &str, user_id: &UserId) -> Result<Url> {
        let mut url = self.url(collection)?;
        url.path_segments_mut()
            .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .push(user_id.as_str());
        Ok(url)
    }

    /// Decode a success body, or turn the error body into `ClientError::Api`.
    async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or_else(|_| {
                if text.is_empty() {
                    status.to_string()
                } else {
                    text
                }
            });
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl CartApi for HttpCartApi {
    async fn list_products(&self) -> Result<Vec<Product>> {
        let response = self.client.get(self.url("products")?).send().await?;
        Self::handle_response(response).await
    }

    async fn fetch_cart(&self, user_id: &UserId) -> Result<CartView> {
        let response = self
            .client
            .get(self.user_url("cart", user_id)?)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn sync_cart(&self, snapshot: &CartSnapshot) -> Result<()> {
        let response = self
            .client
            .post(self.url("cart/sync")?)
            .json(snapshot)
            .send()
            .await?;
        let _: SyncResponse = Self::handle_response(response).await?;
        Ok(())
    }

    async fn checkout(&self, snapshot: &CartSnapshot) -> Result<CheckoutResponse> {
        let response = self
            .client
            .post(self.url("checkout")?)
            .json(snapshot)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn list_orders(&self, user_id: &UserId) -> Result<Vec<Order>> {
        let response = self
            .client
            .get(self.user_url("orders", user_id)?)
            .send()
            .await?;
        Self::handle_response(response).await
    }
}
