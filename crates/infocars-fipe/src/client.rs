//! HTTP client for the public FIPE reference API.
//!
//! Wraps `reqwest` with FIPE-specific URL construction and typed response
//! deserialization. Each lookup issues exactly one GET; there is no retry.

use std::time::Duration;

use infocars_core::{AppConfig, CatalogItem, Stage, VehicleDetail, VehicleKind};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use crate::error::FipeError;
use crate::types::{ModelsResponse, VehicleResponse, WireItem};

/// Client for the FIPE v1 REST API.
///
/// Use [`FipeClient::new`] with the loaded [`AppConfig`] or
/// [`FipeClient::with_base_url`] to point at a mock server in tests.
#[derive(Debug, Clone)]
pub struct FipeClient {
    client: Client,
    base_url: Url,
    kind: VehicleKind,
}

impl FipeClient {
    /// Creates a client from application configuration.
    ///
    /// # Errors
    ///
    /// Returns [`FipeError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed, or [`FipeError::InvalidBaseUrl`] if the configured base
    /// URL does not parse.
    pub fn new(config: &AppConfig) -> Result<Self, FipeError> {
        Self::with_base_url(
            &config.api_base_url,
            config.vehicle_kind,
            config.request_timeout_secs.map(Duration::from_secs),
            &config.user_agent,
        )
    }

    /// Creates a client with an explicit base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`FipeError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed, or [`FipeError::InvalidBaseUrl`] if `base_url` is not a
    /// valid base URL.
    pub fn with_base_url(
        base_url: &str,
        kind: VehicleKind,
        timeout: Option<Duration>,
        user_agent: &str,
    ) -> Result<Self, FipeError> {
        let mut builder = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        // Exactly one trailing slash so path segments append after the last
        // configured segment instead of replacing it.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| FipeError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(FipeError::InvalidBaseUrl {
                base_url: normalised,
                reason: "URL cannot be used as a base".to_owned(),
            });
        }

        Ok(Self {
            client,
            base_url,
            kind,
        })
    }

    /// Lists every brand of the configured vehicle kind.
    ///
    /// # Errors
    ///
    /// - [`FipeError::Http`] on network failure.
    /// - [`FipeError::UnexpectedStatus`] on a non-2xx response.
    /// - [`FipeError::Deserialize`] if the body is not an array of items.
    pub async fn fetch_brands(&self) -> Result<Vec<CatalogItem>, FipeError> {
        let url = self.build_url(&["marcas"]);
        let items: Vec<WireItem> = self.get_json(&url, "brands").await?;
        Ok(items.into_iter().map(Into::into).collect())
    }

    /// Lists the models of one brand.
    ///
    /// # Errors
    ///
    /// - [`FipeError::EmptyCode`] if `brand` is empty; nothing is sent.
    /// - [`FipeError::Http`], [`FipeError::UnexpectedStatus`] and
    ///   [`FipeError::Deserialize`] as for [`FipeClient::fetch_brands`].
    pub async fn fetch_models(&self, brand: &str) -> Result<Vec<CatalogItem>, FipeError> {
        require_code(Stage::Model, &[brand])?;
        let url = self.build_url(&["marcas", brand, "modelos"]);
        let body: ModelsResponse = self
            .get_json(&url, &format!("models(brand={brand})"))
            .await?;
        Ok(body.modelos.into_iter().map(Into::into).collect())
    }

    /// Lists the model-years available for a brand and model.
    ///
    /// # Errors
    ///
    /// Same as [`FipeClient::fetch_models`].
    pub async fn fetch_years(
        &self,
        brand: &str,
        model: &str,
    ) -> Result<Vec<CatalogItem>, FipeError> {
        require_code(Stage::Year, &[brand, model])?;
        let url = self.build_url(&["marcas", brand, "modelos", model, "anos"]);
        let items: Vec<WireItem> = self
            .get_json(&url, &format!("years(brand={brand}, model={model})"))
            .await?;
        Ok(items.into_iter().map(Into::into).collect())
    }

    /// Fetches price and specification data of a fully resolved vehicle.
    ///
    /// # Errors
    ///
    /// Same as [`FipeClient::fetch_models`].
    pub async fn fetch_vehicle(
        &self,
        brand: &str,
        model: &str,
        year: &str,
    ) -> Result<VehicleDetail, FipeError> {
        require_code(Stage::Vehicle, &[brand, model, year])?;
        let url = self.build_url(&["marcas", brand, "modelos", model, "anos", year]);
        let body: VehicleResponse = self
            .get_json(
                &url,
                &format!("vehicle(brand={brand}, model={model}, year={year})"),
            )
            .await?;
        Ok(body.into())
    }

    /// Appends the vehicle kind and `segments` to the base URL.
    ///
    /// Each segment is percent-encoded by [`Url::path_segments_mut`], so codes
    /// containing `/` or spaces cannot escape their position in the path.
    fn build_url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.push(self.kind.path_segment());
            path.extend(segments);
        }
        url
    }

    /// Sends a GET request, asserts a 2xx status, and parses the body as `T`.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        context: &str,
    ) -> Result<T, FipeError> {
        tracing::debug!(%url, "FIPE request");
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%url, status = status.as_u16(), "FIPE request failed");
            return Err(FipeError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(%url, error = %e, "FIPE response did not match expected shape");
            FipeError::Deserialize {
                context: context.to_owned(),
                source: e,
            }
        })
    }
}

fn require_code(stage: Stage, codes: &[&str]) -> Result<(), FipeError> {
    if codes.iter().any(|c| c.trim().is_empty()) {
        return Err(FipeError::EmptyCode { stage });
    }
    Ok(())
}
