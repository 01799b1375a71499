use async_trait::async_trait;
use infocars_core::{CatalogItem, VehicleDetail};

use crate::client::FipeClient;
use crate::error::FipeError;

/// The four read-only lookups the cascade depends on.
///
/// Implemented by [`FipeClient`]; tests substitute in-memory catalogs.
#[async_trait]
pub trait CatalogSource: Send + Sync + 'static {
    async fn fetch_brands(&self) -> Result<Vec<CatalogItem>, FipeError>;

    async fn fetch_models(&self, brand: &str) -> Result<Vec<CatalogItem>, FipeError>;

    async fn fetch_years(&self, brand: &str, model: &str)
        -> Result<Vec<CatalogItem>, FipeError>;

    async fn fetch_vehicle(
        &self,
        brand: &str,
        model: &str,
        year: &str,
    ) -> Result<VehicleDetail, FipeError>;
}

#[async_trait]
impl CatalogSource for FipeClient {
    async fn fetch_brands(&self) -> Result<Vec<CatalogItem>, FipeError> {
        FipeClient::fetch_brands(self).await
    }

    async fn fetch_models(&self, brand: &str) -> Result<Vec<CatalogItem>, FipeError> {
        FipeClient::fetch_models(self, brand).await
    }

    async fn fetch_years(
        &self,
        brand: &str,
        model: &str,
    ) -> Result<Vec<CatalogItem>, FipeError> {
        FipeClient::fetch_years(self, brand, model).await
    }

    async fn fetch_vehicle(
        &self,
        brand: &str,
        model: &str,
        year: &str,
    ) -> Result<VehicleDetail, FipeError> {
        FipeClient::fetch_vehicle(self, brand, model, year).await
    }
}

#[async_trait]
impl<T: CatalogSource + ?Sized> CatalogSource for Box<T> {
    async fn fetch_brands(&self) -> Result<Vec<CatalogItem>, FipeError> {
        (**self).fetch_brands().await
    }

    async fn fetch_models(&self, brand: &str) -> Result<Vec<CatalogItem>, FipeError> {
        (**self).fetch_models(brand).await
    }

    async fn fetch_years(
        &self,
        brand: &str,
        model: &str,
    ) -> Result<Vec<CatalogItem>, FipeError> {
        (**self).fetch_years(brand, model).await
    }

    async fn fetch_vehicle(
        &self,
        brand: &str,
        model: &str,
        year: &str,
    ) -> Result<VehicleDetail, FipeError> {
        (**self).fetch_vehicle(brand, model, year).await
    }
}
