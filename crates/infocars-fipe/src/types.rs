//! Wire types for the FIPE v1 REST API.
//!
//! ## Observed shapes
//!
//! - `marcas` returns a bare array of `{"codigo": "59", "nome": "VW - VolksWagen"}`.
//! - `modelos` returns an object `{"modelos": [...], "anos": [...]}`; model
//!   codes are JSON numbers (`{"codigo": 5940, "nome": "AMAROK ..."}`).
//! - `anos` returns a bare array; codes are strings like `"2014-3"`.
//! - The vehicle endpoint returns a single object with PascalCase Portuguese
//!   keys; `AnoModelo` is a number (`32000` marks a zero-km vehicle).
//!
//! Because `codigo` flips between number and string, it is read through
//! [`WireCode`] and normalised to a string.

use infocars_core::{CatalogItem, VehicleDetail};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum WireCode {
    Text(String),
    Number(i64),
}

impl WireCode {
    fn into_code(self) -> String {
        match self {
            WireCode::Text(s) => s,
            WireCode::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireItem {
    codigo: WireCode,
    nome: String,
}

impl From<WireItem> for CatalogItem {
    fn from(item: WireItem) -> Self {
        CatalogItem {
            code: item.codigo.into_code(),
            label: item.nome,
        }
    }
}

/// Response of `GET .../marcas/{brand}/modelos`. The sibling `anos` field is
/// ignored.
#[derive(Debug, Deserialize)]
pub(crate) struct ModelsResponse {
    pub modelos: Vec<WireItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct VehicleResponse {
    modelo: String,
    valor: String,
    marca: String,
    ano_modelo: u32,
    combustivel: String,
    codigo_fipe: String,
    mes_referencia: String,
    sigla_combustivel: String,
}

impl From<VehicleResponse> for VehicleDetail {
    fn from(v: VehicleResponse) -> Self {
        VehicleDetail {
            model_name: v.modelo,
            price: v.valor,
            brand_name: v.marca,
            model_year: v.ano_modelo,
            fuel_type: v.combustivel,
            fipe_code: v.codigo_fipe,
            reference_month: v.mes_referencia,
            fuel_acronym: v.sigla_combustivel,
        }
    }
}
