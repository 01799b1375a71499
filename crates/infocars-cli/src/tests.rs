use super::*;

use infocars_cascade::ViewState;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn parses_lookup_with_all_choices() {
    let cli = Cli::try_parse_from([
        "infocars", "lookup", "--brand", "1", "--model", "7", "--year", "1992-1",
    ])
    .expect("expected valid cli args");

    assert!(!cli.json);
    assert!(matches!(
        cli.command,
        Commands::Lookup {
            brand: Some(ref b),
            model: Some(ref m),
            year: Some(ref y),
        } if b == "1" && m == "7" && y == "1992-1"
    ));
}

#[test]
fn parses_bare_lookup_with_json() {
    let cli = Cli::try_parse_from(["infocars", "lookup", "--json"]).expect("expected valid cli args");
    assert!(cli.json);
    assert!(matches!(
        cli.command,
        Commands::Lookup {
            brand: None,
            model: None,
            year: None
        }
    ));
}

#[test]
fn model_without_brand_is_rejected() {
    assert!(Cli::try_parse_from(["infocars", "lookup", "--model", "7"]).is_err());
}

#[test]
fn year_without_model_is_rejected() {
    assert!(Cli::try_parse_from(["infocars", "lookup", "--brand", "1", "--year", "2020"]).is_err());
}

#[test]
fn parses_kind_override() {
    let cli = Cli::try_parse_from(["infocars", "brands", "--kind", "motos"])
        .expect("expected valid cli args");
    assert_eq!(cli.kind, Some(VehicleKind::Motorcycles));
    assert!(matches!(cli.command, Commands::Brands));
}

#[test]
fn unknown_kind_is_rejected() {
    assert!(Cli::try_parse_from(["infocars", "brands", "--kind", "boats"]).is_err());
}

#[test]
fn years_requires_brand_and_model() {
    assert!(Cli::try_parse_from(["infocars", "years", "--brand", "1"]).is_err());
    let cli = Cli::try_parse_from(["infocars", "years", "--brand", "1", "--model", "7"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Years { ref brand, ref model } if brand == "1" && model == "7"
    ));
}

#[test]
fn format_items_text_is_tab_separated() {
    let items = vec![CatalogItem::new("1", "Acura"), CatalogItem::new("2", "Honda")];
    assert_eq!(
        format_items(&items, false).expect("format"),
        "1\tAcura\n2\tHonda\n"
    );
}

#[test]
fn format_items_json_keeps_order() {
    let items = vec![CatalogItem::new("2", "Honda"), CatalogItem::new("1", "Acura")];
    let out = format_items(&items, true).expect("format");
    let parsed: serde_json::Value = serde_json::from_str(&out).expect("json");
    assert_eq!(parsed[0]["code"], "2");
    assert_eq!(parsed[1]["label"], "Acura");
}

async fn mount(server: &MockServer, route: &str, body: serde_json::Value, times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn lookup_with_choices_skips_default_chain() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/carros/marcas",
        serde_json::json!([{ "codigo": "1", "nome": "Acura" }, { "codigo": "2", "nome": "Agrale" }]),
        1,
    )
    .await;
    mount(
        &server,
        "/carros/marcas/1/modelos",
        serde_json::json!({ "modelos": [], "anos": [] }),
        0,
    )
    .await;
    mount(
        &server,
        "/carros/marcas/2/modelos",
        serde_json::json!({ "modelos": [{ "codigo": 4564, "nome": "MARRUÁ 2.8" }], "anos": [] }),
        1,
    )
    .await;
    mount(
        &server,
        "/carros/marcas/2/modelos/4564/anos",
        serde_json::json!([{ "codigo": "2015-3", "nome": "2015 Diesel" }]),
        1,
    )
    .await;
    mount(
        &server,
        "/carros/marcas/2/modelos/4564/anos/2015-3",
        serde_json::json!({
            "TipoVeiculo": 1,
            "Valor": "R$ 120.000,00",
            "Marca": "Agrale",
            "Modelo": "MARRUÁ 2.8",
            "AnoModelo": 2015,
            "Combustivel": "Diesel",
            "CodigoFipe": "060001-0",
            "MesReferencia": "maio de 2023",
            "SiglaCombustivel": "D"
        }),
        1,
    )
    .await;

    let client = FipeClient::with_base_url(&server.uri(), VehicleKind::Cars, None, "infocars-test")
        .expect("client");
    let snapshot = lookup(client, Some("2"), Some("4564"), Some("2015-3")).await;

    assert_eq!(snapshot.selection.brand.as_deref(), Some("2"));
    assert_eq!(snapshot.selection.year.as_deref(), Some("2015-3"));
    assert_eq!(snapshot.vehicle.title(), Some("MARRUÁ 2.8"));

    let text = render_text(&snapshot);
    assert!(text.contains("Brand: Agrale [2] (2 options)"), "{text}");
    assert!(text.contains("  Fuel Acronym: D"), "{text}");
}

#[tokio::test]
async fn lookup_without_choices_follows_first_options() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/carros/marcas",
        serde_json::json!([{ "codigo": "1", "nome": "Acura" }]),
        1,
    )
    .await;
    mount(
        &server,
        "/carros/marcas/1/modelos",
        serde_json::json!({ "modelos": [], "anos": [] }),
        1,
    )
    .await;

    let client = FipeClient::with_base_url(&server.uri(), VehicleKind::Cars, None, "infocars-test")
        .expect("client");
    let snapshot = lookup(client, None, None, None).await;

    assert_eq!(snapshot.selection.brand.as_deref(), Some("1"));
    assert_eq!(snapshot.selection.model, None);
    assert_eq!(snapshot.model.state, ViewState::Ready(Vec::new()));
    assert_eq!(snapshot.year.state, ViewState::Idle);
    assert!(render_text(&snapshot).contains("Model: no options"));
}
