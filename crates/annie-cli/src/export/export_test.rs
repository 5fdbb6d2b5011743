use std::path::PathBuf;

use annie_core::{CorrectionRule, UnitMetric};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

const SALES_HEADER_LINE: &str = "date,num_downloads,num_updates,num_refunds,sales,refunds";

fn test_config(output_dir: PathBuf) -> AppConfig {
    AppConfig {
        api_key: "test-key".to_string(),
        base_url: "unused".to_string(),
        skip_apps: vec![],
        run_report: false,
        add_delay: false,
        corrections_path: PathBuf::from("unused.yaml"),
        output_dir,
        request_timeout_secs: 30,
        log_level: "info".to_string(),
    }
}

fn options(config: &AppConfig, clean: bool) -> ExportOptions {
    ExportOptions {
        clean,
        ..ExportOptions::from_config(config, false, true, None)
    }
}

fn test_client(server: &MockServer) -> AnnieClient {
    AnnieClient::with_base_url("test-key", 30, &format!("{}/v1.2", server.uri()))
        .expect("client construction should not fail")
}

async fn mount_json(server: &MockServer, route: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mounts the single-account, single-product fixture.
async fn mount_widget(server: &MockServer) {
    mount_json(
        server,
        "/v1.2/accounts",
        serde_json::json!({
            "account_list": [{ "account_id": "1", "account_name": "Acme" }]
        }),
    )
    .await;
    mount_json(
        server,
        "/v1.2/accounts/1/products",
        serde_json::json!({
            "products": [{ "product_id": "42", "product_name": "Widget", "devices": ["iphone"] }]
        }),
    )
    .await;
    mount_json(
        server,
        "/v1.2/accounts/1/products/42/reviews",
        serde_json::json!({
            "review_list": [
                {
                    "version": "1.0",
                    "country": "US",
                    "date": "2024-01-02",
                    "title": "Love it",
                    "text": "It \"just\" works",
                    "reviewer": "sam",
                    "rating": 5
                },
                {
                    "version": "1.0",
                    "country": "GB",
                    "date": "2024-01-01",
                    "title": "Meh",
                    "text": null,
                    "reviewer": "alex",
                    "rating": 2
                }
            ]
        }),
    )
    .await;
    mount_json(
        server,
        "/v1.2/accounts/1/products/42/sales",
        serde_json::json!({
            "sales_list": [{
                "date": "2024-01-01",
                "units": { "product": { "downloads": 10, "updates": 1, "refunds": 0 } },
                "revenue": { "product": { "downloads": 9.99, "refunds": 0 } }
            }]
        }),
    )
    .await;
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).expect("read output")
}

#[tokio::test]
async fn writes_sales_file_for_product() {
    let server = MockServer::start().await;
    mount_widget(&server).await;
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path().to_path_buf());

    let summary = run_export(
        &test_client(&server),
        &config,
        &CorrectionTable::default(),
        &options(&config, true),
    )
    .await
    .expect("export should succeed");

    let sales = read(&dir.path().join("Numbers Widget (iphone) [42].csv"));
    assert_eq!(sales, format!("{SALES_HEADER_LINE}\n2024-01-01,10,1,0,9.99,0\n"));

    assert_eq!(summary.accounts, 1);
    assert_eq!(summary.products_exported, 1);
    assert_eq!(summary.review_rows, 2);
    assert_eq!(summary.sales_rows, 1);
    assert_eq!(summary.corrections_applied, 0);
}

#[tokio::test]
async fn writes_review_file_for_account() {
    let server = MockServer::start().await;
    mount_widget(&server).await;
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path().to_path_buf());

    run_export(
        &test_client(&server),
        &config,
        &CorrectionTable::default(),
        &options(&config, true),
    )
    .await
    .unwrap();

    assert_eq!(
        read(&dir.path().join("Reviews Acme.csv")),
        "App,version,country,date,title,text,reviewer\n\
         Widget,1.0,US,2024-01-02,Love it,\"It \"\"just\"\" works\",sam\n\
         Widget,1.0,GB,2024-01-01,Meh,,alex\n"
    );
}

#[tokio::test]
async fn applies_matching_correction() {
    let server = MockServer::start().await;
    mount_widget(&server).await;
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path().to_path_buf());

    let mut corrections = CorrectionTable::default();
    corrections.insert(
        "42",
        "2024-01-01",
        UnitMetric::Downloads,
        CorrectionRule {
            expected: 10,
            replacement: 8,
        },
    );

    let summary = run_export(
        &test_client(&server),
        &config,
        &corrections,
        &options(&config, true),
    )
    .await
    .unwrap();

    let sales = read(&dir.path().join("Numbers Widget (iphone) [42].csv"));
    assert_eq!(sales, format!("{SALES_HEADER_LINE}\n2024-01-01,8,1,0,9.99,0\n"));
    assert_eq!(summary.corrections_applied, 1);
}

#[tokio::test]
async fn not_applicable_product_is_skipped_entirely() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/v1.2/accounts",
        serde_json::json!({
            "account_list": [{ "account_id": "1", "account_name": "Acme" }]
        }),
    )
    .await;
    mount_json(
        &server,
        "/v1.2/accounts/1/products",
        serde_json::json!({
            "app_list": [{ "product_id": "43", "product_name": "n/a" }]
        }),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/v1.2/accounts/1/products/43/reviews"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1.2/accounts/1/products/43/sales"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path().to_path_buf());

    let summary = run_export(
        &test_client(&server),
        &config,
        &CorrectionTable::default(),
        &options(&config, true),
    )
    .await
    .unwrap();

    assert_eq!(summary.products_skipped, 1);
    assert_eq!(summary.products_exported, 0);
    let sales_files: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().starts_with("Numbers "))
        .collect();
    assert!(sales_files.is_empty(), "no sales file should be created");
}

#[tokio::test]
async fn configured_skip_bypasses_fetches() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/v1.2/accounts",
        serde_json::json!({
            "account_list": [{ "account_id": "1", "account_name": "Acme" }]
        }),
    )
    .await;
    mount_json(
        &server,
        "/v1.2/accounts/1/products",
        serde_json::json!({
            "products": [{ "product_id": "42", "product_name": "Widget" }]
        }),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/v1.2/accounts/1/products/42/sales"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = test_config(dir.path().to_path_buf());
    config.skip_apps = vec!["42".to_string()];

    let summary = run_export(
        &test_client(&server),
        &config,
        &CorrectionTable::default(),
        &options(&config, true),
    )
    .await
    .unwrap();

    assert_eq!(summary.products_skipped, 1);
    assert!(!dir.path().join("Numbers Widget [42].csv").exists());
}

#[tokio::test]
async fn review_export_is_idempotent() {
    let server = MockServer::start().await;
    mount_widget(&server).await;
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path().to_path_buf());
    let client = test_client(&server);
    let corrections = CorrectionTable::default();

    run_export(&client, &config, &corrections, &options(&config, true))
        .await
        .unwrap();
    let first = read(&dir.path().join("Reviews Acme.csv"));

    run_export(&client, &config, &corrections, &options(&config, false))
        .await
        .unwrap();
    let second = read(&dir.path().join("Reviews Acme.csv"));

    assert_eq!(first, second);
}

#[tokio::test]
async fn sales_export_duplicates_without_cleanup_and_recovers_with_it() {
    let server = MockServer::start().await;
    mount_widget(&server).await;
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path().to_path_buf());
    let client = test_client(&server);
    let corrections = CorrectionTable::default();
    let sales_path = dir.path().join("Numbers Widget (iphone) [42].csv");
    let single = format!("{SALES_HEADER_LINE}\n2024-01-01,10,1,0,9.99,0\n");

    run_export(&client, &config, &corrections, &options(&config, false))
        .await
        .unwrap();
    run_export(&client, &config, &corrections, &options(&config, false))
        .await
        .unwrap();
    assert_eq!(
        read(&sales_path),
        format!("{SALES_HEADER_LINE}\n2024-01-01,10,1,0,9.99,0\n2024-01-01,10,1,0,9.99,0\n")
    );

    let summary = run_export(&client, &config, &corrections, &options(&config, true))
        .await
        .unwrap();
    assert_eq!(summary.files_removed, 1);
    assert_eq!(read(&sales_path), single);
}

#[tokio::test]
async fn missing_revenue_bundle_aborts_run() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/v1.2/accounts",
        serde_json::json!({
            "account_list": [{ "account_id": "1", "account_name": "Acme" }]
        }),
    )
    .await;
    mount_json(
        &server,
        "/v1.2/accounts/1/products",
        serde_json::json!({
            "products": [{ "product_id": "42", "product_name": "Widget" }]
        }),
    )
    .await;
    mount_json(
        &server,
        "/v1.2/accounts/1/products/42/reviews",
        serde_json::json!({ "review_list": [] }),
    )
    .await;
    mount_json(
        &server,
        "/v1.2/accounts/1/products/42/sales",
        serde_json::json!({
            "sales_list": [{
                "date": "2024-01-01",
                "units": { "product": { "downloads": 10 } }
            }]
        }),
    )
    .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path().to_path_buf());

    let err = run_export(
        &test_client(&server),
        &config,
        &CorrectionTable::default(),
        &options(&config, true),
    )
    .await
    .unwrap_err();

    assert!(
        matches!(err, ExportError::MissingBundle { bundle: "revenue", ref product_id, .. } if product_id == "42"),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn unknown_account_filter_is_an_error() {
    let server = MockServer::start().await;
    mount_widget(&server).await;
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path().to_path_buf());
    let opts = ExportOptions {
        account_filter: Some("999".to_string()),
        ..options(&config, true)
    };

    let err = run_export(
        &test_client(&server),
        &config,
        &CorrectionTable::default(),
        &opts,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ExportError::UnknownAccount(ref id) if id == "999"));
}

#[test]
fn clean_outputs_removes_only_sales_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("Numbers Widget [42].csv"), "x").unwrap();
    std::fs::write(dir.path().join("Numbers Gadget [7].csv"), "x").unwrap();
    std::fs::write(dir.path().join("Reviews Acme.csv"), "x").unwrap();
    std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

    let removed = clean_outputs(dir.path()).unwrap();

    assert_eq!(removed, 2);
    assert!(!dir.path().join("Numbers Widget [42].csv").exists());
    assert!(dir.path().join("Reviews Acme.csv").exists());
    assert!(dir.path().join("notes.txt").exists());
}

#[test]
fn clean_outputs_on_missing_dir_is_a_no_op() {
    let dir = tempfile::tempdir().expect("tempdir");
    assert_eq!(clean_outputs(&dir.path().join("absent")).unwrap(), 0);
}

#[test]
fn options_follow_config_and_flags() {
    let mut config = test_config(PathBuf::from("out"));
    config.run_report = true;
    config.add_delay = true;

    let opts = ExportOptions::from_config(&config, false, false, None);
    assert!(opts.clean);
    assert!(opts.run_report);
    assert_eq!(opts.inter_product_delay, Some(INTER_PRODUCT_DELAY));

    let opts = ExportOptions::from_config(&config, true, true, Some("1".to_string()));
    assert!(!opts.clean);
    assert!(!opts.run_report);
    assert_eq!(opts.account_filter.as_deref(), Some("1"));
}
