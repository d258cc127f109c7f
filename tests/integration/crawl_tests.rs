//! Integration tests for the harvester
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! index → entity → detail cycle end-to-end over real HTTP.

use catalog_harvest::config::{Config, CrawlerConfig, OutputConfig, SiteConfig, UserAgentConfig};
use catalog_harvest::crawler::{Coordinator, RecordingSleeper};
use catalog_harvest::output::{generate_markdown_summary, write_csv, EntityStatus};
use catalog_harvest::{Field, HarvestError, RunPhase};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(server: &MockServer, min_index_options: usize) -> Config {
    Config {
        crawler: CrawlerConfig {
            batch_size: 10,
            request_timeout_ms: 500,
            retry_count: 3,
            initial_delay_ms: 10, // Very short for testing
            max_concurrent_details: 5,
            batch_pause_min_ms: 0,
            batch_pause_max_ms: 0,
        },
        site: SiteConfig {
            base_url: format!("{}/", server.uri()),
            min_index_options,
            ..SiteConfig::default()
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestHarvester".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: Some("https://example.com/about".to_string()),
        },
        output: OutputConfig::default(),
    }
}

fn coordinator(config: Config, sleeper: &RecordingSleeper) -> Coordinator {
    Coordinator::new(config)
        .expect("Failed to build coordinator")
        .with_sleeper(Arc::new(sleeper.clone()))
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

fn index_html(options: &[&str]) -> String {
    let options: String = options
        .iter()
        .map(|label| format!("<option>{label}</option>"))
        .collect();
    format!(
        r#"<html><head><title>IMPPAT | Home</title></head><body>
        <select name="plant">{options}</select></body></html>"#
    )
}

fn entity_html(heading: &str, sub_items: &[&str]) -> String {
    let links: String = sub_items
        .iter()
        .map(|id| format!(r#"<li><a href="/imppat/phytochemical-detailedpage/{id}">{id}</a></li>"#))
        .collect();
    format!(
        r#"<html><head><title>IMPPAT | Phytochemicals</title></head><body>
        <h1>{heading}</h1><a href="/imppat/">Home</a><ul>{links}</ul></body></html>"#
    )
}

fn detail_html(smiles: &str, inchi: &str, inchikey: &str, deep: &str) -> String {
    format!(
        r#"<html><body><table>
        <tr><td>SMILES:</td><td>{smiles}</td></tr>
        <tr><td>InChI:</td><td>{inchi}</td></tr>
        <tr><td>InChIKey:</td><td>{inchikey}</td></tr>
        <tr><td>DeepSMILES:</td><td>{deep}</td></tr>
        </table></body></html>"#
    )
}

async fn mount_index(server: &MockServer, options: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(index_html(options)))
        .mount(server)
        .await;
}

async fn mount_entity(server: &MockServer, name_pattern: &str, heading: &str, sub_items: &[&str]) {
    Mock::given(method("GET"))
        .and(path_regex(format!("^/imppat/phytochemical/{name_pattern}$")))
        .respond_with(html(entity_html(heading, sub_items)))
        .mount(server)
        .await;
}

async fn mount_detail(server: &MockServer, id: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(format!("/imppat/phytochemical-detailedpage/{id}")))
        .respond_with(html(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_end_to_end_scenario() {
    let server = MockServer::start().await;

    mount_index(&server, &["Aloe vera", "Basil", "Choose a plant…"]).await;
    mount_entity(&server, "Aloe(%20| )vera", "Aloe vera", &["IMPHY000001", "IMPHY000002"]).await;
    mount_detail(
        &server,
        "IMPHY000001",
        detail_html("CCO", "InChI=1S/C2H6O", "LFQSCWFLJHTTHZ-UHFFFAOYSA-N", "CCO"),
    )
    .await;
    mount_detail(
        &server,
        "IMPHY000002",
        detail_html("C=O", "InChI=1S/CH2O", "WSFSSNUMVMOOMR-UHFFFAOYSA-N", "C=O"),
    )
    .await;

    // Basil's page fails every attempt
    Mock::given(method("GET"))
        .and(path("/imppat/phytochemical/Basil"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::new();
    let mut coordinator = coordinator(create_test_config(&server, 2), &sleeper);
    let report = coordinator.run().await.expect("Run should complete");

    assert_eq!(coordinator.phase(), RunPhase::Done);
    assert_eq!(report.records.len(), 2);
    assert!(report.records.iter().all(|r| r.entity_name == "Aloe vera"));

    let first = &report.records[0];
    assert_eq!(first.sub_item_label, "IMPHY000001");
    assert_eq!(first.fields.get(Field::Smiles), "CCO");
    assert_eq!(first.fields.get(Field::InChI), "InChI=1S/C2H6O");
    assert_eq!(first.fields.get(Field::InChIKey), "LFQSCWFLJHTTHZ-UHFFFAOYSA-N");
    assert_eq!(first.fields.get(Field::DeepSmiles), "CCO");
    assert_eq!(report.records[1].fields.get(Field::Smiles), "C=O");

    let basil = report
        .statistics
        .entities
        .iter()
        .find(|e| e.display_name == "Basil")
        .expect("Basil should be reported");
    assert_eq!(basil.status, EntityStatus::Failed);
    assert_eq!(report.statistics.entities_total, 2);
    assert_eq!(sleeper.count(), 2);
}

#[tokio::test]
async fn test_partial_failure_is_isolated() {
    let server = MockServer::start().await;
    let ids = ["IMPHY1", "IMPHY2", "IMPHY3", "IMPHY4", "IMPHY5"];

    mount_index(&server, &["Neem", "Tulsi"]).await;
    mount_entity(&server, "Neem", "Azadirachta indica", &ids).await;
    mount_entity(&server, "Tulsi", "Ocimum tenuiflorum", &["IMPHY9"]).await;

    for id in ["IMPHY1", "IMPHY3", "IMPHY5", "IMPHY9"] {
        mount_detail(&server, id, detail_html(id, "", "", "")).await;
    }
    for id in ["IMPHY2", "IMPHY4"] {
        Mock::given(method("GET"))
            .and(path(format!("/imppat/phytochemical-detailedpage/{id}")))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;
    }

    let sleeper = RecordingSleeper::new();
    let report = coordinator(create_test_config(&server, 1), &sleeper)
        .run()
        .await
        .expect("Run should complete");

    let neem: Vec<_> = report
        .records
        .iter()
        .filter(|r| r.entity_name == "Azadirachta indica")
        .map(|r| r.sub_item_label.as_str())
        .collect();
    assert_eq!(neem, vec!["IMPHY1", "IMPHY3", "IMPHY5"]);

    let tulsi: Vec<_> = report
        .records
        .iter()
        .filter(|r| r.entity_name == "Ocimum tenuiflorum")
        .collect();
    assert_eq!(tulsi.len(), 1);

    assert_eq!(report.statistics.sub_items_failed(), 2);
}

#[tokio::test]
async fn test_missing_detail_page_is_not_retried() {
    let server = MockServer::start().await;

    mount_index(&server, &["Amla"]).await;
    mount_entity(&server, "Amla", "Phyllanthus emblica", &["IMPHY404"]).await;
    Mock::given(method("GET"))
        .and(path("/imppat/phytochemical-detailedpage/IMPHY404"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::new();
    let report = coordinator(create_test_config(&server, 0), &sleeper)
        .run()
        .await
        .expect("Run should complete");

    assert_eq!(report.records.len(), 1);
    for (_, value) in report.records[0].fields.iter() {
        assert_eq!(value, "");
    }
    assert_eq!(sleeper.count(), 0);
}

#[tokio::test]
async fn test_index_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::new();
    let mut coordinator = coordinator(create_test_config(&server, 2), &sleeper);
    let result = coordinator.run().await;

    assert!(matches!(result, Err(HarvestError::IndexUnavailable { .. })));
    assert_eq!(coordinator.phase(), RunPhase::Failed);
}

#[tokio::test]
async fn test_index_without_selector() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<html><body><p>Maintenance</p></body></html>".to_string()))
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::new();
    let result = coordinator(create_test_config(&server, 2), &sleeper).run().await;

    assert!(matches!(result, Err(HarvestError::IndexUnavailable { .. })));
    assert_eq!(sleeper.count(), 0);
}

#[tokio::test]
async fn test_slow_detail_page_times_out() {
    let server = MockServer::start().await;

    mount_index(&server, &["Ashwagandha"]).await;
    mount_entity(&server, "Ashwagandha", "Withania somnifera", &["IMPHY1", "IMPHY2"]).await;
    mount_detail(&server, "IMPHY1", detail_html("C", "", "", "")).await;
    Mock::given(method("GET"))
        .and(path("/imppat/phytochemical-detailedpage/IMPHY2"))
        .respond_with(html(detail_html("CC", "", "", "")).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let mut config = create_test_config(&server, 0);
    config.crawler.request_timeout_ms = 200;
    config.crawler.retry_count = 2;

    let sleeper = RecordingSleeper::new();
    let report = coordinator(config, &sleeper)
        .run()
        .await
        .expect("Run should complete");

    let labels: Vec<_> = report.records.iter().map(|r| r.sub_item_label.as_str()).collect();
    assert_eq!(labels, vec!["IMPHY1"]);
    assert_eq!(sleeper.count(), 1);
}

#[tokio::test]
async fn test_invalid_utf8_detail_page_is_decoded_permissively() {
    let server = MockServer::start().await;

    mount_index(&server, &["Giloy"]).await;
    mount_entity(&server, "Giloy", "Tinospora cordifolia", &["IMPHY7"]).await;

    let mut body = b"<html><body><p>Name: caf".to_vec();
    body.push(0xE9);
    body.extend_from_slice(b"</p><p>SMILES: CCN</p></body></html>");
    Mock::given(method("GET"))
        .and(path("/imppat/phytochemical-detailedpage/IMPHY7"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .expect(1)
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::new();
    let report = coordinator(create_test_config(&server, 0), &sleeper)
        .run()
        .await
        .expect("Run should complete");

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].fields.get(Field::Smiles), "CCN");
}

#[tokio::test]
async fn test_user_agent_is_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header(
            "user-agent",
            "TestHarvester/1.0 (+https://example.com/about)",
        ))
        .respond_with(html(index_html(&["Only"])))
        .expect(1)
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::new();
    let report = coordinator(create_test_config(&server, 0), &sleeper)
        .run()
        .await
        .expect("Run should complete");

    // the entity page is missing, which is not an error
    assert!(report.is_empty());
    assert_eq!(
        report.statistics.entities_with_status(EntityStatus::Absent),
        1
    );
}

#[tokio::test]
async fn test_batches_run_in_order() {
    let server = MockServer::start().await;
    let names: Vec<_> = (0..7).map(|i| format!("Plant{i}")).collect();
    let labels: Vec<_> = names.iter().map(String::as_str).collect();

    mount_index(&server, &labels).await;
    for name in &names {
        mount_entity(&server, name, name, &[]).await;
    }

    let mut config = create_test_config(&server, 0);
    config.crawler.batch_size = 3;
    config.crawler.batch_pause_min_ms = 5;
    config.crawler.batch_pause_max_ms = 10;

    let sleeper = RecordingSleeper::new();
    let report = coordinator(config, &sleeper)
        .run()
        .await
        .expect("Run should complete");

    let sizes: Vec<_> = report.statistics.batches.iter().map(|b| b.size).collect();
    assert_eq!(sizes, vec![3, 3, 1]);
    assert_eq!(sleeper.count(), 2);
    for pause in sleeper.calls() {
        assert!(pause >= Duration::from_millis(5) && pause <= Duration::from_millis(10));
    }
}

#[tokio::test]
async fn test_outputs_written_to_disk() {
    let server = MockServer::start().await;

    mount_index(&server, &["Aloe vera"]).await;
    mount_entity(&server, "Aloe(%20| )vera", "Aloe vera", &["IMPHY000001"]).await;
    mount_detail(&server, "IMPHY000001", detail_html("CCO", "I", "K", "D")).await;

    let sleeper = RecordingSleeper::new();
    let report = coordinator(create_test_config(&server, 0), &sleeper)
        .run()
        .await
        .expect("Run should complete");

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let csv_path = dir.path().join("plants.csv");
    let summary_path = dir.path().join("summary.md");

    let written = write_csv(&report.records, &csv_path).expect("CSV should be written");
    assert!(written.is_some());
    generate_markdown_summary(&report.statistics, &summary_path).expect("Summary should be written");

    let csv = std::fs::read_to_string(&csv_path).expect("Failed to read CSV");
    let lines: Vec<_> = csv.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Selected plant from drop-down:,Processed Phytochemical Name,SMILES,InChI,InChIKey,DeepSMILES",
            "Aloe vera,IMPHY000001,CCO,I,K,D",
        ]
    );

    let summary = std::fs::read_to_string(&summary_path).expect("Failed to read summary");
    assert!(summary.contains("- **Records**: 1"));
}

#[tokio::test]
async fn test_zero_records_writes_no_file() {
    let server = MockServer::start().await;

    mount_index(&server, &["Empty"]).await;
    mount_entity(&server, "Empty", "Empty", &[]).await;

    let sleeper = RecordingSleeper::new();
    let report = coordinator(create_test_config(&server, 0), &sleeper)
        .run()
        .await
        .expect("Run should complete");

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let csv_path = dir.path().join("plants.csv");

    assert!(report.is_empty());
    assert!(write_csv(&report.records, &csv_path).unwrap().is_none());
    assert!(!csv_path.exists());
}
