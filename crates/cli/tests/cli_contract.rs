// Integration tests for the headless commands: stdout shape and exit codes.
//
// Each test points the binary at a mock catalog server and an empty config
// directory, so nothing on the machine running the tests is read or written.
//
// Run with: cargo test -p stockgrid-cli --test cli_contract

use std::process::{Command, Output};

use httpmock::prelude::*;
use serde_json::json;

struct Env {
    _config: tempfile::TempDir,
    config_home: std::path::PathBuf,
}

impl Env {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config_home = dir.path().to_path_buf();
        Self { _config: dir, config_home }
    }

    fn stockgrid(&self, api_url: &str, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_stockgrid"))
            .env("XDG_CONFIG_HOME", &self.config_home)
            .env("HOME", &self.config_home)
            .env("STOCKGRID_API_URL", api_url)
            .env_remove("RUST_LOG")
            .args(args)
            .output()
            .expect("run stockgrid")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn list_json_is_normalized() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/produtos").query_param("page", "1");
        then.status(200).json_body(json!({
            "items": [
                { "item_id": 1001, "descricao": "PARAFUSO", "estoque_pdv2": "7.0000", "valor_venda1": "12.5", "ativo": null },
                { "descricao": "SEM CODIGO" }
            ],
            "pagination": { "currentPage": 1, "totalPages": 3, "totalItems": 120 }
        }));
    });

    let env = Env::new();
    let output = env.stockgrid(&server.base_url(), &["list", "--json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let value: serde_json::Value = serde_json::from_str(stdout(&output).trim()).unwrap();
    let items = value["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["item_id"], "1001");
    assert_eq!(items[0]["loja2"], 7);
    assert_eq!(items[0]["venda1"], 12.5);
    assert_eq!(items[0]["situacao"], "A");
    assert_eq!(value["hasMore"], true);
    assert_eq!(value["pagination"]["totalItems"], 120);
}

#[test]
fn list_table_uses_pt_br_numbers() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/produtos");
        then.status(200).json_body(json!({
            "items": [{ "item_id": 7, "descricao": "MARTELO", "custo_venda": "1234.5" }],
            "pagination": { "hasNextPage": false }
        }));
    });

    let env = Env::new();
    let output = env.stockgrid(&server.base_url(), &["list"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.starts_with("Código"));
    assert!(text.contains("MARTELO"));
    assert!(text.contains("1.234,50"));
    assert!(stderr(&output).contains("page 1: 1 records"));
}

#[test]
fn get_missing_product_exits_13() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/produtos/999");
        then.status(404).json_body(json!({ "message": "Produto não encontrado" }));
    });

    let env = Env::new();
    let output = env.stockgrid(&server.base_url(), &["get", "999"]);
    assert_eq!(output.status.code(), Some(13));
    assert!(stderr(&output).contains("error: Produto não encontrado"));
}

#[test]
fn set_sends_single_backend_field() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(PUT)
            .path("/api/produtos/1001")
            .json_body(json!({ "valor_venda1": 1234.5 }));
        then.status(200).json_body(json!({ "item_id": 1001 }));
    });

    let env = Env::new();
    let output = env.stockgrid(&server.base_url(), &["set", "1001", "venda1", "1.234,5"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    mock.assert();
    assert_eq!(stdout(&output).trim(), "1001 Venda1 = 1.234,50");
}

#[test]
fn set_rejects_letters_before_sending() {
    let env = Env::new();
    // nothing listens here; the value must be rejected first
    let output = env.stockgrid("http://127.0.0.1:9", &["set", "1001", "loja3", "doze"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("Loja3"));
}

#[test]
fn set_unknown_field_is_usage_error() {
    let env = Env::new();
    let output = env.stockgrid("http://127.0.0.1:9", &["set", "1001", "preco", "1"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("hint:"));
}

#[test]
fn set_backend_validation_exits_12() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(PUT).path("/api/produtos/5");
        then.status(400).json_body(json!({ "message": "Campos numéricos inválidos: estoque_pdv1" }));
    });

    let env = Env::new();
    let output = env.stockgrid(&server.base_url(), &["set", "5", "loja1", "3"]);
    assert_eq!(output.status.code(), Some(12));
    assert!(stderr(&output).contains("Campos numéricos inválidos"));
}

#[test]
fn unreachable_backend_exits_10_with_hint() {
    let env = Env::new();
    let output = env.stockgrid("http://127.0.0.1:9", &["list"]);
    assert_eq!(output.status.code(), Some(10));
    assert!(stderr(&output).contains("hint:  is the catalog API running at http://127.0.0.1:9"));
}

#[test]
fn config_writes_default_settings_on_first_run() {
    let env = Env::new();
    let output = env.stockgrid("http://10.0.0.5:5000", &["config"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("\"api.baseUrl\": \"http://10.0.0.5:5000\""));
    assert!(env.config_home.join("stockgrid").join("settings.json").exists());
}
