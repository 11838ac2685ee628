use bankchat::config::ServerConfig;
use bankchat::proxy::ProxyServer;
use bankchat::storage::SqliteStorage;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[allow(dead_code)]
pub fn create_temp_storage() -> (SqliteStorage, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let db_path = tmp.path().join("client.db");
    let storage =
        SqliteStorage::new_with_path(db_path).expect("failed to create sqlite storage with path");
    (storage, tmp)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Start a proxy on an ephemeral port in front of `backend_url`
///
/// Returns the running server and its `/api` base URL.
#[allow(dead_code)]
pub async fn start_proxy(backend_url: &str, max_upload_bytes: usize) -> (ProxyServer, String) {
    let config = ServerConfig {
        backend_url: backend_url.to_string(),
        max_upload_bytes,
        request_timeout_seconds: 5,
        ..Default::default()
    };
    let mut server = ProxyServer::new(&config).expect("failed to create proxy");
    let addr = server
        .start("127.0.0.1:0".parse().unwrap())
        .await
        .expect("failed to start proxy");
    (server, format!("http://{}/api", addr))
}
