use base64::Engine;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;

fn docfind_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("docfind");
    path
}

/// Find an available port for the test server.
fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn setup_server_env(port: u16) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("docfind.toml");
    fs::write(
        &config_path,
        format!(
            r#"[search]
context_before = 1
context_after = 1

[extract]
commands = []

[server]
bind = "127.0.0.1:{}"
"#,
            port
        ),
    )
    .unwrap();
    (tmp, config_path)
}

/// Start the server in the background and return the child process.
fn start_server(config_path: &Path) -> std::process::Child {
    let binary = docfind_binary();
    Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .arg("serve")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap_or_else(|e| panic!("Failed to start server: {}", e))
}

/// Wait for the server to be ready by polling the health endpoint.
fn wait_for_server(port: u16) {
    let url = format!("http://127.0.0.1:{}/health", port);
    for _ in 0..50 {
        std::thread::sleep(std::time::Duration::from_millis(100));
        if let Ok(resp) = reqwest::blocking::get(&url) {
            if resp.status().is_success() {
                return;
            }
        }
    }
    panic!("Server did not become ready within 5 seconds");
}

fn file(name: &str, content: &[u8]) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "content_base64": base64::engine::general_purpose::STANDARD.encode(content),
    })
}

struct Server {
    child: std::process::Child,
    base: String,
    client: reqwest::blocking::Client,
    _tmp: TempDir,
}

impl Server {
    fn start() -> Self {
        let port = find_free_port();
        let (tmp, config_path) = setup_server_env(port);
        let child = start_server(&config_path);
        wait_for_server(port);
        Self {
            child,
            base: format!("http://127.0.0.1:{}", port),
            client: reqwest::blocking::Client::new(),
            _tmp: tmp,
        }
    }

    fn upload(&self, files: Vec<serde_json::Value>) -> serde_json::Value {
        let resp = self
            .client
            .post(format!("{}/documents", self.base))
            .json(&serde_json::json!({ "files": files }))
            .send()
            .unwrap();
        assert_eq!(resp.status(), 200);
        resp.json().unwrap()
    }

    fn search(&self, body: serde_json::Value) -> serde_json::Value {
        let resp = self
            .client
            .post(format!("{}/search", self.base))
            .json(&body)
            .send()
            .unwrap();
        assert_eq!(resp.status(), 200);
        resp.json().unwrap()
    }

    fn documents(&self) -> serde_json::Value {
        self.client
            .get(format!("{}/documents", self.base))
            .send()
            .unwrap()
            .json()
            .unwrap()
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.child.kill().ok();
        self.child.wait().ok();
    }
}

const REGULATION: &str = "Điều 1. Phạm vi. Điều 2. Lãi suất thả nổi. Điều 3. Phí. Điều 4. Hiệu lực.";

#[test]
fn test_server_health() {
    let server = Server::start();
    let resp = reqwest::blocking::get(format!("{}/health", server.base)).unwrap();
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = resp.json().unwrap();
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[test]
fn test_server_upload_and_search() {
    let server = Server::start();

    let report = server.upload(vec![
        file("quy-dinh.txt", REGULATION.as_bytes()),
        file("broken.docx", b"not a zip"),
        file("blank.txt", b"   "),
    ]);
    assert_eq!(report["added"], serde_json::json!(["quy-dinh.txt"]));
    assert_eq!(report["empty"], serde_json::json!(["blank.txt"]));
    assert_eq!(report["failed"][0]["name"], "broken.docx");

    let body = server.search(serde_json::json!({ "query": "lai suat" }));
    assert_eq!(body["keywords"], serde_json::json!(["lai suat"]));
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    // Sentences: "Điều 1." "Phạm vi." "Điều 2." "Lãi suất thả nổi." ... with one each side.
    assert_eq!(results[0]["start"], 2);
    assert_eq!(results[0]["end"], 5);
    assert_eq!(results[0]["text"], "Điều 2. Lãi suất thả nổi. Điều 3.");
    assert_eq!(
        results[0]["html"],
        "Điều 2. <mark>Lãi suất</mark> thả nổi. Điều 3."
    );

    let body = server.search(serde_json::json!({ "query": "lãi suất", "before": 0, "after": 0 }));
    assert_eq!(body["results"][0]["text"], "Lãi suất thả nổi.");
}

#[test]
fn test_server_empty_query() {
    let server = Server::start();
    server.upload(vec![file("a.txt", REGULATION.as_bytes())]);

    let body = server.search(serde_json::json!({ "query": " , ; " }));
    assert_eq!(body["results"].as_array().unwrap().len(), 0);
    assert_eq!(body["message"], "no keyword provided");
}

#[test]
fn test_server_reupload_is_cached() {
    let server = Server::start();
    server.upload(vec![file("a.txt", REGULATION.as_bytes())]);

    let report = server.upload(vec![
        file("a.txt", REGULATION.as_bytes()),
        file("copy.txt", REGULATION.as_bytes()),
    ]);
    assert_eq!(report["cached"], serde_json::json!(["a.txt", "copy.txt"]));

    let docs = server.documents();
    let list = docs["documents"].as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["name"], "a.txt");
    assert_eq!(list[0]["size"], REGULATION.len());
    assert_eq!(list[0]["sentences"], 8);
    assert_eq!(docs["total_bytes"], 2 * REGULATION.len());
}

#[test]
fn test_server_identical_files_in_one_upload() {
    let server = Server::start();
    let report = server.upload(vec![
        file("first.txt", REGULATION.as_bytes()),
        file("second.txt", REGULATION.as_bytes()),
    ]);
    assert_eq!(report["added"], serde_json::json!(["first.txt"]));
    assert_eq!(report["cached"], serde_json::json!(["second.txt"]));

    let docs = server.documents();
    let list = docs["documents"].as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[1]["name"], "second.txt");
    assert_eq!(list[1]["sentences"], 8);
}

#[test]
fn test_server_remove_and_clear() {
    let server = Server::start();
    server.upload(vec![
        file("a.txt", b"Vay mot."),
        file("b.txt", b"Vay hai."),
    ]);

    let resp = server
        .client
        .delete(format!("{}/documents/a.txt", server.base))
        .send()
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = server
        .client
        .delete(format!("{}/documents/a.txt", server.base))
        .send()
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: serde_json::Value = resp.json().unwrap();
    assert_eq!(body["error"]["code"], "not_found");

    let body = server.search(serde_json::json!({ "query": "vay" }));
    assert_eq!(body["results"].as_array().unwrap().len(), 1);
    assert_eq!(body["results"][0]["document_name"], "b.txt");

    let resp = server
        .client
        .delete(format!("{}/documents", server.base))
        .send()
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().unwrap();
    assert_eq!(body["removed"], 1);

    let body = server.search(serde_json::json!({ "query": "vay" }));
    assert!(body["results"].as_array().unwrap().is_empty());
}

#[test]
fn test_server_rejects_empty_upload() {
    let server = Server::start();
    let resp = server
        .client
        .post(format!("{}/documents", server.base))
        .json(&serde_json::json!({ "files": [] }))
        .send()
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().unwrap();
    assert_eq!(body["error"]["code"], "bad_request");
}
