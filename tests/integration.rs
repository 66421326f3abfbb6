use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;

fn ptrail_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("ptrail");
    path
}

/// Records in the legacy index layout (`pdf_path` instead of `source_locator`).
const SEED_INDEX: &str = r#"[
  {"id": "icd-1", "doc_id": "icd", "doc_name": "ICD-10 handleiding.pdf", "page": 1,
   "text": "Inhoud\n8 Spijsvertering ........ 2", "pdf_path": "icd.pdf"},
  {"id": "icd-2", "doc_id": "icd", "doc_name": "ICD-10 handleiding.pdf", "page": 2,
   "text": "8 Spijsvertering\n8.1 Inleiding\nAlgemene tekst over het spijsverteringsstelsel.", "pdf_path": "icd.pdf"},
  {"id": "icd-3a", "doc_id": "icd", "doc_name": "ICD-10 handleiding.pdf", "page": 3,
   "text": "8 Spijsvertering 3\n8.4 Codeervoorbeelden\nDit is een voorbeeld van K35.80 appendicitis.", "pdf_path": "icd.pdf"},
  {"id": "icd-3b", "doc_id": "icd", "doc_name": "ICD-10 handleiding.pdf", "page": 3,
   "text": "\n8.4.1 Details\nMeer tekst over K35.80.", "pdf_path": "icd.pdf"},
  {"id": "dm-1", "doc_id": "dm", "doc_name": "Diabetes.pdf", "page": 1,
   "text": "Diabetes mellitus type 2 wordt gecodeerd als E11.", "pdf_path": "dm.pdf"}
]"#;

fn setup_test_env(backend: &str, port: u16, seed: bool) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    let pdf_dir = root.join("data").join("pdfs");
    fs::create_dir_all(&pdf_dir).unwrap();

    let store_file = if backend == "sqlite" {
        "pagetrail.sqlite"
    } else {
        "index.json"
    };

    let config_content = format!(
        r#"[store]
backend = "{}"
path = "{}/data/{}"

[documents]
dir = "{}/data/pdfs"

[server]
bind = "127.0.0.1:{}"
"#,
        backend,
        root.display(),
        store_file,
        root.display(),
        port
    );

    let config_path = config_dir.join("pagetrail.toml");
    fs::write(&config_path, config_content).unwrap();

    if seed {
        fs::write(root.join("data").join("index.json"), SEED_INDEX).unwrap();
        fs::write(pdf_dir.join("icd.pdf"), b"%PDF-1.4 placeholder").unwrap();
        fs::write(pdf_dir.join("dm.pdf"), b"%PDF-1.4 placeholder").unwrap();
    }

    (tmp, config_path)
}

fn run_ptrail(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = ptrail_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run ptrail binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

/// Minimal PDF with one text line per page. Builds the body first, then an
/// xref with exact byte offsets so the extractor can parse it.
fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    let n = pages.len();
    let font_id = 3 + 2 * n;
    let mut offsets = Vec::new();
    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");

    offsets.push(out.len());
    out.extend_from_slice(b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n");

    let kids = (0..n)
        .map(|i| format!("{} 0 R", 3 + 2 * i))
        .collect::<Vec<_>>()
        .join(" ");
    offsets.push(out.len());
    out.extend_from_slice(
        format!("2 0 obj << /Type /Pages /Kids [{}] /Count {} >> endobj\n", kids, n).as_bytes(),
    );

    for (i, text) in pages.iter().enumerate() {
        let page_id = 3 + 2 * i;
        let content_id = page_id + 1;
        offsets.push(out.len());
        out.extend_from_slice(
            format!(
                "{} 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents {} 0 R /Resources << /Font << /F1 {} 0 R >> >> >> endobj\n",
                page_id, content_id, font_id
            )
            .as_bytes(),
        );
        let stream = format!("BT /F1 12 Tf 72 700 Td ({}) Tj ET", text);
        offsets.push(out.len());
        out.extend_from_slice(
            format!(
                "{} 0 obj << /Length {} >> stream\n{}\nendstream endobj\n",
                content_id,
                stream.len(),
                stream
            )
            .as_bytes(),
        );
    }

    offsets.push(out.len());
    out.extend_from_slice(
        format!(
            "{} 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> endobj\n",
            font_id
        )
        .as_bytes(),
    );

    let xref_start = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", font_id + 1).as_bytes());
    out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
    for offset in &offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(
        format!("trailer << /Size {} /Root 1 0 R >>\nstartxref\n", font_id + 1).as_bytes(),
    );
    out.extend_from_slice(format!("{}\n", xref_start).as_bytes());
    out.extend_from_slice(b"%%EOF\n");
    out
}

// ============ CLI ============

#[test]
fn test_init_creates_store() {
    let (tmp, config_path) = setup_test_env("json", 0, false);

    let (stdout, stderr, success) = run_ptrail(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    let raw = fs::read_to_string(tmp.path().join("data").join("index.json")).unwrap();
    assert_eq!(raw.trim(), "[]");
}

#[test]
fn test_init_keeps_existing_records() {
    let (_tmp, config_path) = setup_test_env("json", 0, true);

    let (_, _, success) = run_ptrail(&config_path, &["init"]);
    assert!(success);
    let (stdout, _, _) = run_ptrail(&config_path, &["documents"]);
    assert!(stdout.contains("2 documents"), "{}", stdout);
}

#[test]
fn test_init_sqlite_idempotent() {
    let (tmp, config_path) = setup_test_env("sqlite", 0, false);

    let (_, stderr1, success1) = run_ptrail(&config_path, &["init"]);
    assert!(success1, "first init failed: {}", stderr1);
    let (_, stderr2, success2) = run_ptrail(&config_path, &["init"]);
    assert!(success2, "second init failed: {}", stderr2);
    assert!(tmp.path().join("data").join("pagetrail.sqlite").exists());
}

#[test]
fn test_missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, success) = run_ptrail(&tmp.path().join("nope.toml"), &["documents"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"), "{}", stderr);
}

#[test]
fn test_documents_lists_seeded_index() {
    let (_tmp, config_path) = setup_test_env("json", 0, true);

    let (stdout, stderr, success) = run_ptrail(&config_path, &["documents"]);
    assert!(success, "documents failed: {}", stderr);
    assert!(stdout.contains("ICD-10 handleiding.pdf"));
    assert!(stdout.contains("Diabetes.pdf"));
    assert!(stdout.contains("2 documents"));
}

#[test]
fn test_search_ranks_and_highlights() {
    let (_tmp, config_path) = setup_test_env("json", 0, true);

    let (stdout, stderr, success) = run_ptrail(&config_path, &["search", "diabetes type 2"]);
    assert!(success, "search failed: {}", stderr);
    let first = stdout.lines().next().unwrap_or_default();
    assert_eq!(first, "1. [3] Diabetes.pdf / page 1");
    assert!(stdout.contains("<mark>Diabetes</mark>"));
    assert!(stdout.contains("url: /pdfs/dm.pdf#page=1"));
}

#[test]
fn test_search_doc_filter_and_limit() {
    let (_tmp, config_path) = setup_test_env("json", 0, true);

    let (stdout, _, success) = run_ptrail(
        &config_path,
        &["search", "K35.80", "--doc", "icd", "--limit", "1"],
    );
    assert!(success);
    assert!(stdout.contains("id: icd-3a"));
    assert!(!stdout.contains("id: icd-3b"));
    assert!(!stdout.contains("2. ["));
}

#[test]
fn test_search_no_results() {
    let (_tmp, config_path) = setup_test_env("json", 0, true);

    let (stdout, _, success) = run_ptrail(&config_path, &["search", "zzzqqq"]);
    assert!(success);
    assert!(stdout.contains("No results."));

    let (stdout, _, success) = run_ptrail(&config_path, &["search", "   "]);
    assert!(success);
    assert!(stdout.contains("No results."));
}

#[test]
fn test_context_json() {
    let (_tmp, config_path) = setup_test_env("json", 0, true);

    let (stdout, stderr, success) = run_ptrail(
        &config_path,
        &["context", "icd", "--page", "3", "--query", "K35.80", "--json"],
    );
    assert!(success, "context failed: {}", stderr);

    let body: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(
        body["breadcrumb"],
        serde_json::json!(["8 Spijsvertering", "8.4 Codeervoorbeelden"])
    );
    assert_eq!(
        body["paragraph"],
        "Dit is een voorbeeld van <mark>K35.80</mark> appendicitis."
    );
    assert_eq!(body["page"], 3);
}

#[test]
fn test_context_text_output() {
    let (_tmp, config_path) = setup_test_env("json", 0, true);

    let (stdout, _, success) = run_ptrail(
        &config_path,
        &["context", "icd", "--page", "2", "--query", "spijsverteringsstelsel"],
    );
    assert!(success);
    assert!(stdout.contains("breadcrumb: 8 Spijsvertering > 8.1 Inleiding"));
    assert!(stdout.contains("<mark>spijsverteringsstelsel</mark>"));
}

#[test]
fn test_context_unknown_document_is_empty() {
    let (_tmp, config_path) = setup_test_env("json", 0, true);

    let (stdout, _, success) = run_ptrail(
        &config_path,
        &["context", "missing", "--page", "2", "--json"],
    );
    assert!(success);
    let body: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(body["breadcrumb"], serde_json::json!([]));
    assert_eq!(body["paragraph"], "");
}

#[test]
fn test_context_rejects_page_zero() {
    let (_tmp, config_path) = setup_test_env("json", 0, true);

    let (_, stderr, success) = run_ptrail(&config_path, &["context", "icd", "--page", "0"]);
    assert!(!success);
    assert!(stderr.contains("invalid page"), "{}", stderr);
}

#[test]
fn test_delete_document() {
    let (tmp, config_path) = setup_test_env("json", 0, true);

    let (stdout, stderr, success) = run_ptrail(&config_path, &["delete", "icd"]);
    assert!(success, "delete failed: {}", stderr);
    assert!(stdout.contains("chunks removed: 4"));
    assert!(!tmp.path().join("data/pdfs/icd.pdf").exists());
    assert!(tmp.path().join("data/pdfs/dm.pdf").exists());

    let (stdout, _, _) = run_ptrail(&config_path, &["documents"]);
    assert!(stdout.contains("1 documents"));
    assert!(!stdout.contains("ICD-10"));

    let (_, stderr, success) = run_ptrail(&config_path, &["delete", "icd"]);
    assert!(!success);
    assert!(stderr.contains("document not found"), "{}", stderr);
}

#[test]
fn test_add_pdf_then_search() {
    let (tmp, config_path) = setup_test_env("json", 0, false);
    let pdf = tmp.path().join("manual.pdf");
    fs::write(
        &pdf,
        pdf_with_pages(&["Hoofdstuk een", "Codeervoorbeeld appendicitis"]),
    )
    .unwrap();

    let (stdout, stderr, success) = run_ptrail(&config_path, &["add", pdf.to_str().unwrap()]);
    assert!(success, "add failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("added manual.pdf"));
    assert!(stdout.contains("pages indexed: 2"), "{}", stdout);

    let stored = fs::read_dir(tmp.path().join("data/pdfs")).unwrap().count();
    assert_eq!(stored, 1);

    let (stdout, _, success) = run_ptrail(&config_path, &["search", "appendicitis"]);
    assert!(success);
    assert!(stdout.contains("manual.pdf / page 2"), "{}", stdout);
}

#[test]
fn test_add_sqlite_backend() {
    let (tmp, config_path) = setup_test_env("sqlite", 0, false);
    let pdf = tmp.path().join("manual.pdf");
    fs::write(&pdf, pdf_with_pages(&["Appendicitis acuta"])).unwrap();

    let (_, stderr, success) = run_ptrail(
        &config_path,
        &["add", pdf.to_str().unwrap(), "--name", "Chirurgie.pdf"],
    );
    assert!(success, "add failed: {}", stderr);

    let (stdout, _, _) = run_ptrail(&config_path, &["documents"]);
    assert!(stdout.contains("Chirurgie.pdf"));

    let (stdout, _, _) = run_ptrail(&config_path, &["search", "appendicitis"]);
    assert!(stdout.contains("Chirurgie.pdf / page 1"), "{}", stdout);
}

#[test]
fn test_add_directory() {
    let (tmp, config_path) = setup_test_env("json", 0, false);
    let manuals = tmp.path().join("manuals");
    fs::create_dir_all(manuals.join("sub")).unwrap();
    fs::write(manuals.join("a.pdf"), pdf_with_pages(&["Eerste handleiding"])).unwrap();
    fs::write(manuals.join("sub/b.pdf"), pdf_with_pages(&["Tweede handleiding"])).unwrap();
    fs::write(manuals.join("readme.txt"), "not a pdf").unwrap();

    let (stdout, stderr, success) = run_ptrail(&config_path, &["add", manuals.to_str().unwrap()]);
    assert!(success, "add failed: {}", stderr);
    assert!(stdout.contains("2 documents"), "{}", stdout);
}

#[test]
fn test_add_rejects_non_pdf() {
    let (tmp, config_path) = setup_test_env("json", 0, false);
    let txt = tmp.path().join("notes.txt");
    fs::write(&txt, "hello").unwrap();

    let (_, stderr, success) = run_ptrail(&config_path, &["add", txt.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("Only PDF files accepted"), "{}", stderr);
}

#[test]
fn test_add_broken_pdf_leaves_no_file() {
    let (tmp, config_path) = setup_test_env("json", 0, false);
    let pdf = tmp.path().join("broken.pdf");
    fs::write(&pdf, "this is not a pdf").unwrap();

    let (_, _, success) = run_ptrail(&config_path, &["add", pdf.to_str().unwrap()]);
    assert!(!success);
    let stored = fs::read_dir(tmp.path().join("data/pdfs")).unwrap().count();
    assert_eq!(stored, 0);
}

// ============ HTTP server ============

fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn start_server(config_path: &Path) -> std::process::Child {
    Command::new(ptrail_binary())
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

struct Server {
    child: std::process::Child,
    port: u16,
    _tmp: TempDir,
}

impl Server {
    fn start(seed: bool) -> Self {
        let port = find_free_port();
        let (tmp, config_path) = setup_test_env("json", port, seed);
        let child = start_server(&config_path);
        wait_for_server(port);
        Server {
            child,
            port,
            _tmp: tmp,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.port, path)
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.child.kill().ok();
        self.child.wait().ok();
    }
}

#[test]
fn test_server_health() {
    let server = Server::start(true);

    let resp = reqwest::blocking::get(server.url("/health")).unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().unwrap();
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
    assert_eq!(body["indexed_chunks"], 5);
}

#[test]
fn test_server_search() {
    let server = Server::start(true);

    let resp = reqwest::blocking::get(server.url("/search?q=diabetes%20type%202")).unwrap();
    assert_eq!(resp.status(), 200);
    let hits: serde_json::Value = resp.json().unwrap();
    assert_eq!(hits[0]["doc_id"], "dm");
    assert_eq!(hits[0]["score"], 3);
    assert_eq!(hits[0]["pdf_url"], "/pdfs/dm.pdf#page=1");
    assert_eq!(hits[0]["chunk_id"], "dm-1");

    let resp = reqwest::blocking::get(server.url("/search?q=k35.80&doc_id=dm")).unwrap();
    let hits: serde_json::Value = resp.json().unwrap();
    assert_eq!(hits, serde_json::json!([]));
}

#[test]
fn test_server_search_empty_query_is_bad_request() {
    let server = Server::start(true);

    let resp = reqwest::blocking::get(server.url("/search?q=%20")).unwrap();
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().unwrap();
    assert_eq!(body["error"]["code"], "bad_request");
}

#[test]
fn test_server_search_invalid_limit_is_json_error() {
    let server = Server::start(true);

    let resp = reqwest::blocking::get(server.url("/search?q=diabetes&limit=abc")).unwrap();
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().unwrap();
    assert_eq!(body["error"]["code"], "bad_request");
    assert_eq!(body["error"]["message"], "invalid limit: abc");

    let resp = reqwest::blocking::get(server.url("/search?q=diabetes&limit=")).unwrap();
    assert_eq!(resp.status(), 200);

    let hits: serde_json::Value = reqwest::blocking::get(server.url("/search?q=K35.80&limit=1"))
        .unwrap()
        .json()
        .unwrap();
    assert_eq!(hits.as_array().map(Vec::len), Some(1));
}

#[test]
fn test_server_chapter() {
    let server = Server::start(true);

    let resp = reqwest::blocking::get(server.url("/chapter?doc_id=icd&page=3&q=K35.80")).unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().unwrap();
    assert_eq!(
        body["breadcrumb"],
        serde_json::json!(["8 Spijsvertering", "8.4 Codeervoorbeelden"])
    );
    assert_eq!(
        body["paragraph"],
        "Dit is een voorbeeld van <mark>K35.80</mark> appendicitis."
    );
}

#[test]
fn test_server_chapter_validation() {
    let server = Server::start(true);

    let resp = reqwest::blocking::get(server.url("/chapter?page=3")).unwrap();
    assert_eq!(resp.status(), 400);

    let resp = reqwest::blocking::get(server.url("/chapter?doc_id=icd&page=-1")).unwrap();
    assert_eq!(resp.status(), 400);

    let resp = reqwest::blocking::get(server.url("/chapter?doc_id=icd&page=abc")).unwrap();
    assert_eq!(resp.status(), 400);
}

#[test]
fn test_server_documents_and_delete() {
    let server = Server::start(true);

    let docs: serde_json::Value = reqwest::blocking::get(server.url("/documents"))
        .unwrap()
        .json()
        .unwrap();
    assert_eq!(docs[0]["doc_id"], "icd");
    assert_eq!(docs[0]["chunk_count"], 4);
    assert_eq!(docs[0]["page_count"], 3);
    assert_eq!(docs[1]["doc_id"], "dm");

    let client = reqwest::blocking::Client::new();
    let resp = client.delete(server.url("/documents/icd")).send().unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().unwrap();
    assert_eq!(body["deleted_chunks"], 4);
    assert_eq!(body["doc_id"], "icd");

    let resp = client.delete(server.url("/documents/icd")).send().unwrap();
    assert_eq!(resp.status(), 404);
    let body: serde_json::Value = resp.json().unwrap();
    assert_eq!(body["error"]["code"], "not_found");
}

#[test]
fn test_server_upload_and_serve_pdf() {
    let server = Server::start(false);
    let client = reqwest::blocking::Client::new();

    let resp = client
        .post(server.url("/upload?name=notes.txt"))
        .body("hello")
        .send()
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = client
        .post(server.url("/upload?name=Chirurgie.pdf"))
        .body(pdf_with_pages(&["Appendicitis acuta", "Cholecystitis"]))
        .send()
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().unwrap();
    assert_eq!(body["doc_name"], "Chirurgie.pdf");
    assert_eq!(body["chunks_indexed"], 2);
    let doc_id = body["doc_id"].as_str().unwrap().to_string();

    let hits: serde_json::Value = reqwest::blocking::get(server.url("/search?q=cholecystitis"))
        .unwrap()
        .json()
        .unwrap();
    assert_eq!(hits[0]["page"], 2);
    assert_eq!(hits[0]["doc_id"], doc_id.as_str());

    let resp = reqwest::blocking::get(server.url(&format!("/pdfs/{}.pdf", doc_id))).unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.bytes().unwrap().starts_with(b"%PDF"));
}

#[test]
fn test_server_upload_broken_pdf() {
    let server = Server::start(false);
    let client = reqwest::blocking::Client::new();

    let resp = client
        .post(server.url("/upload?name=broken.pdf"))
        .body("definitely not a pdf")
        .send()
        .unwrap();
    assert_eq!(resp.status(), 500);
    let body: serde_json::Value = resp.json().unwrap();
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .starts_with("Failed to parse PDF"));
}
