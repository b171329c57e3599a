// Shared primitives for one-time server bootstrapping across integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use std::{
    collections::HashMap,
    path::Path,
    // `Arc` shares data between threads; `OnceLock` writes a value only once.
    sync::{Arc, OnceLock},
    time::Duration,
};
use territory_server::Settings;
use territory_server::domain::{
    MarkerSource, MarkerType, RECORD_LEN, SourceError, encode_record, pack_server_id,
};

pub const TRIBE_ID: u64 = 1_000_060_000;
pub const PLAYER_ID: u64 = 42;

// Global base URL used by all tests after the server publishes its bound address.
static SERVER_URL: OnceLock<String> = OnceLock::new();
// Output and marker directories live for the whole test binary.
static WORKSPACE: OnceLock<tempfile::TempDir> = OnceLock::new();
// One-time guard that ensures the server bootstrap path runs only once.
static SERVER_READY: OnceLock<()> = OnceLock::new();

pub fn workspace() -> &'static Path {
    WORKSPACE
        .get_or_init(|| tempfile::tempdir().expect("test workspace"))
        .path()
}

// Markers seeded before the server starts: one tribe land marker and one player water marker
// in cell (0, 0), one tribe water marker in cell (1, 0).
fn seed_markers(data_dir: &Path) {
    std::fs::create_dir_all(data_dir).expect("create data dir");
    let first_cell = [
        encode_record(TRIBE_ID, 16_384, 16_384, MarkerType::Land),
        encode_record(PLAYER_ID, 32_768, 32_768, MarkerType::Water),
    ]
    .concat();
    let second_cell = encode_record(TRIBE_ID, 0, 0, MarkerType::Water);
    std::fs::write(
        data_dir.join(format!("territorymapdata_{}.bin", pack_server_id(0, 0))),
        first_cell,
    )
    .expect("seed cell 0,0");
    std::fs::write(
        data_dir.join(format!("territorymapdata_{}.bin", pack_server_id(1, 0))),
        second_cell,
    )
    .expect("seed cell 1,0");
}

fn test_settings(root: &Path) -> Settings {
    let mut settings = Settings::default();
    settings.server.www_dir = root.join("www");
    settings.source.data_dir = root.join("data");
    settings.generation.enable_tiles = true;
    settings.generation.enable_world_map = true;
    settings.generation.fetch_rate_seconds = 1;
    settings.grid.servers_x = 2;
    settings.grid.servers_y = 1;
    settings.render.tile_size = 32;
    settings.render.max_zoom = 2;
    settings.render.game_size = 64;
    settings
}

// Ensure the test server is running and return the shared base URL.
pub fn ensure_server() -> &'static str {
    // Run initialization exactly once even if multiple tests call this function.
    SERVER_READY.get_or_init(|| {
        let root = workspace();
        seed_markers(&root.join("data"));
        let settings = Arc::new(test_settings(root));

        // Local one-time slot where the server thread publishes its selected URL.
        let published_url = Arc::new(OnceLock::<String>::new());
        let published_url_thread = Arc::clone(&published_url);
        // Spawn an OS thread so the server outlives individual `#[tokio::test]` runtimes.
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("test runtime");
            runtime.block_on(async move {
                // Bind to an ephemeral port to avoid collisions with local services.
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind ephemeral test port");
                let addr = listener.local_addr().expect("get local addr");
                let _ = published_url_thread.set(format!("http://{}", addr));
                territory_server::run(listener, settings)
                    .await
                    .expect("server failed");
            });
        });
        wait_for_server_url_and_readiness(published_url);
    });

    SERVER_URL
        .get()
        .expect("server url should be initialized")
        .as_str()
}

// Wait for URL publication and then wait for the server socket to accept TCP connections.
fn wait_for_server_url_and_readiness(published_url: Arc<OnceLock<String>>) {
    let base_url = loop {
        if let Some(url) = published_url.get() {
            break url.clone();
        }
        std::thread::sleep(Duration::from_millis(10));
    };

    let _ = SERVER_URL.set(base_url.clone());

    // Strip the scheme so we can use host:port for raw TCP readiness checks.
    let addr = base_url
        .strip_prefix("http://")
        .expect("base url should use http://");

    for _ in 0..100 {
        if std::net::TcpStream::connect(addr).is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(20));
    }

    panic!("server did not become ready in time");
}

// Poll a URL until it answers 200 or the deadline passes.
pub async fn wait_for_ok(url: &str, deadline: Duration) -> reqwest::Response {
    let client = reqwest::Client::new();
    let started = std::time::Instant::now();
    loop {
        if let Ok(response) = client.get(url).send().await {
            if response.status().is_success() {
                return response;
            }
        }
        assert!(started.elapsed() < deadline, "{url} never became available");
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

// In-memory marker store keyed by cell; the test mutates it between cycles.
#[derive(Default)]
pub struct MemorySource {
    cells: std::sync::Mutex<HashMap<(u32, u32), Vec<[u8; RECORD_LEN]>>>,
}

impl MemorySource {
    pub fn put(&self, cell_x: u32, cell_y: u32, record: [u8; RECORD_LEN]) {
        self.cells
            .lock()
            .expect("cells mutex poisoned")
            .entry((cell_x, cell_y))
            .or_default()
            .push(record);
    }
}

#[async_trait]
impl MarkerSource for MemorySource {
    async fn fetch_cell(&self, cell_x: u32, cell_y: u32) -> Result<Vec<Vec<u8>>, SourceError> {
        let cells = self.cells.lock().expect("cells mutex poisoned");
        Ok(cells
            .get(&(cell_x, cell_y))
            .map(|records| records.iter().map(|r| r.to_vec()).collect())
            .unwrap_or_default())
    }
}
