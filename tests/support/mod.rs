// One arena server per test binary, started lazily on an ephemeral port.
use std::{
    sync::{OnceLock, mpsc},
    time::Duration,
};

static SERVER_URL: OnceLock<String> = OnceLock::new();

// Broadcast several times a second so tests do not wait a full second per update.
pub const TEST_BROADCAST_EVERY: u64 = 36;

// Start the server if needed and return its base URL (`http://host:port`).
pub fn ensure_server() -> &'static str {
    SERVER_URL.get_or_init(|| {
        let (addr_tx, addr_rx) = mpsc::channel();

        // The server gets its own OS thread and runtime so it outlives each
        // `#[tokio::test]` runtime.
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("test runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind ephemeral test port");
                let addr = listener.local_addr().expect("get local addr");
                addr_tx.send(addr).expect("publish test server address");

                let mut settings = arena_server::frameworks::server::arena_settings();
                settings.broadcast_every = TEST_BROADCAST_EVERY;
                settings.max_players = 64;
                arena_server::run_with_settings(listener, settings)
                    .await
                    .expect("server failed");
            });
        });

        let addr = addr_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("server thread should publish its address");
        wait_until_accepting(addr);
        format!("http://{addr}")
    })
}

fn wait_until_accepting(addr: std::net::SocketAddr) {
    for _ in 0..100 {
        if std::net::TcpStream::connect(addr).is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    panic!("server did not become ready in time");
}
