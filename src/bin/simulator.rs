use jedibus::store::{builtin_records, JsonFileStore, DEFAULT_STORE_PATH};
use jedibus::ReportService;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

const TCP_PORT: u16 = 9103;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    println!("⚡ JEDI Generator Bus Simulator");
    println!("==============================");

    // Seed the error-code database on first run
    let store = JsonFileStore::new(DEFAULT_STORE_PATH);
    match store.seed_if_missing(&builtin_records()) {
        Ok(true) => info!(
            "💾 Seeded error-code database at {}",
            store.path().display()
        ),
        Ok(false) => info!(
            "💾 Using error-code database at {}",
            store.path().display()
        ),
        Err(e) => warn!("Could not seed error-code database: {}", e),
    }

    let service = Arc::new(Mutex::new(ReportService::new(store)));

    start_tcp_server(service).await?;

    println!("⚡ JEDI Generator Bus Simulator stopped");
    Ok(())
}

async fn start_tcp_server(
    service: Arc<Mutex<ReportService<JsonFileStore>>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(format!("127.0.0.1:{}", TCP_PORT)).await?;
    info!("🌐 TCP server listening on port {}", TCP_PORT);

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                info!("🔗 New client connected: {}", addr);
                let client_service = Arc::clone(&service);

                tokio::spawn(async move {
                    if let Err(e) = handle_client(stream, client_service).await {
                        warn!("Client {} error: {}", addr, e);
                    }
                    info!("🔌 Client {} disconnected", addr);
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}

async fn handle_client(
    stream: TcpStream,
    service: Arc<Mutex<ReportService<JsonFileStore>>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (reader, mut writer) = stream.into_split();
    let mut buf_reader = BufReader::new(reader);

    let mut line = String::new();
    loop {
        line.clear();
        match buf_reader.read_line(&mut line).await {
            Ok(0) => break, // Client disconnected
            Ok(_) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                info!("📨 Received request: {}", trimmed);
                let reply = {
                    let mut service_guard = service.lock().await;
                    service_guard.handle_line(trimmed)
                };

                let reply_json = serde_json::to_string(&reply)?;
                writer.write_all(reply_json.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                info!("📤 Sent reply: {}", reply_json);
            }
            Err(e) => {
                error!("Error reading from client: {}", e);
                break;
            }
        }
    }

    Ok(())
}
