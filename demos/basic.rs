//! Basic example: a mock server answering an intercepting client.
//!
//! Run with:
//! ```
//! RUST_LOG=jsonapi_mock=debug cargo run --example basic
//! ```

use jsonapi_mock::{Attrs, Fixtures, HttpClient, PrettyPrint, RequestInit, ServerConfig};
use reqwest::Method;
use serde_json::json;

#[tokio::main]
async fn main() -> jsonapi_mock::Result<()> {
    // Initialize tracing for debugging (optional)
    tracing_subscriber::fmt::init();

    let server = Fixtures::builder()
        .config(ServerConfig::from_env()?.with_logging(true))
        .build()?;
    println!("Intercepting: {}", server.base_url());

    let folder = server.create("folder", &[], Attrs::new().with("name", "Notes")).await?;
    server
        .create_related(&folder.key(), "documents", Attrs::new().with("title", "Hello World"))
        .await?;
    server.create_list("rocky", 6, &[], Attrs::new()).await?;

    let client = HttpClient::new()?.intercept(server.clone());
    let base = server.base_url();

    println!("\n--- GET /folders?include=documents ---");
    let response = client.get(&format!("{base}/folders?include=documents")).await?;
    println!("{}", response.pretty_print());

    println!("\n--- POST /pizzas ---");
    let init = RequestInit::new(Method::POST).json(&json!({ "kind": "quattro stagioni" }))?;
    let response = client.fetch(&format!("{base}/pizzas"), init).await?;
    println!("{}", response.pretty_print());

    println!("\n--- GET /rockies/6 ---");
    let response = client.get(&format!("{base}/rockies/6")).await?;
    println!("{}", response.pretty_print());

    println!("\n--- Handled requests ---");
    for handled in server.handled_requests().await {
        println!(
            "  {} {} {} -> {}",
            handled.handled_at.format("%H:%M:%S%.3f"),
            handled.method,
            handled.path,
            handled.status
        );
    }

    Ok(())
}
