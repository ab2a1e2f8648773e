//! In-process mock server.
//!
//! The server keeps its store across requests, so a test can create records,
//! exercise code that issues HTTP calls, and then inspect what changed.
//!
//! # Example
//!
//! ```
//! use jsonapi_mock::{Attrs, Fixtures, HttpClient};
//!
//! # async fn example() -> jsonapi_mock::Result<()> {
//! let server = Fixtures::server()?;
//! server.create("document", &["rfc"], Attrs::new()).await?;
//!
//! let client = HttpClient::new()?.intercept(server.clone());
//! let response = client.get("https://api.test/documents/1").await?;
//! assert_eq!(response.status(), 200);
//! # Ok(())
//! # }
//! ```

mod fixtures;
mod server;
mod state;

pub use fixtures::Fixtures;
pub use server::{MockServer, SeedFn, ServerBuilder};
pub use state::{HandledRequest, ServerState};
