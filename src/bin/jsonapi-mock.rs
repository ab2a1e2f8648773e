//! Mock JSON:API server CLI.
//!
//! Builds a server from a scenario file (or the demo scenario) and lets you
//! look at its routes, send it a request, or dump its store.

use std::process::ExitCode;

use clap::Parser;
use jsonapi_mock::cli::{Cli, Command};
use jsonapi_mock::{Fixtures, MockServer, PrettyPrint, Request, RouteBinding, Scenario, ServerConfig};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use tabled::{Table, Tabled};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let server = match build_server(&cli).await {
        Ok(server) => server,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Hint: Check --scenario/MOCK_API_SCENARIO and MOCK_API_URL");
            return ExitCode::FAILURE;
        }
    };

    match run(&server, cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn build_server(cli: &Cli) -> jsonapi_mock::Result<MockServer> {
    match &cli.scenario {
        Some(path) => Scenario::load(path)?.into_server().await,
        None => Fixtures::seeded_server_with(ServerConfig::from_env()?),
    }
}

async fn run(server: &MockServer, cli: Cli) -> jsonapi_mock::Result<()> {
    match cli.command {
        Command::Routes => handle_routes(server, cli.json),
        Command::Request {
            method,
            path,
            body,
            content_type,
        } => {
            let mut headers = HeaderMap::new();
            let value = HeaderValue::from_str(&content_type).map_err(|e| {
                jsonapi_mock::MockError::MalformedBody(format!("content type '{content_type}': {e}"))
            })?;
            headers.insert(CONTENT_TYPE, value);

            let mut request = Request::new(method.into(), &path).with_headers(headers);
            request.body = body;
            handle_request(server, request, cli.json).await
        }
        Command::Dump => {
            println!("{}", serde_json::to_string_pretty(&server.dump().await)?);
            Ok(())
        }
    }
}

fn handle_routes(server: &MockServer, json: bool) -> jsonapi_mock::Result<()> {
    let routes = server.router().routes();
    if json {
        let rows: Vec<_> = routes
            .iter()
            .map(|r| {
                serde_json::json!({
                    "method": r.method.as_str(),
                    "path": r.pattern.as_str(),
                    "handler": r.handler.to_string(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        let rows: Vec<RouteRow> = routes.iter().map(RouteRow::from).collect();
        println!("{}", Table::new(rows));
        println!("\nBase URL: {}", server.base_url());
    }
    Ok(())
}

async fn handle_request(server: &MockServer, request: Request, json: bool) -> jsonapi_mock::Result<()> {
    let response = server.handle(request).await;
    if json {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            eprintln!("HTTP {status}");
        }
        println!("{body}");
    } else {
        println!("{}", response.pretty_print());
    }
    Ok(())
}

// Table row types for non-JSON output

#[derive(Tabled)]
struct RouteRow {
    verb: String,
    path: String,
    handler: String,
}

impl From<&RouteBinding> for RouteRow {
    fn from(route: &RouteBinding) -> Self {
        Self {
            verb: route.method.to_string(),
            path: route.pattern.to_string(),
            handler: route.handler.to_string(),
        }
    }
}
