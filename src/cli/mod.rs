//! CLI argument parsing types.
//!
//! This module provides the command-line interface structure for the
//! `jsonapi-mock` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use reqwest::Method;

/// Inspect and query a mock JSON:API server.
#[derive(Parser, Debug)]
#[command(name = "jsonapi-mock", about = "In-process JSON:API mock server", version)]
pub struct Cli {
    /// Output raw JSON instead of a human-readable summary.
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Scenario file describing models, routes and records. The built-in
    /// demo scenario is used when omitted.
    #[arg(long, global = true, env = "MOCK_API_SCENARIO")]
    pub scenario: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List registered routes.
    Routes,

    /// Dispatch one request against the seeded store.
    Request {
        /// HTTP method.
        #[arg(ignore_case = true)]
        method: HttpVerb,

        /// Path relative to the base URL, query string allowed.
        path: String,

        /// Request body.
        #[arg(long)]
        body: Option<String>,

        /// Content type of the body.
        #[arg(long, default_value = "application/json")]
        content_type: String,
    },

    /// Print every record in the store.
    Dump,
}

/// HTTP methods the router understands.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl From<HttpVerb> for Method {
    fn from(verb: HttpVerb) -> Self {
        match verb {
            HttpVerb::Get => Method::GET,
            HttpVerb::Post => Method::POST,
            HttpVerb::Put => Method::PUT,
            HttpVerb::Patch => Method::PATCH,
            HttpVerb::Delete => Method::DELETE,
        }
    }
}
