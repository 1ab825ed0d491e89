//! Tenant OAuth Client Management CLI Tool
//!
//! A command-line interface for managing the OAuth clients of one tenant
//! through its RFC 7591 dynamic client registration endpoints.
//!
//! ## Usage Examples
//!
//! ### Register a new client
//! ```bash
//! tenant-oauth-client-management --base-url https://alice.example.net register \
//!   --name "My Desktop App" \
//!   --software-id "com.example.desktop" \
//!   --redirect-uri "http://localhost:3000/callback"
//! ```
//!
//! ### Get client information
//! ```bash
//! tenant-oauth-client-management --base-url https://alice.example.net get \
//!   --client-id "client_id_here" \
//!   --registration-token "registration_access_token_here"
//! ```
//!
//! ### Update a client
//! ```bash
//! tenant-oauth-client-management --base-url https://alice.example.net update \
//!   --client-id "client_id_here" \
//!   --registration-token "registration_access_token_here" \
//!   --software-version "2.0.0" \
//!   --rotate-secret
//! ```
//!
//! ### Delete a client
//! ```bash
//! tenant-oauth-client-management --base-url https://alice.example.net delete \
//!   --client-id "client_id_here" \
//!   --registration-token "registration_access_token_here" --yes
//! ```
//!
//! ## Environment Variables
//!
//! - `TENANT_OAUTH_BASE_URL`: Base URL of the tenant (alternative to --base-url)
//! - `TENANT_OAUTH_HOST`: `Host` header override (alternative to --host)
//! - `TENANT_OAUTH_CLIENT_ID`: OAuth client ID (alternative to --client-id)
//! - `TENANT_OAUTH_REGISTRATION_TOKEN`: Registration access token (alternative to --registration-token)
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error (network, parsing, etc.)
//! - 2: Client registration/management error
//! - 3: Authentication error

use clap::{Args, Parser, Subcommand, ValueEnum};
use reqwest::{RequestBuilder, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::process;
use tenant_oauth::oauth::types::{Client, ClientMetadata};

/// Main CLI application structure
#[derive(Parser)]
#[command(
    name = "tenant-oauth-client-management",
    about = "Tenant OAuth Client Management CLI Tool",
    long_about = "A command-line interface for managing the OAuth clients of a tenant through \
                  RFC 7591 dynamic client registration.",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    /// Base URL of the tenant
    #[arg(long, env = "TENANT_OAUTH_BASE_URL", default_value = "http://localhost:8080")]
    base_url: String,

    /// Host header to send, when the base URL does not name the tenant
    #[arg(long, env = "TENANT_OAUTH_HOST")]
    host: Option<String>,

    /// Enable verbose output
    #[arg(short, long, help = "Enable verbose output for debugging")]
    verbose: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "json", help = "Output format for responses")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

/// Output format options
#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    /// JSON formatted output
    Json,
    /// Pretty-printed JSON output
    JsonPretty,
    /// Human-readable table format
    Table,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Register a new OAuth client
    Register(RegisterArgs),
    /// Get information about an existing client
    Get(ClientArgs),
    /// Update an existing client
    Update(UpdateArgs),
    /// Delete an existing client
    Delete(DeleteArgs),
}

/// Client metadata options shared by register and update
#[derive(Args)]
struct MetadataArgs {
    /// OAuth redirect URIs (can be specified multiple times)
    #[arg(long = "redirect-uri")]
    redirect_uris: Vec<String>,

    /// Kind of client, e.g. desktop, mobile, browser
    #[arg(long)]
    kind: Option<String>,

    /// Homepage of the client
    #[arg(long)]
    client_uri: Option<String>,

    #[arg(long)]
    logo_uri: Option<String>,

    #[arg(long)]
    policy_uri: Option<String>,

    #[arg(long)]
    software_version: Option<String>,

    /// Push notification platform (firebase, apns)
    #[arg(long)]
    notification_platform: Option<String>,

    #[arg(long)]
    notification_device_token: Option<String>,
}

impl MetadataArgs {
    fn apply(&self, metadata: &mut ClientMetadata) {
        if !self.redirect_uris.is_empty() {
            metadata.redirect_uris = self.redirect_uris.clone();
        }
        let fields = [
            (&self.kind, &mut metadata.client_kind),
            (&self.client_uri, &mut metadata.client_uri),
            (&self.logo_uri, &mut metadata.logo_uri),
            (&self.policy_uri, &mut metadata.policy_uri),
            (&self.software_version, &mut metadata.software_version),
            (
                &self.notification_platform,
                &mut metadata.notification_platform,
            ),
            (
                &self.notification_device_token,
                &mut metadata.notification_device_token,
            ),
        ];
        for (value, field) in fields {
            if let Some(value) = value {
                *field = value.clone();
            }
        }
    }
}

/// Arguments for client registration
#[derive(Args)]
struct RegisterArgs {
    /// Human-readable name for the client
    #[arg(long)]
    name: String,

    /// Identifier of the application across installations
    #[arg(long)]
    software_id: String,

    #[command(flatten)]
    metadata: MetadataArgs,
}

/// Arguments identifying a registered client
#[derive(Args)]
struct ClientArgs {
    /// Client ID
    #[arg(long, env = "TENANT_OAUTH_CLIENT_ID")]
    client_id: String,

    /// Registration access token
    #[arg(long, env = "TENANT_OAUTH_REGISTRATION_TOKEN", hide_env_values = true)]
    registration_token: String,
}

/// Arguments for client updates
#[derive(Args)]
struct UpdateArgs {
    #[command(flatten)]
    client: ClientArgs,

    /// Identifier of the application across installations
    #[arg(long)]
    software_id: Option<String>,

    /// Ask the server for a new client secret
    #[arg(long)]
    rotate_secret: bool,

    #[command(flatten)]
    metadata: MetadataArgs,
}

/// Arguments for client deletion
#[derive(Args)]
struct DeleteArgs {
    #[command(flatten)]
    client: ClientArgs,

    /// Skip confirmation prompt
    #[arg(long, help = "Skip the confirmation prompt")]
    yes: bool,
}

/// Application errors
#[derive(Debug)]
enum AppError {
    /// Network or HTTP client errors
    Network(reqwest::Error),
    /// JSON parsing or serialization errors
    Json(serde_json::Error),
    /// Client registration or management errors
    ClientManagement(String),
    /// Authentication errors
    Authentication(String),
    /// General application errors
    General(String),
}

impl AppError {
    fn exit_code(&self) -> i32 {
        match self {
            AppError::Network(_) | AppError::Json(_) | AppError::General(_) => 1,
            AppError::ClientManagement(_) => 2,
            AppError::Authentication(_) => 3,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Network(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Json(err)
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Network(err) => write!(f, "Network error: {}", err),
            AppError::Json(err) => write!(f, "JSON error: {}", err),
            AppError::ClientManagement(msg) => write!(f, "Client management error: {}", msg),
            AppError::Authentication(msg) => write!(f, "Authentication error: {}", msg),
            AppError::General(msg) => write!(f, "Error: {}", msg),
        }
    }
}

/// Main application entry point
#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Register(args) => register_client(&cli, args).await,
        Commands::Get(args) => get_client(&cli, args).await,
        Commands::Update(args) => update_client(&cli, args).await,
        Commands::Delete(args) => delete_client(&cli, args).await,
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        process::exit(err.exit_code());
    }
}

/// Apply the Host override, if any
fn with_host(cli: &Cli, request: RequestBuilder) -> RequestBuilder {
    match &cli.host {
        Some(host) => request.header(reqwest::header::HOST, host),
        None => request,
    }
}

fn client_url(cli: &Cli, client_id: &str) -> String {
    format!(
        "{}/auth/register/{}",
        cli.base_url.trim_end_matches('/'),
        client_id
    )
}

/// Turn an error response into an error with the matching exit code
async fn error_from_response(
    action: &str,
    client_id: &str,
    response: reqwest::Response,
) -> AppError {
    match response.status() {
        StatusCode::UNAUTHORIZED => {
            AppError::Authentication("Invalid registration token".to_string())
        }
        StatusCode::NOT_FOUND => {
            AppError::ClientManagement(format!("Client '{}' not found", client_id))
        }
        status => {
            let error_text = response.text().await.unwrap_or_default();
            AppError::ClientManagement(format!(
                "Failed to {} client with status {}: {}",
                action, status, error_text
            ))
        }
    }
}

/// Register a new OAuth client
async fn register_client(cli: &Cli, args: &RegisterArgs) -> Result<(), AppError> {
    let mut request = Client::default();
    request.metadata.client_name = args.name.clone();
    request.metadata.software_id = args.software_id.clone();
    args.metadata.apply(&mut request.metadata);

    if cli.verbose {
        eprintln!(
            "Registration request: {}",
            serde_json::to_string_pretty(&request)?
        );
    }

    let url = format!("{}/auth/register", cli.base_url.trim_end_matches('/'));
    let response = with_host(cli, reqwest::Client::new().post(&url))
        .json(&request)
        .send()
        .await?;

    if cli.verbose {
        eprintln!("Response status: {}", response.status());
    }

    match response.status() {
        StatusCode::CREATED | StatusCode::OK => {
            let registered: Client = response.json().await?;
            output_response(&cli.format, &registered)
        }
        status => {
            let error_text = response.text().await?;
            Err(AppError::ClientManagement(format!(
                "Registration failed with status {}: {}",
                status, error_text
            )))
        }
    }
}

async fn fetch_client(cli: &Cli, args: &ClientArgs) -> Result<Client, AppError> {
    if cli.verbose {
        eprintln!("Getting client information for: {}", args.client_id);
    }

    let response = with_host(cli, reqwest::Client::new().get(client_url(cli, &args.client_id)))
        .bearer_auth(&args.registration_token)
        .send()
        .await?;

    if cli.verbose {
        eprintln!("Response status: {}", response.status());
    }

    if response.status() == StatusCode::OK {
        Ok(response.json().await?)
    } else {
        Err(error_from_response("get", &args.client_id, response).await)
    }
}

/// Get information about an existing client
async fn get_client(cli: &Cli, args: &ClientArgs) -> Result<(), AppError> {
    let client = fetch_client(cli, args).await?;
    output_response(&cli.format, &client)
}

/// Update an existing client
///
/// Fetches the current registration first, since an update replaces the
/// whole client metadata.
async fn update_client(cli: &Cli, args: &UpdateArgs) -> Result<(), AppError> {
    let mut request = fetch_client(cli, &args.client).await?;

    if let Some(software_id) = &args.software_id {
        request.metadata.software_id = software_id.clone();
    }
    args.metadata.apply(&mut request.metadata);

    // Presenting the current secret asks for a new one
    if !args.rotate_secret {
        request.client_secret = None;
    } else if request.client_secret.is_none() {
        return Err(AppError::General(
            "The server did not return the current client secret".to_string(),
        ));
    }

    if cli.verbose {
        eprintln!("Updating client: {}", args.client.client_id);
    }

    let response = with_host(
        cli,
        reqwest::Client::new().put(client_url(cli, &args.client.client_id)),
    )
    .bearer_auth(&args.client.registration_token)
    .json(&request)
    .send()
    .await?;

    if cli.verbose {
        eprintln!("Response status: {}", response.status());
    }

    if response.status() == StatusCode::OK {
        let updated: Client = response.json().await?;
        output_response(&cli.format, &updated)
    } else {
        Err(error_from_response("update", &args.client.client_id, response).await)
    }
}

/// Delete an existing client
async fn delete_client(cli: &Cli, args: &DeleteArgs) -> Result<(), AppError> {
    let client_id = &args.client.client_id;
    if !args.yes {
        println!("Are you sure you want to delete client '{}'? (y/N)", client_id);
        let mut input = String::new();
        std::io::stdin()
            .read_line(&mut input)
            .map_err(|e| AppError::General(format!("Failed to read confirmation: {}", e)))?;

        let input = input.trim().to_lowercase();
        if input != "y" && input != "yes" {
            println!("Deletion cancelled.");
            return Ok(());
        }
    }

    if cli.verbose {
        eprintln!("Deleting client: {}", client_id);
    }

    let response = with_host(cli, reqwest::Client::new().delete(client_url(cli, client_id)))
        .bearer_auth(&args.client.registration_token)
        .send()
        .await?;

    if cli.verbose {
        eprintln!("Response status: {}", response.status());
    }

    if response.status() == StatusCode::NO_CONTENT {
        println!("Client '{}' deleted successfully.", client_id);
        Ok(())
    } else {
        Err(error_from_response("delete", client_id, response).await)
    }
}

/// Output response data in the requested format
fn output_response<T: Serialize>(format: &OutputFormat, data: &T) -> Result<(), AppError> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(data)?);
        }
        OutputFormat::JsonPretty => {
            println!("{}", serde_json::to_string_pretty(data)?);
        }
        OutputFormat::Table => {
            let json_value: Value = serde_json::to_value(data)?;
            print_table(&json_value, 0);
        }
    }
    Ok(())
}

/// Print data in table format (recursive for nested objects)
fn print_table(value: &Value, indent: usize) {
    let prefix = "  ".repeat(indent);

    match value {
        Value::Object(map) => {
            for (key, val) in map {
                match val {
                    Value::Object(_) => {
                        println!("{}{}:", prefix, key);
                        print_table(val, indent + 1);
                    }
                    Value::Array(arr) => {
                        println!("{}{}:", prefix, key);
                        for item in arr {
                            print_table(item, indent + 1);
                        }
                    }
                    _ => {
                        println!("{}{}: {}", prefix, key, format_value(val));
                    }
                }
            }
        }
        _ => {
            println!("{}- {}", prefix, format_value(value));
        }
    }
}

/// Format a JSON value for display
fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_else(|_| "invalid".to_string()),
    }
}
