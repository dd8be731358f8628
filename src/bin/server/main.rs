#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    missing_docs,
    rustdoc::broken_intra_doc_links,
    rustdoc::missing_crate_level_docs
)]

//! REST API for the email dispatch service

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use mailroom::{
    domain::{email::EmailServiceImpl, settings::{EnvSettings, SettingsProvider}},
    infrastructure::{
        email::{brevo, BrevoTransport, SmtpTransport},
        http::{
            state::{AppConfig, AppState},
            HttpServer, HttpServerConfig,
        },
        store::{RedisAuditLog, RedisConfig},
    },
};

/// Command-line arguments / environment variables
#[derive(Debug, Parser)]
pub struct Args {
    /// The HTTP server configuration
    #[clap(flatten)]
    pub server: HttpServerConfig,

    /// Environment-default email settings
    #[clap(flatten)]
    pub settings: EnvSettings,

    /// The key-value store connection details
    #[clap(flatten)]
    pub store: RedisConfig,

    /// Endpoint base for the Brevo API
    #[arg(long, env = "BREVO_BASE_URL", default_value = brevo::DEFAULT_BASE_URL)]
    pub brevo_base_url: String,

    /// Bearer token authorizing the log-cleanup endpoint
    #[arg(long, env = "CRON_SECRET")]
    pub cron_secret: Option<String>,
}

#[mutants::skip]
#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; the environment still applies.
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("No .env file loaded: {}", e);
    }

    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let audit = Arc::new(RedisAuditLog::open(&args.store)?);

    let email = EmailServiceImpl::new(
        SmtpTransport::new(),
        BrevoTransport::new(args.brevo_base_url.as_str())?,
        Arc::clone(&audit),
    );

    let state = AppState::new(
        AppConfig {
            cron_secret: args.cron_secret,
        },
        SettingsProvider::new(args.settings.into()),
        email,
        audit,
    );

    HttpServer::new(state, args.server).await?.run().await
}
