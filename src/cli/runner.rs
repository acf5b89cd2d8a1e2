//! CLI runner - executes commands

use crate::api::{Endpoint, MpsClient};
use crate::auth::LoginOutcome;
use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::output::export_records;
use crate::pagination::{CancelFlag, FilterSet, Page};
use crate::types::Record;
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Result of a command, rendered according to `--format`
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    /// A single JSON document
    Value(Value),
    /// A list of records
    Records(Vec<Record>),
}

impl CommandOutput {
    /// Render for stdout
    pub fn render(&self, format: OutputFormat) -> Result<String> {
        let text = match (self, format) {
            (CommandOutput::Records(records), OutputFormat::Jsonl) => records
                .iter()
                .map(serde_json::to_string)
                .collect::<std::result::Result<Vec<_>, _>>()?
                .join("\n"),
            (CommandOutput::Records(records), OutputFormat::Json) => {
                serde_json::to_string(records)?
            }
            (CommandOutput::Records(records), OutputFormat::Pretty) => {
                serde_json::to_string_pretty(records)?
            }
            (CommandOutput::Value(value), OutputFormat::Pretty) => {
                serde_json::to_string_pretty(value)?
            }
            (CommandOutput::Value(value), OutputFormat::Json | OutputFormat::Jsonl) => {
                serde_json::to_string(value)?
            }
        };
        Ok(text)
    }
}

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// CLI runner
pub struct Runner {
    cli: Cli,
    env: EnvLookup,
}

impl Runner {
    /// Create a new runner reading the process environment
    pub fn new(cli: Cli) -> Self {
        Self::with_env(cli, |name| std::env::var(name).ok())
    }

    /// Create a runner with a custom environment lookup
    pub fn with_env<F>(cli: Cli, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            cli,
            env: Box::new(lookup),
        }
    }

    /// Run the CLI command and print its output
    pub async fn run(&self) -> Result<()> {
        let output = self.execute().await?;
        let text = output.render(self.cli.format)?;
        if !text.is_empty() {
            println!("{text}");
        }
        Ok(())
    }

    /// Run the CLI command
    pub async fn execute(&self) -> Result<CommandOutput> {
        match &self.cli.command {
            Commands::Endpoints => Ok(Self::endpoints()),
            Commands::Login => self.login().await,
            Commands::Me => self.me().await,
            Commands::Get {
                endpoint,
                limit,
                offset,
                filters,
            } => self.get(*endpoint, *limit, *offset, filters).await,
            Commands::FetchAll {
                endpoint,
                page_size,
                max_pages,
                timeout_secs,
                filters,
                output,
            } => {
                self.fetch_all(
                    *endpoint,
                    FetchAllArgs {
                        page_size: *page_size,
                        max_pages: *max_pages,
                        timeout_secs: *timeout_secs,
                        output: output.as_deref(),
                    },
                    filters,
                )
                .await
            }
        }
    }

    /// Resolve configuration: file, then environment, then flags
    pub fn config(&self) -> Result<ClientConfig> {
        let mut config = match &self.cli.config {
            Some(path) => ClientConfig::from_file(path)?,
            None => ClientConfig::default(),
        };
        config.apply_env_from(&self.env);

        if let Some(url) = &self.cli.base_url {
            config.base_url.clone_from(url);
        }
        if let Some(key) = &self.cli.api_key {
            config.api_key = Some(key.clone());
        }
        if let Some(username) = &self.cli.username {
            config.username = Some(username.clone());
        }
        if let Some(password) = &self.cli.password {
            config.password = Some(password.clone());
        }

        config.validate()?;
        debug!(config = ?config, "Resolved configuration");
        Ok(config)
    }

    /// Build a client, logging in when only credentials are configured.
    ///
    /// The flag is set when this run owns a session and must end it.
    async fn connect(&self, config: &ClientConfig) -> Result<(MpsClient, bool)> {
        let client = MpsClient::from_config(config)?;
        if config.api_key.is_none() && config.has_credentials() {
            let (username, password) = credentials(config)?;
            client.login(username, password).await?;
            return Ok((client, true));
        }
        Ok((client, false))
    }

    async fn login(&self) -> Result<CommandOutput> {
        let config = self.config()?;
        let client = MpsClient::from_config(&config)?;

        let outcome = if config.api_key.is_some() {
            client.login("", "").await?
        } else {
            let (username, password) = credentials(&config)?;
            client.login(username, password).await?
        };
        // the token is not persisted, so nothing can reuse the session
        let owns_session = matches!(outcome, LoginOutcome::LoggedIn(_));
        end_session(&client, owns_session).await;

        let value = match outcome {
            LoginOutcome::ApiKeyInUse => json!({
                "type": "LOGIN",
                "status": "api_key",
                "message": "Using API key, login not required"
            }),
            LoginOutcome::LoggedIn(user) => json!({
                "type": "LOGIN",
                "status": "logged_in",
                "user": user
            }),
        };
        Ok(CommandOutput::Value(value))
    }

    async fn me(&self) -> Result<CommandOutput> {
        let config = self.config()?;
        let (client, owns_session) = self.connect(&config).await?;
        let result = client.me().await;
        end_session(&client, owns_session).await;
        let user = result?;
        Ok(CommandOutput::Value(json!({ "type": "USER", "user": user })))
    }

    async fn get(
        &self,
        endpoint: Endpoint,
        limit: Option<u32>,
        offset: u64,
        filters: &[(String, String)],
    ) -> Result<CommandOutput> {
        let config = self.config()?;
        let (client, owns_session) = self.connect(&config).await?;
        let filters: FilterSet = filters.iter().cloned().collect();

        let result = client
            .get_page(endpoint, limit.unwrap_or(config.page_size), offset, &filters)
            .await;
        end_session(&client, owns_session).await;
        let page: Page = result?;

        if self.cli.format == OutputFormat::Jsonl {
            return Ok(CommandOutput::Records(page.data));
        }
        Ok(CommandOutput::Value(serde_json::to_value(page)?))
    }

    async fn fetch_all(
        &self,
        endpoint: Endpoint,
        args: FetchAllArgs<'_>,
        filters: &[(String, String)],
    ) -> Result<CommandOutput> {
        let mut config = self.config()?;
        if let Some(page_size) = args.page_size {
            config.page_size = page_size;
        }
        if args.max_pages.is_some() {
            config.max_pages = args.max_pages;
        }
        config.validate()?;

        let (client, owns_session) = self.connect(&config).await?;
        let filters: FilterSet = filters.iter().cloned().collect();

        let cancel = CancelFlag::new();
        let mut options = config.walk_options().cancel_on(cancel.clone());
        if let Some(secs) = args.timeout_secs {
            options = options.deadline(Duration::from_secs(secs));
        }

        let watcher = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, stopping before the next page");
                cancel.cancel();
            }
        });
        let result = client
            .fetch_all_with_stats(endpoint, &filters, options)
            .await;
        watcher.abort();
        end_session(&client, owns_session).await;
        let (records, stats) = result?;

        match args.output {
            Some(path) => {
                let written = export_records(&records, path, None)?;
                Ok(CommandOutput::Value(json!({
                    "type": "EXPORT",
                    "endpoint": endpoint,
                    "path": path.display().to_string(),
                    "records": written,
                    "pages": stats.pages,
                    "total": stats.total_reported,
                    "elapsed_ms": stats.elapsed.as_millis() as u64
                })))
            }
            None => Ok(CommandOutput::Records(records)),
        }
    }

    fn endpoints() -> CommandOutput {
        let endpoints: Vec<Value> = Endpoint::ALL
            .iter()
            .map(|endpoint| {
                let filters: Vec<Value> = endpoint
                    .filters()
                    .iter()
                    .map(|spec| json!({ "name": spec.name, "values": spec.kind.describe() }))
                    .collect();
                json!({
                    "name": endpoint.slug(),
                    "path": endpoint.path(),
                    "filters": filters
                })
            })
            .collect();

        CommandOutput::Value(json!({
            "type": "ENDPOINTS",
            "endpoints": endpoints
        }))
    }
}

struct FetchAllArgs<'a> {
    page_size: Option<u32>,
    max_pages: Option<u32>,
    timeout_secs: Option<u64>,
    output: Option<&'a Path>,
}

/// Log out of a session this run opened; failures only warn
async fn end_session(client: &MpsClient, owns_session: bool) {
    if !owns_session {
        return;
    }
    if let Err(e) = client.logout().await {
        warn!(error = %e, "Logout failed, session left to expire");
    }
}

fn credentials(config: &ClientConfig) -> Result<(&str, &str)> {
    let username = config
        .username
        .as_deref()
        .filter(|u| !u.is_empty())
        .ok_or_else(|| Error::missing_field("username"))?;
    let password = config
        .password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| Error::missing_field("password"))?;
    Ok((username, password))
}
