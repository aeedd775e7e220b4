mod cli;

use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, Common};
use docflow_core::app::AppBuilder;
use docflow_core::config::DocflowConfig;
use docflow_core::domain::{ActionParams, Criterion, DocumentId};
use docflow_core::impls::{InMemoryDocumentStore, StoredDocument};
use docflow_core::ports::{Confirm, Notifier};

/// 標準入力で y/n を聞く
struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        let mut stderr = io::stderr().lock();
        let _ = write!(stderr, "{prompt} [y/N] ");
        let _ = stderr.flush();

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(_) => matches!(line.trim(), "y" | "Y" | "yes"),
            Err(e) => {
                tracing::warn!(error = %e, "could not read the answer, treating it as no");
                false
            }
        }
    }
}

/// 通知はログに出すだけ
struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, target: &DocumentId, message: &str) {
        tracing::info!(recipient = %target, %message, "notification");
    }
}

fn load_seed(path: &Path) -> Result<BTreeMap<String, StoredDocument>> {
    let contents = std::fs::read_to_string(path).with_context(|| format!("failed to read seed {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("failed to parse seed {}", path.display()))
}

/// `a1|url=https://...|1=x` → Criterion
fn parse_criterion(spec: &str, redact: bool) -> Result<Criterion> {
    let mut parts = spec.split('|');
    let code = parts.next().unwrap_or_default();
    if code.trim().is_empty() {
        bail!("empty criterion code in '{spec}'");
    }
    let mut criterion = Criterion::new(code);
    for part in parts {
        let Some((name, value)) = part.split_once('=') else {
            bail!("criterion parameter '{part}' is not name=value");
        };
        criterion = criterion.with_parameter(name.trim(), value.trim());
    }
    Ok(if redact { criterion.redacting() } else { criterion })
}

fn base_params(common: &Common) -> ActionParams {
    ActionParams::new(common.target.as_str(), common.user.as_str())
        .with_noinclude(common.noinclude)
        .with_notify(!common.no_notify)
        .with_watch(common.watch)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => DocflowConfig::load_from_file(path)?,
        None => DocflowConfig::default(),
    };
    let seed = match &cli.seed {
        Some(path) => load_seed(path)?,
        None => BTreeMap::new(),
    };

    let store = Arc::new(InMemoryDocumentStore::new().with_documents(seed));
    let confirm: Arc<dyn Confirm> = if cli.yes {
        Arc::new(|_: &str| true)
    } else {
        Arc::new(StdinConfirm)
    };

    let app = AppBuilder::new(store.clone(), confirm)
        .with_notifier(Arc::new(LogNotifier))
        .with_config(config)
        .register_builtin()?
        .expect_actions(&["rfd", "qd"])
        .build()?;

    let (kind, params) = match cli.command {
        Commands::Kinds => {
            for kind in app.kinds() {
                println!("{kind}");
            }
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Rfd { common, reason } => ("rfd", base_params(&common).with_rationale(reason)),
        Commands::Qd {
            common,
            criteria,
            reason,
            redact,
            salt,
        } => {
            let mut params = base_params(&common).with_salt(salt);
            if let Some(reason) = reason {
                params = params.with_rationale(reason);
            }
            for spec in &criteria {
                params = params.with_criterion(parse_criterion(spec, redact)?);
            }
            ("qd", params)
        }
    };

    let report = app.run(kind, params).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    for save in &report.saves {
        let text = store.text(save.written().clone()).await.unwrap_or_default();
        tracing::info!(document = %save.written(), "final text:\n{text}");
    }

    Ok(if report.succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
