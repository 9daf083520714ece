//! # reqline Main Entry Point
//!
//! Sets up logging, restores the saved context and starts the shell.

use anyhow::{Context, Result};
use reqline::cmd_args::CommandLineArgs;
use reqline::config::{self, Config, LOG_LEVEL_ENV_VAR};
use reqline::repl::io::TerminalPager;
use reqline::repl::models::{NavTree, RequestContext, DEFAULT_URL};
use reqline::repl::services::{startup_context_path, ReqwestClient, SessionListener};
use reqline::repl::utils::{normalize_url, quote_cli_arg};
use reqline::repl::{AppController, Executor};
use tracing_subscriber::{filter::LevelFilter, fmt::time::ChronoLocal, EnvFilter};

const QUIET_TARGETS: &[&str] = &[
    "reqwest", "hyper", "hyper_util", "rustls", "rustyline", "tracing",
];

fn main() -> Result<()> {
    init_tracing_subscriber();

    let cmd_args = CommandLineArgs::parse();
    let config = Config::load()?;
    tracing::debug!("Config: {:?}", config);

    let nav_tree = cmd_args
        .spec()
        .map(|path| NavTree::load(path))
        .transpose()?;

    let cli_url = cmd_args.url().map(normalize_url);
    let start_url = cli_url
        .clone()
        .or_else(|| nav_tree.as_ref().and_then(|t| t.base_url()).map(str::to_string))
        .unwrap_or_else(|| DEFAULT_URL.to_string());

    let data_dir = config::data_dir();
    let listener = SessionListener::new(
        data_dir.clone(),
        &start_url,
        config.context_per_host,
        config.set_cookies,
    );
    let context_path = listener.path().to_path_buf();

    let mut executor = Executor::new(
        Box::new(ReqwestClient::new()),
        Box::new(TerminalPager::new(config.pager.clone())),
    )
    .with_listener(Box::new(listener));
    if let Some(tree) = nav_tree {
        executor = executor.with_nav_tree(tree);
    }

    let mut ctx = RequestContext::new(start_url);
    if let Some(style) = config.output_style.as_ref() {
        ctx.options.insert("--style".to_string(), Some(style.clone()));
    }

    let env_path = startup_context_path(cmd_args.env().map(|p| p.as_path()), context_path)?;
    executor
        .load(&env_path, &mut ctx)
        .with_context(|| format!("Failed to load context from {}", env_path.display()))?;
    if let Some(url) = cli_url {
        ctx.url = url;
    }

    if !cmd_args.items().is_empty() {
        let line = cmd_args
            .items()
            .iter()
            .map(|item| quote_cli_arg(item))
            .collect::<Vec<_>>()
            .join(" ");
        executor.execute(&line, &mut ctx);
    }

    let mut app = AppController::new(executor, ctx, &config)?.with_history_dir(data_dir);
    app.run()
}

fn init_tracing_subscriber() {
    let mut filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::OFF.into())
        .with_env_var(LOG_LEVEL_ENV_VAR)
        .from_env_lossy();
    for target in QUIET_TARGETS {
        if let Ok(directive) = format!("{target}=warn").parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_timer(ChronoLocal::rfc_3339())
        .init();
}
