use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use iocraft::prelude::*;

use test_board::app::App;
use test_board::color::ColorDepth;
use test_board::config::loader;
use test_board::config::types::AppConfig;
use test_board::dashboard::Dashboard;
use test_board::engine::{Engine, HttpTestService, RunnerEngine, TestService};
use test_board::render;
use test_board::theme::{Background, ResolvedTheme};
use test_board::types::TestDescriptor;

#[derive(Parser)]
#[command(name = "test-board", version, about = "Terminal dashboard for a remote test runner")]
struct Cli {
    /// Path to config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging to debug.log.
    #[arg(long)]
    debug: bool,

    /// Base URL of the test server (overrides `server.url`).
    #[arg(long, global = true)]
    server: Option<String>,

    /// Initial filter keywords, comma separated.
    #[arg(short, long, global = true)]
    keyword: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the test list as a standalone HTML page.
    Export {
        /// Destination file.
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Print every test and the per-type totals.
    List,
}

fn fetch_tests(service: &HttpTestService) -> Result<Vec<TestDescriptor>> {
    let rt = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
    rt.block_on(service.list_tests())
        .with_context(|| format!("listing tests from {}", service.base_url()))
}

fn export(
    config: &AppConfig,
    service: &HttpTestService,
    keyword: Option<&str>,
    output: &PathBuf,
) -> Result<()> {
    let tests = fetch_tests(service)?;
    let mut dashboard = Dashboard::new(tests).with_filter(config.defaults.filter_input(keyword));
    let visible = dashboard.apply_filter()?;
    let page = render::page_document(&dashboard, config.runner.page_size);
    std::fs::write(output, page.into_string())
        .with_context(|| format!("writing {}", output.display()))?;
    println!(
        "wrote {} ({visible} of {} tests visible)",
        output.display(),
        dashboard.len()
    );
    Ok(())
}

fn list(service: &HttpTestService) -> Result<()> {
    let tests = fetch_tests(service)?;
    let dashboard = Dashboard::new(tests);
    for row in dashboard.rows() {
        println!(
            "{:<12} {:<9} {}",
            row.descriptor.test_type.as_str(),
            row.state.as_str(),
            row.descriptor.name
        );
    }
    println!("{}", dashboard.stat_line());
    Ok(())
}

fn main() -> Result<()> {
    // Install a panic hook that writes to a file, since the fullscreen TUI
    // swallows stderr.
    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::force_capture();
        let msg = format!("{info}\n\n{backtrace}");
        let _ = std::fs::write("panic.log", &msg);
        eprintln!("{msg}");
    }));

    let cli = Cli::parse();

    // Set up tracing.
    if cli.debug {
        let file = std::fs::File::create("debug.log")?;
        tracing_subscriber::fmt()
            .with_writer(file)
            .with_ansi(false)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .init();
    }

    // Load config.
    let mut config = loader::load_config(cli.config.as_deref())?;
    if let Some(url) = cli.server {
        config.server.url = url;
    }
    let keyword = cli.keyword.as_deref();

    let service = HttpTestService::new(&config.server.url, config.server.request_timeout())
        .context("creating test server client")?;

    // Handle subcommands that don't need the TUI.
    match cli.command {
        Some(Commands::Export { ref output }) => return export(&config, &service, keyword, output),
        Some(Commands::List) => return list(&service),
        None => {}
    }

    // Detect terminal capabilities.
    let color_depth = ColorDepth::detect();
    let background = Background::detect();
    let theme = ResolvedTheme::resolve(&config.theme, background);

    // Start the engine in a dedicated OS thread (owns its own Tokio runtime).
    // Dropping `engine_handle` at the end of `main` closes the sender channel,
    // signalling the engine to shut down.
    let engine_handle = RunnerEngine::new(service, config.runner.poll_interval()).start();

    tracing::info!("test-board starting against {}", config.server.url);

    // Enter fullscreen TUI (iocraft uses smol internally).
    smol::block_on(
        element! {
            App(
                config: &config,
                engine: &engine_handle,
                theme: &theme,
                color_depth,
                keyword,
            )
        }
        .fullscreen(),
    )?;

    Ok(())
}
