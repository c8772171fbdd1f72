use anyhow::{anyhow, Context as AnyhowContext, Result};
use clap::Parser;
use gomatch_matcher::{BuildContext, ContextMatcher, MatcherConfig};
use gomatch_platform::known::{release_minor, COMPILER_GC, LATEST_MINOR_RELEASE};
use gomatch_platform::{HostPlatform, KnowledgeBase};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

mod files;
mod report;

use report::FileReport;

#[derive(Parser)]
#[command(name = "go-match-context")]
#[command(about = "Find a Go build context under which each file is built", long_about = None)]
#[command(version)]
struct Cli {
    /// Go files or package directories
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Starting GOOS (default: host)
    #[arg(long)]
    goos: Option<String>,

    /// Starting GOARCH (default: host)
    #[arg(long)]
    goarch: Option<String>,

    /// Compiler: gc|gccgo
    #[arg(long, default_value = COMPILER_GC)]
    compiler: String,

    /// Start with cgo enabled
    #[arg(long)]
    cgo: bool,

    /// Comma-separated build tags
    #[arg(long, value_delimiter = ',')]
    tags: Vec<String>,

    /// Comma-separated toolchain tags, e.g. goexperiment.arenas
    #[arg(long, value_delimiter = ',')]
    tool_tags: Vec<String>,

    /// Go release to build with, e.g. go1.20 (default: newest known)
    #[arg(long)]
    go_version: Option<String>,

    /// Matcher configuration (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Platform table, as printed by `go tool dist list -json`
    #[arg(long)]
    platforms: Option<PathBuf>,

    /// Only evaluate the starting context; never search for another one
    #[arg(long)]
    strict: bool,

    /// Print one JSON object per file
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode: log only errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Error);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = load_config(cli.config.as_deref(), cli.strict)?;
    let custom_kb = load_knowledge_base(cli.platforms.as_deref(), config.host.as_ref())?;
    let matcher = match &custom_kb {
        Some(kb) => ContextMatcher::with_knowledge_base(kb, config),
        None => ContextMatcher::new(config),
    };
    let start = start_context(&cli)?;
    log::debug!("starting from {} ({})", start.platform(), start.compiler);

    let files = files::collect_go_files(&cli.paths)?;
    if files.is_empty() {
        log::warn!("no Go files found");
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut failures = 0usize;
    for path in &files {
        let source =
            fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let name = path.to_string_lossy();
        let report = FileReport::new(&name, &source, matcher.match_context(&start, &name, &source));
        if report.is_failure() {
            failures += 1;
        }

        if cli.json {
            serde_json::to_writer(&mut out, &report)?;
            writeln!(out)?;
        } else {
            writeln!(out, "{}", report.render_text())?;
        }
    }
    out.flush()?;

    if failures > 0 {
        log::info!("{failures} of {} files could not be matched", files.len());
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn load_config(path: Option<&Path>, strict: bool) -> Result<MatcherConfig> {
    let mut config = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            MatcherConfig::from_toml_str(&text)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => MatcherConfig::default(),
    };
    if strict {
        config = MatcherConfig {
            host: config.host.clone(),
            fill_host_defaults: config.fill_host_defaults,
            ..MatcherConfig::strict()
        };
    }
    config.validate().map_err(|msg| anyhow!(msg))?;
    Ok(config)
}

/// The platform table from `path`, ordered for `host`. `None` without a path.
fn load_knowledge_base(
    path: Option<&Path>,
    host: Option<&HostPlatform>,
) -> Result<Option<KnowledgeBase>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read platform table {}", path.display()))?;
    let host = host.cloned().unwrap_or_else(HostPlatform::detect);
    let kb = KnowledgeBase::from_dist_list_json(&json, &host)
        .with_context(|| format!("invalid platform table {}", path.display()))?;
    Ok(Some(kb))
}

fn start_context(cli: &Cli) -> Result<BuildContext> {
    let minor = match &cli.go_version {
        Some(version) => parse_go_version(version)?,
        None => LATEST_MINOR_RELEASE,
    };
    Ok(BuildContext::new(
        cli.goos.clone().unwrap_or_default(),
        cli.goarch.clone().unwrap_or_default(),
    )
    .with_compiler(cli.compiler.clone())
    .with_cgo(cli.cgo)
    .with_build_tags(cli.tags.iter().filter(|t| !t.is_empty()))
    .with_tool_tags(cli.tool_tags.iter().filter(|t| !t.is_empty()))
    .with_go_version(minor))
}

/// Accepts `go1.20` or `1.20`.
fn parse_go_version(version: &str) -> Result<u32> {
    let tag = if version.starts_with("go") {
        version.to_string()
    } else {
        format!("go{version}")
    };
    release_minor(&tag).ok_or_else(|| anyhow!("invalid Go version {version:?}, want go1.N"))
}
