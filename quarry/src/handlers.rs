use clap::ArgMatches;
use colored::Colorize;
use quarry_core::crawl::{CrawlOptions, RenderBackend, execute_crawl, validate_target};
use quarry_core::persist::{prepare_output_dir, write_final_page, write_records};
use quarry_core::report::{gather_report_data, generate_text_report, write_manifest};
use quarry_scanner::render::is_js_rendering_available;
use quarry_scanner::{CrawlConfig, Headers, ScopePolicy};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_OUTPUT_DIR: &str = "./responses";

/// Where to start and where to write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    pub url: String,
    pub output_dir: PathBuf,
}

/// Parse a `Name: Value` header flag, splitting on the first colon
pub fn parse_header_line(line: &str) -> Option<(String, String)> {
    let (name, value) = line.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().to_string()))
}

/// Build the header map from every `-H` occurrence, skipping malformed entries
pub fn parse_headers<'a>(lines: impl IntoIterator<Item = &'a str>) -> Headers {
    let mut headers = Headers::new();
    for line in lines {
        match parse_header_line(line) {
            Some((name, value)) => {
                headers.insert(name, value);
            }
            None => warn!("Ignoring invalid header format: {}", line),
        }
    }
    headers
}

/// Work out the seed URL and output directory from `--url` and the positionals.
///
/// With `--url`, the first positional is the output directory. Without it,
/// the first positional is the URL and the second the output directory.
pub fn resolve_target_and_output(
    url_flag: Option<&str>,
    positionals: &[&str],
) -> Result<CrawlTarget, String> {
    let (url, output) = match url_flag {
        Some(url) => {
            if positionals.len() > 1 {
                return Err(format!("Unexpected argument '{}'", positionals[1]));
            }
            (url, positionals.first().copied())
        }
        None => match positionals.first() {
            Some(url) => (*url, positionals.get(1).copied()),
            None => return Err("A URL to crawl is required".to_string()),
        },
    };

    let output_dir = match output {
        Some(dir) if dir.starts_with('-') => {
            return Err(format!("Invalid output directory '{}'", dir));
        }
        Some(dir) => dir,
        None => DEFAULT_OUTPUT_DIR,
    };

    Ok(CrawlTarget {
        url: url.to_string(),
        output_dir: PathBuf::from(shellexpand::tilde(output_dir).as_ref()),
    })
}

/// Translate command-line flags into a crawl configuration
pub fn build_crawl_config(args: &ArgMatches) -> CrawlConfig {
    let headers = parse_headers(
        args.get_many::<String>("header")
            .into_iter()
            .flatten()
            .map(String::as_str),
    );

    let scope = if args.get_flag("subdomains") {
        ScopePolicy::IncludeSubdomains
    } else {
        ScopePolicy::SameHost
    };

    CrawlConfig::default()
        .with_headers(headers)
        .with_max_depth(*args.get_one::<usize>("depth").unwrap_or(&5))
        .with_max_retries(*args.get_one::<usize>("retries").unwrap_or(&3))
        .with_crawl_timeout(Duration::from_secs(
            *args.get_one::<u64>("timeout").unwrap_or(&300),
        ))
        .with_scope(scope)
        .with_dedupe_resources(!args.get_flag("refetch-resources"))
}

fn init_logging(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub async fn handle_crawl(args: &ArgMatches) -> Result<(), String> {
    let quiet = args.get_flag("quiet");
    init_logging(quiet);

    let positionals: Vec<&str> = ["TARGET", "OUTPUT_DIR"]
        .iter()
        .filter_map(|id| args.get_one::<String>(id).map(String::as_str))
        .collect();
    let target = resolve_target_and_output(
        args.get_one::<String>("url").map(String::as_str),
        &positionals,
    )?;

    validate_target(&target.url)?;
    if args.get_flag("browser") && !is_js_rendering_available() {
        return Err(
            "Browser rendering not available. Rebuild with --features js-rendering".to_string(),
        );
    }
    let output_dir = prepare_output_dir(&target.output_dir).map_err(|e| {
        format!(
            "Failed to create output directory {}: {}",
            target.output_dir.display(),
            e
        )
    })?;

    let config = build_crawl_config(args);
    if !quiet {
        println!("\n{} Crawling {}", "→".blue(), target.url.bright_white());
        println!("Max depth: {}", config.max_depth);
        println!("Retries: {}", config.max_retries);
        println!("Deadline: {}s", config.crawl_timeout.as_secs());
        let scope = match config.scope {
            ScopePolicy::SameHost => "same host only",
            ScopePolicy::IncludeSubdomains => "host and subdomains",
        };
        println!("Scope: {}", scope);
        println!("Output: {}\n", output_dir.display());
    }

    let backend = if args.get_flag("browser") {
        RenderBackend::Browser {
            headless: !args.get_flag("headful"),
            sandbox: true,
        }
    } else {
        RenderBackend::Http
    };

    let options = CrawlOptions {
        url: target.url.clone(),
        config,
        backend,
        show_progress_bars: !quiet,
    };

    let progress_callback = Arc::new(|msg: String| {
        println!("{}", msg.yellow());
    });

    let started_at = chrono::Utc::now().timestamp();
    let outcome = execute_crawl(options, Some(progress_callback))
        .await
        .map_err(|e| format!("Crawl failed: {}", e))?;
    let finished_at = chrono::Utc::now().timestamp();

    let records = outcome.records.records();
    let summary = write_records(&output_dir, records);
    if let Err(e) = write_final_page(&output_dir, records) {
        warn!("Failed to write final page: {}", e);
    }

    let data = gather_report_data(
        &target.url,
        started_at,
        finished_at,
        &outcome,
        Some((output_dir.as_path(), &summary)),
    );
    if !args.get_flag("no-manifest")
        && let Err(e) = write_manifest(&output_dir, &data)
    {
        warn!("Failed to write manifest: {}", e);
    }

    if !quiet {
        println!("\n{} Crawl complete!\n", "✓".green().bold());
        print!("{}", generate_text_report(&data));
    }
    println!(
        "Saved {} files to {}",
        summary.files.len(),
        output_dir.display()
    );

    Ok(())
}
