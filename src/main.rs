use anyhow::{Context, Result};
use clap::{builder::FalseyValueParser, Parser, Subcommand};
use proxyip_feed::{
    config::{DEFAULT_ERROR_LOG, DEFAULT_INPUT, DEFAULT_OUTPUT},
    proxy::{
        CountryTable, CrawlerConfig, FilterPolicy, LabelConverter, LivenessProbe, ProbeConfig,
        ProxyChecker, ProxyCrawler,
    },
    run_verification, FeedConfig,
};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Re-verifies a proxy IP feed and keeps only the survivors
#[derive(Parser)]
#[command(name = "proxyip-feed", version)]
#[command(about = "Re-verifies a proxy IP feed against a liveness-check API")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe every candidate and write the verified feed
    Verify {
        /// Candidate source (ip,port,country_code,label per line)
        #[arg(short, long, env = "IP_FILE", default_value = DEFAULT_INPUT)]
        input: PathBuf,
        /// Output file for accepted proxies
        #[arg(short, long, env = "OUTPUT_FILE", default_value = DEFAULT_OUTPUT)]
        output: PathBuf,
        /// Output file for probe errors
        #[arg(short, long, env = "ERROR_FILE", default_value = DEFAULT_ERROR_LOG)]
        error_log: PathBuf,
        /// Check API URL template with {ip}, {port} and optional {host}
        #[arg(long, env = "API_URL")]
        api_url: String,
        /// Value substituted for {host} in the API URL
        #[arg(long, env = "PROBE_HOST", default_value = "speed.cloudflare.com")]
        probe_host: String,
        /// Number of concurrent probes
        #[arg(short = 'n', long, env = "PROBE_WORKERS", default_value_t = 50)]
        workers: usize,
        /// Probe timeout in seconds
        #[arg(long, env = "PROBE_TIMEOUT", default_value_t = 60)]
        timeout: u64,
        /// Country codes to keep (comma-separated, case-sensitive)
        #[arg(long, env = "ALLOWED_COUNTRY_CODES", value_delimiter = ',', default_value = "KR,HK,JP")]
        allow_country: Vec<String>,
        /// Ports to drop (comma-separated)
        #[arg(long, env = "EXCLUDED_PORTS", value_delimiter = ',', default_value = "443")]
        exclude_port: Vec<String>,
        /// JSON filter policy; replaces --allow-country and --exclude-port
        #[arg(long, env = "POLICY_FILE")]
        policy_file: Option<PathBuf>,
        /// Atomically replace the input with the verified candidates
        #[arg(long, env = "REPLACE_SOURCE", value_parser = FalseyValueParser::new())]
        replace_source: bool,
        /// Prefix error-log lines with a timestamp
        #[arg(long, env = "TIMESTAMP_ERRORS", value_parser = FalseyValueParser::new())]
        timestamp_errors: bool,
    },
    /// Download an upstream candidate list into the candidate source
    Fetch {
        /// URL of the comma-delimited candidate list
        #[arg(short, long, env = "SOURCE_URL")]
        url: String,
        /// Candidate source to write
        #[arg(short, long, env = "IP_FILE", default_value = DEFAULT_INPUT)]
        output: PathBuf,
        /// Keep only these country codes (comma-separated)
        #[arg(short, long, env = "FETCH_COUNTRY_CODES", value_delimiter = ',')]
        country: Vec<String>,
        /// Timeout in seconds for the HTTP request
        #[arg(long, env = "FETCH_TIMEOUT", default_value_t = 30)]
        timeout: u64,
    },
    /// Rewrite ip:port#code_label lines as ip:port#CODE CountryName
    Convert {
        /// File of labeled proxies
        #[arg(short, long)]
        input: PathBuf,
        /// Output file for converted lines
        #[arg(short, long, default_value = "converted_proxies.txt")]
        output: PathBuf,
        /// JSON object mapping country codes to display names
        #[arg(long, env = "COUNTRY_TABLE")]
        country_table: Option<PathBuf>,
    },
}

fn init_logger() {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger();

    match cli.command {
        Commands::Verify {
            input,
            output,
            error_log,
            api_url,
            probe_host,
            workers,
            timeout,
            allow_country,
            exclude_port,
            policy_file,
            replace_source,
            timestamp_errors,
        } => {
            let probe_config = ProbeConfig::new(api_url)
                .with_probe_host(probe_host)
                .with_timeout(Duration::from_secs(timeout));
            let policy = match policy_file {
                Some(path) => FilterPolicy::from_json_file(path)?,
                None => FilterPolicy::new(
                    allow_country.into_iter().filter(|c| !c.is_empty()),
                    exclude_port.into_iter().filter(|p| !p.is_empty()),
                ),
            };
            let config = FeedConfig::new(probe_config.clone(), policy)
                .with_input(input)
                .with_output(output)
                .with_error_log(error_log)
                .with_workers(workers)
                .with_replace_source(replace_source)
                .with_timestamp_errors(timestamp_errors);

            let checker = ProxyChecker::with_config(probe_config)
                .context("building HTTP client for the check API")?;
            let probe: Arc<dyn LivenessProbe> = Arc::new(checker);

            let report = run_verification(&config, probe).await?;

            if report.has_survivors() {
                info!(
                    "{} proxies survived verification and were saved to {}",
                    report.summary.accepted,
                    config.output.display()
                );
            } else {
                info!(
                    "No candidates survived verification ({} checked)",
                    report.summary.candidates
                );
            }
        }
        Commands::Fetch {
            url,
            output,
            country,
            timeout,
        } => {
            let config = CrawlerConfig::new()
                .with_timeout(Duration::from_secs(timeout))
                .with_country_codes(country.into_iter().filter(|c| !c.is_empty()));
            let crawler = ProxyCrawler::with_config(config)?;
            crawler.fetch_into(&url, &output).await?;
        }
        Commands::Convert {
            input,
            output,
            country_table,
        } => {
            let table = match country_table {
                Some(path) => CountryTable::from_json_file(path)?,
                None => CountryTable::default(),
            };
            let content = fs::read_to_string(&input)
                .with_context(|| format!("reading {}", input.display()))?;

            let lines = LabelConverter::new(table).convert_string(&content);
            let mut body = lines.join("\n");
            if !body.is_empty() {
                body.push('\n');
            }
            fs::write(&output, body).with_context(|| format!("writing {}", output.display()))?;

            info!("Converted {} entries into {}", lines.len(), output.display());
        }
    }

    Ok(())
}
