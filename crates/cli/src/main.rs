//! Verify the instance identity document of the running instance, or of a
//! directory of captured `document`, `signature` and `pkcs7` files.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use iid_engine::{
    fetch_and_verify_envelope, fetch_and_verify_raw, verify_instance, EngineError, EnvelopeVerificationReport,
    FetcherSpec, ImdsConfig, InstanceIdentity, InstanceReport, Outcome, RawVerificationReport, RawVerifyConfig,
    TrustAnchorStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Raw,
    Envelope,
    All,
}

#[derive(Debug, Parser)]
#[command(name = "iid-verify", version, about)]
struct Cli {
    /// Which pipeline(s) to run.
    #[arg(value_enum, default_value_t = Mode::All)]
    mode: Mode,

    /// imds | imds:<base-url> | local:<dir>
    #[arg(long, env = "IID_SOURCE", default_value = "imds")]
    source: String,

    /// Comma separated candidate algorithms for the raw path.
    #[arg(long, env = "IID_ALGORITHMS")]
    algorithms: Option<String>,

    /// Skip the IMDSv2 session token.
    #[arg(long)]
    no_token: bool,

    /// Accept a metadata base URL that is not link-local or loopback.
    #[arg(long)]
    allow_non_local: bool,

    /// Emit the report as JSON on stdout.
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            let fatal = e.downcast_ref::<EngineError>().is_some_and(EngineError::is_fatal);
            eprintln!("error: {e:#}");
            ExitCode::from(if fatal { 2 } else { 1 })
        }
    }
}

/// Returns whether every pipeline that ran verified.
fn run(cli: &Cli) -> Result<bool> {
    // Anchor corruption is a broken build: stop before touching the network.
    let store = TrustAnchorStore::embedded()?;

    let raw_cfg = match &cli.algorithms {
        Some(list) => RawVerifyConfig::from_list(list)?,
        None => RawVerifyConfig::secure_default(),
    };
    let mut imds = ImdsConfig::secure_default();
    imds.use_token = !cli.no_token;
    imds.allow_non_local_endpoint = cli.allow_non_local;

    let spec: FetcherSpec = cli.source.parse().context("invalid --source")?;
    let (fetcher, endpoints) = spec.resolve(imds)?;
    tracing::debug!(source = %cli.source, mode = ?cli.mode, document = %endpoints.document, "resolved identity source");

    match cli.mode {
        Mode::All => {
            let report = verify_instance(fetcher.as_ref(), &endpoints, store, &raw_cfg);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_instance(&report);
            }
            Ok(report.is_verified())
        }
        Mode::Raw => {
            let report = fetch_and_verify_raw(fetcher.as_ref(), &endpoints, store, &raw_cfg)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_raw(&report);
            }
            Ok(report.is_verified())
        }
        Mode::Envelope => {
            let report = fetch_and_verify_envelope(fetcher.as_ref(), &endpoints, store)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_envelope(&report);
            }
            Ok(report.outcome.is_verified())
        }
    }
}

fn print_instance(report: &InstanceReport) {
    if let Some(id) = &report.identity {
        print_identity(id);
    }
    match &report.raw {
        Ok(r) => print_raw(r),
        Err(e) => println!("Raw signature check not performed: {e}"),
    }
    match &report.envelope {
        Ok(r) => print_envelope(r),
        Err(e) => println!("PKCS7 check not performed: {e}"),
    }
    match report.content_matches_document {
        Some(true) => println!("PKCS7 content matches the fetched document"),
        Some(false) => println!("PKCS7 content DIFFERS from the fetched document"),
        None => {}
    }
}

fn print_identity(id: &InstanceIdentity) {
    let show = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".into());
    println!(
        "Instance {} ({}) in {} / {}, account {}",
        show(&id.instance_id),
        show(&id.instance_type),
        show(&id.region),
        show(&id.availability_zone),
        show(&id.account_id),
    );
}

fn print_raw(report: &RawVerificationReport) {
    for r in &report.results {
        println!("Checking against RSA certificate {}", r.algorithm);
        print_outcome(&r.outcome);
    }
}

fn print_envelope(report: &EnvelopeVerificationReport) {
    println!("Checking against PKCS7 certificate");
    if report.embedded_certificates > 0 {
        println!("  ignored {} certificate(s) carried by the envelope", report.embedded_certificates);
    }
    print_outcome(&report.outcome);
    if let Some(content) = report.verified_content() {
        println!("{}", String::from_utf8_lossy(content));
    }
}

fn print_outcome(outcome: &Outcome) {
    match outcome {
        Outcome::Verified => println!("  Verified OK"),
        Outcome::Failed { reason } => println!("  Unable to verify: {reason}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_defaults() {
        let cli = Cli::try_parse_from(["iid-verify"]).unwrap();
        assert_eq!(cli.mode, Mode::All);
        assert_eq!(cli.source, "imds");
        assert!(!cli.json);
    }

    #[test]
    fn cli_parses_local_raw_mode() {
        let cli = Cli::try_parse_from([
            "iid-verify",
            "raw",
            "--source",
            "local:/tmp/iid",
            "--algorithms",
            "SHA256WithRSA,SHA512WithRSA",
            "--json",
        ])
        .unwrap();
        assert_eq!(cli.mode, Mode::Raw);
        assert!(cli.json);
        assert_eq!(cli.algorithms.as_deref(), Some("SHA256WithRSA,SHA512WithRSA"));
    }

    #[test]
    fn missing_local_files_report_failure_not_error() {
        let dir = std::env::temp_dir().join("iid-verify-cli-empty");
        let cli = Cli::try_parse_from(["iid-verify", "--source", &format!("local:{}", dir.display())]).unwrap();
        assert!(!run(&cli).unwrap());
    }
}
