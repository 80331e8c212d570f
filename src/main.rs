//! tripleproxy - demo driver
//!
//! Runs the repository lifecycle, federation and session-isolation scenarios
//! against an in-process catalog and prints what each step observes.

use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use tripleproxy::catalog::{MemoryCatalog, StoreName, Triple, TriplePattern};
use tripleproxy::repository::{AccessMode, Repository, RepositoryResult};
use tripleproxy::session::SessionKind;

type DemoResult = Result<(), Box<dyn std::error::Error>>;

/// What the command line asked for.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Help,
    Version,
    Run { verbose: bool, scenarios: Vec<String> },
}

/// Parse command line args. The first item is the program name and may be
/// missing.
fn parse_args<I>(args: I) -> Result<Command, String>
where
    I: IntoIterator<Item = String>,
{
    let mut verbose = false;
    let mut scenarios: Vec<String> = Vec::new();

    for arg in args.into_iter().skip(1) {
        match arg.as_str() {
            "-v" | "--verbose" => verbose = true,
            "-h" | "--help" => return Ok(Command::Help),
            "--version" => return Ok(Command::Version),
            other if other.starts_with('-') => return Err(format!("Unknown option: {}", other)),
            other => scenarios.push(other.to_string()),
        }
    }

    if scenarios.is_empty() {
        scenarios = vec!["lifecycle".into(), "federation".into(), "sessions".into()];
    }
    Ok(Command::Run { verbose, scenarios })
}

fn main() -> ExitCode {
    let (verbose, scenarios) = match parse_args(std::env::args()) {
        Ok(Command::Help) => {
            print_help();
            return ExitCode::SUCCESS;
        }
        Ok(Command::Version) => {
            println!("tripleproxy v{}", env!("CARGO_PKG_VERSION"));
            return ExitCode::SUCCESS;
        }
        Ok(Command::Run { verbose, scenarios }) => (verbose, scenarios),
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(verbose);

    for scenario in &scenarios {
        let result = match scenario.as_str() {
            "lifecycle" => lifecycle(),
            "federation" => federation(),
            "sessions" => sessions(),
            other => {
                eprintln!("Unknown scenario: {}", other);
                return ExitCode::FAILURE;
            }
        };
        if let Err(e) = result {
            eprintln!("Error in {}: {}", scenario, e);
            return ExitCode::FAILURE;
        }
        println!();
    }

    ExitCode::SUCCESS
}

fn init_logging(verbose: bool) {
    let default = if verbose { "tripleproxy=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn print_help() {
    println!("tripleproxy - repository proxy for remote RDF triple stores");
    println!();
    println!("Usage: tripleproxy [OPTIONS] [SCENARIO]...");
    println!();
    println!("Scenarios (default: all):");
    println!("  lifecycle     Access modes: CREATE, RENEW, OPEN, ACCESS");
    println!("  federation    Read two stores through one federated store");
    println!("  sessions      Dedicated session commit and rollback");
    println!();
    println!("Options:");
    println!("  -v, --verbose          Enable debug logging (RUST_LOG overrides)");
    println!("  -h, --help             Show this help message");
    println!("  --version              Show version");
}

fn triples(prefix: &str, count: usize) -> Vec<Triple> {
    (1..=count)
        .map(|i| Triple::new(format!("ex:{}{}", prefix, i), "rdf:type", format!("ex:{}", prefix)))
        .collect()
}

fn lifecycle() -> DemoResult {
    println!("== lifecycle");
    let catalog = Arc::new(MemoryCatalog::new());

    let repo = Repository::new(catalog.clone(), "scratch", AccessMode::Create)?.init()?;
    let mut conn = repo.connection()?;
    println!("created {}: writable={} size={}", repo.name(), repo.is_writable()?, conn.size()?);
    conn.add_all(triples("item", 3))?;
    println!("added 3 statements: size={}", conn.size()?);
    conn.close()?;
    repo.shut_down();

    let again = Repository::new(catalog.clone(), "scratch", AccessMode::Create)?;
    report("CREATE on existing store", again.initialize());

    let renewed = Repository::new(catalog.clone(), "scratch", AccessMode::Renew)?.init()?;
    println!("RENEW on existing store: size={}", renewed.connection()?.size()?);
    renewed.shut_down();

    let missing = Repository::new(catalog.clone(), "missing", AccessMode::Open)?;
    report("OPEN on absent store", missing.initialize());

    let accessed = Repository::new(catalog, "missing", AccessMode::Access)?.init()?;
    println!("ACCESS on absent store: size={}", accessed.connection()?.size()?);
    accessed.shut_down();
    Ok(())
}

fn federation() -> DemoResult {
    println!("== federation");
    let catalog = Arc::new(MemoryCatalog::new());
    catalog.seed(&StoreName::new("red")?, triples("red", 2))?;
    catalog.seed(&StoreName::new("green")?, triples("green", 2))?;

    let rainbow = Repository::new(catalog, "rainbow", AccessMode::Renew)?;
    rainbow.add_federated_sources(["red", "green"])?;
    rainbow.initialize()?;

    let mut conn = rainbow.connection()?;
    println!("red + green through {}: {} statements", rainbow.name(), conn.size()?);
    for triple in conn.get_statements(&TriplePattern::any())? {
        println!("  {}", triple);
    }
    report("add to federated store", conn.add(Triple::new("ex:x", "ex:p", "ex:o")));
    conn.close()?;
    rainbow.shut_down();
    Ok(())
}

fn sessions() -> DemoResult {
    println!("== sessions");
    let catalog = Arc::new(MemoryCatalog::new());
    let repo = Repository::new(catalog, "people", AccessMode::Renew)?.init()?;

    let mut common = repo.connection()?;
    let mut dedicated = repo.open_session(SessionKind::Dedicated)?;

    common.add_all(triples("valjean", 3))?;
    dedicated.add_all(triples("kennedy", 5))?;

    let kennedy = TriplePattern::any().object("ex:kennedy");
    let valjean = TriplePattern::any().object("ex:valjean");

    println!("before commit or rollback:");
    println!("  common sees    valjean={} kennedy={}", count(&common, &valjean)?, count(&common, &kennedy)?);
    println!("  dedicated sees valjean={} kennedy={}", count(&dedicated, &valjean)?, count(&dedicated, &kennedy)?);

    dedicated.rollback()?;
    println!("after rollback:");
    println!("  dedicated sees valjean={} kennedy={}", count(&dedicated, &valjean)?, count(&dedicated, &kennedy)?);

    dedicated.add_all(triples("kennedy", 5))?;
    dedicated.commit()?;
    println!("after reload and commit:");
    println!("  common sees    valjean={} kennedy={}", count(&common, &valjean)?, count(&common, &kennedy)?);

    dedicated.close()?;
    common.close()?;
    repo.shut_down();
    Ok(())
}

fn count(session: &tripleproxy::session::Session, pattern: &TriplePattern) -> RepositoryResult<usize> {
    Ok(session.get_statements(pattern)?.len())
}

fn report<T>(what: &str, result: RepositoryResult<T>) {
    match result {
        Ok(_) => println!("{}: ok", what),
        Err(e) => println!("{}: refused ({})", what, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_empty_argv() {
        let all = vec!["lifecycle".to_string(), "federation".into(), "sessions".into()];
        assert_eq!(
            parse_args(Vec::new()),
            Ok(Command::Run { verbose: false, scenarios: all.clone() })
        );
        assert_eq!(
            parse_args(args(&["tripleproxy"])),
            Ok(Command::Run { verbose: false, scenarios: all })
        );
    }

    #[test]
    fn test_parse_flags_and_scenarios() {
        assert_eq!(
            parse_args(args(&["tripleproxy", "-v", "sessions"])),
            Ok(Command::Run { verbose: true, scenarios: vec!["sessions".into()] })
        );
        assert_eq!(parse_args(args(&["tripleproxy", "--help"])), Ok(Command::Help));
        assert_eq!(parse_args(args(&["tripleproxy", "--version"])), Ok(Command::Version));
        assert!(parse_args(args(&["tripleproxy", "--bogus"])).is_err());
    }
}
