use clap::Parser;
use ferrous_resolver_application::Callbacks;
use ferrous_resolver_domain::{CliOverrides, DomainError, RecordType};
use ferrous_resolver_infrastructure::Resolver;
use output::Outcome;
use std::cell::RefCell;
use std::net::IpAddr;
use std::process::ExitCode;
use std::rc::Rc;
use tracing::{debug, info};

mod bootstrap;
mod output;

#[derive(Parser)]
#[command(name = "ferrous-resolve")]
#[command(version)]
#[command(about = "Ferrous Resolver - asynchronous stub resolver lookup tool")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// Record type to query
    #[arg(short = 't', long = "type", default_value = "A")]
    record_type: RecordType,

    /// Treat every NAME as an IP address and look up its PTR record
    #[arg(short = 'x', long)]
    reverse: bool,

    /// Nameserver to use instead of the configured ones (repeatable)
    #[arg(short = 's', long = "server", value_name = "SERVER")]
    servers: Vec<String>,

    /// Search domain (repeatable)
    #[arg(long = "search", value_name = "DOMAIN")]
    search: Vec<String>,

    /// Overall timeout per lookup, in seconds
    #[arg(long)]
    timeout: Option<f64>,

    /// Maximum number of UDP attempts per lookup
    #[arg(long)]
    attempts: Option<usize>,

    #[arg(long)]
    ndots: Option<u8>,

    /// Ignore /etc/resolv.conf
    #[arg(long)]
    no_system: bool,

    /// Print results as JSON, one object per line
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Names (or addresses with -x) to resolve
    #[arg(required = true, value_name = "NAME")]
    names: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let cli_overrides = CliOverrides {
        nameservers: cli.servers.clone(),
        search: cli.search.clone(),
        timeout: cli.timeout,
        attempts: cli.attempts,
        ndots: cli.ndots,
        no_system: cli.no_system,
        log_level: cli.log_level.clone(),
    };

    let config = bootstrap::load_config(cli.config.as_deref(), cli_overrides)?;
    bootstrap::init_logging(&config);

    info!("Starting Ferrous Resolver v{}", env!("CARGO_PKG_VERSION"));

    let mut resolver = Resolver::from_config(&config.resolver)?;
    let record_type = if cli.reverse {
        RecordType::PTR
    } else {
        cli.record_type
    };

    let outcomes: Rc<RefCell<Vec<Option<Outcome>>>> =
        Rc::new(RefCell::new(vec![None; cli.names.len()]));

    for (index, name) in cli.names.iter().enumerate() {
        let on_success = outcomes.clone();
        let on_failure = outcomes.clone();
        let callbacks = Callbacks::new(
            move |response| on_success.borrow_mut()[index] = Some(Outcome::Answer(response)),
            move |error| on_failure.borrow_mut()[index] = Some(Outcome::Failed(error)),
        );

        let submitted = if cli.reverse {
            match name.parse::<IpAddr>() {
                Ok(ip) => resolver.reverse(ip, callbacks),
                Err(_) => Err(DomainError::InvalidIpAddress(name.clone())),
            }
        } else {
            resolver.query(name, record_type, callbacks)
        };

        if let Err(e) = submitted {
            debug!(name = %name, error = %e, "Lookup rejected");
            outcomes.borrow_mut()[index] = Some(Outcome::Rejected(e));
        }
    }

    resolver.run_until_idle().await;

    let mut all_succeeded = true;
    for (name, outcome) in cli.names.iter().zip(outcomes.borrow().iter()) {
        let Some(outcome) = outcome else {
            continue;
        };
        all_succeeded &= outcome.is_success();

        if cli.json {
            println!("{}", output::render_json(name, record_type, outcome));
        } else {
            println!("{}", output::render_text(name, outcome));
        }
    }

    Ok(if all_succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
