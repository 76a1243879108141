//! chiliz-session CLI - replay wallet session scenarios
//!
//!   chiliz-session replay <scenario.json>   → run steps, print one line per step
//!   chiliz-session chains                   → configured target and allow-list
//!
//! Output format:
//!   --json     One JSON document per command (default for non-tty)
//!   --pretty   Pretty-print JSON
//!
//! Configuration comes from CHILIZ_* environment variables (see `WalletConfig::from_env`).

use chiliz_session::core::chains::chain_name;
use chiliz_session::logging::init_logging;
use chiliz_session::replay::Scenario;
use chiliz_session::runtime::install_signal_handlers;
use chiliz_session::service::WalletConfig;
use serde_json::{json, Value};
use std::env;
use std::io::IsTerminal;
use tracing::debug;

fn main() {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let opts = ParsedArgs::parse(&args[1..]);

    if opts.help {
        print_usage();
        return;
    }

    if opts.version {
        println!("chiliz-session {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let result = match opts.command.as_deref() {
        Some("replay") => cmd_replay(&opts),
        Some("chains") => cmd_chains(),
        Some(cmd) => Err(format!("Unknown command: {}", cmd)),
        None => {
            print_usage();
            return;
        }
    };

    let as_json = opts.json || opts.pretty || !std::io::stdout().is_terminal();
    match result {
        Ok(Output { json, lines }) => {
            if as_json {
                println!("{}", render(&json, opts.pretty));
            } else {
                for line in lines {
                    println!("{}", line);
                }
            }
        }
        Err(e) => {
            eprintln!("{}", render(&json!({ "error": e }), opts.pretty));
            std::process::exit(1);
        }
    }
}

struct Output {
    json: Value,
    lines: Vec<String>,
}

fn render(value: &Value, pretty: bool) -> String {
    let rendered = if pretty { serde_json::to_string_pretty(value) } else { serde_json::to_string(value) };
    rendered.unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e))
}

#[derive(Default)]
struct ParsedArgs {
    command: Option<String>,
    path: Option<String>,
    json: bool,
    pretty: bool,
    help: bool,
    version: bool,
}

impl ParsedArgs {
    fn parse(args: &[String]) -> Self {
        let mut opts = ParsedArgs::default();
        let mut positional = Vec::new();

        for arg in args {
            match arg.as_str() {
                "--help" | "-h" => opts.help = true,
                "--version" | "-V" => opts.version = true,
                "--json" => opts.json = true,
                "--pretty" => opts.pretty = true,
                _ => positional.push(arg.clone()),
            }
        }

        let mut positional = positional.into_iter();
        opts.command = positional.next();
        opts.path = positional.next();
        opts
    }
}

fn cmd_replay(opts: &ParsedArgs) -> Result<Output, String> {
    let path = opts.path.as_deref().ok_or("Usage: chiliz-session replay <scenario.json>")?;
    let scenario = Scenario::load(path).map_err(|e| format!("{:#}", e))?;
    debug!(path, steps = scenario.steps.len(), "replaying scenario");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start runtime: {}", e))?;

    let reports = runtime.block_on(async {
        let shutdown = install_signal_handlers();
        let mut stop = shutdown.subscribe();
        tokio::select! {
            reports = scenario.run() => Ok(reports),
            _ = stop.recv() => Err("Interrupted".to_string()),
        }
    })?;

    let lines = reports.iter().map(|report| report.line()).collect();
    let json = serde_json::to_value(&reports).map_err(|e| e.to_string())?;
    Ok(Output { json, lines })
}

fn cmd_chains() -> Result<Output, String> {
    let config = WalletConfig::from_env().map_err(|e| e.to_string())?;
    let target = config.chains.target();

    let chains: Vec<Value> = config
        .chains
        .iter()
        .map(|id| json!({ "chainId": id, "name": chain_name(id), "target": id == target }))
        .collect();
    let lines = config
        .chains
        .iter()
        .map(|id| format!("{}{:>7}  {}", if id == target { "*" } else { " " }, id, chain_name(id)))
        .collect();

    Ok(Output { json: json!({ "target": target, "chains": chains }), lines })
}

fn print_usage() {
    println!(
        r#"chiliz-session - wallet session state machine for Chiliz Chain

USAGE:
    chiliz-session <COMMAND> [OPTIONS]

COMMANDS:
    replay <scenario.json>   Replay a scripted session against the in-memory wallet
    chains                   Show the target chain and allow-list

OPTIONS:
    --json                   Output JSON (default when stdout is not a tty)
    --pretty                 Pretty-print JSON
    -h, --help               Show this help
    -V, --version            Show version

ENVIRONMENT:
    RUST_LOG                       Log filter (default: info)
    CHILIZ_SESSION_LOG_JSON=1      JSON logs on stderr
    CHILIZ_TARGET_CHAIN            Target chain id (default: 88888)
    CHILIZ_SUPPORTED_CHAINS        Extra accepted chain ids, comma-separated
    CHILIZ_CONNECT_TIMEOUT_MS      Handshake limit
    CHILIZ_REQUEST_TIMEOUT_MS      Disconnect/switch/restore limit
    CHILIZ_RECONNECT_ATTEMPTS      Restore attempts after a dropped session
    CHILIZ_RECONNECT_BACKOFF_MS    First reconnect delay, doubled per attempt
    CHILIZ_SESSION_TTL_SECS        Session lifetime, 0 to disable"#
    );
}
