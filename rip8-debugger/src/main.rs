use std::{env, time::Duration};

use debugger::{
    DEFAULT_HOST, DEFAULT_PEEK_WINDOW_SIZE, DEFAULT_POLL_INTERVAL_MS, DebugSession, HELP_TEXT,
    HttpTransport, SessionConfig, TerminalView, ViewConfig, init_logging, spawn_console,
};
use tokio::sync::mpsc;
use tracing::{info, warn};

const MIN_INTERVAL_MS: u64 = 100;
const MAX_INTERVAL_MS: u64 = 60_000;
const OPERATOR_QUEUE_DEPTH: usize = 64;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = match parse_cli_args() {
        Ok(CliAction::Run(cli)) => cli,
        Ok(CliAction::Help) => {
            print_cli_help();
            return Ok(());
        }
        Ok(CliAction::Version) => {
            println!("{}", binary_version_text());
            return Ok(());
        }
        Err(err) => {
            eprintln!("error: {err}\n");
            print_cli_help();
            return Err(err.into());
        }
    };

    init_logging()?;
    info!("{}", binary_version_text());

    let host = match cli.host {
        Some(host) => host,
        None => env::var("RIP8_DEBUGGER_HOST")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string()),
    };
    let requested_interval = cli.interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS);
    let interval_ms = requested_interval.clamp(MIN_INTERVAL_MS, MAX_INTERVAL_MS);
    if interval_ms != requested_interval {
        warn!("--interval-ms {requested_interval} out of range, using {interval_ms}");
    }

    let mut view = ViewConfig::default();
    if !view.set_window_size(cli.window_size.unwrap_or(DEFAULT_PEEK_WINDOW_SIZE)) {
        let err = "--window-size must be greater than zero".to_string();
        eprintln!("error: {err}\n");
        print_cli_help();
        return Err(err.into());
    }

    let transport = HttpTransport::new(&host, cli.request_timeout_ms.map(Duration::from_millis))?;
    info!(
        "debugging target at {} (poll every {interval_ms} ms, follow={})",
        transport.base_url(),
        cli.follow
    );

    let config = SessionConfig {
        poll_interval: Duration::from_millis(interval_ms),
        view,
    };
    let session = DebugSession::new(transport, TerminalView::stdout(cli.follow), config);

    let (operator_tx, operator_rx) = mpsc::channel(OPERATOR_QUEUE_DEPTH);
    print!("{HELP_TEXT}");
    let _console = spawn_console(operator_tx);

    session
        .run(operator_rx, async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!("failed to listen for ctrl-c: {err}");
                std::future::pending::<()>().await;
            }
        })
        .await;
    info!("debugger stopped");
    // The console thread may still be blocked on a read.
    std::process::exit(0);
}

#[derive(Clone, Debug, Default)]
struct CliArgs {
    host: Option<String>,
    interval_ms: Option<u64>,
    window_size: Option<usize>,
    request_timeout_ms: Option<u64>,
    follow: bool,
}

enum CliAction {
    Run(CliArgs),
    Help,
    Version,
}

fn parse_cli_args() -> Result<CliAction, String> {
    parse_args(env::args().skip(1))
}

fn parse_args(args: impl Iterator<Item = String>) -> Result<CliAction, String> {
    let mut args = args.peekable();
    let mut cli = CliArgs::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(CliAction::Help),
            "-V" | "--version" => return Ok(CliAction::Version),
            "--host" => {
                cli.host = Some(next_arg_value("--host", &mut args)?);
            }
            "--interval-ms" => {
                let value = next_arg_value("--interval-ms", &mut args)?;
                cli.interval_ms = Some(
                    value
                        .parse::<u64>()
                        .map_err(|_| format!("invalid --interval-ms: {value}"))?,
                );
            }
            "--window-size" => {
                let value = next_arg_value("--window-size", &mut args)?;
                cli.window_size = Some(
                    value
                        .parse::<usize>()
                        .map_err(|_| format!("invalid --window-size: {value}"))?,
                );
            }
            "--request-timeout-ms" => {
                let value = next_arg_value("--request-timeout-ms", &mut args)?;
                cli.request_timeout_ms = Some(
                    value
                        .parse::<u64>()
                        .map_err(|_| format!("invalid --request-timeout-ms: {value}"))?,
                );
            }
            "--follow" => cli.follow = true,
            _ => {
                return Err(format!("unknown argument: {arg}"));
            }
        }
    }
    Ok(CliAction::Run(cli))
}

fn next_arg_value(
    flag: &str,
    args: &mut std::iter::Peekable<impl Iterator<Item = String>>,
) -> Result<String, String> {
    let value = args
        .next()
        .ok_or_else(|| format!("missing value for {flag}"))?;
    if value.trim().is_empty() {
        return Err(format!("value for {flag} cannot be empty"));
    }
    Ok(value)
}

fn print_cli_help() {
    eprintln!(concat!(
        "Usage: rip8-debugger [options]\n\n",
        "Options:\n",
        "  --host <URL>                 Debug server base URL (default: $RIP8_DEBUGGER_HOST or http://localhost:8000)\n",
        "  --interval-ms <MS>           Poll interval, clamped to 100..60000 (default: 1000)\n",
        "  --window-size <BYTES>        Bytes shown around the peeked address (default: 64)\n",
        "  --request-timeout-ms <MS>    Per-request timeout (default: none)\n",
        "  --follow                     Print panels as they change\n",
        "  -V, --version                Show version with git metadata\n",
        "  -h, --help                   Show this help\n"
    ));
}

fn binary_version_text() -> String {
    let binary = env!("CARGO_PKG_NAME");
    let git_tag = option_env!("RIP8_BUILD_GIT_TAG").unwrap_or("untagged");
    let git_commit = option_env!("RIP8_BUILD_GIT_COMMIT").unwrap_or("unknown");
    let git_dirty = option_env!("RIP8_BUILD_GIT_DIRTY").unwrap_or("false");
    let dirty = matches!(git_dirty, "true" | "1" | "yes" | "dirty");

    if dirty {
        format!("{binary} {git_tag} (dirty commit: {git_commit})")
    } else {
        format!("{binary} {git_tag}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliAction, String> {
        parse_args(args.iter().map(|arg| arg.to_string()))
    }

    #[test]
    fn parses_run_flags() {
        let Ok(CliAction::Run(cli)) = parse(&[
            "--host",
            "http://10.0.0.2:8000",
            "--interval-ms",
            "250",
            "--window-size",
            "32",
            "--follow",
        ]) else {
            panic!("flags should parse");
        };
        assert_eq!(cli.host.as_deref(), Some("http://10.0.0.2:8000"));
        assert_eq!(cli.interval_ms, Some(250));
        assert_eq!(cli.window_size, Some(32));
        assert_eq!(cli.request_timeout_ms, None);
        assert!(cli.follow);
    }

    #[test]
    fn help_and_version_short_circuit() {
        assert!(matches!(parse(&["-h", "--bogus"]), Ok(CliAction::Help)));
        assert!(matches!(parse(&["-V"]), Ok(CliAction::Version)));
    }

    #[test]
    fn rejects_bad_values() {
        assert_eq!(
            parse(&["--interval-ms", "soon"]).err(),
            Some("invalid --interval-ms: soon".to_string())
        );
        assert_eq!(
            parse(&["--host"]).err(),
            Some("missing value for --host".to_string())
        );
        assert_eq!(
            parse(&["--host", " "]).err(),
            Some("value for --host cannot be empty".to_string())
        );
        assert_eq!(
            parse(&["--verbose"]).err(),
            Some("unknown argument: --verbose".to_string())
        );
    }
}
