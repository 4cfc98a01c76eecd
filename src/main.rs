use std::env;

use payoff::api::{CalcError, run_calc_command, run_http_server};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: payoff serve [port] | payoff calc [options] (see `payoff calc --help`)";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let raw_args: Vec<String> = env::args().collect();
    match raw_args.get(1).map(|s| s.as_str()) {
        Some("serve") => {
            let port = raw_args
                .get(2)
                .and_then(|s| s.parse::<u16>().ok())
                .unwrap_or(8080);
            if let Err(e) = run_http_server(port).await {
                eprintln!("Server error: {e}");
                std::process::exit(1);
            }
        }
        Some("calc") => {
            let args =
                std::iter::once("payoff calc".to_string()).chain(raw_args.into_iter().skip(2));
            match run_calc_command(args) {
                Ok(out) => print!("{out}"),
                Err(CalcError::Args(e)) => e.exit(),
                Err(e) => {
                    eprintln!("error: {e}");
                    std::process::exit(1);
                }
            }
        }
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
    }
}
