//! # Preço Entry Point
//!
//! ```text
//! preco <command>  ──► stdout: result          exit 0
//!                  ──► stderr: error [CODE]    exit 1
//!                  ──► clap usage error        exit 2
//! ```
//!
//! With `--json`, errors are printed as JSON on stdout as well.

use clap::Parser;
use std::process::ExitCode;

use preco_cli::error::ApiError;
use preco_cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    preco_cli::init_tracing();

    let json = cli.json;
    match preco_cli::run(cli).await {
        Ok(out) => {
            if !out.is_empty() {
                println!("{}", out);
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            report_error(&err, json);
            ExitCode::FAILURE
        }
    }
}

fn report_error(err: &ApiError, json: bool) {
    if json {
        match serde_json::to_string_pretty(err) {
            Ok(text) => {
                println!("{}", text);
                return;
            }
            Err(e) => tracing::error!(error = %e, "Failed to serialize error"),
        }
    }

    if err.fields.is_empty() {
        eprintln!("error [{}]: {}", err.code, err.message);
    } else {
        eprintln!("error [{}]:", err.code);
        for field in &err.fields {
            eprintln!("  {}", field.message);
        }
    }
}
