// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use mapi_validator::{Cli, ConvertReply};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.log_level.as_deref() {
        Some(directives) => EnvFilter::try_new(directives).ok(),
        None => EnvFilter::try_from_default_env().ok(),
    }
    .unwrap_or_else(|| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.run() {
        Ok(outcome) => {
            println!("{}", outcome.output);
            if outcome.success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            match serde_yaml_ng::to_string(&ConvertReply::from(e)) {
                Ok(out) => println!("{out}"),
                Err(e) => eprintln!("Failure serializing reply: {e}"),
            }
            ExitCode::FAILURE
        }
    }
}
