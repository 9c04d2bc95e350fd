// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Offline driver for the admission checks and the machine conversions.
//!
//! The tool reads JSON or YAML from stdin (or a file) and prints its answer to stdout:
//!
//! * `admit` expects an `AdmissionReview` and prints the review holding the verdict, in JSON.
//! * `convert` expects a stream of objects holding one machine or machine set, plus the objects
//!   it needs, and prints a YAML reply with the converted objects or the errors found.

#![deny(clippy::all, clippy::pedantic)]

pub mod admit;
pub mod conversion;
pub mod reply;

use std::io::{self, Read};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use convert::ConversionOptions;
use convert::options::{DEFAULT_CAPI_NAMESPACE, DEFAULT_MAPI_NAMESPACE, DEFAULT_USER_DATA_SECRET};
use k8s_types::utils::load_object_from_str;
use kube_core::DynamicObject;
use kube_core::admission::AdmissionReview;

pub use reply::{ConvertReply, DriverError, ReplyError};

/// Admission checks and machine conversions, offline
#[derive(Parser, Debug)]
#[command(name = "mapi-validator")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log filter, e.g. `debug` or `mapi_convert=trace`. Overrides `RUST_LOG`.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Answer an AdmissionReview
    Admit(InputArgs),
    /// Convert a machine or machine set between the legacy and structured schemas
    Convert(ConvertArgs),
}

#[derive(Args, Debug)]
pub struct InputArgs {
    /// Read from this file instead of stdin
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Namespace of the produced structured objects
    #[arg(long, default_value = DEFAULT_CAPI_NAMESPACE)]
    pub capi_namespace: String,

    /// Namespace of the produced legacy objects
    #[arg(long, default_value = DEFAULT_MAPI_NAMESPACE)]
    pub mapi_namespace: String,

    /// Bootstrap secret used when the legacy machine names none
    #[arg(long, default_value = DEFAULT_USER_DATA_SECRET)]
    pub user_data_secret: String,
}

impl From<&ConvertArgs> for ConversionOptions {
    fn from(args: &ConvertArgs) -> Self {
        ConversionOptions {
            capi_namespace: args.capi_namespace.clone(),
            mapi_namespace: args.mapi_namespace.clone(),
            default_user_data_secret: args.user_data_secret.clone(),
        }
    }
}

/// What to print, and whether the request succeeded
#[derive(Debug)]
pub struct Outcome {
    pub output: String,
    pub success: bool,
}

impl InputArgs {
    fn origin(&self) -> String {
        self.file
            .as_ref()
            .map_or_else(|| "stdin".to_string(), |path| path.display().to_string())
    }

    fn read(&self) -> Result<String, DriverError> {
        if let Some(path) = &self.file {
            return std::fs::read_to_string(path).map_err(|e| {
                DriverError::Environment(format!("Failed to read {}: {e}", path.display()))
            });
        }
        let mut input = String::new();
        io::stdin()
            .read_to_string(&mut input)
            .map_err(|e| DriverError::Environment(format!("Failed to read from stdin: {e}")))?;
        Ok(input)
    }
}

fn run_admit(input: &str, origin: &str) -> Result<Outcome, DriverError> {
    let review: AdmissionReview<DynamicObject> = load_object_from_str(input, origin)
        .map_err(|e| DriverError::Deserialize(e.to_string()))?;
    let answer = admit::respond(review);
    let output = serde_json::to_string_pretty(&answer)
        .map_err(|e| DriverError::Environment(format!("Failed to encode AdmissionReview: {e}")))?;
    Ok(Outcome {
        output,
        success: true,
    })
}

fn run_convert(input: &str, options: &ConversionOptions) -> Result<Outcome, DriverError> {
    let reply = conversion::convert(input, options);
    let output = serde_yaml_ng::to_string(&reply)
        .map_err(|e| DriverError::Environment(format!("Failed to encode reply: {e}")))?;
    Ok(Outcome {
        output,
        success: reply.success,
    })
}

impl Cli {
    /// Run the command.
    ///
    /// A denied admission or a rejected conversion is a successful run that prints the verdict.
    ///
    /// # Errors
    /// Fails when the input cannot be read, or the admission review cannot be parsed or encoded.
    pub fn run(&self) -> Result<Outcome, DriverError> {
        match &self.command {
            Command::Admit(args) => run_admit(&args.read()?, &args.origin()),
            Command::Convert(args) => {
                run_convert(&args.input.read()?, &ConversionOptions::from(args))
            }
        }
    }
}
