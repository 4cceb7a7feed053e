//! `sestest generate` - mint a new entitlement token.

use clap::Args;
use std::path::PathBuf;
use tracing::error;

use common::timestamp::format_timestamp;
use entitlements::{EncryptionKey, SigningKey, TokenGenerator, TokenProperties};

use crate::commands::{EXIT_INTERNAL_ERROR, EXIT_OK, EXIT_VALIDATION_FAILED};
use crate::source::CommandLineSource;

/// Generate a token entitling applications to run on a machine.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Application id to entitle (repeat for multiple applications)
    #[arg(long = "application-id", value_name = "ID")]
    pub applications: Vec<String>,

    /// IP address of the entitled machine (repeat for multiple;
    /// defaults to the addresses of this machine)
    #[arg(long = "address", value_name = "ADDR")]
    pub addresses: Vec<String>,

    /// Virtual machine identifier to bind into the token
    #[arg(long = "vmid", value_name = "VMID")]
    pub virtual_machine_id: Option<String>,

    /// Start of the validity window, as 'HH:mm d-MMM-yyyy' (default: now)
    #[arg(long = "not-before", value_name = "TIMESTAMP")]
    pub not_before: Option<String>,

    /// End of the validity window, as 'HH:mm d-MMM-yyyy' (default: seven
    /// days from now)
    #[arg(long = "not-after", value_name = "TIMESTAMP")]
    pub not_after: Option<String>,

    /// Audience to address the token to
    #[arg(long, value_name = "URL")]
    pub audience: Option<String>,

    /// Issuer to stamp into the token
    #[arg(long, value_name = "URL")]
    pub issuer: Option<String>,

    /// Identifier for the token (default: a fresh entitlement-<uuid>)
    #[arg(long = "token-id", value_name = "ID")]
    pub token_id: Option<String>,

    /// Base64 HMAC secret for signing; omit to emit an unsigned token
    #[arg(long = "sign-key", value_name = "KEY")]
    pub sign_key: Option<String>,

    /// Base64 32-byte key for encrypting the signed token
    #[arg(long = "encrypt-key", value_name = "KEY")]
    pub encrypt_key: Option<String>,

    /// Write the token to this file instead of stdout
    #[arg(long, short, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

pub fn run(args: &GenerateArgs) -> u8 {
    let source = CommandLineSource::new(args);
    let properties = match TokenProperties::build(&source).into_result() {
        Ok(properties) => properties,
        Err(errors) => {
            for message in &errors {
                eprintln!("{message}");
            }
            return EXIT_VALIDATION_FAILED;
        }
    };

    let signing_key = match args.sign_key.as_deref().map(SigningKey::hmac_base64) {
        None => None,
        Some(Ok(key)) => Some(key),
        Some(Err(e)) => {
            error!(target: "cli", error = %e, "unusable signing key");
            return EXIT_INTERNAL_ERROR;
        }
    };
    let encryption_key = match args.encrypt_key.as_deref().map(EncryptionKey::from_base64) {
        None => None,
        Some(Ok(key)) => Some(key),
        Some(Err(e)) => {
            error!(target: "cli", error = %e, "unusable encryption key");
            return EXIT_INTERNAL_ERROR;
        }
    };

    let token = match TokenGenerator::new(signing_key, encryption_key).generate(&properties) {
        Ok(token) => token,
        Err(e) => {
            error!(target: "cli", error = %e, "token generation failed");
            return EXIT_INTERNAL_ERROR;
        }
    };

    eprintln!(
        "Token {} valid from {} until {}",
        properties.identifier(),
        format_timestamp(properties.not_before()),
        format_timestamp(properties.not_after()),
    );

    match &args.output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, format!("{token}\n")) {
                error!(target: "cli", error = %e, path = %path.display(), "unable to write token");
                return EXIT_INTERNAL_ERROR;
            }
            EXIT_OK
        }
        None => {
            println!("{token}");
            EXIT_OK
        }
    }
}
