//! `sestest verify` - check a token against an application and address.

use anyhow::{bail, Context, Result};
use clap::Args;
use std::net::IpAddr;
use std::path::PathBuf;
use tracing::error;

use common::timestamp::format_timestamp;
use entitlements::{
    EncryptionKey, EntitlementVerifier, SigningKey, TokenReader, VerificationRequest,
};

use crate::commands::{EXIT_INTERNAL_ERROR, EXIT_OK, EXIT_VALIDATION_FAILED};

/// Verify that a token entitles an application to run at an address.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// The token itself
    #[arg(long, value_name = "TOKEN", conflicts_with = "token_file")]
    pub token: Option<String>,

    /// File containing the token
    #[arg(long = "token-file", value_name = "FILE")]
    pub token_file: Option<PathBuf>,

    /// Application id requesting the entitlement
    #[arg(long = "application-id", value_name = "ID")]
    pub application: String,

    /// IP address the application is running at
    #[arg(long = "address", value_name = "ADDR")]
    pub address: String,

    /// Expected audience (default: the generator's default audience)
    #[arg(long, value_name = "URL")]
    pub audience: Option<String>,

    /// Expected issuer (default: the generator's default issuer)
    #[arg(long, value_name = "URL")]
    pub issuer: Option<String>,

    /// Base64 HMAC secret the token was signed with; omit for unsigned
    /// tokens
    #[arg(long = "sign-key", value_name = "KEY")]
    pub sign_key: Option<String>,

    /// Base64 32-byte key the token was encrypted with
    #[arg(long = "encrypt-key", value_name = "KEY")]
    pub encrypt_key: Option<String>,
}

pub fn run(args: &VerifyArgs) -> u8 {
    let token = match load_token(args) {
        Ok(token) => token,
        Err(e) => {
            error!(target: "cli", error = %e, "unable to load token");
            return EXIT_INTERNAL_ERROR;
        }
    };

    let Ok(ip_address) = args.address.parse::<IpAddr>() else {
        eprintln!(
            "IP address '{}' is not in an expected format (IPv4 and IPv6 supported).",
            args.address
        );
        return EXIT_VALIDATION_FAILED;
    };

    let reader = match build_reader(args) {
        Ok(reader) => reader,
        Err(e) => {
            error!(target: "cli", error = %e, "unusable key material");
            return EXIT_INTERNAL_ERROR;
        }
    };

    let request = VerificationRequest::new(&args.application, ip_address);
    match EntitlementVerifier::new(reader)
        .verify_token(&token, &request)
        .into_result()
    {
        Ok(properties) => {
            println!(
                "Token {} entitles {} at {} until {}",
                properties.identifier(),
                args.application,
                ip_address,
                format_timestamp(properties.not_after()),
            );
            EXIT_OK
        }
        Err(errors) => {
            for message in &errors {
                eprintln!("{message}");
            }
            EXIT_VALIDATION_FAILED
        }
    }
}

fn load_token(args: &VerifyArgs) -> Result<String> {
    match (&args.token, &args.token_file) {
        (Some(token), _) => Ok(token.trim().to_string()),
        (None, Some(path)) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("unable to read token from {}", path.display()))?;
            Ok(contents.trim().to_string())
        }
        (None, None) => bail!("one of --token or --token-file is required"),
    }
}

fn build_reader(args: &VerifyArgs) -> Result<TokenReader> {
    let signing_key = args
        .sign_key
        .as_deref()
        .map(SigningKey::hmac_base64)
        .transpose()?;
    let encryption_key = args
        .encrypt_key
        .as_deref()
        .map(EncryptionKey::from_base64)
        .transpose()?;

    let mut reader = TokenReader::new(signing_key, encryption_key);
    if let Some(audience) = &args.audience {
        reader = reader.expecting_audience(audience);
    }
    if let Some(issuer) = &args.issuer {
        reader = reader.expecting_issuer(issuer);
    }
    Ok(reader)
}
