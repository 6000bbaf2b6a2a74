use anyhow::Result;
use appreg::generate_client_secret;
use colored::Colorize;

use super::Registry;
use crate::cli::{OutputFormat, SetSecretArgs, VerifySecretArgs};
use crate::output::{print_check, print_generated_secret, print_success};

pub async fn set_secret(registry: &Registry, args: &SetSecretArgs) -> Result<()> {
    let mut record = registry.find(&args.client_id).await?;

    let generated = args
        .generate
        .then(|| generate_client_secret(registry.secret_bytes));
    let secret = args.secret.as_deref().or(generated.as_deref());

    registry
        .manager
        .update_with_secret(&mut record, secret, &registry.cancel)
        .await?;
    registry.save()?;

    if let Some(secret) = &generated {
        print_generated_secret(secret);
    }
    let action = if secret.is_some() { "Updated" } else { "Cleared" };
    print_success(&format!("{action} secret of {}", args.client_id.cyan()));
    Ok(())
}

/// Returns `true` if the secret matches.
pub async fn verify_secret(
    registry: &Registry,
    args: &VerifySecretArgs,
    format: OutputFormat,
) -> Result<bool> {
    let record = registry.find(&args.client_id).await?;
    let valid = registry
        .manager
        .validate_client_secret(&record, &args.secret, &registry.cancel)
        .await?;

    let subject = if valid {
        format!("Secret accepted for {}", args.client_id)
    } else {
        format!("Secret rejected for {}", args.client_id)
    };
    print_check(valid, &subject, format);
    Ok(valid)
}
