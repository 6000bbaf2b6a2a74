use anyhow::{Context, Result};
use appreg::{AbsoluteUri, ApplicationDescriptor, generate_client_secret};
use colored::Colorize;

use super::Registry;
use crate::cli::{CreateArgs, ListArgs, OutputFormat, PermissionArgs, ValidateArgs};
use crate::output::{
    print_generated_secret, print_record, print_records, print_success, print_violations,
};

fn parse_uris(uris: &[String]) -> Result<Vec<AbsoluteUri>> {
    uris.iter()
        .map(|uri| AbsoluteUri::parse(uri).with_context(|| format!("Invalid URI \"{uri}\"")))
        .collect()
}

fn build_descriptor(args: &CreateArgs, secret: Option<String>) -> Result<ApplicationDescriptor> {
    let mut descriptor =
        ApplicationDescriptor::new(&args.client_id).with_permissions(args.permissions.iter());

    if let Some(secret) = secret {
        descriptor = descriptor.with_secret(secret);
    }
    if let Some(client_type) = args.client_type {
        descriptor = descriptor.with_client_type(client_type.into());
    }
    if let Some(consent_type) = &args.consent_type {
        descriptor = descriptor.with_consent_type(consent_type);
    }
    if let Some(display_name) = &args.display_name {
        descriptor = descriptor.with_display_name(display_name);
    }

    descriptor.redirect_uris = parse_uris(&args.redirect_uris)?;
    descriptor.post_logout_redirect_uris = parse_uris(&args.post_logout_redirect_uris)?;
    Ok(descriptor)
}

pub async fn create(registry: &Registry, args: &CreateArgs, format: OutputFormat) -> Result<()> {
    let generated = args
        .generate_secret
        .then(|| generate_client_secret(registry.secret_bytes));
    let secret = args.secret.clone().or_else(|| generated.clone());

    let descriptor = build_descriptor(args, secret)?;
    let record = registry
        .manager
        .create_from_descriptor(&descriptor, &registry.cancel)
        .await?;
    registry.save()?;

    if let Some(secret) = &generated {
        print_generated_secret(secret);
    }
    print_success(&format!("Created {}", args.client_id.cyan()));
    print_record(&record, format);
    Ok(())
}

pub async fn list(registry: &Registry, args: &ListArgs, format: OutputFormat) -> Result<()> {
    let records = registry
        .manager
        .list(args.count, args.offset, &registry.cancel)
        .await?;
    let total = registry.manager.count(&registry.cancel).await?;
    print_records(&records, total, format);
    Ok(())
}

pub async fn show(registry: &Registry, client_id: &str, format: OutputFormat) -> Result<()> {
    let record = registry.find(client_id).await?;
    print_record(&record, format);
    Ok(())
}

pub async fn delete(registry: &Registry, client_id: &str) -> Result<()> {
    let record = registry.find(client_id).await?;
    registry.manager.delete(&record, &registry.cancel).await?;
    registry.save()?;
    print_success(&format!("Deleted {}", client_id.cyan()));
    Ok(())
}

pub async fn grant(registry: &Registry, args: &PermissionArgs, format: OutputFormat) -> Result<()> {
    let mut record = registry.find(&args.client_id).await?;
    let permissions = args.permissions.clone();
    registry
        .manager
        .update_with(
            &mut record,
            move |d| d.permissions.extend(permissions),
            &registry.cancel,
        )
        .await?;
    registry.save()?;

    print_success(&format!(
        "Granted {} to {}",
        args.permissions.join(", "),
        args.client_id.cyan()
    ));
    print_record(&record, format);
    Ok(())
}

pub async fn revoke(registry: &Registry, args: &PermissionArgs, format: OutputFormat) -> Result<()> {
    let mut record = registry.find(&args.client_id).await?;
    let permissions = args.permissions.clone();
    registry
        .manager
        .update_with(
            &mut record,
            move |d| d.permissions.retain(|p| !permissions.contains(p)),
            &registry.cancel,
        )
        .await?;
    registry.save()?;

    print_success(&format!(
        "Revoked {} from {}",
        args.permissions.join(", "),
        args.client_id.cyan()
    ));
    print_record(&record, format);
    Ok(())
}

/// Returns `false` if any checked application has violations.
pub async fn validate(registry: &Registry, args: &ValidateArgs, format: OutputFormat) -> Result<bool> {
    let records = match &args.client_id {
        Some(client_id) => vec![registry.find(client_id).await?],
        None => registry.manager.list(None, None, &registry.cancel).await?,
    };

    let mut all_valid = true;
    for record in &records {
        let violations = registry.manager.validate(record, &registry.cancel).await?;
        all_valid &= violations.is_empty();
        print_violations(record.client_id().unwrap_or("-"), &violations, format);
    }
    Ok(all_valid)
}
