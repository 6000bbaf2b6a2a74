use anyhow::Result;

use super::Registry;
use crate::cli::{CheckLogoutRedirectArgs, CheckPermissionArgs, CheckRedirectArgs, OutputFormat};
use crate::output::print_check;

pub async fn check_permission(
    registry: &Registry,
    args: &CheckPermissionArgs,
    format: OutputFormat,
) -> Result<bool> {
    let record = registry.find(&args.client_id).await?;
    let granted = registry.manager.has_permission(&record, &args.permission)?;

    let verdict = if granted { "holds" } else { "lacks" };
    print_check(
        granted,
        &format!("{} {verdict} {}", args.client_id, args.permission),
        format,
    );
    Ok(granted)
}

pub async fn check_redirect(
    registry: &Registry,
    args: &CheckRedirectArgs,
    format: OutputFormat,
) -> Result<bool> {
    let record = registry.find(&args.client_id).await?;
    let registered = registry.manager.validate_redirect_uri(&record, &args.uri)?;

    let verdict = if registered { "is" } else { "is not" };
    print_check(
        registered,
        &format!("{} {verdict} a redirect URI of {}", args.uri, args.client_id),
        format,
    );
    Ok(registered)
}

pub async fn check_logout_redirect(
    registry: &Registry,
    args: &CheckLogoutRedirectArgs,
    format: OutputFormat,
) -> Result<bool> {
    let accepted = registry
        .manager
        .validate_post_logout_redirect_uri(&args.uri, &registry.cancel)
        .await?;

    let verdict = if accepted { "accepted" } else { "rejected" };
    print_check(
        accepted,
        &format!("Post-logout redirect {} {verdict}", args.uri),
        format,
    );
    Ok(accepted)
}
