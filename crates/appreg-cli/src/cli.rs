use std::path::PathBuf;

use appreg::ClientType;
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "appreg")]
#[command(about = "appreg CLI - manage OAuth 2.0 / OpenID Connect client applications")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Application snapshot file (overrides config and APPREG_STORE env var)
    #[arg(short, long, global = true, env = "APPREG_STORE")]
    pub store: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long, global = true, env = "APPREG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register a new application
    Create(CreateArgs),
    /// List applications
    List(ListArgs),
    /// Show an application
    Show(ClientArgs),
    /// Delete an application
    Delete(ClientArgs),
    /// Grant permissions to an application
    Grant(PermissionArgs),
    /// Revoke permissions from an application
    Revoke(PermissionArgs),
    /// Replace or clear an application's secret
    SetSecret(SetSecretArgs),
    /// Check a client secret against the stored hash
    VerifySecret(VerifySecretArgs),
    /// Check whether an application holds a permission
    CheckPermission(CheckPermissionArgs),
    /// Check whether a redirect URI is registered for an application
    CheckRedirect(CheckRedirectArgs),
    /// Check whether a post-logout redirect URI is accepted
    CheckLogoutRedirect(CheckLogoutRedirectArgs),
    /// Re-run validation on stored applications
    Validate(ValidateArgs),
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ClientTypeArg {
    Public,
    Confidential,
    Hybrid,
}

impl From<ClientTypeArg> for ClientType {
    fn from(arg: ClientTypeArg) -> Self {
        match arg {
            ClientTypeArg::Public => ClientType::Public,
            ClientTypeArg::Confidential => ClientType::Confidential,
            ClientTypeArg::Hybrid => ClientType::Hybrid,
        }
    }
}

#[derive(clap::Args)]
pub struct CreateArgs {
    /// Client identifier
    pub client_id: String,
    /// Client secret (the application becomes confidential unless --client-type says otherwise)
    #[arg(long, conflicts_with = "generate_secret")]
    pub secret: Option<String>,
    /// Generate a random client secret and print it once
    #[arg(long)]
    pub generate_secret: bool,
    /// Client type (inferred from the secret when omitted)
    #[arg(long)]
    pub client_type: Option<ClientTypeArg>,
    /// Consent type (explicit, external, implicit, systematic)
    #[arg(long)]
    pub consent_type: Option<String>,
    /// Display name
    #[arg(long)]
    pub display_name: Option<String>,
    /// Permission to grant (repeatable)
    #[arg(long = "permission")]
    pub permissions: Vec<String>,
    /// Redirect URI (repeatable)
    #[arg(long = "redirect-uri")]
    pub redirect_uris: Vec<String>,
    /// Post-logout redirect URI (repeatable)
    #[arg(long = "post-logout-redirect-uri")]
    pub post_logout_redirect_uris: Vec<String>,
}

#[derive(clap::Args)]
pub struct ListArgs {
    /// Maximum number of applications
    #[arg(long)]
    pub count: Option<usize>,
    /// Number of applications to skip
    #[arg(long)]
    pub offset: Option<usize>,
}

#[derive(clap::Args)]
pub struct ClientArgs {
    /// Client identifier
    pub client_id: String,
}

#[derive(clap::Args)]
pub struct PermissionArgs {
    /// Client identifier
    pub client_id: String,
    /// Permissions (e.g. endpoint:token grant_type:client_credentials)
    #[arg(required = true)]
    pub permissions: Vec<String>,
}

#[derive(clap::Args)]
#[command(group(ArgGroup::new("source").required(true).args(["secret", "generate", "clear"])))]
pub struct SetSecretArgs {
    /// Client identifier
    pub client_id: String,
    /// New client secret
    #[arg(long)]
    pub secret: Option<String>,
    /// Generate a random client secret and print it once
    #[arg(long)]
    pub generate: bool,
    /// Remove the stored secret
    #[arg(long)]
    pub clear: bool,
}

#[derive(clap::Args)]
pub struct VerifySecretArgs {
    /// Client identifier
    pub client_id: String,
    /// Secret to verify
    pub secret: String,
}

#[derive(clap::Args)]
pub struct CheckPermissionArgs {
    /// Client identifier
    pub client_id: String,
    /// Permission name
    pub permission: String,
}

#[derive(clap::Args)]
pub struct CheckRedirectArgs {
    /// Client identifier
    pub client_id: String,
    /// Redirect URI
    pub uri: String,
}

#[derive(clap::Args)]
pub struct CheckLogoutRedirectArgs {
    /// Post-logout redirect URI
    pub uri: String,
}

#[derive(clap::Args)]
pub struct ValidateArgs {
    /// Client identifier (all applications when omitted)
    pub client_id: Option<String>,
}
