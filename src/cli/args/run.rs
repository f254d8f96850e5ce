//! Arguments of the `run` command

use clap::Args;

use super::AuthArgs;
use crate::nuke::{DEFAULT_FORCE_SLEEP, MIN_FORCE_SLEEP, Parameters};

/// Tenant selection, scope narrowing and run behaviour.
///
/// List flags accept repeated and comma-separated values:
/// `--region eastus --region westus` or `--region eastus,westus`.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Tenant to nuke; must be listed under `accounts` in the config file
    #[arg(long, env = "AZURE_TENANT_ID", hide_env = true)]
    pub tenant_id: String,

    /// Only scan these subscriptions
    #[arg(
        long = "subscription-id",
        env = "AZURE_SUBSCRIPTION_ID",
        hide_env = true,
        value_delimiter = ','
    )]
    pub subscription_ids: Vec<String>,

    /// Regions to scan (overrides the config file); `global` adds tenant and
    /// subscription scoped types, `all` disables region filtering
    #[arg(long = "region", value_delimiter = ',')]
    pub regions: Vec<String>,

    /// Only scan these resource types
    #[arg(long = "include", value_delimiter = ',')]
    pub includes: Vec<String>,

    /// Never scan these resource types
    #[arg(long = "exclude", value_delimiter = ',')]
    pub excludes: Vec<String>,

    /// Hide filtered resources from the output
    #[arg(long, short = 'q')]
    pub quiet: bool,

    /// Actually delete resources
    #[arg(long)]
    pub no_dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(long = "no-prompt", visible_alias = "force")]
    pub force: bool,

    /// Seconds to wait before deleting when the prompt is skipped
    #[arg(
        long = "prompt-delay",
        visible_alias = "force-sleep",
        default_value_t = DEFAULT_FORCE_SLEEP,
        value_parser = clap::value_parser!(u64).range(MIN_FORCE_SLEEP..)
    )]
    pub force_sleep: u64,

    /// Wait until removed resources are gone before removing their dependents
    #[arg(long)]
    pub wait_on_dependencies: bool,

    #[command(flatten)]
    pub auth: AuthArgs,
}

impl RunArgs {
    pub fn parameters(&self) -> Parameters {
        Parameters {
            force: self.force,
            force_sleep: self.force_sleep,
            quiet: self.quiet,
            no_dry_run: self.no_dry_run,
            includes: self.includes.clone(),
            excludes: self.excludes.clone(),
            wait_on_dependencies: self.wait_on_dependencies,
            ..Parameters::default()
        }
    }
}
