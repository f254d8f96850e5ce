//! `run` command: discover the tenant, compose scanners and hand them to the engine

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use tokio_util::sync::CancellationToken;

use crate::azure::Tenant;
use crate::azure::auth::configure_auth;
use crate::cli::RunArgs;
use crate::cli::prompt;
use crate::config::{AccountConfig, GLOBAL_FILTER_KEY, NukeConfig};
use crate::error::{ConfigError, Error, Result};
use crate::nuke::{Nuke, Parameters};
use crate::resources;
use crate::scanner::{self, TypeSelection};

/// Pause between removal passes
const RUN_SLEEP: Duration = Duration::from_secs(5);

pub async fn run(
    config_path: Option<&Path>,
    args: &RunArgs,
    cancel: &CancellationToken,
) -> Result<()> {
    let config = NukeConfig::load(config_path)?;
    let account = config.account(&args.tenant_id)?;
    let registry = Arc::new(resources::registry());

    let regions = effective_regions(&args.regions, &config.regions)?;
    let mut filters = config.filters(&args.tenant_id, &registry)?;
    if let Some(region_filter) = scanner::region_filter(&regions) {
        filters
            .entry(GLOBAL_FILTER_KEY.to_string())
            .or_default()
            .push(region_filter);
    }

    let authorizers = Arc::new(configure_auth(&args.auth.options(&args.tenant_id))?);
    let api = authorizers.arm_client();

    let spinner = spinner("Discovering subscriptions and resource groups...");
    let discovery = Tenant::discover_with_deadline(
        &api,
        authorizers.clone(),
        &args.tenant_id,
        &args.subscription_ids,
        &regions,
    );
    let tenant = tokio::select! {
        _ = cancel.cancelled() => Err(Error::Cancelled),
        tenant = discovery => tenant,
    };
    spinner.finish_and_clear();
    let tenant = tenant?;
    info!(
        "tenant {}: {} subscriptions, {} resource groups",
        tenant.id,
        tenant.subscription_ids.len(),
        tenant.resource_groups.values().map(Vec::len).sum::<usize>()
    );

    let params = args.parameters();
    let selection = type_selection(&params, &config, account);
    let units = scanner::compose(&tenant, &registry, &selection, &regions)?;

    let mut nuke = Nuke::new(params.clone(), filters, registry);
    nuke.register_version(format!("> {}", env!("CARGO_PKG_VERSION")));
    nuke.register_prompt(prompt::for_tenant(&tenant.id, &params));
    nuke.set_run_sleep(RUN_SLEEP);
    for unit in units {
        nuke.register_scanner(unit.scope, unit)?;
    }
    info!("{} scanner units registered", nuke.units().len());

    nuke.run(cancel).await
}

/// Regions from the command line win over the config file.
fn effective_regions(cli: &[String], config: &[String]) -> Result<Vec<String>> {
    let regions = if cli.is_empty() { config } else { cli };
    if regions.is_empty() {
        return Err(ConfigError::Invalid(
            "no regions to scan; set `regions` in the config file or pass --region".to_string(),
        )
        .into());
    }
    Ok(regions.to_vec())
}

/// Command line, then global config, then tenant config.
fn type_selection(
    params: &Parameters,
    config: &NukeConfig,
    account: &AccountConfig,
) -> TypeSelection {
    TypeSelection::new()
        .layer(&params.includes, &params.excludes)
        .layer(&config.resource_types.includes, &config.resource_types.excludes)
        .layer(&account.resource_types.includes, &account.resource_types.excludes)
}

fn spinner(message: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) =
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")
    {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_cli_regions_override_config() {
        let config = strings(&["global", "eastus"]);
        let regions = effective_regions(&strings(&["westus"]), &config).unwrap();
        assert_eq!(regions, vec!["westus"]);

        let regions = effective_regions(&[], &config).unwrap();
        assert_eq!(regions, vec!["global", "eastus"]);

        assert!(matches!(
            effective_regions(&[], &[]),
            Err(Error::Config(ConfigError::Invalid(_)))
        ));
    }

    #[test]
    fn test_type_selection_layer_order() {
        let cli = Cli::try_parse_from([
            "azure-nuke",
            "run",
            "--tenant-id",
            "t1",
            "--exclude",
            "Disk",
        ])
        .unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };

        let config = NukeConfig::from_yaml(
            "resource-types:\n  includes: [VirtualMachine, Disk]\naccounts:\n  t1:\n    resource-types:\n      excludes: [VirtualMachine]\n",
        )
        .unwrap();
        let account = config.account("t1").unwrap();

        let selection = type_selection(&args.parameters(), &config, account);
        assert_eq!(
            selection.includes,
            vec![Vec::new(), strings(&["VirtualMachine", "Disk"]), Vec::new()]
        );
        assert_eq!(
            selection.excludes,
            vec![strings(&["Disk"]), Vec::new(), strings(&["VirtualMachine"])]
        );
    }
}
