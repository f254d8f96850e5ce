//! CLI command definitions and handlers

use std::path::PathBuf;

use clap::{Parser, Subcommand};
pub use clap_complete::Shell;

pub mod args;
pub mod completions;
pub mod prompt;
pub mod resource_types;
pub mod run;

pub use args::{AuthArgs, OutputFormat, RunArgs};

/// azure-nuke - remove all resources from an Azure tenant
#[derive(Parser, Debug)]
#[command(name = "azure-nuke")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to ./config.yaml)
    #[arg(long, short = 'c', global = true, env = "AZURE_NUKE_CONFIG", hide_env = true)]
    pub config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(
        long,
        short = 'l',
        global = true,
        env = "AZURE_NUKE_LOG_LEVEL",
        default_value = "info",
        hide_env = true
    )]
    pub log_level: String,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Nuke the resources of a tenant (dry run unless --no-dry-run)
    #[command(visible_alias = "nuke")]
    Run(Box<RunArgs>),

    /// List the supported resource types
    #[command(visible_alias = "list-resources")]
    ResourceTypes {
        /// Output format
        #[arg(long, short = 'o', value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Generate shell completions
    #[command(after_help = "\
Examples:
  bash:   azure-nuke completion bash > /etc/bash_completion.d/azure-nuke
  zsh:    azure-nuke completion zsh > \"${fpath[1]}/_azure-nuke\"
  fish:   azure-nuke completion fish > ~/.config/fish/completions/azure-nuke.fish")]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Display version information
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_flags_and_aliases() {
        let cli = Cli::try_parse_from([
            "azure-nuke",
            "nuke",
            "--tenant-id",
            "t1",
            "--region",
            "global,eastus",
            "--exclude",
            "SecurityPricing",
            "--force",
            "--force-sleep",
            "5",
        ])
        .unwrap();

        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.tenant_id, "t1");
        assert_eq!(args.regions, vec!["global", "eastus"]);
        assert_eq!(args.excludes, vec!["SecurityPricing"]);
        assert!(args.force);
        assert_eq!(args.force_sleep, 5);
        assert!(!args.no_dry_run);
        assert_eq!(args.auth.environment, "global");
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn test_force_sleep_minimum() {
        let result = Cli::try_parse_from([
            "azure-nuke",
            "run",
            "--tenant-id",
            "t1",
            "--prompt-delay",
            "2",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_run_reads_azure_environment_variables() {
        let command = Cli::command();
        let run = command.find_subcommand("run").unwrap();
        let env_of = |id: &str| {
            run.get_arguments()
                .find(|arg| arg.get_id() == id)
                .and_then(|arg| arg.get_env())
                .and_then(|env| env.to_str())
                .map(str::to_string)
        };

        assert_eq!(env_of("subscription_ids").as_deref(), Some("AZURE_SUBSCRIPTION_ID"));
        assert_eq!(
            env_of("client_certificate_file").as_deref(),
            Some("AZURE_CLIENT_CERTIFICATE_FILE")
        );
        assert_eq!(env_of("tenant_id").as_deref(), Some("AZURE_TENANT_ID"));
    }

    #[test]
    fn test_resource_types_alias() {
        let cli = Cli::try_parse_from(["azure-nuke", "list-resources", "--format", "json"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::ResourceTypes {
                format: OutputFormat::Json
            }
        ));
    }
}
