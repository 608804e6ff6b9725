//! CLI structure and command definitions
//!
//! The fixed part of the interface (global flags, `operations`, `profile`,
//! `version`, `completions`) is declared with clap's derive API. Every remote
//! operation adds one more subcommand generated from its descriptor.

use clap::{ArgMatches, Args, Command, FromArgMatches, Subcommand};
use gluectl_core::{OperationDescriptor, operations};

pub mod operation;

pub use operation::{context_from_matches, operation_command};

const LONG_ABOUT: &str = "
Command-line access to AWS Glue operations

Every Glue operation is a subcommand. List operations page through results
automatically; pass --no-auto-iteration to fetch a single page.

EXAMPLES:
    # Set up a profile
    gluectl profile set prod --region eu-west-1

    # Fetch one blueprint
    gluectl get-blueprint --name nightly-etl

    # Every catalog, across all pages
    gluectl get-catalog-list --max-result 50

    # The whole response instead of the default field
    gluectl get-job --job-name nightly --select '*'

    # Echo an input back (useful in pipelines)
    gluectl start-crawler --name raw-events --select ^Name

    # Filter output with JMESPath
    gluectl get-job-list -q '[?WorkerType==`G.1X`].Name'

For the parameters of an operation, run:
    gluectl <command> --help
    gluectl operations describe <command>
";

/// Global flags shared by every subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Profile to use for this command
    #[arg(long, short, global = true, env = "GLUECTL_PROFILE")]
    pub profile: Option<String>,

    /// Path to alternate configuration file
    #[arg(long, global = true, env = "GLUECTL_CONFIG_FILE")]
    pub config_file: Option<String>,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value = "auto")]
    pub output: OutputFormat,

    /// JMESPath query to filter output
    #[arg(long, short = 'q', global = true)]
    pub query: Option<String>,

    /// Enable verbose logging
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Region used to derive the service endpoint
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Explicit service endpoint, overrides region and profile
    #[arg(long, global = true)]
    pub endpoint_url: Option<String>,
}

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Automatically choose format based on command and context
    #[default]
    Auto,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Human-readable table format
    Table,
}

impl From<OutputFormat> for crate::output::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Auto | OutputFormat::Json => crate::output::OutputFormat::Json,
            OutputFormat::Yaml => crate::output::OutputFormat::Yaml,
            OutputFormat::Table => crate::output::OutputFormat::Table,
        }
    }
}

/// Built-in commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Browse the supported operations
    #[command(subcommand, visible_alias = "ops")]
    #[command(after_help = "EXAMPLES:
    # Every operation
    gluectl operations list

    # Only crawler operations
    gluectl operations list --filter crawler

    # Parameters, paging and output of one operation
    gluectl operations describe Get-CatalogList
")]
    Operations(OperationsCommands),

    /// Profile management
    #[command(subcommand, visible_alias = "prof", visible_alias = "pr")]
    #[command(after_help = "EXAMPLES:
    # Create a profile for a region
    gluectl profile set prod --region eu-west-1

    # Create a profile for a local endpoint
    gluectl profile set local --endpoint-url http://localhost:4566 --timeout-secs 5

    # List all profiles
    gluectl profile list

    # Set the default profile
    gluectl profile default prod
")]
    Profile(ProfileCommands),

    /// Version information
    #[command(visible_alias = "ver", visible_alias = "v")]
    Version,

    /// Generate shell completions
    #[command(visible_alias = "comp")]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion generation
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bourne Again Shell
    Bash,
    /// Z Shell
    Zsh,
    /// Friendly Interactive Shell
    Fish,
    /// PowerShell
    #[value(name = "powershell", alias = "power-shell")]
    PowerShell,
    /// Elvish
    Elvish,
}

/// Operation catalog commands
#[derive(Subcommand, Debug, Clone)]
pub enum OperationsCommands {
    /// List supported operations
    #[command(visible_alias = "ls")]
    List {
        /// Only show operations whose name or command contains this text
        #[arg(long)]
        filter: Option<String>,
    },

    /// Show the parameters, output and paging of one operation
    #[command(visible_alias = "show")]
    Describe {
        /// Operation name, verb-noun command or subcommand name
        name: String,
    },
}

/// Profile management commands
#[derive(Subcommand, Debug, Clone)]
pub enum ProfileCommands {
    /// List all configured profiles
    #[command(visible_alias = "ls", visible_alias = "l")]
    List,

    /// Show the path to the configuration file
    Path,

    /// Show details of a specific profile
    #[command(visible_alias = "sh", visible_alias = "get")]
    Show {
        /// Profile name to show
        name: String,
    },

    /// Set or create a profile
    ///
    /// The profile takes its region and endpoint from the global --region
    /// and --endpoint-url flags.
    #[command(visible_alias = "add", visible_alias = "create")]
    Set {
        /// Profile name
        name: String,

        /// Request timeout in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Extra header sent with every request (NAME=VALUE, repeatable)
        #[arg(long = "header", value_name = "NAME=VALUE")]
        headers: Vec<String>,

        /// Make this the default profile
        #[arg(long)]
        default: bool,
    },

    /// Remove a profile
    #[command(visible_alias = "rm", visible_alias = "delete")]
    Remove {
        /// Profile name to remove
        name: String,
    },

    /// Set the default profile
    #[command(visible_alias = "def")]
    Default {
        /// Profile name to use by default
        name: String,
    },
}

/// What the command line asked for
#[derive(Debug)]
pub enum Invocation {
    Builtin(Commands),
    Operation {
        operation: &'static OperationDescriptor,
        matches: ArgMatches,
    },
}

/// Parsed command line
#[derive(Debug)]
pub struct Cli {
    pub global: GlobalArgs,
    pub invocation: Invocation,
}

impl Cli {
    /// Parse `std::env::args`, exiting with clap's usage error on failure
    pub fn parse() -> Self {
        Self::try_parse_from(std::env::args_os()).unwrap_or_else(|e| e.exit())
    }

    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = build_command().try_get_matches_from(args)?;
        Self::from_matches(matches)
    }

    fn from_matches(mut matches: ArgMatches) -> Result<Self, clap::Error> {
        let global = GlobalArgs::from_arg_matches(&matches)?;

        let is_builtin = matches
            .subcommand_name()
            .is_some_and(Commands::has_subcommand);
        if is_builtin {
            let command = Commands::from_arg_matches_mut(&mut matches)?;
            return Ok(Self {
                global,
                invocation: Invocation::Builtin(command),
            });
        }

        match matches.remove_subcommand() {
            Some((name, sub_matches)) => {
                let operation = operations::all()
                    .iter()
                    .find(|op| op.cli_name() == name)
                    .ok_or_else(|| {
                        clap::Error::raw(
                            clap::error::ErrorKind::InvalidSubcommand,
                            format!("unrecognized subcommand '{}'\n", name),
                        )
                    })?;
                Ok(Self {
                    global,
                    invocation: Invocation::Operation {
                        operation,
                        matches: sub_matches,
                    },
                })
            }
            None => Err(clap::Error::raw(
                clap::error::ErrorKind::MissingSubcommand,
                "a subcommand is required\n",
            )),
        }
    }
}

/// The full command tree: global flags, built-in commands and one
/// subcommand per operation
pub fn build_command() -> Command {
    let cmd = Command::new("gluectl")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Command-line access to AWS Glue operations")
        .long_about(LONG_ABOUT)
        .subcommand_required(true)
        .arg_required_else_help(true);
    let cmd = GlobalArgs::augment_args(cmd);
    let cmd = Commands::augment_subcommands(cmd);

    operations::all()
        .iter()
        .fold(cmd, |cmd, op| cmd.subcommand(operation_command(op)))
}
