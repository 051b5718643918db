use clap::{ArgAction, Args, Parser, Subcommand};
use clap_complete::Shell;

use ammo_core::VERSION;

/// Ammo - an ammunition inventory ledger
#[derive(Parser)]
#[command(name = "ammo")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the ledger file
    #[arg(short, long, global = true, env = "AMMO_LEDGER_PATH")]
    pub ledger: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Use ASCII borders instead of Unicode
    #[arg(long, global = true)]
    pub ascii: bool,
}

/// Arguments for the `init` command
#[derive(Args)]
pub struct InitArgs {
    /// Path where the ledger will be created
    #[arg(value_name = "PATH")]
    pub path: Option<String>,

    /// Timezone for undated records (IANA name, default UTC)
    #[arg(long)]
    pub timezone: Option<String>,

    /// Config path override
    #[arg(long)]
    pub config_path: Option<String>,
}

/// Fields shared by single-record movements
#[derive(Args)]
pub struct MovementArgs {
    /// Item type (bullet_type code)
    #[arg(value_name = "TYPE")]
    pub bullet_type: String,

    /// Number of rounds
    #[arg(value_name = "QUANTITY", allow_negative_numbers = true)]
    pub quantity: i64,

    /// Usage the rounds are allocated to
    #[arg(long = "use", short = 'u', value_name = "USE")]
    pub usage: String,

    /// Free-text place
    #[arg(long)]
    pub place: Option<String>,

    /// Gun used or assigned
    #[arg(long)]
    pub gun: Option<String>,

    /// Category, when the item type has none
    #[arg(long)]
    pub category: Option<String>,

    /// Date or date/time (defaults to now)
    #[arg(long)]
    pub date: Option<String>,

    /// Free-text note
    #[arg(long)]
    pub note: Option<String>,

    /// Output the created IDs as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `event` command
#[derive(Args)]
pub struct EventArgs {
    /// Usage the event belongs to
    #[arg(long = "use", short = 'u', value_name = "USE")]
    pub usage: String,

    /// Item type, if rounds were involved
    #[arg(long = "type", value_name = "TYPE")]
    pub bullet_type: Option<String>,

    /// Signed quantity, if rounds moved
    #[arg(long, allow_negative_numbers = true)]
    pub quantity: Option<i64>,

    /// Category (used when no item type is given)
    #[arg(long)]
    pub category: Option<String>,

    /// Free-text place
    #[arg(long)]
    pub place: Option<String>,

    /// Gun used
    #[arg(long)]
    pub gun: Option<String>,

    /// Date or date/time (defaults to now)
    #[arg(long)]
    pub date: Option<String>,

    /// Outcome or note
    #[arg(long)]
    pub note: Option<String>,

    /// Output the created IDs as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `transfer` command
#[derive(Args)]
pub struct TransferArgs {
    /// Item type (bullet_type code)
    #[arg(value_name = "TYPE")]
    pub bullet_type: String,

    /// Number of rounds to move (sign is ignored)
    #[arg(value_name = "QUANTITY", allow_negative_numbers = true)]
    pub quantity: i64,

    /// Source usage
    #[arg(long)]
    pub from: String,

    /// Destination usage
    #[arg(long)]
    pub to: String,

    /// Gun the rounds are assigned to
    #[arg(long)]
    pub gun: Option<String>,

    /// Date or date/time (defaults to now)
    #[arg(long)]
    pub date: Option<String>,

    /// Output the created IDs as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `register` command
#[derive(Args)]
pub struct RegisterArgs {
    /// JSON payload (`-` or omitted reads stdin)
    #[arg(value_name = "JSON")]
    pub payload: Option<String>,

    /// Output the created IDs as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `list` command
#[derive(Args)]
pub struct ListArgs {
    /// Start date, inclusive
    #[arg(long)]
    pub from: Option<String>,

    /// End date, inclusive
    #[arg(long)]
    pub to: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Output format (table, plain)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<String>,
}

/// Arguments for commands that only render
#[derive(Args)]
pub struct ViewArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Output format (table, plain)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<String>,
}

/// Arguments for the `edit` command
#[derive(Args)]
pub struct EditArgs {
    /// Row position as shown by `ammo list`, or a transaction ID
    #[arg(value_name = "POSITION|ID", allow_hyphen_values = true)]
    pub target: String,

    /// New date
    #[arg(long)]
    pub date: Option<String>,

    /// New usage
    #[arg(long = "use", value_name = "USE")]
    pub usage: Option<String>,

    /// New item type (category is looked up again)
    #[arg(long = "type", value_name = "TYPE")]
    pub bullet_type: Option<String>,

    /// New category, used when the item type has none
    #[arg(long)]
    pub category: Option<String>,

    /// New signed quantity (empty clears it)
    #[arg(long, allow_hyphen_values = true)]
    pub quantity: Option<String>,

    /// New place (empty clears it)
    #[arg(long)]
    pub place: Option<String>,

    /// New gun (empty clears it)
    #[arg(long)]
    pub gun: Option<String>,

    /// New note (empty clears it)
    #[arg(long)]
    pub note: Option<String>,
}

/// Arguments for the `delete` command
#[derive(Args)]
pub struct DeleteArgs {
    /// Row position, as shown by `ammo list`
    #[arg(value_name = "POSITION", allow_hyphen_values = true)]
    pub position: String,
}

/// Arguments for the `import` command
#[derive(Args)]
pub struct ImportArgs {
    /// CSV file exported from the `main` sheet (`-` reads stdin)
    #[arg(value_name = "FILE")]
    pub file: String,
}

/// Arguments for the `export` command
#[derive(Args)]
pub struct ExportArgs {
    /// Output format (json, jsonl, csv)
    #[arg(long, default_value = "json")]
    pub format: String,

    /// Start date, inclusive
    #[arg(long)]
    pub from: Option<String>,

    /// End date, inclusive
    #[arg(long)]
    pub to: Option<String>,
}

/// Arguments for the `completions` command
#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_name = "SHELL")]
    pub shell: Shell,
}

#[derive(Subcommand)]
pub enum MasterSubcommand {
    /// List a reference table
    List {
        /// Table name (gun, bullet_type, place, use)
        #[arg(value_name = "TABLE")]
        table: String,

        #[command(flatten)]
        view: ViewArgs,
    },

    /// Add a row
    Add {
        /// Table name (gun, bullet_type, place, use)
        #[arg(value_name = "TABLE")]
        table: String,

        /// Column values as column=value
        #[arg(value_name = "FIELD", required = true)]
        fields: Vec<String>,
    },

    /// Replace a row
    Update {
        /// Table name (gun, bullet_type, place, use)
        #[arg(value_name = "TABLE")]
        table: String,

        /// Row position within the table
        #[arg(value_name = "POSITION", allow_hyphen_values = true)]
        position: String,

        /// Column values as column=value
        #[arg(value_name = "FIELD", required = true)]
        fields: Vec<String>,
    },

    /// Delete a row
    Delete {
        /// Table name (gun, bullet_type, place, use)
        #[arg(value_name = "TABLE")]
        table: String,

        /// Row position within the table
        #[arg(value_name = "POSITION", allow_hyphen_values = true)]
        position: String,
    },
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new ledger
    Init(InitArgs),

    /// Record rounds acquired
    Purchase(MovementArgs),

    /// Record rounds consumed (quantity is stored negative)
    Consume(MovementArgs),

    /// Record an outing, optionally with rounds moved
    Event(EventArgs),

    /// Move rounds from one usage to another
    Transfer(TransferArgs),

    /// Register a raw JSON intent
    Register(RegisterArgs),

    /// List transactions
    List(ListArgs),

    /// Show current stock per usage and item type
    Inventory(ViewArgs),

    /// Show reference tables and stock as one JSON document
    Meta,

    /// Replace fields of a transaction
    Edit(EditArgs),

    /// Delete a transaction
    Delete(DeleteArgs),

    /// Manage reference tables
    #[command(subcommand)]
    Master(MasterSubcommand),

    /// Import a CSV export of the legacy sheet
    Import(ImportArgs),

    /// Export transactions
    Export(ExportArgs),

    /// Check ledger integrity
    Check,

    /// Generate shell completions
    Completions(CompletionsArgs),
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
    fn test_negative_positions_reach_the_handler() {
        let cli = Cli::try_parse_from(["ammo", "delete", "-1"]).unwrap();
        match cli.command {
            Some(Commands::Delete(args)) => assert_eq!(args.position, "-1"),
            _ => panic!("expected delete"),
        }
    }

    #[test]
    fn test_edit_accepts_negative_and_empty_values() {
        let cli = Cli::try_parse_from(["ammo", "edit", "2", "--quantity", "-5", "--note", ""])
            .unwrap();
        match cli.command {
            Some(Commands::Edit(args)) => {
                assert_eq!(args.target, "2");
                assert_eq!(args.quantity.as_deref(), Some("-5"));
                assert_eq!(args.note.as_deref(), Some(""));
            }
            _ => panic!("expected edit"),
        }
    }

    #[test]
    fn test_purchase_args() {
        let cli = Cli::try_parse_from([
            "ammo", "purchase", "9mm", "50", "--use", "training", "--gun", "G1",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Purchase(args)) => {
                assert_eq!(args.bullet_type, "9mm");
                assert_eq!(args.quantity, 50);
                assert_eq!(args.usage, "training");
                assert_eq!(args.gun.as_deref(), Some("G1"));
            }
            _ => panic!("expected purchase"),
        }
    }
}
