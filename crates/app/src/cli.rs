use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use ledger::{Money, RecurrenceMode};

#[derive(Parser, Debug)]
#[command(name = "familyflow")]
#[command(about = "Shared household ledger")]
pub struct Cli {
    /// Optional config file path (TOML).
    #[arg(long, global = true)]
    pub config: Option<String>,
    /// `memory` or a sqlite file path.
    #[arg(long, global = true)]
    pub database: Option<String>,
    /// Signed-in profile id.
    #[arg(long, global = true, env = "FAMILYFLOW_PROFILE")]
    pub profile: Option<String>,
    /// Log level (e.g. `info`, `debug`).
    #[arg(long, global = true)]
    pub level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage the signed-in profile.
    Profile(Profile),
    /// Create, join and manage the family.
    Family(Family),
    /// Record and edit transactions.
    Tx(Tx),
    /// Summary of one month.
    Month(MonthArgs),
    /// Analytics for one calendar year.
    Year(YearArgs),
}

#[derive(Args, Debug)]
pub struct Profile {
    #[command(subcommand)]
    pub command: ProfileCommand,
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    Set {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: Option<String>,
    },
}

#[derive(Args, Debug)]
pub struct Family {
    #[command(subcommand)]
    pub command: FamilyCommand,
}

#[derive(Subcommand, Debug)]
pub enum FamilyCommand {
    Show,
    Create {
        name: String,
    },
    /// Look up a family by invite code without joining.
    Preview {
        code: String,
    },
    Join {
        code: String,
        /// Join right away instead of stopping at the preview.
        #[arg(long)]
        direct: bool,
    },
    /// Join a family previously shown by `preview` or `join`.
    Confirm {
        family_id: String,
    },
    Rename {
        name: String,
    },
    Leave,
    RemoveMember {
        profile_id: String,
    },
}

#[derive(Args, Debug)]
pub struct Tx {
    #[command(subcommand)]
    pub command: TxCommand,
}

#[derive(Subcommand, Debug)]
pub enum TxCommand {
    Add(TxAddArgs),
    Edit(TxEditArgs),
    /// Flip between paid and pending.
    Toggle {
        id: String,
    },
    Delete {
        id: String,
        /// Delete every entry of the transaction's series.
        #[arg(long)]
        series: bool,
    },
    /// Record an expense from a speech transcript.
    Voice {
        transcript: String,
        #[arg(long)]
        paid_by: Option<String>,
    },
}

#[derive(Args, Debug)]
pub struct TxAddArgs {
    pub description: String,
    /// Magnitude, e.g. `12,50`. Stored as an expense unless `--income`.
    #[arg(value_parser = parse_money)]
    pub amount: Money,
    #[arg(long)]
    pub income: bool,
    /// Defaults to today.
    #[arg(long)]
    pub date: Option<NaiveDate>,
    #[arg(long)]
    pub pending: bool,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub paid_by: Option<String>,
    #[arg(long, value_enum)]
    pub repeat: Option<Repeat>,
}

#[derive(Args, Debug)]
pub struct TxEditArgs {
    pub id: String,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long, value_parser = parse_money)]
    pub amount: Option<Money>,
    #[arg(long)]
    pub income: bool,
    #[arg(long)]
    pub date: Option<NaiveDate>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub paid_by: Option<String>,
    /// Also schedule future copies of the edited entry.
    #[arg(long, value_enum)]
    pub repeat: Option<Repeat>,
}

#[derive(Args, Debug)]
pub struct MonthArgs {
    #[arg(long)]
    pub year: Option<i32>,
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,
}

#[derive(Args, Debug)]
pub struct YearArgs {
    #[arg(long)]
    pub year: Option<i32>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Repeat {
    Monthly,
    Yearly,
}

impl From<Repeat> for RecurrenceMode {
    fn from(value: Repeat) -> Self {
        match value {
            Repeat::Monthly => RecurrenceMode::Monthly,
            Repeat::Yearly => RecurrenceMode::Yearly,
        }
    }
}

fn parse_money(raw: &str) -> Result<Money, String> {
    raw.parse::<Money>().map_err(|err| err.to_string())
}
