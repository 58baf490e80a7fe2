//! Command-line interface of the `pingate` binary.

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

use pingate_shared::types::Currency;

/// PIN rotation and PIN-confirmed transfers from the terminal.
///
/// Keys are read line by line from stdin: digits, `<` for backspace, `c` to
/// clear, `ok` to submit, `back` to go back a step and `cancel` to leave.
#[derive(Parser, Debug)]
#[command(name = "pingate", version, propagate_version = true)]
pub struct PingateCli {
    /// Wait for `ok` instead of submitting on the last digit.
    #[arg(long, global = true)]
    pub manual_submit: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Change the account PIN.
    Rotate,
    /// Confirm a transfer with the account PIN.
    Confirm(ConfirmArgs),
}

/// Arguments for the `confirm` subcommand.
#[derive(Args, Debug)]
pub struct ConfirmArgs {
    /// Recipient wallet, phone number or account.
    #[arg(long)]
    pub recipient: String,

    /// Amount to send.
    #[arg(long)]
    pub amount: Decimal,

    /// ISO currency code.
    #[arg(long, default_value = "XAF")]
    pub currency: Currency,

    /// Note shown on the receipt.
    #[arg(long)]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        PingateCli::command().debug_assert();
    }

    #[test]
    fn test_parse_confirm() {
        let cli = PingateCli::parse_from([
            "pingate",
            "confirm",
            "--recipient",
            "+237670000000",
            "--amount",
            "50",
            "--currency",
            "xaf",
        ]);
        let Commands::Confirm(args) = cli.command else {
            panic!("expected confirm");
        };
        assert_eq!(args.amount, Decimal::from(50));
        assert_eq!(args.currency, Currency::Xaf);
        assert!(!cli.manual_submit);
    }

    #[test]
    fn test_manual_submit_flag_is_global() {
        let cli = PingateCli::parse_from(["pingate", "rotate", "--manual-submit"]);
        assert!(matches!(cli.command, Commands::Rotate));
        assert!(cli.manual_submit);
    }
}
