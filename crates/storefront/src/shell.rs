//! Terminal command parsing.
//!
//! Each input line is one command. Commands are parsed with clap in
//! multicall mode, so the first word selects the subcommand and the rest
//! are its arguments. Multi-word titles and values are taken verbatim from
//! the remaining words.
//!
//! ```text
//! open wahl magic clip
//! qty 2 Wahl Magic Clip
//! set password hunter22
//! ```

use core::fmt::Write as _;

use clap::{CommandFactory, Parser, Subcommand};
use thiserror::Error;

use capelli_core::CredentialKind;

use crate::screens::{Action, Field};

/// Errors from parsing a command line.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("Unknown command `{0}`; type `help` for a list")]
    UnknownCommand(String),

    /// Missing or malformed arguments; carries clap's usage message.
    #[error("{0}")]
    Usage(String),
}

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    Action(Action),
}

#[derive(Debug, Parser)]
#[command(multicall = true, disable_help_subcommand = true)]
struct Shell {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Debug, Subcommand)]
enum ShellCommand {
    /// List commands
    Help,
    /// Leave the storefront
    #[command(alias = "exit")]
    Quit,
    /// Go back one screen
    Back,
    /// Go to the home screen
    Home,
    /// Open the cart
    Cart,
    /// Open the account screen
    Account,
    /// Retry the last failed load
    Retry,
    /// Pick a category from the menu
    Menu {
        #[arg(required = true, num_args = 1..)]
        category: Vec<String>,
    },
    /// Search products by title
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Open a product by title
    Open {
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
    },
    /// Add the open product to the cart, or view the cart once added
    Add,
    /// Set the quantity of a cart line
    Qty {
        quantity: String,
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
    },
    /// Remove a cart line
    Remove {
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
    },
    /// Proceed to checkout
    Checkout,
    /// Choose or add a shipping address
    Ship,
    /// Submit the order
    Order,
    /// Select the address at a position
    Address { index: usize },
    /// Edit the address at a position
    EditAddress { index: usize },
    /// Remove the address at a position
    RemoveAddress { index: usize },
    /// Add a new address
    NewAddress,
    /// Manage saved addresses
    Addresses,
    /// Manage login credentials
    Credentials,
    /// Pick a credential to change (email, username, password)
    Credential { kind: CredentialKind },
    /// Log out
    Logout,
    /// Open the login form
    Login,
    /// Open the sign up form
    Signup,
    /// Fill in a form field
    Set {
        field: Field,
        #[arg(num_args = 0..)]
        value: Vec<String>,
    },
    /// Submit the current form
    Submit,
}

impl From<ShellCommand> for Command {
    fn from(command: ShellCommand) -> Self {
        let action = match command {
            ShellCommand::Help => return Self::Help,
            ShellCommand::Quit => return Self::Quit,
            ShellCommand::Back => Action::Back,
            ShellCommand::Home => Action::Home,
            ShellCommand::Cart => Action::Cart,
            ShellCommand::Account => Action::Account,
            ShellCommand::Retry => Action::Retry,
            ShellCommand::Menu { category } => Action::SelectCategory(category.join(" ")),
            ShellCommand::Search { query } => Action::Search(query.join(" ")),
            ShellCommand::Open { title } => Action::OpenProduct(title.join(" ")),
            ShellCommand::Add => Action::AddToCart,
            ShellCommand::Qty { quantity, title } => Action::SetLineQuantity {
                title: title.join(" "),
                input: quantity,
            },
            ShellCommand::Remove { title } => Action::RemoveLine(title.join(" ")),
            ShellCommand::Checkout => Action::Checkout,
            ShellCommand::Ship => Action::ChooseShipping,
            ShellCommand::Order => Action::SubmitOrder,
            ShellCommand::Address { index } => Action::SelectAddress(index),
            ShellCommand::EditAddress { index } => Action::EditAddress(index),
            ShellCommand::RemoveAddress { index } => Action::RemoveAddress(index),
            ShellCommand::NewAddress => Action::NewAddress,
            ShellCommand::Addresses => Action::EditAddresses,
            ShellCommand::Credentials => Action::EditCredentials,
            ShellCommand::Credential { kind } => Action::SelectCredential(kind),
            ShellCommand::Logout => Action::Logout,
            ShellCommand::Login => Action::Login,
            ShellCommand::Signup => Action::SignUp,
            ShellCommand::Set { field, value } => Action::SetField(field, value.join(" ")),
            ShellCommand::Submit => Action::Submit,
        };
        Self::Action(action)
    }
}

/// Parse one input line. Blank lines parse to `None`.
///
/// # Errors
///
/// Returns `ShellError::UnknownCommand` for an unrecognised first word and
/// `ShellError::Usage` for bad arguments.
pub fn parse(line: &str) -> Result<Option<Command>, ShellError> {
    let mut words: Vec<String> = line.split_whitespace().map(String::from).collect();
    let Some(first) = words.first_mut() else {
        return Ok(None);
    };
    first.make_ascii_lowercase();
    if Shell::command().find_subcommand(first.as_str()).is_none() {
        return Err(ShellError::UnknownCommand(first.clone()));
    }

    Shell::try_parse_from(words)
        .map(|shell| Some(shell.command.into()))
        .map_err(|e| ShellError::Usage(e.to_string().trim_end().to_string()))
}

/// One line per command, with its arguments and description.
#[must_use]
pub fn help() -> String {
    let command = Shell::command();
    let mut out = String::new();
    for sub in command.get_subcommands() {
        let args = sub
            .get_positionals()
            .map(|arg| format!(" <{}>", arg.get_id()))
            .collect::<String>();
        let usage = format!("{}{args}", sub.get_name());
        let about = sub.get_about().map(ToString::to_string).unwrap_or_default();
        let _ = writeln!(out, "  {usage:<32}{about}");
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn action(line: &str) -> Action {
        match parse(line).unwrap() {
            Some(Command::Action(action)) => action,
            other => panic!("expected an action for {line:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_blank_line() {
        assert!(parse("   ").unwrap().is_none());
    }

    #[test]
    fn test_multi_word_arguments() {
        assert_eq!(
            action("open  Wahl Magic   Clip"),
            Action::OpenProduct("Wahl Magic Clip".to_string())
        );
        assert_eq!(
            action("qty 2 Wahl Magic Clip"),
            Action::SetLineQuantity {
                title: "Wahl Magic Clip".to_string(),
                input: "2".to_string(),
            }
        );
        assert_eq!(
            action("set line1 1 Main St"),
            Action::SetField(Field::Line1, "1 Main St".to_string())
        );
        assert_eq!(action("set line2"), Action::SetField(Field::Line2, String::new()));
    }

    #[test]
    fn test_typed_arguments() {
        assert_eq!(
            action("credential password"),
            Action::SelectCredential(CredentialKind::Password)
        );
        assert_eq!(action("remove-address 1"), Action::RemoveAddress(1));
        assert_eq!(
            action("set confirm-email a@b.co"),
            Action::SetField(Field::ConfirmEmail, "a@b.co".to_string())
        );
    }

    #[test]
    fn test_first_word_is_case_insensitive() {
        assert_eq!(action("CART"), Action::Cart);
        assert_eq!(parse("exit").unwrap(), Some(Command::Quit));
        assert_eq!(parse("help").unwrap(), Some(Command::Help));
    }

    #[test]
    fn test_unknown_command() {
        let err = parse("dance now").unwrap_err();
        assert!(matches!(err, ShellError::UnknownCommand(ref name) if name == "dance"));
        assert_eq!(err.to_string(), "Unknown command `dance`; type `help` for a list");
    }

    #[test]
    fn test_bad_arguments() {
        assert!(matches!(parse("address first"), Err(ShellError::Usage(_))));
        assert!(matches!(parse("open"), Err(ShellError::Usage(_))));
        assert!(matches!(parse("credential pin"), Err(ShellError::Usage(_))));
        assert!(matches!(parse("set phone 555"), Err(ShellError::Usage(_))));
    }

    #[test]
    fn test_help_lists_commands() {
        let help = help();
        assert!(help.contains("search <query>"));
        assert!(help.contains("edit-address <index>"));
        assert!(help.contains("Submit the order"));
    }
}
