//! Commands exposed by the selection manager.
//!
//! Commands are plain values so they can be bound to keys, sent over the
//! manager's input channel, or parsed from a command palette entry.

use std::str::FromStr;

use crate::CoreError;

/// Commands a user or collaborator can invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Resume highlighting
    Enable,
    /// Pause highlighting and clear every highlight
    Disable,
    /// Select every highlighted range of the active document
    SelectAll,
    /// Fold everything except highlighted lines
    FoldNonSelected,
    /// Undo `FoldNonSelected`
    UnfoldNonSelected,
    /// Fold if unfolded, unfold if folded
    ToggleFoldNonSelected,
    /// Tear the manager down
    Destroy,
}

impl Command {
    /// Every command, in palette order.
    pub const ALL: [Command; 7] = [
        Command::Enable,
        Command::Disable,
        Command::SelectAll,
        Command::FoldNonSelected,
        Command::UnfoldNonSelected,
        Command::ToggleFoldNonSelected,
        Command::Destroy,
    ];

    /// Stable identifier, used for key bindings and parsing.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Enable => "beacon:enable",
            Command::Disable => "beacon:disable",
            Command::SelectAll => "beacon:select-all",
            Command::FoldNonSelected => "beacon:fold-non-selected",
            Command::UnfoldNonSelected => "beacon:unfold-non-selected",
            Command::ToggleFoldNonSelected => "beacon:toggle-fold-non-selected",
            Command::Destroy => "beacon:destroy",
        }
    }

    /// Returns the command's display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Command::Enable => "Enable Highlighting",
            Command::Disable => "Disable Highlighting",
            Command::SelectAll => "Select All Highlights",
            Command::FoldNonSelected => "Fold Non-Highlighted Lines",
            Command::UnfoldNonSelected => "Unfold Non-Highlighted Lines",
            Command::ToggleFoldNonSelected => "Toggle Fold of Non-Highlighted Lines",
            Command::Destroy => "Stop Highlighting",
        }
    }
}

impl FromStr for Command {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::ALL
            .into_iter()
            .find(|command| command.name() == s)
            .ok_or_else(|| CoreError::CommandNotFound(s.to_string()))
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_display_name() {
        assert_eq!(Command::SelectAll.display_name(), "Select All Highlights");
        assert_eq!(Command::Disable.to_string(), "beacon:disable");
    }

    #[test]
    fn test_parse_every_command_name() {
        for command in Command::ALL {
            assert_eq!(command.name().parse::<Command>().unwrap(), command);
        }
    }

    #[test]
    fn test_parse_unknown_command() {
        let err = "beacon:explode".parse::<Command>().unwrap_err();
        assert!(matches!(err, CoreError::CommandNotFound(name) if name == "beacon:explode"));
    }
}
