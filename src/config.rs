// ABOUTME: Version info, REPL banner, and REPL-only pseudo-commands

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const WELCOME_MESSAGE: &str = "interp REPL";
pub const WELCOME_SUBTITLE: &str = "A small expression-oriented scripting language";

pub const HISTORY_FILE: &str = ".interp_history";

pub const USAGE_TEXT: &str = "usage: interp [SCRIPT]\n\nRuns SCRIPT if given, otherwise starts an interactive REPL.";

/// REPL-only conveniences, recognized outside the language grammar itself.
pub enum ReplCommand {
    Quit,
    Clear,
}

/// Matches a trimmed line of REPL input against a pseudo-command.
pub fn lookup_repl_command(line: &str) -> Option<ReplCommand> {
    match line {
        ":quit" | ":q" => Some(ReplCommand::Quit),
        ":clear" => Some(ReplCommand::Clear),
        _ => None,
    }
}
