use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "snippet-api")]
#[command(about = "Snippet API - multi-user code snippet manager over HTTP")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Port to listen on (overrides API_PORT)")]
        port: Option<u16>,
    },

    #[command(about = "Create the database tables and exit")]
    InitDb,
}

impl Cli {
    /// The subcommand to run; a bare invocation serves.
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve { port: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_invocation_serves() {
        let cli = Cli::parse_from(["snippet-api"]);
        assert!(matches!(cli.command(), Commands::Serve { port: None }));
    }

    #[test]
    fn parses_subcommands() {
        let cli = Cli::parse_from(["snippet-api", "serve", "--port", "9000"]);
        assert!(matches!(cli.command(), Commands::Serve { port: Some(9000) }));

        let cli = Cli::parse_from(["snippet-api", "init-db"]);
        assert!(matches!(cli.command(), Commands::InitDb));
    }
}
