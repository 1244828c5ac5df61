use clap::Parser;
use std::path::PathBuf;

/// keypad_backlightd: keypad and keyboard backlight policy daemon
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// YAML config file path (default: /etc/keypad_backlightd/config.yml)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Detach from the terminal and run in the background
    #[arg(short = 'd', long = "daemonize", default_value = "false")]
    pub daemonize: bool,

    /// Log debug messages
    #[arg(short = 'v', long = "verbose", default_value = "false")]
    pub verbose: bool,
}
