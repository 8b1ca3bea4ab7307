#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use owo_colors::OwoColorize;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::shell::format_sources;
use super::shell::help_text;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::TransportName;
use crate::infrastructure::catalogs::MockCatalog;

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

pub fn log_path() -> path::PathBuf {
    return dirs::cache_dir()
        .unwrap_or_default()
        .join("research-pal/debug.log");
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default_value(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(&config_file_path).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_debug() -> Command {
    return Command::new("debug")
        .about("Debug helpers for Research Pal")
        .hide(true)
        .subcommand(
            Command::new("log-path").about("Output path to debug log file generated when running Research Pal with environment variable RUST_LOG=research_pal")
        )
        .subcommand(
            Command::new("enum-config").about("List all config keys as strings.")
        );
}

fn subcommand_sources() -> Command {
    return Command::new("sources")
        .about("List the papers and documents available to chat with.")
        .arg(
            clap::Arg::new("query")
                .short('q')
                .long("query")
                .help("Only list sources whose title contains this text.")
                .num_args(1),
        );
}

fn arg_transport() -> Arg {
    return Arg::new(ConfigKey::Transport.to_string())
        .short('t')
        .long(ConfigKey::Transport.to_string())
        .env("RESEARCH_PAL_TRANSPORT")
        .num_args(1)
        .help(format!(
            "Transport used to reach the chat backend. [default: {}]",
            Config::default_value(ConfigKey::Transport)
        ))
        .value_parser(PossibleValuesParser::new(TransportName::VARIANTS))
        .global(true);
}

fn arg_api_url() -> Arg {
    return Arg::new(ConfigKey::ApiURL.to_string())
        .long(ConfigKey::ApiURL.to_string())
        .env("RESEARCH_PAL_API_URL")
        .num_args(1)
        .help(format!(
            "Base URL of the research backend API when using the sse transport. [default: {}]",
            Config::default_value(ConfigKey::ApiURL)
        ))
        .global(true);
}

fn arg_transport_health_check_timeout() -> Arg {
    return Arg::new(ConfigKey::TransportHealthCheckTimeout.to_string())
        .long(ConfigKey::TransportHealthCheckTimeout.to_string())
        .env("RESEARCH_PAL_TRANSPORT_HEALTH_CHECK_TIMEOUT")
        .num_args(1)
        .help(format!(
            "Milliseconds to wait before a transport health check times out. [default: {}]",
            Config::default_value(ConfigKey::TransportHealthCheckTimeout)
        ))
        .global(true);
}

fn arg_mock_chunk_delay() -> Arg {
    return Arg::new(ConfigKey::MockChunkDelay.to_string())
        .long(ConfigKey::MockChunkDelay.to_string())
        .env("RESEARCH_PAL_MOCK_CHUNK_DELAY")
        .num_args(1)
        .help(format!(
            "Milliseconds between words of the mock transport's canned reply. [default: {}]",
            Config::default_value(ConfigKey::MockChunkDelay)
        ))
        .global(true);
}

fn arg_papers() -> Arg {
    return Arg::new(ConfigKey::Papers.to_string())
        .short('p')
        .long(ConfigKey::Papers.to_string())
        .env("RESEARCH_PAL_PAPERS")
        .num_args(1)
        .help("Comma separated paper ids selected when a chat starts.")
        .global(true);
}

fn arg_documents() -> Arg {
    return Arg::new(ConfigKey::Documents.to_string())
        .short('d')
        .long(ConfigKey::Documents.to_string())
        .env("RESEARCH_PAL_DOCUMENTS")
        .num_args(1)
        .help("Comma separated document ids selected when a chat starts.")
        .global(true);
}

pub fn build() -> Command {
    let commands_text = help_text()
        .split('\n')
        .map(|line| {
            if line.starts_with('-') {
                return format!("  {line}");
            }
            if line.starts_with("COMMANDS:") {
                return format!("CHAT {line}").underline().bold().to_string();
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
    );

    return Command::new("research-pal")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(commands_text)
        .arg_required_else_help(false)
        .subcommand(Command::new("chat").about("Start a new chat session."))
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_debug())
        .subcommand(subcommand_sources())
        .arg(arg_transport())
        .arg(arg_api_url())
        .arg(arg_transport_health_check_timeout())
        .arg(arg_mock_chunk_delay())
        .arg(arg_papers())
        .arg(arg_documents())
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("RESEARCH_PAL_CONFIG_FILE")
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default_value(ConfigKey::ConfigFile)))
                .global(true)
        );
}

/// Handles one-shot subcommands. Returns the loaded config when a chat
/// session should start.
pub async fn parse() -> Result<Option<Config>> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("debug", debug_matches)) => {
            match debug_matches.subcommand() {
                Some(("log-path", _)) => {
                    println!("{}", log_path().to_string_lossy());
                }
                Some(("enum-config", _)) => {
                    let res = ConfigKey::VARIANTS.join("\n");
                    println!("{}", res);
                }
                _ => {
                    subcommand_debug().print_long_help()?;
                }
            }

            return Ok(None);
        }
        Some(("chat", subcmd_matches)) => {
            let config = Config::load(build(), vec![&matches, subcmd_matches]).await?;
            return Ok(Some(config));
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
            return Ok(None);
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(None);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(None);
            }
            Some(("path", _)) => {
                println!("{}", Config::default_value(ConfigKey::ConfigFile));
                return Ok(None);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(None);
            }
        },
        Some(("sources", subcmd_matches)) => {
            let query = subcmd_matches
                .get_one::<String>("query")
                .map(|e| return e.to_string())
                .unwrap_or_default();
            println!("{}", format_sources(&MockCatalog::default(), &query));
            return Ok(None);
        }
        _ => {
            let config = Config::load(build(), vec![&matches]).await?;
            return Ok(Some(config));
        }
    }
}
