use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};
use muster_core::{CommandRouter, JsonFileStore};
use muster_gateway::{intake, report, telemetry, DiscordRest, Settings, VERSION};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;

fn config_arg() -> Arg {
    Arg::new("config")
        .long("config")
        .short('c')
        .required(true)
        .value_parser(clap::value_parser!(PathBuf))
        .help("Path to the settings TOML file")
}

fn cli() -> Command {
    Command::new("muster")
        .version(VERSION)
        .about("Rank-ladder community bot")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("serve")
                .about("Run the event intake and the bot")
                .arg(config_arg())
                .arg(
                    Arg::new("verbose")
                        .long("verbose")
                        .short('v')
                        .action(ArgAction::SetTrue)
                        .help("Log at debug level"),
                )
                .arg(
                    Arg::new("json-logs")
                        .long("json-logs")
                        .action(ArgAction::SetTrue)
                        .help("Emit logs as JSON lines"),
                ),
        )
        .subcommand(
            Command::new("check-config")
                .about("Validate settings and print the rank ladder")
                .arg(config_arg()),
        )
        .subcommand(
            Command::new("records")
                .about("Print stored promotion records as JSON")
                .arg(config_arg()),
        )
}

fn config_path(args: &ArgMatches) -> anyhow::Result<&Path> {
    args.get_one::<PathBuf>("config")
        .map(PathBuf::as_path)
        .context("--config is required")
}

fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    Settings::load(path).with_context(|| format!("failed to load settings from {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();

    match matches.subcommand() {
        Some(("serve", args)) => {
            telemetry::init(args.get_flag("verbose"), args.get_flag("json-logs"));
            serve(config_path(args)?).await
        }
        Some(("check-config", args)) => {
            let settings = load_settings(config_path(args)?)?;
            print!("{}", report::describe_config(&settings.bot)?);
            println!(
                "Gateway: guild={} listen={} api={} token from ${}",
                settings.gateway.guild_id,
                settings.gateway.listen,
                settings.gateway.api_base,
                settings.gateway.token_env
            );
            Ok(())
        }
        Some(("records", args)) => {
            let settings = load_settings(config_path(args)?)?;
            let store = JsonFileStore::open(&settings.bot.store_path);
            println!("{}", report::records_json(&store)?);
            Ok(())
        }
        other => anyhow::bail!("unknown command: {:?}", other.map(|(name, _)| name)),
    }
}

async fn serve(config: &Path) -> anyhow::Result<()> {
    let settings = load_settings(config)?;
    let platform = Arc::new(DiscordRest::from_settings(&settings)?);
    let store = Arc::new(JsonFileStore::open(&settings.bot.store_path));
    tracing::info!(
        guild = %settings.gateway.guild_id,
        records = %settings.bot.store_path.display(),
        "starting muster"
    );

    let listen = settings.gateway.listen;
    let secret = settings.gateway.intake_secret.clone();
    if secret.is_none() {
        tracing::warn!("no intake secret configured; any local process can submit events");
    }

    let router = CommandRouter::new(settings.bot, platform, store)?;
    let app = intake::routes(router, secret);
    let listener = TcpListener::bind(listen)
        .await
        .with_context(|| format!("failed to bind {listen}"))?;
    tracing::info!(%listen, "event intake listening");

    intake::serve(listener, app, shutdown_signal()).await?;
    tracing::info!("muster stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received ctrl-c, shutting down"),
        () = terminate => tracing::info!("received terminate signal, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn test_serve_flags_parse() {
        let matches = cli()
            .try_get_matches_from(["muster", "serve", "--config", "muster.toml", "--json-logs"])
            .unwrap();
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "serve");
        assert_eq!(config_path(args).unwrap(), Path::new("muster.toml"));
        assert!(args.get_flag("json-logs"));
        assert!(!args.get_flag("verbose"));
    }

    #[test]
    fn test_config_is_required() {
        assert!(cli().try_get_matches_from(["muster", "records"]).is_err());
    }
}
