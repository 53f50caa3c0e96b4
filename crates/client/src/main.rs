//! Replenish CLI - Main Entry Point
//!
//! Validates one inventory submission, asks the proxy for a forecast and
//! prints the result card.

use anyhow::Context;
use clap::{Arg, ArgAction, Command};
use replenish_client::{Field, PredictClient, Session};
use replenish_common::{Locale, Messages, ReplenishConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn cli() -> Command {
    Command::new("replenish")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Ask the forecasting service how much stock to reorder")
        .arg(
            Arg::new("item_name")
                .long("item-name")
                .default_value("")
                .help("Item name"),
        )
        .arg(
            Arg::new("current_balance")
                .long("current-balance")
                .default_value("")
                .help("Units currently in stock (0 to 100000)"),
        )
        .arg(
            Arg::new("consumption")
                .long("consumption")
                .default_value("")
                .help("Consumption rate, greater than zero"),
        )
        .arg(
            Arg::new("cogs")
                .long("cogs")
                .default_value("")
                .help("Cost of goods sold, greater than zero"),
        )
        .arg(
            Arg::new("proxy-url")
                .long("proxy-url")
                .help("Prediction endpoint (overrides client.proxy_url)"),
        )
        .arg(
            Arg::new("locale")
                .long("locale")
                .value_parser(["ar", "en"])
                .help("Message locale (overrides the configured locale)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Configuration file"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Print the view state as JSON"),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Logs go to stderr so stdout carries only the result
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "replenish_client=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let matches = cli().get_matches();

    let config = ReplenishConfig::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))
        .context("loading configuration")?;

    let locale = match matches.get_one::<String>("locale") {
        Some(locale) => locale.parse::<Locale>().map_err(anyhow::Error::msg)?,
        None => config.locale,
    };
    let messages = Messages::for_locale(locale);

    let mut client_config = config.client_or_default();
    if let Some(url) = matches.get_one::<String>("proxy-url") {
        client_config.proxy_url = url.clone();
    }
    let client = PredictClient::new(&client_config, messages).context("creating proxy client")?;

    let mut session = Session::new(client, messages);
    for field in Field::ALL {
        if let Some(value) = matches.get_one::<String>(field.name()) {
            session.set_field(field, value.as_str());
        }
    }

    let view = match session.submit().await {
        Ok(view) => view,
        Err(errors) => {
            for (field, message) in errors.iter() {
                eprintln!("{}: {}", field, message);
            }
            return Ok(ExitCode::from(2));
        }
    };

    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(view)?);
    } else {
        print!("{}", view.render());
    }

    Ok(if view.is_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
