use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use std::io::{self, Write};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines},
    task::{JoinError, JoinHandle},
};
use tracing::{debug, warn};
use weather_core::{
    Config, LookupOutcome, LookupStatus, LookupTicket, WeatherViewModel, fetch_lookup,
    provider_from_config, render,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Current weather and daily forecast for a city")]
pub struct Cli {
    /// Log debug output, including raw provider responses.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and default city.
    Configure,

    /// Show weather for a city once and exit.
    Show {
        /// City name; the configured default city if absent.
        city: Option<String>,
    },

    /// Load the default city, then look up each city typed on stdin.
    Interactive,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command.unwrap_or(Command::Interactive) {
            Command::Configure => configure(),
            Command::Show { city } => show(Config::load_with_env()?, city).await,
            Command::Interactive => interactive(Config::load_with_env()?).await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key (leave empty to keep current):")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()?;
    if !api_key.trim().is_empty() {
        config.set_api_key(api_key.trim().to_string());
    }

    config.default_city = Text::new("Default city:")
        .with_default(&config.default_city)
        .prompt()?;

    let path = config.save()?;
    println!("Configuration saved to {}", path.display());

    Ok(())
}

async fn show(config: Config, city: Option<String>) -> anyhow::Result<()> {
    let provider = provider_from_config(&config)?;
    let mut vm = WeatherViewModel::new(provider, config.default_city.clone());

    match city {
        None => {
            vm.activate().await;
        }
        Some(city) => {
            vm.set_search_input(city);
            if let Err(err) = vm.search().await {
                debug!(error = %err, "search rejected");
            }
        }
    }

    ignore_broken_pipe(print_view(&mut io::stdout().lock(), &vm, &config).map_err(Into::into))
}

/// A lookup whose fetch runs as a separate task.
struct InFlight {
    ticket: LookupTicket,
    handle: JoinHandle<LookupOutcome>,
}

fn spawn_lookup(vm: &mut WeatherViewModel, city: &str) -> InFlight {
    let ticket = vm.begin(city);
    let provider = vm.provider();
    let city = city.to_string();

    let handle = tokio::spawn(async move { fetch_lookup(provider.as_ref(), &city).await });

    InFlight { ticket, handle }
}

async fn wait_lookup(inflight: &mut Option<InFlight>) -> Result<LookupOutcome, JoinError> {
    match inflight {
        Some(lookup) => (&mut lookup.handle).await,
        None => std::future::pending().await,
    }
}

async fn interactive(config: Config) -> anyhow::Result<()> {
    let provider = provider_from_config(&config)?;
    let mut vm = WeatherViewModel::new(provider, config.default_city.clone());
    let lines = BufReader::new(tokio::io::stdin()).lines();

    ignore_broken_pipe(run_interactive(&mut vm, lines, &mut io::stdout(), &config).await)
}

/// Load the default city, then treat every input line as a search until the
/// input ends. A lookup still running at end of input is awaited and shown.
async fn run_interactive<R, W>(
    vm: &mut WeatherViewModel,
    mut lines: Lines<R>,
    out: &mut W,
    config: &Config,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut inflight = Some(spawn_lookup(vm, &config.default_city));
    print_view(out, vm, config)?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read search input")? else {
                    break;
                };

                vm.set_search_input(line);
                if let Ok(city) = vm.submit_search() {
                    // A newer search supersedes whatever is still loading.
                    if let Some(previous) = inflight.take() {
                        debug!(city = previous.ticket.city(), "aborting superseded lookup");
                        previous.handle.abort();
                    }
                    inflight = Some(spawn_lookup(vm, &city));
                }
                print_view(out, vm, config)?;
            }
            joined = wait_lookup(&mut inflight) => {
                if let Some(InFlight { ticket, .. }) = inflight.take() {
                    apply_lookup(vm, out, config, &ticket, joined)?;
                }
            }
        }
    }

    if let Some(InFlight { ticket, handle }) = inflight {
        let joined = handle.await;
        apply_lookup(vm, out, config, &ticket, joined)?;
    }

    Ok(())
}

fn apply_lookup<W: Write>(
    vm: &mut WeatherViewModel,
    out: &mut W,
    config: &Config,
    ticket: &LookupTicket,
    joined: Result<LookupOutcome, JoinError>,
) -> anyhow::Result<()> {
    let status = match joined {
        Ok(outcome) => vm.finish(ticket, outcome),
        Err(err) => {
            warn!(city = ticket.city(), error = %err, "lookup task did not finish");
            vm.abandon(ticket)
        }
    };

    if status != LookupStatus::Superseded {
        print_view(out, vm, config)?;
    }
    Ok(())
}

fn print_view<W: Write>(out: &mut W, vm: &WeatherViewModel, config: &Config) -> io::Result<()> {
    writeln!(out)?;
    write!(out, "{}", render(vm.state(), &config.icon_base_url, &Local))?;
    out.flush()
}

/// A reader closing stdout (e.g. `weather show | head`) ends output quietly.
fn ignore_broken_pipe(result: anyhow::Result<()>) -> anyhow::Result<()> {
    match result {
        Err(err)
            if err
                .downcast_ref::<io::Error>()
                .is_some_and(|e| e.kind() == io::ErrorKind::BrokenPipe) =>
        {
            debug!("stdout closed by reader");
            Ok(())
        }
        other => other,
    }
}
