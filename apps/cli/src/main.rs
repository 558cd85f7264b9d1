use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Result};
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use scanner::{PushoverNotifier, RunManager};
use shared::{
    domain::{CompletionPolicy, Venue},
    protocol::{ContinuousScanRequest, InstantGrabRequest},
    time::time_bank,
};
use site_driver::ForeUpFactory;
use tokio::{signal, time::interval};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Parser, Debug)]
#[command(name = "teetime", about = "Grab or watch ForeUp tee times from the terminal")]
struct Cli {
    #[arg(long, env = "APP__WEBDRIVER_URL", default_value = "http://localhost:9515")]
    webdriver_url: Url,
    #[arg(long, env = "APP__VENUE", default_value = "mission")]
    venue: Venue,
    #[arg(long, env = "APP__TIMEZONE", default_value = "America/Los_Angeles")]
    timezone: String,
    #[arg(long, env = "APP__ELEMENT_TIMEOUT_SECONDS", default_value_t = 30)]
    element_timeout_seconds: u64,
    #[arg(long, env = "APP__HEADLESS")]
    headless: bool,
    #[arg(long, env = "TEETIME_USERNAME")]
    username: Option<String>,
    #[arg(long, env = "TEETIME_PASSWORD", hide_env_values = true)]
    password: Option<String>,
    #[arg(long, env = "PUSHOVER_TOKEN", hide_env_values = true)]
    pushover_token: Option<String>,
    #[arg(long, env = "PUSHOVER_USER", hide_env_values = true)]
    pushover_user: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every tee time the course offers.
    Times,
    /// Wait for the release instant, then open one tee time for booking.
    Grab {
        #[arg(long)]
        date: String,
        #[arg(long, default_value = "7:57am")]
        time: String,
        #[arg(long, default_value_t = 2)]
        people: u8,
        #[arg(long, default_value_t = 19)]
        wait_hour: u32,
        #[arg(long, default_value_t = 0)]
        wait_minute: u32,
    },
    /// Re-check the tee sheet until a time inside the window shows up.
    Scan {
        #[arg(long)]
        date: String,
        #[arg(long, default_value = "10:00am")]
        start: String,
        #[arg(long, default_value = "2:00pm")]
        end: String,
        #[arg(long, default_value_t = 2)]
        people: u8,
        #[arg(long, default_value_t = 60)]
        interval: u64,
        #[arg(long)]
        notify: bool,
        #[arg(long)]
        auto_book: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();
    if let Command::Times = cli.command {
        for time in time_bank() {
            println!("{time}");
        }
        return Ok(());
    }

    let zone: Tz = cli
        .timezone
        .parse()
        .map_err(|e| anyhow!("unknown timezone '{}': {e}", cli.timezone))?;
    let factory = ForeUpFactory {
        webdriver_url: cli.webdriver_url.clone(),
        venue: cli.venue,
        element_timeout: Duration::from_secs(cli.element_timeout_seconds),
        settle: Duration::from_secs(1),
        headless: cli.headless,
    };
    info!(
        venue = %factory.venue,
        webdriver = %factory.webdriver_url,
        %zone,
        "tee sheet driver configured"
    );
    let mut runs = RunManager::new(Arc::new(factory), zone);
    let notifier = PushoverNotifier::new(cli.pushover_token.clone(), cli.pushover_user.clone());
    if notifier.is_configured() {
        runs = runs.with_notifier(Arc::new(notifier));
    } else if notify_requested(&cli.command) {
        warn!("pushover credentials missing; scan notifications are disabled");
    }

    let summary = start(&runs, &cli)?;
    info!(%summary, "run started");
    println!("{summary}");
    follow(&runs).await
}

fn start(runs: &RunManager, cli: &Cli) -> Result<String, scanner::StartError> {
    match &cli.command {
        Command::Times => Ok(String::new()),
        Command::Grab {
            date,
            time,
            people,
            wait_hour,
            wait_minute,
        } => {
            let started = runs.start_instant_grab(InstantGrabRequest {
                username: cli.username.clone(),
                password: cli.password.clone(),
                num_people: Some(*people),
                target_date: Some(date.clone()),
                reservation_time: Some(time.clone()),
                wait_until: None,
                wait_hour: Some(*wait_hour),
                wait_minute: Some(*wait_minute),
            })?;
            Ok(format!(
                "{}: {} on {} at {}",
                started.message, started.reservation_time, started.target_date, started.wait_until
            ))
        }
        Command::Scan {
            date,
            start,
            end,
            people,
            interval,
            notify,
            auto_book,
        } => {
            let started = runs.start_continuous_scan(ContinuousScanRequest {
                username: cli.username.clone(),
                password: cli.password.clone(),
                num_people: Some(*people),
                target_date: Some(date.clone()),
                start_time: Some(start.clone()),
                end_time: Some(end.clone()),
                scan_interval: Some(*interval),
                enable_notifications: *notify,
                completion_policy: if *auto_book {
                    CompletionPolicy::AutoBookFirstMatch
                } else {
                    CompletionPolicy::NotifyOnly
                },
            })?;
            Ok(format!(
                "{}: {} between {}",
                started.message, started.target_date, started.time_range
            ))
        }
    }
}

fn notify_requested(command: &Command) -> bool {
    matches!(command, Command::Scan { notify: true, .. })
}

/// Prints status lines until the run ends. Ctrl-C asks it to stop.
async fn follow(runs: &RunManager) -> Result<()> {
    let mut ticker = interval(POLL_INTERVAL);
    let mut stopping = false;
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            res = signal::ctrl_c(), if !stopping => {
                res?;
                stopping = true;
                runs.stop();
            }
        }

        let snapshot = runs.status();
        for line in snapshot.messages {
            println!("{line}");
        }
        if !snapshot.is_running {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_flags_parse_with_defaults() {
        let cli = Cli::try_parse_from([
            "teetime",
            "--venue",
            "torrey",
            "scan",
            "--date",
            "2026-02-14",
            "--auto-book",
        ])
        .expect("args");
        assert_eq!(cli.venue, Venue::Torrey);
        match cli.command {
            Command::Scan {
                start,
                end,
                interval,
                auto_book,
                notify,
                ..
            } => {
                assert_eq!(start, "10:00am");
                assert_eq!(end, "2:00pm");
                assert_eq!(interval, 60);
                assert!(auto_book);
                assert!(!notify);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn only_scans_with_notify_want_pushover() {
        let scan = Cli::try_parse_from(["teetime", "scan", "--date", "2026-02-14", "--notify"])
            .expect("args");
        assert!(notify_requested(&scan.command));

        let quiet = Cli::try_parse_from(["teetime", "scan", "--date", "2026-02-14"]).expect("args");
        assert!(!notify_requested(&quiet.command));

        let grab = Cli::try_parse_from(["teetime", "grab", "--date", "2026-02-14"]).expect("args");
        assert!(!notify_requested(&grab.command));
    }

    #[test]
    fn grab_requires_a_date() {
        assert!(Cli::try_parse_from(["teetime", "grab"]).is_err());
    }
}
