//! Terminal front-end for the payment session countdown

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;

use payform_countdown::config::{Config, LogFormat};
use payform_countdown::logging::{init_logging, log_error, log_startup};
use payform_countdown::models::{format_mm_ss, CountdownConfig, Threshold, Urgency};
use payform_countdown::services::{CountdownService, SystemTimeProvider, TokioScheduler};

#[derive(Parser, Debug)]
#[command(name = "payform-countdown", version, about = "Payment session countdown")]
struct Args {
    /// Countdown length in seconds
    #[arg(short, long)]
    duration: Option<u64>,

    /// Milliseconds between wake-ups
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Print one JSON snapshot per tick instead of a label
    #[arg(long)]
    json: bool,

    /// Log output format (compact or json)
    #[arg(long)]
    log_format: Option<LogFormat>,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(duration) = self.duration {
            config.duration_seconds = duration;
        }
        if let Some(tick_ms) = self.tick_ms {
            config.tick_interval_ms = tick_ms;
        }
        if let Some(log_format) = self.log_format {
            config.log_format = log_format;
        }
    }
}

#[derive(Debug)]
enum Event {
    Tick(u64),
    Threshold(Threshold, u64),
    Completed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::from_env().context("failed to load configuration")?;
    args.apply(&mut config);
    config.validate().context("invalid configuration")?;

    init_logging(&config).context("failed to initialize logging")?;
    log_startup();
    config.log_config();

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let tick_tx = events_tx.clone();
    let one_third_tx = events_tx.clone();
    let two_thirds_tx = events_tx.clone();

    // Callbacks only forward events; rendering happens outside the countdown lock
    let countdown_config = CountdownConfig::new(config.duration_seconds)
        .on_tick(move |remaining| {
            let _ = tick_tx.send(Event::Tick(remaining));
        })
        .on_one_third_elapsed(move |remaining| {
            let _ = one_third_tx.send(Event::Threshold(Threshold::OneThird, remaining));
        })
        .on_two_thirds_elapsed(move |remaining| {
            let _ = two_thirds_tx.send(Event::Threshold(Threshold::TwoThirds, remaining));
        })
        .on_completed(move || {
            let _ = events_tx.send(Event::Completed);
        });

    let scheduler = TokioScheduler::try_current().inspect_err(|e| {
        log_error(&e.to_string(), e.error_code(), None);
    })?;
    let service = CountdownService::with_tick_interval(
        countdown_config,
        Arc::new(SystemTimeProvider::new()),
        Arc::new(scheduler),
        config.tick_interval(),
    );

    println!("{}", service.formatted_remaining());
    service.start();

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            event = events_rx.recv() => match event {
                Some(Event::Tick(remaining)) => {
                    if args.json {
                        match service.snapshot().to_json() {
                            Ok(line) => println!("{line}"),
                            Err(e) => log_error(&e.to_string(), e.error_code(), Some(service.id())),
                        }
                    } else {
                        let urgency = Urgency::from_remaining(remaining, config.duration_seconds);
                        println!("{} [{urgency}]", format_mm_ss(remaining));
                    }
                }
                Some(Event::Threshold(threshold, remaining)) => {
                    tracing::info!(threshold = %threshold, remaining, "Threshold reached");
                }
                Some(Event::Completed) => {
                    println!("{}", config.expired_message);
                    break;
                }
                None => break,
            },
            result = &mut shutdown => {
                if let Err(e) = result {
                    log_error(&e.to_string(), "signal handler", Some(service.id()));
                }
                service.stop();
                tracing::info!("Interrupted, countdown stopped");
                break;
            }
        }
    }

    Ok(())
}
