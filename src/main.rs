use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{Context, Result};
use bci_bridge::{
    Actuation, BridgeConfig, CommandBridge, CommandDispatcher, CommandServer, GroundSensor,
    RecordingActuator,
};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Runs the command listener and a headless main loop that logs every force
/// the dispatcher emits.
#[derive(Debug, Parser)]
#[command(name = "bci_bridge", version, about)]
struct Args {
    /// Interface to bind (overrides BCI_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides BCI_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Main-loop ticks per second (overrides BCI_TICK_HZ)
    #[arg(long)]
    tick_hz: Option<u32>,

    /// Start with the player airborne, so `lift` is ignored
    #[arg(long)]
    airborne: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();
    let mut config = BridgeConfig::from_env().context("failed to load configuration")?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(tick_hz) = args.tick_hz {
        config.tick_hz = tick_hz;
    }
    config.validate().context("invalid configuration")?;

    let mut ground = GroundSensor::default();
    if !args.airborne {
        ground.contact_begin(GroundSensor::DEFAULT_TAG);
    }
    let player = Rc::new(RefCell::new(
        CommandDispatcher::new(config.dispatch.clone(), RecordingActuator::with_ground(ground))
            .context("invalid dispatch configuration")?,
    ));

    let mut bridge = CommandBridge::new();
    bridge.subscribe(player.clone());

    // A failed bind leaves the loop running without network input.
    let server = if config.server.start_on_play {
        match CommandServer::start(&config.server, bridge.queue()) {
            Ok(handle) => Some(handle),
            Err(err) => {
                error!(error = %err, "failed to start command server");
                None
            }
        }
    } else {
        info!("start_on_play disabled, command server not started");
        None
    };

    let mut ticker = tokio::time::interval(config.tick_interval());
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let shutdown = termination();
    tokio::pin!(shutdown);

    info!(tick_hz = config.tick_hz, "main loop running");
    loop {
        tokio::select! {
            signal = &mut shutdown => {
                info!(signal, "shutting down");
                break;
            }
            _ = ticker.tick() => {
                if let Err(err) = bridge.tick() {
                    warn!(error = %err, "command drain failed");
                }

                let mut player = player.borrow_mut();
                player.update();
                for actuation in player.actuator_mut().take_actuations() {
                    log_actuation(&actuation);
                }
            }
        }
    }

    bridge.unsubscribe(&player);
    if let Some(server) = server {
        server.stop().context("failed to stop command server")?;
    }
    info!("shutdown complete");
    Ok(())
}

fn log_actuation(actuation: &Actuation) {
    let direction = actuation.direction();
    match actuation {
        Actuation::Force { magnitude, .. } => info!(
            x = direction.x,
            y = direction.y,
            z = direction.z,
            magnitude,
            "force applied"
        ),
        Actuation::Impulse { magnitude, .. } => info!(
            x = direction.x,
            y = direction.y,
            z = direction.z,
            magnitude,
            "impulse applied"
        ),
    }
}

const DEFAULT_LOG_FILTER: &str = "bci_bridge=debug,tower_http=info";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

/// Resolves with the name of the first termination signal received.
///
/// A signal whose handler cannot be installed never fires.
async fn termination() -> &'static str {
    let interrupt = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "SIGINT",
            Err(err) => {
                error!(error = %err, "Ctrl+C handler unavailable");
                std::future::pending().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        let mut stream = match signal(SignalKind::terminate()) {
            Ok(stream) => stream,
            Err(err) => {
                error!(error = %err, "SIGTERM handler unavailable");
                return std::future::pending().await;
            }
        };
        stream.recv().await;
        "SIGTERM"
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();

    tokio::select! {
        name = interrupt => name,
        name = terminate => name,
    }
}
