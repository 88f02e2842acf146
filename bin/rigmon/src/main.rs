use std::sync::Arc;

use hs1xx::{Interface, DISCOVERY_WINDOW};
use log::{error, info};
use rigmon::{plug, ErasedError, Journal, MonitorSettings, Notifier, PowerMonitor, Textbelt};
use tokio::signal::unix::{signal, SignalKind};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<(), ErasedError> {
    pretty_env_logger::init_timed();

    info!("rigmon version {VERSION}");

    if std::env::args().skip(1).any(|arg| arg == "--discover") {
        discover().await;
        return Ok(());
    }

    let settings = MonitorSettings::from_env()?;
    let journal = Arc::new(Journal::new(settings.logging_level));
    let plug = plug::connect(settings.vendor, settings.ip)?;

    let notifier: Option<Box<dyn Notifier>> = match &settings.textbelt {
        Some(textbelt) => Some(Box::new(Textbelt::new(
            textbelt.key.clone(),
            textbelt.phone.clone(),
        )?)),
        None => None,
    };

    let mut monitor = PowerMonitor::new(settings, plug, journal, notifier);

    let stop = monitor.stop_handle();
    tokio::spawn(async move {
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(err) => {
                error!("unable to listen for SIGTERM: {err}");
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => info!("got SIGTERM, exiting..."),
            _ = tokio::signal::ctrl_c() => info!("got SIGINT, exiting..."),
        }

        stop.request_stop();
    });

    monitor.run().await?;

    Ok(())
}

async fn discover() {
    let interface = match std::env::var("RIGMON_INTERFACE") {
        Ok(name) if !name.is_empty() => Interface::Named(name),
        _ => Interface::Any,
    };

    let devices = hs1xx::discover(&interface, DISCOVERY_WINDOW).await;

    if devices.is_empty() {
        println!(
            "no TP-Link plugs found on {interface:?}, set RIGMON_INTERFACE to pick another interface"
        );
        return;
    }

    let mut devices: Vec<_> = devices.into_iter().collect();
    devices.sort_by_key(|(ip, _)| *ip);

    for (ip, info) in devices {
        println!("{ip}\t{}\t{}\t{}", info.model, info.alias, info.mac);
    }
}
