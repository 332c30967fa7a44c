#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::process::exit;

use ntrip_client::{
    config::Config,
    logger,
    session::{CasterEndpoint, NtripSession, NtripVersion},
    supervisor::{self, Fault, Options},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load();
    logger::init(config.log_level(), config.logfile.as_deref())?;

    let endpoint = match CasterEndpoint::parse(&config.url) {
        Ok(endpoint) => endpoint,
        Err(error) => {
            log::error!("{error}");
            exit(1);
        }
    };

    // Without a mountpoint the tool degrades to a sourcetable query.
    if config.mountpoints.is_empty() {
        match fetch_sourcetable(endpoint).await {
            Ok(table) => {
                for line in table {
                    println!("{line}");
                }

                return Ok(());
            }
            Err(error) => {
                log::error!("sourcetable request failed: {error}");
                exit(1);
            }
        }
    }

    let supervisor = tokio::spawn(supervisor::run(Options {
        endpoint,
        mountpoints: config.mountpoints.clone(),
        user: config.user.clone(),
        password: config.password.clone(),
        nmea_gga: None,
        retry: config.retry,
        server: config.server,
        version: if config.ntrip1 {
            NtripVersion::V1
        } else {
            NtripVersion::V2
        },
    }));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            log::info!("received SIGINT, shutting down");
            exit(3);
        }
        _ = sigterm() => {
            log::info!("received SIGTERM, shutting down");
            exit(4);
        }
        joined = supervisor => match joined? {
            Ok(()) => Ok(()),
            Err(Fault::ConnectRefused) => exit(1),
            Err(Fault::RetriesExhausted) => exit(2),
        }
    }
}

async fn fetch_sourcetable(
    endpoint: CasterEndpoint,
) -> Result<Vec<String>, ntrip_client::session::Error> {
    let mut session = NtripSession::connect(endpoint).await?;
    session.request_sourcetable().await
}

/// Resolves when the process receives SIGTERM; pends forever on
/// platforms without it.
async fn sigterm() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    }

    #[cfg(not(unix))]
    {
        std::future::pending::<()>().await;
    }
}
