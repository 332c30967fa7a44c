use std::time::Duration;

use codec::{frame, message};
use tokio::{io::AsyncReadExt, task::JoinSet, time::sleep};

use crate::session::{CasterEndpoint, Error, Framer, NtripSession, NtripVersion};

/// Delay between reconnects while the failure count is below the
/// retry threshold; past it the backoff grows linearly, capped here.
const RETRY_DELAY: Duration = Duration::from_secs(2);
const MAX_BACKOFF_SECS: u64 = 300;

/// Terminal outcome of a mountpoint task. Anything recoverable is
/// handled inside the task by the reconnect loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The very first connect failed; the mountpoint is given up
    /// without retries.
    ConnectRefused,
    /// Reconnects kept failing without a single frame coming through.
    RetriesExhausted,
}

#[derive(Debug, Clone)]
pub struct Options {
    pub endpoint: CasterEndpoint,
    pub mountpoints: Vec<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    /// Optional NMEA-GGA sentence forwarded in the stream request to
    /// mark the rover position.
    pub nmea_gga: Option<String>,
    pub retry: u32,
    pub server: bool,
    pub version: NtripVersion,
}

/// Runs one task per mountpoint until all of them finish. Tasks share
/// nothing: each owns its connection, framer and header state.
pub async fn run(options: Options) -> Result<(), Fault> {
    let mut tasks = JoinSet::new();
    for mountpoint in options.mountpoints.clone() {
        let options = options.clone();
        if options.server {
            tasks.spawn(serve_mountpoint(options, mountpoint));
        } else {
            tasks.spawn(stream_mountpoint(options, mountpoint));
        }
    }

    let mut fault = None;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            // A refused connect outranks an exhausted budget so the
            // process reports the earlier, more fundamental failure.
            Ok(Err(new)) => {
                fault = Some(match fault {
                    Some(Fault::ConnectRefused) => Fault::ConnectRefused,
                    _ => new,
                })
            }
            Err(error) => log::error!("mountpoint task panicked: {error}"),
        }
    }

    fault.map_or(Ok(()), Err)
}

/// Client side: subscribe to the mountpoint and decode frames forever,
/// reconnecting with backoff on stream errors.
async fn stream_mountpoint(options: Options, mountpoint: String) -> Result<(), Fault> {
    // Consecutive attempts that died without delivering a frame.
    let mut fail: u32 = 0;
    let mut ever_streamed = false;

    loop {
        let error = match stream_once(&options, &mountpoint, &mut fail, &mut ever_streamed).await {
            Ok(()) => return Ok(()),
            Err(error) => error,
        };

        if !ever_streamed && matches!(error, Error::Transport(_)) && fail == 0 {
            log::error!("{mountpoint}: connection failed: {error}");
            return Err(Fault::ConnectRefused);
        }

        fail += 1;
        if !ever_streamed && fail > options.retry {
            log::error!("{mountpoint}: no frames after {fail} attempts, giving up");
            return Err(Fault::RetriesExhausted);
        }

        let delay = backoff_delay(fail, options.retry);
        log::warn!(
            "{mountpoint}: stream error: {error}; reconnecting in {}s (attempt {fail})",
            delay.as_secs()
        );

        sleep(delay).await;
    }
}

async fn stream_once(
    options: &Options,
    mountpoint: &str,
    fail: &mut u32,
    ever_streamed: &mut bool,
) -> Result<(), Error> {
    let mut session = NtripSession::connect(options.endpoint.clone()).await?;
    session
        .request_stream(
            mountpoint,
            options.user.as_deref(),
            options.password.as_deref(),
            options.nmea_gga.as_deref(),
        )
        .await?;

    log::info!("{mountpoint}: stream open: caster={}", options.endpoint.netloc());

    loop {
        let (frame, _arrived) = session.next_frame().await?;
        *fail = 0;
        *ever_streamed = true;

        let message_type = match frame::message_type(&frame) {
            Ok(message_type) => message_type,
            Err(error) => {
                log::warn!("{mountpoint}: unreadable frame: {error}");
                continue;
            }
        };

        log::info!(
            "{mountpoint}: msg {message_type} ({}), {} bytes",
            message::describe(message_type),
            frame.len()
        );

        // A decode failure only loses this frame; the framer stays
        // aligned on the stream.
        match frame::payload(&frame).map_err(Error::Codec).and_then(|payload| {
            message::decode(payload).map_err(Error::Codec)
        }) {
            Ok(decoded) => log::debug!("{mountpoint}: {decoded:?}"),
            Err(error) => log::warn!("{mountpoint}: decode failed: msg={message_type}, {error}"),
        }
    }
}

/// Server side: handshake as a provider and forward RTCM frames read
/// from stdin, re-framed so only CRC-clean frames reach the caster.
async fn serve_mountpoint(options: Options, mountpoint: String) -> Result<(), Fault> {
    let mut fail: u32 = 0;
    let mut ever_sent = false;
    let mut stdin = tokio::io::stdin();
    let mut framer = Framer::default();

    'reconnect: loop {
        let mut session = match connect_server(&options, &mountpoint).await {
            Ok(session) => session,
            Err(error) => {
                if !ever_sent && fail == 0 {
                    log::error!("{mountpoint}: server connection failed: {error}");
                    return Err(Fault::ConnectRefused);
                }

                fail += 1;
                if !ever_sent && fail > options.retry {
                    return Err(Fault::RetriesExhausted);
                }

                let delay = backoff_delay(fail, options.retry);
                log::warn!(
                    "{mountpoint}: server error: {error}; reconnecting in {}s",
                    delay.as_secs()
                );

                sleep(delay).await;
                continue;
            }
        };

        log::info!("{mountpoint}: publishing: caster={}", options.endpoint.netloc());

        let mut buffer = [0u8; 2048];
        loop {
            if let Some(frame) = framer.next_frame() {
                if let Err(error) = session.send_frame(&frame).await {
                    fail += 1;
                    if !ever_sent && fail > options.retry {
                        log::error!("{mountpoint}: nothing sent after {fail} attempts, giving up");
                        return Err(Fault::RetriesExhausted);
                    }

                    log::warn!("{mountpoint}: send failed: {error}");
                    sleep(backoff_delay(fail, options.retry)).await;
                    continue 'reconnect;
                }

                fail = 0;
                ever_sent = true;
                continue;
            }

            match stdin.read(&mut buffer).await {
                Ok(0) => {
                    log::info!("{mountpoint}: stdin closed, done publishing");
                    let _ = session.close().await;
                    return Ok(());
                }
                Ok(size) => framer.extend(&buffer[..size]),
                Err(error) => {
                    log::error!("{mountpoint}: stdin read failed: {error}");
                    let _ = session.close().await;
                    return Ok(());
                }
            }
        }
    }
}

async fn connect_server(options: &Options, mountpoint: &str) -> Result<NtripSession, Error> {
    let mut session = NtripSession::connect(options.endpoint.clone()).await?;
    session
        .request_server(
            mountpoint,
            options.user.as_deref(),
            options.password.as_deref(),
            options.version,
        )
        .await?;

    Ok(session)
}

/// Fixed 2 seconds below the retry threshold, then a linearly growing
/// delay capped at 5 minutes.
fn backoff_delay(fail: u32, retry: u32) -> Duration {
    if fail < retry {
        RETRY_DELAY
    } else {
        Duration::from_secs((5 * fail as u64).min(MAX_BACKOFF_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::backoff_delay;
    use std::time::Duration;

    #[test]
    fn backoff_schedule() {
        assert_eq!(backoff_delay(1, 5), Duration::from_secs(2));
        assert_eq!(backoff_delay(4, 5), Duration::from_secs(2));
        assert_eq!(backoff_delay(5, 5), Duration::from_secs(25));
        assert_eq!(backoff_delay(10, 5), Duration::from_secs(50));
        assert_eq!(backoff_delay(100, 5), Duration::from_secs(300));
    }
}
