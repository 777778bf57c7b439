//! Periodic refresh driven by a tokio interval

use std::future::Future;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};

/// Run `tick` immediately and then every `period` until `shutdown` resolves.
///
/// Returns the number of completed ticks. A tick in progress when
/// `shutdown` fires is dropped.
pub async fn refresh_until<S, F, Fut>(period: Duration, shutdown: S, mut tick: F) -> u64
where
    S: Future<Output = ()>,
    F: FnMut(u64) -> Fut,
    Fut: Future<Output = ()>,
{
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let mut count = 0;
    loop {
        tokio::select! {
            biased;
            () = &mut shutdown => break,
            _ = ticker.tick() => {
                tokio::select! {
                    biased;
                    () = &mut shutdown => break,
                    () = tick(count) => count += 1,
                }
            }
        }
    }

    tracing::debug!(ticks = count, "Refresh loop stopped");
    count
}
