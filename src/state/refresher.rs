use crate::state::messages::UiEvent;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;

const CLOCK_TICK: Duration = Duration::from_secs(1);

/// Drives the countdown (every second) and the snapshot refresh (every
/// `refresh_interval`).
pub struct PeriodicRefresher {
    ui_events: mpsc::Sender<UiEvent>,
    refresh_interval: Duration,
}

impl PeriodicRefresher {
    pub fn new(ui_events: mpsc::Sender<UiEvent>, refresh_interval: Duration) -> Self {
        Self { ui_events, refresh_interval }
    }

    pub async fn run(self) {
        let mut clock_interval = interval(CLOCK_TICK);
        let mut refresh_interval = interval(self.refresh_interval);
        // Skip the immediate first refresh tick so startup loading isn't double-triggered.
        refresh_interval.tick().await;

        loop {
            let event = tokio::select! {
                _ = clock_interval.tick() => UiEvent::ClockTick,
                _ = refresh_interval.tick() => UiEvent::RefreshDue,
            };
            if self.ui_events.send(event).await.is_err() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn emits_ticks_and_refreshes() {
        let (tx, mut rx) = mpsc::channel(64);
        let task = tokio::spawn(PeriodicRefresher::new(tx, Duration::from_secs(3)).run());

        let mut ticks = 0;
        let mut refreshes = 0;
        while refreshes == 0 {
            match rx.recv().await {
                Some(UiEvent::ClockTick) => ticks += 1,
                Some(UiEvent::RefreshDue) => refreshes += 1,
                other => panic!("unexpected event {other:?}"),
            }
        }
        assert!(ticks >= 3, "expected clock ticks before the first refresh, got {ticks}");
        task.abort();
    }

    #[tokio::test]
    async fn stops_when_receiver_is_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        PeriodicRefresher::new(tx, Duration::from_secs(60)).run().await;
    }
}
