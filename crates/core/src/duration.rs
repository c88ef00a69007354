use std::time::Duration;

use log::{debug, info, warn};
use tokio::time::{Instant, interval_at, timeout};

use crate::{
    error::{PlannerError, Result},
    player::Player,
    types::{Source, SourceId, SourceRequest},
};

#[derive(Debug, Clone)]
pub struct DurationConfig {
    /// Gap between two `duration()` polls.
    pub poll_interval: Duration,
    /// Total wait per source before giving up.
    pub budget: Duration,
}

impl Default for DurationConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(400),
            budget: Duration::from_secs(10),
        }
    }
}

/// Cue `id` and wait until the player reports a positive duration for it.
pub async fn resolve_duration(
    player: &mut dyn Player,
    id: &SourceId,
    config: &DurationConfig,
) -> Result<f64> {
    player.cue(id).await?;

    let player = &*player;
    let poll = async {
        let period = config.poll_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        let mut attempts = 0u32;
        loop {
            ticker.tick().await;
            attempts += 1;
            let duration = player.duration();
            if duration.is_finite() && duration > 0.0 {
                return (duration, attempts);
            }
        }
    };

    match timeout(config.budget, poll).await {
        Ok((duration, attempts)) => {
            debug!("Duration of {id} known after {attempts} polls");
            Ok(duration)
        }
        Err(_) => {
            warn!("No duration for {id} within {:?}", config.budget);
            Err(PlannerError::DurationUnavailable {
                source_id: id.to_string(),
            })
        }
    }
}

/// Resolve every request in order, one at a time on the shared player.
///
/// The first failure aborts the batch; nothing resolved before it is returned.
pub async fn resolve_sources(
    player: &mut dyn Player,
    requests: Vec<SourceRequest>,
    config: &DurationConfig,
) -> Result<Vec<Source>> {
    if !player.is_ready() {
        return Err(PlannerError::PlayerNotReady);
    }

    let mut sources = Vec::with_capacity(requests.len());
    for request in requests {
        let duration = resolve_duration(player, &request.id, config).await?;
        info!("Resolved {} ({:.1}s)", request.id, duration);
        sources.push(request.resolved(duration));
    }
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::fake::FakePlayer;

    fn request(id: &str) -> SourceRequest {
        SourceRequest {
            id: SourceId::from(id),
            url: format!("https://youtu.be/{id}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn waits_until_duration_is_reported() {
        let mut player = FakePlayer::ready().with_duration("a", &[0.0, 0.0, 125.5]);
        let started = Instant::now();

        let duration = resolve_duration(&mut player, &SourceId::from("a"), &DurationConfig::default())
            .await
            .unwrap();

        assert_eq!(duration, 125.5);
        assert_eq!(player.polls(), 3);
        assert_eq!(started.elapsed(), Duration::from_millis(1200));
        assert_eq!(player.cue_log, [SourceId::from("a")]);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_when_duration_stays_zero() {
        let mut player = FakePlayer::ready().with_duration("stuck", &[0.0]);

        let err = resolve_duration(
            &mut player,
            &SourceId::from("stuck"),
            &DurationConfig::default(),
        )
        .await
        .unwrap_err();

        assert_eq!(
            err,
            PlannerError::DurationUnavailable {
                source_id: "stuck".to_string()
            }
        );
        assert!((24..=25).contains(&player.polls()), "polls = {}", player.polls());
    }

    #[tokio::test(start_paused = true)]
    async fn resolves_batch_in_order() {
        let mut player = FakePlayer::ready()
            .with_duration("one", &[0.0, 60.0])
            .with_duration("two", &[90.0]);

        let sources = resolve_sources(
            &mut player,
            vec![request("one"), request("two")],
            &DurationConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(player.cue_log, [SourceId::from("one"), SourceId::from("two")]);
        let durations: Vec<f64> = sources.iter().map(|s| s.duration).collect();
        assert_eq!(durations, [60.0, 90.0]);
        assert_eq!(sources[1].url, "https://youtu.be/two");
    }

    #[tokio::test(start_paused = true)]
    async fn batch_aborts_on_first_unavailable_source() {
        let mut player = FakePlayer::ready()
            .with_duration("one", &[60.0])
            .with_duration("three", &[30.0]);

        let err = resolve_sources(
            &mut player,
            vec![request("one"), request("missing"), request("three")],
            &DurationConfig::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PlannerError::DurationUnavailable { source_id } if source_id == "missing"));
        assert_eq!(player.cue_log.len(), 2);
    }

    #[tokio::test]
    async fn batch_requires_ready_player() {
        let mut player = FakePlayer::default();
        let err = resolve_sources(&mut player, vec![request("a")], &DurationConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err, PlannerError::PlayerNotReady);
        assert!(player.cue_log.is_empty());
    }
}
