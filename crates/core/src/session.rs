use log::{info, warn};

use crate::{
    duration::{DurationConfig, resolve_sources},
    error::{PlannerError, Result},
    format::parse_hms,
    partition::partition,
    playback::{PlaybackCommand, PlaybackController, PlaybackEvent},
    player::{Player, PlayerEvent},
    types::{Plan, Source},
    youtube::source_requests,
};

/// The current plan together with the playback state walking it.
#[derive(Debug, Default)]
pub struct PlannerSession {
    plan: Plan,
    playback: PlaybackController,
}

impl PlannerSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plan(plan: Plan) -> Self {
        Self {
            plan,
            playback: PlaybackController::new(),
        }
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn playback(&self) -> &PlaybackController {
        &self.playback
    }

    /// Replace the plan. On error the previous plan stays in place.
    pub fn rebuild(&mut self, sources: Vec<Source>, lesson_length: f64) -> Result<&Plan> {
        let plan = partition(sources, lesson_length)?;
        self.plan = plan;
        self.playback.stop();
        Ok(&self.plan)
    }

    /// Parse user input, resolve every duration on `player` and install the new plan.
    pub async fn build(
        &mut self,
        player: &mut dyn Player,
        urls: &str,
        lesson_length: &str,
        config: &DurationConfig,
    ) -> Result<&Plan> {
        if !player.is_ready() {
            return Err(PlannerError::PlayerNotReady);
        }
        let lesson_length = parse_hms(lesson_length)?;
        let requests = source_requests(urls.lines())?;
        let count = requests.len();

        let sources = resolve_sources(player, requests, config).await?;
        let plan = self.rebuild(sources, lesson_length)?;
        info!(
            "Generated {} mini-shiurim from {} video(s)",
            plan.lessons.len(),
            count
        );
        Ok(plan)
    }

    /// Start the lesson at 0-based `lesson`, cancelling whatever was playing.
    pub async fn start_lesson(
        &mut self,
        player: &mut dyn Player,
        lesson: usize,
    ) -> Result<Vec<PlaybackCommand>> {
        let ready = player.is_ready();
        self.dispatch(player, PlaybackEvent::Start(lesson), ready)
            .await
    }

    pub async fn on_player_event(
        &mut self,
        player: &mut dyn Player,
        event: PlayerEvent,
    ) -> Result<Vec<PlaybackCommand>> {
        let event = match event {
            PlayerEvent::Ended => PlaybackEvent::SegmentEnded,
            PlayerEvent::Error(message) => PlaybackEvent::PlayerFailed(message),
        };
        let ready = player.is_ready();
        self.dispatch(player, event, ready).await
    }

    pub fn stop(&mut self) {
        self.playback.stop();
    }

    /// Run the controller, issue its loads and hand back everything else.
    async fn dispatch(
        &mut self,
        player: &mut dyn Player,
        event: PlaybackEvent,
        player_ready: bool,
    ) -> Result<Vec<PlaybackCommand>> {
        let commands = self.playback.apply(event, &self.plan, player_ready)?;

        let mut rest = Vec::new();
        for command in commands {
            match command {
                PlaybackCommand::Load {
                    source_id,
                    start,
                    end,
                } => {
                    if let Err(e) = player.load(&source_id, start, end).await {
                        warn!("Loading {source_id} failed: {e}");
                        self.playback.stop();
                        return Err(e);
                    }
                }
                other => rest.push(other),
            }
        }
        Ok(rest)
    }
}
