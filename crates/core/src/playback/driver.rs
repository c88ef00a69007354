use log::debug;
use tokio::sync::{broadcast, mpsc};

use crate::{
    error::Result,
    playback::PlaybackCommand,
    player::{Player, PlayerEvent},
    session::PlannerSession,
};

#[derive(Debug, Clone, PartialEq)]
pub enum LessonOutcome {
    Completed { lesson: usize },
    Failed { message: String },
    /// Shutdown was requested or the player went away mid-lesson.
    Interrupted,
}

fn outcome(commands: Vec<PlaybackCommand>) -> Option<LessonOutcome> {
    commands.into_iter().find_map(|command| match command {
        PlaybackCommand::LessonEnded { lesson } => Some(LessonOutcome::Completed { lesson }),
        PlaybackCommand::ReportError { message } => Some(LessonOutcome::Failed { message }),
        PlaybackCommand::Load { .. } => None,
    })
}

/// Play one lesson, feeding player events into the session until it finishes.
///
/// There is no timeout: if the player never reports the end of a segment this
/// waits until `shutdown` fires or the event channel closes.
pub async fn play_lesson(
    session: &mut PlannerSession,
    player: &mut dyn Player,
    lesson: usize,
    events: &mut mpsc::Receiver<PlayerEvent>,
    shutdown: &mut broadcast::Receiver<()>,
) -> Result<LessonOutcome> {
    // Events queued before this lesson belong to whatever played earlier.
    while events.try_recv().is_ok() {}

    let commands = session.start_lesson(player, lesson).await?;
    if let Some(done) = outcome(commands) {
        return Ok(done);
    }

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                session.stop();
                return Ok(LessonOutcome::Interrupted);
            }
            event = events.recv() => match event {
                Some(PlayerEvent::Error(message)) if shutdown.try_recv().is_ok() => {
                    // The player died because of the same interrupt.
                    debug!("Player error {message:?} during shutdown");
                    session.stop();
                    return Ok(LessonOutcome::Interrupted);
                }
                Some(event) => {
                    debug!("Player event {:?}", event);
                    let commands = session.on_player_event(player, event).await?;
                    if let Some(done) = outcome(commands) {
                        return Ok(done);
                    }
                }
                None => {
                    session.stop();
                    return Ok(LessonOutcome::Interrupted);
                }
            },
        }
    }
}
