use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    error::{PlannerError, Result},
    types::{Plan, SourceId},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "state")]
pub enum PlaybackState {
    #[default]
    Idle,
    PlayingSegment {
        lesson: usize,
        segment: usize,
    },
    LessonComplete {
        lesson: usize,
    },
}

/// Which lesson/segment is active; `(None, 0)` when nothing plays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackCursor {
    pub active_lesson: Option<usize>,
    pub active_segment: usize,
}

impl From<PlaybackState> for PlaybackCursor {
    fn from(state: PlaybackState) -> Self {
        match state {
            PlaybackState::PlayingSegment { lesson, segment } => Self {
                active_lesson: Some(lesson),
                active_segment: segment,
            },
            PlaybackState::Idle | PlaybackState::LessonComplete { .. } => Self::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    /// Start the lesson at this 0-based position.
    Start(usize),
    SegmentEnded,
    PlayerFailed(String),
}

/// Side effects the caller must carry out, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackCommand {
    Load {
        source_id: SourceId,
        start: f64,
        end: f64,
    },
    LessonEnded {
        lesson: usize,
    },
    ReportError {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: PlaybackState,
    pub commands: Vec<PlaybackCommand>,
}

impl Transition {
    fn stay(state: PlaybackState) -> Self {
        Self {
            state,
            commands: Vec::new(),
        }
    }
}

fn load_command(plan: &Plan, lesson: usize, segment: usize) -> Option<PlaybackCommand> {
    let seg = plan.lesson(lesson)?.segments.get(segment)?;
    let source = plan.source_for(seg)?;
    Some(PlaybackCommand::Load {
        source_id: source.id.clone(),
        start: seg.start,
        end: seg.end,
    })
}

/// Pure transition function of the lesson state machine.
///
/// On error the caller keeps its current state; nothing is emitted.
pub fn transition(
    state: PlaybackState,
    event: PlaybackEvent,
    plan: &Plan,
    player_ready: bool,
) -> Result<Transition> {
    match event {
        PlaybackEvent::Start(lesson) => {
            let len = plan.lessons.len();
            if lesson >= len {
                return Err(PlannerError::LessonIndexOutOfRange { lesson, len });
            }
            if !player_ready {
                return Err(PlannerError::PlayerNotReady);
            }
            let load = load_command(plan, lesson, 0)
                .ok_or(PlannerError::LessonIndexOutOfRange { lesson, len })?;
            Ok(Transition {
                state: PlaybackState::PlayingSegment { lesson, segment: 0 },
                commands: vec![load],
            })
        }

        PlaybackEvent::SegmentEnded => match state {
            PlaybackState::PlayingSegment { lesson, segment } => {
                let next = segment + 1;
                match load_command(plan, lesson, next) {
                    Some(load) => Ok(Transition {
                        state: PlaybackState::PlayingSegment {
                            lesson,
                            segment: next,
                        },
                        commands: vec![load],
                    }),
                    None => Ok(Transition {
                        state: PlaybackState::LessonComplete { lesson },
                        commands: vec![PlaybackCommand::LessonEnded { lesson }],
                    }),
                }
            }
            // Players fire stray end events after a manual stop.
            PlaybackState::Idle | PlaybackState::LessonComplete { .. } => {
                debug!("Ignoring segment end while {:?}", state);
                Ok(Transition::stay(state))
            }
        },

        PlaybackEvent::PlayerFailed(message) => {
            let state = match state {
                PlaybackState::PlayingSegment { .. } => PlaybackState::Idle,
                other => other,
            };
            Ok(Transition {
                state,
                commands: vec![PlaybackCommand::ReportError { message }],
            })
        }
    }
}

/// Owns the playback state and applies events to it.
#[derive(Debug, Default)]
pub struct PlaybackController {
    state: PlaybackState,
}

impl PlaybackController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn cursor(&self) -> PlaybackCursor {
        self.state.into()
    }

    pub fn apply(
        &mut self,
        event: PlaybackEvent,
        plan: &Plan,
        player_ready: bool,
    ) -> Result<Vec<PlaybackCommand>> {
        let Transition { state, commands } = transition(self.state, event, plan, player_ready)?;
        if state != self.state {
            debug!("Playback {:?} -> {:?}", self.state, state);
        }
        self.state = state;
        Ok(commands)
    }

    pub fn stop(&mut self) {
        self.state = PlaybackState::Idle;
    }
}
