// Quiz session state, its transitions, and the phase derived from it.

use bevy::prelude::*;
use thiserror::Error;

use crate::locations::{LocationEntry, LocationId, Registry};

pub struct QuizPlugin;

impl Plugin for QuizPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Registry>()
            .init_resource::<QuizSession>()
            .init_state::<QuizPhase>()
            .add_message::<QuizEvent>()
            .add_systems(Startup, log_registry)
            .configure_sets(
                Update,
                (QuizSet::Input, QuizSet::Navigate, QuizSet::Apply).chain(),
            )
            .add_systems(
                Update,
                (apply_quiz_events, sync_phase)
                    .chain()
                    .in_set(QuizSet::Apply),
            );
    }
}

/// Systems that produce `QuizEvent`s run in `Input` or `Navigate`, before the
/// session is updated. Fragment changes land after typed input so that a
/// navigation always has the last word in a frame.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum QuizSet {
    Input,
    Navigate,
    Apply,
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, States)]
pub enum QuizPhase {
    /// No location resolved yet, or the fragment names no known location.
    #[default]
    Loading,
    Question,
    Revealed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnswerError {
    #[error("Incorrect answer. Try again!")]
    Incorrect,
}

#[derive(Message, Debug, Clone, PartialEq, Eq)]
pub enum QuizEvent {
    /// The URL fragment resolved to this identifier.
    Navigate(String),
    /// The answer draft was edited.
    Edit(String),
    Submit,
}

/// Transient per-page-load state. Only changed through [`QuizSession::apply`].
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizSession {
    pub route: Option<String>,
    pub input: String,
    pub error: Option<AnswerError>,
    pub revealed: bool,
}

pub fn normalize(answer: &str) -> String {
    answer.trim().to_lowercase()
}

pub fn check_answer(entry: &LocationEntry, input: &str) -> Result<(), AnswerError> {
    if normalize(input) == normalize(entry.answer) {
        Ok(())
    } else {
        Err(AnswerError::Incorrect)
    }
}

impl QuizSession {
    pub fn active<'a>(&self, registry: &'a Registry) -> Option<(LocationId, &'a LocationEntry)> {
        registry.lookup(self.route.as_deref()?)
    }

    pub fn phase(&self, registry: &Registry) -> QuizPhase {
        match self.active(registry) {
            None => QuizPhase::Loading,
            Some(_) if self.revealed => QuizPhase::Revealed,
            Some(_) => QuizPhase::Question,
        }
    }

    pub fn apply(self, event: QuizEvent, registry: &Registry) -> Self {
        match event {
            QuizEvent::Navigate(route) => Self {
                route: Some(route),
                ..Self::default()
            },
            QuizEvent::Edit(input) => {
                if self.phase(registry) != QuizPhase::Question {
                    return self;
                }
                Self { input, ..self }
            }
            QuizEvent::Submit => {
                let Some((_, entry)) = self.active(registry) else {
                    return self;
                };
                if self.revealed {
                    return self;
                }
                match check_answer(entry, &self.input) {
                    Ok(()) => Self {
                        error: None,
                        revealed: true,
                        ..self
                    },
                    Err(err) => Self {
                        input: String::new(),
                        error: Some(err),
                        ..self
                    },
                }
            }
        }
    }
}

fn log_registry(registry: Res<Registry>) {
    info!(
        "{} locations, starting at {}",
        registry.len(),
        registry.start()
    );
}

/// Answer edits and submits are built against the screen that was showing.
/// Once a navigation has been applied, the rest of the batch belongs to the
/// previous location and is dropped.
fn apply_quiz_events(
    mut events: MessageReader<QuizEvent>,
    registry: Res<Registry>,
    mut session: ResMut<QuizSession>,
) {
    let mut navigated = false;
    for event in events.read() {
        if navigated && !matches!(event, QuizEvent::Navigate(_)) {
            debug!("ignoring {event:?} typed before the last navigation");
            continue;
        }
        let next = session.clone().apply(event.clone(), &registry);
        if let QuizEvent::Navigate(route) = event {
            navigated = true;
            match next.active(&registry) {
                Some((id, _)) => info!("navigated to {id}"),
                None => debug!("no location named {route:?}, staying on loading screen"),
            }
        }
        if next == *session {
            continue;
        }
        match event {
            QuizEvent::Submit if next.revealed => info!("correct answer, revealing clue"),
            QuizEvent::Submit => debug!("incorrect answer"),
            QuizEvent::Navigate(_) | QuizEvent::Edit(_) => {}
        }
        *session = next;
    }
}

fn sync_phase(
    session: Res<QuizSession>,
    registry: Res<Registry>,
    phase: Res<State<QuizPhase>>,
    mut next_phase: ResMut<NextState<QuizPhase>>,
) {
    if !session.is_changed() {
        return;
    }
    let target = session.phase(&registry);
    if *phase.get() != target {
        next_phase.set(target);
    }
}
