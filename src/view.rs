// Loading, question and revealed-clue screens.

use bevy::input::ButtonState;
use bevy::input::keyboard::{Key, KeyboardInput};
use bevy::prelude::*;

use crate::locations::{LocationEntry, Registry};
use crate::quiz::{QuizEvent, QuizPhase, QuizSession, QuizSet};

pub struct QuizViewPlugin;

impl Plugin for QuizViewPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ClearColor(BACKGROUND))
            .add_systems(Startup, spawn_camera)
            .add_systems(OnEnter(QuizPhase::Loading), setup_loading)
            .add_systems(OnEnter(QuizPhase::Question), setup_question)
            .add_systems(OnEnter(QuizPhase::Revealed), setup_revealed)
            .add_systems(
                Update,
                (
                    type_answer,
                    submit_button.run_if(in_state(QuizPhase::Question)),
                )
                    .in_set(QuizSet::Input),
            )
            .add_systems(
                Update,
                (
                    button_visuals,
                    pulse_markers.run_if(in_state(QuizPhase::Loading)),
                    refresh_question
                        .after(QuizSet::Apply)
                        .run_if(in_state(QuizPhase::Question))
                        .run_if(resource_changed::<QuizSession>),
                ),
            );
    }
}

const BACKGROUND: Color = Color::srgb(1.0, 0.95, 0.85);
const CARD: Color = Color::WHITE;
const TITLE: Color = Color::srgb(0.47, 0.21, 0.06);
const ACCENT: Color = Color::srgb(0.71, 0.33, 0.04);
const BODY: Color = Color::srgb(0.22, 0.25, 0.32);
const PLACEHOLDER: Color = Color::srgb(0.6, 0.62, 0.66);
const ERROR: Color = Color::srgb(0.86, 0.15, 0.15);
const SUCCESS: Color = Color::srgb(0.09, 0.64, 0.29);
const QUESTION_BG: Color = Color::srgb(1.0, 0.98, 0.92);
const ERROR_BG: Color = Color::srgb(1.0, 0.95, 0.95);

const NORMAL_BUTTON: Color = Color::srgb(0.85, 0.47, 0.02);
const HOVERED_BUTTON: Color = Color::srgb(0.71, 0.33, 0.04);
const PRESSED_BUTTON: Color = Color::srgb(0.57, 0.25, 0.05);

const ANSWER_PLACEHOLDER: &str = "Enter your answer...";

// Loading marker pulse: full cycle length and dimmest alpha.
const PULSE_PERIOD: f32 = 2.0;
const PULSE_MIN: f32 = 0.3;

#[derive(Component)]
struct SubmitButton;

#[derive(Component)]
struct LocationName;

#[derive(Component)]
struct QuestionText;

#[derive(Component)]
struct AnswerText;

#[derive(Component)]
struct ErrorText;

/// Row holding the error marker and text, hidden while there is no error.
#[derive(Component)]
struct ErrorRow;

#[derive(Component)]
struct Pulse;

fn spawn_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
}

fn text(value: impl Into<String>, size: f32, color: Color) -> impl Bundle {
    (
        Text::new(value),
        TextFont {
            font_size: size,
            ..default()
        },
        TextColor(color),
    )
}

/// Full-window column that every screen hangs off.
fn screen_root(phase: QuizPhase) -> impl Bundle {
    (
        Node {
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            flex_direction: FlexDirection::Column,
            justify_content: JustifyContent::Center,
            align_items: AlignItems::Center,
            row_gap: Val::Px(16.0),
            padding: UiRect::all(Val::Px(16.0)),
            ..default()
        },
        DespawnOnExit(phase),
    )
}

fn card() -> impl Bundle {
    (
        Node {
            width: Val::Percent(100.0),
            max_width: Val::Px(672.0),
            flex_direction: FlexDirection::Column,
            row_gap: Val::Px(20.0),
            padding: UiRect::all(Val::Px(32.0)),
            ..default()
        },
        BackgroundColor(CARD),
    )
}

/// Plain coloured square standing in for an icon.
fn marker(size: f32, color: Color) -> impl Bundle {
    (
        Node {
            width: Val::Px(size),
            height: Val::Px(size),
            ..default()
        },
        BackgroundColor(color),
    )
}

fn spawn_header(parent: &mut ChildSpawnerCommands, subtitle: &str) {
    parent.spawn(marker(48.0, ACCENT));
    parent.spawn(text("Treasure Hunt", 40.0, TITLE));
    parent.spawn((LocationName, text(subtitle, 18.0, ACCENT)));
}

fn setup_loading(mut commands: Commands) {
    commands
        .spawn(screen_root(QuizPhase::Loading))
        .with_children(|parent| {
            parent.spawn((Pulse, marker(48.0, ACCENT)));
            parent.spawn(text("Loading location...", 24.0, TITLE));
        });
}

fn setup_question(mut commands: Commands, session: Res<QuizSession>, registry: Res<Registry>) {
    let Some((_, entry)) = session.active(&registry) else {
        return;
    };

    commands
        .spawn(screen_root(QuizPhase::Question))
        .with_children(|parent| {
            spawn_header(parent, entry.name);

            parent.spawn(card()).with_children(|card| {
                card.spawn(text(
                    "Answer the question correctly to reveal your next clue",
                    24.0,
                    BODY,
                ));

                // Question box.
                card.spawn((
                    Node {
                        padding: UiRect::all(Val::Px(24.0)),
                        border: UiRect::left(Val::Px(4.0)),
                        ..default()
                    },
                    BorderColor::all(ACCENT),
                    BackgroundColor(QUESTION_BG),
                ))
                .with_children(|question| {
                    question.spawn((QuestionText, text(entry.question, 20.0, BODY)));
                });

                card.spawn(text("Your Answer", 14.0, BODY));

                // Answer field, filled by `type_answer`.
                card.spawn((
                    Node {
                        padding: UiRect::axes(Val::Px(16.0), Val::Px(12.0)),
                        border: UiRect::all(Val::Px(2.0)),
                        ..default()
                    },
                    BorderColor::all(ACCENT),
                ))
                .with_children(|field| {
                    let (value, color) = answer_display(&session.input);
                    field.spawn((AnswerText, text(value, 20.0, color)));
                });

                let (error, visibility) = error_display(&session);
                card.spawn((
                    ErrorRow,
                    Node {
                        align_items: AlignItems::Center,
                        column_gap: Val::Px(8.0),
                        padding: UiRect::all(Val::Px(12.0)),
                        ..default()
                    },
                    BackgroundColor(ERROR_BG),
                    visibility,
                ))
                .with_children(|row| {
                    row.spawn(marker(16.0, ERROR));
                    row.spawn((ErrorText, text(error, 16.0, ERROR)));
                });

                spawn_button(card, "Submit Answer", SubmitButton);
            });
        });
}

fn setup_revealed(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    session: Res<QuizSession>,
    registry: Res<Registry>,
) {
    let Some((_, entry)) = session.active(&registry) else {
        return;
    };

    commands
        .spawn(screen_root(QuizPhase::Revealed))
        .with_children(|parent| {
            spawn_header(parent, entry.name);

            parent.spawn(card()).with_children(|card| {
                card.spawn(Node {
                    align_items: AlignItems::Center,
                    column_gap: Val::Px(12.0),
                    ..default()
                })
                .with_children(|heading| {
                    heading.spawn(marker(28.0, SUCCESS));
                    heading.spawn(text("Correct", 28.0, SUCCESS));
                });

                card.spawn(text(reveal_message(entry), 20.0, BODY));

                card.spawn((
                    ImageNode::new(asset_server.load(entry.clue_image)),
                    Node {
                        width: Val::Percent(100.0),
                        ..default()
                    },
                ));

                if entry.is_last() {
                    card.spawn((
                        Node {
                            justify_content: JustifyContent::Center,
                            padding: UiRect::all(Val::Px(24.0)),
                            ..default()
                        },
                        BackgroundColor(NORMAL_BUTTON),
                    ))
                    .with_children(|banner| {
                        banner.spawn(text("Snackies Found!", 28.0, Color::WHITE));
                    });
                }
            });
        });
}

const NEXT_CLUE_HINT: &str = "Here's your clue to find the next location.";
const COMPLETE_MESSAGE: &str = "Nice work Princess!";

fn reveal_message(entry: &LocationEntry) -> &'static str {
    if entry.is_last() {
        COMPLETE_MESSAGE
    } else {
        NEXT_CLUE_HINT
    }
}

fn spawn_button(parent: &mut ChildSpawnerCommands, label: &str, tag: impl Component) {
    parent
        .spawn((
            tag,
            Button,
            Node {
                width: Val::Percent(100.0),
                height: Val::Px(50.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            BackgroundColor(NORMAL_BUTTON),
        ))
        .with_children(|btn| {
            btn.spawn(text(label, 20.0, Color::WHITE));
        });
}

fn answer_display(input: &str) -> (String, Color) {
    if input.is_empty() {
        (ANSWER_PLACEHOLDER.to_string(), PLACEHOLDER)
    } else {
        (input.to_string(), BODY)
    }
}

fn error_display(session: &QuizSession) -> (String, Visibility) {
    match &session.error {
        Some(err) => (err.to_string(), Visibility::Inherited),
        None => (String::new(), Visibility::Hidden),
    }
}

fn pulse_alpha(elapsed: f32) -> f32 {
    let wave = (elapsed * std::f32::consts::TAU / PULSE_PERIOD).cos() * 0.5 + 0.5;
    PULSE_MIN + (1.0 - PULSE_MIN) * wave
}

fn pulse_markers(time: Res<Time>, mut markers: Query<&mut BackgroundColor, With<Pulse>>) {
    let alpha = pulse_alpha(time.elapsed_secs());
    for mut bg in &mut markers {
        bg.0 = ACCENT.with_alpha(alpha);
    }
}

fn button_visuals(
    mut query: Query<(&Interaction, &mut BackgroundColor), (Changed<Interaction>, With<Button>)>,
) {
    for (interaction, mut bg) in &mut query {
        *bg = match *interaction {
            Interaction::Pressed => PRESSED_BUTTON.into(),
            Interaction::Hovered => HOVERED_BUTTON.into(),
            Interaction::None => NORMAL_BUTTON.into(),
        };
    }
}

/// Runs every frame so that keys pressed on other screens are consumed there
/// instead of being typed into the next question.
fn type_answer(
    mut keys: MessageReader<KeyboardInput>,
    phase: Res<State<QuizPhase>>,
    session: Res<QuizSession>,
    mut events: MessageWriter<QuizEvent>,
) {
    if *phase.get() != QuizPhase::Question {
        keys.clear();
        return;
    }

    let mut draft = session.input.clone();
    let mut edited = false;

    for key in keys.read() {
        if key.state != ButtonState::Pressed {
            continue;
        }
        match (&key.logical_key, &key.text) {
            (Key::Enter, _) => {
                if edited {
                    events.write(QuizEvent::Edit(draft));
                }
                events.write(QuizEvent::Submit);
                // The reducer decides what the draft becomes after a submit.
                return;
            }
            (Key::Backspace, _) => {
                edited |= draft.pop().is_some();
            }
            (_, Some(inserted)) => {
                if inserted.chars().all(is_printable_char) {
                    draft.push_str(inserted);
                    edited = true;
                }
            }
            _ => {}
        }
    }

    if edited {
        events.write(QuizEvent::Edit(draft));
    }
}

fn is_printable_char(chr: char) -> bool {
    let is_in_private_use_area = ('\u{e000}'..='\u{f8ff}').contains(&chr)
        || ('\u{f0000}'..='\u{ffffd}').contains(&chr)
        || ('\u{100000}'..='\u{10fffd}').contains(&chr);

    !is_in_private_use_area && !chr.is_ascii_control()
}

fn submit_button(
    query: Query<&Interaction, (Changed<Interaction>, With<SubmitButton>)>,
    mut events: MessageWriter<QuizEvent>,
) {
    for interaction in &query {
        if *interaction == Interaction::Pressed {
            events.write(QuizEvent::Submit);
        }
    }
}

fn refresh_question(
    session: Res<QuizSession>,
    registry: Res<Registry>,
    mut name: Query<&mut Text, With<LocationName>>,
    mut question: Query<&mut Text, (With<QuestionText>, Without<LocationName>)>,
    mut answer: Query<
        (&mut Text, &mut TextColor),
        (With<AnswerText>, Without<QuestionText>, Without<LocationName>),
    >,
    mut error: Query<
        &mut Text,
        (
            With<ErrorText>,
            Without<AnswerText>,
            Without<QuestionText>,
            Without<LocationName>,
        ),
    >,
    mut error_row: Query<&mut Visibility, With<ErrorRow>>,
) {
    let Some((_, entry)) = session.active(&registry) else {
        return;
    };

    for mut text in &mut name {
        **text = entry.name.to_string();
    }
    for mut text in &mut question {
        **text = entry.question.to_string();
    }
    for (mut text, mut color) in &mut answer {
        let (value, value_color) = answer_display(&session.input);
        **text = value;
        color.0 = value_color;
    }
    let (message, visibility) = error_display(&session);
    for mut text in &mut error {
        **text = message.clone();
    }
    for mut row in &mut error_row {
        *row = visibility;
    }
}

#[cfg(test)]
mod tests {
    use bevy::state::app::StatesPlugin;
    use strum::IntoEnumIterator;

    use super::*;
    use crate::locations::LocationId;
    use crate::quiz::{AnswerError, QuizPlugin};

    fn view_app(route: &str) -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default(), StatesPlugin))
            .init_asset::<Image>()
            .add_message::<KeyboardInput>()
            .add_plugins((QuizPlugin, QuizViewPlugin));
        app.world_mut()
            .write_message(QuizEvent::Navigate(route.to_string()));
        settle(&mut app);
        app
    }

    /// Runs enough frames for input, the phase change and `OnEnter` spawns.
    fn settle(app: &mut App) {
        for _ in 0..3 {
            app.update();
        }
    }

    fn key(app: &mut App, key_code: KeyCode, logical_key: Key, text: Option<&str>) {
        app.world_mut().write_message(KeyboardInput {
            key_code,
            logical_key,
            state: ButtonState::Pressed,
            text: text.map(Into::into),
            repeat: false,
            window: Entity::PLACEHOLDER,
        });
    }

    fn type_text(app: &mut App, value: &str) {
        for chr in value.chars() {
            let typed = chr.to_string();
            key(
                app,
                KeyCode::KeyA,
                Key::Character(typed.as_str().into()),
                Some(&typed),
            );
        }
        settle(app);
    }

    fn backspace(app: &mut App) {
        key(app, KeyCode::Backspace, Key::Backspace, None);
        settle(app);
    }

    fn enter(app: &mut App) {
        key(app, KeyCode::Enter, Key::Enter, Some("\r"));
        settle(app);
    }

    fn phase(app: &App) -> QuizPhase {
        *app.world().resource::<State<QuizPhase>>().get()
    }

    fn texts(app: &mut App) -> Vec<String> {
        let mut query = app.world_mut().query::<&Text>();
        query.iter(app.world()).map(|text| text.0.clone()).collect()
    }

    fn answer_field(app: &mut App) -> String {
        let mut query = app.world_mut().query_filtered::<&Text, With<AnswerText>>();
        query.single(app.world()).unwrap().0.clone()
    }

    fn image_count(app: &mut App) -> usize {
        let mut query = app.world_mut().query::<&ImageNode>();
        query.iter(app.world()).count()
    }

    fn error_row_visibility(app: &mut App) -> Visibility {
        let mut query = app.world_mut().query_filtered::<&Visibility, With<ErrorRow>>();
        *query.single(app.world()).unwrap()
    }

    #[test]
    fn final_location_shows_banner_after_typed_answer() {
        let mut app = view_app("theRock");
        assert_eq!(phase(&app), QuizPhase::Question);
        assert!(texts(&mut app).contains(&"What's my favourite Disney movie?".to_string()));

        type_text(&mut app, " aTLANTIs ");
        assert_eq!(answer_field(&mut app), " aTLANTIs ");
        enter(&mut app);

        assert_eq!(phase(&app), QuizPhase::Revealed);
        let shown = texts(&mut app);
        assert!(shown.contains(&"Correct".to_string()));
        assert!(shown.contains(&COMPLETE_MESSAGE.to_string()));
        assert!(shown.contains(&"Snackies Found!".to_string()));
        assert!(!shown.contains(&NEXT_CLUE_HINT.to_string()));
        assert_eq!(image_count(&mut app), 1);
    }

    #[test]
    fn other_locations_show_hint_without_banner() {
        let mut app = view_app("theBench");
        type_text(&mut app, "watermelonx");
        backspace(&mut app);
        assert_eq!(answer_field(&mut app), "watermelon");
        enter(&mut app);

        assert_eq!(phase(&app), QuizPhase::Revealed);
        let shown = texts(&mut app);
        assert!(shown.contains(&NEXT_CLUE_HINT.to_string()));
        assert!(!shown.contains(&COMPLETE_MESSAGE.to_string()));
        assert!(!shown.contains(&"Snackies Found!".to_string()));
        assert_eq!(image_count(&mut app), 1);
    }

    #[test]
    fn wrong_answer_shows_error_and_empties_field() {
        let mut app = view_app("theSpot");
        assert_eq!(error_row_visibility(&mut app), Visibility::Hidden);

        type_text(&mut app, "red");
        enter(&mut app);

        assert_eq!(phase(&app), QuizPhase::Question);
        assert!(texts(&mut app).contains(&AnswerError::Incorrect.to_string()));
        assert_eq!(answer_field(&mut app), ANSWER_PLACEHOLDER);
        assert_eq!(error_row_visibility(&mut app), Visibility::Inherited);
        assert_eq!(image_count(&mut app), 0);
    }

    #[test]
    fn backspace_on_empty_field_keeps_placeholder() {
        let mut app = view_app("theSpot");
        backspace(&mut app);
        assert_eq!(answer_field(&mut app), ANSWER_PLACEHOLDER);

        type_text(&mut app, "bl");
        backspace(&mut app);
        backspace(&mut app);
        assert_eq!(answer_field(&mut app), ANSWER_PLACEHOLDER);
        assert!(app.world().resource::<QuizSession>().input.is_empty());
    }

    #[test]
    fn submit_button_checks_the_draft() {
        let mut app = view_app("theWitch");
        type_text(&mut app, "Dirty Chai Latte");

        let mut buttons = app
            .world_mut()
            .query_filtered::<&mut Interaction, With<SubmitButton>>();
        for mut interaction in buttons.iter_mut(app.world_mut()) {
            *interaction = Interaction::Pressed;
        }
        settle(&mut app);

        assert_eq!(phase(&app), QuizPhase::Revealed);
    }

    #[test]
    fn navigating_between_questions_refreshes_the_screen() {
        let mut app = view_app("theSpot");
        type_text(&mut app, "gre");

        app.world_mut()
            .write_message(QuizEvent::Navigate("theWitch".to_string()));
        settle(&mut app);

        assert_eq!(phase(&app), QuizPhase::Question);
        let shown = texts(&mut app);
        assert!(shown.contains(&"What's my favourite drink?".to_string()));
        assert!(shown.contains(&"The Witch".to_string()));
        assert!(!shown.contains(&"What's my favourite colour?".to_string()));
        assert_eq!(answer_field(&mut app), ANSWER_PLACEHOLDER);
    }

    #[test]
    fn keys_typed_as_the_location_changes_stay_behind() {
        let mut app = view_app("theSpot");
        type_text(&mut app, "gre");
        assert_eq!(answer_field(&mut app), "gre");

        app.world_mut()
            .write_message(QuizEvent::Navigate("theWitch".to_string()));
        key(&mut app, KeyCode::KeyX, Key::Character("x".into()), Some("x"));
        settle(&mut app);

        let session = app.world().resource::<QuizSession>();
        assert_eq!(session.route.as_deref(), Some("theWitch"));
        assert!(session.input.is_empty());
        assert_eq!(answer_field(&mut app), ANSWER_PLACEHOLDER);
    }

    #[test]
    fn keys_pressed_on_the_clue_screen_are_not_typed() {
        let mut app = view_app("theSpot");
        type_text(&mut app, "blue");
        enter(&mut app);
        assert_eq!(phase(&app), QuizPhase::Revealed);

        key(&mut app, KeyCode::KeyQ, Key::Character("q".into()), Some("q"));
        app.world_mut()
            .write_message(QuizEvent::Navigate("theBench".to_string()));
        settle(&mut app);

        assert_eq!(phase(&app), QuizPhase::Question);
        assert!(app.world().resource::<QuizSession>().input.is_empty());
        assert_eq!(answer_field(&mut app), ANSWER_PLACEHOLDER);
    }

    #[test]
    fn keys_pressed_while_loading_are_not_typed() {
        let mut app = view_app("theCastle");
        key(&mut app, KeyCode::KeyZ, Key::Character("z".into()), Some("z"));
        app.update();
        app.world_mut()
            .write_message(QuizEvent::Navigate("theSpot".to_string()));
        settle(&mut app);

        assert_eq!(phase(&app), QuizPhase::Question);
        assert_eq!(answer_field(&mut app), ANSWER_PLACEHOLDER);
    }

    #[test]
    fn unknown_location_stays_on_loading_screen() {
        let mut app = view_app("theCastle");
        type_text(&mut app, "blue");
        enter(&mut app);

        assert_eq!(phase(&app), QuizPhase::Loading);
        assert!(texts(&mut app).contains(&"Loading location...".to_string()));
        assert_eq!(image_count(&mut app), 0);
    }

    #[test]
    fn pulse_stays_between_min_and_opaque() {
        assert!((pulse_alpha(0.0) - 1.0).abs() < 1e-5);
        assert!((pulse_alpha(PULSE_PERIOD / 2.0) - PULSE_MIN).abs() < 1e-5);
        for step in 0..40 {
            let alpha = pulse_alpha(step as f32 * 0.1);
            assert!((PULSE_MIN - 1e-5..=1.0 + 1e-5).contains(&alpha));
        }
    }

    #[test]
    fn only_the_final_location_shows_completion() {
        let registry = Registry::default();
        for id in LocationId::iter() {
            let entry = registry.get(id).unwrap();
            let expected = if id == LocationId::TheRock {
                COMPLETE_MESSAGE
            } else {
                NEXT_CLUE_HINT
            };
            assert_eq!(reveal_message(entry), expected, "{id}");
        }
    }

    #[test]
    fn empty_draft_shows_placeholder() {
        assert_eq!(
            answer_display(""),
            (ANSWER_PLACEHOLDER.to_string(), PLACEHOLDER)
        );
        assert_eq!(answer_display("blu"), ("blu".to_string(), BODY));
    }

    #[test]
    fn control_characters_are_not_typed() {
        assert!(is_printable_char('a'));
        assert!(is_printable_char(' '));
        assert!(is_printable_char('é'));
        assert!(!is_printable_char('\r'));
        assert!(!is_printable_char('\u{7f}'));
        assert!(!is_printable_char('\u{f700}'));
    }
}
