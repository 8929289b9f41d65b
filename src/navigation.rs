// Resolves the active location from the URL fragment.
//
// On the web the fragment comes from `window.location.hash` and every
// `hashchange` notification re-resolves it. Native builds take the initial
// fragment from the first command-line argument.

use std::sync::mpsc::Sender;

use bevy::prelude::*;

use crate::locations::{LocationId, Registry};
use crate::quiz::QuizEvent;
#[cfg(target_arch = "wasm32")]
use crate::quiz::QuizSet;

pub struct NavigationPlugin;

impl Plugin for NavigationPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, resolve_initial_fragment);

        #[cfg(target_arch = "wasm32")]
        app.add_systems(Startup, web::listen_for_hash_changes)
            .add_systems(Update, web::forward_hash_changes.in_set(QuizSet::Navigate));
    }
}

/// Strips the leading `#`. An empty fragment selects `start`; anything else is
/// passed through unchanged, known location or not.
pub fn resolve_fragment(hash: &str, start: LocationId) -> String {
    let fragment = hash.strip_prefix('#').unwrap_or(hash);
    if fragment.is_empty() {
        <&'static str>::from(start).to_owned()
    } else {
        fragment.to_string()
    }
}

fn resolve_initial_fragment(registry: Res<Registry>, mut events: MessageWriter<QuizEvent>) {
    let hash = current_hash().unwrap_or_default();
    events.write(QuizEvent::Navigate(resolve_fragment(&hash, registry.start())));
}

#[cfg(not(target_arch = "wasm32"))]
fn current_hash() -> Option<String> {
    std::env::args().nth(1)
}

#[cfg(target_arch = "wasm32")]
fn current_hash() -> Option<String> {
    let Some(window) = web_sys::window() else {
        warn!("no browser window, using the start location");
        return None;
    };
    window.location().hash().ok()
}

/// Hands a fragment to the app. Returns `false` once the app has stopped
/// draining the queue.
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
fn queue_hash(sender: &Sender<String>, hash: String) -> bool {
    match sender.send(hash) {
        Ok(()) => true,
        Err(err) => {
            debug!("dropping fragment {:?}, nothing is listening", err.0);
            false
        }
    }
}

#[cfg(target_arch = "wasm32")]
mod web {
    use std::sync::Mutex;
    use std::sync::mpsc::{Receiver, channel};

    use bevy::prelude::*;
    use wasm_bindgen::JsCast;
    use wasm_bindgen::closure::Closure;

    use super::{current_hash, queue_hash, resolve_fragment};
    use crate::locations::Registry;
    use crate::quiz::QuizEvent;

    /// Fragments queued by the `hashchange` listener, drained once per frame.
    #[derive(Resource)]
    pub(super) struct HashChanges(Mutex<Receiver<String>>);

    pub(super) fn listen_for_hash_changes(mut commands: Commands) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let (sender, receiver) = channel();
        let listener = Closure::<dyn FnMut()>::new(move || {
            queue_hash(&sender, current_hash().unwrap_or_default());
        });
        if let Err(err) = window
            .add_event_listener_with_callback("hashchange", listener.as_ref().unchecked_ref())
        {
            warn!("could not listen for hashchange: {err:?}");
            return;
        }
        // The listener lives as long as the page.
        listener.forget();
        commands.insert_resource(HashChanges(Mutex::new(receiver)));
    }

    pub(super) fn forward_hash_changes(
        changes: Option<Res<HashChanges>>,
        registry: Res<Registry>,
        mut events: MessageWriter<QuizEvent>,
    ) {
        let Some(changes) = changes else {
            return;
        };
        let Ok(receiver) = changes.0.lock() else {
            return;
        };
        for hash in receiver.try_iter() {
            events.write(QuizEvent::Navigate(resolve_fragment(&hash, registry.start())));
        }
    }
}
