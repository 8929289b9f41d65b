// Hunt locations and the static registry that maps them to their riddles.

use std::collections::HashMap;

use bevy::prelude::*;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Location keys. The string form is what appears after `#` in the URL.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "camelCase")]
pub enum LocationId {
    TheSpot,
    TheBench,
    TheWitch,
    TheRock,
}

pub const START_LOCATION: LocationId = LocationId::TheSpot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationEntry {
    pub name: &'static str,
    pub question: &'static str,
    pub answer: &'static str,
    /// Asset path of the clue image, relative to `assets/`.
    pub clue_image: &'static str,
    /// `None` marks the final location.
    pub next: Option<LocationId>,
}

impl LocationEntry {
    pub fn is_last(&self) -> bool {
        self.next.is_none()
    }
}

impl LocationId {
    fn entry(self) -> LocationEntry {
        match self {
            LocationId::TheSpot => LocationEntry {
                name: "The Spot",
                question: "What's my favourite colour?",
                answer: "blue",
                clue_image: "clues/location1-clue.png",
                next: Some(LocationId::TheBench),
            },
            LocationId::TheBench => LocationEntry {
                name: "The Bench",
                question: "What's my favourite fruit?",
                answer: "watermelon",
                clue_image: "clues/location2-clue.png",
                next: Some(LocationId::TheWitch),
            },
            LocationId::TheWitch => LocationEntry {
                name: "The Witch",
                question: "What's my favourite drink?",
                answer: "dirty chai latte",
                clue_image: "clues/location3-clue.png",
                next: Some(LocationId::TheRock),
            },
            LocationId::TheRock => LocationEntry {
                name: "The Rock",
                question: "What's my favourite Disney movie?",
                answer: "Atlantis",
                clue_image: "clues/location4-clue.png",
                next: None,
            },
        }
    }
}

/// Read-only lookup table built once at startup.
#[derive(Resource, Debug, Clone)]
pub struct Registry {
    start: LocationId,
    entries: HashMap<LocationId, LocationEntry>,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            start: START_LOCATION,
            entries: LocationId::iter().map(|id| (id, id.entry())).collect(),
        }
    }
}

impl Registry {
    pub fn start(&self) -> LocationId {
        self.start
    }

    pub fn get(&self, id: LocationId) -> Option<&LocationEntry> {
        self.entries.get(&id)
    }

    /// Looks up a raw fragment. Anything that is not exactly a location key
    /// yields `None`.
    pub fn lookup(&self, fragment: &str) -> Option<(LocationId, &LocationEntry)> {
        let id = fragment.parse::<LocationId>().ok()?;
        self.get(id).map(|entry| (id, entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
