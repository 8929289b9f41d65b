// Main
mod locations;
mod navigation;
mod quiz;
mod view;

use bevy::asset::AssetMetaCheck;
use bevy::prelude::*;
use navigation::NavigationPlugin;
use quiz::QuizPlugin;
use view::QuizViewPlugin;

fn main() {
    App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Treasure Hunt".into(),
                        fit_canvas_to_parent: true,
                        ..default()
                    }),
                    ..default()
                })
                .set(AssetPlugin {
                    // Static hosts serve no `.meta` files.
                    meta_check: AssetMetaCheck::Never,
                    ..default()
                }),
        )
        .add_plugins((QuizPlugin, NavigationPlugin, QuizViewPlugin))
        .run();
}
