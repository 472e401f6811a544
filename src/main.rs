//! Plinth: blocks and transaction outputs dropped onto a physics plinth.

use bevy::prelude::*;
use drop_machine::sdk::VisualizerBuilder;

fn main() -> AppExit {
    let _ = dotenvy::dotenv();

    let builder = match VisualizerBuilder::from_env() {
        Ok(builder) => builder,
        Err(err) => {
            eprintln!("plinth: {err}");
            return AppExit::error();
        }
    };
    match builder.build() {
        Ok(mut app) => app.run(),
        Err(err) => {
            eprintln!("plinth: {err}");
            AppExit::error()
        }
    }
}
