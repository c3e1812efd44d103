// ==================== Imports ====================
use engine::GameLoop;
use game::SpaceSmash;
use loader::style::VisualStyle;
use loader::LoadingOverlay;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

#[macro_use]
pub mod browser;
pub mod engine;
pub mod game;
pub mod loader;
pub mod resources;

// optional, every missing field keeps its default
const STYLE_PATH: &str = "loader.json";

// ==================== Main Functions ====================
/// Main entry for Webassembly module
/// - loads the loader style
/// - builds the loading overlay
/// - starts the game loop, which loads resources behind the overlay
#[wasm_bindgen]
pub fn main_js() -> Result<(), JsValue> {
    // setup better panic messages for debugging
    console_error_panic_hook::set_once();

    // spawns a new asynchronous task in local thread, for web assembly
    // environment, using wasm_bindgen_futures
    browser::spawn_local(async move {
        let style = VisualStyle::load(STYLE_PATH).await.unwrap_or_else(|err| {
            log!("Using the default loader style : {:#}", err);
            VisualStyle::default()
        });
        let overlay = LoadingOverlay::new(style).expect("Could not create loading overlay");

        GameLoop::start(SpaceSmash::new(), Rc::new(overlay))
            .await
            .expect("Could not start game loop");
    });

    Ok(())
}
