use crate::engine::{self, LoadTracker};
use anyhow::{Context, Result};
use futures::join;
use web_sys::HtmlImageElement;

// ==================== Manifest ====================
pub const PLAYER_LEGS: &str = "assets/playerlegs.png";
pub const PLAYER_UPPER: &str = "assets/playerupper.png";
pub const PLAYER_UPPER_WEAPON: &str = "assets/playerupperweapon.png";
pub const SPACESHIP: &str = "assets/spaceship.png";

pub const MANIFEST: [&str; 4] = [PLAYER_LEGS, PLAYER_UPPER, PLAYER_UPPER_WEAPON, SPACESHIP];

/// Every image the game needs before it can start
pub struct Resources {
    pub legs: HtmlImageElement,
    pub upper: HtmlImageElement,
    pub upper_weapon: HtmlImageElement,
    pub spaceship: HtmlImageElement,
}

impl Resources {
    /// Loads the whole manifest in parallel, each image bumps `tracker` as
    /// it arrives
    pub async fn load(tracker: &LoadTracker) -> Result<Self> {
        let (legs, upper, upper_weapon, spaceship) = join!(
            tracker.track(load_image(PLAYER_LEGS)),
            tracker.track(load_image(PLAYER_UPPER)),
            tracker.track(load_image(PLAYER_UPPER_WEAPON)),
            tracker.track(load_image(SPACESHIP)),
        );
        Ok(Resources {
            legs: legs?,
            upper: upper?,
            upper_weapon: upper_weapon?,
            spaceship: spaceship?,
        })
    }
}

async fn load_image(path: &'static str) -> Result<HtmlImageElement> {
    engine::load_image(path)
        .await
        .with_context(|| format!("Failed to load image resource from : {}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn manifest_lists_each_png_once() {
        let unique: HashSet<_> = MANIFEST.iter().collect();
        assert_eq!(unique.len(), MANIFEST.len());
        assert!(MANIFEST
            .iter()
            .all(|path| path.starts_with("assets/") && path.ends_with(".png")));
    }
}
