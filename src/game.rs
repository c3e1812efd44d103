use crate::engine::input::KeyState;
use crate::engine::{Game, LoadTracker, Point, Rect, Renderer};
use crate::resources::Resources;
use anyhow::{anyhow, Result};
use async_trait::async_trait;

const SCREEN_WIDTH: f32 = 800.0;
const SCREEN_HEIGHT: f32 = 600.0;
const SHIP_SPEED: f32 = 4.0;

pub enum SpaceSmash {
    Loading,
    Loaded(Hangar),
}

impl SpaceSmash {
    pub fn new() -> Self {
        SpaceSmash::Loading
    }
}

impl Default for SpaceSmash {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl Game for SpaceSmash {
    // returning a new boxed Game means the Loading variant is never updated
    async fn initialize(&self, tracker: &LoadTracker) -> Result<Box<dyn Game>> {
        match self {
            SpaceSmash::Loading => {
                let resources = Resources::load(tracker).await?;
                Ok(Box::new(SpaceSmash::Loaded(Hangar::new(resources))))
            }
            SpaceSmash::Loaded(_) => Err(anyhow!("Game is already initialized")),
        }
    }

    fn update(&mut self, keystate: &KeyState) {
        if let SpaceSmash::Loaded(hangar) = self {
            let mut velocity = Point::default();
            if keystate.is_pressed("ArrowRight") {
                velocity.x += SHIP_SPEED;
            }
            if keystate.is_pressed("ArrowLeft") {
                velocity.x -= SHIP_SPEED;
            }
            if keystate.is_pressed("ArrowUp") {
                velocity.y -= SHIP_SPEED;
            }
            if keystate.is_pressed("ArrowDown") {
                velocity.y += SHIP_SPEED;
            }
            hangar.ship = step(hangar.ship, velocity);
        }
    }

    fn draw(&self, renderer: &Renderer) {
        if let SpaceSmash::Loaded(hangar) = self {
            renderer.clear(&Rect::new(0.0, 0.0, SCREEN_WIDTH, SCREEN_HEIGHT));
            // Draw order matters : ship -> legs -> torso -> weapon
            let resources = &hangar.resources;
            renderer.draw_entire_image(&resources.spaceship, &hangar.ship);
            renderer.draw_entire_image(&resources.legs, &hangar.player);
            renderer.draw_entire_image(&resources.upper, &hangar.player);
            renderer.draw_entire_image(&resources.upper_weapon, &hangar.player);
        }
    }
}

pub struct Hangar {
    resources: Resources,
    ship: Point,
    player: Point,
}

impl Hangar {
    fn new(resources: Resources) -> Self {
        Hangar {
            resources,
            ship: Point {
                x: SCREEN_WIDTH / 2.0,
                y: SCREEN_HEIGHT / 2.0,
            },
            player: Point { x: 100.0, y: 450.0 },
        }
    }
}

/// move by `velocity`, staying on screen
fn step(position: Point, velocity: Point) -> Point {
    Point {
        x: (position.x + velocity.x).clamp(0.0, SCREEN_WIDTH),
        y: (position.y + velocity.y).clamp(0.0, SCREEN_HEIGHT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ship_moves_by_velocity() {
        let moved = step(Point { x: 10.0, y: 10.0 }, Point { x: SHIP_SPEED, y: -SHIP_SPEED });
        assert_relative_eq!(moved.x, 14.0);
        assert_relative_eq!(moved.y, 6.0);
    }

    #[test]
    fn ship_stays_on_screen() {
        let corner = step(Point::default(), Point { x: -SHIP_SPEED, y: -SHIP_SPEED });
        assert_eq!(corner, Point::default());
        let edge = step(
            Point { x: SCREEN_WIDTH, y: SCREEN_HEIGHT },
            Point { x: SHIP_SPEED, y: SHIP_SPEED },
        );
        assert_relative_eq!(edge.x, SCREEN_WIDTH);
        assert_relative_eq!(edge.y, SCREEN_HEIGHT);
    }
}
