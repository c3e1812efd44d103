use crate::browser;
use crate::engine::Color;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Everything cosmetic about the loading screen
/// - deserialized from `loader.json`, every field falls back to its default
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct VisualStyle {
    pub background_color: HexColor,
    pub bar_color: HexColor,
    pub text_color: HexColor,
    pub bar_width: f32,
    pub bar_height: f32,
    pub bar_margin: f32,
    /// distance between the bar's top edge and the canvas bottom
    pub bar_bottom_offset: f32,
    pub bar_radius: f32,
    pub fill_radius: f32,
    pub min_fill_width: f32,
    pub line_width: f32,
    pub font_family: String,
    pub title: String,
    pub attribution: String,
    pub attribution_icon: Option<String>,
    pub instructions: Vec<String>,
}

impl Default for VisualStyle {
    fn default() -> Self {
        VisualStyle {
            background_color: HexColor(Color::rgb(0x22, 0x22, 0x22)),
            bar_color: HexColor(Color::WHITE),
            text_color: HexColor(Color::WHITE),
            bar_width: 200.0,
            bar_height: 20.0,
            bar_margin: 5.0,
            bar_bottom_offset: 50.0,
            bar_radius: 10.0,
            fill_radius: 5.0,
            min_fill_width: 10.0,
            line_width: 2.0,
            font_family: "Black Ops One".into(),
            title: "EX SPACE SMASH".into(),
            attribution: "Made with Rust + WebAssembly".into(),
            attribution_icon: None,
            instructions: [
                "USE EITHER YOUR GAMEPAD, KEYBOARD, MOUSE, OR TOUCH TO START",
                "PRESS START ON GAMEPAD",
                "PRESS ENTER ON KEYBOARD",
                "CLICK PLAY BUTTON WITH MOUSE",
                "TOUCH PLAY BUTTON WITH TOUCHSCREEN",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl VisualStyle {
    pub async fn load(path: &str) -> Result<Self> {
        browser::fetch_json::<VisualStyle>(path)
            .await
            .with_context(|| format!("Failed to load loader style from : {}", path))
    }
}

/// `Color` that reads and writes as a `#RRGGBB[AA]` string
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(pub Color);

impl TryFrom<String> for HexColor {
    type Error = anyhow::Error;

    fn try_from(hex: String) -> Result<Self> {
        Color::from_hex(&hex).map(HexColor)
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.0.to_hex()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_style_matches_the_stock_loading_screen() {
        let style = VisualStyle::default();
        assert_eq!(style.background_color.0.to_hex(), "#222222");
        assert_eq!(style.bar_color.0, Color::WHITE);
        assert_relative_eq!(style.bar_width, 200.0);
        assert_relative_eq!(style.bar_height, 20.0);
        assert_eq!(style.instructions.len(), 5);
        assert!(style.instructions[0].starts_with("USE EITHER"));
    }

    #[test]
    fn hex_color_converts_through_strings() {
        let color = HexColor::try_from(String::from("#FF000080")).unwrap();
        assert_eq!((color.0.r, color.0.g, color.0.b), (255, 0, 0));
        assert_eq!(String::from(color), "#FF000080");
        assert!(HexColor::try_from(String::from("red")).is_err());
    }
}
