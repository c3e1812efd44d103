use crate::browser;
use crate::engine::Screen;
use crate::loader::style::VisualStyle;
use anyhow::{anyhow, Result};
use futures::channel::oneshot;
use web_sys::{HtmlButtonElement, HtmlDivElement, Node};

pub const ROOT_ID: &str = "space-smash-root";
pub const INSTRUCTIONS_ID: &str = "space-smash-instructions";
pub const PLAY_BUTTON_ID: &str = "space-smash-play";

// TABLE:
// ┌──────────────── DOM Overlay (over the canvas) ───────────────────┐
// │ #space-smash-root          absolute, sized to the canvas rect    │
// │  ├─ attribution            top, small text + optional icon       │
// │  ├─ title                  bordered box, 35% from the top        │
// │  ├─ #space-smash-instructions   bottom, attached after the fade  │
// │  └─ #space-smash-play      60% from the top, attached on input   │
// └──────────────────────────────────────────────────────────────────┘
pub struct OverlayDom {
    root: HtmlDivElement,
    instructions: HtmlDivElement,
    play_button: HtmlButtonElement,
}

impl OverlayDom {
    /// Builds every element, attaches the root with title and attribution.
    /// Instructions and the play button stay detached until asked for.
    pub fn new(style: &VisualStyle) -> Result<Self> {
        let root = create_root()?;
        let title = create_title(style)?;
        let attribution = create_attribution(style)?;
        append(&root, &title)?;
        append(&root, &attribution)?;
        Ok(OverlayDom {
            root,
            instructions: create_instructions(style)?,
            play_button: create_play_button(style)?,
        })
    }

    pub fn root(&self) -> &HtmlDivElement {
        &self.root
    }

    pub fn play_button(&self) -> &HtmlButtonElement {
        &self.play_button
    }

    pub fn instructions(&self) -> &HtmlDivElement {
        &self.instructions
    }

    pub fn is_attached(&self) -> bool {
        self.root.is_connected()
    }

    /// Match the root to where the canvas sits on the page
    pub fn position_and_size(&self, screen: &Screen) -> Result<()> {
        let bounds = &screen.bounds;
        browser::set_styles(
            &self.root,
            &[
                ("left", format!("{}px", bounds.x).as_str()),
                ("top", format!("{}px", bounds.y).as_str()),
                ("width", format!("{}px", bounds.width).as_str()),
                ("height", format!("{}px", bounds.height).as_str()),
            ],
        )
    }

    pub fn show_instructions(&self) -> Result<()> {
        append(&self.root, &self.instructions)
    }

    pub fn set_instruction(&self, text: &str) {
        self.instructions.set_inner_text(text);
    }

    pub fn show_play_button(&self) -> Result<()> {
        browser::set_styles(&self.play_button, &[("display", "block")])
    }

    pub fn attach_play_button(&self) -> Result<()> {
        append(&self.root, &self.play_button)
    }

    pub fn hide_play_button(&self) -> Result<()> {
        browser::set_styles(&self.play_button, &[("display", "none")])
    }

    /// Resolves on the next click of the play button
    /// - the click doesn't reach the canvas or anything behind the button
    pub fn play_clicked(&self) -> Result<oneshot::Receiver<()>> {
        let (tx, rx) = oneshot::channel();
        browser::add_event_listener_once(&self.play_button, "click", move |event| {
            event.stop_propagation();
            event.prevent_default();
            let _ = tx.send(());
        })?;
        Ok(rx)
    }

    /// removes the root and everything under it
    pub fn dispose(&self) {
        self.root.remove();
    }
}

fn append(parent: &Node, child: &Node) -> Result<()> {
    parent
        .append_child(child)
        .map(|_| ())
        .map_err(|err| anyhow!("Could not append overlay element : {:#?}", err))
}

fn create_root() -> Result<HtmlDivElement> {
    let root = browser::create_element::<HtmlDivElement>("div")?;
    // first overlay on the page owns the root id
    if !browser::element_exists(ROOT_ID)? {
        let body = browser::body()?;
        append(&body, &root)?;
    }
    root.set_id(ROOT_ID);
    browser::set_styles(&root, &[("position", "absolute")])?;
    Ok(root)
}

fn create_title(style: &VisualStyle) -> Result<HtmlDivElement> {
    let title = browser::create_element::<HtmlDivElement>("div")?;
    let color = style.text_color.0.to_css();
    browser::set_styles(
        &title,
        &[
            ("position", "absolute"),
            ("width", "500px"),
            ("height", "100px"),
            ("top", "35%"),
            ("left", "50%"),
            ("text-align", "center"),
            ("transform", "translate(-50%, -50%)"),
            ("display", "block"),
            ("font-family", style.font_family.as_str()),
            ("font-size", "40px"),
            ("z-index", "1001"),
            ("border", format!("2px solid {}", color).as_str()),
            ("border-radius", "25px"),
            ("color", color.as_str()),
        ],
    )?;

    let text = browser::create_element::<HtmlDivElement>("div")?;
    browser::set_styles(
        &text,
        &[
            ("display", "flex"),
            ("justify-content", "center"),
            ("align-items", "center"),
            ("height", "100%"),
        ],
    )?;
    text.set_inner_text(&style.title);
    append(&title, &text)?;
    Ok(title)
}

fn create_attribution(style: &VisualStyle) -> Result<HtmlDivElement> {
    let attribution = browser::create_element::<HtmlDivElement>("div")?;
    browser::set_styles(
        &attribution,
        &[
            ("position", "absolute"),
            ("width", "500px"),
            ("height", "100px"),
            ("top", "10px"),
            ("left", "50%"),
            ("text-align", "center"),
            ("transform", "translateX(-50%)"),
            ("display", "block"),
            ("font-family", style.font_family.as_str()),
            ("font-size", "15px"),
            ("z-index", "1001"),
            ("color", style.text_color.0.to_css().as_str()),
        ],
    )?;
    attribution.set_inner_text(&style.attribution);

    if let Some(source) = &style.attribution_icon {
        let icon = browser::create_html_image_element()?;
        icon.set_src(source);
        browser::set_styles(
            &icon,
            &[
                ("position", "relative"),
                ("width", "20px"),
                ("height", "20px"),
                ("top", "4px"),
                ("left", "4px"),
            ],
        )?;
        append(&attribution, &icon)?;
    }
    Ok(attribution)
}

fn create_instructions(style: &VisualStyle) -> Result<HtmlDivElement> {
    let instructions = browser::create_element::<HtmlDivElement>("div")?;
    instructions.set_id(INSTRUCTIONS_ID);
    browser::set_styles(
        &instructions,
        &[
            ("position", "absolute"),
            ("width", "600px"),
            ("height", "50px"),
            ("bottom", "5px"),
            ("left", "50%"),
            ("text-align", "center"),
            ("transform", "translateX(-50%)"),
            ("display", "block"),
            ("font-family", style.font_family.as_str()),
            ("font-size", "15px"),
            ("z-index", "1001"),
            ("color", style.text_color.0.to_css().as_str()),
        ],
    )?;
    if let Some(first) = style.instructions.first() {
        instructions.set_inner_text(first);
    }
    Ok(instructions)
}

fn create_play_button(style: &VisualStyle) -> Result<HtmlButtonElement> {
    let button = browser::create_element::<HtmlButtonElement>("button")?;
    button.set_id(PLAY_BUTTON_ID);
    browser::set_styles(
        &button,
        &[
            ("position", "absolute"),
            ("width", "100px"),
            ("height", "50px"),
            ("top", "60%"),
            ("left", "50%"),
            ("transform", "translateX(-50%)"),
            ("font-family", style.font_family.as_str()),
            ("display", "none"),
            ("z-index", "1000"),
            ("border", format!("2px solid {}", style.text_color.0.to_css()).as_str()),
            ("border-radius", "25px"),
        ],
    )?;
    button.set_inner_text("PLAY");
    Ok(button)
}
