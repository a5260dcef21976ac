//! On-screen control layout as seen by the input engine.
//!
//! The layout is read-only to the engine except for the geometry mutation of an
//! edit-mode drag and the value edits of the element configuration editor.
//! Rendering and storage belong to the platform.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Size key for the joystick area in the persisted size map
pub const JOYSTICK_SIZE_KEY: &str = "JOYSTICK";
pub const JOYSTICK_ELEMENT_ID: &str = "joystick-area";
pub const DEFAULT_JOYSTICK_SIZE: f64 = 150.0;
pub const DEFAULT_BUTTON_SIZE: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Rect of the given size centered on `center`.
    pub fn centered(center: Point, width: f64, height: f64) -> Self {
        Self::new(center.x - width / 2.0, center.y - height / 2.0, width, height)
    }

    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    pub fn origin(&self) -> Point {
        Point::new(self.left, self.top)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left
            && p.x <= self.left + self.width
            && p.y >= self.top
            && p.y <= self.top + self.height
    }
}

/// Screen size in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 400.0,
        }
    }
}

impl Viewport {
    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }

    pub fn left_zone(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width / 2.0, self.height)
    }

    pub fn right_zone(&self) -> Rect {
        Rect::new(self.width / 2.0, 0.0, self.width / 2.0, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Button,
    Joystick,
    /// Container around D-pad buttons; a control surface but not pressable itself
    DpadCluster,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Zone {
    Left,
    Right,
}

/// What a button sends when pressed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Binding {
    /// Named logical button (`A`, `L1`, `DPAD_UP`, ...), sent as `btn`
    Logical(String),
    /// Raw key or button code (`KEY_W`, `BTN_LEFT`, custom text), sent as `key`
    RawKey(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutElement {
    pub id: String,
    pub kind: ElementKind,
    pub zone: Zone,
    pub rect: Rect,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub binding: Option<Binding>,
}

impl LayoutElement {
    pub fn button(id: &str, label: &str, binding: Binding, zone: Zone, rect: Rect) -> Self {
        Self {
            id: id.to_string(),
            kind: ElementKind::Button,
            zone,
            rect,
            label: label.to_string(),
            binding: Some(binding),
        }
    }

    pub fn is_draggable(&self) -> bool {
        matches!(self.kind, ElementKind::Button | ElementKind::Joystick)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeftInputStyle {
    #[default]
    Joystick,
    Dpad,
    LrButtons,
}

/// Values handed over by the element configuration editor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementConfig {
    pub label: String,
    /// Value picked from the id dropdown (logical id or `KEY_*`/`BTN_*` code)
    #[serde(default)]
    pub selection: Option<String>,
    /// Free-text key entered when nothing was picked
    #[serde(default)]
    pub custom_key: Option<String>,
    #[serde(default)]
    pub size: Option<f64>,
}

impl ElementConfig {
    /// Resolves the binding the editor values describe, if any.
    pub fn binding(&self) -> Option<Binding> {
        let selection = self.selection.as_deref().filter(|s| !s.is_empty());
        let custom = self.custom_key.as_deref().filter(|s| !s.is_empty());

        match (selection, custom) {
            (Some(sel), _) if sel.starts_with("KEY_") || sel.starts_with("BTN_") => {
                Some(Binding::RawKey(sel.to_string()))
            }
            (Some(sel), _) => Some(Binding::Logical(sel.to_string())),
            (None, Some(key)) => Some(Binding::RawKey(key.to_string())),
            (None, None) => None,
        }
    }
}

/// All elements currently on screen, bottom to top
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub elements: Vec<LayoutElement>,
}

impl Layout {
    /// Default face buttons in the right zone plus the left zone for `style`.
    pub fn default_for(
        style: LeftInputStyle,
        sizes: &HashMap<String, f64>,
        viewport: Viewport,
    ) -> Self {
        let zone = viewport.right_zone();
        let c = zone.center();
        let step = DEFAULT_BUTTON_SIZE;
        let face = [
            ("btn-a", "A", Point::new(c.x, c.y + step)),
            ("btn-b", "B", Point::new(c.x + step, c.y)),
            ("btn-x", "X", Point::new(c.x - step, c.y)),
            ("btn-y", "Y", Point::new(c.x, c.y - step)),
        ];

        let mut layout = Self {
            elements: face
                .iter()
                .map(|(id, label, at)| {
                    LayoutElement::button(
                        id,
                        label,
                        Binding::Logical(label.to_string()),
                        Zone::Right,
                        Rect::centered(*at, DEFAULT_BUTTON_SIZE, DEFAULT_BUTTON_SIZE),
                    )
                })
                .collect(),
        };
        layout.rebuild_left_zone(style, sizes, viewport);
        layout
    }

    pub fn get(&self, id: &str) -> Option<&LayoutElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut LayoutElement> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    pub fn joystick(&self) -> Option<&LayoutElement> {
        self.elements
            .iter()
            .find(|e| e.kind == ElementKind::Joystick)
    }

    /// Topmost element under `p`.
    pub fn hit_test(&self, p: Point) -> Option<&LayoutElement> {
        self.elements.iter().rev().find(|e| e.rect.contains(p))
    }

    /// Replaces the left zone with the elements of `style`.
    pub fn rebuild_left_zone(
        &mut self,
        style: LeftInputStyle,
        sizes: &HashMap<String, f64>,
        viewport: Viewport,
    ) {
        self.elements.retain(|e| e.zone != Zone::Left);
        let center = viewport.left_zone().center();

        let mut left = match style {
            LeftInputStyle::Joystick => {
                let size = sizes
                    .get(JOYSTICK_SIZE_KEY)
                    .copied()
                    .unwrap_or(DEFAULT_JOYSTICK_SIZE);
                vec![LayoutElement {
                    id: JOYSTICK_ELEMENT_ID.to_string(),
                    kind: ElementKind::Joystick,
                    zone: Zone::Left,
                    rect: Rect::centered(center, size, size),
                    label: String::new(),
                    binding: None,
                }]
            }
            LeftInputStyle::Dpad => {
                let b = 60.0;
                let mut cluster = vec![LayoutElement {
                    id: "dpad-container".to_string(),
                    kind: ElementKind::DpadCluster,
                    zone: Zone::Left,
                    rect: Rect::centered(center, b * 3.0, b * 3.0),
                    label: String::new(),
                    binding: None,
                }];
                let directions = [
                    ("DPAD_UP", "▲", Point::new(center.x, center.y - b)),
                    ("DPAD_LEFT", "◀", Point::new(center.x - b, center.y)),
                    ("DPAD_RIGHT", "▶", Point::new(center.x + b, center.y)),
                    ("DPAD_DOWN", "▼", Point::new(center.x, center.y + b)),
                ];
                cluster.extend(directions.iter().map(|(id, label, at)| {
                    LayoutElement::button(
                        &id.to_lowercase(),
                        label,
                        Binding::Logical(id.to_string()),
                        Zone::Left,
                        Rect::centered(*at, b, b),
                    )
                }));
                cluster
            }
            LeftInputStyle::LrButtons => {
                let b = 80.0;
                vec![
                    LayoutElement::button(
                        "lr-left",
                        "◀",
                        Binding::Logical("DPAD_LEFT".to_string()),
                        Zone::Left,
                        Rect::centered(Point::new(center.x - b * 0.75, center.y), b, b),
                    ),
                    LayoutElement::button(
                        "lr-right",
                        "▶",
                        Binding::Logical("DPAD_RIGHT".to_string()),
                        Zone::Left,
                        Rect::centered(Point::new(center.x + b * 0.75, center.y), b, b),
                    ),
                ]
            }
        };

        // left zone renders underneath the right zone buttons
        left.append(&mut self.elements);
        self.elements = left;
    }

    pub fn move_element(&mut self, id: &str, top_left: Point) -> bool {
        match self.get_mut(id) {
            Some(element) => {
                element.rect.left = top_left.x;
                element.rect.top = top_left.y;
                true
            }
            None => false,
        }
    }

    /// Resizes the joystick area around its current center.
    pub fn resize_joystick(&mut self, size: f64) -> bool {
        match self
            .elements
            .iter_mut()
            .find(|e| e.kind == ElementKind::Joystick)
        {
            Some(area) => {
                area.rect = Rect::centered(area.rect.center(), size, size);
                true
            }
            None => false,
        }
    }

    /// Applies editor values to a button; returns false when the element is unknown.
    pub fn apply_config(&mut self, id: &str, config: &ElementConfig) -> bool {
        let Some(element) = self.get_mut(id) else {
            return false;
        };
        element.label = config.label.clone();
        if let Some(binding) = config.binding() {
            element.binding = Some(binding);
        }
        if let Some(size) = config.size.filter(|s| *s > 0.0) {
            element.rect.width = size;
            element.rect.height = size;
        }
        true
    }

    /// Adds a new `A` button in the middle of the right zone and returns its id.
    pub fn add_button(&mut self, viewport: Viewport) -> String {
        let mut n = self.elements.len();
        let id = loop {
            let candidate = format!("btn-{}", n);
            if self.get(&candidate).is_none() {
                break candidate;
            }
            n += 1;
        };
        self.elements.push(LayoutElement::button(
            &id,
            "N",
            Binding::Logical("A".to_string()),
            Zone::Right,
            Rect::centered(
                viewport.right_zone().center(),
                DEFAULT_BUTTON_SIZE,
                DEFAULT_BUTTON_SIZE,
            ),
        ));
        id
    }

    pub fn remove_element(&mut self, id: &str) -> bool {
        let before = self.elements.len();
        self.elements.retain(|e| e.id != id);
        self.elements.len() != before
    }

    /// The user-editable part of the layout; the left zone is derived from the style.
    pub fn right_zone(&self) -> Vec<LayoutElement> {
        self.elements
            .iter()
            .filter(|e| e.zone == Zone::Right)
            .cloned()
            .collect()
    }

    pub fn replace_right_zone(&mut self, elements: Vec<LayoutElement>) {
        self.elements.retain(|e| e.zone != Zone::Right);
        self.elements
            .extend(elements.into_iter().filter(|e| e.zone == Zone::Right));
    }
}
