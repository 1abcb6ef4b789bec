//! Platform abstraction layer
//!
//! Turns raw key state into per-tick [`TickInput`]. Capturing the key events
//! is up to the host (window, terminal or test driver); this only tracks
//! which keys are down now and which were down on the previous tick.

use std::collections::HashSet;

use glam::Vec2;

use crate::sim::TickInput;

/// Keys the game reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    W,
    A,
    S,
    D,
    Space,
    Z,
    X,
    Escape,
    Enter,
}

impl Key {
    /// Map a DOM-style key name (`"ArrowUp"`, `" "`, `"z"`)
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ArrowUp" => Some(Key::Up),
            "ArrowDown" => Some(Key::Down),
            "ArrowLeft" => Some(Key::Left),
            "ArrowRight" => Some(Key::Right),
            "w" | "W" => Some(Key::W),
            "a" | "A" => Some(Key::A),
            "s" | "S" => Some(Key::S),
            "d" | "D" => Some(Key::D),
            " " | "Space" => Some(Key::Space),
            "z" | "Z" => Some(Key::Z),
            "x" | "X" => Some(Key::X),
            "Escape" => Some(Key::Escape),
            "Enter" => Some(Key::Enter),
            _ => None,
        }
    }
}

/// Held keys this tick and last tick
#[derive(Debug, Clone, Default)]
pub struct KeyboardState {
    held: HashSet<Key>,
    previous: HashSet<Key>,
}

impl KeyboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: Key, down: bool) {
        if down {
            self.held.insert(key);
        } else {
            self.held.remove(&key);
        }
    }

    pub fn press(&mut self, key: Key) {
        self.set(key, true);
    }

    pub fn release(&mut self, key: Key) {
        self.set(key, false);
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    /// Down now but not on the previous tick
    pub fn just_pressed(&self, key: Key) -> bool {
        self.held.contains(&key) && !self.previous.contains(&key)
    }

    /// Call once after each tick consumed the input
    pub fn end_frame(&mut self) {
        self.previous.clone_from(&self.held);
    }

    fn any_held(&self, keys: [Key; 2]) -> bool {
        keys.iter().any(|k| self.is_held(*k))
    }

    /// WASD / arrows as a unit vector (y-up), or zero
    pub fn movement_vector(&self) -> Vec2 {
        let mut v = Vec2::ZERO;
        if self.any_held([Key::Up, Key::W]) {
            v.y += 1.0;
        }
        if self.any_held([Key::Down, Key::S]) {
            v.y -= 1.0;
        }
        if self.any_held([Key::Left, Key::A]) {
            v.x -= 1.0;
        }
        if self.any_held([Key::Right, Key::D]) {
            v.x += 1.0;
        }
        v.normalize_or_zero()
    }

    pub fn to_tick_input(&self) -> TickInput {
        TickInput {
            movement: self.movement_vector(),
            fire_ofuda: self.is_held(Key::Space),
            use_oharai: self.just_pressed(Key::Z),
            use_crystal_ball: self.just_pressed(Key::X),
            pause: self.just_pressed(Key::Escape),
            confirm: self.just_pressed(Key::Enter),
        }
    }
}
