//! Terminal controller: a finite key table mutating a command held in UI units.
//!
//! UI units are position `0..=4095` and velocity/force `0..=1000`. They are
//! converted to device units by [`ManualController::command`] according to
//! [`ControllerConfig::scaling`].

use crate::command::{GripperCommand, BYTE_MAX};
use crate::config::{ControllerConfig, Scaling};

const OPEN_POSITION: i32 = 4095;
const CLOSE_POSITION: i32 = 3300;
const RESET_POSITION: i32 = 2000;
const PRESET_VELOCITY: i32 = 400;
const PRESET_FORCE: i32 = 200;

/// One line of user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Open,
    Close,
    Reset,
    /// Go to that position, UI units.
    Position(i64),
    Faster,
    Slower,
    MoreForce,
    LessForce,
    Quit,
    Unknown,
}

impl Key {
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if let Ok(position) = input.parse::<i64>() {
            return Key::Position(position);
        }
        match input {
            "o" => Key::Open,
            "c" => Key::Close,
            "r" => Key::Reset,
            "f" => Key::Faster,
            "l" => Key::Slower,
            "i" => Key::MoreForce,
            "d" => Key::LessForce,
            "q" => Key::Quit,
            _ => Key::Unknown,
        }
    }
}

fn preset(position: i32) -> GripperCommand {
    GripperCommand::new()
        .safe_mode(false)
        .activate(true)
        .measure(true)
        .measure_input(1)
        .position(position)
        .velocity(PRESET_VELOCITY)
        .force(PRESET_FORCE)
}

pub struct ManualController {
    config: ControllerConfig,
    ui: GripperCommand,
}

impl ManualController {
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            config,
            ui: GripperCommand::new(),
        }
    }

    /// Current command in UI units.
    pub fn ui_command(&self) -> &GripperCommand {
        &self.ui
    }

    /// Apply one key. Returns `false` for keys that leave the command untouched.
    pub fn apply(&mut self, key: Key) -> bool {
        let cfg = self.config;
        let ui = &mut self.ui;
        match key {
            Key::Open => *ui = preset(OPEN_POSITION),
            Key::Close => *ui = preset(CLOSE_POSITION),
            Key::Reset => *ui = preset(RESET_POSITION).activate(false),
            Key::Position(position) => {
                let clamped = position.clamp(0, i64::from(cfg.position_full_scale));
                ui.position = i32::try_from(clamped).unwrap_or(cfg.position_full_scale);
            }
            Key::Faster => ui.velocity = step(ui.velocity, cfg.step, cfg.velocity_full_scale),
            Key::Slower => ui.velocity = step(ui.velocity, -cfg.step, cfg.velocity_full_scale),
            Key::MoreForce => ui.force = step(ui.force, cfg.step, cfg.force_full_scale),
            Key::LessForce => ui.force = step(ui.force, -cfg.step, cfg.force_full_scale),
            Key::Quit | Key::Unknown => return false,
        }
        true
    }

    /// The command to hand to the driver, in device units.
    pub fn command(&self) -> GripperCommand {
        match self.config.scaling {
            Scaling::Passthrough => self.ui,
            Scaling::Scaled => GripperCommand {
                position: to_device(self.ui.position, self.config.position_full_scale),
                velocity: to_device(self.ui.velocity, self.config.velocity_full_scale),
                force: to_device(self.ui.force, self.config.force_full_scale),
                ..self.ui
            },
        }
    }

    pub fn prompt(&self) -> String {
        let cmd = &self.ui;
        let mut out = String::from("Simple C-Model Controller\n-----\nCurrent command:");
        out.push_str(&format!(
            "  SAFETY_MODE = {}, ACTIVATE = {}, MEASURE = {}, MEASURE_INPUT = {}, POSITION = {}, VELOCITY = {}, FORCE = {}\n",
            u8::from(cmd.safe_mode),
            u8::from(cmd.activate),
            u8::from(cmd.measure),
            cmd.measure_input,
            cmd.position,
            cmd.velocity,
            cmd.force,
        ));
        out.push_str("-----\nAvailable commands\n\n");
        out.push_str("r: Reset\n");
        out.push_str("c: Close\n");
        out.push_str("o: Open\n");
        out.push_str(&format!(
            "(0-{}): Go to that position\n",
            self.config.position_full_scale
        ));
        out.push_str("f: Faster\n");
        out.push_str("l: Slower\n");
        out.push_str("i: Increase force\n");
        out.push_str("d: Decrease force\n");
        out.push_str("q: Quit\n");
        out.push_str("-->");
        out
    }
}

impl Default for ManualController {
    fn default() -> Self {
        Self::new(ControllerConfig::default())
    }
}

fn step(value: i32, delta: i32, full_scale: i32) -> i32 {
    value.saturating_add(delta).clamp(0, full_scale.max(0))
}

/// `value * 255 / full_scale`, rounded to nearest.
fn to_device(value: i32, full_scale: i32) -> i32 {
    if full_scale <= 0 {
        return value;
    }
    let value = i64::from(value.clamp(0, full_scale));
    let full_scale = i64::from(full_scale);
    let scaled = (value * i64::from(BYTE_MAX) + full_scale / 2) / full_scale;
    i32::try_from(scaled).unwrap_or(BYTE_MAX)
}
