//! Lysti (LP5523) keypad backlight driven through engine 3.
//!
//! A brightness change is a tiny engine program: set the PWM to the start
//! brightness, ramp a number of steps at a given step time, then stop.

use std::path::{Path, PathBuf};

use log::debug;

use super::{
    BacklightBackend,
    sysfs::{SysfsWriter, write_number_or_log, write_or_log},
};

/// Drive current programmed into every keypad channel.
pub const MAXIMUM_LED_CURRENT: u32 = 50;

const MODE_DISABLED: &str = "disabled";
const MODE_LOAD: &str = "load";
const MODE_RUN: &str = "run";

/// Length of one ramp step in ms.
const STEP_TIME_MS: f64 = 0.49;
const MIN_STEP_RATE: i64 = 1;
const MAX_STEP_RATE: i64 = 31;

/// Channel files and engine 3 control files of one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LystiProfile {
    pub current_paths: Vec<PathBuf>,
    pub brightness_paths: Vec<PathBuf>,
    pub engine_mode_path: PathBuf,
    pub engine_load_path: PathBuf,
    pub engine_leds_path: PathBuf,
    /// Bit `n` set for every keypad channel `n`.
    pub mask: u32,
}

impl LystiProfile {
    /// Builds the path table for `channels` under the LED class directory.
    pub fn new(leds_dir: &Path, channels: &[u32]) -> Self {
        let channel_dir = |channel: u32| leds_dir.join(format!("lp5523:channel{channel}"));
        let device_dir = channel_dir(0).join("device");

        Self {
            current_paths: channels
                .iter()
                .map(|&c| channel_dir(c).join("led_current"))
                .collect(),
            brightness_paths: channels
                .iter()
                .map(|&c| channel_dir(c).join("brightness"))
                .collect(),
            engine_mode_path: device_dir.join("engine3_mode"),
            engine_load_path: device_dir.join("engine3_load"),
            engine_leds_path: device_dir.join("engine3_leds"),
            mask: channels.iter().fold(0, |mask, &c| mask | (1 << c)),
        }
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.current_paths
            .iter()
            .chain(&self.brightness_paths)
            .chain([
                &self.engine_mode_path,
                &self.engine_load_path,
                &self.engine_leds_path,
            ])
            .cloned()
            .collect()
    }
}

/// Step time for fading `steps` levels over `fade_time` ms.
///
/// The low bit of the result carries the direction: even ramps up, odd ramps
/// down.
pub fn step_rate(fade_time: u32, steps: i64) -> u8 {
    let magnitude = steps.unsigned_abs().max(1);
    let per_step = (u64::from(fade_time) * 1000 / magnitude) as f64;
    let rate = (per_step / STEP_TIME_MS / 1000.0) as i64;
    let rate = rate.clamp(MIN_STEP_RATE, MAX_STEP_RATE) as u8;

    rate * 2 + u8::from(steps < 0)
}

/// Engine program moving from `old` to `new` brightness.
pub fn fade_pattern(old: u32, new: u32, fade_time: u32) -> String {
    let steps = i64::from(new) - i64::from(old);

    if fade_time == 0 || steps == 0 {
        format!("9d8040{:02x}0000c000", new & 0xff)
    } else {
        format!(
            "9d8040{:02x}{:02x}{:02x}c000",
            old & 0xff,
            step_rate(fade_time, steps),
            steps.unsigned_abs() & 0xff
        )
    }
}

/// Channel mask in the textual form engine3_leds expects.
pub fn mask_string(mask: u32) -> String {
    format!("{mask:b}")
}

#[derive(Debug)]
pub struct LystiBackend {
    profile: LystiProfile,
    old_brightness: u32,
}

impl LystiBackend {
    pub fn new(profile: LystiProfile) -> Self {
        Self {
            profile,
            old_brightness: 0,
        }
    }

    /// Brightness the engine was last programmed with.
    #[cfg(test)]
    pub fn brightness(&self) -> u32 {
        self.old_brightness
    }
}

impl BacklightBackend for LystiBackend {
    fn apply_level(
        &mut self,
        io: &mut dyn SysfsWriter,
        fade_time: u32,
        brightness: u32,
        timer_pending: bool,
    ) {
        // With the keypad dark and no timeout armed the request comes from
        // the ambient light sensor, not from user activity.
        if self.old_brightness == 0 && !timer_pending {
            debug!("Ignoring keypad brightness {brightness} while backlight is off");
            return;
        }

        let pattern = fade_pattern(self.old_brightness, brightness, fade_time);
        debug!(
            "Keypad brightness {} -> {brightness} over {fade_time} ms: {pattern}",
            self.old_brightness
        );
        self.old_brightness = brightness;

        let profile = &self.profile;
        write_or_log(io, &profile.engine_mode_path, MODE_DISABLED);

        for path in &profile.brightness_paths {
            write_number_or_log(io, path, 0);
        }
        for path in &profile.current_paths {
            write_number_or_log(io, path, MAXIMUM_LED_CURRENT);
        }

        write_or_log(io, &profile.engine_mode_path, MODE_LOAD);
        write_or_log(io, &profile.engine_leds_path, &mask_string(profile.mask));
        write_or_log(io, &profile.engine_load_path, &pattern);
        write_or_log(io, &profile.engine_mode_path, MODE_RUN);
    }

    fn name(&self) -> &'static str {
        "lysti"
    }
}
