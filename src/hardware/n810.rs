//! Two-file keypad backlight of the N800/N810: separate cover and keyboard
//! LEDs, each with a brightness and a fade-time attribute.

use std::path::{Path, PathBuf};

use log::debug;

use super::{
    BacklightBackend,
    sysfs::{SysfsWriter, write_number_or_log},
};

const FADETIME_DIR: &str = "devices/platform/i2c_omap.2/i2c-0/0-0045";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct N810Profile {
    pub fadetime_paths: [PathBuf; 2],
    pub brightness_paths: [PathBuf; 2],
}

impl N810Profile {
    pub fn new(sysfs_root: &Path) -> Self {
        let leds = sysfs_root.join(super::LEDS_CLASS);
        let fadetime = sysfs_root.join(FADETIME_DIR);

        Self {
            fadetime_paths: [
                fadetime.join("cover_fadetime"),
                fadetime.join("keyboard_fadetime"),
            ],
            brightness_paths: [
                leds.join("cover/brightness"),
                leds.join("keyboard/brightness"),
            ],
        }
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.fadetime_paths
            .iter()
            .chain(&self.brightness_paths)
            .cloned()
            .collect()
    }
}

#[derive(Debug)]
pub struct N810Backend {
    profile: N810Profile,
}

impl N810Backend {
    pub fn new(profile: N810Profile) -> Self {
        Self { profile }
    }
}

impl BacklightBackend for N810Backend {
    fn apply_level(
        &mut self,
        io: &mut dyn SysfsWriter,
        fade_time: u32,
        brightness: u32,
        _timer_pending: bool,
    ) {
        // The controller only fades when going dark.
        let fade_time = if brightness == 0 { fade_time } else { 0 };
        debug!("Keypad brightness {brightness}, fade time {fade_time} ms");

        for path in &self.profile.fadetime_paths {
            write_number_or_log(io, path, fade_time);
        }
        for path in &self.profile.brightness_paths {
            write_number_or_log(io, path, brightness);
        }
    }

    fn name(&self) -> &'static str {
        "n810"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::sysfs::MockSysfsWriter;
    use mockall::Sequence;

    fn expect_writes(io: &mut MockSysfsWriter, seq: &mut Sequence, writes: &[(PathBuf, &str)]) {
        for (path, value) in writes {
            let path = path.clone();
            let value = value.to_string();
            io.expect_write_str()
                .withf(move |p, v| p == path.as_path() && v == value)
                .times(1)
                .in_sequence(seq)
                .returning(|_, _| Ok(()));
        }
    }

    #[test]
    fn turning_on_writes_zero_fade_then_brightness() {
        let profile = N810Profile::new(Path::new("/sys"));
        let mut io = MockSysfsWriter::new();
        let mut seq = Sequence::new();

        expect_writes(
            &mut io,
            &mut seq,
            &[
                (profile.fadetime_paths[0].clone(), "0"),
                (profile.fadetime_paths[1].clone(), "0"),
                (profile.brightness_paths[0].clone(), "255"),
                (profile.brightness_paths[1].clone(), "255"),
            ],
        );

        N810Backend::new(profile).apply_level(&mut io, 250, 255, true);
    }

    #[test]
    fn turning_off_applies_fade_out_time() {
        let profile = N810Profile::new(Path::new("/sys"));
        let mut io = MockSysfsWriter::new();
        let mut seq = Sequence::new();

        expect_writes(
            &mut io,
            &mut seq,
            &[
                (profile.fadetime_paths[0].clone(), "1000"),
                (profile.fadetime_paths[1].clone(), "1000"),
                (profile.brightness_paths[0].clone(), "0"),
                (profile.brightness_paths[1].clone(), "0"),
            ],
        );

        N810Backend::new(profile).apply_level(&mut io, 1000, 0, false);
    }

    #[test]
    fn write_failures_do_not_stop_the_sequence() {
        let profile = N810Profile::new(Path::new("/sys"));
        let mut io = MockSysfsWriter::new();
        io.expect_write_str()
            .times(4)
            .returning(|p, _| Err(anyhow::anyhow!("{} is read-only", p.display())));

        N810Backend::new(profile).apply_level(&mut io, 0, 128, true);
    }

    #[test]
    fn profile_lists_all_files() {
        let profile = N810Profile::new(Path::new("/sys"));
        let paths = profile.paths();
        assert_eq!(paths.len(), 4);
        assert!(paths.contains(&PathBuf::from("/sys/class/leds/keyboard/brightness")));
        assert!(paths.contains(&PathBuf::from(
            "/sys/devices/platform/i2c_omap.2/i2c-0/0-0045/cover_fadetime"
        )));
    }
}
