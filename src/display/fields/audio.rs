/*
 *  display/fields/audio.rs
 *
 *  MpdLcdMon - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Bit rate and sample rate readouts from the status block
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use log::debug;

use crate::display::error::FormatError;
use crate::display::field::{Field, FieldInfo, FieldOptions, Width};
use crate::display::traits::{Screen, Widget};
use crate::hooks::HOOK_STATUS;
use crate::playerinfo::Status;

/// kbps, right aligned on three cells
pub fn format_bitrate(bitrate: Option<&str>) -> String {
    let value = bitrate
        .and_then(|b| b.trim().parse::<f64>().ok())
        .filter(|b| b.is_finite())
        .map(|b| b as i64)
        .unwrap_or(0);
    format!("{:>3}", value)
}

/// Sample rate from a `rate:bits:channels` descriptor, one decimal
pub fn format_sampling(audio: Option<&str>) -> String {
    let rate = audio
        .and_then(|a| a.split(':').next())
        .and_then(|r| r.trim().parse::<f64>().ok())
        .filter(|r| r.is_finite())
        .unwrap_or(0.0);
    format!("{:.1}", rate)
}

const BASELINE_SAMPLING: &str = "44100:16:2";

#[derive(Debug)]
pub struct BitRateField {
    info: FieldInfo,
}

impl BitRateField {
    pub fn create(reference: usize, options: FieldOptions) -> Result<Box<dyn Field>, FormatError> {
        options.finish()?;
        Ok(Box::new(Self {
            info: FieldInfo::new("bitrate", reference, Width::Fixed(format_bitrate(None).len())),
        }))
    }
}

impl Field for BitRateField {
    fn info(&self) -> &FieldInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut FieldInfo {
        &mut self.info
    }

    fn target_hooks(&self) -> &'static [&'static str] {
        &[HOOK_STATUS]
    }

    fn attach(&self, screen: &mut dyn Screen, left: usize, top: usize) -> Option<Widget> {
        Some(screen.add_string_widget(&self.name(), &format_bitrate(None), left, top))
    }

    fn status_changed(&self, screen: &mut dyn Screen, widget: Option<&Widget>, status: &Status) {
        let Some(widget) = widget else { return };
        let text = format_bitrate(status.get("bitrate"));
        debug!("Setting widget {} to {:?}", widget.reference(), text);
        screen.set_text(widget, &text);
    }
}

#[derive(Debug)]
pub struct SamplingField {
    info: FieldInfo,
}

impl SamplingField {
    pub fn create(reference: usize, options: FieldOptions) -> Result<Box<dyn Field>, FormatError> {
        options.finish()?;
        let width = format_sampling(Some(BASELINE_SAMPLING)).len();
        Ok(Box::new(Self {
            info: FieldInfo::new("sampling", reference, Width::Fixed(width)),
        }))
    }
}

impl Field for SamplingField {
    fn info(&self) -> &FieldInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut FieldInfo {
        &mut self.info
    }

    fn target_hooks(&self) -> &'static [&'static str] {
        &[HOOK_STATUS]
    }

    fn attach(&self, screen: &mut dyn Screen, left: usize, top: usize) -> Option<Widget> {
        let text = format_sampling(Some(BASELINE_SAMPLING));
        Some(screen.add_string_widget(&self.name(), &text, left, top))
    }

    fn status_changed(&self, screen: &mut dyn Screen, widget: Option<&Widget>, status: &Status) {
        let Some(widget) = widget else { return };
        let text = format_sampling(status.get("audio"));
        debug!("Setting widget {} to {:?}", widget.reference(), text);
        screen.set_text(widget, &text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::drivers::mock::MockScreen;
    use std::collections::BTreeMap;

    #[test]
    fn test_format_bitrate() {
        assert_eq!(format_bitrate(Some("320")), "320");
        assert_eq!(format_bitrate(Some("96")), " 96");
        assert_eq!(format_bitrate(Some("")), "  0");
        assert_eq!(format_bitrate(None), "  0");
        assert_eq!(format_bitrate(Some("1411")), "1411");
    }

    #[test]
    fn test_format_sampling() {
        assert_eq!(format_sampling(Some("44100:16:2")), "44100.0");
        assert_eq!(format_sampling(Some("96000:24:2")), "96000.0");
        assert_eq!(format_sampling(None), "0.0");
        assert_eq!(format_sampling(Some("dsd64:2")), "0.0");
    }

    #[test]
    fn test_status_fields() {
        let mut screen = MockScreen::new(20, 1);
        let bitrate = BitRateField::create(0, FieldOptions::new("bitrate", BTreeMap::new())).unwrap();
        let sampling = SamplingField::create(0, FieldOptions::new("sampling", BTreeMap::new())).unwrap();
        assert_eq!(bitrate.columns(), 3);
        assert_eq!(sampling.columns(), 7);

        let wb = bitrate.attach(&mut screen, 1, 1);
        let ws = sampling.attach(&mut screen, 5, 1);
        assert_eq!(screen.text_of("sampling-0").as_deref(), Some("44100.0"));

        let status: Status = [("bitrate", "256"), ("audio", "48000:24:2")].into_iter().collect();
        bitrate.status_changed(&mut screen, wb.as_ref(), &status);
        sampling.status_changed(&mut screen, ws.as_ref(), &status);
        assert_eq!(screen.text_of("bitrate-0").as_deref(), Some("256"));
        assert_eq!(screen.text_of("sampling-0").as_deref(), Some("48000.0"));
    }
}
