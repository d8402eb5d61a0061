//! Named numeric knobs driving the primary pass.
//!
//! The panel owns values and ranges only. Every accepted `set` yields a
//! [`ParamChange`] that the orchestrator writes into the primary uniforms.

use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamName {
    Rotation,
    LineWidth,
    Repeat,
    TimeMulti,
    NoiseAtten,
}

impl ParamName {
    pub const ALL: [ParamName; 5] = [
        ParamName::Rotation,
        ParamName::LineWidth,
        ParamName::Repeat,
        ParamName::TimeMulti,
        ParamName::NoiseAtten,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ParamName::Rotation => "rotation",
            ParamName::LineWidth => "lineWidth",
            ParamName::Repeat => "repeat",
            ParamName::TimeMulti => "timeMulti",
            ParamName::NoiseAtten => "noiseAtten",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ParamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown parameter `{0}`")]
pub struct UnknownParam(pub String);

impl FromStr for ParamName {
    type Err = UnknownParam;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParamName::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownParam(s.to_string()))
    }
}

/// One knob: current value and inclusive range.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Param {
    pub value: f32,
    pub min: f32,
    pub max: f32,
}

impl Param {
    const fn new(value: f32, min: f32, max: f32) -> Self {
        Self { value, min, max }
    }

    pub fn span(&self) -> f32 {
        self.max - self.min
    }
}

/// An accepted update, already clamped.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ParamChange {
    pub name: ParamName,
    pub value: f32,
}

/// Snapshot of every value, in the layout the primary pass expects.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PrimaryParams {
    pub rotation: f32,
    pub line_width: f32,
    pub repeat: f32,
    pub time_multi: f32,
    pub noise_atten: f32,
}

impl Default for PrimaryParams {
    fn default() -> Self {
        ParamPanel::new().values()
    }
}

/// Fraction of a range moved by one [`ParamPanel::nudge`] step.
pub const NUDGE_FRACTION: f32 = 1.0 / 50.0;

#[derive(Debug, Clone)]
pub struct ParamPanel {
    params: [Param; 5],
    selected: ParamName,
}

impl ParamPanel {
    pub fn new() -> Self {
        Self {
            params: [
                Param::new(0.0, 0.0, 6.0),
                Param::new(0.3, 0.0, PI),
                Param::new(2.0, 0.0, 100.0),
                Param::new(0.005, 0.0, 0.5),
                Param::new(1.0, 0.0, 10.0),
            ],
            selected: ParamName::Rotation,
        }
    }

    pub fn get(&self, name: ParamName) -> Param {
        self.params[name.index()]
    }

    /// Sets a parameter by its display name.
    pub fn set(&mut self, name: &str, value: f32) -> Result<ParamChange, UnknownParam> {
        let name = name.parse::<ParamName>()?;
        Ok(self.set_param(name, value))
    }

    /// Clamps `value` into range and stores it. NaN leaves the value unchanged.
    pub fn set_param(&mut self, name: ParamName, value: f32) -> ParamChange {
        let param = &mut self.params[name.index()];
        if !value.is_nan() {
            param.value = value.clamp(param.min, param.max);
        }
        ParamChange {
            name,
            value: param.value,
        }
    }

    pub fn selected(&self) -> ParamName {
        self.selected
    }

    /// Selects the parameter at `index` (0-based). Out of range is ignored.
    pub fn select(&mut self, index: usize) -> Option<ParamName> {
        let name = *ParamName::ALL.get(index)?;
        self.selected = name;
        log::info!("selected parameter {name}");
        Some(name)
    }

    /// Moves the selected parameter by `steps` nudges.
    pub fn nudge(&mut self, steps: i32) -> ParamChange {
        let name = self.selected;
        let param = self.get(name);
        self.set_param(name, param.value + steps as f32 * param.span() * NUDGE_FRACTION)
    }

    pub fn values(&self) -> PrimaryParams {
        PrimaryParams {
            rotation: self.get(ParamName::Rotation).value,
            line_width: self.get(ParamName::LineWidth).value,
            repeat: self.get(ParamName::Repeat).value,
            time_multi: self.get(ParamName::TimeMulti).value,
            noise_atten: self.get(ParamName::NoiseAtten).value,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParamName, Param)> + '_ {
        ParamName::ALL.into_iter().map(|n| (n, self.get(n)))
    }
}

impl Default for ParamPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl PrimaryParams {
    pub fn apply(&mut self, change: ParamChange) {
        let slot = match change.name {
            ParamName::Rotation => &mut self.rotation,
            ParamName::LineWidth => &mut self.line_width,
            ParamName::Repeat => &mut self.repeat,
            ParamName::TimeMulti => &mut self.time_multi,
            ParamName::NoiseAtten => &mut self.noise_atten,
        };
        *slot = change.value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_ranges() {
        let panel = ParamPanel::new();
        for (name, param) in panel.iter() {
            assert!(param.min <= param.value && param.value <= param.max, "{name}");
        }
        assert_eq!(panel.values().repeat, 2.0);
    }

    #[test]
    fn set_clamps_into_range() {
        let mut panel = ParamPanel::new();
        let change = panel.set("lineWidth", 10.0).unwrap();
        assert_eq!(change.value, PI);
        let change = panel.set("noiseAtten", -1.0).unwrap();
        assert_eq!(change.value, 0.0);
    }

    #[test]
    fn unknown_names_are_rejected() {
        let mut panel = ParamPanel::new();
        let before = panel.values();
        assert_eq!(panel.set("bloom", 1.0), Err(UnknownParam("bloom".into())));
        assert_eq!(panel.values(), before);
    }

    #[test]
    fn nudge_moves_by_fraction_of_range() {
        let mut panel = ParamPanel::new();
        panel.select(2);
        let change = panel.nudge(3);
        assert_eq!(change.name, ParamName::Repeat);
        assert!((change.value - 8.0).abs() < 1e-5);

        panel.select(0);
        assert_eq!(panel.nudge(-1).value, 0.0);
        assert!(panel.select(9).is_none());
        assert_eq!(panel.selected(), ParamName::Rotation);
    }

    #[test]
    fn changes_apply_to_snapshot() {
        let mut panel = ParamPanel::new();
        let mut values = panel.values();
        values.apply(panel.set("timeMulti", 0.25).unwrap());
        assert_eq!(values, panel.values());
    }
}
