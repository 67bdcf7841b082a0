//! Color Map Module
//! Matplotlib-compatible palettes sampled by linear interpolation.

use std::fmt;
use std::str::FromStr;

/// 8-bit RGB color shared by the interactive and static renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const GRAY: Rgb = Rgb(128, 128, 128);
    pub const GRID: Rgb = Rgb(176, 176, 176);

    /// Components in 0.0..=1.0 (PDF color operators).
    pub fn unit(self) -> [f64; 3] {
        [
            self.0 as f64 / 255.0,
            self.1 as f64 / 255.0,
            self.2 as f64 / 255.0,
        ]
    }

    fn lerp(a: Rgb, b: Rgb, t: f64) -> Rgb {
        let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round() as u8;
        Rgb(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
    }
}

const fn hex(v: u32) -> Rgb {
    Rgb((v >> 16) as u8, (v >> 8) as u8, v as u8)
}

// Evenly spaced anchor colors, low end first.
const RDBU_R: [Rgb; 11] = [
    hex(0x053061),
    hex(0x2166ac),
    hex(0x4393c3),
    hex(0x92c5de),
    hex(0xd1e5f0),
    hex(0xf7f7f7),
    hex(0xfddbc7),
    hex(0xf4a582),
    hex(0xd6604d),
    hex(0xb2182b),
    hex(0x67001f),
];
const VIRIDIS: [Rgb; 9] = [
    hex(0x440154),
    hex(0x472d7b),
    hex(0x3b528b),
    hex(0x2c728e),
    hex(0x21918c),
    hex(0x28ae80),
    hex(0x5ec962),
    hex(0xaadc32),
    hex(0xfde725),
];
const PLASMA: [Rgb; 9] = [
    hex(0x0d0887),
    hex(0x4c02a1),
    hex(0x7e03a8),
    hex(0xa92395),
    hex(0xcc4778),
    hex(0xe56b5d),
    hex(0xf89540),
    hex(0xfdc328),
    hex(0xf0f921),
];
const COOLWARM: [Rgb; 9] = [
    hex(0x3b4cc0),
    hex(0x6282ea),
    hex(0x8db0fe),
    hex(0xb8d0f9),
    hex(0xdddddd),
    hex(0xf5c4ad),
    hex(0xf49a7b),
    hex(0xde604d),
    hex(0xb40426),
];
const MAGMA: [Rgb; 9] = [
    hex(0x000004),
    hex(0x1c1044),
    hex(0x4f127b),
    hex(0x812581),
    hex(0xb5367a),
    hex(0xe55064),
    hex(0xfb8761),
    hex(0xfec287),
    hex(0xfcfdbf),
];

/// Supported palettes for bubble fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMap {
    #[default]
    RdBuR,
    Viridis,
    Plasma,
    Coolwarm,
    Magma,
}

impl ColorMap {
    pub const ALL: [ColorMap; 5] = [
        ColorMap::RdBuR,
        ColorMap::Viridis,
        ColorMap::Plasma,
        ColorMap::Coolwarm,
        ColorMap::Magma,
    ];

    /// Matplotlib name, shown in the UI and accepted on the command line.
    pub fn name(self) -> &'static str {
        match self {
            ColorMap::RdBuR => "RdBu_r",
            ColorMap::Viridis => "viridis",
            ColorMap::Plasma => "plasma",
            ColorMap::Coolwarm => "coolwarm",
            ColorMap::Magma => "magma",
        }
    }

    fn stops(self) -> &'static [Rgb] {
        match self {
            ColorMap::RdBuR => &RDBU_R,
            ColorMap::Viridis => &VIRIDIS,
            ColorMap::Plasma => &PLASMA,
            ColorMap::Coolwarm => &COOLWARM,
            ColorMap::Magma => &MAGMA,
        }
    }

    /// Color at position `t` in 0.0..=1.0 (clamped; NaN samples the low end).
    pub fn sample(self, t: f64) -> Rgb {
        let stops = self.stops();
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

        let scaled = t * (stops.len() - 1) as f64;
        let lower = scaled.floor() as usize;
        if lower >= stops.len() - 1 {
            return stops[stops.len() - 1];
        }
        Rgb::lerp(stops[lower], stops[lower + 1], scaled - lower as f64)
    }
}

impl fmt::Display for ColorMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColorMap {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColorMap::ALL
            .iter()
            .copied()
            .find(|cm| cm.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let names: Vec<&str> = ColorMap::ALL.iter().map(|cm| cm.name()).collect();
                format!("unknown color map '{}' (expected one of: {})", s, names.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_match_first_and_last_stop() {
        for cm in ColorMap::ALL {
            assert_eq!(cm.sample(0.0), cm.stops()[0], "{}", cm);
            assert_eq!(cm.sample(1.0), *cm.stops().last().unwrap(), "{}", cm);
        }
    }

    #[test]
    fn samples_are_clamped() {
        assert_eq!(ColorMap::Viridis.sample(-3.0), ColorMap::Viridis.sample(0.0));
        assert_eq!(ColorMap::Viridis.sample(7.0), ColorMap::Viridis.sample(1.0));
        assert_eq!(ColorMap::Magma.sample(f64::NAN), ColorMap::Magma.sample(0.0));
    }

    #[test]
    fn rdbu_midpoint_is_near_white() {
        assert_eq!(ColorMap::RdBuR.sample(0.5), hex(0xf7f7f7));
    }

    #[test]
    fn coolwarm_is_evenly_sampled() {
        assert_eq!(ColorMap::Coolwarm.sample(0.5), hex(0xdddddd));
        assert_eq!(ColorMap::Coolwarm.sample(0.875), hex(0xde604d));

        // no abrupt step near the red end
        let a = ColorMap::Coolwarm.sample(0.75);
        let b = ColorMap::Coolwarm.sample(0.875);
        let c = ColorMap::Coolwarm.sample(1.0);
        let drop = |x: Rgb, y: Rgb| (x.1 as i32 - y.1 as i32).abs();
        assert!(drop(a, b) < 70 && drop(b, c) < 100);
    }

    #[test]
    fn interpolates_between_stops() {
        // halfway between the first two viridis stops
        let t = 0.5 / 8.0;
        let c = ColorMap::Viridis.sample(t);
        assert_eq!(c, Rgb(0x46, 0x17, 0x68));
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("rdbu_r".parse::<ColorMap>(), Ok(ColorMap::RdBuR));
        assert_eq!("Viridis".parse::<ColorMap>(), Ok(ColorMap::Viridis));
        assert!("jet".parse::<ColorMap>().is_err());
    }
}
