//! Procedural background star field: positions on a backdrop slab, colors from
//! weighted hue bands, sizes and twinkle phases.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Half extents of the backdrop slab on X and Y.
pub const FIELD_HALF_WIDTH: f32 = 500.0;
pub const FIELD_HALF_HEIGHT: f32 = 300.0;
/// Depth band of the slab.
pub const FIELD_DEPTH: std::ops::Range<f32> = -350.0..-250.0;
/// Star size multipliers, half-open.
pub const SCALE_RANGE: std::ops::Range<f32> = 2.0..6.0;

/// Flat per-star attribute arrays, ready for instance upload.
///
/// `offsets` and `colors` hold three floats per star.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StarField {
    pub offsets: Vec<f32>,
    pub colors: Vec<f32>,
    pub scales: Vec<f32>,
    pub randoms: Vec<f32>,
}

impl StarField {
    pub fn len(&self) -> usize {
        self.scales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scales.is_empty()
    }
}

/// A hue band: HSL ranges, each in `[0, 1]`.
struct HueBand {
    weight: f32,
    hue: (f32, f32),
    saturation: (f32, f32),
    lightness: (f32, f32),
}

const HUE_BANDS: [HueBand; 4] = [
    // blue / white
    HueBand {
        weight: 0.50,
        hue: (0.55, 0.67),
        saturation: (0.2, 0.6),
        lightness: (0.75, 0.95),
    },
    // cyan / green
    HueBand {
        weight: 0.25,
        hue: (0.42, 0.55),
        saturation: (0.5, 0.8),
        lightness: (0.6, 0.8),
    },
    // gold / orange
    HueBand {
        weight: 0.15,
        hue: (0.08, 0.14),
        saturation: (0.7, 1.0),
        lightness: (0.55, 0.7),
    },
    // pink / magenta
    HueBand {
        weight: 0.10,
        hue: (0.83, 0.94),
        saturation: (0.6, 0.9),
        lightness: (0.6, 0.8),
    },
];

/// Generates background star fields.
///
/// With a seed every call returns the same field for the same count; without
/// one each call draws fresh entropy.
#[derive(Debug, Clone, Copy, Default)]
pub struct StarFieldGenerator {
    seed: Option<u64>,
}

impl StarFieldGenerator {
    pub fn new(seed: Option<u64>) -> Self {
        Self { seed }
    }

    /// Generate `count` stars. Non-positive counts yield an empty field.
    pub fn generate(&self, count: i64) -> StarField {
        let Ok(count) = usize::try_from(count) else {
            return StarField::default();
        };
        let mut rng = match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        };

        let mut field = StarField {
            offsets: Vec::with_capacity(count * 3),
            colors: Vec::with_capacity(count * 3),
            scales: Vec::with_capacity(count),
            randoms: Vec::with_capacity(count),
        };

        for _ in 0..count {
            field.offsets.extend([
                rng.random_range(-FIELD_HALF_WIDTH..FIELD_HALF_WIDTH),
                rng.random_range(-FIELD_HALF_HEIGHT..FIELD_HALF_HEIGHT),
                rng.random_range(FIELD_DEPTH),
            ]);
            field.colors.extend(sample_color(&mut rng));
            field.scales.push(rng.random_range(SCALE_RANGE));
            field.randoms.push(rng.random::<f32>());
        }

        log::debug!("Generated background field with {count} stars");
        field
    }
}

fn sample_color(rng: &mut impl Rng) -> [f32; 3] {
    let pick: f32 = rng.random();
    let mut acc = 0.0;
    let band = HUE_BANDS
        .iter()
        .find(|band| {
            acc += band.weight;
            pick < acc
        })
        .unwrap_or(&HUE_BANDS[0]);

    let mut within = |(lo, hi): (f32, f32)| lo + (hi - lo) * rng.random::<f32>();
    let h = within(band.hue);
    let s = within(band.saturation);
    let l = within(band.lightness);
    hsl_to_rgb(h, s, l)
}

/// HSL (all in `[0, 1]`) to linear RGB.
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> [f32; 3] {
    if s <= 0.0 {
        return [l, l, l];
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    [
        hue_channel(p, q, h + 1.0 / 3.0),
        hue_channel(p, q, h),
        hue_channel(p, q, h - 1.0 / 3.0),
    ]
}

fn hue_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}
