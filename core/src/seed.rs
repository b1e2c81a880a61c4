/// Fallback state for the degenerate zero seed; also the mulberry32
/// increment, so seed 0 behaves like one extra step of the stream.
pub const SEED_FALLBACK: u32 = 0x6d2b_79f5;

const SEED_INCREMENT: u32 = 0x6d2b_79f5;

/// Deterministic 32-bit generator used for every random decision in
/// puzzle generation and initial scatter. The same seed reproduces the
/// exact same puzzle on any platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeededRng {
    state: u32,
}

impl SeededRng {
    pub fn new(seed: u32) -> Self {
        Self {
            state: normalize_seed(seed),
        }
    }

    /// Next float in [0, 1].
    pub fn next(&mut self) -> f32 {
        self.state = mulberry32(self.state);
        (self.state as f64 / u32::MAX as f64) as f32
    }

    pub fn next_int(&mut self, max_exclusive: u32) -> u32 {
        (self.next() as f64 * max_exclusive as f64) as u32
    }

    pub fn next_range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next() * (max - min)
    }
}

pub fn normalize_seed(seed: u32) -> u32 {
    if seed == 0 {
        SEED_FALLBACK
    } else {
        seed
    }
}

fn mulberry32(input: u32) -> u32 {
    let mut t = input.wrapping_add(SEED_INCREMENT);
    t = (t ^ (t >> 15)).wrapping_mul(t | 1);
    t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
    t ^ (t >> 14)
}
