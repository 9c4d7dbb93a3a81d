//! Spawn randomness: the only non-deterministic input to the simulation.

/// Source of random choices for spawning (column and colour).
pub trait SpawnSource {
    /// Uniform index in `0..bound`. `bound` is never zero.
    fn next_index(&mut self, bound: usize) -> usize;
}

/// Production source backed by `fastrand`. Seedable for reproducible sessions.
#[derive(Debug, Clone)]
pub struct FastrandSource {
    rng: fastrand::Rng,
    seed: u64,
}

impl FastrandSource {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
            seed,
        }
    }

    /// Seeded from the OS-backed global generator.
    pub fn from_entropy() -> Self {
        Self::with_seed(fastrand::u64(..))
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl SpawnSource for FastrandSource {
    fn next_index(&mut self, bound: usize) -> usize {
        self.rng.usize(..bound)
    }
}

/// Replays a fixed list of choices, wrapping around. Each value is reduced modulo the bound.
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    values: Vec<usize>,
    pos: usize,
}

#[cfg(test)]
impl ScriptedSource {
    pub fn new(values: &[usize]) -> Self {
        assert!(!values.is_empty(), "scripted source needs at least one value");
        Self {
            values: values.to_vec(),
            pos: 0,
        }
    }

    /// Script for a sequence of spawns given as (column, colour index) pairs.
    pub fn spawns(spawns: &[(usize, usize)]) -> Self {
        let values: Vec<usize> = spawns.iter().flat_map(|&(col, color)| [col, color]).collect();
        Self::new(&values)
    }
}

#[cfg(test)]
impl SpawnSource for ScriptedSource {
    fn next_index(&mut self, bound: usize) -> usize {
        let v = self.values[self.pos % self.values.len()];
        self.pos += 1;
        v % bound
    }
}
