use serde::{Deserialize, Serialize};

/// Reward probabilities of the four stage-2 cards, indexed by
/// `[context][member]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardProbs(pub [[f64; 2]; 2]);

impl RewardProbs {
    pub fn new(values: [[f64; 2]; 2]) -> Self {
        Self(values)
    }

    pub fn get(&self, context: usize, member: usize) -> f64 {
        self.0[context][member]
    }

    pub fn row(&self, context: usize) -> [f64; 2] {
        self.0[context]
    }

    /// Builds a new snapshot by applying `f` to every cell, context by
    /// context then member by member.
    pub fn map<F>(&self, mut f: F) -> Self
    where
        F: FnMut(f64) -> f64,
    {
        let mut out = [[0.0; 2]; 2];
        for (i, row) in self.0.iter().enumerate() {
            for (j, &value) in row.iter().enumerate() {
                out[i][j] = f(value);
            }
        }
        Self(out)
    }

    /// `[p00, p01, p10, p11]`
    pub fn flatten(&self) -> [f64; 4] {
        [self.0[0][0], self.0[0][1], self.0[1][0], self.0[1][1]]
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().flat_map(|row| row.iter().copied())
    }
}
