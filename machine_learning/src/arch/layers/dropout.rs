use ndarray::{Array2, ArrayView2};
use rand::{SeedableRng, rngs::StdRng};
use rand_distr::{Bernoulli, Distribution};

use crate::{MlErr, Result};

/// Randomly zeroes elements with probability `p` while training, scaling the survivors by
/// `1 / (1 - p)`. Outside of training it's the identity.
#[derive(Debug, Clone)]
pub struct Dropout {
    p: f32,
    keep: Bernoulli,
    rng: StdRng,
    mask: Option<Array2<f32>>,
}

impl Dropout {
    /// Creates a new `Dropout`.
    ///
    /// # Arguments
    /// * `p` - The probability of zeroing an element, in [0, 1].
    /// * `seed` - The seed for the masks' random number generator.
    ///
    /// # Returns
    /// A new `Dropout` or `InvalidHyperparameter` if `p` is out of range.
    pub fn new(p: f32, seed: u64) -> Result<Self> {
        let keep = Bernoulli::new(1. - p as f64)
            .map_err(|_| MlErr::InvalidHyperparameter { name: "p", value: p })?;

        Ok(Self {
            p,
            keep,
            rng: StdRng::seed_from_u64(seed),
            mask: None,
        })
    }

    pub fn p(&self) -> f32 {
        self.p
    }

    pub fn forward(&mut self, x: ArrayView2<f32>, train: bool) -> Array2<f32> {
        if !train || self.p == 0. {
            self.mask = None;
            return x.to_owned();
        }

        let scale = if self.p < 1. { 1. / (1. - self.p) } else { 0. };
        let Self { keep, rng, .. } = self;
        let mask = Array2::from_shape_fn(x.dim(), |_| if keep.sample(rng) { scale } else { 0. });

        let y = &x * &mask;
        self.mask = Some(mask);
        y
    }

    pub fn backward(&mut self, d: Array2<f32>) -> Array2<f32> {
        match &self.mask {
            Some(mask) => d * mask,
            None => d,
        }
    }
}
