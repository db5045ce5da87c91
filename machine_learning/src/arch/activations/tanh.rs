/// Hyperbolic tangent, squashes its input into (-1, 1).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Tanh;

impl Tanh {
    pub fn f(&self, z: f32) -> f32 {
        z.tanh()
    }

    pub fn df(&self, z: f32) -> f32 {
        1. - z.tanh().powi(2)
    }
}
