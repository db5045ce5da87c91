mod activation;
mod dropout;
mod flatten;
mod layer;
mod linear;
mod softmax;

pub use activation::Activation;
pub use dropout::Dropout;
pub use flatten::Flatten;
pub use layer::Layer;
pub use linear::Linear;
pub use softmax::Softmax;
