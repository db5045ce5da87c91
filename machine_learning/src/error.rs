use std::{
    error::Error,
    fmt::{self, Display},
};

/// The result type used in the entire machine learning module.
pub type Result<T> = std::result::Result<T, MlErr>;

/// The machine learning module's error type.
///
/// Each variant is a distinct failure signature of the numeric backend, callers
/// classify failures by matching on the variant instead of parsing messages.
#[derive(Debug, Clone, PartialEq)]
pub enum MlErr {
    /// A loss that works on probabilities received a value outside of [0, 1].
    InputOutOfRange { value: f32 },
    /// A tensor with `size` elements can't be viewed with the requested `shape`.
    InvalidReshape { shape: (usize, usize), size: usize },
    /// The targets don't have the element type the loss function expects.
    ScalarTypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    /// The predictions and the targets don't have the same shape.
    TargetSizeMismatch {
        prediction: (usize, usize),
        target: (usize, usize),
    },
    /// The input of a layer can't be multiplied by its weights.
    MatMulShape {
        lhs: (usize, usize),
        rhs: (usize, usize),
    },
    /// A class label is not a valid index into the model's outputs.
    TargetOutOfBounds { target: usize, classes: usize },
    /// A backward pass was attempted on a layer without a forward pass first.
    MissingForwardPass { layer: &'static str },
    /// There are no samples to iterate.
    EmptyDataset,
    /// A hyperparameter is outside of its valid domain.
    InvalidHyperparameter { name: &'static str, value: f32 },
    /// The parameters and the gradient handed to an optimizer differ in length.
    ParamSizeMismatch { got: usize, expected: usize },
}

impl Display for MlErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MlErr::InputOutOfRange { value } => write!(
                f,
                "all elements of input should be between 0 and 1, got {value}"
            ),
            MlErr::InvalidReshape { shape, size } => write!(
                f,
                "shape '[{}, {}]' is invalid for input of size {size}",
                shape.0, shape.1
            ),
            MlErr::ScalarTypeMismatch { expected, found } => {
                write!(f, "expected scalar type {expected} but found {found}")
            }
            MlErr::TargetSizeMismatch { prediction, target } => write!(
                f,
                "the size of tensor a ({}x{}) must match the size of tensor b ({}x{})",
                prediction.0, prediction.1, target.0, target.1
            ),
            MlErr::MatMulShape { lhs, rhs } => write!(
                f,
                "mat1 and mat2 shapes cannot be multiplied ({}x{} and {}x{})",
                lhs.0, lhs.1, rhs.0, rhs.1
            ),
            MlErr::TargetOutOfBounds { target, classes } => {
                write!(f, "target {target} is out of bounds for {classes} classes")
            }
            MlErr::MissingForwardPass { layer } => {
                write!(f, "backward called on {layer} before any forward pass")
            }
            MlErr::EmptyDataset => write!(f, "the dataset has no samples"),
            MlErr::InvalidHyperparameter { name, value } => {
                write!(f, "invalid value {value} for hyperparameter {name}")
            }
            MlErr::ParamSizeMismatch { got, expected } => write!(
                f,
                "gradient of size {got} doesn't match the {expected} parameters it updates"
            ),
        }
    }
}

impl Error for MlErr {}
