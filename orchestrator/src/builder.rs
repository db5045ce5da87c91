use std::num::NonZeroUsize;

use comms::specs::diagram::DiagramSpec;
use machine_learning::{
    arch::loss::{Bce, CrossEntropy, Hinge, Loss, Mse},
    optimization::{Adam, GradientDescent, GradientDescentWithMomentum, Optimizer},
};

use crate::error::CompileErr;

const MOMENTUM: f32 = 0.9;

/// Every kind of block a diagram can be made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Linear,
    Relu,
    Sigmoid,
    Tanh,
    Softmax,
    Dropout,
    Flatten,
}

impl BlockKind {
    /// Resolves a block identifier.
    ///
    /// # Returns
    /// The kind of block or `None` if there's no such block.
    pub fn parse(block_id: &str) -> Option<Self> {
        let kind = match block_id {
            "linear_layer" => Self::Linear,
            "relu_activation" => Self::Relu,
            "sigmoid_activation" => Self::Sigmoid,
            "tanh_activation" => Self::Tanh,
            "softmax_activation" => Self::Softmax,
            "dropout_layer" => Self::Dropout,
            "flatten_layer" => Self::Flatten,
            _ => return None,
        };

        Some(kind)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linear => "linear_layer",
            Self::Relu => "relu_activation",
            Self::Sigmoid => "sigmoid_activation",
            Self::Tanh => "tanh_activation",
            Self::Softmax => "softmax_activation",
            Self::Dropout => "dropout_layer",
            Self::Flatten => "flatten_layer",
        }
    }

    /// Returns the parameters a block of this kind takes.
    pub fn params(&self) -> &'static [&'static str] {
        match self {
            Self::Linear => &["out_features", "bias"],
            Self::Softmax => &["dim"],
            Self::Dropout => &["p"],
            Self::Relu | Self::Sigmoid | Self::Tanh | Self::Flatten => &[],
        }
    }
}

/// Every loss function a diagram can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossKind {
    Bce,
    Hinge,
    CrossEntropy,
    Mse,
}

impl LossKind {
    pub fn parse(name: &str) -> Option<Self> {
        let kind = match name {
            "bce" => Self::Bce,
            "hinge_loss" | "hinge" => Self::Hinge,
            "cross_entropy_loss" | "cross_entropy" => Self::CrossEntropy,
            "mse_loss" | "mse" => Self::Mse,
            _ => return None,
        };

        Some(kind)
    }

    pub fn build(&self) -> Loss {
        match self {
            Self::Bce => Loss::Bce(Bce::new()),
            Self::Hinge => Loss::Hinge(Hinge::new()),
            Self::CrossEntropy => Loss::CrossEntropy(CrossEntropy::new()),
            Self::Mse => Loss::Mse(Mse::new()),
        }
    }
}

/// Every optimization algorithm a diagram can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizerKind {
    Adam,
    Sgd,
    Momentum,
}

impl OptimizerKind {
    pub fn parse(name: &str) -> Option<Self> {
        let kind = match name {
            "adam_algorithm" | "adam" => Self::Adam,
            "sgd_algorithm" | "sgd" => Self::Sgd,
            "momentum_algorithm" | "momentum" => Self::Momentum,
            _ => return None,
        };

        Some(kind)
    }

    /// Builds a fresh optimizer of this kind, without any state from previous steps.
    ///
    /// # Arguments
    /// * `learning_rate` - The learning rate of the optimizer.
    pub fn build(&self, learning_rate: f32) -> Box<dyn Optimizer> {
        match self {
            Self::Adam => Box::new(Adam::with_defaults(learning_rate)),
            Self::Sgd => Box::new(GradientDescent::new(learning_rate)),
            Self::Momentum => Box::new(GradientDescentWithMomentum::new(learning_rate, MOMENTUM)),
        }
    }
}

/// The resolved training hyperparameters of a diagram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hyperparams {
    pub loss: LossKind,
    pub optimizer: OptimizerKind,
    pub lr: f32,
    pub epochs: NonZeroUsize,
}

impl Hyperparams {
    /// Resolves the hyperparameters of a diagram.
    ///
    /// # Arguments
    /// * `diagram` - The submitted diagram.
    ///
    /// # Returns
    /// The hyperparameters or a `CompileErr` if an identifier is unknown or the learning
    /// rate isn't a positive number.
    pub fn from_diagram(diagram: &DiagramSpec) -> Result<Self, CompileErr> {
        let loss = LossKind::parse(&diagram.loss_fn)
            .ok_or_else(|| CompileErr::UnknownLoss(diagram.loss_fn.clone()))?;
        let optimizer = OptimizerKind::parse(&diagram.optimizer)
            .ok_or_else(|| CompileErr::UnknownOptimizer(diagram.optimizer.clone()))?;

        if !(diagram.lr.is_finite() && diagram.lr > 0.) {
            return Err(CompileErr::InvalidHyperparameter {
                name: "lr",
                value: diagram.lr.to_string(),
            });
        }

        Ok(Self {
            loss,
            optimizer,
            lr: diagram.lr,
            epochs: diagram.epochs,
        })
    }
}
