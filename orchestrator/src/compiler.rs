use comms::specs::diagram::BlockSpec;
use log::{debug, info};
use machine_learning::arch::{Sequential, activations::ActFn, layers::Layer};
use ndarray::Axis;
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde_json::Value;

use crate::{builder::BlockKind, error::CompileErr, graph::BlockGraph};

const DEFAULT_DROPOUT: f32 = 0.5;

/// What identifies a compiled model, it's only rebuilt when this changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CacheKey {
    hash: u64,
    input_width: usize,
    output_width: usize,
}

/// The memory of the last compilation.
#[derive(Debug, Default)]
pub struct CompilerState {
    blocks: Vec<BlockSpec>,
    key: Option<CacheKey>,
    model_updated: bool,
}

impl CompilerState {
    /// Returns the sorted blocks of the last successful compilation.
    pub fn blocks(&self) -> &[BlockSpec] {
        &self.blocks
    }

    /// Returns `true` if the last call to `compile` built a new model.
    pub fn model_updated(&self) -> bool {
        self.model_updated
    }

    fn is_current(&self, key: CacheKey, graph: &BlockGraph) -> bool {
        self.key == Some(key) && self.blocks == graph.blocks()
    }
}

/// Builds executable models out of block graphs.
///
/// The last compiled model is kept along with its learned parameters, compiling the same
/// graph again hands out that same model.
pub struct ModelCompiler {
    state: CompilerState,
    model: Option<Sequential>,
    rng: StdRng,
}

impl ModelCompiler {
    /// Creates a new `ModelCompiler`.
    ///
    /// # Arguments
    /// * `seed` - The seed for the parameter initialization and dropout masks, random if `None`.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            state: CompilerState::default(),
            model: None,
            rng,
        }
    }

    pub fn state(&self) -> &CompilerState {
        &self.state
    }

    /// Returns the last compiled model, if any.
    pub fn model_mut(&mut self) -> Option<&mut Sequential> {
        self.model.as_mut()
    }

    /// Compiles a graph into an executable model.
    ///
    /// The last linear block always outputs `output_width` features, whatever its
    /// `out_features` says.
    ///
    /// # Arguments
    /// * `graph` - The sorted blocks.
    /// * `input_width` - The amount of features of a sample.
    /// * `output_width` - The amount of outputs the dataset expects.
    ///
    /// # Returns
    /// The compiled model or a `CompileErr` if a block can't be built, in which case the
    /// previous model is kept.
    pub fn compile(
        &mut self,
        graph: &BlockGraph,
        input_width: usize,
        output_width: usize,
    ) -> Result<&mut Sequential, CompileErr> {
        let key = CacheKey {
            hash: graph.content_hash(),
            input_width,
            output_width,
        };

        let cached = self.state.is_current(key, graph);

        let model = match self.model.take() {
            Some(model) if cached => {
                debug!("blocks unchanged, reusing compiled model");
                self.state.model_updated = false;
                model
            }
            previous => {
                let model = match self.build(graph.blocks(), input_width, output_width) {
                    Ok(model) => model,
                    Err(e) => {
                        self.model = previous;
                        return Err(e);
                    }
                };
                info!(stages = model.len(), params = model.size(); "compiled model");

                self.state.blocks = graph.blocks().to_vec();
                self.state.key = Some(key);
                self.state.model_updated = true;
                model
            }
        };

        Ok(self.model.insert(model))
    }

    fn build(
        &mut self,
        blocks: &[BlockSpec],
        input_width: usize,
        output_width: usize,
    ) -> Result<Sequential, CompileErr> {
        let last_linear = blocks
            .iter()
            .rposition(|block| BlockKind::parse(&block.block_id) == Some(BlockKind::Linear));

        let mut model = Sequential::new();
        let mut in_size = input_width;

        for (i, block) in blocks.iter().enumerate() {
            let kind =
                BlockKind::parse(&block.block_id).ok_or_else(|| CompileErr::UnknownBlock {
                    block_id: block.block_id.clone(),
                    order: block.order,
                })?;

            let name = format!("{}{}", block.block_id, block.order);
            if model.contains(&name) {
                return Err(CompileErr::DuplicateStage { name });
            }

            if let Some(param) = block.params.keys().find(|k| !kind.params().contains(&k.as_str())) {
                return Err(CompileErr::UnknownParam {
                    block_id: block.block_id.clone(),
                    param: param.clone(),
                });
            }

            let layer = match kind {
                BlockKind::Linear => {
                    let out_size = if last_linear == Some(i) {
                        output_width
                    } else {
                        out_features(block)?
                    };
                    let bias = flag(block, "bias", true)?;

                    let layer = Layer::linear((in_size, out_size), bias, &mut self.rng);
                    in_size = out_size;
                    layer
                }
                BlockKind::Relu => Layer::activation(ActFn::relu()),
                BlockKind::Sigmoid => Layer::activation(ActFn::sigmoid(1.)),
                BlockKind::Tanh => Layer::activation(ActFn::tanh()),
                BlockKind::Softmax => Layer::softmax(softmax_axis(block)?),
                BlockKind::Dropout => {
                    let p = dropout_p(block)?;
                    let seed = self.rng.random();
                    Layer::dropout(p, seed).map_err(|_| invalid(block, "p"))?
                }
                BlockKind::Flatten => Layer::flatten(),
            };

            debug!("stage {name} in_size={in_size}");
            model.push(name, layer);
        }

        Ok(model)
    }
}

fn invalid(block: &BlockSpec, param: &'static str) -> CompileErr {
    CompileErr::InvalidParam {
        block_id: block.block_id.clone(),
        param,
        value: block.params.get(param).cloned().unwrap_or(Value::Null),
    }
}

fn out_features(block: &BlockSpec) -> Result<usize, CompileErr> {
    let value = block
        .params
        .get("out_features")
        .ok_or_else(|| CompileErr::MissingParam {
            block_id: block.block_id.clone(),
            param: "out_features",
        })?;

    match value.as_u64() {
        Some(n) if n > 0 => Ok(n as usize),
        _ => Err(invalid(block, "out_features")),
    }
}

fn flag(block: &BlockSpec, param: &'static str, default: bool) -> Result<bool, CompileErr> {
    match block.params.get(param) {
        None => Ok(default),
        Some(value) => value.as_bool().ok_or_else(|| invalid(block, param)),
    }
}

fn softmax_axis(block: &BlockSpec) -> Result<Axis, CompileErr> {
    match block.params.get("dim").map(Value::as_i64) {
        None => Ok(Axis(1)),
        Some(Some(0)) => Ok(Axis(0)),
        Some(Some(1 | -1)) => Ok(Axis(1)),
        Some(_) => Err(invalid(block, "dim")),
    }
}

fn dropout_p(block: &BlockSpec) -> Result<f32, CompileErr> {
    match block.params.get("p").map(Value::as_f64) {
        None => Ok(DEFAULT_DROPOUT),
        Some(Some(p)) if (0. ..1.).contains(&p) => Ok(p as f32),
        Some(_) => Err(invalid(block, "p")),
    }
}
