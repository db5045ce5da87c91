#![cfg(test)]

use std::{collections::VecDeque, io, num::NonZeroUsize};

use comms::{
    Callback,
    msg::{Ack, Update, UpdateType},
    specs::diagram::{BlockSpec, DiagramSpec, Execution},
};
use machine_learning::{
    MlErr,
    arch::layers::Layer,
    dataset::{Dataset, TaskKind, Targets},
};
use ndarray::{Array2, Axis, array};
use serde_json::json;

use crate::{
    BlockGraph, CompileErr, DesignLinter, ErrorTranslator, Evaluator, Hyperparams, LossKind,
    ModelCompiler, Reporter, Trainer, evaluation,
};

/// Records every update and answers with a scripted sequence of acks.
#[derive(Default)]
struct Recorder {
    updates: Vec<Update>,
    acks: VecDeque<Ack>,
}

impl Callback for Recorder {
    fn post(&mut self, update: &Update) -> io::Result<Ack> {
        self.updates.push(update.clone());
        Ok(self.acks.pop_front().unwrap_or_default())
    }
}

fn block(block_id: &str, order: i64) -> BlockSpec {
    BlockSpec::new(block_id, order)
}

fn linear(order: i64, out_features: u64) -> BlockSpec {
    block("linear_layer", order).with_param("out_features", out_features)
}

fn graph(blocks: Vec<BlockSpec>) -> BlockGraph {
    BlockGraph::new(blocks)
}

fn scenario_blocks() -> Vec<BlockSpec> {
    vec![
        linear(0, 64),
        block("relu_activation", 1),
        linear(2, 1),
        block("sigmoid_activation", 3),
    ]
}

fn diagram(blocks: Vec<BlockSpec>, loss_fn: &str, epochs: usize) -> DiagramSpec {
    DiagramSpec {
        blocks,
        execution: Execution::Train,
        dataset: None,
        optimizer: "adam_algorithm".into(),
        loss_fn: loss_fn.into(),
        eval_fns: vec![],
        lr: 0.01,
        epochs: NonZeroUsize::new(epochs).unwrap(),
    }
}

fn and_gate() -> Dataset {
    let x = array![
        [0., 0.],
        [0., 1.],
        [1., 0.],
        [1., 1.],
        [0., 0.],
        [0., 1.],
        [1., 0.],
        [1., 1.]
    ];
    let y = array![[0.], [0.], [0.], [1.], [0.], [0.], [0.], [1.]];
    Dataset::new(x, Targets::Values(y)).unwrap()
}

fn lint(blocks: Vec<BlockSpec>, loss_fn: &str) -> Update {
    DesignLinter::lint(&graph(blocks), loss_fn, "job")
}

#[test]
fn graph_sorts_blocks_stably() {
    let graph = graph(vec![
        block("tanh_activation", 2),
        block("relu_activation", 0),
        block("sigmoid_activation", 2),
        linear(-1, 4),
    ]);

    let ids: Vec<&str> = graph.blocks().iter().map(|b| b.block_id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "linear_layer",
            "relu_activation",
            "tanh_activation",
            "sigmoid_activation"
        ]
    );
}

#[test]
fn graph_hash_follows_content() {
    let a = graph(scenario_blocks());
    let mut reversed = scenario_blocks();
    reversed.reverse();
    let b = graph(reversed);
    let c = graph(vec![linear(0, 32)]);

    assert_eq!(a.content_hash(), b.content_hash());
    assert_ne!(a.content_hash(), c.content_hash());
}

#[test]
fn lint_empty_pipeline() {
    let update = lint(vec![], "bce");
    assert_eq!(update.update_type, UpdateType::Info);
    assert_eq!(update.message, "No layers added for model!");
    assert_eq!(update.layer, -1);
}

#[test]
fn lint_good_design() {
    let update = lint(scenario_blocks(), "bce");
    assert_eq!(update.update_type, UpdateType::Info);
    assert_eq!(update.message, "Design looks good!");
    assert_eq!(update.layer, -1);
    assert_eq!(update.job_id, "job");
}

#[test]
fn lint_two_linear_layers_in_a_row() {
    let update = lint(
        vec![
            block("relu_activation", 0),
            linear(1, 8),
            linear(2, 1),
        ],
        "bce",
    );
    assert_eq!(update.update_type, UpdateType::Warning);
    assert_eq!(
        update.message,
        "Two linear layers in a row starting at layer: 2"
    );
    assert_eq!(update.layer, 2);
}

#[test]
fn lint_softmax_in_the_middle() {
    let update = lint(
        vec![linear(0, 8), block("softmax_activation", 1), linear(2, 3)],
        "cross_entropy_loss",
    );
    assert_eq!(
        update.message,
        "Softmax function in the middle of the network at layer: 2"
    );
    assert_eq!(update.layer, 2);
}

#[test]
fn lint_two_activations_in_a_row() {
    let update = lint(
        vec![
            linear(0, 8),
            block("relu_activation", 1),
            block("sigmoid_activation", 2),
        ],
        "bce",
    );
    assert_eq!(
        update.message,
        "Two activation layers in a row starting at layer: 2"
    );
    assert_eq!(update.layer, 2);
}

#[test]
fn lint_scan_reports_only_the_first_finding() {
    let update = lint(
        vec![
            linear(0, 8),
            linear(1, 8),
            block("relu_activation", 2),
            block("tanh_activation", 3),
        ],
        "bce",
    );
    assert_eq!(update.layer, 1);
    assert!(update.message.starts_with("Two linear layers"));
}

#[test]
fn lint_hinge_needs_a_bounded_output() {
    for loss in ["hinge_loss", "hinge"] {
        let update = lint(scenario_blocks(), loss);
        assert_eq!(update.update_type, UpdateType::Warning);
        assert!(update.message.starts_with("Hinge loss used"));
        assert_eq!(update.layer, 4);
    }

    let mut blocks = scenario_blocks();
    blocks[3] = block("tanh_activation", 3);
    assert_eq!(lint(blocks, "hinge_loss").update_type, UpdateType::Info);
}

#[test]
fn lint_dropout_warning_wins() {
    let update = lint(
        vec![
            linear(0, 8),
            block("dropout_layer", 1),
            block("softmax_activation", 2),
            block("relu_activation", 3),
        ],
        "hinge_loss",
    );
    assert_eq!(
        update.message,
        "Dropout at layer 2 should be followed by a layer with learnable parameters, i.e. a linear layer"
    );
    assert_eq!(update.layer, 2);
}

#[test]
fn compile_forces_the_output_width() {
    let mut compiler = ModelCompiler::new(Some(1));
    let model = compiler.compile(&graph(scenario_blocks()), 5, 3).unwrap();

    let names: Vec<&str> = model.names().collect();
    assert_eq!(
        names,
        vec![
            "linear_layer0",
            "relu_activation1",
            "linear_layer2",
            "sigmoid_activation3"
        ]
    );

    let Some(Layer::Linear(first)) = model.get("linear_layer0") else {
        panic!("linear_layer0 is not a linear layer");
    };
    let Some(Layer::Linear(last)) = model.get("linear_layer2") else {
        panic!("linear_layer2 is not a linear layer");
    };
    assert_eq!(first.dim(), (5, 64));
    assert_eq!(last.dim(), (64, 3));
    assert!(compiler.state().model_updated());
}

#[test]
fn compile_forces_the_last_linear_even_without_out_features() {
    let mut compiler = ModelCompiler::new(Some(1));
    let blocks = vec![linear(0, 4), block("linear_layer", 7)];
    let model = compiler.compile(&graph(blocks), 2, 1).unwrap();

    let Some(Layer::Linear(last)) = model.get("linear_layer7") else {
        panic!("linear_layer7 is not a linear layer");
    };
    assert_eq!(last.dim(), (4, 1));
}

#[test]
fn compile_applies_block_params() {
    let blocks = vec![
        linear(0, 4),
        block("dropout_layer", 1).with_param("p", 0.25),
        linear(2, 9),
        block("softmax_activation", 3).with_param("dim", 0),
        block("dropout_layer", 4),
    ];

    let mut compiler = ModelCompiler::new(Some(1));
    let model = compiler.compile(&graph(blocks), 2, 3).unwrap();

    let dropouts: Vec<f32> = model
        .layers()
        .filter_map(|layer| match layer {
            Layer::Dropout(dropout) => Some(dropout.p()),
            _ => None,
        })
        .collect();
    assert_eq!(dropouts, [0.25, 0.5]);

    let Some(Layer::Softmax(softmax)) = model.get("softmax_activation3") else {
        panic!("softmax stage missing");
    };
    assert_eq!(softmax.axis(), Axis(0));
}

#[test]
fn compile_is_memoized() {
    let mut compiler = ModelCompiler::new(Some(1));
    let mut reversed = scenario_blocks();
    reversed.reverse();

    compiler.compile(&graph(scenario_blocks()), 5, 1).unwrap();
    assert!(compiler.state().model_updated());

    compiler.compile(&graph(reversed), 5, 1).unwrap();
    assert!(!compiler.state().model_updated());

    let mut changed = scenario_blocks();
    changed[0] = linear(0, 32);
    compiler.compile(&graph(changed), 5, 1).unwrap();
    assert!(compiler.state().model_updated());
}

#[test]
fn compile_without_linear_blocks() {
    let mut compiler = ModelCompiler::new(Some(1));
    let model = compiler
        .compile(&graph(vec![block("flatten_layer", 0), block("relu_activation", 1)]), 3, 1)
        .unwrap();
    assert_eq!(model.len(), 2);
    assert_eq!(model.size(), 0);
}

#[test]
fn compile_rejects_unknown_blocks() {
    let mut compiler = ModelCompiler::new(Some(1));
    let mut blocks = scenario_blocks();
    blocks.push(block("conv_layer", 4));

    let err = compiler.compile(&graph(blocks), 5, 1).unwrap_err();
    assert_eq!(
        err,
        CompileErr::UnknownBlock {
            block_id: "conv_layer".into(),
            order: 4
        }
    );
    assert!(compiler.model_mut().is_none());
}

#[test]
fn compile_failure_keeps_the_previous_model() {
    let mut compiler = ModelCompiler::new(Some(1));
    compiler.compile(&graph(scenario_blocks()), 5, 1).unwrap();

    let blocks = vec![block("relu_activation", 1), block("relu_activation", 1)];
    let err = compiler.compile(&graph(blocks), 5, 1).unwrap_err();
    assert_eq!(
        err,
        CompileErr::DuplicateStage {
            name: "relu_activation1".into()
        }
    );

    assert_eq!(compiler.model_mut().map(|m| m.len()), Some(4));
    compiler.compile(&graph(scenario_blocks()), 5, 1).unwrap();
    assert!(!compiler.state().model_updated());
}

#[test]
fn compile_validates_params() {
    let mut compiler = ModelCompiler::new(Some(1));

    let err = compiler
        .compile(&graph(vec![block("linear_layer", 0), linear(1, 1)]), 2, 1)
        .unwrap_err();
    assert_eq!(
        err,
        CompileErr::MissingParam {
            block_id: "linear_layer".into(),
            param: "out_features"
        }
    );

    let dropout = block("dropout_layer", 1).with_param("p", 1.0);
    let err = compiler
        .compile(&graph(vec![linear(0, 1), dropout]), 2, 1)
        .unwrap_err();
    assert_eq!(
        err,
        CompileErr::InvalidParam {
            block_id: "dropout_layer".into(),
            param: "p",
            value: json!(1.0)
        }
    );

    let relu = block("relu_activation", 1).with_param("inplace", true);
    let err = compiler
        .compile(&graph(vec![linear(0, 1), relu]), 2, 1)
        .unwrap_err();
    assert_eq!(
        err,
        CompileErr::UnknownParam {
            block_id: "relu_activation".into(),
            param: "inplace".into()
        }
    );

    let softmax = block("softmax_activation", 1).with_param("dim", 2);
    let err = compiler
        .compile(&graph(vec![linear(0, 3), softmax]), 2, 3)
        .unwrap_err();
    assert!(matches!(err, CompileErr::InvalidParam { param: "dim", .. }));
}

#[test]
fn hyperparams_reject_unknown_identifiers() {
    let mut spec = diagram(scenario_blocks(), "bce", 1);
    let hyperparams = Hyperparams::from_diagram(&spec).unwrap();
    assert_eq!(hyperparams.loss, LossKind::Bce);

    spec.loss_fn = "focal_loss".into();
    assert_eq!(
        Hyperparams::from_diagram(&spec).unwrap_err(),
        CompileErr::UnknownLoss("focal_loss".into())
    );

    spec.loss_fn = "bce".into();
    spec.optimizer = "lbfgs".into();
    assert_eq!(
        Hyperparams::from_diagram(&spec).unwrap_err(),
        CompileErr::UnknownOptimizer("lbfgs".into())
    );

    spec.optimizer = "sgd".into();
    spec.lr = 0.;
    assert!(matches!(
        Hyperparams::from_diagram(&spec).unwrap_err(),
        CompileErr::InvalidHyperparameter { name: "lr", .. }
    ));
}

#[test]
fn translate_known_failures() {
    let graph = graph(scenario_blocks());
    let task = TaskKind::MulticlassClassification;

    let update = ErrorTranslator::translate(
        &MlErr::InputOutOfRange { value: 2. },
        &graph,
        task,
        "job",
    );
    assert_eq!(update.update_type, UpdateType::Error);
    assert!(update.message.starts_with("Selected loss function requires model outputs"));
    assert_eq!(update.layer, 4);

    let update = ErrorTranslator::translate(
        &MlErr::InvalidReshape {
            shape: (2, 3),
            size: 2,
        },
        &graph,
        task,
        "job",
    );
    assert!(update.message.starts_with("Final layer of the model outputs"));
    assert_eq!(update.layer, 4);

    for err in [
        MlErr::ScalarTypeMismatch {
            expected: "Long",
            found: "Float",
        },
        MlErr::TargetSizeMismatch {
            prediction: (2, 3),
            target: (2, 1),
        },
    ] {
        let update = ErrorTranslator::translate(&err, &graph, task, "job");
        assert_eq!(
            update.message,
            "Loss function does not work with specified task due to different expected outputs. For this challenge, choose a loss function that works with multiclass_classification!"
        );
        assert_eq!(update.layer, 4);
    }
}

#[test]
fn translate_unknown_failures_verbatim() {
    let err = MlErr::MatMulShape {
        lhs: (2, 3),
        rhs: (4, 1),
    };
    let update = ErrorTranslator::translate(
        &err,
        &graph(scenario_blocks()),
        TaskKind::BinaryClassification,
        "job",
    );

    assert_eq!(update.update_type, UpdateType::Error);
    assert_eq!(update.message, err.to_string());
    assert_eq!(update.layer, -1);
}

#[test]
fn binary_metrics() {
    let outputs = array![[0.9], [0.7], [0.2], [0.6], [0.1]];
    let labels = Targets::Values(array![[1.], [0.], [0.], [1.], [1.]]);
    let metrics = Evaluator::binary(outputs.view(), &labels, LossKind::Bce).unwrap();

    // tp 2, fp 1, tn 1, fn 1
    assert_eq!(metrics[evaluation::ACCURACY], 0.6);
    assert_eq!(metrics[evaluation::PRECISION], 0.667);
    assert_eq!(metrics[evaluation::RECALL], 0.667);
    assert_eq!(metrics[evaluation::F1_SCORE], 0.667);
    assert_eq!(metrics[evaluation::FALSE_POSITIVE_RATE], 0.5);
}

#[test]
fn binary_metrics_without_negatives_or_positives() {
    let outputs = array![[0.1], [0.2]];
    let labels = Targets::Values(array![[1.], [1.]]);
    let metrics = Evaluator::binary(outputs.view(), &labels, LossKind::Bce).unwrap();

    assert_eq!(metrics[evaluation::ACCURACY], 0.);
    assert_eq!(metrics[evaluation::PRECISION], 0.);
    assert_eq!(metrics[evaluation::FALSE_POSITIVE_RATE], 0.);
}

#[test]
fn hinge_labels_are_remapped() {
    let outputs = array![[0.3], [-0.8], [0.5], [-0.1]];
    let signed = Targets::Values(array![[1.], [-1.], [-1.], [1.]]);
    let binary = Targets::Values(array![[1.], [0.], [0.], [1.]]);

    let hinge = Evaluator::binary(outputs.view(), &signed, LossKind::Hinge).unwrap();
    let plain = Evaluator::binary(outputs.view(), &binary, LossKind::Mse).unwrap();

    assert_eq!(hinge, plain);
    assert_eq!(hinge[evaluation::ACCURACY], 0.5);
}

#[test]
fn multiclass_metrics() {
    let outputs = array![
        [0.9, 0.1, 0.0],
        [0.2, 0.7, 0.1],
        [0.1, 0.8, 0.1],
        [0.3, 0.3, 0.4]
    ];
    let metrics = Evaluator::multiclass(outputs.view(), &[0, 1, 2, 0]).unwrap();

    // preds [0, 1, 1, 2]
    // class 0: tp 1 fp 0 fn 1, class 1: tp 1 fp 1 fn 0, class 2: tp 0 fp 1 fn 1
    assert_eq!(metrics[evaluation::ACCURACY], 0.5);
    assert_eq!(metrics[evaluation::PRECISION], 0.5);
    assert_eq!(metrics[evaluation::RECALL], 0.5);
    assert_eq!(metrics[evaluation::F1_SCORE], 0.444);
    assert!(!metrics.contains_key(evaluation::FALSE_POSITIVE_RATE));
}

#[test]
fn multiclass_metrics_need_one_label_per_sample() {
    let outputs = Array2::<f32>::zeros((3, 2));
    let err = Evaluator::multiclass(outputs.view(), &[0, 1]).unwrap_err();
    assert!(matches!(err, MlErr::TargetSizeMismatch { .. }));
}

#[test]
fn training_stops_when_asked() {
    let mut compiler = ModelCompiler::new(Some(3));
    let spec = diagram(scenario_blocks(), "bce", 5);
    let hyperparams = Hyperparams::from_diagram(&spec).unwrap();
    let model = compiler.compile(&graph(scenario_blocks()), 2, 1).unwrap();

    let mut recorder = Recorder {
        acks: VecDeque::from([Ack::default(), Ack::stop()]),
        ..Default::default()
    };
    let mut reporter = Reporter::new(Some(&mut recorder), "job", Some("user".into()));

    let mut trainer = Trainer::new(NonZeroUsize::new(2).unwrap(), Some(3));
    let outcome = trainer
        .train(model, &and_gate(), &hyperparams, &mut reporter)
        .unwrap();
    drop(reporter);

    assert!(outcome.cancelled);
    assert_eq!(outcome.losses.len(), 2);
    assert_eq!(recorder.updates.len(), 2);

    let last = &recorder.updates[1];
    assert_eq!(last.update_type, UpdateType::Progress);
    assert!(last.message.starts_with("Epoch 2/5, Loss: "));
    assert_eq!(last.user_id.as_deref(), Some("user"));

    let metrics = last.metrics.as_ref().unwrap();
    assert_eq!(metrics["epoch"], 2.);
    assert_eq!(metrics["loss"], outcome.losses[1] as f64);
}

#[test]
fn training_lowers_the_loss() {
    let mut compiler = ModelCompiler::new(Some(3));
    let mut spec = diagram(scenario_blocks(), "bce", 60);
    spec.lr = 0.05;
    let hyperparams = Hyperparams::from_diagram(&spec).unwrap();
    let model = compiler.compile(&graph(scenario_blocks()), 2, 1).unwrap();

    let mut trainer = Trainer::new(NonZeroUsize::new(2).unwrap(), Some(3));
    let outcome = trainer
        .train(model, &and_gate(), &hyperparams, &mut Reporter::silent("job"))
        .unwrap();

    assert!(!outcome.cancelled);
    assert_eq!(outcome.losses.len(), 60);
    assert!(outcome.losses[59] < outcome.losses[0]);
}

#[test]
fn reporter_survives_a_broken_channel() {
    struct Broken;

    impl Callback for Broken {
        fn post(&mut self, _update: &Update) -> io::Result<Ack> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
        }
    }

    let mut broken = Broken;
    let mut reporter = Reporter::new(Some(&mut broken), "job", None);
    assert_eq!(reporter.progress(1, 2, 0.5), Ack::default());
}
