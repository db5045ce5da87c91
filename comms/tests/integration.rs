use std::{
    collections::BTreeMap,
    io::{BufRead, BufReader, Write},
    net::TcpListener,
    thread,
};

use comms::{
    BlockingChannel, Callback, WriterChannel,
    msg::{Ack, Update, UpdateType},
    specs::{
        diagram::{BlockSpec, Execution},
        job::JobSpec,
    },
};
use tokio::io;

const JOB: &str = r#"{
    "job_id": "job-1",
    "user_id": "user-7",
    "dataset": "mushrooms",
    "diagram": {
        "blocks": [
            {"block_id": "linear_layer", "order": 0, "params": {"out_features": 64}},
            {"block_id": "relu_activation", "order": 1}
        ],
        "execution": "train",
        "optimizer": "adam_algorithm",
        "loss_fn": "bce",
        "evalFns": ["accuracy_metric"],
        "lr": 0.01,
        "epochs": 3
    }
}"#;

#[test]
fn job_deserializes_with_defaults() {
    let job: JobSpec = serde_json::from_str(JOB).unwrap();

    assert_eq!(job.callback_url, None);
    assert_eq!(job.diagram.execution, Execution::Train);
    assert_eq!(job.diagram.eval_fns, vec!["accuracy_metric"]);
    assert_eq!(job.diagram.epochs.get(), 3);
    assert_eq!(
        job.diagram.blocks[0],
        BlockSpec::new("linear_layer", 0).with_param("out_features", 64)
    );
    assert!(job.diagram.blocks[1].params.is_empty());
}

#[test]
fn job_without_epochs_to_run_is_rejected() {
    let job = JOB.replace("\"epochs\": 3", "\"epochs\": 0");
    assert!(serde_json::from_str::<JobSpec>(&job).is_err());
}

#[test]
fn update_wire_format() {
    let update = Update::new(UpdateType::Warning, "careful", "job-1").with_layer(2);
    let json = serde_json::to_value(&update).unwrap();

    assert_eq!(
        json,
        serde_json::json!({
            "message": "careful",
            "update_type": "warning",
            "layer": 2,
            "job_id": "job-1"
        })
    );

    let update: Update =
        serde_json::from_str(r#"{"message": "m", "update_type": "result", "job_id": "j"}"#)
            .unwrap();
    assert_eq!(update.layer, Update::NO_LAYER);
    assert_eq!(update.metrics, None);
}

#[test]
fn missing_cancellation_flag_means_go_on() {
    let ack: Ack = serde_json::from_str("{}").unwrap();
    assert_eq!(ack, Ack::default());
    assert!(!ack.stop_training);
}

#[tokio::test]
async fn send_recv() {
    const SIZE: usize = 4096;

    let metrics = BTreeMap::from([("loss".to_string(), 0.25), ("epoch".to_string(), 1.)]);
    let msg = Update::new(UpdateType::Progress, "Epoch 1/2, Loss: 0.2500", "job-1")
        .with_metrics(metrics)
        .with_user(Some("user-7".into()));

    let (one, two) = io::duplex(SIZE);
    let (rx, tx) = io::split(one);
    let (_, mut tx) = comms::channel(rx, tx);

    tx.send(&msg).await.unwrap();
    tx.send(&msg).await.unwrap();

    let (rx, tx) = io::split(two);
    let (mut rx, _) = comms::channel(rx, tx);

    let first: Update = rx.recv().await.unwrap();
    let second: Update = rx.recv().await.unwrap();

    assert_eq!(first, msg);
    assert_eq!(second, msg);
}

#[tokio::test]
async fn recv_on_closed_channel_fails() {
    let (one, two) = io::duplex(64);
    drop(one);

    let (rx, tx) = io::split(two);
    let (mut rx, _) = comms::channel(rx, tx);

    let err = rx.recv::<Ack>().await.unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
}

#[test]
fn blocking_channel_waits_for_the_ack() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let recipient = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut writer = stream;
        let mut received = Vec::new();

        for ack in ["{}", r#"{"stop_training": true}"#] {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            received.push(serde_json::from_str::<Update>(&line).unwrap());
            writeln!(writer, "{ack}").unwrap();
        }

        received
    });

    let mut channel = BlockingChannel::connect(addr).unwrap();
    let first = Update::new(UpdateType::Progress, "Epoch 1/2, Loss: 0.5000", "job-1");
    let second = Update::new(UpdateType::Progress, "Epoch 2/2, Loss: 0.4000", "job-1");

    assert_eq!(channel.post(&first).unwrap(), Ack::default());
    assert_eq!(channel.post(&second).unwrap(), Ack::stop());
    assert_eq!(recipient.join().unwrap(), vec![first, second]);
}

#[test]
fn writer_channel_writes_json_lines() {
    let mut channel = WriterChannel::new(Vec::new());
    let update = Update::new(UpdateType::Info, "Design looks good!", "job-1");

    assert_eq!(channel.post(&update).unwrap(), Ack::default());
    assert_eq!(channel.post(&update).unwrap(), Ack::default());

    let out = String::from_utf8(channel.into_inner()).unwrap();
    let lines: Vec<Update> = out
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines, vec![update.clone(), update]);
}
