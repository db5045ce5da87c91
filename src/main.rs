use std::{
    env, fs,
    io::{self, Read, Write},
};

use anyhow::{bail, Context, Result};
use comms::{specs::job::JobSpec, BlockingChannel, Callback, WriterChannel};
use log::info;
use orchestrator::Session;

use diagram_engine::{job, EngineConfig};

const USAGE: &str = "usage: diagram-engine <job.json | ->";

fn main() -> Result<()> {
    env_logger::init();

    let Some(path) = env::args().nth(1) else {
        bail!(USAGE);
    };

    let raw = if path == "-" {
        let mut raw = String::new();
        io::stdin()
            .read_to_string(&mut raw)
            .context("failed to read the job from stdin")?;
        raw
    } else {
        fs::read_to_string(&path).with_context(|| format!("failed to read {path}"))?
    };

    let spec: JobSpec = serde_json::from_str(&raw).context("invalid job")?;
    let config = EngineConfig::from_env()?;
    let mut session = Session::new(config.batch_size, config.seed);

    let mut channel = match &spec.callback_url {
        Some(url) => {
            let addr = job::callback_addr(url);
            info!("connecting to callback at {addr}");
            let channel = BlockingChannel::connect(addr)
                .with_context(|| format!("failed to connect to {addr}"))?;
            Some(channel)
        }
        None => None,
    };

    let mut stdout = WriterChannel::new(io::stdout().lock());
    let callback = channel.as_mut().map(|c| c as &mut dyn Callback);
    let report = job::run(&config, &spec, &mut session, &mut stdout, callback)?;

    let mut stdout = stdout.into_inner();
    serde_json::to_writer(&mut stdout, &report.metrics)?;
    writeln!(stdout)?;

    Ok(())
}
