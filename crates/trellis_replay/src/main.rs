// SPDX-License-Identifier: MIT OR Apache-2.0
//! Trellis session player.
//!
//! Loads a recorded session (configuration, initial model and a list of
//! input events or commands), runs it through a headless engine and prints
//! the final model as RON.
//!
//! ```text
//! trellis_replay <session.ron>
//! ```
//!
//! Logging follows `RUST_LOG`; engine commands are logged at debug level by
//! default.

mod session;

use session::{Session, SessionError, Step};
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use trellis_engine::{DiagramEngine, EngineError};

#[derive(Debug, Error)]
enum ReplayError {
    #[error("usage: trellis_replay <session.ron>")]
    Usage,

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] trellis_engine::ConfigError),

    #[error("Engine failed: {0}")]
    Engine(#[from] EngineError),

    #[error("Failed to write model: {0}")]
    Output(#[from] ron::Error),

    #[error("Bad log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), ReplayError> {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env().add_directive("trellis_engine=debug".parse()?);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let path = std::env::args_os().nth(1).map(PathBuf::from).ok_or(ReplayError::Usage)?;
    let session = Session::load(&path)?;
    tracing::info!("Replaying {} steps from {}", session.steps.len(), path.display());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(SessionError::from)?;
    let output = runtime.block_on(replay(session))?;
    println!("{output}");
    Ok(())
}

async fn replay(session: Session) -> Result<String, ReplayError> {
    let engine = DiagramEngine::builder(session.config).build()?;
    engine.init(session.viewport_size, session.nodes, session.edges).await?;

    let mut rejected = 0usize;
    for (index, step) in session.steps.into_iter().enumerate() {
        let result = match step {
            Step::Input(event) => engine.handle_input(event).await,
            Step::Emit(command) => engine.emit(command).await.map(|_| ()),
            Step::Undo => engine.undo().await.map(|_| ()),
            Step::Redo => engine.redo().await.map(|_| ()),
        };
        // Rejections are part of a recording; keep going
        if let Err(err) = result {
            tracing::warn!(step = index, "Step rejected: {}", err);
            rejected += 1;
        }
    }
    engine.teardown();

    let state = engine.snapshot();
    tracing::info!(
        nodes = state.node_count(),
        edges = state.edge_count(),
        rejected,
        "Replay finished"
    );
    let pretty = ron::ser::PrettyConfig::default();
    Ok(ron::ser::to_string_pretty(&*state, pretty)?)
}
