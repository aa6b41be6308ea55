mod codec;
mod transport;
mod worker;

pub use {
    codec::{DEFAULT_MAX_FRAME_LEN, FrameCodec, LENGTH_PREFIX_LEN},
    transport::Transport,
    worker::{KillHandle, PIPE_MODE_FLAG, WorkerConfig, WorkerProcess, WorkerState},
};
