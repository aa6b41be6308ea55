mod audio;
mod ipc;
