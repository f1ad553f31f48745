pub mod replay_storage;

pub use replay_storage::{
    load_replay, load_replay_from_path, replay_exists, replay_hash, save_replay,
};
