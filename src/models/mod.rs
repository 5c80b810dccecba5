pub mod event;
pub mod options;
pub mod player;
pub mod role;
