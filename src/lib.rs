pub mod app;
pub mod chain;
pub mod output;
pub mod preset;
pub mod render;
pub mod shape;
pub mod stage;
pub mod wave;
