//! MusePaint: a drawing-to-music engine.
//!
//! Every tap on the canvas becomes a [`note::Note`]. The
//! [`composition::PlaybackScheduler`] plays it straight away through a
//! [`sampler::Sampler`], expanding its effect into extra voices, and can replay
//! the whole composition at a chosen tempo.

pub mod audio;
pub mod composition;
pub mod config;
pub mod note;
pub mod sampler;
pub mod schedule;
