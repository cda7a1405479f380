//! texnorm — a headless texture-normalizer host.
//!
//! The crate models a tiny plugin host: commands register metadata and an
//! entry point with the [`host::Registry`], and each entry point is a
//! straight-line pipeline of calls against the [`processor::ImageProcessor`]
//! capability trait. Two normalizers ship built in: "blurry" (small, soft,
//! saturated) and "crunchy" (blocky, noisy, web-palette indexed).

pub mod canvas;
pub mod cli;
pub mod host;
pub mod io;
pub mod logger;
pub mod ops;
pub mod pipelines;
pub mod processor;
