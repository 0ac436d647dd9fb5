//! Draw digits on 28x28 sketchpads and recognize them with a small convolutional
//! network trained on MNIST.
//!
//! The numerical work is done by [burn]. This crate wires pointer events to pixel
//! buffers, declares the layer stack, drives burn's training loop and decodes
//! predictions.

pub mod decode;
pub mod digit;
pub mod error;
pub mod inference;
pub mod model;
pub mod sketchpad;
pub mod web;

#[cfg(not(target_family = "wasm"))]
pub mod cli;
#[cfg(not(target_family = "wasm"))]
pub mod data;
#[cfg(not(target_family = "wasm"))]
pub mod evaluation;
#[cfg(not(target_family = "wasm"))]
pub mod show;
#[cfg(not(target_family = "wasm"))]
pub mod training;

pub use error::{Error, Result};
