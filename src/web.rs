#![allow(clippy::new_without_default)]

#[cfg(target_family = "wasm")]
use wasm_bindgen::prelude::*;

use crate::{
    decode::join_digits,
    digit::{HEIGHT, WIDTH},
    inference::Recognizer,
    model::ModelConfig,
    sketchpad::Board,
    Error,
};

pub type Backend = burn::backend::NdArray<f32>;

#[cfg(target_family = "wasm")]
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        log::warn!("A logger was already installed");
    }
}

/// The page state: the sketchpads and the model recognizing them.
///
/// See:[exporting-rust-struct](https://rustwasm.github.io/wasm-bindgen/contributing/design/exporting-rust-struct.html)
#[cfg_attr(target_family = "wasm", wasm_bindgen)]
pub struct SketchpadApp {
    board: Board,
    recognizer: Option<Recognizer<Backend>>,
}

/// Maps a CSS offset inside an element of `display` pixels onto a pad of `size` pixels.
fn to_pad_pixel(offset: f64, display: f64, size: usize) -> i32 {
    if display > 0.0 {
        (offset * size as f64 / display).floor() as i32
    } else {
        offset.floor() as i32
    }
}

#[cfg_attr(target_family = "wasm", wasm_bindgen)]
impl SketchpadApp {
    /// Constructor called by JavaScripts with the new keyword.
    #[cfg_attr(target_family = "wasm", wasm_bindgen(constructor))]
    pub fn new(pads: usize) -> Self {
        #[cfg(target_family = "wasm")]
        console_error_panic_hook::set_once();
        Self {
            board: Board::new(pads),
            recognizer: None,
        }
    }

    pub fn pads(&self) -> usize {
        self.board.len()
    }

    pub fn pointer_down(
        &mut self,
        pad: usize,
        offset_x: f64,
        offset_y: f64,
        display_width: f64,
        display_height: f64,
    ) -> Result<(), String> {
        let x = to_pad_pixel(offset_x, display_width, WIDTH);
        let y = to_pad_pixel(offset_y, display_height, HEIGHT);
        self.board
            .pointer_down(pad, x, y)
            .map_err(|err| err.to_string())
    }

    pub fn pointer_move(
        &mut self,
        pad: usize,
        offset_x: f64,
        offset_y: f64,
        display_width: f64,
        display_height: f64,
    ) -> Result<(), String> {
        let x = to_pad_pixel(offset_x, display_width, WIDTH);
        let y = to_pad_pixel(offset_y, display_height, HEIGHT);
        self.board
            .pointer_move(pad, x, y)
            .map_err(|err| err.to_string())
    }

    pub fn pointer_up(&mut self) {
        self.board.pointer_up();
    }

    pub fn clean(&mut self) {
        self.board.clean();
    }

    /// RGBA bytes of a pad, ready for `ImageData`.
    pub fn pixels(&self, pad: usize) -> Result<Vec<u8>, String> {
        self.board
            .pad(pad)
            .map(|pad| pad.rgba().to_vec())
            .map_err(|err| err.to_string())
    }

    /// Alpha channel of every pad, concatenated in pad order.
    pub fn export(&self) -> Vec<u8> {
        self.board.export().concat()
    }

    /// Loads a `web-model.mpk` produced by the training or export command.
    pub fn load_model(&mut self, bytes: &[u8]) -> Result<(), String> {
        let recognizer =
            Recognizer::from_bytes(&ModelConfig::new(), bytes.to_vec(), Default::default())
                .map_err(|err| err.to_string())?;
        self.recognizer = Some(recognizer);
        log::info!("Model loaded");
        Ok(())
    }

    pub fn has_model(&self) -> bool {
        self.recognizer.is_some()
    }

    /// Digits drawn on the pads, comma-separated.
    pub fn recognize(&self) -> Result<String, String> {
        let recognizer = self.recognizer()?;
        let digits = recognizer.recognize_board(&self.board);
        log::info!("Recognized {digits:?}");

        Ok(join_digits(&digits))
    }

    /// Class probabilities of every pad, flattened row after row.
    pub fn probabilities(&self) -> Result<Vec<f32>, String> {
        let recognizer = self.recognizer()?;
        let rows = recognizer.probabilities(&self.board.images());

        Ok(rows.concat())
    }
}

impl SketchpadApp {
    fn recognizer(&self) -> Result<&Recognizer<Backend>, String> {
        self.recognizer
            .as_ref()
            .ok_or_else(|| Error::ModelNotLoaded.to_string())
    }
}
