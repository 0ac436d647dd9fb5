//! Pixel buffers painted from pointer events.
//!
//! Every pad is a 28x28 RGBA surface, one canvas of the page. A [`Board`] owns the
//! pads and the pointer state shared between them: the button is released
//! globally, whichever pad it was pressed on.

use crate::digit::{DigitImage, HEIGHT, PIXELS, WIDTH};
use crate::{Error, Result};

const CHANNELS: usize = 4;
const BACKGROUND: [u8; CHANNELS] = [0, 0, 0, 255];
const INK: [u8; CHANNELS] = [255, 255, 255, 255];

/// One 28x28 RGBA drawing surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sketchpad {
    data: Vec<u8>,
}

impl Default for Sketchpad {
    fn default() -> Self {
        Self::new()
    }
}

impl Sketchpad {
    /// Creates an opaque black pad.
    pub fn new() -> Self {
        Self {
            data: BACKGROUND.repeat(PIXELS),
        }
    }

    /// Repaints the whole pad opaque black.
    pub fn clear(&mut self) {
        for pixel in self.data.chunks_exact_mut(CHANNELS) {
            pixel.copy_from_slice(&BACKGROUND);
        }
    }

    /// Paints the pixel at `(x, y)` white. Positions off the pad are ignored.
    pub fn draw_dot(&mut self, x: i32, y: i32) {
        let Some(offset) = Self::offset(x, y) else {
            return;
        };
        self.data[offset..offset + CHANNELS].copy_from_slice(&INK);
    }

    fn offset(x: i32, y: i32) -> Option<usize> {
        let x = usize::try_from(x).ok().filter(|x| *x < WIDTH)?;
        let y = usize::try_from(y).ok().filter(|y| *y < HEIGHT)?;

        Some((y * WIDTH + x) * CHANNELS)
    }

    pub fn rgba(&self) -> &[u8] {
        &self.data
    }

    /// First channel of every pixel.
    pub fn intensities(&self) -> Vec<u8> {
        self.channel(0)
    }

    /// Alpha channel of every pixel, the raw export format.
    pub fn alpha(&self) -> Vec<u8> {
        self.channel(CHANNELS - 1)
    }

    fn channel(&self, index: usize) -> Vec<u8> {
        self.data
            .chunks_exact(CHANNELS)
            .map(|pixel| pixel[index])
            .collect()
    }

    pub fn is_blank(&self) -> bool {
        self.data
            .chunks_exact(CHANNELS)
            .all(|pixel| pixel[0] == 0)
    }

    pub fn to_image(&self) -> DigitImage {
        DigitImage::new(self.intensities()).expect("A pad always holds 28x28 pixels")
    }
}

/// The set of pads on the page and the pointer driving them.
#[derive(Clone, Debug)]
pub struct Board {
    pads: Vec<Sketchpad>,
    pressed: bool,
    position: Option<(i32, i32)>,
}

impl Board {
    pub fn new(count: usize) -> Self {
        Self {
            pads: vec![Sketchpad::new(); count],
            pressed: false,
            position: None,
        }
    }

    pub fn len(&self) -> usize {
        self.pads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pads.is_empty()
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Last pointer position seen, in pad pixels.
    pub fn position(&self) -> Option<(i32, i32)> {
        self.position
    }

    pub fn pad(&self, index: usize) -> Result<&Sketchpad> {
        let count = self.pads.len();
        self.pads
            .get(index)
            .ok_or(Error::PadOutOfRange { index, count })
    }

    fn pad_mut(&mut self, index: usize) -> Result<&mut Sketchpad> {
        let count = self.pads.len();
        self.pads
            .get_mut(index)
            .ok_or(Error::PadOutOfRange { index, count })
    }

    pub fn pads(&self) -> &[Sketchpad] {
        &self.pads
    }

    pub fn pointer_down(&mut self, pad: usize, x: i32, y: i32) -> Result<()> {
        self.pad_mut(pad)?.draw_dot(x, y);
        self.pressed = true;
        self.position = Some((x, y));
        Ok(())
    }

    /// Records the position and paints while the button is held.
    pub fn pointer_move(&mut self, pad: usize, x: i32, y: i32) -> Result<()> {
        let pressed = self.pressed;
        let target = self.pad_mut(pad)?;
        if pressed {
            target.draw_dot(x, y);
        }
        self.position = Some((x, y));
        Ok(())
    }

    pub fn pointer_up(&mut self) {
        self.pressed = false;
    }

    pub fn clean(&mut self) {
        self.pads.iter_mut().for_each(Sketchpad::clear);
    }

    pub fn export(&self) -> Vec<Vec<u8>> {
        self.pads.iter().map(Sketchpad::alpha).collect()
    }

    pub fn images(&self) -> Vec<DigitImage> {
        self.pads.iter().map(Sketchpad::to_image).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn pixel(pad: &Sketchpad, x: usize, y: usize) -> &[u8] {
        let offset = (y * WIDTH + x) * CHANNELS;
        &pad.rgba()[offset..offset + CHANNELS]
    }

    #[test]
    fn new_pad_is_opaque_black() {
        let pad = Sketchpad::new();

        assert_eq!(pad.rgba().len(), PIXELS * CHANNELS);
        assert!(pad.is_blank());
        assert!(pad.alpha().iter().all(|alpha| *alpha == 255));
        assert!(pad.intensities().iter().all(|value| *value == 0));
    }

    #[test]
    fn draw_dot_paints_a_single_pixel() {
        let mut pad = Sketchpad::new();
        pad.draw_dot(3, 5);

        assert_eq!(pixel(&pad, 3, 5), &INK);
        assert_eq!(pixel(&pad, 4, 5), &BACKGROUND);
        assert_eq!(pad.intensities().iter().filter(|v| **v == 255).count(), 1);
        assert_eq!(pad.to_image().get(3, 5), 255);
    }

    #[rstest]
    #[case(-1, 0)]
    #[case(0, -1)]
    #[case(28, 0)]
    #[case(0, 28)]
    #[case(i32::MAX, i32::MIN)]
    fn draw_dot_ignores_positions_off_the_pad(#[case] x: i32, #[case] y: i32) {
        let mut pad = Sketchpad::new();
        pad.draw_dot(x, y);

        assert_eq!(pad, Sketchpad::new());
    }

    #[test]
    fn clear_restores_background() {
        let mut pad = Sketchpad::new();
        pad.draw_dot(0, 0);
        pad.draw_dot(27, 27);
        assert!(!pad.is_blank());

        pad.clear();

        assert_eq!(pad, Sketchpad::new());
    }

    #[test]
    fn moving_without_pressing_does_not_paint() {
        let mut board = Board::new(2);
        board.pointer_move(0, 4, 4).unwrap();

        assert!(board.pad(0).unwrap().is_blank());
        assert_eq!(board.position(), Some((4, 4)));
    }

    #[test]
    fn stroke_paints_until_release() {
        let mut board = Board::new(2);
        board.pointer_down(1, 2, 2).unwrap();
        board.pointer_move(1, 3, 2).unwrap();
        board.pointer_up();
        board.pointer_move(1, 10, 10).unwrap();

        let pad = board.pad(1).unwrap();
        assert_eq!(pixel(pad, 2, 2), &INK);
        assert_eq!(pixel(pad, 3, 2), &INK);
        assert_eq!(pixel(pad, 10, 10), &BACKGROUND);
        assert!(board.pad(0).unwrap().is_blank());
        assert!(!board.is_pressed());
    }

    #[test]
    fn release_is_shared_between_pads() {
        let mut board = Board::new(2);
        board.pointer_down(0, 1, 1).unwrap();
        board.pointer_move(1, 5, 5).unwrap();

        assert_eq!(pixel(board.pad(1).unwrap(), 5, 5), &INK);

        board.pointer_up();
        board.pointer_move(0, 6, 6).unwrap();
        assert_eq!(pixel(board.pad(0).unwrap(), 6, 6), &BACKGROUND);
    }

    #[test]
    fn unknown_pad_is_an_error() {
        let mut board = Board::new(1);

        let err = board.pointer_down(3, 0, 0).unwrap_err();

        assert!(matches!(err, Error::PadOutOfRange { index: 3, count: 1 }));
        assert!(!board.is_pressed());
    }

    #[test]
    fn clean_and_export_cover_every_pad() {
        let mut board = Board::new(3);
        board.pointer_down(0, 0, 0).unwrap();
        board.pointer_down(2, 1, 1).unwrap();
        board.pointer_up();

        let exported = board.export();
        assert_eq!(exported.len(), 3);
        assert!(exported.iter().all(|alpha| alpha.len() == PIXELS));

        let images = board.images();
        assert_eq!(images[0].get(0, 0), 255);
        assert_eq!(images[2].get(1, 1), 255);

        board.clean();
        assert!(board.pads().iter().all(Sketchpad::is_blank));
    }
}
