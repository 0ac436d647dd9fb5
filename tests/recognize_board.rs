use burn::backend::NdArray;
use digit_sketchpad::{
    decode::join_digits,
    inference::{to_bytes, Recognizer},
    model::ModelConfig,
    sketchpad::Board,
    web::SketchpadApp,
};

type TestBackend = NdArray<f32>;

fn draw_vertical_stroke(board: &mut Board, pad: usize) {
    board.pointer_down(pad, 14, 4).unwrap();
    for y in 5..24 {
        board.pointer_move(pad, 14, y).unwrap();
    }
    board.pointer_up();
}

#[test]
fn board_drawings_are_recognized_in_pad_order() {
    let device = Default::default();
    let recognizer = Recognizer::new(ModelConfig::new().init::<TestBackend>(&device), device);
    let mut board = Board::new(4);
    draw_vertical_stroke(&mut board, 2);

    let digits = recognizer.recognize_board(&board);
    let field = join_digits(&digits);

    assert_eq!(digits.len(), 4);
    assert_eq!(field.split(',').count(), 4);
    // Identical blank pads get identical predictions.
    assert_eq!(digits[0], digits[1]);
    assert_eq!(digits[0], digits[3]);
}

#[test]
fn web_app_matches_native_recognizer() {
    let device = Default::default();
    let model = ModelConfig::new().init::<TestBackend>(&device);
    let recognizer = Recognizer::new(model.clone(), device);

    let mut app = SketchpadApp::new(2);
    app.load_model(&to_bytes(model).unwrap()).unwrap();
    let mut board = Board::new(2);
    for (pad, x) in [(0, 10.0), (1, 20.0)] {
        app.pointer_down(pad, x, 8.0, 28.0, 28.0).unwrap();
        app.pointer_move(pad, x, 9.0, 28.0, 28.0).unwrap();
        app.pointer_up();
        board.pointer_down(pad, x as i32, 8).unwrap();
        board.pointer_move(pad, x as i32, 9).unwrap();
        board.pointer_up();
    }

    assert_eq!(
        app.recognize().unwrap(),
        join_digits(&recognizer.recognize_board(&board))
    );
}
