/// Display names of the ten digit classes, in label order.
pub const CLASS_NAMES: [&str; 10] = [
    "Zero", "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine",
];

/// Position of the largest value, the first one on ties.
///
/// Uses a strict `>` scan, so a NaN never replaces the current maximum.
pub fn index_of_max(values: &[f32]) -> Option<usize> {
    let (first, rest) = values.split_first()?;
    let mut max = *first;
    let mut max_index = 0;

    for (i, value) in rest.iter().enumerate() {
        if *value > max {
            max = *value;
            max_index = i + 1;
        }
    }

    Some(max_index)
}

/// Comma-separated digits, `-1` for a pad without a prediction.
pub fn join_digits(predictions: &[Option<usize>]) -> String {
    predictions
        .iter()
        .map(|prediction| match prediction {
            Some(digit) => digit.to_string(),
            None => "-1".to_string(),
        })
        .collect::<Vec<_>>()
        .join(",")
}
