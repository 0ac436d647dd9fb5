//! Accuracy and confusion statistics over a sample of the test split.

use core::fmt;
use std::{fs::File, path::Path};

use burn::{
    data::{
        dataloader::batcher::Batcher,
        dataset::{vision::MnistItem, Dataset},
    },
    tensor::backend::Backend,
};
use serde::Serialize;

use crate::{
    data::{sample, MnistBatcher},
    decode::CLASS_NAMES,
    model::Model,
    Result,
};

const BATCH_SIZE: usize = 256;

/// Predicted classes next to the expected labels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Evaluation {
    predictions: Vec<usize>,
    labels: Vec<usize>,
    num_classes: usize,
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
pub struct ClassAccuracy {
    pub accuracy: f64,
    pub count: usize,
}

/// Counts indexed by `[label][prediction]`.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ConfusionMatrix {
    counts: Vec<Vec<usize>>,
}

#[derive(Serialize, Debug)]
pub struct EvaluationReport {
    pub samples: usize,
    pub accuracy: f64,
    pub classes: Vec<ClassReport>,
    pub confusion_matrix: ConfusionMatrix,
}

#[derive(Serialize, Debug)]
pub struct ClassReport {
    pub name: String,
    pub accuracy: f64,
    pub count: usize,
}

impl Evaluation {
    pub fn new(predictions: Vec<usize>, labels: Vec<usize>, num_classes: usize) -> Self {
        assert_eq!(
            predictions.len(),
            labels.len(),
            "Every prediction needs a label"
        );

        Self {
            predictions,
            labels,
            num_classes,
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.labels
            .iter()
            .copied()
            .zip(self.predictions.iter().copied())
    }

    pub fn accuracy(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let correct = self.pairs().filter(|(label, pred)| label == pred).count();
        correct as f64 / self.len() as f64
    }

    /// Share of each class' items predicted correctly.
    pub fn per_class_accuracy(&self) -> Vec<ClassAccuracy> {
        let mut correct = vec![0usize; self.num_classes];
        let mut count = vec![0usize; self.num_classes];

        for (label, prediction) in self.pairs().filter(|(label, _)| *label < self.num_classes) {
            count[label] += 1;
            if label == prediction {
                correct[label] += 1;
            }
        }

        correct
            .into_iter()
            .zip(count)
            .map(|(correct, count)| ClassAccuracy {
                accuracy: if count == 0 {
                    0.0
                } else {
                    correct as f64 / count as f64
                },
                count,
            })
            .collect()
    }

    pub fn confusion_matrix(&self) -> ConfusionMatrix {
        let mut counts = vec![vec![0; self.num_classes]; self.num_classes];
        for (label, prediction) in self.pairs() {
            if label < self.num_classes && prediction < self.num_classes {
                counts[label][prediction] += 1;
            }
        }

        ConfusionMatrix { counts }
    }

    pub fn report(&self) -> EvaluationReport {
        let classes = self
            .per_class_accuracy()
            .into_iter()
            .enumerate()
            .map(|(class, stats)| ClassReport {
                name: class_name(class),
                accuracy: stats.accuracy,
                count: stats.count,
            })
            .collect();

        EvaluationReport {
            samples: self.len(),
            accuracy: self.accuracy(),
            classes,
            confusion_matrix: self.confusion_matrix(),
        }
    }

    pub fn log(&self) {
        log::info!(
            "Accuracy on {} test images: {:.2}%",
            self.len(),
            self.accuracy() * 100.0
        );
        for (class, stats) in self.per_class_accuracy().iter().enumerate() {
            log::info!(
                "{:>6}: {:.4} ({} images)",
                class_name(class),
                stats.accuracy,
                stats.count
            );
        }
        log::info!("Confusion matrix (rows are labels):\n{}", self.confusion_matrix());
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, &self.report())?;
        Ok(())
    }
}

fn class_name(class: usize) -> String {
    CLASS_NAMES
        .get(class)
        .map(|name| name.to_string())
        .unwrap_or_else(|| class.to_string())
}

impl ConfusionMatrix {
    pub fn get(&self, label: usize, prediction: usize) -> usize {
        self.counts[label][prediction]
    }

    pub fn num_classes(&self) -> usize {
        self.counts.len()
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = (0..self.num_classes()).map(class_name).collect();
        let width = names
            .iter()
            .map(String::len)
            .chain(self.counts.iter().flatten().map(|count| count.to_string().len()))
            .max()
            .unwrap_or(1);

        write!(f, "{:>width$}", "")?;
        for name in names.iter() {
            write!(f, " {name:>width$}")?;
        }
        for (name, row) in names.iter().zip(self.counts.iter()) {
            writeln!(f)?;
            write!(f, "{name:>width$}")?;
            for count in row {
                write!(f, " {count:>width$}")?;
            }
        }

        Ok(())
    }
}

/// Argmax predictions and labels for a batch of test items.
pub fn predict<B: Backend>(
    model: &Model<B>,
    batcher: &MnistBatcher<B>,
    items: Vec<MnistItem>,
) -> (Vec<usize>, Vec<usize>) {
    let labels = items.iter().map(|item| item.label as usize).collect();
    let batch = batcher.batch(items);
    let output = model.forward(batch.images);
    let predictions = output
        .argmax(1)
        .flatten::<1>(0, 1)
        .into_data()
        .iter::<i64>()
        .map(|class| class as usize)
        .collect();

    (predictions, labels)
}

/// Evaluates `size` items sampled from `dataset`.
pub fn evaluate<B, D>(
    model: &Model<B>,
    dataset: D,
    size: usize,
    seed: u64,
    device: &B::Device,
) -> Evaluation
where
    B: Backend,
    D: Dataset<MnistItem>,
{
    let batcher = MnistBatcher::<B>::new(device.clone());
    let items = sample::<D, MnistItem>(dataset, size, seed);

    let mut predictions = Vec::with_capacity(items.len());
    let mut labels = Vec::with_capacity(items.len());
    for chunk in items.chunks(BATCH_SIZE) {
        let (chunk_predictions, chunk_labels) = predict(model, &batcher, chunk.to_vec());
        predictions.extend(chunk_predictions);
        labels.extend(chunk_labels);
    }

    Evaluation::new(predictions, labels, model.num_classes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelConfig;
    use burn::{backend::NdArray, data::dataset::InMemDataset};

    type TestBackend = NdArray<f32>;

    fn evaluation() -> Evaluation {
        // labels:      0 0 1 1 1 2
        // predictions: 0 1 1 1 0 2
        Evaluation::new(vec![0, 1, 1, 1, 0, 2], vec![0, 0, 1, 1, 1, 2], 3)
    }

    #[test]
    fn accuracy_counts_matches() {
        assert!((evaluation().accuracy() - 4.0 / 6.0).abs() < 1e-12);
        assert_eq!(Evaluation::new(vec![], vec![], 10).accuracy(), 0.0);
    }

    #[test]
    fn per_class_accuracy_is_relative_to_labels() {
        let stats = evaluation().per_class_accuracy();

        assert_eq!(stats[0], ClassAccuracy { accuracy: 0.5, count: 2 });
        assert!((stats[1].accuracy - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(stats[1].count, 3);
        assert_eq!(stats[2], ClassAccuracy { accuracy: 1.0, count: 1 });
    }

    #[test]
    fn missing_classes_report_zero() {
        let stats = Evaluation::new(vec![1], vec![1], 3).per_class_accuracy();

        assert_eq!(stats[0], ClassAccuracy { accuracy: 0.0, count: 0 });
        assert_eq!(stats[2].count, 0);
    }

    #[test]
    fn confusion_matrix_rows_are_labels() {
        let matrix = evaluation().confusion_matrix();

        assert_eq!(matrix.get(0, 0), 1);
        assert_eq!(matrix.get(0, 1), 1);
        assert_eq!(matrix.get(1, 0), 1);
        assert_eq!(matrix.get(1, 1), 2);
        assert_eq!(matrix.get(2, 2), 1);
        assert_eq!(matrix.get(2, 0), 0);
    }

    #[test]
    fn confusion_matrix_renders_class_names() {
        let table = evaluation().confusion_matrix().to_string();
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("Zero") && lines[0].contains("Two"));
        assert!(lines[2].trim_start().starts_with("One"));
        assert!(lines[2].trim_end().ends_with('0'));
    }

    #[test]
    fn report_serializes() {
        let report = serde_json::to_value(evaluation().report()).unwrap();

        assert_eq!(report["samples"], 6);
        assert_eq!(report["classes"][1]["name"], "One");
        assert_eq!(report["confusion_matrix"]["counts"][1][1], 2);
    }

    #[test]
    fn evaluate_predicts_every_sampled_item() {
        let device = Default::default();
        let model = ModelConfig::new().init::<TestBackend>(&device);
        let items = (0..12u8)
            .map(|i| MnistItem {
                image: [[i as f32 * 20.0; 28]; 28],
                label: i % 10,
            })
            .collect();

        let evaluation = evaluate(&model, InMemDataset::new(items), 8, 3, &device);

        assert_eq!(evaluation.len(), 8);
        assert!(evaluation.predictions.iter().all(|class| *class < 10));
        let total: usize = evaluation.per_class_accuracy().iter().map(|s| s.count).sum();
        assert_eq!(total, 8);
    }
}
