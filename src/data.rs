use burn::{
    data::{
        dataloader::batcher::Batcher,
        dataset::{
            transform::{PartialDataset, ShuffledDataset},
            vision::{MnistDataset, MnistItem},
            Dataset,
        },
    },
    tensor::{backend::Backend, ElementConversion, Int, Tensor, TensorData},
};

use crate::digit::{HEIGHT, WIDTH};

/// First `size` items of an MNIST split.
pub type MnistSplit = PartialDataset<MnistDataset, MnistItem>;

#[derive(Clone)]
pub struct MnistBatcher<B: Backend> {
    device: B::Device,
}

#[derive(Clone, Debug)]
pub struct MnistBatch<B: Backend> {
    pub images: Tensor<B, 3>,
    pub targets: Tensor<B, 1, Int>,
}

impl<B: Backend> MnistBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<MnistItem, MnistBatch<B>> for MnistBatcher<B> {
    fn batch(&self, items: Vec<MnistItem>) -> MnistBatch<B> {
        let images = items
            .iter()
            .map(|item| TensorData::from(item.image).convert::<B::FloatElem>())
            .map(|data| Tensor::<B, 2>::from_data(data, &self.device))
            .map(|tensor| tensor.reshape([1, HEIGHT, WIDTH]))
            // Scale between [0, 1]
            .map(|tensor| tensor / 255)
            .collect();

        let targets = items
            .iter()
            .map(|item| {
                Tensor::<B, 1, Int>::from_data(
                    [(item.label as i64).elem::<B::IntElem>()],
                    &self.device,
                )
            })
            .collect();

        let images = Tensor::cat(images, 0);
        let targets = Tensor::cat(targets, 0);

        MnistBatch { images, targets }
    }
}

/// Training images, downloaded on first use.
pub fn train_split(size: usize) -> MnistSplit {
    split(MnistDataset::train(), size)
}

/// Test images, downloaded on first use.
pub fn test_split(size: usize) -> MnistSplit {
    split(MnistDataset::test(), size)
}

fn split(dataset: MnistDataset, size: usize) -> MnistSplit {
    let end = size.min(dataset.len());
    if end < size {
        log::warn!("Requested {size} items, the split only holds {end}");
    }
    PartialDataset::new(dataset, 0, end)
}

/// Seeded random subset of `count` items.
pub fn sample<D, I>(dataset: D, count: usize, seed: u64) -> Vec<I>
where
    D: Dataset<I>,
    I: Clone + Send + Sync,
{
    ShuffledDataset::<D, I>::with_seed(dataset, seed)
        .iter()
        .take(count)
        .collect()
}
