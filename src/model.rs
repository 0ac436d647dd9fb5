use burn::{
    config::Config,
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{MaxPool2d, MaxPool2dConfig},
        Initializer, Linear, LinearConfig, Relu,
    },
    tensor::{backend::Backend, Tensor},
};

use crate::{digit::WIDTH, Error};

/// Two convolution and pooling stages followed by a dense classifier.
#[derive(Module, Debug)]
pub struct Model<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    pool: MaxPool2d,
    activation: Relu,
    output: Linear<B>,
}

#[derive(Config, Debug)]
pub struct ModelConfig {
    #[config(default = 10)]
    pub num_classes: usize,
    #[config(default = 8)]
    pub conv1_channels: usize,
    #[config(default = 16)]
    pub conv2_channels: usize,
    #[config(default = 5)]
    pub kernel_size: usize,
    #[config(default = 2)]
    pub pool_size: usize,
}

/// Variance scaling over the fan-in with a normal distribution.
fn variance_scaling() -> Initializer {
    Initializer::KaimingNormal {
        gain: 1.0,
        fan_out_only: false,
    }
}

impl ModelConfig {
    /// Side length of the feature maps entering the classifier, `None` when the
    /// convolutions and pooling leave nothing of the 28x28 input.
    fn checked_feature_side(&self) -> Option<usize> {
        let stage = |side: usize| {
            side.checked_sub(self.kernel_size)?
                .checked_add(1)?
                .checked_div(self.pool_size)
        };
        stage(WIDTH).and_then(stage).filter(|side| *side > 0)
    }

    /// Side length of the feature maps entering the classifier.
    pub fn feature_side(&self) -> usize {
        self.checked_feature_side().unwrap_or(0)
    }

    /// Rejects layer sizes that cannot be built over a 28x28 input.
    pub fn validate(&self) -> crate::Result<()> {
        let sizes = [
            ("num_classes", self.num_classes),
            ("conv1_channels", self.conv1_channels),
            ("conv2_channels", self.conv2_channels),
            ("kernel_size", self.kernel_size),
            ("pool_size", self.pool_size),
        ];
        if let Some((name, _)) = sizes.iter().find(|(_, size)| *size == 0) {
            return Err(Error::Config(format!("{name} must be positive")));
        }
        if self.checked_feature_side().is_none() {
            return Err(Error::Config(format!(
                "kernel size {} and pool size {} leave no features of a {WIDTH}x{WIDTH} image",
                self.kernel_size, self.pool_size
            )));
        }
        Ok(())
    }

    pub fn flattened_size(&self) -> usize {
        self.conv2_channels * self.feature_side() * self.feature_side()
    }

    /// Returns the initialized model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Model<B> {
        let kernel = [self.kernel_size, self.kernel_size];
        let pool = [self.pool_size, self.pool_size];

        Model {
            conv1: Conv2dConfig::new([1, self.conv1_channels], kernel)
                .with_initializer(variance_scaling())
                .init(device),
            conv2: Conv2dConfig::new([self.conv1_channels, self.conv2_channels], kernel)
                .with_initializer(variance_scaling())
                .init(device),
            pool: MaxPool2dConfig::new(pool).with_strides(pool).init(),
            activation: Relu::new(),
            output: LinearConfig::new(self.flattened_size(), self.num_classes)
                .with_initializer(variance_scaling())
                .init(device),
        }
    }
}

impl<B: Backend> Model<B> {
    /// # Shapes
    ///   - Images [batch_size, height, width]
    ///   - Output [batch_size, num_classes] (logits)
    pub fn forward(&self, images: Tensor<B, 3>) -> Tensor<B, 2> {
        let [batch_size, height, width] = images.dims();

        // Create a channel at the second dimension.
        let x = images.reshape([batch_size, 1, height, width]);

        let x = self.conv1.forward(x); // [batch_size, 8, 24, 24]
        let x = self.activation.forward(x);
        let x = self.pool.forward(x); // [batch_size, 8, 12, 12]
        let x = self.conv2.forward(x); // [batch_size, 16, 8, 8]
        let x = self.activation.forward(x);
        let x = self.pool.forward(x); // [batch_size, 16, 4, 4]

        let x = x.flatten::<2>(1, 3);

        self.output.forward(x)
    }

    pub fn num_classes(&self) -> usize {
        let [_, num_classes] = self.output.weight.dims();
        num_classes
    }
}
