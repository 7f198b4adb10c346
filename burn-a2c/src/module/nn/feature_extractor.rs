use std::f64::consts::SQRT_2;

use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::pool::{MaxPool2d, MaxPool2dConfig};
use burn::nn::{
    BatchNorm, BatchNormConfig, Dropout, DropoutConfig, Initializer, Linear, LinearConfig,
    PaddingConfig2d,
};
use burn::prelude::*;
use burn::tensor::activation::relu;

pub const FLAT_FEATURES: usize = 128;
pub const IMAGE_FEATURES: usize = 32;
pub const CONV_FILTERS: usize = 32;
const KERNEL_L2: f64 = 0.001;
const DROPOUT: f64 = 0.3;

#[derive(Config, Debug, PartialEq)]
pub enum FeatureExtractorConfig {
    Flat {
        input_dim: usize,
    },
    Image {
        channels: usize,
        height: usize,
        width: usize,
        blocks: usize,
    },
}

impl FeatureExtractorConfig {
    pub fn flat(input_dim: usize) -> Self {
        Self::Flat { input_dim }
    }

    pub fn image(channels: usize, height: usize, width: usize) -> Self {
        Self::Image {
            channels,
            height,
            width,
            blocks: 2,
        }
    }

    pub fn input_dim(&self) -> usize {
        match self {
            Self::Flat { input_dim } => *input_dim,
            Self::Image {
                channels,
                height,
                width,
                ..
            } => channels * height * width,
        }
    }

    pub fn output_dim(&self) -> usize {
        match self {
            Self::Flat { .. } => FLAT_FEATURES,
            Self::Image { .. } => IMAGE_FEATURES,
        }
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> FeatureExtractor<B> {
        self.assertions();
        match self {
            Self::Flat { input_dim } => FeatureExtractor {
                image: None,
                dense: create_dense_layer(*input_dim, FLAT_FEATURES, device),
            },
            Self::Image {
                channels,
                height,
                width,
                blocks,
            } => {
                let mut conv_blocks = Vec::with_capacity(*blocks);
                let (mut depth, mut rows, mut columns) = (*channels, *height, *width);
                for _ in 0..*blocks {
                    conv_blocks.push(create_conv_block(depth, device));
                    depth = CONV_FILTERS;
                    rows /= 2;
                    columns /= 2;
                }
                FeatureExtractor {
                    image: Some(ImageEncoder {
                        blocks: conv_blocks,
                        channels: *channels,
                        height: *height,
                        width: *width,
                    }),
                    dense: create_dense_layer(depth * rows * columns, IMAGE_FEATURES, device),
                }
            }
        }
    }

    fn assertions(&self) {
        match self {
            Self::Flat { input_dim } => assert!(
                *input_dim > 0,
                "Unable to construct feature extractor. Flat observations need at least one feature"
            ),
            Self::Image {
                channels,
                height,
                width,
                blocks,
            } => {
                assert!(
                    *channels > 0,
                    "Unable to construct feature extractor. Images need at least one channel"
                );
                let (mut rows, mut columns) = (*height, *width);
                for _ in 0..*blocks {
                    rows /= 2;
                    columns /= 2;
                }
                assert!(
                    rows > 0 && columns > 0,
                    "Unable to construct feature extractor. A {height}x{width} image is too small for {blocks} pooling blocks"
                );
                // Batch norm over a single position per channel erases the input.
                assert!(
                    *blocks == 0 || rows * columns > 1,
                    "Unable to construct feature extractor. A {height}x{width} image pools down to a single position after {blocks} blocks"
                );
            }
        }
    }
}

#[derive(Module, Debug)]
pub struct FeatureExtractor<B: Backend> {
    image: Option<ImageEncoder<B>>,
    dense: Linear<B>,
}

#[derive(Module, Debug)]
pub struct ImageEncoder<B: Backend> {
    blocks: Vec<ConvBlock<B>>,
    channels: usize,
    height: usize,
    width: usize,
}

#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    conv: Conv2d<B>,
    pool: MaxPool2d,
    norm: BatchNorm<B, 2>,
    dropout: Dropout,
}

fn create_dense_layer<B: Backend>(
    input_size: usize,
    output_size: usize,
    device: &B::Device,
) -> Linear<B> {
    LinearConfig::new(input_size, output_size)
        .with_initializer(Initializer::KaimingUniform {
            gain: SQRT_2,
            fan_out_only: false,
        })
        .init(device)
}

fn create_conv_block<B: Backend>(input_channels: usize, device: &B::Device) -> ConvBlock<B> {
    ConvBlock {
        conv: Conv2dConfig::new([input_channels, CONV_FILTERS], [3, 3])
            .with_padding(PaddingConfig2d::Same)
            .with_initializer(Initializer::KaimingNormal {
                gain: SQRT_2,
                fan_out_only: false,
            })
            .init(device),
        pool: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
        norm: BatchNormConfig::new(CONV_FILTERS).init(device),
        dropout: DropoutConfig::new(DROPOUT).init(),
    }
}

impl<B: Backend> ConvBlock<B> {
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = relu(self.conv.forward(input));
        let x = self.pool.forward(x);
        let x = self.norm.forward(x);
        self.dropout.forward(x)
    }

    fn squared_kernel_norm(&self) -> Tensor<B, 1> {
        self.conv.weight.val().powf_scalar(2.0).sum()
    }
}

impl<B: Backend> ImageEncoder<B> {
    pub fn forward(&self, observations: Tensor<B, 2>) -> Tensor<B, 2> {
        let [batch_size, _] = observations.dims();
        let mut x = observations.reshape([batch_size, self.channels, self.height, self.width]);
        for block in self.blocks.iter() {
            x = block.forward(x);
        }
        x.flatten(1, 3)
    }
}

impl<B: Backend> FeatureExtractor<B> {
    pub fn forward(&self, observations: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = match &self.image {
            Some(encoder) => encoder.forward(observations),
            None => observations,
        };
        relu(self.dense.forward(x))
    }

    pub fn projection(&self) -> &Linear<B> {
        &self.dense
    }

    /// L2 penalty on the convolution kernels; flat trunks are unregularized.
    pub fn penalty(&self) -> Option<Tensor<B, 1>> {
        self.image
            .as_ref()?
            .blocks
            .iter()
            .map(ConvBlock::squared_kernel_norm)
            .reduce(|total, norm| total + norm)
            .map(|total| total * KERNEL_L2)
    }
}
