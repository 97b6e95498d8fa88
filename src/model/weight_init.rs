use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::{
    error::ScoreError,
    tensor::{tensor::Tensor, tensor_desc::TensorDesc},
};

use super::{layer_desc::ParamKind, layer_type::LayerType};

#[derive(Clone, Debug, PartialEq)]
pub enum WeightInit {
    He,                  // Good for ReLU activation
    Normal {
        mean: f32,
        std_dev: f32,
    },
    Constant(f32),
}

impl WeightInit {
    fn sample_normal<R: Rng>(rng: &mut R, mean: f32, std_dev: f32, count: usize) -> Result<Vec<f32>, ScoreError> {
        let normal = Normal::new(mean, std_dev).map_err(|e| {
            ScoreError::InvalidInput(format!("Bad normal init N({}, {}): {}", mean, std_dev, e))
        })?;
        Ok((0..count).map(|_| normal.sample(rng)).collect())
    }

    pub fn init<R: Rng>(&self, shape: &[usize], rng: &mut R) -> Result<Vec<f32>, ScoreError> {
        let total_elements = shape.iter().product();

        match self {
            WeightInit::He => {
                // Linear: [out_features, in_features]; Conv2D: [out, in, kernel_h, kernel_w]
                let fan_in: usize = shape.iter().skip(1).product();
                let std_dev = (2.0 / fan_in.max(1) as f32).sqrt();
                Self::sample_normal(rng, 0.0, std_dev, total_elements)
            }

            WeightInit::Normal { mean, std_dev } => Self::sample_normal(rng, *mean, *std_dev, total_elements),

            WeightInit::Constant(value) => Ok(vec![*value; total_elements]),
        }
    }

    pub fn init_tensor<R: Rng>(&self, desc: &TensorDesc, rng: &mut R) -> Result<Tensor, ScoreError> {
        let data = self.init(&desc.to_dims(), rng)?;
        Tensor::new(desc.clone(), data)
    }
}

/// Initialisation policy per parameterised layer kind.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamInit {
    Convolution {
        weight: WeightInit,
    },
    Normalization {
        weight: WeightInit,
        bias: WeightInit,
    },
    Dense {
        weight: WeightInit,
    },
}

impl ParamInit {
    /// Returns `None` for layers without parameters.
    pub fn for_layer(layer_type: &LayerType) -> Option<Self> {
        match layer_type {
            LayerType::Conv2D(_) => Some(ParamInit::Convolution {
                weight: WeightInit::Normal { mean: 0.0, std_dev: 0.02 },
            }),
            LayerType::BatchNorm2D { .. } => Some(ParamInit::Normalization {
                weight: WeightInit::Normal { mean: 1.0, std_dev: 0.02 },
                bias: WeightInit::Constant(0.0),
            }),
            LayerType::Linear(_) => Some(ParamInit::Dense {
                weight: WeightInit::He,
            }),
            LayerType::MaxPool2D { .. }
            | LayerType::Flatten
            | LayerType::ReLU
            | LayerType::LeakyReLU(_)
            | LayerType::Dropout(_)
            | LayerType::Softmax => None,
        }
    }

    pub fn policy_for(&self, kind: ParamKind) -> WeightInit {
        match (self, kind) {
            (ParamInit::Convolution { weight }, ParamKind::Weight)
            | (ParamInit::Dense { weight }, ParamKind::Weight)
            | (ParamInit::Normalization { weight, .. }, ParamKind::Weight) => weight.clone(),
            (ParamInit::Normalization { bias, .. }, ParamKind::Bias) => bias.clone(),
            (_, ParamKind::RunningVar) => WeightInit::Constant(1.0),
            (_, ParamKind::Bias) | (_, ParamKind::RunningMean) => WeightInit::Constant(0.0),
        }
    }

    pub fn init_param<R: Rng>(&self, kind: ParamKind, desc: &TensorDesc, rng: &mut R) -> Result<Tensor, ScoreError> {
        self.policy_for(kind).init_tensor(desc, rng)
    }
}
