use crate::{error::ScoreError, tensor::tensor_desc::TensorDesc};

use super::{
    layer_desc::{param_name, LayerDesc},
    layer_type::LayerType,
};

pub const NUM_CLASSES: usize = 10;
pub const IMAGE_CHANNELS: usize = 1;
pub const IMAGE_HEIGHT: usize = 28;
pub const IMAGE_WIDTH: usize = 28;

#[derive(Clone, Debug)]
pub struct ModelDesc {
    pub layers: Vec<LayerDesc>,
    // Per-sample input shape (channels, height, width)
    pub input_shape: (usize, usize, usize),
}

impl ModelDesc {
    pub fn new(channels: usize, height: usize, width: usize) -> Self {
        Self {
            layers: Vec::new(),
            input_shape: (channels, height, width),
        }
    }

    /// The digit classifier the score is defined against.
    pub fn mnist_classifier() -> Self {
        let mut desc = Self::new(IMAGE_CHANNELS, IMAGE_HEIGHT, IMAGE_WIDTH);
        desc.add_layers(vec![
            LayerType::conv2d_with(1, 32, 3, 3, 1, 1, 1, 1),
            LayerType::batch_norm2d(32),
            LayerType::ReLU,
            LayerType::max_pool2d(2),
            LayerType::conv2d_with(32, 64, 3, 3, 1, 1, 1, 1),
            LayerType::batch_norm2d(64),
            LayerType::ReLU,
            LayerType::max_pool2d(2),
            LayerType::Flatten,
            LayerType::linear(64 * 7 * 7, 128),
            LayerType::ReLU,
            LayerType::dropout(0.5),
            LayerType::linear(128, NUM_CLASSES),
        ]);
        desc
    }

    pub fn add_layer(&mut self, layer_type: LayerType) {
        self.layers.push(LayerDesc::new(layer_type));
    }

    pub fn add_layers(&mut self, layer_types: Vec<LayerType>) {
        for layer_type in layer_types.into_iter() {
            self.add_layer(layer_type);
        }
    }

    pub fn input_desc(&self, batch_size: usize) -> TensorDesc {
        let (c, h, w) = self.input_shape;
        TensorDesc::new_tensor4d(batch_size, c, h, w)
    }

    /// Output shape of every layer, in order, for a given batch size.
    pub fn layer_output_shapes(&self, batch_size: usize) -> Result<Vec<TensorDesc>, ScoreError> {
        let mut shape = self.input_desc(batch_size);
        let mut shapes = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            shape = layer.output_shape(&shape)?;
            shapes.push(shape.clone());
        }
        Ok(shapes)
    }

    pub fn output_shape(&self, batch_size: usize) -> Result<TensorDesc, ScoreError> {
        Ok(self
            .layer_output_shapes(batch_size)?
            .pop()
            .unwrap_or_else(|| self.input_desc(batch_size)))
    }

    /// Number of output classes, checked against the layer stack.
    pub fn num_classes(&self) -> Result<usize, ScoreError> {
        match self.output_shape(1)? {
            TensorDesc::Matrix { cols, .. } => Ok(cols),
            other => Err(ScoreError::ModelLoad(format!(
                "Classifier must end in a [batch, classes] output, got {}",
                other.dims_string()
            ))),
        }
    }

    /// Every named parameter tensor the model expects.
    pub fn parameter_descs(&self) -> Vec<(String, TensorDesc)> {
        self.layers
            .iter()
            .enumerate()
            .flat_map(|(idx, layer)| {
                layer
                    .params
                    .iter()
                    .map(move |(kind, desc)| (param_name(idx, *kind), desc.clone()))
            })
            .collect()
    }

    pub fn total_parameters(&self) -> usize {
        self.layers.iter().map(|layer| layer.parameter_count()).sum()
    }
}
