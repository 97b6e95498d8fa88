use std::path::Path;

use tracing::{debug, info};

use crate::{
    error::ScoreError,
    model::{
        layer_desc::{param_name, ParamKind},
        layer_type::LayerType,
        model::ModelDesc,
        params::ModelParams,
    },
    tensor::tensor::Tensor,
};

use super::{cpu_compute, model_stats::model_summary};

/// A model description bound to a matching set of parameters.
///
/// Only inference is supported: nothing records gradients and dropout is the
/// identity, so a forward pass is a pure function of the input.
pub struct Classifier {
    desc: ModelDesc,
    params: ModelParams,
    num_classes: usize,
}

impl Classifier {
    pub fn new(desc: ModelDesc, params: ModelParams) -> Result<Self, ScoreError> {
        let num_classes = desc.num_classes()?;
        params.validate(&desc)?;
        Ok(Self { desc, params, num_classes })
    }

    /// Loads the MNIST classifier weights from a safetensors file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScoreError> {
        Self::load_with(path, ModelDesc::mnist_classifier())
    }

    pub fn load_with(path: impl AsRef<Path>, desc: ModelDesc) -> Result<Self, ScoreError> {
        let params = ModelParams::load(path, &desc)?;
        let classifier = Self::new(desc, params)?;
        info!(
            "Classifier ready: {} layers, {} parameters",
            classifier.desc.layers.len(),
            classifier.desc.total_parameters()
        );
        debug!("\n{}", model_summary(&classifier.desc));
        Ok(classifier)
    }

    pub fn desc(&self) -> &ModelDesc {
        &self.desc
    }

    pub fn params(&self) -> &ModelParams {
        &self.params
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Raw logits, shape [batch, classes].
    pub fn forward(&self, input: &Tensor) -> Result<Tensor, ScoreError> {
        let expected = self.desc.input_desc(input.desc.batch());
        if input.desc != expected {
            return Err(ScoreError::InvalidInput(format!(
                "Classifier expects input {}, got {}",
                expected.dims_string(),
                input.desc.dims_string()
            )));
        }

        let mut x = input.clone();
        for (idx, layer) in self.desc.layers.iter().enumerate() {
            let out_desc = layer.output_shape(&x.desc)?;
            x = match &layer.layer_type {
                LayerType::Conv2D(shape) => cpu_compute::conv2d(
                    &x,
                    self.param(idx, ParamKind::Weight)?,
                    self.param(idx, ParamKind::Bias)?,
                    shape.stride(),
                    shape.padding(),
                    &out_desc,
                ),
                LayerType::BatchNorm2D { eps, .. } => cpu_compute::batch_norm2d(
                    &x,
                    self.param(idx, ParamKind::Weight)?,
                    self.param(idx, ParamKind::Bias)?,
                    self.param(idx, ParamKind::RunningMean)?,
                    self.param(idx, ParamKind::RunningVar)?,
                    *eps,
                ),
                LayerType::MaxPool2D { kernel, stride } => {
                    cpu_compute::max_pool2d(&x, *kernel, *stride, &out_desc)
                }
                LayerType::Flatten => cpu_compute::flatten(x),
                LayerType::Linear(_) => cpu_compute::linear(
                    &x,
                    self.param(idx, ParamKind::Weight)?,
                    self.param(idx, ParamKind::Bias)?,
                ),
                LayerType::ReLU => cpu_compute::relu(x),
                LayerType::LeakyReLU(alpha) => cpu_compute::leaky_relu(x, *alpha),
                LayerType::Dropout(_) => x,
                LayerType::Softmax => cpu_compute::softmax(x),
            };
        }

        Ok(x)
    }

    /// Class probabilities, shape [batch, classes]; each row sums to 1.
    ///
    /// A model whose last layer is already `Softmax` is returned as is.
    pub fn predict_proba(&self, input: &Tensor) -> Result<Tensor, ScoreError> {
        let output = self.forward(input)?;
        if self.ends_in_softmax() {
            return Ok(output);
        }
        Ok(cpu_compute::softmax(output))
    }

    fn ends_in_softmax(&self) -> bool {
        matches!(
            self.desc.layers.last().map(|layer| &layer.layer_type),
            Some(LayerType::Softmax)
        )
    }

    fn param(&self, layer_idx: usize, kind: ParamKind) -> Result<&Tensor, ScoreError> {
        self.params.get(&param_name(layer_idx, kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::tensor_desc::TensorDesc;

    fn image_batch(n: usize) -> Tensor {
        let data = (0..n * 28 * 28).map(|i| ((i * 37) % 255) as f32 / 255.0).collect();
        Tensor::new(TensorDesc::new_tensor4d(n, 1, 28, 28), data).unwrap()
    }

    #[test]
    fn mnist_classifier_produces_probabilities() {
        let desc = ModelDesc::mnist_classifier();
        let params = ModelParams::init(&desc, 11).unwrap();
        let classifier = Classifier::new(desc, params).unwrap();

        let probs = classifier.predict_proba(&image_batch(3)).unwrap();
        assert_eq!(probs.desc, TensorDesc::new_matrix(3, 10));
        for row in probs.data.chunks(10) {
            let sum: f32 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn per_sample_output_does_not_depend_on_batch() {
        let desc = ModelDesc::mnist_classifier();
        let classifier = Classifier::new(desc.clone(), ModelParams::init(&desc, 5).unwrap()).unwrap();

        let batch = image_batch(2);
        let together = classifier.forward(&batch).unwrap();

        let first = Tensor::new(
            TensorDesc::new_tensor4d(1, 1, 28, 28),
            batch.data[..28 * 28].to_vec(),
        )
        .unwrap();
        let alone = classifier.forward(&first).unwrap();
        assert_eq!(&together.data[..10], alone.data.as_slice());
    }

    #[test]
    fn trailing_softmax_is_not_applied_twice() {
        let mut desc = ModelDesc::new(1, 28, 28);
        desc.add_layers(vec![LayerType::Flatten, LayerType::linear(784, 10), LayerType::Softmax]);

        // All-ones input: logit 784 for class 3, 0 elsewhere
        let mut weight = vec![0.0; 10 * 784];
        weight[3 * 784..4 * 784].fill(1.0);
        let mut params = ModelParams::default();
        params.insert("layers.1.weight", Tensor::new(TensorDesc::new_matrix(10, 784), weight).unwrap());
        params.insert("layers.1.bias", Tensor::zeros(TensorDesc::new_vector(10)));
        let classifier = Classifier::new(desc, params).unwrap();

        let input = Tensor::new(TensorDesc::new_tensor4d(1, 1, 28, 28), vec![1.0; 784]).unwrap();
        let probs = classifier.predict_proba(&input).unwrap();
        assert_eq!(probs.data, classifier.forward(&input).unwrap().data);
        assert!(probs.data[3] > 0.999, "p[3] was {}", probs.data[3]);
        assert!(probs.data[0] < 1e-6, "p[0] was {}", probs.data[0]);
    }

    #[test]
    fn leaky_relu_layer_runs_in_forward_pass() {
        let mut desc = ModelDesc::new(1, 28, 28);
        desc.add_layers(vec![LayerType::Flatten, LayerType::LeakyReLU(0.5), LayerType::linear(784, 10)]);
        let classifier = Classifier::new(desc.clone(), ModelParams::init(&desc, 8).unwrap()).unwrap();

        let input = Tensor::new(TensorDesc::new_tensor4d(2, 1, 28, 28), vec![-1.0; 2 * 784]).unwrap();
        let probs = classifier.predict_proba(&input).unwrap();
        assert_eq!(probs.desc, TensorDesc::new_matrix(2, 10));
        assert_eq!(&probs.data[..10], &probs.data[10..]);
    }

    #[test]
    fn wrong_input_shape_is_rejected() {
        let desc = ModelDesc::mnist_classifier();
        let classifier = Classifier::new(desc.clone(), ModelParams::init(&desc, 0).unwrap()).unwrap();
        let rgb = Tensor::zeros(TensorDesc::new_tensor4d(1, 3, 28, 28));
        assert!(classifier.forward(&rgb).unwrap_err().is_invalid_input());
    }

    #[test]
    fn incomplete_params_are_rejected() {
        let err = Classifier::new(ModelDesc::mnist_classifier(), ModelParams::default())
            .err()
            .unwrap();
        assert!(err.is_model_load());
    }
}
