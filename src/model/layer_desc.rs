use crate::{error::ScoreError, tensor::tensor_desc::TensorDesc};

use super::layer_type::LayerType;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Weight,
    Bias,
    RunningMean,
    RunningVar,
}

impl ParamKind {
    pub fn suffix(&self) -> &'static str {
        match self {
            ParamKind::Weight => "weight",
            ParamKind::Bias => "bias",
            ParamKind::RunningMean => "running_mean",
            ParamKind::RunningVar => "running_var",
        }
    }
}

pub fn param_name(layer_idx: usize, kind: ParamKind) -> String {
    format!("layers.{}.{}", layer_idx, kind.suffix())
}

#[derive(Clone, Debug)]
pub struct LayerDesc {
    pub layer_type: LayerType,
    pub params: Vec<(ParamKind, TensorDesc)>,
}

impl LayerDesc {
    pub fn new(layer_type: LayerType) -> Self {
        let params = match &layer_type {
            LayerType::Linear(shape) => vec![
                (ParamKind::Weight, TensorDesc::new_matrix(shape.out_features, shape.in_features)),
                (ParamKind::Bias, TensorDesc::new_vector(shape.out_features)),
            ],
            LayerType::Conv2D(shape) => {
                let (k_h, k_w) = shape.kernel();
                vec![
                    (
                        ParamKind::Weight,
                        TensorDesc::new_tensor4d(shape.out_features, shape.in_features, k_h, k_w),
                    ),
                    (ParamKind::Bias, TensorDesc::new_vector(shape.out_features)),
                ]
            }
            LayerType::BatchNorm2D { features, .. } => vec![
                (ParamKind::Weight, TensorDesc::new_vector(*features)),
                (ParamKind::Bias, TensorDesc::new_vector(*features)),
                (ParamKind::RunningMean, TensorDesc::new_vector(*features)),
                (ParamKind::RunningVar, TensorDesc::new_vector(*features)),
            ],
            _ => Vec::new(),
        };

        Self { layer_type, params }
    }

    pub fn parameter_count(&self) -> usize {
        self.params.iter().map(|(_, desc)| desc.num_elements()).sum()
    }

    pub fn output_shape(&self, input: &TensorDesc) -> Result<TensorDesc, ScoreError> {
        match (&self.layer_type, input) {
            (LayerType::Linear(shape), TensorDesc::Matrix { rows, cols }) => {
                if *cols != shape.in_features {
                    return Err(ScoreError::ModelLoad(format!(
                        "Linear layer expected {} input features, got {}",
                        shape.in_features, cols
                    )));
                }
                Ok(TensorDesc::new_matrix(*rows, shape.out_features))
            }
            (LayerType::Conv2D(shape), TensorDesc::Tensor4D { batch, channels, height, width }) => {
                if *channels != shape.in_features {
                    return Err(ScoreError::ModelLoad(format!(
                        "Conv2D expected {} input channels, got {}",
                        shape.in_features, channels
                    )));
                }

                let (k_h, k_w) = shape.kernel();
                let (s_h, s_w) = shape.stride();
                let (p_h, p_w) = shape.padding();

                if height + 2 * p_h < k_h || width + 2 * p_w < k_w || s_h == 0 || s_w == 0 {
                    return Err(ScoreError::ModelLoad(format!(
                        "Conv2D kernel {}×{} does not fit input {}×{}",
                        k_h, k_w, height, width
                    )));
                }

                let h_out = ((height + 2 * p_h - k_h) / s_h) + 1;
                let w_out = ((width + 2 * p_w - k_w) / s_w) + 1;

                Ok(TensorDesc::new_tensor4d(*batch, shape.out_features, h_out, w_out))
            }
            (LayerType::BatchNorm2D { features, .. }, TensorDesc::Tensor4D { channels, .. }) => {
                if channels != features {
                    return Err(ScoreError::ModelLoad(format!(
                        "BatchNorm2D expected {} channels, got {}",
                        features, channels
                    )));
                }
                Ok(input.clone())
            }
            (LayerType::MaxPool2D { kernel, stride }, TensorDesc::Tensor4D { batch, channels, height, width }) => {
                if *kernel == 0 || *stride == 0 || height < kernel || width < kernel {
                    return Err(ScoreError::ModelLoad(format!(
                        "MaxPool2D kernel {} does not fit input {}×{}",
                        kernel, height, width
                    )));
                }
                let h_out = (height - kernel) / stride + 1;
                let w_out = (width - kernel) / stride + 1;
                Ok(TensorDesc::new_tensor4d(*batch, *channels, h_out, w_out))
            }
            (LayerType::Flatten, TensorDesc::Tensor4D { batch, channels, height, width }) => {
                Ok(TensorDesc::new_matrix(*batch, channels * height * width))
            }
            (LayerType::Flatten, TensorDesc::Matrix { .. }) => Ok(input.clone()),
            (LayerType::Softmax, TensorDesc::Matrix { .. }) => Ok(input.clone()),
            // Element-wise layers preserve input shape
            (LayerType::ReLU | LayerType::LeakyReLU(_) | LayerType::Dropout(_), _) => Ok(input.clone()),
            (layer_type, _) => Err(ScoreError::ModelLoad(format!(
                "{} layer cannot take input of shape {}",
                layer_type.name(),
                input.dims_string()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conv_output_shape_with_padding() {
        let layer = LayerDesc::new(LayerType::conv2d_with(1, 32, 3, 3, 1, 1, 1, 1));
        let out = layer.output_shape(&TensorDesc::new_tensor4d(4, 1, 28, 28)).unwrap();
        assert_eq!(out, TensorDesc::new_tensor4d(4, 32, 28, 28));
    }

    #[test]
    fn conv_rejects_wrong_channel_count() {
        let layer = LayerDesc::new(LayerType::conv2d(1, 8));
        let err = layer.output_shape(&TensorDesc::new_tensor4d(2, 3, 28, 28)).unwrap_err();
        assert!(err.is_model_load());
    }

    #[test]
    fn pool_then_flatten() {
        let pool = LayerDesc::new(LayerType::max_pool2d(2));
        let pooled = pool.output_shape(&TensorDesc::new_tensor4d(2, 64, 14, 14)).unwrap();
        assert_eq!(pooled, TensorDesc::new_tensor4d(2, 64, 7, 7));

        let flat = LayerDesc::new(LayerType::Flatten).output_shape(&pooled).unwrap();
        assert_eq!(flat, TensorDesc::new_matrix(2, 3136));
    }

    #[test]
    fn batch_norm_declares_running_stats() {
        let layer = LayerDesc::new(LayerType::batch_norm2d(16));
        let kinds: Vec<_> = layer.params.iter().map(|(kind, _)| *kind).collect();
        assert_eq!(
            kinds,
            vec![ParamKind::Weight, ParamKind::Bias, ParamKind::RunningMean, ParamKind::RunningVar]
        );
        assert_eq!(layer.parameter_count(), 64);
    }

    #[test]
    fn param_names_are_indexed() {
        assert_eq!(param_name(3, ParamKind::RunningVar), "layers.3.running_var");
    }
}
