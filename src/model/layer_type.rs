use super::layer_shape::LayerShape;

/// Closed set of layer kinds the classifier engine can evaluate.
#[derive(Clone, Debug, PartialEq)]
pub enum LayerType {
    Conv2D(LayerShape),
    BatchNorm2D {
        features: usize,
        eps: f32,
    },
    MaxPool2D {
        kernel: usize,
        stride: usize,
    },
    Flatten,
    Linear(LayerShape),
    ReLU,
    LeakyReLU(f32),
    // Identity at inference time
    Dropout(f32),
    Softmax,
}

impl LayerType {
    pub fn linear(in_features: usize, out_features: usize) -> Self {
        LayerType::Linear(LayerShape {
            in_features,
            out_features,
            ..Default::default()
        })
    }

    pub fn conv2d(in_channels: usize, out_channels: usize) -> Self {
        LayerType::Conv2D(LayerShape {
            in_features: in_channels,
            out_features: out_channels,
            kernel_w: Some(3),
            kernel_h: Some(3),
            stride_w: Some(1),
            stride_h: Some(1),
            padding_w: Some(0),
            padding_h: Some(0),
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn conv2d_with(
        in_channels: usize,
        out_channels: usize,
        kernel_w: usize,
        kernel_h: usize,
        stride_w: usize,
        stride_h: usize,
        padding_w: usize,
        padding_h: usize,
    ) -> Self {
        LayerType::Conv2D(LayerShape {
            in_features: in_channels,
            out_features: out_channels,
            kernel_w: Some(kernel_w),
            kernel_h: Some(kernel_h),
            stride_w: Some(stride_w),
            stride_h: Some(stride_h),
            padding_w: Some(padding_w),
            padding_h: Some(padding_h),
        })
    }

    pub fn batch_norm2d(features: usize) -> Self {
        LayerType::BatchNorm2D { features, eps: 1e-5 }
    }

    pub fn max_pool2d(kernel: usize) -> Self {
        LayerType::MaxPool2D { kernel, stride: kernel }
    }

    pub fn dropout(p: f32) -> Self {
        LayerType::Dropout(p)
    }

    pub fn name(&self) -> &'static str {
        match self {
            LayerType::Conv2D(_) => "Conv2D",
            LayerType::BatchNorm2D { .. } => "BatchNorm2D",
            LayerType::MaxPool2D { .. } => "MaxPool2D",
            LayerType::Flatten => "Flatten",
            LayerType::Linear(_) => "Linear",
            LayerType::ReLU => "ReLU",
            LayerType::LeakyReLU(_) => "LeakyReLU",
            LayerType::Dropout(_) => "Dropout",
            LayerType::Softmax => "Softmax",
        }
    }

    pub fn config_string(&self) -> Option<String> {
        match self {
            LayerType::Conv2D(shape) => {
                let (k_h, k_w) = shape.kernel();
                let (s_h, s_w) = shape.stride();
                let (p_h, p_w) = shape.padding();
                Some(format!(
                    "in_channels={}, out_channels={}, kernel={}×{}, stride={}×{}, padding={}×{}",
                    shape.in_features, shape.out_features, k_h, k_w, s_h, s_w, p_h, p_w
                ))
            }
            LayerType::BatchNorm2D { features, eps } => Some(format!("features={}, eps={}", features, eps)),
            LayerType::MaxPool2D { kernel, stride } => Some(format!("kernel={}, stride={}", kernel, stride)),
            LayerType::Linear(shape) => Some(format!(
                "in_features={}, out_features={}",
                shape.in_features, shape.out_features
            )),
            LayerType::LeakyReLU(alpha) => Some(format!("α={}", alpha)),
            LayerType::Dropout(p) => Some(format!("p={}", p)),
            LayerType::Flatten | LayerType::ReLU | LayerType::Softmax => None,
        }
    }
}
