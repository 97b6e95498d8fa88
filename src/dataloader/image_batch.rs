use crate::{
    error::ScoreError,
    tensor::{tensor::Tensor, tensor_desc::TensorDesc},
};

/// An ordered batch of images stored NCHW in one contiguous buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageBatch {
    tensor: Tensor,
}

impl ImageBatch {
    /// Fails when `shape` is not rank 4 or `data` does not fill it exactly.
    pub fn new(data: Vec<f32>, shape: &[usize]) -> Result<Self, ScoreError> {
        if shape.len() != 4 {
            return Err(ScoreError::InvalidInput(format!(
                "Image batch must have shape (N, C, H, W), got {:?}",
                shape
            )));
        }
        let desc = TensorDesc::from_dims(shape)?;
        Ok(Self {
            tensor: Tensor::new(desc, data)?,
        })
    }

    pub fn len(&self) -> usize {
        self.tensor.desc.batch()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Per-image (channels, height, width).
    pub fn image_shape(&self) -> (usize, usize, usize) {
        match self.tensor.desc {
            TensorDesc::Tensor4D { channels, height, width, .. } => (channels, height, width),
            // Construction only admits 4D descriptions
            _ => (0, 0, 0),
        }
    }

    pub fn image_len(&self) -> usize {
        let (c, h, w) = self.image_shape();
        c * h * w
    }

    pub fn image(&self, idx: usize) -> Option<&[f32]> {
        let len = self.image_len();
        self.tensor.data.get(idx * len..(idx + 1) * len)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.tensor.data
    }
}
