use crate::error::ScoreError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TensorDesc {
    // For vectors/1D tensors (e.g., biases, batch norm statistics)
    Vector { length: usize },

    // For matrices/2D tensors (e.g., linear layer weights, logits)
    Matrix { rows: usize, cols: usize },

    // For 4D tensors (e.g., conv layer weights, image batches)
    Tensor4D {
        batch: usize,
        channels: usize,
        height: usize,
        width: usize,
    },
}

impl TensorDesc {
    pub fn new_vector(length: usize) -> Self {
        Self::Vector { length }
    }

    pub fn new_matrix(rows: usize, cols: usize) -> Self {
        Self::Matrix { rows, cols }
    }

    pub fn new_tensor4d(batch: usize, channels: usize, height: usize, width: usize) -> Self {
        Self::Tensor4D { batch, channels, height, width }
    }

    pub fn from_dims(dims: &[usize]) -> Result<Self, ScoreError> {
        match dims {
            &[length] => Ok(Self::new_vector(length)),
            &[rows, cols] => Ok(Self::new_matrix(rows, cols)),
            &[batch, channels, height, width] => Ok(Self::new_tensor4d(batch, channels, height, width)),
            _ => Err(ScoreError::InvalidInput(format!(
                "Unsupported tensor rank {} (dims {:?})",
                dims.len(),
                dims
            ))),
        }
    }

    pub fn size_in_bytes(&self) -> usize {
        self.num_elements() * std::mem::size_of::<f32>()
    }

    pub fn num_elements(&self) -> usize {
        match &self {
            Self::Vector { length } => *length,
            Self::Matrix { rows, cols } => rows * cols,
            Self::Tensor4D { batch, channels, height, width } =>
                batch * channels * height * width,
        }
    }

    /// Leading dimension, i.e. the number of samples for activations.
    pub fn batch(&self) -> usize {
        match &self {
            Self::Vector { length } => *length,
            Self::Matrix { rows, .. } => *rows,
            Self::Tensor4D { batch, .. } => *batch,
        }
    }

    pub fn to_dims(&self) -> Vec<usize> {
        match &self {
            Self::Vector { length } => vec![*length],
            Self::Matrix { rows, cols } => vec![*rows, *cols],
            Self::Tensor4D { batch, channels, height, width } =>
                vec![*batch, *channels, *height, *width],
        }
    }

    pub fn dims_string(&self) -> String {
        self.to_dims()
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join("×")
    }
}
