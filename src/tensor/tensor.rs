use crate::error::ScoreError;

use super::tensor_desc::TensorDesc;

/// Row-major CPU tensor. The buffer length always equals `desc.num_elements()`.
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor {
    pub desc: TensorDesc,
    pub data: Vec<f32>,
}

impl Tensor {
    pub fn new(desc: TensorDesc, data: Vec<f32>) -> Result<Self, ScoreError> {
        if desc.num_elements() != data.len() {
            return Err(ScoreError::InvalidInput(format!(
                "Tensor shape {} needs {} elements, got {}",
                desc.dims_string(),
                desc.num_elements(),
                data.len()
            )));
        }
        Ok(Self { desc, data })
    }

    pub fn zeros(desc: TensorDesc) -> Self {
        let data = vec![0.0; desc.num_elements()];
        Self { desc, data }
    }

    pub fn dims(&self) -> Vec<usize> {
        self.desc.to_dims()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Decode a little-endian f32 byte buffer, as stored in safetensors files.
    pub fn from_le_bytes(desc: TensorDesc, bytes: &[u8]) -> Result<Self, ScoreError> {
        if bytes.len() != desc.size_in_bytes() {
            return Err(ScoreError::ModelLoad(format!(
                "Tensor {} needs {} bytes, got {}",
                desc.dims_string(),
                desc.size_in_bytes(),
                bytes.len()
            )));
        }

        let data = bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();

        Ok(Self { desc, data })
    }

    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.data.iter().flat_map(|x| x.to_le_bytes()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_buffer() {
        let err = Tensor::new(TensorDesc::new_matrix(2, 3), vec![0.0; 5]).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn le_bytes_preserve_values() {
        let t = Tensor::new(TensorDesc::new_vector(3), vec![1.5, -0.25, 3.0e-7]).unwrap();
        let back = Tensor::from_le_bytes(t.desc.clone(), &t.to_le_bytes()).unwrap();
        assert_eq!(t, back);
    }

    #[test]
    fn short_byte_buffer_is_model_load_error() {
        let err = Tensor::from_le_bytes(TensorDesc::new_vector(2), &[0u8; 7]).unwrap_err();
        assert!(err.is_model_load());
    }
}
