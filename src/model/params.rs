//! Named parameter storage for a [`ModelDesc`], persisted as safetensors.

use rand::rngs::StdRng;
use rand::SeedableRng;
use safetensors::tensor::{Dtype, TensorView};
use safetensors::SafeTensors;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use crate::{
    error::ScoreError,
    tensor::tensor::Tensor,
};

use super::{
    layer_desc::param_name,
    model::ModelDesc,
    weight_init::ParamInit,
};

#[derive(Clone, Debug, Default)]
pub struct ModelParams {
    tensors: HashMap<String, Tensor>,
}

impl ModelParams {
    /// Fresh parameters drawn from each layer's [`ParamInit`] policy.
    pub fn init(desc: &ModelDesc, seed: u64) -> Result<Self, ScoreError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut tensors = HashMap::new();

        for (idx, layer) in desc.layers.iter().enumerate() {
            let Some(policy) = ParamInit::for_layer(&layer.layer_type) else {
                continue;
            };
            for (kind, tensor_desc) in &layer.params {
                tensors.insert(param_name(idx, *kind), policy.init_param(*kind, tensor_desc, &mut rng)?);
            }
        }

        Ok(Self { tensors })
    }

    /// Reads a safetensors file and binds it to `desc`.
    pub fn load(path: impl AsRef<Path>, desc: &ModelDesc) -> Result<Self, ScoreError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| {
            ScoreError::ModelLoad(format!("Cannot read classifier weights {:?}: {}", path, e))
        })?;
        let params = Self::from_bytes(&data, desc)?;
        info!("Loaded {} classifier tensors from {:?}", params.len(), path);
        Ok(params)
    }

    pub fn from_bytes(data: &[u8], desc: &ModelDesc) -> Result<Self, ScoreError> {
        let safetensors = SafeTensors::deserialize(data)?;
        let mut tensors = HashMap::new();

        for (name, expected) in desc.parameter_descs() {
            let view = safetensors
                .tensor(&name)
                .map_err(|_| ScoreError::ModelLoad(format!("Missing tensor {}", name)))?;

            if view.dtype() != Dtype::F32 {
                return Err(ScoreError::ModelLoad(format!(
                    "Tensor {} has dtype {:?}, expected F32",
                    name,
                    view.dtype()
                )));
            }

            if view.shape() != expected.to_dims().as_slice() {
                return Err(ScoreError::ModelLoad(format!(
                    "Tensor {} has shape {:?}, expected {:?}",
                    name,
                    view.shape(),
                    expected.to_dims()
                )));
            }

            debug!("Bound {} {}", name, expected.dims_string());
            tensors.insert(name, Tensor::from_le_bytes(expected, view.data())?);
        }

        Ok(Self { tensors })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ScoreError> {
        let encoded: Vec<(&str, Vec<u8>, Vec<usize>)> = self
            .tensors
            .iter()
            .map(|(name, tensor)| (name.as_str(), tensor.to_le_bytes(), tensor.dims()))
            .collect();

        let views = encoded
            .iter()
            .map(|(name, bytes, shape)| {
                TensorView::new(Dtype::F32, shape.clone(), bytes).map(|view| (*name, view))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(safetensors::serialize(views, None)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ScoreError> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes).map_err(|e| {
            ScoreError::ModelLoad(format!("Cannot write classifier weights {:?}: {}", path, e))
        })?;
        info!("Saved {} classifier tensors to {:?}", self.len(), path);
        Ok(())
    }

    /// Checks that every parameter `desc` needs is present with the right shape.
    pub fn validate(&self, desc: &ModelDesc) -> Result<(), ScoreError> {
        for (name, expected) in desc.parameter_descs() {
            let tensor = self.get(&name)?;
            if tensor.desc != expected {
                return Err(ScoreError::ModelLoad(format!(
                    "Tensor {} has shape {}, expected {}",
                    name,
                    tensor.desc.dims_string(),
                    expected.dims_string()
                )));
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&Tensor, ScoreError> {
        self.tensors
            .get(name)
            .ok_or_else(|| ScoreError::ModelLoad(format!("Missing tensor {}", name)))
    }

    pub fn insert(&mut self, name: impl Into<String>, tensor: Tensor) {
        self.tensors.insert(name.into(), tensor);
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }
}
