pub mod layer_desc;
pub mod layer_shape;
pub mod layer_type;
pub mod model;
pub mod params;
pub mod weight_init;
