#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayerShape {
    // Common parameters
    pub in_features: usize,
    pub out_features: usize,

    // Optional conv parameters
    pub kernel_w: Option<usize>,
    pub kernel_h: Option<usize>,
    pub stride_w: Option<usize>,
    pub stride_h: Option<usize>,
    pub padding_w: Option<usize>,
    pub padding_h: Option<usize>,
}

impl LayerShape {
    pub fn kernel(&self) -> (usize, usize) {
        (self.kernel_h.unwrap_or(3), self.kernel_w.unwrap_or(3))
    }

    pub fn stride(&self) -> (usize, usize) {
        (self.stride_h.unwrap_or(1), self.stride_w.unwrap_or(1))
    }

    pub fn padding(&self) -> (usize, usize) {
        (self.padding_h.unwrap_or(0), self.padding_w.unwrap_or(0))
    }
}
