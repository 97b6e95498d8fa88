// CPU forward kernels. All tensors are row-major; 4D tensors are NCHW.
// Callers are expected to have checked shapes against the model description.

use crate::tensor::{tensor::Tensor, tensor_desc::TensorDesc};

pub fn conv2d(
    input: &Tensor,
    weights: &Tensor,
    bias: &Tensor,
    stride: (usize, usize),
    padding: (usize, usize),
    output: &TensorDesc,
) -> Tensor {
    let (batch, in_c, in_h, in_w) = dims4(&input.desc);
    let (out_c, _, k_h, k_w) = dims4(&weights.desc);
    let (_, _, out_h, out_w) = dims4(output);
    let (s_h, s_w) = stride;
    let (p_h, p_w) = padding;

    let mut out = Tensor::zeros(output.clone());

    for n in 0..batch {
        for oc in 0..out_c {
            let out_base = (n * out_c + oc) * out_h * out_w;
            for oy in 0..out_h {
                for ox in 0..out_w {
                    let mut acc = bias.data[oc];
                    for ic in 0..in_c {
                        let in_base = (n * in_c + ic) * in_h * in_w;
                        let w_base = (oc * in_c + ic) * k_h * k_w;
                        for ky in 0..k_h {
                            // Padded coordinates; skip rows that land in the zero border
                            let iy = oy * s_h + ky;
                            if iy < p_h || iy - p_h >= in_h {
                                continue;
                            }
                            let iy = iy - p_h;
                            for kx in 0..k_w {
                                let ix = ox * s_w + kx;
                                if ix < p_w || ix - p_w >= in_w {
                                    continue;
                                }
                                let ix = ix - p_w;
                                acc += input.data[in_base + iy * in_w + ix]
                                    * weights.data[w_base + ky * k_w + kx];
                            }
                        }
                    }
                    out.data[out_base + oy * out_w + ox] = acc;
                }
            }
        }
    }

    out
}

/// Inference-mode batch norm using the stored running statistics.
pub fn batch_norm2d(
    input: &Tensor,
    weight: &Tensor,
    bias: &Tensor,
    running_mean: &Tensor,
    running_var: &Tensor,
    eps: f32,
) -> Tensor {
    let (batch, channels, h, w) = dims4(&input.desc);
    let plane = h * w;
    let mut out = input.clone();

    for c in 0..channels {
        let scale = weight.data[c] / (running_var.data[c] + eps).sqrt();
        let shift = bias.data[c] - running_mean.data[c] * scale;
        for n in 0..batch {
            let base = (n * channels + c) * plane;
            for x in &mut out.data[base..base + plane] {
                *x = *x * scale + shift;
            }
        }
    }

    out
}

pub fn max_pool2d(input: &Tensor, kernel: usize, stride: usize, output: &TensorDesc) -> Tensor {
    let (batch, channels, in_h, in_w) = dims4(&input.desc);
    let (_, _, out_h, out_w) = dims4(output);
    let mut out = Tensor::zeros(output.clone());

    for nc in 0..batch * channels {
        let in_base = nc * in_h * in_w;
        let out_base = nc * out_h * out_w;
        for oy in 0..out_h {
            for ox in 0..out_w {
                let mut max = f32::NEG_INFINITY;
                for ky in 0..kernel {
                    let row = in_base + (oy * stride + ky) * in_w + ox * stride;
                    for v in &input.data[row..row + kernel] {
                        max = max.max(*v);
                    }
                }
                out.data[out_base + oy * out_w + ox] = max;
            }
        }
    }

    out
}

pub fn flatten(input: Tensor) -> Tensor {
    let batch = input.desc.batch();
    let features = if batch == 0 { 0 } else { input.data.len() / batch };
    Tensor {
        desc: TensorDesc::new_matrix(batch, features),
        data: input.data,
    }
}

pub fn linear(input: &Tensor, weights: &Tensor, bias: &Tensor) -> Tensor {
    let (batch, in_features) = dims2(&input.desc);
    let (out_features, _) = dims2(&weights.desc);
    let mut out = Tensor::zeros(TensorDesc::new_matrix(batch, out_features));

    for n in 0..batch {
        let x = &input.data[n * in_features..(n + 1) * in_features];
        for o in 0..out_features {
            let w = &weights.data[o * in_features..(o + 1) * in_features];
            let dot: f32 = x.iter().zip(w).map(|(a, b)| a * b).sum();
            out.data[n * out_features + o] = dot + bias.data[o];
        }
    }

    out
}

pub fn relu(mut input: Tensor) -> Tensor {
    for x in &mut input.data {
        *x = x.max(0.0);
    }
    input
}

pub fn leaky_relu(mut input: Tensor, alpha: f32) -> Tensor {
    for x in &mut input.data {
        if *x < 0.0 {
            *x *= alpha;
        }
    }
    input
}

/// Row-wise softmax over the last axis of a [batch, classes] matrix.
pub fn softmax(mut input: Tensor) -> Tensor {
    let (_, cols) = dims2(&input.desc);
    if cols == 0 {
        return input;
    }

    for row in input.data.chunks_exact_mut(cols) {
        let max = row.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
        let mut sum = 0.0;
        for x in row.iter_mut() {
            *x = (*x - max).exp();
            sum += *x;
        }
        for x in row.iter_mut() {
            *x /= sum;
        }
    }

    input
}

fn dims4(desc: &TensorDesc) -> (usize, usize, usize, usize) {
    match *desc {
        TensorDesc::Tensor4D { batch, channels, height, width } => (batch, channels, height, width),
        TensorDesc::Matrix { rows, cols } => (rows, cols, 1, 1),
        TensorDesc::Vector { length } => (length, 1, 1, 1),
    }
}

fn dims2(desc: &TensorDesc) -> (usize, usize) {
    match *desc {
        TensorDesc::Matrix { rows, cols } => (rows, cols),
        TensorDesc::Tensor4D { batch, channels, height, width } => (batch, channels * height * width),
        TensorDesc::Vector { length } => (1, length),
    }
}
