use crate::model::model::ModelDesc;

/// Layer table for a model description: type, configuration, output shape
/// and parameter count per layer, computed for a batch of one.
pub fn model_summary(desc: &ModelDesc) -> String {
    let shapes = desc.layer_output_shapes(1);
    let rule = format!("{:-<100}\n", "");

    let mut out = String::from("Model Statistics\n================\n");
    out.push_str(&rule);
    out.push_str(&format!(
        "{:<4} {:<12} {:<15} {:<15} {}\n",
        "ID", "Type", "Parameters", "Output Shape", "Config"
    ));
    out.push_str(&rule);

    for (idx, layer) in desc.layers.iter().enumerate() {
        let output_shape = shapes
            .as_ref()
            .ok()
            .and_then(|shapes| shapes.get(idx))
            .map(|shape| shape.dims_string())
            .unwrap_or_else(|| "Unknown".to_string());

        out.push_str(&format!(
            "{:<4} {:<12} {:<15} {:<15} {}\n",
            idx,
            layer.layer_type.name(),
            layer.parameter_count(),
            output_shape,
            layer.layer_type.config_string().unwrap_or_default()
        ));
    }

    out.push_str(&rule);
    out.push_str(&format!("Total Parameters: {}", desc.total_parameters()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_lists_every_layer() {
        let desc = ModelDesc::mnist_classifier();
        let summary = model_summary(&desc);
        assert!(summary.contains("Conv2D"));
        assert!(summary.contains("1×10"));
        assert!(summary.contains(&format!("Total Parameters: {}", desc.total_parameters())));
        assert!(!summary.contains("Unknown"));
        assert_eq!(summary.lines().count(), 5 + desc.layers.len() + 2);
    }

    #[test]
    fn summary_marks_shapes_it_cannot_infer() {
        use crate::model::layer_type::LayerType;

        let mut desc = ModelDesc::new(1, 28, 28);
        desc.add_layers(vec![LayerType::Flatten, LayerType::linear(100, 10)]);
        assert!(model_summary(&desc).contains("Unknown"));
    }
}
