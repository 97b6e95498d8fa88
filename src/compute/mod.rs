pub mod classifier;
pub mod cpu_compute;
pub mod model_stats;
