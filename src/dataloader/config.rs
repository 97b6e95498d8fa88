pub struct DataLoaderConfig {
    pub sort_dataset: bool,
    pub shuffle: bool,
    pub shuffle_seed: Option<u64>,
}

impl Default for DataLoaderConfig {
    fn default() -> Self {
        Self {
            sort_dataset: true,
            shuffle: false,
            shuffle_seed: None,
        }
    }
}
