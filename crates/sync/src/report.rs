use catalog_store::WriteReceipt;

/// What a successful run wrote, in write order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub assets: Vec<WriteReceipt>,
    pub catalog: Option<WriteReceipt>,
}

impl SyncReport {
    pub fn written_paths(&self) -> Vec<&str> {
        self.assets
            .iter()
            .chain(self.catalog.iter())
            .map(|r| r.path.as_str())
            .collect()
    }

    pub fn created_count(&self) -> usize {
        self.assets
            .iter()
            .chain(self.catalog.iter())
            .filter(|r| r.created)
            .count()
    }

    pub fn write_count(&self) -> usize {
        self.assets.len() + usize::from(self.catalog.is_some())
    }
}
