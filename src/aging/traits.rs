use crate::error::Result;

/// Core operations for filters that forget keys over time
pub trait AgingFilterOps {
    /// Insert an item at the current point in time
    fn add(&self, key: &[u8]) -> Result<()>;

    /// Check if an item was added recently enough to still be alive
    fn include(&self, key: &[u8]) -> Result<bool>;

    fn add_u64(&self, key: u64) -> Result<()> {
        self.add(&key.to_be_bytes())
    }

    fn include_u64(&self, key: u64) -> Result<bool> {
        self.include(&key.to_be_bytes())
    }
}

/// One aging step, applied by the background worker once per period.
pub trait Tick: Send + Sync + 'static {
    fn tick(&self) -> Result<()>;
}
