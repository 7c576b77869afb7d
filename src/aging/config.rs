use crate::error::{FilterError, Result};
use crate::filter::FilterParams;
use crate::filter::config::validate_false_positive_rate;
use crate::hash::{HashFunction, default_hash_function};
use derive_builder::Builder;
use serde::Serialize;
use std::time::Duration;

/// Configuration for [`DualBufferAgingFilter`](super::DualBufferAgingFilter)
#[derive(Clone, Debug, Builder)]
#[builder(pattern = "owned")]
pub struct AgingFilterConfig {
    /// Expected number of elements per buffer
    #[builder(default = "100_000")]
    pub capacity: usize,

    /// Desired false positive rate of the whole filter (both buffers)
    #[builder(default = "0.01")]
    pub false_positive_rate: f64,

    /// Minimum time an added element stays visible
    #[builder(default = "Duration::from_secs(60)")]
    pub ttl: Duration,

    /// Explicit per buffer bit vector size and hash count, used as is
    #[builder(default, setter(strip_option))]
    pub params: Option<FilterParams>,

    #[builder(default = "default_hash_function")]
    pub hash_function: HashFunction,
}

impl AgingFilterConfig {
    pub fn validate(&self) -> Result<()> {
        validate_duration("TTL", self.ttl)?;
        self.resolve_params().map(|_| ())
    }

    /// A lookup reads both buffers, so each one is sized for
    /// `q = 1 - sqrt(1 - p)`, which keeps the combined rate at `p`.
    pub fn resolve_params(&self) -> Result<FilterParams> {
        if let Some(params) = self.params {
            return Ok(params);
        }
        validate_false_positive_rate(self.false_positive_rate)?;
        let per_buffer = 1.0 - (1.0 - self.false_positive_rate).sqrt();
        FilterParams::from_capacity(self.capacity, per_buffer)
    }
}

/// Number of distinct stamp values an epoch counter cycles through, plus the
/// reserved zero meaning "never written".
///
/// `grace` extra epochs are added on top of the TTL before a stamp expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EpochRing {
    wrap: u16,
    grace: u8,
}

impl EpochRing {
    /// Epochs 1..=7, stamps live for `ttl + 1` epochs
    pub const MODULO_8: EpochRing = EpochRing { wrap: 8, grace: 1 };
    /// Epochs 1..=255, one byte per stamp
    pub const BYTE: EpochRing = EpochRing { wrap: 256, grace: 0 };

    pub fn new(wrap: u16) -> Result<Self> {
        Self::with_grace(wrap, 0)
    }

    pub fn with_grace(wrap: u16, grace: u8) -> Result<Self> {
        if !(3..=256).contains(&wrap) {
            return Err(FilterError::InvalidParameter(format!(
                "Epoch wrap base must be between 3 and 256, got {wrap}"
            )));
        }
        // At least a TTL of one epoch has to fit below the ring size
        if u16::from(grace) + 3 > wrap {
            return Err(FilterError::InvalidParameter(format!(
                "Grace of {grace} epochs leaves no room for a TTL with wrap base {wrap}"
            )));
        }
        Ok(Self { wrap, grace })
    }

    pub fn wrap(&self) -> u16 {
        self.wrap
    }

    pub fn grace(&self) -> u8 {
        self.grace
    }

    /// Count of non-zero epochs, `wrap - 1`
    pub fn ring_size(&self) -> u8 {
        (self.wrap - 1) as u8
    }

    /// Largest TTL that still expires before the stamp value is reused
    pub fn max_ttl(&self) -> u8 {
        self.ring_size() - 1 - self.grace
    }

    pub fn next(&self, epoch: u8) -> u8 {
        if epoch >= self.ring_size() { 1 } else { epoch + 1 }
    }

    /// Ticks elapsed between `stamp` and `current`, modulo the ring size
    pub fn age(&self, current: u8, stamp: u8) -> u8 {
        let n = u16::from(self.ring_size());
        ((u16::from(current) + n - u16::from(stamp) % n) % n) as u8
    }

    pub fn is_live(&self, stamp: u8, current: u8, ttl: u8) -> bool {
        stamp != 0
            && u16::from(self.age(current, stamp))
                <= u16::from(ttl) + u16::from(self.grace)
    }
}

/// Configuration for [`BucketTimestampFilter`](super::BucketTimestampFilter)
#[derive(Clone, Debug, Builder)]
#[builder(pattern = "owned")]
pub struct TimestampFilterConfig {
    /// Expected number of live elements
    #[builder(default = "100_000")]
    pub capacity: usize,

    #[builder(default = "0.01")]
    pub false_positive_rate: f64,

    /// Number of epochs a stamp stays live after it was written
    #[builder(default = "3")]
    pub ttl_epochs: u8,

    /// Wall clock length of one epoch
    #[builder(default = "Duration::from_secs(1)")]
    pub epoch_duration: Duration,

    #[builder(default = "EpochRing::BYTE")]
    pub ring: EpochRing,

    #[builder(default, setter(strip_option))]
    pub params: Option<FilterParams>,

    #[builder(default = "default_hash_function")]
    pub hash_function: HashFunction,
}

impl TimestampFilterConfig {
    pub fn validate(&self) -> Result<()> {
        validate_duration("Epoch duration", self.epoch_duration)?;
        if self.ttl_epochs == 0 || self.ttl_epochs > self.ring.max_ttl() {
            return Err(FilterError::InvalidParameter(format!(
                "TTL must be between 1 and {} epochs for wrap base {}, got {}",
                self.ring.max_ttl(),
                self.ring.wrap(),
                self.ttl_epochs
            )));
        }
        self.resolve_params().map(|_| ())
    }

    pub fn resolve_params(&self) -> Result<FilterParams> {
        match self.params {
            Some(params) => Ok(params),
            None => {
                FilterParams::from_capacity(self.capacity, self.false_positive_rate)
            }
        }
    }
}

fn validate_duration(name: &str, duration: Duration) -> Result<()> {
    if duration.is_zero() {
        return Err(FilterError::InvalidParameter(format!(
            "{name} must be greater than 0"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_buffer_rate_is_tighter() {
        let config = AgingFilterConfigBuilder::default()
            .capacity(1000)
            .false_positive_rate(0.01)
            .build()
            .unwrap();
        let single = FilterParams::from_capacity(1000, 0.01).unwrap();
        let per_buffer = config.resolve_params().unwrap();
        assert!(per_buffer.bit_vector_size() > single.bit_vector_size());
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let config = AgingFilterConfigBuilder::default()
            .ttl(Duration::ZERO)
            .build()
            .unwrap();
        assert!(matches!(
            config.validate(),
            Err(FilterError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_ring_bounds() {
        assert!(EpochRing::new(2).is_err());
        assert!(EpochRing::new(257).is_err());
        assert_eq!(EpochRing::with_grace(8, 1).unwrap(), EpochRing::MODULO_8);
        assert_eq!(EpochRing::new(256).unwrap(), EpochRing::BYTE);
        assert_eq!(EpochRing::BYTE.ring_size(), 255);
        assert_eq!(EpochRing::BYTE.max_ttl(), 254);
        assert_eq!(EpochRing::MODULO_8.max_ttl(), 5);
        assert!(EpochRing::with_grace(8, 5).is_ok());
        assert!(EpochRing::with_grace(8, 6).is_err());
    }

    #[test]
    fn test_ring_next_skips_zero() {
        let ring = EpochRing::MODULO_8;
        let mut epoch = 1;
        let mut seen = Vec::new();
        for _ in 0..8 {
            seen.push(epoch);
            epoch = ring.next(epoch);
        }
        assert_eq!(seen, vec![1, 2, 3, 4, 5, 6, 7, 1]);
        assert_eq!(EpochRing::BYTE.next(255), 1);
    }

    #[test]
    fn test_age_across_rollover() {
        let ring = EpochRing::BYTE;
        assert_eq!(ring.age(250, 250), 0);
        assert_eq!(ring.age(255, 250), 5);
        assert_eq!(ring.age(1, 250), 6);
        assert_eq!(ring.age(1, 255), 1);
        assert_eq!(ring.age(3, 1), 2);
    }

    #[test]
    fn test_liveness_at_byte_boundary() {
        let ring = EpochRing::BYTE;
        let ttl = 5;
        // stamp + ttl == 254, 255 and 256
        for stamp in [249u8, 250, 251] {
            let mut current = stamp;
            for _ in 0..=ttl {
                assert!(ring.is_live(stamp, current, ttl), "{stamp} at {current}");
                current = ring.next(current);
            }
            assert!(!ring.is_live(stamp, current, ttl), "{stamp} at {current}");
        }
        assert!(!ring.is_live(0, 1, ttl));
    }

    #[test]
    fn test_modulo_8_keeps_one_grace_epoch() {
        let ring = EpochRing::MODULO_8;
        // stamp + ttl + 1 >= current
        assert!(ring.is_live(1, 3, 2));
        assert!(ring.is_live(1, 4, 2));
        assert!(!ring.is_live(1, 5, 2));
        // Across the wrap: stamp 6, ttl 2 lives through epochs 7, 1 and 2
        assert!(ring.is_live(6, 2, 2));
        assert!(!ring.is_live(6, 3, 2));
    }

    #[test]
    fn test_ttl_must_fit_ring() {
        let config = TimestampFilterConfigBuilder::default()
            .ring(EpochRing::MODULO_8)
            .ttl_epochs(6)
            .build()
            .unwrap();
        assert!(config.validate().is_err());

        let config = TimestampFilterConfigBuilder::default()
            .ring(EpochRing::MODULO_8)
            .ttl_epochs(5)
            .build()
            .unwrap();
        assert!(config.validate().is_ok());
    }
}
