//! Configuration types shared by both chips.
//!
//! The measurement ranges differ between the ICM-20948 and the ICM-20649 and
//! live in the respective driver modules; units, digital low-pass filter
//! selections and the interrupt pin configuration are common.

/// Unit of accelerometer readings
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum AccUnit {
    /// Meters per second squared (m/s^2)
    Mpss,
    /// Number of times of normal gravity
    Gs,
}

impl AccUnit {
    pub const fn scalar(self) -> f32 {
        match self {
            Self::Mpss => 9.80665,
            Self::Gs => 1.0,
        }
    }
}

/// Unit of gyroscope readings
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum GyrUnit {
    /// Radians per second
    Rps,
    /// Degrees per second
    Dps,
}

impl GyrUnit {
    pub const fn scalar(self) -> f32 {
        match self {
            Self::Rps => 0.017453293,
            Self::Dps => 1.0,
        }
    }
}

/// Digital low-pass filter selection for accelerometer readings
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum AccDlp {
    Hz473 = 7,
    Hz246 = 1,
    Hz111 = 2,
    Hz50 = 3,
    Hz24 = 4,
    Hz12 = 5,
    Hz6 = 6,
    Disabled = 8,
}

/// Digital low-pass filter selection for gyroscope readings
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum GyrDlp {
    Hz361 = 7,
    Hz196 = 0,
    Hz152 = 1,
    Hz120 = 2,
    Hz51 = 3,
    Hz24 = 4,
    Hz12 = 5,
    Hz6 = 6,
    Disabled = 8,
}

/// Digital low-pass filter selection for the temperature sensor. Written to
/// `TEMP_CONFIG` as-is, there is no filter-choice bit to manage.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum TmpDlp {
    Hz7932 = 0,
    Hz217 = 1,
    Hz123 = 2,
    Hz65 = 3,
    Hz34 = 4,
    Hz17 = 5,
    Hz8 = 6,
}

/// Interrupt pin behavior and enabled interrupt sources
#[non_exhaustive]
#[derive(Copy, Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Interrupt {
    /// Interrupt pin active low
    pub active_low: bool,

    /// Open-drain instead of push-pull
    pub open_drain: bool,

    /// Latch interrupt until cleared
    pub latch_on: bool,

    /// Clear interrupt status on any read operation
    pub clear_on_read: bool,

    /// Enable wake on motion interrupt
    pub wake_on_motion: bool,

    /// Enable PLL ready interrupt
    pub pll_ready: bool,

    /// Enable DMP interrupt
    pub dmp_ready: bool,

    /// Enable I2C master interrupt
    pub i2c_master: bool,

    /// Enable raw data ready interrupt
    pub raw_data_ready: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_scalars() {
        assert_eq!(AccUnit::Gs.scalar(), 1.0);
        assert_eq!(AccUnit::Mpss.scalar(), 9.80665);
        assert_eq!(GyrUnit::Dps.scalar(), 1.0);
        assert!((GyrUnit::Rps.scalar() - core::f32::consts::PI / 180.0).abs() < 1e-7);
    }

    #[test]
    fn dlpf_register_codes_match_the_datasheet() {
        assert_eq!(AccDlp::Hz473 as u8, 7);
        assert_eq!(AccDlp::Hz246 as u8, 1);
        assert_eq!(GyrDlp::Hz196 as u8, 0);
        assert_eq!(GyrDlp::Hz361 as u8, 7);
        assert_eq!(TmpDlp::Hz7932 as u8, 0);
        assert_eq!(TmpDlp::Hz8 as u8, 6);
    }
}
