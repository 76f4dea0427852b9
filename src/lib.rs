#![no_std]

//! Async, `no_std` drivers for the TDK InvenSense ICM-20948 and ICM-20649
//! inertial measurement units.
//!
//! Both parts expose their configuration and data registers through a banked
//! address space: a global `REG_BANK_SEL` register selects one of four user
//! banks, and every other access is relative to the selected bank. The
//! drivers cache the selected bank and only rewrite the selection when an
//! access targets a different one.
//!
//! The ICM-20948 additionally carries an AK09916 magnetometer on an internal
//! auxiliary I2C bus. It is reached through the chip's I2C master: the host
//! programs the SLV0 address/register/control registers, and the master
//! mirrors the magnetometer's output into `EXT_SLV_SENS_DATA_00..`, where it
//! can be burst-read together with the accelerometer and gyroscope data.
//!
//! Communication happens over I2C or SPI through the `embedded-hal-async`
//! traits. Scaled readings are returned as `nalgebra` vectors in the
//! configured unit (g or m/s^2, deg/s or rad/s, microtesla for the
//! magnetometer).

pub mod bus;
pub mod cfg;
pub mod icm20649;
pub mod icm20948;

pub mod reg;

mod device;

pub use bus::{BusTransfer, I2cAddress, IcmBusI2c, IcmBusSpi};
pub use cfg::{AccDlp, AccUnit, GyrDlp, GyrUnit, Interrupt, TmpDlp};

use core::future::Future;
use embedded_hal_async::digital::Wait;
use nalgebra::Vector3;

/// Compile-time marker: driver has been initialized.
pub struct Init;
/// Compile-time marker: driver has not yet been initialized.
pub struct NotInit;

/// Container for accelerometer and gyroscope measurements
#[derive(Clone, Copy)]
pub struct Data6Dof<T> {
    pub acc: Vector3<T>,
    pub gyr: Vector3<T>,
    pub tmp: T,
}

/// Container for accelerometer, gyroscope and magnetometer measurements
#[derive(Clone, Copy)]
pub struct Data9Dof<T> {
    pub acc: Vector3<T>,
    pub gyr: Vector3<T>,
    pub mag: Vector3<T>,
    pub tmp: T,
}

/// Errors produced by the ICM drivers.
#[derive(Debug)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum IcmError<E> {
    /// The underlying I2C/SPI transfer failed
    Bus(E),
    /// The IMU `WHO_AM_I` register held an unexpected value
    ImuWhoAmI(u8),
    /// The magnetometer `WIA2` register held an unexpected value
    MagWhoAmI(u8),
    /// A magnetometer register write did not read back as written
    MagWriteFailed,
    /// The magnetometer reported a measurement overflow (`ST2.HOFL`)
    MagDataOverflow,
    /// Waiting on the interrupt pin failed
    InterruptPin,
}

impl<E> From<E> for IcmError<E> {
    fn from(error: E) -> Self {
        IcmError::Bus(error)
    }
}

/// Runs any future of this driver after a rising or falling edge of a pin,
/// usually the ICM's data-ready interrupt output.
pub trait WithInterrupt<T, E> {
    fn rising(self, pin: &mut impl Wait) -> impl Future<Output = Result<T, IcmError<E>>>;
    fn falling(self, pin: &mut impl Wait) -> impl Future<Output = Result<T, IcmError<E>>>;
}

impl<T, E, F> WithInterrupt<T, E> for F
where
    F: Future<Output = Result<T, IcmError<E>>>,
{
    async fn rising(self, pin: &mut impl Wait) -> Result<T, IcmError<E>> {
        pin.wait_for_rising_edge()
            .await
            .map_err(|_| IcmError::InterruptPin)?;
        self.await
    }

    async fn falling(self, pin: &mut impl Wait) -> Result<T, IcmError<E>> {
        pin.wait_for_falling_edge()
            .await
            .map_err(|_| IcmError::InterruptPin)?;
        self.await
    }
}

/// Scale of the AK09916 output in microtesla per count
pub(crate) const MAG_UT_PER_LSB: f32 = 0.15;

/// Collects 6 big-endian bytes into x/y/z counts (acc/gyr only)
pub(crate) fn collect_3xi16(values: [u8; 6]) -> [i16; 3] {
    let [xh, xl, yh, yl, zh, zl] = values;
    [
        i16::from_be_bytes([xh, xl]),
        i16::from_be_bytes([yh, yl]),
        i16::from_be_bytes([zh, zl]),
    ]
}

/// Collects 6 little-endian bytes into x/y/z counts (mag only). With the
/// `align-mag` feature the Y and Z axes are flipped into the accel/gyro frame.
pub(crate) fn collect_3xi16_mag(values: [u8; 6]) -> [i16; 3] {
    let [xl, xh, yl, yh, zl, zh] = values;
    // wrapping_neg: the external sensor data registers can hold arbitrary
    // bytes, and negating i16::MIN overflows
    #[cfg(feature = "align-mag")]
    let mag = [
        i16::from_be_bytes([xh, xl]),
        i16::from_be_bytes([yh, yl]).wrapping_neg(),
        i16::from_be_bytes([zh, zl]).wrapping_neg(),
    ];
    #[cfg(not(feature = "align-mag"))]
    let mag = [
        i16::from_be_bytes([xh, xl]),
        i16::from_be_bytes([yh, yl]),
        i16::from_be_bytes([zh, zl]),
    ];

    mag
}

/// Converts raw temperature counts to degrees Celsius
pub(crate) fn temperature_from_counts(raw: i16) -> f32 {
    (f32::from(raw) - 21.0) / 333.87 + 21.0
}
