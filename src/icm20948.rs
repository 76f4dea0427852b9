//! Driver for the ICM-20948 9-DoF IMU (accelerometer, gyroscope, AK09916
//! magnetometer, temperature sensor).
//!
//! Configuration happens on an uninitialized driver through consuming
//! builder methods; [`Icm20948::initialize_6dof`] and
//! [`Icm20948::initialize_9dof`] apply it and return an initialized driver
//! whose type encodes whether the magnetometer is active.

use core::marker::PhantomData;

use embedded_hal_async::{delay::DelayNs, i2c::I2c, spi::SpiDevice};
use nalgebra::Vector3;

use crate::bus::{BusTransfer, I2cAddress, IcmBusI2c, IcmBusSpi, Interface};
use crate::cfg::{AccDlp, AccUnit, GyrDlp, GyrUnit, Interrupt, TmpDlp};
use crate::device::Device;
use crate::reg::*;
use crate::{
    collect_3xi16, collect_3xi16_mag, temperature_from_counts, Data6Dof, Data9Dof, IcmError, Init,
    NotInit, MAG_UT_PER_LSB,
};

/// Compile-time marker: magnetometer streaming is active
pub struct MagEnabled;
/// Compile-time marker: magnetometer is not set up
pub struct MagDisabled;

/// Range / sensitivity of the accelerometer in g
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum AccRange {
    Gs2 = 0b00,
    Gs4 = 0b01,
    Gs8 = 0b10,
    Gs16 = 0b11,
}

impl AccRange {
    pub const fn divisor(self) -> f32 {
        match self {
            Self::Gs2 => 16384.0,
            Self::Gs4 => 8192.0,
            Self::Gs8 => 4096.0,
            Self::Gs16 => 2048.0,
        }
    }
}

/// Range / sensitivity of the gyroscope in degrees/second
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum GyrRange {
    Dps250 = 0b00,
    Dps500 = 0b01,
    Dps1000 = 0b10,
    Dps2000 = 0b11,
}

impl GyrRange {
    pub const fn divisor(self) -> f32 {
        match self {
            Self::Dps250 => 131.0,
            Self::Dps500 => 65.5,
            Self::Dps1000 => 32.8,
            Self::Dps2000 => 16.4,
        }
    }
}

#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Icm20948Config {
    pub acc_range: AccRange,
    pub gyr_range: GyrRange,
    pub acc_unit: AccUnit,
    pub gyr_unit: GyrUnit,
    pub acc_dlp: AccDlp,
    pub gyr_dlp: GyrDlp,
    pub tmp_dlp: TmpDlp,
    pub acc_odr: u16,
    pub gyr_odr: u8,
    pub int: Option<Interrupt>,
}

impl Default for Icm20948Config {
    fn default() -> Self {
        Self {
            acc_range: AccRange::Gs16,
            gyr_range: GyrRange::Dps2000,
            acc_unit: AccUnit::Gs,
            gyr_unit: GyrUnit::Dps,
            acc_dlp: AccDlp::Hz473,
            gyr_dlp: GyrDlp::Hz361,
            tmp_dlp: TmpDlp::Hz7932,
            acc_odr: 0,
            gyr_odr: 0,
            int: None,
        }
    }
}

pub struct Icm20948<BUS, MAG, INIT, DELAY> {
    dev: Device<BUS, DELAY>,
    config: Icm20948Config,
    mag_state: PhantomData<MAG>,
    init_state: PhantomData<INIT>,
}

impl<BUS, DELAY> Icm20948<IcmBusI2c<BUS>, MagDisabled, NotInit, DELAY>
where
    BUS: I2c,
    DELAY: DelayNs,
{
    /// Creates an uninitialized IMU struct with the given config.
    #[must_use]
    pub fn new_i2c_from_cfg(bus: BUS, cfg: Icm20948Config, delay: DELAY) -> Self {
        Self {
            dev: Device::new(IcmBusI2c::new(bus, I2cAddress::default()), delay),
            config: cfg,
            mag_state: PhantomData,
            init_state: PhantomData,
        }
    }

    /// Creates an uninitialized IMU struct with a default config.
    #[must_use]
    pub fn new_i2c(bus: BUS, delay: DELAY) -> Self {
        Self::new_i2c_from_cfg(bus, Icm20948Config::default(), delay)
    }

    /// Set I2C address of the ICM module. See `I2cAddress` for defaults,
    /// otherwise `u8` implements `Into<I2cAddress>`
    #[must_use]
    pub fn set_address(mut self, address: impl Into<I2cAddress>) -> Self {
        self.dev.bus.address = address.into();
        self
    }
}

impl<BUS, DELAY> Icm20948<IcmBusSpi<BUS>, MagDisabled, NotInit, DELAY>
where
    BUS: SpiDevice,
    DELAY: DelayNs,
{
    /// Creates an uninitialized IMU struct with the given config.
    #[must_use]
    pub fn new_spi_from_cfg(bus: BUS, cfg: Icm20948Config, delay: DELAY) -> Self {
        Self {
            dev: Device::new(IcmBusSpi::new(bus), delay),
            config: cfg,
            mag_state: PhantomData,
            init_state: PhantomData,
        }
    }

    /// Creates an uninitialized IMU struct with a default config.
    #[must_use]
    pub fn new_spi(bus: BUS, delay: DELAY) -> Self {
        Self::new_spi_from_cfg(bus, Icm20948Config::default(), delay)
    }
}

impl<BUS: BusTransfer, MAG, INIT, DELAY> Icm20948<BUS, MAG, INIT, DELAY> {
    /// Consumes the `Icm20948` and releases the bus back to the user
    #[must_use]
    pub fn destroy(self) -> BUS::Inner {
        self.dev.bus.destroy()
    }
}

impl<BUS, DELAY> Icm20948<BUS, MagDisabled, NotInit, DELAY>
where
    BUS: BusTransfer,
    DELAY: DelayNs,
{
    /*
        Configuration methods
    */

    /// Set accelerometer measuring range, choices are 2G, 4G, 8G or 16G
    #[must_use]
    pub fn acc_range(self, acc_range: AccRange) -> Self {
        Self {
            config: Icm20948Config {
                acc_range,
                ..self.config
            },
            ..self
        }
    }

    /// Set accelerometer digital low-pass filter frequency
    #[must_use]
    pub fn acc_dlp(self, acc_dlp: AccDlp) -> Self {
        Self {
            config: Icm20948Config {
                acc_dlp,
                ..self.config
            },
            ..self
        }
    }

    /// Set returned unit of accelerometer measurement, choices are Gs or m/s^2
    #[must_use]
    pub fn acc_unit(self, acc_unit: AccUnit) -> Self {
        Self {
            config: Icm20948Config {
                acc_unit,
                ..self.config
            },
            ..self
        }
    }

    /// Set accelerometer sample rate divider
    #[must_use]
    pub fn acc_odr(self, acc_odr: u16) -> Self {
        Self {
            config: Icm20948Config {
                acc_odr,
                ..self.config
            },
            ..self
        }
    }

    /// Set gyroscope measuring range, choices are 250, 500, 1000 or 2000 dps
    #[must_use]
    pub fn gyr_range(self, gyr_range: GyrRange) -> Self {
        Self {
            config: Icm20948Config {
                gyr_range,
                ..self.config
            },
            ..self
        }
    }

    /// Set gyroscope digital low-pass filter frequency
    #[must_use]
    pub fn gyr_dlp(self, gyr_dlp: GyrDlp) -> Self {
        Self {
            config: Icm20948Config {
                gyr_dlp,
                ..self.config
            },
            ..self
        }
    }

    /// Set returned unit of gyroscope measurement, choices are degrees/s or radians/s
    #[must_use]
    pub fn gyr_unit(self, gyr_unit: GyrUnit) -> Self {
        Self {
            config: Icm20948Config {
                gyr_unit,
                ..self.config
            },
            ..self
        }
    }

    /// Set gyroscope sample rate divider
    #[must_use]
    pub fn gyr_odr(self, gyr_odr: u8) -> Self {
        Self {
            config: Icm20948Config {
                gyr_odr,
                ..self.config
            },
            ..self
        }
    }

    /// Set temperature sensor digital low-pass filter frequency
    #[must_use]
    pub fn tmp_dlp(self, tmp_dlp: TmpDlp) -> Self {
        Self {
            config: Icm20948Config {
                tmp_dlp,
                ..self.config
            },
            ..self
        }
    }

    /// Set interrupt pin behavior and enabled interrupt sources
    #[must_use]
    pub fn interrupt(self, int: impl Into<Option<Interrupt>>) -> Self {
        Self {
            config: Icm20948Config {
                int: int.into(),
                ..self.config
            },
            ..self
        }
    }

    /*
        Initialization methods
    */

    /// Initializes the IMU with accelerometer and gyroscope
    pub async fn initialize_6dof(
        mut self,
    ) -> Result<Icm20948<BUS, MagDisabled, Init, DELAY>, IcmError<BUS::Error>> {
        self.setup_acc_gyr().await?;
        if let Some(int) = self.config.int {
            self.setup_interrupt(&int).await?;
        }

        Ok(Icm20948 {
            dev: self.dev,
            config: self.config,
            mag_state: PhantomData,
            init_state: PhantomData,
        })
    }

    /// Initializes the IMU with accelerometer, gyroscope and magnetometer
    pub async fn initialize_9dof(
        mut self,
    ) -> Result<Icm20948<BUS, MagEnabled, Init, DELAY>, IcmError<BUS::Error>> {
        self.setup_acc_gyr().await?;
        self.setup_mag().await?;
        if let Some(int) = self.config.int {
            self.setup_interrupt(&int).await?;
        }

        Ok(Icm20948 {
            dev: self.dev,
            config: self.config,
            mag_state: PhantomData,
            init_state: PhantomData,
        })
    }

    /// Setup accelerometer and gyroscope according to config
    async fn setup_acc_gyr(&mut self) -> Result<(), IcmError<BUS::Error>> {
        // First contact: bank selection is unknown, force bank 0
        self.dev.set_user_bank(UserBank::Bank0, true).await?;

        if matches!(BUS::INTERFACE, Interface::Spi) {
            self.dev.disable_i2c_slave().await?;
        }

        // Ensure known-good state. The reset clears USER_CTRL, so the I2C
        // slave disable has to be applied again afterwards.
        self.dev.device_reset().await?;
        if matches!(BUS::INTERFACE, Interface::Spi) {
            self.dev.disable_i2c_slave().await?;
        }

        let [whoami] = self.dev.read_from(Bank0::WhoAmI).await?;
        if whoami != WHO_AM_I_ICM20948 {
            return Err(IcmError::ImuWhoAmI(whoami));
        }

        // Start accel and gyro ODRs from the same internal counter
        self.dev.write_to(Bank2::OdrAlignEn, ODR_ALIGN_ENABLE).await?;

        // Set ranges, digital low-pass filters, and sample rate dividers
        self.set_acc_range(self.config.acc_range).await?;
        self.set_gyr_range(self.config.gyr_range).await?;

        self.set_acc_dlp(self.config.acc_dlp).await?;
        self.set_gyr_dlp(self.config.gyr_dlp).await?;
        self.set_tmp_dlp(self.config.tmp_dlp).await?;

        self.set_acc_odr(self.config.acc_odr).await?;
        self.set_gyr_odr(self.config.gyr_odr).await?;

        Ok(())
    }

    /// Setup magnetometer in continuous mode through the I2C master
    async fn setup_mag(&mut self) -> Result<(), IcmError<BUS::Error>> {
        // Setup the auxiliary bus clock and let the ICM act as I2C master
        self.dev
            .write_to(Bank3::I2cMstCtrl, I2C_MST_CTRL_345_6_KHZ_CLK)
            .await?;
        self.dev.enable_i2c_master(true).await?;

        // Ensure known-good state
        self.dev.mag_reset().await?;

        let [wia2] = self.dev.mag_read_from(MagRegister::Wia2).await?;
        if wia2 != AK09916_DEVICE_ID {
            return Err(IcmError::MagWhoAmI(wia2));
        }

        // Continuous measurement mode 4 (100 Hz), verified write
        self.dev
            .mag_write_to(MagRegister::Control2, AK09916_CNTL2_CONT_MODE4)
            .await?;

        // Stream ST1..ST2 into the external sensor data registers
        self.dev.mag_stream_enable().await?;

        Ok(())
    }

    async fn setup_interrupt(&mut self, cfg: &Interrupt) -> Result<(), IcmError<BUS::Error>> {
        let int_pin_cfg = (cfg.active_low as u8) << 7
            | (cfg.open_drain as u8) << 6
            | (cfg.latch_on as u8) << 5
            | (cfg.clear_on_read as u8) << 4;

        self.dev.write_to(Bank0::IntPinCfg, int_pin_cfg).await?;

        let int_enable = (cfg.wake_on_motion as u8) << 3
            | (cfg.pll_ready as u8) << 2
            | (cfg.dmp_ready as u8) << 1
            | (cfg.i2c_master as u8);

        self.dev.write_to(Bank0::IntEnable, int_enable).await?;
        self.dev
            .write_to(Bank0::IntEnable1, cfg.raw_data_ready as u8)
            .await?;

        Ok(())
    }
}

impl<BUS, MAG, INIT, DELAY> Icm20948<BUS, MAG, INIT, DELAY>
where
    BUS: BusTransfer,
    DELAY: DelayNs,
{
    /// Configure accelerometer to measure with given range
    pub async fn set_acc_range(&mut self, range: AccRange) -> Result<(), IcmError<BUS::Error>> {
        self.dev
            .write_to_flag(Bank2::AccelConfig, (range as u8) << 1, 0b0110)
            .await?;
        self.config.acc_range = range;
        Ok(())
    }

    /// Configure gyroscope to measure with given range
    pub async fn set_gyr_range(&mut self, range: GyrRange) -> Result<(), IcmError<BUS::Error>> {
        self.dev
            .write_to_flag(Bank2::GyroConfig1, (range as u8) << 1, 0b0110)
            .await?;
        self.config.gyr_range = range;
        Ok(())
    }

    /// Set returned unit of accelerometer
    pub fn set_acc_unit(&mut self, unit: AccUnit) {
        self.config.acc_unit = unit;
    }

    /// Set returned unit of gyroscope
    pub fn set_gyr_unit(&mut self, unit: GyrUnit) {
        self.config.gyr_unit = unit;
    }

    /// Set (or disable) accelerometer digital low-pass filter
    pub async fn set_acc_dlp(&mut self, acc_dlp: AccDlp) -> Result<(), IcmError<BUS::Error>> {
        if AccDlp::Disabled == acc_dlp {
            self.dev
                .write_to_flag(Bank2::AccelConfig, 0u8, 0b0011_1001)
                .await?;
        } else {
            self.dev
                .write_to_flag(Bank2::AccelConfig, (acc_dlp as u8) << 3 | 1, 0b0011_1001)
                .await?;
        }
        self.config.acc_dlp = acc_dlp;
        Ok(())
    }

    /// Set (or disable) gyroscope digital low-pass filter
    pub async fn set_gyr_dlp(&mut self, gyr_dlp: GyrDlp) -> Result<(), IcmError<BUS::Error>> {
        if GyrDlp::Disabled == gyr_dlp {
            self.dev
                .write_to_flag(Bank2::GyroConfig1, 0u8, 0b0011_1001)
                .await?;
        } else {
            self.dev
                .write_to_flag(Bank2::GyroConfig1, (gyr_dlp as u8) << 3 | 1, 0b0011_1001)
                .await?;
        }
        self.config.gyr_dlp = gyr_dlp;
        Ok(())
    }

    /// Set temperature sensor digital low-pass filter
    pub async fn set_tmp_dlp(&mut self, tmp_dlp: TmpDlp) -> Result<(), IcmError<BUS::Error>> {
        self.dev.write_to(Bank2::TempConfig, tmp_dlp as u8).await?;
        self.config.tmp_dlp = tmp_dlp;
        Ok(())
    }

    /// Set accelerometer sample rate divider. Value will be clamped above 4095.
    pub async fn set_acc_odr(&mut self, acc_odr: u16) -> Result<(), IcmError<BUS::Error>> {
        let [msb, lsb] = acc_odr.clamp(0, 0xFFF).to_be_bytes();
        self.dev.write_to(Bank2::AccelSmplrtDiv1, msb).await?;
        self.dev.write_to(Bank2::AccelSmplrtDiv2, lsb).await?;
        self.config.acc_odr = acc_odr;
        Ok(())
    }

    /// Set gyroscope sample rate divider.
    pub async fn set_gyr_odr(&mut self, gyr_odr: u8) -> Result<(), IcmError<BUS::Error>> {
        self.dev.write_to(Bank2::GyroSmplrtDiv, gyr_odr).await?;
        self.config.gyr_odr = gyr_odr;
        Ok(())
    }

    /// Enable or disable the raw-data-ready interrupt source
    pub async fn data_ready_interrupt(&mut self, enable: bool) -> Result<(), IcmError<BUS::Error>> {
        self.dev
            .write_to(Bank0::IntEnable1, if enable { RAW_DATA_0_RDY } else { 0 })
            .await?;
        Ok(())
    }
}

impl<BUS, MAG, DELAY> Icm20948<BUS, MAG, Init, DELAY>
where
    BUS: BusTransfer,
    DELAY: DelayNs,
{
    /// Whether a new accelerometer/gyroscope sample is waiting
    pub async fn new_data_ready(&mut self) -> Result<bool, IcmError<BUS::Error>> {
        let [status] = self.dev.read_from(Bank0::IntStatus1).await?;
        Ok(status & RAW_DATA_0_RDY != 0)
    }

    /// Get vector of unscaled accelerometer counts
    pub async fn read_acc_unscaled(&mut self) -> Result<Vector3<i16>, IcmError<BUS::Error>> {
        let raw = self.dev.read_from(Bank0::AccelXoutH).await?;
        Ok(collect_3xi16(raw).into())
    }

    /// Get vector of scaled accelerometer values
    pub async fn read_acc(&mut self) -> Result<Vector3<f32>, IcmError<BUS::Error>> {
        let acc = self
            .read_acc_unscaled()
            .await?
            .map(|x| f32::from(x) * self.acc_scalar());
        Ok(acc)
    }

    /// Get vector of unscaled gyroscope counts
    pub async fn read_gyr_unscaled(&mut self) -> Result<Vector3<i16>, IcmError<BUS::Error>> {
        let raw = self.dev.read_from(Bank0::GyroXoutH).await?;
        Ok(collect_3xi16(raw).into())
    }

    /// Get vector of scaled gyroscope values
    pub async fn read_gyr(&mut self) -> Result<Vector3<f32>, IcmError<BUS::Error>> {
        let gyr = self
            .read_gyr_unscaled()
            .await?
            .map(|x| f32::from(x) * self.gyr_scalar());
        Ok(gyr)
    }

    /// Get scaled measurements for accelerometer and gyroscope, and temperature
    pub async fn read_6dof(&mut self) -> Result<Data6Dof<f32>, IcmError<BUS::Error>> {
        let raw: [u8; 14] = self.dev.read_from(Bank0::AccelXoutH).await?;
        let [axh, axl, ayh, ayl, azh, azl, gxh, gxl, gyh, gyl, gzh, gzl, tph, tpl] = raw;

        let acc = self.scaled_acc_from_bytes([axh, axl, ayh, ayl, azh, azl]);
        let gyr = self.scaled_gyr_from_bytes([gxh, gxl, gyh, gyl, gzh, gzl]);
        let tmp = temperature_from_counts(i16::from_be_bytes([tph, tpl]));

        Ok(Data6Dof { acc, gyr, tmp })
    }

    /// Get unscaled measurements for accelerometer and gyroscope, and temperature
    pub async fn read_6dof_unscaled(&mut self) -> Result<Data6Dof<i16>, IcmError<BUS::Error>> {
        let raw: [u8; 14] = self.dev.read_from(Bank0::AccelXoutH).await?;
        let [axh, axl, ayh, ayl, azh, azl, gxh, gxl, gyh, gyl, gzh, gzl, tph, tpl] = raw;

        let acc = collect_3xi16([axh, axl, ayh, ayl, azh, azl]).into();
        let gyr = collect_3xi16([gxh, gxl, gyh, gyl, gzh, gzl]).into();
        let tmp = i16::from_be_bytes([tph, tpl]);

        Ok(Data6Dof { acc, gyr, tmp })
    }

    /// Takes 6 bytes and converts them into a Vector3 of scaled floats
    fn scaled_acc_from_bytes(&self, bytes: [u8; 6]) -> Vector3<f32> {
        let acc = collect_3xi16(bytes).map(|x| f32::from(x) * self.acc_scalar());
        Vector3::from(acc)
    }

    /// Takes 6 bytes and converts them into a Vector3 of scaled floats
    fn scaled_gyr_from_bytes(&self, bytes: [u8; 6]) -> Vector3<f32> {
        let gyr = collect_3xi16(bytes).map(|x| f32::from(x) * self.gyr_scalar());
        Vector3::from(gyr)
    }

    /// Returns the scalar corresponding to the unit and range configured
    fn acc_scalar(&self) -> f32 {
        self.config.acc_unit.scalar() / self.config.acc_range.divisor()
    }

    /// Returns the scalar corresponding to the unit and range configured
    fn gyr_scalar(&self) -> f32 {
        self.config.gyr_unit.scalar() / self.config.gyr_range.divisor()
    }
}

impl<BUS, DELAY> Icm20948<BUS, MagEnabled, Init, DELAY>
where
    BUS: BusTransfer,
    DELAY: DelayNs,
{
    /// Whether the magnetometer block in the external sensor data registers
    /// holds a fresh sample (`ST1.DRDY`)
    pub async fn mag_data_ready(&mut self) -> Result<bool, IcmError<BUS::Error>> {
        let [st1] = self.dev.read_from(Bank0::ExtSlvSensData00).await?;
        Ok(st1 & AK09916_ST1_DRDY != 0)
    }

    /// Get vector of unscaled magnetometer counts. Reports a measurement
    /// overflow (`ST2.HOFL`) as an error, in which case the sample must be
    /// discarded.
    pub async fn read_mag_unscaled(&mut self) -> Result<[i16; 3], IcmError<BUS::Error>> {
        let raw: [u8; 9] = self.dev.read_from(Bank0::ExtSlvSensData00).await?;
        let [_st1, mxl, mxh, myl, myh, mzl, mzh, _tmps, st2] = raw;

        if st2 & AK09916_ST2_HOFL != 0 {
            return Err(IcmError::MagDataOverflow);
        }

        Ok(collect_3xi16_mag([mxl, mxh, myl, myh, mzl, mzh]))
    }

    /// Get vector of magnetometer values in microtesla
    pub async fn read_mag(&mut self) -> Result<Vector3<f32>, IcmError<BUS::Error>> {
        let mag = self
            .read_mag_unscaled()
            .await?
            .map(|x| MAG_UT_PER_LSB * x as f32);
        Ok(Vector3::from(mag))
    }

    /// Get scaled measurements for accelerometer, gyroscope and magnetometer,
    /// and temperature. The magnetometer status bytes are not inspected here;
    /// use [`Self::read_mag`] when overflow detection matters.
    pub async fn read_9dof(&mut self) -> Result<Data9Dof<f32>, IcmError<BUS::Error>> {
        let raw: [u8; 23] = self.dev.read_from(Bank0::AccelXoutH).await?;
        let [axh, axl, ayh, ayl, azh, azl, gxh, gxl, gyh, gyl, gzh, gzl, tph, tpl, _st1, mxl, mxh, myl, myh, mzl, mzh, _tmps, _st2] =
            raw;

        let acc = self.scaled_acc_from_bytes([axh, axl, ayh, ayl, azh, azl]);
        let gyr = self.scaled_gyr_from_bytes([gxh, gxl, gyh, gyl, gzh, gzl]);
        let mag = self.scaled_mag_from_bytes([mxl, mxh, myl, myh, mzl, mzh]);
        let tmp = temperature_from_counts(i16::from_be_bytes([tph, tpl]));

        Ok(Data9Dof { acc, gyr, mag, tmp })
    }

    /// Get unscaled measurements for accelerometer, gyroscope and
    /// magnetometer, and temperature
    pub async fn read_9dof_unscaled(&mut self) -> Result<Data9Dof<i16>, IcmError<BUS::Error>> {
        let raw: [u8; 23] = self.dev.read_from(Bank0::AccelXoutH).await?;
        let [axh, axl, ayh, ayl, azh, azl, gxh, gxl, gyh, gyl, gzh, gzl, tph, tpl, _st1, mxl, mxh, myl, myh, mzl, mzh, _tmps, _st2] =
            raw;

        let acc = collect_3xi16([axh, axl, ayh, ayl, azh, azl]).into();
        let gyr = collect_3xi16([gxh, gxl, gyh, gyl, gzh, gzl]).into();
        let mag = collect_3xi16_mag([mxl, mxh, myl, myh, mzl, mzh]).into();
        let tmp = i16::from_be_bytes([tph, tpl]);

        Ok(Data9Dof { acc, gyr, mag, tmp })
    }

    /// Takes 6 bytes and converts them into a Vector3 of floats in microtesla
    fn scaled_mag_from_bytes(&self, bytes: [u8; 6]) -> Vector3<f32> {
        Vector3::from(collect_3xi16_mag(bytes).map(|x| MAG_UT_PER_LSB * x as f32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accel_divisors_match_the_datasheet() {
        assert_eq!(AccRange::Gs2.divisor(), 16384.0);
        assert_eq!(AccRange::Gs4.divisor(), 8192.0);
        assert_eq!(AccRange::Gs8.divisor(), 4096.0);
        assert_eq!(AccRange::Gs16.divisor(), 2048.0);
    }

    #[test]
    fn gyro_divisors_match_the_datasheet() {
        assert_eq!(GyrRange::Dps250.divisor(), 131.0);
        assert_eq!(GyrRange::Dps500.divisor(), 65.5);
        assert_eq!(GyrRange::Dps1000.divisor(), 32.8);
        assert_eq!(GyrRange::Dps2000.divisor(), 16.4);
    }

    #[test]
    fn range_register_codes() {
        assert_eq!(AccRange::Gs2 as u8, 0b00);
        assert_eq!(AccRange::Gs16 as u8, 0b11);
        assert_eq!(GyrRange::Dps250 as u8, 0b00);
        assert_eq!(GyrRange::Dps2000 as u8, 0b11);
    }

    #[cfg(feature = "defmt-03")]
    #[test]
    fn config_is_defmt_loggable() {
        fn assert_format<T: defmt::Format>() {}
        assert_format::<Icm20948Config>();
    }
}
