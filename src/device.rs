//! Register-access core shared by both drivers: bank-select caching, masked
//! writes, device reset, and the AK09916 passthrough primitives built on the
//! chip's I2C master.

use embedded_hal_async::delay::DelayNs;

use crate::bus::BusTransfer;
use crate::reg::*;
use crate::IcmError;

pub(crate) struct Device<BUS, DELAY> {
    pub(crate) bus: BUS,
    user_bank: UserBank,
    pub(crate) delay: DELAY,
}

impl<BUS, DELAY> Device<BUS, DELAY>
where
    BUS: BusTransfer,
    DELAY: DelayNs,
{
    pub(crate) fn new(bus: BUS, delay: DELAY) -> Self {
        Self {
            bus,
            user_bank: UserBank::Bank0,
            delay,
        }
    }

    /// Ensure the correct user bank is selected for the given register.
    /// The selection is cached; `force` writes it out regardless, which is
    /// needed on first contact and after a device reset.
    pub(crate) async fn set_user_bank(
        &mut self,
        bank: UserBank,
        force: bool,
    ) -> Result<(), BUS::Error> {
        if self.user_bank != bank || force {
            self.bus
                .register_write(&[REG_BANK_SEL, (bank as u8) << 4])
                .await?;
            self.user_bank = bank;
        }
        Ok(())
    }

    /// Read a const number `N` of consecutive bytes starting at `reg`
    pub(crate) async fn read_from<const N: usize, R: Register>(
        &mut self,
        reg: R,
    ) -> Result<[u8; N], BUS::Error> {
        let mut buf = [0u8; N];
        self.set_user_bank(reg.bank(), false).await?;
        self.bus.register_read(reg.addr(), &mut buf).await?;
        Ok(buf)
    }

    /// Write a single byte to the requested register
    pub(crate) async fn write_to<R: Register>(&mut self, reg: R, data: u8) -> Result<(), BUS::Error> {
        self.set_user_bank(reg.bank(), false).await?;
        self.bus.register_write(&[reg.addr(), data]).await
    }

    /// Write to a register, but only overwrite the bits set in `mask`
    pub(crate) async fn write_to_flag<R: Register>(
        &mut self,
        reg: R,
        data: u8,
        mask: u8,
    ) -> Result<(), BUS::Error> {
        let [mut register] = self.read_from(reg).await?;
        register = (register & !mask) | (data & mask);
        self.write_to(reg, register).await
    }

    /// Reset the accelerometer/gyroscope module and re-select the automatic
    /// clock source. The part returns to bank 0 on reset, matching the cache
    /// state left behind by the `PWR_MGMT_1` access.
    pub(crate) async fn device_reset(&mut self) -> Result<(), BUS::Error> {
        self.write_to_flag(Bank0::PwrMgmt1, PWR_MGMT_1_DEVICE_RESET, PWR_MGMT_1_DEVICE_RESET)
            .await?;
        self.delay.delay_ms(100).await;
        self.write_to(Bank0::PwrMgmt1, PWR_MGMT_1_CLKSEL_AUTO).await
    }

    /// Enables the ICM module to act as I2C master towards the magnetometer
    pub(crate) async fn enable_i2c_master(&mut self, enable: bool) -> Result<(), BUS::Error> {
        self.write_to_flag(
            Bank0::UserCtrl,
            if enable { USER_CTRL_I2C_MST_EN } else { 0 },
            USER_CTRL_I2C_MST_EN,
        )
        .await
    }

    /// Resets the I2C master module
    pub(crate) async fn reset_i2c_master(&mut self) -> Result<(), BUS::Error> {
        self.write_to_flag(Bank0::UserCtrl, USER_CTRL_I2C_MST_RST, USER_CTRL_I2C_MST_RST)
            .await
    }

    /// Disables the chip-side I2C slave interface, required when the part is
    /// driven over SPI
    pub(crate) async fn disable_i2c_slave(&mut self) -> Result<(), BUS::Error> {
        self.write_to_flag(Bank0::UserCtrl, USER_CTRL_I2C_IF_DIS, USER_CTRL_I2C_IF_DIS)
            .await
    }

    /// Read `N` bytes from the magnetometer through the SLV0 passthrough.
    /// The short delay gives the I2C master time to run the transaction
    /// before the mirrored bytes are collected.
    pub(crate) async fn mag_read_from<const N: usize>(
        &mut self,
        reg: MagRegister,
    ) -> Result<[u8; N], BUS::Error> {
        self.write_to(Bank3::I2cSlv0Addr, AK09916_I2C_ADDR | I2C_SLV0_ADDR_READ)
            .await?;
        self.write_to(Bank3::I2cSlv0Reg, reg.addr()).await?;
        self.write_to(Bank3::I2cSlv0Ctrl, I2C_SLV0_CTRL_EN | N as u8)
            .await?;
        self.delay.delay_ms(10).await;
        self.read_from(Bank0::ExtSlvSensData00).await
    }

    /// Write `data` to a magnetometer register without verifying it landed.
    /// Used for the soft reset, whose flag self-clears.
    pub(crate) async fn mag_write_unchecked(
        &mut self,
        reg: MagRegister,
        data: u8,
    ) -> Result<(), BUS::Error> {
        self.write_to(Bank3::I2cSlv0Addr, AK09916_I2C_ADDR).await?;
        self.write_to(Bank3::I2cSlv0Reg, reg.addr()).await?;
        self.write_to(Bank3::I2cSlv0Do, data).await?;
        self.write_to(Bank3::I2cSlv0Ctrl, I2C_SLV0_CTRL_EN | 1).await?;
        self.delay.delay_ms(10).await;
        Ok(())
    }

    /// Write `data` to a magnetometer register and read it back through the
    /// passthrough to verify the transfer
    pub(crate) async fn mag_write_to(
        &mut self,
        reg: MagRegister,
        data: u8,
    ) -> Result<(), IcmError<BUS::Error>> {
        self.mag_write_unchecked(reg, data).await?;
        let [echo] = self.mag_read_from(reg).await?;
        if echo != data {
            return Err(IcmError::MagWriteFailed);
        }
        Ok(())
    }

    /// Soft-reset the magnetometer, then clear the I2C master state that was
    /// talking to it mid-reset
    pub(crate) async fn mag_reset(&mut self) -> Result<(), BUS::Error> {
        self.mag_write_unchecked(MagRegister::Control3, AK09916_CNTL3_SRST)
            .await?;
        self.delay.delay_ms(100).await;
        self.reset_i2c_master().await
    }

    /// Leave SLV0 streaming the magnetometer's status+data block into the
    /// external sensor data registers
    pub(crate) async fn mag_stream_enable(&mut self) -> Result<(), BUS::Error> {
        self.write_to(Bank3::I2cSlv0Addr, AK09916_I2C_ADDR | I2C_SLV0_ADDR_READ)
            .await?;
        self.write_to(Bank3::I2cSlv0Reg, MagRegister::Status1.addr())
            .await?;
        self.write_to(Bank3::I2cSlv0Ctrl, I2C_SLV0_CTRL_EN | MAG_BURST_LEN)
            .await
    }
}
