#![allow(dead_code)]

//! In-memory simulation of the banked register file of an ICM-2094x,
//! including the bank-select semantics, the self-clearing reset bit and the
//! SLV0 passthrough to an AK09916 register file. Implements the
//! `embedded-hal-async` I2C and SPI traits so the drivers can be exercised
//! end-to-end on the host.

use std::cell::RefCell;
use std::rc::Rc;

use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::{self, I2c, Operation as I2cOperation};
use embedded_hal_async::spi::{self, Operation as SpiOperation, SpiDevice};

const REG_BANK_SEL: u8 = 0x7F;
const PWR_MGMT_1: usize = 0x06;
const EXT_SLV_SENS_DATA_00: usize = 0x3B;
const I2C_SLV0_ADDR: usize = 0x03;
const I2C_SLV0_REG: usize = 0x04;
const I2C_SLV0_CTRL: usize = 0x05;
const I2C_SLV0_DO: usize = 0x06;
const MAG_WIA2: usize = 0x01;
const MAG_ST1: usize = 0x10;
const MAG_ST2: usize = 0x18;
const MAG_CNTL3: usize = 0x32;

pub struct Chip {
    pub banks: [[u8; 0x80]; 4],
    pub bank: usize,
    pub mag: [u8; 0x40],
    /// Number of writes to `REG_BANK_SEL` seen so far
    pub bank_selects: usize,
    /// Last I2C address the host used
    pub i2c_addr: u8,
    /// Magnetometer register that silently ignores writes
    pub mag_stuck: Option<u8>,
    pointer: u8,
}

impl Chip {
    fn blank() -> Self {
        Self {
            banks: [[0; 0x80]; 4],
            bank: 0,
            mag: [0; 0x40],
            bank_selects: 0,
            i2c_addr: 0,
            mag_stuck: None,
            pointer: 0,
        }
    }

    pub fn icm20948() -> Self {
        let mut chip = Self::blank();
        chip.banks[0][0x00] = 0xEA;
        chip.mag[MAG_WIA2] = 0x09;
        chip
    }

    pub fn icm20649() -> Self {
        let mut chip = Self::blank();
        chip.banks[0][0x00] = 0xE1;
        chip
    }

    pub fn reg(&self, bank: usize, reg: u8) -> u8 {
        self.banks[bank][reg as usize]
    }

    /// Load accelerometer, gyroscope and temperature counts into the data
    /// registers (big-endian) and raise the raw-data-ready flag
    pub fn set_imu_data(&mut self, acc: [i16; 3], gyr: [i16; 3], tmp: i16) {
        let mut addr = 0x2D;
        for value in acc.iter().chain(gyr.iter()).chain([tmp].iter()) {
            let [hi, lo] = value.to_be_bytes();
            self.banks[0][addr] = hi;
            self.banks[0][addr + 1] = lo;
            addr += 2;
        }
        self.banks[0][0x1A] |= 0x01;
    }

    /// Load magnetometer counts into the AK09916 register file
    /// (little-endian) and raise its data-ready flag
    pub fn set_mag_data(&mut self, mag: [i16; 3]) {
        self.mag[MAG_ST1] = 0x01;
        let mut addr = 0x11;
        for value in mag {
            let [lo, hi] = value.to_le_bytes();
            self.mag[addr] = lo;
            self.mag[addr + 1] = hi;
            addr += 2;
        }
        self.mag[MAG_ST2] = 0;
    }

    pub fn set_mag_overflow(&mut self) {
        self.mag[MAG_ST2] |= 0x08;
    }

    fn write_reg(&mut self, reg: u8, val: u8) {
        if reg == REG_BANK_SEL {
            self.bank = ((val >> 4) & 0b11) as usize;
            self.bank_selects += 1;
            return;
        }
        match (self.bank, reg as usize) {
            // DEVICE_RESET self-clears
            (0, PWR_MGMT_1) => self.banks[0][PWR_MGMT_1] = val & !0x80,
            // Writing the enable bit triggers the external transaction
            (3, I2C_SLV0_CTRL) => {
                self.banks[3][I2C_SLV0_CTRL] = val;
                if val & 0x80 != 0 {
                    self.run_slv0();
                }
            }
            (bank, reg) => self.banks[bank][reg] = val,
        }
    }

    fn run_slv0(&mut self) {
        let addr = self.banks[3][I2C_SLV0_ADDR];
        let reg = self.banks[3][I2C_SLV0_REG] as usize;
        let len = (self.banks[3][I2C_SLV0_CTRL] & 0x0F) as usize;
        if addr & 0x80 != 0 {
            for i in 0..len {
                self.banks[0][EXT_SLV_SENS_DATA_00 + i] = self.mag[reg + i];
            }
        } else {
            let data = self.banks[3][I2C_SLV0_DO];
            if reg == MAG_CNTL3 {
                if data & 0x01 != 0 {
                    self.mag_soft_reset();
                }
            } else if self.mag_stuck != Some(reg as u8) {
                self.mag[reg] = data;
            }
        }
    }

    fn mag_soft_reset(&mut self) {
        let wia2 = self.mag[MAG_WIA2];
        self.mag = [0; 0x40];
        self.mag[MAG_WIA2] = wia2;
    }

    /// The I2C master keeps refreshing the external sensor data registers
    /// while SLV0 is enabled for reading
    fn refresh_stream(&mut self) {
        if self.banks[3][I2C_SLV0_CTRL] & 0x80 != 0 && self.banks[3][I2C_SLV0_ADDR] & 0x80 != 0 {
            self.run_slv0();
        }
    }

    fn host_write(&mut self, bytes: &[u8]) {
        if let Some((&reg, data)) = bytes.split_first() {
            self.pointer = reg;
            for (i, &byte) in data.iter().enumerate() {
                self.write_reg(reg.wrapping_add(i as u8), byte);
            }
        }
    }

    fn host_read(&mut self, buf: &mut [u8]) {
        self.refresh_stream();
        for byte in buf.iter_mut() {
            let p = self.pointer;
            *byte = if p == REG_BANK_SEL {
                (self.bank as u8) << 4
            } else {
                self.banks[self.bank][p as usize]
            };
            self.pointer = p.wrapping_add(1);
        }
    }
}

#[derive(Debug)]
pub struct SimError;

impl i2c::Error for SimError {
    fn kind(&self) -> i2c::ErrorKind {
        i2c::ErrorKind::Other
    }
}

impl spi::Error for SimError {
    fn kind(&self) -> spi::ErrorKind {
        spi::ErrorKind::Other
    }
}

/// The chip behind an I2C bus
#[derive(Clone)]
pub struct SimI2c {
    pub chip: Rc<RefCell<Chip>>,
}

impl i2c::ErrorType for SimI2c {
    type Error = SimError;
}

impl I2c for SimI2c {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [I2cOperation<'_>],
    ) -> Result<(), Self::Error> {
        let mut chip = self.chip.borrow_mut();
        chip.i2c_addr = address;
        for op in operations.iter_mut() {
            match op {
                I2cOperation::Write(bytes) => chip.host_write(bytes),
                I2cOperation::Read(buf) => chip.host_read(buf),
            }
        }
        Ok(())
    }
}

/// The chip behind a SPI device; bit 7 of the address byte selects reads
#[derive(Clone)]
pub struct SimSpi {
    pub chip: Rc<RefCell<Chip>>,
}

impl spi::ErrorType for SimSpi {
    type Error = SimError;
}

impl SpiDevice for SimSpi {
    async fn transaction(
        &mut self,
        operations: &mut [SpiOperation<'_, u8>],
    ) -> Result<(), Self::Error> {
        let mut chip = self.chip.borrow_mut();
        for op in operations.iter_mut() {
            match op {
                SpiOperation::Write(bytes) => {
                    if let Some(&first) = bytes.first() {
                        if first & 0x80 != 0 {
                            chip.pointer = first & 0x7F;
                        } else {
                            chip.host_write(bytes);
                        }
                    }
                }
                SpiOperation::Read(buf) => chip.host_read(buf),
                _ => {}
            }
        }
        Ok(())
    }
}

pub struct NoopDelay;

impl DelayNs for NoopDelay {
    async fn delay_ns(&mut self, _ns: u32) {}
}
