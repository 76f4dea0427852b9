//! I2C/SPI access to the banked register file.
//!
//! Both chips speak the same register protocol over either bus. The drivers
//! are generic over [`BusTransfer`], which hides the differences: I2C uses a
//! write-read against the device address, SPI prefixes reads with the
//! register address plus the read flag in bit 7 and clocks the payload in a
//! separate transfer so the returned bytes are not offset by the address
//! phase.

use embedded_hal_async::{
    i2c::I2c,
    spi::{Operation, SpiDevice},
};

/// SPI register reads set the MSB of the address byte
const SPI_READ: u8 = 0x80;

/// Which physical interface a bus implementation drives. The chips require
/// their internal I2C slave to be disabled when addressed over SPI.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Interface {
    I2c,
    Spi,
}

/// Trait to allow for generic behavior across I2c or Spi usage
#[allow(async_fn_in_trait)]
pub trait BusTransfer {
    type Error;
    type Inner;

    const INTERFACE: Interface;

    /// Releases the inner bus back to the caller
    fn destroy(self) -> Self::Inner;

    /// Reads `read.len()` consecutive bytes starting at register `reg`
    async fn register_read(&mut self, reg: u8, read: &mut [u8]) -> Result<(), Self::Error>;

    /// Writes `write[1..]` to the register in `write[0]`
    async fn register_write(&mut self, write: &[u8]) -> Result<(), Self::Error>;
}

/// Type to hold bus information for I2c
pub struct IcmBusI2c<I2C> {
    pub(crate) bus_inner: I2C,
    pub(crate) address: I2cAddress,
}

impl<I2C> IcmBusI2c<I2C> {
    pub(crate) fn new(bus_inner: I2C, address: I2cAddress) -> Self {
        Self { bus_inner, address }
    }
}

impl<I2C: I2c> BusTransfer for IcmBusI2c<I2C> {
    type Error = I2C::Error;
    type Inner = I2C;

    const INTERFACE: Interface = Interface::I2c;

    fn destroy(self) -> Self::Inner {
        self.bus_inner
    }

    async fn register_read(&mut self, reg: u8, read: &mut [u8]) -> Result<(), Self::Error> {
        self.bus_inner
            .write_read(self.address.get(), &[reg], read)
            .await
    }

    async fn register_write(&mut self, write: &[u8]) -> Result<(), Self::Error> {
        self.bus_inner.write(self.address.get(), write).await
    }
}

/// Type to hold bus information for Spi
pub struct IcmBusSpi<SPI> {
    pub(crate) bus_inner: SPI,
}

impl<SPI> IcmBusSpi<SPI> {
    pub(crate) fn new(bus_inner: SPI) -> Self {
        Self { bus_inner }
    }
}

impl<SPI: SpiDevice> BusTransfer for IcmBusSpi<SPI> {
    type Error = SPI::Error;
    type Inner = SPI;

    const INTERFACE: Interface = Interface::Spi;

    fn destroy(self) -> Self::Inner {
        self.bus_inner
    }

    async fn register_read(&mut self, reg: u8, read: &mut [u8]) -> Result<(), Self::Error> {
        self.bus_inner
            .transaction(&mut [Operation::Write(&[reg | SPI_READ]), Operation::Read(read)])
            .await
    }

    async fn register_write(&mut self, write: &[u8]) -> Result<(), Self::Error> {
        self.bus_inner.write(write).await
    }
}

/// I2C address of the ICM module, selected by the `AD0` pin
#[derive(Copy, Clone, Debug, Default)]
pub enum I2cAddress {
    /// On some modules `0x68` is the default address if pin `AD0` is low
    X68,
    /// On some modules `0x69` is the default address if pin `AD0` is high
    #[default]
    X69,
    /// In case the ICM module has a different address
    Any(u8),
}

impl From<u8> for I2cAddress {
    fn from(address: u8) -> Self {
        I2cAddress::Any(address)
    }
}

impl I2cAddress {
    pub const fn get(&self) -> u8 {
        match self {
            I2cAddress::X68 => 0x68,
            I2cAddress::X69 => 0x69,
            I2cAddress::Any(a) => *a,
        }
    }
}
