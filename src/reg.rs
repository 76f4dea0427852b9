//! Banked register map shared by the ICM-20948 and ICM-20649, plus the
//! AK09916 magnetometer map reached through the I2C master passthrough.

/// Register bank select register, present in every bank
pub const REG_BANK_SEL: u8 = 0x7F;

/// Identity byte of the ICM-20948
pub const WHO_AM_I_ICM20948: u8 = 0xEA;
/// Identity byte of the ICM-20649
pub const WHO_AM_I_ICM20649: u8 = 0xE1;

#[derive(PartialEq, Copy, Clone)]
pub enum Bank0 {
    WhoAmI = 0x00,
    UserCtrl = 0x03,
    LpConfig = 0x05,
    PwrMgmt1 = 0x06,
    PwrMgmt2 = 0x07,
    IntPinCfg = 0x0F,
    IntEnable = 0x10,
    IntEnable1 = 0x11,
    I2cMstStatus = 0x17,
    IntStatus = 0x19,
    IntStatus1 = 0x1A,
    AccelXoutH = 0x2D,
    GyroXoutH = 0x33,
    TempOutH = 0x39,
    ExtSlvSensData00 = 0x3B,
}

#[derive(PartialEq, Copy, Clone)]
pub enum Bank2 {
    GyroSmplrtDiv = 0x00,
    GyroConfig1 = 0x01,
    OdrAlignEn = 0x09,
    AccelSmplrtDiv1 = 0x10,
    AccelSmplrtDiv2 = 0x11,
    AccelConfig = 0x14,
    TempConfig = 0x53,
}

#[derive(PartialEq, Copy, Clone)]
pub enum Bank3 {
    I2cMstCtrl = 0x01,
    I2cSlv0Addr = 0x03,
    I2cSlv0Reg = 0x04,
    I2cSlv0Ctrl = 0x05,
    I2cSlv0Do = 0x06,
}

#[repr(u8)]
#[derive(PartialEq, Copy, Clone)]
pub enum UserBank {
    Bank0 = 0b00,
    Bank1 = 0b01,
    Bank2 = 0b10,
    Bank3 = 0b11,
}

/// A register in one of the four user banks
pub trait Register: Copy {
    fn bank(self) -> UserBank;
    fn addr(self) -> u8;
}

macro_rules! impl_register {
    ($bank:ident, $user_bank:expr) => {
        impl Register for $bank {
            fn bank(self) -> UserBank {
                $user_bank
            }

            fn addr(self) -> u8 {
                self as u8
            }
        }
    };
}

impl_register!(Bank0, UserBank::Bank0);
impl_register!(Bank2, UserBank::Bank2);
impl_register!(Bank3, UserBank::Bank3);

// PWR_MGMT_1 fields
pub const PWR_MGMT_1_DEVICE_RESET: u8 = 1 << 7;
pub const PWR_MGMT_1_CLKSEL_AUTO: u8 = 0x01;

// USER_CTRL fields
pub const USER_CTRL_I2C_MST_EN: u8 = 1 << 5;
pub const USER_CTRL_I2C_IF_DIS: u8 = 1 << 4;
pub const USER_CTRL_I2C_MST_RST: u8 = 1 << 1;

// INT_STATUS_1 / INT_ENABLE_1 fields
pub const RAW_DATA_0_RDY: u8 = 0x01;

// ODR_ALIGN_EN fields
pub const ODR_ALIGN_ENABLE: u8 = 0x01;

// I2C master fields. 0x07 selects the 345.6 kHz master clock, the
// recommended setting for AK09916 communication.
pub const I2C_MST_CTRL_345_6_KHZ_CLK: u8 = 0x07;
pub const I2C_SLV0_CTRL_EN: u8 = 1 << 7;
pub const I2C_SLV0_ADDR_READ: u8 = 1 << 7;

/// The AK09916 magnetometer register map (ICM-20948 only)
#[derive(Copy, Clone)]
pub enum MagRegister {
    /// Device identity, reads 0x09
    Wia2 = 0x01,
    /// Status 1, bit 0 is data-ready
    Status1 = 0x10,
    XDataLow = 0x11,
    /// Status 2, bit 3 is measurement overflow. Reading it ends the
    /// measurement cycle, so it terminates every data burst.
    Status2 = 0x18,
    /// Operating mode control
    Control2 = 0x31,
    /// Soft reset control
    Control3 = 0x32,
}

impl MagRegister {
    pub fn addr(self) -> u8 {
        self as u8
    }
}

/// I2C address of the AK09916 on the auxiliary bus
pub const AK09916_I2C_ADDR: u8 = 0x0C;
/// Identity byte of the AK09916
pub const AK09916_DEVICE_ID: u8 = 0x09;
/// ST1 data-ready flag
pub const AK09916_ST1_DRDY: u8 = 0x01;
/// ST2 magnetic sensor overflow flag
pub const AK09916_ST2_HOFL: u8 = 1 << 3;
/// CNTL2 continuous measurement mode 4 (100 Hz)
pub const AK09916_CNTL2_CONT_MODE4: u8 = 0b01000;
/// CNTL3 soft reset flag
pub const AK09916_CNTL3_SRST: u8 = 0x01;

/// Number of bytes the I2C master streams from the magnetometer:
/// ST1, six data bytes, a dummy byte and ST2.
pub const MAG_BURST_LEN: u8 = 9;
