mod common;

use std::cell::RefCell;
use std::rc::Rc;

use embassy_futures::block_on;

use common::{Chip, NoopDelay, SimI2c, SimSpi};
use icm2094x_async::cfg::{AccUnit, GyrUnit};
use icm2094x_async::icm20649::{AccRange, GyrRange, Icm20649};
use icm2094x_async::IcmError;

fn sim() -> Rc<RefCell<Chip>> {
    Rc::new(RefCell::new(Chip::icm20649()))
}

#[test]
fn init_configures_ranges_and_filters() {
    let chip = sim();
    let bus = SimI2c { chip: chip.clone() };

    let imu = block_on(Icm20649::new_i2c(bus, NoopDelay).initialize());
    assert!(imu.is_ok());

    let chip = chip.borrow();
    // Auto clock source selected after reset
    assert_eq!(chip.reg(0, 0x06), 0x01);
    // ODR alignment enabled
    assert_eq!(chip.reg(2, 0x09), 0x01);
    // Default 30G range (0b11 << 1) with the 111 Hz DLPF (2 << 3 | 1)
    assert_eq!(chip.reg(2, 0x14), 0b0001_0111);
    // Default 4000 dps range with the 120 Hz DLPF
    assert_eq!(chip.reg(2, 0x01), 0b0001_0111);
    // No magnetometer on this part, the I2C master stays off
    assert_eq!(chip.reg(0, 0x03) & 0x20, 0x00);
}

#[test]
fn init_rejects_wrong_identity() {
    let chip = sim();
    chip.borrow_mut().banks[0][0x00] = 0xEA;
    let bus = SimI2c { chip: chip.clone() };

    match block_on(Icm20649::new_i2c(bus, NoopDelay).initialize()) {
        Err(IcmError::ImuWhoAmI(0xEA)) => {}
        Err(e) => panic!("unexpected error: {e:?}"),
        Ok(_) => panic!("init accepted a wrong identity byte"),
    }
}

#[test]
fn read_6dof_scales_counts_into_configured_units() {
    let chip = sim();
    chip.borrow_mut()
        .set_imu_data([1024, -2048, 512], [82, -164, 0], 21);
    let bus = SimI2c { chip: chip.clone() };

    // Default ranges: 30 g at 1024 counts per g, 4000 dps at 8.2 counts per dps
    let mut imu = block_on(Icm20649::new_i2c(bus, NoopDelay).initialize()).unwrap();

    let data = block_on(imu.read_6dof()).unwrap();
    assert_eq!(data.acc.x, 1.0);
    assert_eq!(data.acc.y, -2.0);
    assert_eq!(data.acc.z, 0.5);
    assert!((data.gyr.x - 10.0).abs() < 1e-3);
    assert!((data.gyr.y + 20.0).abs() < 1e-3);
    assert_eq!(data.gyr.z, 0.0);
    assert_eq!(data.tmp, 21.0);
}

#[test]
fn physical_units_apply_configured_scalars() {
    let chip = sim();
    chip.borrow_mut().set_imu_data([1024, 0, 0], [82, 0, 0], 21);
    let bus = SimI2c { chip: chip.clone() };

    let mut imu = block_on(
        Icm20649::new_i2c(bus, NoopDelay)
            .acc_unit(AccUnit::Mpss)
            .gyr_unit(GyrUnit::Rps)
            .initialize(),
    )
    .unwrap();

    let data = block_on(imu.read_6dof()).unwrap();
    assert!((data.acc.x - 9.80665).abs() < 1e-4);
    assert!((data.gyr.x - 10.0 * 0.017453293).abs() < 1e-5);
}

#[test]
fn narrower_ranges_use_their_own_divisors() {
    let chip = sim();
    chip.borrow_mut()
        .set_imu_data([8192, 0, 0], [655, 0, 0], 21);
    let bus = SimI2c { chip: chip.clone() };

    let mut imu = block_on(
        Icm20649::new_i2c(bus, NoopDelay)
            .acc_range(AccRange::Gs4)
            .gyr_range(GyrRange::Dps500)
            .initialize(),
    )
    .unwrap();

    let data = block_on(imu.read_6dof()).unwrap();
    assert_eq!(data.acc.x, 1.0);
    assert!((data.gyr.x - 10.0).abs() < 1e-3);
}

#[test]
fn sample_rate_dividers_are_split_and_clamped() {
    let chip = sim();
    let bus = SimI2c { chip: chip.clone() };

    let mut imu = block_on(
        Icm20649::new_i2c(bus, NoopDelay)
            .acc_odr(0x123)
            .gyr_odr(0x42)
            .initialize(),
    )
    .unwrap();

    {
        let chip = chip.borrow();
        assert_eq!(chip.reg(2, 0x10), 0x01);
        assert_eq!(chip.reg(2, 0x11), 0x23);
        assert_eq!(chip.reg(2, 0x00), 0x42);
    }

    // The accelerometer divider is 12 bits wide
    block_on(imu.set_acc_odr(0x2000)).unwrap();
    let chip = chip.borrow();
    assert_eq!(chip.reg(2, 0x10), 0x0F);
    assert_eq!(chip.reg(2, 0x11), 0xFF);
}

#[test]
fn data_ready_flag_and_interrupt_enable() {
    let chip = sim();
    let bus = SimI2c { chip: chip.clone() };

    let mut imu = block_on(Icm20649::new_i2c(bus, NoopDelay).initialize()).unwrap();
    assert!(!block_on(imu.new_data_ready()).unwrap());

    chip.borrow_mut().set_imu_data([1, 2, 3], [4, 5, 6], 7);
    assert!(block_on(imu.new_data_ready()).unwrap());

    block_on(imu.data_ready_interrupt(true)).unwrap();
    assert_eq!(chip.borrow().reg(0, 0x11), 0x01);
}

#[test]
fn spi_init_disables_the_chip_i2c_slave() {
    let chip = sim();
    chip.borrow_mut().set_imu_data([1024, 0, 0], [0, 0, 0], 21);
    let bus = SimSpi { chip: chip.clone() };

    let mut imu = block_on(Icm20649::new_spi(bus, NoopDelay).initialize()).unwrap();

    assert_eq!(chip.borrow().reg(0, 0x03) & 0x10, 0x10);

    let data = block_on(imu.read_6dof()).unwrap();
    assert_eq!(data.acc.x, 1.0);
}
