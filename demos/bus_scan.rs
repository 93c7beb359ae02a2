//! Scans an adapter for responding peripherals using the SMBus quick
//! command, the same probe `i2cdetect` performs.
//!
//! ```text
//! cargo run --example bus_scan -- /dev/i2c-1
//! ```

use i2c_transact::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/dev/i2c-1".into());

    let mut dev = I2cDevice::open(&path)?;
    if !dev.supports(Functionality::SMBUS_QUICK) {
        eprintln!("{path}: adapter cannot probe with the quick command");
        return Ok(());
    }

    println!("scanning {path}...");
    let mut found = 0;
    // 0x03..0x78 is the probeable 7-bit range; the rest is reserved.
    for address in 0x03u16..0x78 {
        dev.set_target(address)?;
        if dev.write_quick(false).is_ok() {
            println!("  peripheral at {address:#04x}");
            found += 1;
        }
    }
    println!("{found} peripheral(s) responded");
    Ok(())
}
