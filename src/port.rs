use anyhow::{Context, Result};
use serialport::{DataBits, FlowControl, Parity, SerialPort, SerialPortType, StopBits};
use std::time::Duration;

use crate::frame::LinkError;

/// Open `path` at `baud`, 8N1, no flow control — the accelerator's UART config.
pub fn open_port(path: &str, baud: u32, timeout: Duration) -> Result<Box<dyn SerialPort>, LinkError> {
    serialport::new(path, baud)
        .timeout(timeout)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .open()
        .map_err(|e| LinkError::Open {
            port: path.to_string(),
            source: e,
        })
}

pub fn describe(ty: &SerialPortType) -> String {
    match ty {
        SerialPortType::UsbPort(info) => {
            let mut s = format!("USB {:04x}:{:04x}", info.vid, info.pid);
            if let Some(product) = &info.product {
                s.push(' ');
                s.push_str(product);
            }
            s
        }
        SerialPortType::PciPort => "PCI".to_string(),
        SerialPortType::BluetoothPort => "Bluetooth".to_string(),
        SerialPortType::Unknown => "unknown".to_string(),
    }
}

pub fn print_ports() -> Result<()> {
    let ports = serialport::available_ports().context("enumerating serial ports")?;
    if ports.is_empty() {
        println!("no serial ports found");
        return Ok(());
    }
    println!("available serial ports:");
    for p in &ports {
        println!("  {:<20} {}", p.port_name, describe(&p.port_type));
    }
    Ok(())
}
