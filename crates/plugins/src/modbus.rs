// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reference DRIVER plugin: a Modbus-style southbound driver.
//!
//! Address format is `<unit>!<table><offset>[.<addr_option>]`, e.g.
//! `1!400001` (unit 1, holding register 1) or `1!100001.3` (unit 1,
//! coil 1, bit 3 — BIT tags reuse the trailing `.<n>` for their own
//! offset per [`gw_core::parse_addr_option`]). The leading table digit
//! follows the classic Modbus numbering convention: 0 = coil,
//! 1 = discrete input, 3 = input register, 4 = holding register.
//!
//! There's no real transport here — `registers` is an in-memory stand-in
//! for a device, round-tripped the same way a TCP/RTU client would.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use gw_core::{GatewayError, Tag, TagType};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::descriptor::PluginDescriptor;
use crate::driver::{DriverPlugin, PluginError, TagUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModbusTable {
    Coil,
    DiscreteInput,
    InputRegister,
    HoldingRegister,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModbusAddress {
    pub unit: u8,
    pub table: ModbusTable,
    pub offset: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ModbusAddressError {
    #[error("address is missing the `<unit>!` prefix")]
    MissingUnit,
    #[error("unit id is not a valid number")]
    InvalidUnit,
    #[error("register address is too short to carry a table digit")]
    MissingTable,
    #[error("unrecognized Modbus table digit")]
    UnknownTable,
    #[error("register offset is not a valid number")]
    InvalidOffset,
}

/// Parses `<unit>!<table><offset>`, ignoring any addr_option suffix
/// already consumed by [`gw_core::parse_addr_option`].
pub fn parse_modbus_address(address: &str) -> Result<ModbusAddress, ModbusAddressError> {
    let (unit_part, rest) = address.split_once('!').ok_or(ModbusAddressError::MissingUnit)?;
    let unit: u8 = unit_part.parse().map_err(|_| ModbusAddressError::InvalidUnit)?;

    let register = rest.split(['.', '#']).next().unwrap_or(rest);
    if register.len() < 2 {
        return Err(ModbusAddressError::MissingTable);
    }
    let (table_digit, offset_digits) = register.split_at(1);
    let table = match table_digit {
        "0" => ModbusTable::Coil,
        "1" => ModbusTable::DiscreteInput,
        "3" => ModbusTable::InputRegister,
        "4" => ModbusTable::HoldingRegister,
        _ => return Err(ModbusAddressError::UnknownTable),
    };
    let offset: u16 = offset_digits.parse().map_err(|_| ModbusAddressError::InvalidOffset)?;

    Ok(ModbusAddress { unit, table, offset })
}

type RegisterKey = (u8, ModbusTable, u16);

#[derive(Debug)]
pub struct ModbusDriver {
    descriptor: PluginDescriptor,
    registers: Mutex<HashMap<RegisterKey, u16>>,
}

impl ModbusDriver {
    pub fn new() -> Self {
        let mut descriptor = PluginDescriptor::driver("modbus_tcp", "Modbus TCP");
        descriptor.description = "Polls holding/input registers and coils over Modbus TCP".to_string();
        ModbusDriver { descriptor, registers: Mutex::new(HashMap::new()) }
    }

    /// Test/simulation hook: seeds the in-memory device.
    pub fn seed(&self, address: &str, raw: u16) -> Result<(), ModbusAddressError> {
        let addr = parse_modbus_address(address)?;
        self.registers.lock().insert((addr.unit, addr.table, addr.offset), raw);
        Ok(())
    }

    fn read_one(&self, tag: &Tag) -> Result<serde_json::Value, GatewayError> {
        let addr = parse_modbus_address(&tag.address).map_err(|_| GatewayError::TagNotExist)?;
        let raw = *self.registers.lock().get(&(addr.unit, addr.table, addr.offset)).unwrap_or(&0);
        Ok(decode_register(tag.r#type, raw))
    }

    fn write_one(&self, address: &str, value: &serde_json::Value) -> Result<(), GatewayError> {
        let addr = parse_modbus_address(address).map_err(|_| GatewayError::TagNotExist)?;
        let raw = value.as_u64().ok_or(GatewayError::TagTypeMismatch)? as u16;
        self.registers.lock().insert((addr.unit, addr.table, addr.offset), raw);
        Ok(())
    }
}

impl Default for ModbusDriver {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_register(ty: TagType, raw: u16) -> serde_json::Value {
    match ty {
        TagType::Bit | TagType::Bool => serde_json::json!(raw != 0),
        TagType::Int16 => serde_json::json!(raw as i16),
        _ => serde_json::json!(raw),
    }
}

#[async_trait]
impl DriverPlugin for ModbusDriver {
    fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    fn validate_tag(&self, tag: &Tag) -> Result<(), GatewayError> {
        parse_modbus_address(&tag.address).map(|_| ()).map_err(|_| GatewayError::GroupParameterInvalid)
    }

    async fn group_timer(
        &self,
        _driver: &str,
        _group: &str,
        tags: &[Tag],
        updates: mpsc::Sender<TagUpdate>,
    ) -> Result<(), PluginError> {
        for tag in tags {
            let update = match self.read_one(tag) {
                Ok(value) => TagUpdate::ok(tag.name.clone(), value),
                Err(e) => TagUpdate::err(tag.name.clone(), e),
            };
            if updates.send(update).await.is_err() {
                return Ok(());
            }
        }
        Ok(())
    }

    async fn write_tag(&self, _group: &str, tag: &str, value: serde_json::Value) -> Result<(), GatewayError> {
        self.write_one(tag, &value)
    }

    async fn write_tags(&self, _group: &str, values: &[(String, serde_json::Value)]) -> Result<(), GatewayError> {
        for (address, value) in values {
            self.write_one(address, value)?;
        }
        Ok(())
    }
}

/// Convenience constructor used by the registry; kept separate so tests
/// can hold a concrete `Arc<ModbusDriver>` instead of the trait object.
pub fn new_shared() -> Arc<ModbusDriver> {
    Arc::new(ModbusDriver::new())
}
