//! Misc utils

use ethers::{
    types::{Address, Bytes},
    utils::to_checksum,
};

/// Converts address to checksum address
pub fn as_checksum_addr<S>(val: &Address, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    s.serialize_str(&to_checksum(val, None))
}

/// If possible, parses address from the first 20 bytes
pub fn get_address(buf: &[u8]) -> Option<Address> {
    if buf.len() >= 20 {
        Some(Address::from_slice(&buf[0..20]))
    } else {
        None
    }
}

/// Init code calling `factory` with `factory_data`
pub fn pack_init_code(factory: Address, factory_data: &[u8]) -> Bytes {
    [factory.as_bytes(), factory_data].concat().into()
}

/// Splits init code into factory and call data
pub fn unpack_init_code(init_code: &[u8]) -> Option<(Address, Bytes)> {
    let factory = get_address(init_code)?;
    Some((factory, init_code[20..].to_vec().into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_code_round_trip() {
        let factory: Address = "0x95222290DD7278Aa3Ddd389Cc1E1d165CC4BAfe5".parse().unwrap();
        let data: Bytes = "0x12345678".parse().unwrap();
        let init_code = pack_init_code(factory, &data);
        assert_eq!(init_code.len(), 24);
        assert_eq!(unpack_init_code(&init_code), Some((factory, data)));
        assert_eq!(unpack_init_code(&[0u8; 4]), None);
    }
}
