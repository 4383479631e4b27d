//! Record checksum
//!
//! CRC-16 with the CCITT polynomial `0x1021` and a non-standard seed of
//! `0xCACA`. The seed keeps log frames from validating as generic
//! CRC-16/CCITT data. MSB-first, no reflection, no final XOR.

/// Generator polynomial
pub const POLYNOMIAL: u16 = 0x1021;

/// Initial register value
pub const SEED: u16 = 0xCACA;

/// Size of a serialized checksum in bytes
pub const CHECKSUM_SIZE: usize = 2;

const TABLE: [u16; 256] = build_table();

const fn build_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u16) << 8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ POLYNOMIAL
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Compute the checksum of `data`
pub fn crc16(data: &[u8]) -> u16 {
    data.iter().fold(SEED, |crc, &byte| {
        (crc << 8) ^ TABLE[((crc >> 8) as u8 ^ byte) as usize]
    })
}
