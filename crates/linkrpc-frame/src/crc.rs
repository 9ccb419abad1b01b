//! CRC-16 used to validate frame headers.
//!
//! CCITT polynomial `0x1021`, initial value `0xFFFF`, bits processed most
//! significant first, no reflection and no final XOR (CRC-16/CCITT-FALSE).

const POLYNOMIAL: u16 = 0x1021;
const INITIAL: u16 = 0xFFFF;

/// Compute the CRC-16 of `bytes`.
pub fn crc16(bytes: &[u8]) -> u16 {
    let mut crc = INITIAL;
    for &byte in bytes {
        for i in 0..8 {
            let bit = (byte >> (7 - i)) & 1 == 1;
            let top = crc & 0x8000 != 0;
            crc <<= 1;
            if top ^ bit {
                crc ^= POLYNOMIAL;
            }
        }
    }
    crc
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn check_value() {
        assert_eq!(crc16(b"123456789"), 0x29B1);
    }

    #[test]
    fn empty_input_is_initial_value() {
        assert_eq!(crc16(&[]), 0xFFFF);
    }

    #[test]
    fn known_header_prefixes() {
        assert_eq!(crc16(&[0x00, 0x08, 0x00, 0x19]), 0xAE79);
        assert_eq!(crc16(&[0x00, 0x08, 0x00, 0x00]), 0x2D61);
    }

    #[test]
    fn deterministic() {
        let input = [0x12, 0x34, 0x56, 0x78];
        assert_eq!(crc16(&input), crc16(&input));
    }

    #[test]
    fn detects_every_single_bit_flip() {
        let input = [0x00, 0x08, 0x01, 0x2C];
        let reference = crc16(&input);
        for byte in 0..input.len() {
            for bit in 0..8 {
                let mut flipped = input;
                flipped[byte] ^= 1 << bit;
                assert_ne!(crc16(&flipped), reference, "byte {byte} bit {bit}");
            }
        }
    }

    proptest! {
        #[test]
        fn any_header_prefix_bit_flip_changes_crc(prefix in any::<[u8; 4]>(), bit in 0usize..32) {
            let mut flipped = prefix;
            flipped[bit / 8] ^= 1 << (bit % 8);
            prop_assert_ne!(crc16(&flipped), crc16(&prefix));
        }

        #[test]
        fn any_bit_flip_changes_crc(
            input in prop::collection::vec(any::<u8>(), 1..256),
            pick in any::<prop::sample::Index>(),
        ) {
            let bit = pick.index(input.len() * 8);
            let mut flipped = input.clone();
            flipped[bit / 8] ^= 1 << (bit % 8);
            prop_assert_ne!(crc16(&flipped), crc16(&input));
        }
    }
}
