
extern crate compact_address;

use std::str::FromStr;

use compact_address::{Address, CompactAddress};

fn do_test(data: &[u8]) {
    let s = match std::str::from_utf8(data) {
        Ok(s) => s,
        Err(_) => return,
    };
    match CompactAddress::from_str(s) {
        Err(_) => {},
        Ok(compact) => {
            let address = compact.unpack().expect("parsed addresses unpack");
            let text = address.to_string();
            if address.is_segwit() {
                assert_eq!(text, s.to_ascii_lowercase());
            } else {
                assert_eq!(text, s);
            }
            assert_eq!(Address::from_str(&text).unwrap(), address);
            assert_eq!(address.pack(), compact);
        },
    }
}

#[cfg(feature = "afl")]
extern crate afl;
#[cfg(feature = "afl")]
fn main() {
    afl::read_stdio_bytes(|data| {
        do_test(&data);
    });
}

#[cfg(feature = "honggfuzz")]
#[macro_use] extern crate honggfuzz;
#[cfg(feature = "honggfuzz")]
fn main() {
    loop {
        fuzz!(|data| {
            do_test(data);
        });
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn duplicate_crash() {
        super::do_test(b"BC1QW508D6QEJXTDG4Y5R3ZARVARY0C5XW7KV8F3T4");
        super::do_test(b"ert130xlxvlhemja6c4dqv22uapctqupfhlxm9h8z3k2e72q4k9hcz7vqqu2tys");
        super::do_test(b"1111111111111111111114oLvT2");
    }
}
