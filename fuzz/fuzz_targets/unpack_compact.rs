
extern crate compact_address;

use compact_address::{Address, CompactAddress};

fn do_test(data: &[u8]) {
    match Address::unpack(data) {
        Err(_) => {},
        Ok(address) => {
            let compact = CompactAddress::from_bytes(data).expect("unpacked records validate");
            assert_eq!(compact.unpack().unwrap(), address);
            assert_eq!(compact.as_bytes().len(), address.packed_len());
            let text = address.to_string();
            assert!(text.len() <= address.text_len());
            assert_eq!(text.parse::<CompactAddress>().unwrap(), compact);
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
