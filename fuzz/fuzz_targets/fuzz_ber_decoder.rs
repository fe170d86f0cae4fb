#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;

use snmp_walker::ber::Decoder;
use snmp_walker::ber::tag;
use snmp_walker::value::Value;
use snmp_walker::varbind::{VarBind, decode_varbind_list};

fuzz_target!(|data: &[u8]| {
    let bytes = Bytes::copy_from_slice(data);

    // BER decoder primitives
    let mut decoder = Decoder::new(bytes.clone());
    let _ = decoder.read_integer();

    let mut decoder = Decoder::new(bytes.clone());
    let _ = decoder.read_unsigned32(tag::application::COUNTER32);

    let mut decoder = Decoder::new(bytes.clone());
    let _ = decoder.read_octet_string();

    let mut decoder = Decoder::new(bytes.clone());
    let _ = decoder.read_null();

    let mut decoder = Decoder::new(bytes.clone());
    let _ = decoder.read_oid();

    let mut decoder = Decoder::new(bytes.clone());
    let _ = decoder.read_sequence();

    // Values of every tag, and varbinds
    let mut decoder = Decoder::new(bytes.clone());
    if let Ok(value) = Value::decode(&mut decoder) {
        let _ = value.to_string();
    }

    let mut decoder = Decoder::new(bytes.clone());
    let _ = VarBind::decode(&mut decoder);

    let mut decoder = Decoder::new(bytes);
    let _ = decode_varbind_list(&mut decoder);
});
