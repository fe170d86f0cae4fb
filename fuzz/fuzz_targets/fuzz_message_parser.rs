#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;

use snmp_walker::message::Message;
use snmp_walker::pdu::Pdu;

fuzz_target!(|data: &[u8]| {
    let bytes = Bytes::copy_from_slice(data);

    // First message and the rest of the buffer
    if let Ok((message, rest)) = Message::decode(bytes.clone()) {
        assert!(rest.len() < data.len());
        let _ = message.encode();
    }

    // Every message in a coalesced buffer
    let mut messages = Message::iter(bytes.clone());
    while let Some(Ok(_)) = messages.next() {}

    // PDU decoder
    let mut decoder = snmp_walker::ber::Decoder::new(bytes);
    let _ = Pdu::decode(&mut decoder);
});
