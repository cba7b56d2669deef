#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let s = String::from_utf8_lossy(data);
    let table = nfe_tabular::lote::parse_lots(&s);
    for queue in table.iter() {
        assert!(!queue.product_code.is_empty());
        assert!(queue.product_code.bytes().all(|b| b.is_ascii_digit()));
        for lot in &queue.lots {
            assert_eq!(lot.product_code, queue.product_code);
            assert!(!lot.lot_number.is_empty());
            assert!(lot.lot_number.bytes().all(|b| b.is_ascii_digit()));
            assert!((2..=3).contains(&lot.unit.len()));
            assert!(lot.unit.bytes().all(|b| b.is_ascii_uppercase()));
            assert!(!lot.quantity.is_sign_negative());
        }
    }
});
