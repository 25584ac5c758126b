use proptest::prelude::*;

use applebyte_script::interpreter::{Engine, ScriptFlags, ScriptNumber};
use applebyte_script::Script;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn script_number_encoding_is_minimal(val in -0x7FFFFFFFi64..=0x7FFFFFFFi64) {
        let bytes = ScriptNumber::new(val).to_bytes();
        prop_assert!(bytes.len() <= 4);
        let decoded = ScriptNumber::from_bytes(&bytes, 4, true).unwrap();
        prop_assert_eq!(decoded.value(), val);
    }

    #[test]
    fn script_hex_roundtrip(data in prop::collection::vec(any::<u8>(), 0..256)) {
        let script = Script::from_bytes(&data);
        let script2 = Script::from_hex(&script.to_hex()).unwrap();
        prop_assert_eq!(script.to_bytes(), script2.to_bytes());
    }

    #[test]
    fn arbitrary_scripts_never_panic(
        unlock in prop::collection::vec(any::<u8>(), 0..64),
        lock in prop::collection::vec(any::<u8>(), 0..64),
        bits in 0u32..0x800,
    ) {
        let flags = ScriptFlags(bits);
        let _ = Engine::default().execute(
            &Script::from_bytes(&unlock),
            &Script::from_bytes(&lock),
            flags,
            None,
            0,
        );
    }

    #[test]
    fn pushed_data_compares_equal_to_itself(data in prop::collection::vec(any::<u8>(), 1..=520)) {
        let mut unlock = Script::new();
        unlock.append_push_data(&data).unwrap();
        let mut lock = Script::new();
        lock.append_push_data(&data).unwrap();
        lock.append_opcodes(&[applebyte_script::opcodes::OP_EQUAL]).unwrap();
        let flags = ScriptFlags::VERIFY_SIG_PUSH_ONLY | ScriptFlags::VERIFY_CLEAN_STACK | ScriptFlags::BIP16;
        prop_assert!(Engine::default().execute(&unlock, &lock, flags, None, 0).is_ok());
    }

    #[test]
    fn append_number_pushes_the_number(n in -1_000_000i64..1_000_000) {
        let mut unlock = Script::new();
        unlock.append_number(n).unwrap();
        let mut lock = Script::new();
        lock.append_number(n).unwrap();
        lock.append_opcodes(&[applebyte_script::opcodes::OP_NUMEQUAL]).unwrap();
        prop_assert!(Engine::default()
            .execute(&unlock, &lock, ScriptFlags::VERIFY_MINIMAL_DATA, None, 0)
            .is_ok());
    }
}
