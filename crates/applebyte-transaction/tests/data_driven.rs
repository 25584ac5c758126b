//! Data-driven script and transaction fixtures.
//!
//! Each fixture file is a JSON array. Entries with a single string are
//! comments; everything else is a test case.

use std::collections::HashMap;

use serde_json::Value;

use applebyte_script::notation::parse_script_notation;
use applebyte_script::{NetworkParams, Script};
use applebyte_transaction::{OutPoint, Transaction, TransactionInput, TransactionOutput};

const SCRIPT_VALID: &str = include_str!("data/script_valid.json");
const SCRIPT_INVALID: &str = include_str!("data/script_invalid.json");
const TX_VALID: &str = include_str!("data/tx_valid.json");
const TX_INVALID: &str = include_str!("data/tx_invalid.json");

fn load_cases(json: &str) -> Vec<Vec<Value>> {
    let entries: Vec<Vec<Value>> = serde_json::from_str(json).expect("fixture is valid JSON");
    entries
        .into_iter()
        .filter(|entry| !(entry.len() == 1 && entry[0].is_string()))
        .collect()
}

fn script(notation: &Value) -> Script {
    let text = notation.as_str().expect("script notation is a string");
    parse_script_notation(text).unwrap_or_else(|e| panic!("bad notation {:?}: {}", text, e))
}

/// Run a script pair as the only input of a one-output transaction.
fn spend(script_sig: Script, script_pubkey: &Script) -> Result<(), String> {
    let mut tx = Transaction::new();
    tx.add_input(TransactionInput::with_script_sig(OutPoint::new([0u8; 32], 0), script_sig));
    tx.add_output(TransactionOutput::new(0, Script::new()));
    tx.correctly_spends(0, script_pubkey, &NetworkParams::unit_tests(), true)
        .map_err(|e| e.to_string())
}

// -----------------------------------------------------------------------
// Script fixtures
// -----------------------------------------------------------------------

#[test]
fn script_valid_fixtures() {
    let cases = load_cases(SCRIPT_VALID);
    assert!(!cases.is_empty());
    for case in cases {
        let result = spend(script(&case[0]), &script(&case[1]));
        assert!(result.is_ok(), "case {:?} failed: {:?}", case, result);
    }
}

#[test]
fn script_invalid_fixtures() {
    let cases = load_cases(SCRIPT_INVALID);
    assert!(!cases.is_empty());
    for case in cases {
        assert!(
            spend(script(&case[0]), &script(&case[1])).is_err(),
            "case {:?} unexpectedly verified",
            case
        );
    }
}

// -----------------------------------------------------------------------
// Transaction fixtures
// -----------------------------------------------------------------------

struct TxCase {
    prevouts: HashMap<OutPoint, Script>,
    tx: Transaction,
    enforce_p2sh: bool,
}

fn tx_case(case: &[Value]) -> TxCase {
    assert_eq!(case.len(), 3, "malformed case {:?}", case);
    let mut prevouts = HashMap::new();
    for prevout in case[0].as_array().expect("prevout list") {
        let hash_hex = prevout[0].as_str().expect("prevout hash");
        let mut hash: [u8; 32] = hex::decode(hash_hex)
            .expect("prevout hash hex")
            .try_into()
            .expect("32-byte prevout hash");
        hash.reverse();
        let index = prevout[1].as_u64().expect("prevout index") as u32;
        prevouts.insert(OutPoint::new(hash, index), script(&prevout[2]));
    }
    let tx = Transaction::from_hex(case[1].as_str().expect("tx hex")).expect("fixture tx parses");
    let enforce_p2sh = case[2].as_bool().expect("enforce flag");
    TxCase { prevouts, tx, enforce_p2sh }
}

/// Structural checks pass and every input spends its prevout.
fn tx_is_valid(case: &TxCase) -> bool {
    if case.tx.verify().is_err() {
        return false;
    }
    let params = NetworkParams::unit_tests();
    case.tx.inputs.iter().enumerate().all(|(i, input)| {
        case.prevouts.get(&input.outpoint).map_or(false, |script_pubkey| {
            case.tx
                .correctly_spends(i, script_pubkey, &params, case.enforce_p2sh)
                .is_ok()
        })
    })
}

#[test]
fn tx_valid_fixtures() {
    let cases = load_cases(TX_VALID);
    assert!(!cases.is_empty());
    for case in cases {
        let parsed = tx_case(&case);
        assert!(parsed.tx.verify().is_ok(), "structural check failed: {:?}", case[1]);
        for input in &parsed.tx.inputs {
            assert!(parsed.prevouts.contains_key(&input.outpoint), "missing prevout {}", input.outpoint);
        }
        assert!(tx_is_valid(&parsed), "case {:?} failed", case[1]);
    }
}

#[test]
fn tx_invalid_fixtures() {
    let cases = load_cases(TX_INVALID);
    assert!(!cases.is_empty());
    for case in cases {
        let parsed = tx_case(&case);
        assert!(!tx_is_valid(&parsed), "case {:?} unexpectedly valid", case[1]);
    }
}

/// Duplicate outpoints are caught by the structural check even though
/// each input verifies on its own.
#[test]
fn duplicate_input_fixture_fails_before_scripts() {
    let cases = load_cases(TX_INVALID);
    let dup = cases
        .iter()
        .map(|c| tx_case(c))
        .find(|c| c.tx.has_duplicate_inputs())
        .expect("fixture with duplicate inputs");

    let params = NetworkParams::unit_tests();
    let script_pubkey = &dup.prevouts[&dup.tx.inputs[0].outpoint];
    for i in 0..dup.tx.inputs.len() {
        assert!(dup.tx.correctly_spends(i, script_pubkey, &params, dup.enforce_p2sh).is_ok());
    }
    assert!(dup.tx.verify().is_err());
}
