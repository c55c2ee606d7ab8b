//! # Boundary Scenarios
//!
//! End-to-end entry-point tests against mock hosts: the call contract,
//! both error taxonomies, gas accounting, and the read-only guarantees of
//! queries.

#[cfg(test)]
mod tests {
    use crate::fixtures::{
        counter_module_bytes, entry_message, genesis_bundle_bytes, multiply_script_message,
        query_script_message, sender,
    };
    use crate::mocks::{MockHost, ScriptedFailure};
    use basalt_ffi::{
        decode_module_bytes, decode_move_resource, decode_script_bytes, execute_contract,
        execute_script, initialize, publish_module, query_contract, version_str, ByteSliceView,
        ErrnoValue, GoError, UnmanagedVector,
    };
    use basalt_types::{AccessPath, AccountAddress, StructTag, Value};
    use errno::errno;
    use std::ffi::CStr;

    const GAS: u64 = 10_000_000;

    // =============================================================================
    // TEST HARNESS
    // =============================================================================

    /// What the host observes after one entry-point call.
    struct Outcome {
        status: i32,
        result: Vec<u8>,
        error: Option<String>,
    }

    impl Outcome {
        fn expect_success(&self) -> &Self {
            assert_eq!(self.status, ErrnoValue::Success as i32, "error: {:?}", self.error);
            assert!(self.error.is_none(), "error buffer set on success");
            self
        }

        fn expect_failure(&self, status: ErrnoValue) -> &str {
            assert_eq!(self.status, status as i32);
            assert!(self.result.is_empty(), "result returned on failure");
            self.error.as_deref().expect("error buffer empty on failure")
        }

        fn result_json(&self) -> serde_json::Value {
            serde_json::from_slice(&self.result).expect("result is JSON")
        }
    }

    /// Collects the returned buffer, error buffer, and errno into one
    /// value, consuming both owned buffers exactly once.
    fn collect(ret: UnmanagedVector, errmsg: UnmanagedVector) -> Outcome {
        let status = errno().0;
        Outcome {
            status,
            result: ret.consume().unwrap_or_default(),
            error: errmsg
                .consume()
                .map(|msg| String::from_utf8_lossy(&msg).into_owned()),
        }
    }

    fn run_initialize(host: &MockHost, bundle: ByteSliceView) -> Outcome {
        let mut errmsg = UnmanagedVector::default();
        let ret = initialize(host.db(), false, Some(&mut errmsg), bundle);
        collect(ret, errmsg)
    }

    fn run_publish(host: &MockHost, owner: AccountAddress, gas: u64) -> Outcome {
        let module_bytes = counter_module_bytes();
        let mut errmsg = UnmanagedVector::default();
        let ret = publish_module(
            host.db(),
            false,
            gas,
            Some(&mut errmsg),
            ByteSliceView::new(owner.as_bytes()),
            ByteSliceView::new(&module_bytes),
        );
        collect(ret, errmsg)
    }

    fn run_execute(host: &MockHost, message: &[u8], gas: u64) -> Outcome {
        let sender = sender();
        let mut errmsg = UnmanagedVector::default();
        let ret = execute_contract(
            host.db(),
            host.api(),
            host.querier(),
            false,
            gas,
            Some(&mut errmsg),
            ByteSliceView::new(b"session-1"),
            ByteSliceView::new(sender.as_bytes()),
            ByteSliceView::new(message),
        );
        collect(ret, errmsg)
    }

    fn run_script(host: &MockHost, message: &[u8], gas: u64) -> Outcome {
        let sender = sender();
        let mut errmsg = UnmanagedVector::default();
        let ret = execute_script(
            host.db(),
            host.api(),
            host.querier(),
            false,
            gas,
            Some(&mut errmsg),
            ByteSliceView::new(b"session-2"),
            ByteSliceView::new(sender.as_bytes()),
            ByteSliceView::new(message),
        );
        collect(ret, errmsg)
    }

    fn run_query(host: &MockHost, message: &[u8], gas: u64) -> Outcome {
        let mut errmsg = UnmanagedVector::default();
        let ret = query_contract(
            host.db(),
            host.api(),
            host.querier(),
            false,
            gas,
            Some(&mut errmsg),
            ByteSliceView::new(message),
        );
        collect(ret, errmsg)
    }

    /// Host with the counter module already published under `sender()`.
    fn host_with_counter() -> MockHost {
        let host = MockHost::new();
        run_publish(&host, sender(), GAS).expect_success();
        host
    }

    // =============================================================================
    // INITIALIZE / PUBLISH
    // =============================================================================

    #[test]
    fn test_initialize_genesis_bundle() {
        let host = MockHost::new();
        let outcome = run_initialize(&host, ByteSliceView::new(&genesis_bundle_bytes()));
        outcome.expect_success();
        // empty marker result
        assert!(outcome.result.is_empty());
        // the framework module landed in host storage
        assert_eq!(host.store.borrow().len(), 1);
        let key = host.store.borrow().keys().next().unwrap().clone();
        assert!(String::from_utf8_lossy(&key).starts_with("0x1/code/"));
    }

    #[test]
    fn test_initialize_corrupt_bundle() {
        let host = MockHost::new();
        let outcome = run_initialize(&host, ByteSliceView::new(&[0xde, 0xad, 0xbe, 0xef]));
        let msg = outcome.expect_failure(ErrnoValue::Other);
        assert!(msg.contains("decode"), "unexpected message: {msg}");
        assert!(host.store.borrow().is_empty());
    }

    #[test]
    fn test_initialize_nil_bundle_is_unset_arg() {
        let host = MockHost::new();
        let outcome = run_initialize(&host, ByteSliceView::nil());
        let msg = outcome.expect_failure(ErrnoValue::Other);
        assert!(msg.contains("module_bundle"), "unexpected message: {msg}");
    }

    #[test]
    fn test_publish_module_success() {
        let host = MockHost::new();
        let outcome = run_publish(&host, sender(), GAS);
        outcome.expect_success();

        let doc = outcome.result_json();
        assert_eq!(doc["status"], "executed");
        assert!(doc["gas_used"].as_u64().unwrap() > 0);
        // one size delta for the sender's new code entry
        assert_eq!(doc["size_deltas"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_publish_module_zero_gas() {
        let host = MockHost::new();
        let outcome = run_publish(&host, sender(), 0);
        let msg = outcome.expect_failure(ErrnoValue::OutOfGas);
        assert!(msg.contains("gas"), "unexpected message: {msg}");
        // nothing was stored: the module must not be queryable afterwards
        assert!(host.store.borrow().is_empty());
        let query = run_query(&host, &entry_message(sender(), "has_counter", vec![Value::Address(sender())]), GAS);
        query.expect_failure(ErrnoValue::Other);
    }

    #[test]
    fn test_publish_malformed_sender() {
        let host = MockHost::new();
        let module_bytes = counter_module_bytes();
        let mut errmsg = UnmanagedVector::default();
        let ret = publish_module(
            host.db(),
            false,
            GAS,
            Some(&mut errmsg),
            ByteSliceView::new(b"short"),
            ByteSliceView::new(&module_bytes),
        );
        let outcome = collect(ret, errmsg);
        let msg = outcome.expect_failure(ErrnoValue::Other);
        assert!(msg.contains("invalid argument"), "unexpected message: {msg}");
    }

    // =============================================================================
    // EXECUTION
    // =============================================================================

    #[test]
    fn test_execute_contract_publishes_resource() {
        let host = host_with_counter();
        let outcome = run_execute(&host, &entry_message(sender(), "create", vec![Value::U64(7)]), GAS);
        outcome.expect_success();
        assert_eq!(outcome.result_json()["status"], "executed");

        // the resource is now decodable through the boundary
        let tag = StructTag::parse(&format!("{}::counter::Counter", sender())).unwrap();
        let resource_key = AccessPath::resource(sender(), &tag).to_key();
        let resource_bytes = host.store.borrow().get(&resource_key).cloned().unwrap();

        let mut errmsg = UnmanagedVector::default();
        let tag_str = tag.to_string();
        let ret = decode_move_resource(
            host.db(),
            Some(&mut errmsg),
            ByteSliceView::new(tag_str.as_bytes()),
            ByteSliceView::new(&resource_bytes),
        );
        let decoded = collect(ret, errmsg);
        decoded.expect_success();
        let doc = decoded.result_json();
        assert_eq!(doc["data"]["value"], 7);
    }

    #[test]
    fn test_execute_twice_hits_resource_collision() {
        let host = host_with_counter();
        let message = entry_message(sender(), "create", vec![Value::U64(1)]);
        run_execute(&host, &message, GAS).expect_success();
        let outcome = run_execute(&host, &message, GAS);
        let msg = outcome.expect_failure(ErrnoValue::Other);
        assert!(msg.contains("already exists"), "unexpected message: {msg}");
    }

    #[test]
    fn test_execute_emits_events() {
        let host = host_with_counter();
        let message = entry_message(
            sender(),
            "record",
            vec![
                Value::Bytes(b"k".to_vec()),
                Value::Bytes(b"payload".to_vec()),
            ],
        );
        let outcome = run_execute(&host, &message, GAS);
        outcome.expect_success();

        let doc = outcome.result_json();
        let events = doc["events"].as_array().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["sequence_number"], 0);
        assert_eq!(events[0]["data"], hex::encode(b"payload"));
    }

    #[test]
    fn test_execute_gas_bounded_termination() {
        let host = host_with_counter();
        let outcome = run_execute(&host, &entry_message(sender(), "spin", vec![]), 50_000);
        outcome.expect_failure(ErrnoValue::OutOfGas);
    }

    #[test]
    fn test_execute_script_multiply() {
        let host = MockHost::new();
        let outcome = run_script(&host, &multiply_script_message(6, 7), GAS);
        outcome.expect_success();
        assert_eq!(outcome.result_json()["status"], "executed");
    }

    #[test]
    fn test_execute_script_reaches_querier() {
        let host = MockHost::new();
        *host.query_response.borrow_mut() = b"block-42".to_vec();
        let outcome = run_script(&host, &query_script_message(b"height"), GAS);
        outcome.expect_success();
        assert_eq!(outcome.result_json()["status"], "executed");
    }

    #[test]
    fn test_execute_unknown_module() {
        let host = MockHost::new();
        let outcome = run_execute(&host, &entry_message(sender(), "create", vec![Value::U64(1)]), GAS);
        let msg = outcome.expect_failure(ErrnoValue::Other);
        assert!(msg.contains("module not found"), "unexpected message: {msg}");
    }

    // =============================================================================
    // CALLBACK FAILURES
    // =============================================================================

    #[test]
    fn test_storage_read_user_error_surfaces() {
        let host = host_with_counter();
        *host.read_failure.borrow_mut() =
            Some(ScriptedFailure::new(GoError::User, "db closed"));
        let outcome = run_execute(&host, &entry_message(sender(), "create", vec![Value::U64(1)]), GAS);
        let msg = outcome.expect_failure(ErrnoValue::Other);
        assert!(msg.contains("db closed"), "unexpected message: {msg}");
    }

    #[test]
    fn test_callback_out_of_gas_is_top_level_out_of_gas() {
        let host = host_with_counter();
        *host.read_failure.borrow_mut() = Some(ScriptedFailure::bare(GoError::OutOfGas));
        let outcome = run_execute(&host, &entry_message(sender(), "create", vec![Value::U64(1)]), GAS);
        outcome.expect_failure(ErrnoValue::OutOfGas);
    }

    #[test]
    fn test_unknown_callback_code_falls_back() {
        let host = host_with_counter();
        *host.read_failure.borrow_mut() = Some(ScriptedFailure {
            code: 77,
            msg: Some("strange".to_string()),
        });
        let outcome = run_execute(&host, &entry_message(sender(), "create", vec![Value::U64(1)]), GAS);
        let msg = outcome.expect_failure(ErrnoValue::Other);
        assert!(msg.contains("strange"), "unexpected message: {msg}");
    }

    #[test]
    fn test_bank_transfer_through_boundary() {
        let host = host_with_counter();
        let recipient = AccountAddress::new([0x77; 32]);
        let message = entry_message(
            sender(),
            "pay",
            vec![Value::Address(recipient), Value::U128(1_000)],
        );
        run_execute(&host, &message, GAS).expect_success();

        let transfers = host.transfers.borrow();
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].0, sender().as_bytes().to_vec());
        assert_eq!(transfers[0].1, recipient.as_bytes().to_vec());
        assert_eq!(transfers[0].2, 1_000);
    }

    #[test]
    fn test_bank_transfer_failure_surfaces() {
        let host = host_with_counter();
        *host.transfer_failure.borrow_mut() =
            Some(ScriptedFailure::new(GoError::User, "insufficient funds"));
        let message = entry_message(
            sender(),
            "pay",
            vec![Value::Address(AccountAddress::ZERO), Value::U128(1)],
        );
        let outcome = run_execute(&host, &message, GAS);
        let msg = outcome.expect_failure(ErrnoValue::Other);
        assert!(msg.contains("insufficient funds"), "unexpected message: {msg}");
    }

    // =============================================================================
    // QUERIES
    // =============================================================================

    #[test]
    fn test_query_returns_encoded_value() {
        let host = host_with_counter();
        let message = entry_message(sender(), "has_counter", vec![Value::Address(sender())]);
        let outcome = run_query(&host, &message, GAS);
        outcome.expect_success();
        let value: Value = bincode::deserialize(&outcome.result).unwrap();
        assert_eq!(value, Value::Bool(false));
    }

    #[test]
    fn test_query_missing_storage_key_is_not_an_error() {
        let host = host_with_counter();
        let message = entry_message(sender(), "lookup", vec![Value::Bytes(b"absent".to_vec())]);
        let outcome = run_query(&host, &message, GAS);
        outcome.expect_success();
        let value: Value = bincode::deserialize(&outcome.result).unwrap();
        assert_eq!(value, Value::Bool(false));
    }

    #[test]
    fn test_query_leaves_storage_byte_identical() {
        let host = host_with_counter();
        run_execute(&host, &entry_message(sender(), "create", vec![Value::U64(3)]), GAS)
            .expect_success();
        let before = host.store_snapshot();
        let reads_before = host.reads_seen.get();

        let message = entry_message(sender(), "has_counter", vec![Value::Address(sender())]);
        run_query(&host, &message, GAS).expect_success();

        assert_eq!(host.store_snapshot(), before);
        // callbacks did fire, the state just never changed
        assert!(host.reads_seen.get() > reads_before);
    }

    #[test]
    fn test_query_rejects_mutation() {
        let host = host_with_counter();
        let message = entry_message(sender(), "create", vec![Value::U64(1)]);
        let outcome = run_query(&host, &message, GAS);
        let msg = outcome.expect_failure(ErrnoValue::Other);
        assert!(msg.contains("read-only"), "unexpected message: {msg}");
    }

    #[test]
    fn test_query_reaches_external_querier() {
        let host = host_with_counter();
        *host.query_response.borrow_mut() = b"pong".to_vec();
        let message = entry_message(sender(), "probe", vec![Value::Bytes(b"ping".to_vec())]);
        let outcome = run_query(&host, &message, GAS);
        outcome.expect_success();
        let value: Value = bincode::deserialize(&outcome.result).unwrap();
        assert_eq!(value, Value::Bytes(b"pong".to_vec()));
    }

    // =============================================================================
    // DECODERS AND VERSION
    // =============================================================================

    #[test]
    fn test_decode_module_bytes_roundtrip() {
        let module_bytes = counter_module_bytes();
        let mut errmsg = UnmanagedVector::default();
        let ret = decode_module_bytes(Some(&mut errmsg), ByteSliceView::new(&module_bytes));
        let outcome = collect(ret, errmsg);
        outcome.expect_success();

        let doc = outcome.result_json();
        assert_eq!(doc["name"], "counter");
        assert_eq!(doc["structs"][0]["name"], "Counter");
        let functions = doc["functions"].as_array().unwrap();
        assert!(functions.iter().any(|f| f["name"] == "create"));
    }

    #[test]
    fn test_decode_module_bytes_truncated() {
        let mut module_bytes = counter_module_bytes();
        module_bytes.truncate(module_bytes.len() / 3);
        let mut errmsg = UnmanagedVector::default();
        let ret = decode_module_bytes(Some(&mut errmsg), ByteSliceView::new(&module_bytes));
        let outcome = collect(ret, errmsg);
        let msg = outcome.expect_failure(ErrnoValue::Other);
        assert!(msg.contains("decode"), "unexpected message: {msg}");
    }

    #[test]
    fn test_decode_script_bytes() {
        let message = multiply_script_message(2, 3);
        // the script unit is nested in the message; decode the unit itself
        let script: basalt_types::ScriptMessage = bincode::deserialize(&message).unwrap();
        let script_bytes = bincode::serialize(&script.script).unwrap();

        let mut errmsg = UnmanagedVector::default();
        let ret = decode_script_bytes(Some(&mut errmsg), ByteSliceView::new(&script_bytes));
        let outcome = collect(ret, errmsg);
        outcome.expect_success();
        assert_eq!(outcome.result_json()["code"][2], "mul");
    }

    #[test]
    fn test_decode_resource_unknown_module() {
        let host = MockHost::new();
        let mut errmsg = UnmanagedVector::default();
        let ret = decode_move_resource(
            host.db(),
            Some(&mut errmsg),
            ByteSliceView::new(b"0x1::ghost::Thing"),
            ByteSliceView::new(&[]),
        );
        let outcome = collect(ret, errmsg);
        let msg = outcome.expect_failure(ErrnoValue::Other);
        assert!(msg.contains("module not found"), "unexpected message: {msg}");
    }

    #[test]
    fn test_version_str_is_c_string() {
        let version = unsafe { CStr::from_ptr(version_str()) };
        let text = version.to_str().unwrap();
        assert!(!text.is_empty());
        assert!(text.chars().next().unwrap().is_ascii_digit());
    }
}
