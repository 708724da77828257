mod common;

use alloy::primitives::U256;

use ember_wallet_core::{
    chain_entry, BalanceGate, BalanceObserver, ClientKey, ClientManager, ClientState,
    SubmissionController, MEGAETH_TESTNET, SETTER_FUNCTION, SETTER_TEST_VALUE,
};

use common::{dead_hash, test_address, MockBalance, MockFactory, MockSession};

#[tokio::test]
async fn funded_wallet_sends_zero_value_transfer_to_itself() {
    let session = MockSession::connected(test_address(), MEGAETH_TESTNET);
    let balance = MockBalance::default();
    balance.set(
        test_address(),
        MEGAETH_TESTNET,
        U256::from(1_000_000_000_000_000_000u128),
        "1.0",
    );
    let observer = BalanceObserver::new(balance);

    let key = ClientKey {
        address: test_address(),
        chain_id: MEGAETH_TESTNET,
    };
    let gate = observer.observe(Some(key)).await;
    assert_eq!(gate, BalanceGate::Funded);
    assert!(gate.allows_submission());
    let snapshot = observer.snapshot().expect("snapshot");
    assert_eq!(snapshot.formatted, "1.0");
    assert_eq!(snapshot.symbol, "ETH");

    session.push_transfer_result(Ok(dead_hash()));
    let controller = SubmissionController::new();
    let hash = controller
        .send_self_transfer(&session)
        .await
        .expect("transfer");

    assert_eq!(hash, dead_hash());
    assert_eq!(session.sent(), vec![(test_address(), U256::ZERO)]);
    let state = controller.transfer_state();
    assert!(!state.busy);
    assert_eq!(state.last_result_id, Some(dead_hash()));
}

#[tokio::test]
async fn ready_client_writes_setter_with_registry_parameters() {
    let session = MockSession::connected(test_address(), MEGAETH_TESTNET);
    let factory = MockFactory::default();
    let manager = ClientManager::new(factory.clone());
    assert_eq!(manager.refresh(&session).await, ClientState::Ready);

    let controller = SubmissionController::new();
    let hash = controller
        .write_setter_contract(manager.client())
        .await
        .expect("contract write");

    let chain = chain_entry(MEGAETH_TESTNET).expect("registry entry");
    let calls = factory.client_script().recorded();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].account, test_address());
    assert_eq!(calls[0].contract, chain.setter_address);
    assert_eq!(calls[0].function, SETTER_FUNCTION);
    assert_eq!(calls[0].args, vec![SETTER_TEST_VALUE.to_owned()]);
    assert_eq!(calls[0].chain_id, MEGAETH_TESTNET);

    let state = controller.contract_state();
    assert!(!state.busy);
    assert_eq!(state.last_result_id, Some(hash));
    assert!(chain.tx_url(hash).contains("megaexplorer"));
}
