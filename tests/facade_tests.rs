//! Typed broker operations of the Deriv client against the mock broker.

mod support;

use derivgate::domain::{Balance, Basis, DurationUnit, Tick};
use derivgate::error::{Error, GatewayError};
use derivgate::port::outbound::broker::BrokerGateway;
use derivgate::testkit::domain::{
    authorize_payload, balance_payload, buy_payload, candles_payload, error_payload, tick_frame,
    trade_request,
};
use derivgate::testkit::transport::{client, MockServer};
use rust_decimal_macros::dec;
use serde_json::json;
use tokio::sync::mpsc;

use support::broker::connect;

fn broker_code(err: &Error) -> Option<&str> {
    match err {
        Error::Gateway(GatewayError::Broker { code, .. }) => code.as_deref(),
        _ => None,
    }
}

#[tokio::test]
async fn authorize_connects_and_decodes_identity() {
    let server = MockServer::new();
    let client = client(&server);

    let (auth, _conn) = tokio::join!(client.authorize("a1-token"), async {
        let mut conn = server.accept().await;
        let request = conn.recv_request().await;
        assert_eq!(request["authorize"], json!("a1-token"));
        assert_eq!(request["req_id"], json!(1));
        conn.respond(&request, authorize_payload("CR9000001"));
        conn
    });

    let auth = auth.unwrap();
    assert_eq!(auth.loginid, "CR9000001");
    assert_eq!(auth.user_id, Some(9_000_001));
    assert_eq!(auth.currency, "USD");
    assert!(!auth.is_virtual);
    assert_eq!(auth.account_list.len(), 2);
    assert!(auth.account_list[1].is_virtual);
    assert_eq!(auth.current_account().unwrap().loginid, "CR9000001");
}

#[tokio::test]
async fn invalid_token_surfaces_broker_error() {
    let server = MockServer::new();
    let client = client(&server);

    let (result, _conn) = tokio::join!(client.authorize("bad"), async {
        let mut conn = server.accept().await;
        let request = conn.recv_request().await;
        conn.respond(
            &request,
            error_payload("InvalidToken", "The token is invalid."),
        );
        conn
    });

    let err = result.unwrap_err();
    assert_eq!(broker_code(&err), Some("InvalidToken"));
    assert_eq!(err.to_string(), "broker error: The token is invalid.");
}

#[tokio::test]
async fn empty_token_is_rejected_locally() {
    let server = MockServer::new();
    let client = client(&server);

    let err = client.authorize("   ").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Gateway(GatewayError::InvalidRequest { field: "token", .. })
    ));
    assert_eq!(server.opened(), 0);
}

#[tokio::test]
async fn wrong_payload_kind_is_unexpected_response() {
    let server = MockServer::new();
    let client = client(&server);

    let (result, _conn) = tokio::join!(client.authorize("tok"), async {
        let mut conn = server.accept().await;
        let request = conn.recv_request().await;
        conn.respond(&request, json!({ "ping": "pong" }));
        conn
    });

    assert!(matches!(
        result,
        Err(Error::Gateway(GatewayError::UnexpectedResponse {
            expected: "authorize",
            ..
        }))
    ));
}

#[tokio::test]
async fn tick_subscription_delivers_every_tick_in_order() {
    let server = MockServer::new();
    let client = client(&server);
    let mut conn = connect(&client, &server).await;
    let (tx, mut rx) = mpsc::unbounded_channel::<Tick>();

    let (subscribed, ()) = tokio::join!(
        client.subscribe_ticks(
            "R_100",
            Box::new(move |tick| {
                let _ = tx.send(tick);
            })
        ),
        async {
            let request = conn.recv_request().await;
            assert_eq!(request["ticks"], json!("R_100"));
            assert_eq!(request["subscribe"], json!(1));
            conn.respond(&request, json!({ "subscription": { "id": "sub123" } }));
        }
    );
    let id = subscribed.unwrap();
    assert_eq!(id.as_str(), "sub123");

    conn.push(tick_frame("sub123", "R_100", 1234.5, 1_700_000_000));
    conn.push(tick_frame("sub123", "R_100", 1234.75, 1_700_000_001));
    conn.push(tick_frame("sub123", "R_100", 1234.25, 1_700_000_002));

    let mut quotes = Vec::new();
    for _ in 0..3 {
        let tick = rx.recv().await.unwrap();
        assert_eq!(tick.symbol, "R_100");
        quotes.push(tick.quote);
    }
    assert_eq!(quotes, vec![dec!(1234.5), dec!(1234.75), dec!(1234.25)]);

    assert!(client.unsubscribe(&id).await.unwrap());
    let forget = conn.recv_request().await;
    assert_eq!(forget["forget"], json!("sub123"));
}

#[tokio::test]
async fn balance_subscription_streams_updates() {
    let server = MockServer::new();
    let client = client(&server);
    let mut conn = connect(&client, &server).await;
    let (tx, mut rx) = mpsc::unbounded_channel::<Balance>();

    let (subscribed, ()) = tokio::join!(
        client.subscribe_balance(Box::new(move |balance| {
            let _ = tx.send(balance);
        })),
        async {
            let request = conn.recv_request().await;
            assert_eq!(request["balance"], json!(1));
            conn.respond(&request, balance_payload(100.0, Some("bal-1")));
        }
    );
    assert_eq!(subscribed.unwrap().as_str(), "bal-1");

    // The acknowledgement carries the current balance.
    assert_eq!(rx.recv().await.unwrap().balance, dec!(100));

    let mut update = balance_payload(90.5, Some("bal-1"));
    update["msg_type"] = json!("balance");
    conn.push(update);
    assert_eq!(rx.recv().await.unwrap().balance, dec!(90.5));
}

#[tokio::test]
async fn concurrent_trades_resolve_to_their_own_receipts() {
    let server = MockServer::new();
    let client = client(&server);
    let mut conn = connect(&client, &server).await;

    let rise = trade_request("R_100", dec!(10));
    let fall = trade_request("R_50", dec!(25));

    let (first, second, ()) = tokio::join!(
        client.place_trade(&rise),
        client.place_trade(&fall),
        async {
            let a = conn.recv_request().await;
            let b = conn.recv_request().await;
            for request in [&b, &a] {
                let contract_id = match request["symbol"].as_str() {
                    Some("R_100") => 1001,
                    Some("R_50") => 5001,
                    other => panic!("unexpected symbol {other:?}"),
                };
                conn.respond(request, buy_payload(contract_id, 19.5));
            }
        }
    );

    assert_eq!(first.unwrap().contract_id, 1001);
    let second = second.unwrap();
    assert_eq!(second.contract_id, 5001);
    assert_eq!(second.transaction_id, 105_001);
    assert_eq!(second.payout, dec!(19.5));
}

#[tokio::test]
async fn trade_request_is_framed_flat() {
    let server = MockServer::new();
    let client = client(&server);
    let mut conn = connect(&client, &server).await;

    let mut request = trade_request("R_100", dec!(10));
    request.basis = Basis::Payout;
    request.duration_unit = DurationUnit::Minutes;

    let (receipt, ()) = tokio::join!(client.place_trade(&request), async {
        let frame = conn.recv_request().await;
        assert_eq!(frame["buy"], json!(1));
        assert_eq!(frame["amount"].as_f64(), Some(10.0));
        assert_eq!(frame["basis"], json!("payout"));
        assert_eq!(frame["duration"], json!(5));
        assert_eq!(frame["duration_unit"], json!("m"));
        assert_eq!(frame["contract_type"], json!("CALL"));
        assert_eq!(frame["currency"], json!("USD"));
        conn.respond(&frame, buy_payload(42, 19.5));
    });
    assert_eq!(receipt.unwrap().contract_id, 42);
}

#[tokio::test]
async fn invalid_trade_is_rejected_before_sending() {
    let server = MockServer::new();
    let client = client(&server);

    let err = client
        .place_trade(&trade_request("R_100", dec!(0)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Gateway(GatewayError::InvalidRequest { field: "amount", .. })
    ));
    assert_eq!(server.opened(), 0);
}

#[tokio::test]
async fn balance_query_forgets_the_stream_it_opens() {
    let server = MockServer::new();
    let client = client(&server);
    let mut conn = connect(&client, &server).await;

    let (balance, ()) = tokio::join!(client.get_account_balance(), async {
        let request = conn.recv_request().await;
        assert_eq!(request["balance"], json!(1));
        assert_eq!(request["subscribe"], json!(1));
        conn.respond(&request, balance_payload(1234.5, Some("bal-orphan")));
    });

    let balance = balance.unwrap();
    assert_eq!(balance.balance, dec!(1234.5));
    assert_eq!(balance.currency, "USD");

    let forget = conn.recv_request().await;
    assert_eq!(forget["forget"], json!("bal-orphan"));
    assert_eq!(client.gateway().current().unwrap().subscriptions(), 0);
}

#[tokio::test]
async fn account_list_is_decoded() {
    let server = MockServer::new();
    let client = client(&server);
    let mut conn = connect(&client, &server).await;

    let (accounts, ()) = tokio::join!(client.get_account_list(), async {
        let request = conn.recv_request().await;
        assert_eq!(request["account_list"], json!(1));
        conn.respond(
            &request,
            json!({ "account_list": [
                { "loginid": "CR1", "currency": "USD", "is_virtual": 0 },
                { "loginid": "VRTC2", "currency": "USD", "is_virtual": 1, "is_disabled": 1 }
            ]}),
        );
    });

    let accounts = accounts.unwrap();
    assert_eq!(accounts.len(), 2);
    assert!(accounts[1].is_virtual);
    assert!(accounts[1].is_disabled);
}

#[tokio::test]
async fn switch_account_fills_in_requested_login() {
    let server = MockServer::new();
    let client = client(&server);
    let mut conn = connect(&client, &server).await;

    let (switched, ()) = tokio::join!(client.switch_account("VRTC9000002"), async {
        let request = conn.recv_request().await;
        assert_eq!(request["account_switch"], json!(1));
        assert_eq!(request["loginid"], json!("VRTC9000002"));
        conn.respond(&request, json!({ "account_switch": 1 }));
    });

    let switched = switched.unwrap();
    assert_eq!(switched.loginid.as_deref(), Some("VRTC9000002"));
    assert_eq!(switched.currency, None);
}

#[tokio::test]
async fn tick_history_requests_latest_candles() {
    let server = MockServer::new();
    let client = client(&server);
    let mut conn = connect(&client, &server).await;

    let (candles, ()) = tokio::join!(client.get_tick_history("R_100", 60), async {
        let request = conn.recv_request().await;
        assert_eq!(request["ticks_history"], json!("R_100"));
        assert_eq!(request["granularity"], json!(60));
        assert_eq!(request["count"], json!(100));
        assert_eq!(request["style"], json!("candles"));
        assert_eq!(request["end_type"], json!("latest"));
        assert_eq!(request["adjust_start_time"], json!(1));
        conn.respond(&request, candles_payload(3, 1_700_000_000));
    });

    let candles = candles.unwrap();
    assert_eq!(candles.len(), 3);
    assert_eq!(candles[2].epoch, 1_700_000_120);
    assert_eq!(candles[0].open, dec!(100));
    assert_eq!(candles[0].close, dec!(100.25));
}

#[tokio::test]
async fn unsupported_granularity_is_rejected_locally() {
    let server = MockServer::new();
    let client = client(&server);

    let err = client.get_tick_history("R_100", 7).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Gateway(GatewayError::InvalidRequest {
            field: "granularity",
            ..
        })
    ));
    assert_eq!(server.opened(), 0);
}

#[tokio::test]
async fn trading_assets_are_decoded() {
    let server = MockServer::new();
    let client = client(&server);
    let mut conn = connect(&client, &server).await;

    let (assets, ()) = tokio::join!(client.get_trading_assets(), async {
        let request = conn.recv_request().await;
        assert_eq!(request["active_symbols"], json!("brief"));
        conn.respond(
            &request,
            json!({ "active_symbols": [
                {
                    "symbol": "R_100",
                    "display_name": "Volatility 100 Index",
                    "market": "synthetic_index",
                    "exchange_is_open": 1,
                    "is_trading_suspended": 0,
                    "pip": 0.01
                },
                {
                    "symbol": "frxEURUSD",
                    "display_name": "EUR/USD",
                    "market": "forex",
                    "exchange_is_open": 0,
                    "is_trading_suspended": 0
                }
            ]}),
        );
    });

    let assets = assets.unwrap();
    assert_eq!(assets.len(), 2);
    assert!(assets[0].exchange_is_open);
    assert!(!assets[1].exchange_is_open);
    assert_eq!(assets[1].market.as_deref(), Some("forex"));
}

#[tokio::test]
async fn ping_round_trips() {
    let server = MockServer::new();
    let client = client(&server);

    let (pong, _conn) = tokio::join!(client.ping(), async {
        let mut conn = server.accept().await;
        let request = conn.recv_request().await;
        assert_eq!(request["ping"], json!(1));
        conn.respond(&request, json!({ "ping": "pong" }));
        conn
    });
    assert!(pong.is_ok());
    assert_eq!(client.broker_name(), "Deriv");
}

#[tokio::test]
async fn operations_reconnect_after_disconnect() {
    let server = MockServer::new();
    let client = client(&server);
    let _first = connect(&client, &server).await;

    client.disconnect().await;
    assert!(!client.gateway().is_connected());

    let (pong, _conn) = tokio::join!(client.ping(), async {
        let mut conn = server.accept().await;
        let request = conn.recv_request().await;
        conn.respond(&request, json!({ "ping": "pong" }));
        conn
    });
    assert!(pong.is_ok());
    assert_eq!(server.opened(), 2);
}
