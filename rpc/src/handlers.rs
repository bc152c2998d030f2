//! RPC request types and dispatch onto the shared ledger.

use std::collections::BTreeMap;

use buidl_ledger::SharedLedger;
use buidl_types::{AccountId, AmountError, TokenAmount};
use buidl_utils::StatsCounter;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::RpcError;

// ── Amount decoding ──────────────────────────────────────────────────────

/// Largest magnitude at which every integer is exactly representable as `f64`.
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0; // 2^53

/// An amount exactly as the caller sent it: a JSON number or a decimal string.
///
/// JSON integers beyond the u64 range arrive as `f64` and may already be
/// rounded, so floats above 2^53 are refused. Send large amounts as strings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawAmount(pub Value);

impl RawAmount {
    pub fn new(value: impl Into<Value>) -> Self {
        Self(value.into())
    }

    /// Convert into a ledger amount, rejecting negative and fractional values.
    pub fn decode(&self) -> Result<TokenAmount, AmountError> {
        match &self.0 {
            Value::Number(n) => {
                if let Some(raw) = n.as_u64() {
                    Ok(TokenAmount::from(raw))
                } else if let Some(raw) = n.as_i64() {
                    TokenAmount::try_from(raw)
                } else if let Some(raw) = n.as_f64() {
                    if raw.abs() > MAX_EXACT_FLOAT {
                        return Err(AmountError::ValueOutOfBounds {
                            value: n.to_string(),
                        });
                    }
                    TokenAmount::try_from(raw)
                } else {
                    Err(AmountError::Malformed(n.to_string()))
                }
            }
            Value::String(s) => s.parse(),
            other => Err(AmountError::Malformed(other.to_string())),
        }
    }
}

// ── Requests ─────────────────────────────────────────────────────────────

/// One ledger operation or query.
///
/// Acting identities (`caller`, `owner` on approve, `from`, `spender`) are
/// trusted as already authenticated by the transport.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RpcRequest {
    Mint {
        caller: AccountId,
        amount: RawAmount,
    },
    Burn {
        caller: AccountId,
        amount: RawAmount,
    },
    Approve {
        owner: AccountId,
        spender: AccountId,
        amount: RawAmount,
    },
    Transfer {
        from: AccountId,
        to: AccountId,
        amount: RawAmount,
    },
    TransferFrom {
        spender: AccountId,
        owner: AccountId,
        to: AccountId,
        amount: RawAmount,
    },
    TotalSupply,
    BalanceOf {
        account: AccountId,
    },
    Allowance {
        owner: AccountId,
        spender: AccountId,
    },
    TokenInfo,
    Stats,
}

impl RpcRequest {
    pub fn action(&self) -> &'static str {
        match self {
            RpcRequest::Mint { .. } => "mint",
            RpcRequest::Burn { .. } => "burn",
            RpcRequest::Approve { .. } => "approve",
            RpcRequest::Transfer { .. } => "transfer",
            RpcRequest::TransferFrom { .. } => "transfer_from",
            RpcRequest::TotalSupply => "total_supply",
            RpcRequest::BalanceOf { .. } => "balance_of",
            RpcRequest::Allowance { .. } => "allowance",
            RpcRequest::TokenInfo => "token_info",
            RpcRequest::Stats => "stats",
        }
    }

    fn is_mutation(&self) -> bool {
        matches!(
            self,
            RpcRequest::Mint { .. }
                | RpcRequest::Burn { .. }
                | RpcRequest::Approve { .. }
                | RpcRequest::Transfer { .. }
                | RpcRequest::TransferFrom { .. }
        )
    }
}

// ── Responses ────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TokenInfoResponse {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: String,
    pub owner: String,
    pub supply_policy: String,
    pub holders: usize,
    pub events: u64,
}

/// Successful result. Amounts are rendered as decimal strings.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RpcResponse {
    Applied {},
    Amount { amount: String },
    TokenInfo(TokenInfoResponse),
    Stats { counters: BTreeMap<String, u64> },
}

impl RpcResponse {
    fn amount(amount: TokenAmount) -> Self {
        RpcResponse::Amount {
            amount: amount.to_string(),
        }
    }
}

/// Wire envelope for a successful call: `{"ok": true, ...result}`.
#[derive(Debug, Serialize)]
pub struct RpcSuccess {
    pub ok: bool,
    #[serde(flatten)]
    pub result: RpcResponse,
}

impl From<RpcResponse> for RpcSuccess {
    fn from(result: RpcResponse) -> Self {
        Self { ok: true, result }
    }
}

// ── Dispatch ─────────────────────────────────────────────────────────────

const COUNTERS: [&str; 10] = [
    "mint.accepted",
    "mint.rejected",
    "burn.accepted",
    "burn.rejected",
    "approve.accepted",
    "approve.rejected",
    "transfer.accepted",
    "transfer.rejected",
    "transfer_from.accepted",
    "transfer_from.rejected",
];

/// Shared state behind every request: the ledger and per-operation counters.
pub struct RpcContext {
    pub ledger: SharedLedger,
    pub stats: StatsCounter,
}

impl RpcContext {
    pub fn new(ledger: SharedLedger) -> Self {
        Self {
            ledger,
            stats: StatsCounter::new(&COUNTERS),
        }
    }

    fn record(&self, action: &str, accepted: bool) {
        let outcome = if accepted { "accepted" } else { "rejected" };
        self.stats.increment(&format!("{action}.{outcome}"));
    }
}

/// Decode the request's amounts and apply it to the ledger.
///
/// Amounts are decoded before the ledger lock is taken, so an out-of-bounds
/// value never reaches the ledger.
pub fn dispatch(ctx: &RpcContext, request: RpcRequest) -> Result<RpcResponse, RpcError> {
    let action = request.action();
    let is_mutation = request.is_mutation();
    let result = apply(ctx, request);
    if is_mutation {
        ctx.record(action, result.is_ok());
    }
    match &result {
        Ok(_) => debug!(action, "rpc request applied"),
        Err(err) => debug!(action, kind = err.kind(), %err, "rpc request rejected"),
    }
    result
}

fn apply(ctx: &RpcContext, request: RpcRequest) -> Result<RpcResponse, RpcError> {
    let ledger = &ctx.ledger;
    let applied = RpcResponse::Applied {};
    match request {
        RpcRequest::Mint { caller, amount } => {
            let amount = amount.decode()?;
            ledger.mint(&caller, amount)?;
            Ok(applied)
        }
        RpcRequest::Burn { caller, amount } => {
            let amount = amount.decode()?;
            ledger.burn(&caller, amount)?;
            Ok(applied)
        }
        RpcRequest::Approve {
            owner,
            spender,
            amount,
        } => {
            let amount = amount.decode()?;
            ledger.approve(&owner, &spender, amount)?;
            Ok(applied)
        }
        RpcRequest::Transfer { from, to, amount } => {
            let amount = amount.decode()?;
            ledger.transfer(&from, &to, amount)?;
            Ok(applied)
        }
        RpcRequest::TransferFrom {
            spender,
            owner,
            to,
            amount,
        } => {
            let amount = amount.decode()?;
            ledger.transfer_from(&spender, &owner, &to, amount)?;
            Ok(applied)
        }
        RpcRequest::TotalSupply => Ok(RpcResponse::amount(ledger.total_supply())),
        RpcRequest::BalanceOf { account } => Ok(RpcResponse::amount(ledger.balance_of(&account))),
        RpcRequest::Allowance { owner, spender } => {
            Ok(RpcResponse::amount(ledger.allowance(&owner, &spender)))
        }
        RpcRequest::TokenInfo => Ok(RpcResponse::TokenInfo(ledger.with(|token| {
            TokenInfoResponse {
                name: token.name().to_string(),
                symbol: token.symbol().to_string(),
                decimals: token.decimals(),
                total_supply: token.total_supply().to_string(),
                owner: token.owner().to_string(),
                supply_policy: token.params().supply_policy.as_str().to_string(),
                holders: token.holder_count(),
                events: token.events_published(),
            }
        }))),
        RpcRequest::Stats => Ok(RpcResponse::Stats {
            counters: ctx
                .stats
                .snapshot()
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buidl_ledger::{Ledger, LedgerError};
    use serde_json::json;

    const OWNER: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
    const RANDOM: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
    const ANOTHER: &str = "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC";

    fn context() -> RpcContext {
        let ledger = Ledger::new(TokenAmount::new(1000), AccountId::new(OWNER));
        RpcContext::new(SharedLedger::new(ledger))
    }

    fn call(ctx: &RpcContext, body: Value) -> Result<RpcResponse, RpcError> {
        let request: RpcRequest = serde_json::from_value(body).expect("valid request json");
        dispatch(ctx, request)
    }

    fn amount_of(response: RpcResponse) -> String {
        match response {
            RpcResponse::Amount { amount } => amount,
            other => panic!("expected amount response, got {other:?}"),
        }
    }

    #[test]
    fn decode_accepts_numbers_and_strings() {
        assert_eq!(RawAmount::new(10).decode().unwrap(), TokenAmount::new(10));
        assert_eq!(RawAmount::new("10").decode().unwrap(), TokenAmount::new(10));
        assert_eq!(RawAmount::new(10.0).decode().unwrap(), TokenAmount::new(10));
        assert_eq!(
            RawAmount::new(u128::MAX.to_string()).decode().unwrap(),
            TokenAmount::MAX
        );
    }

    #[test]
    fn decode_rejects_negative_and_fractional_as_out_of_bounds() {
        for raw in [json!(-1), json!("-1"), json!(0.5), json!("2.5"), json!(-1.0)] {
            let err = RawAmount(raw.clone()).decode().unwrap_err();
            assert!(
                matches!(err, AmountError::ValueOutOfBounds { .. }),
                "{raw} should be out of bounds"
            );
        }
    }

    #[test]
    fn decode_rejects_integers_beyond_u64_sent_as_numbers() {
        let request: RpcRequest = serde_json::from_str(
            r#"{"action":"mint","caller":"0xo","amount":18446744073709551617}"#,
        )
        .unwrap();
        let RpcRequest::Mint { amount, .. } = request else {
            panic!("expected mint request");
        };
        assert!(matches!(
            amount.decode(),
            Err(AmountError::ValueOutOfBounds { .. })
        ));

        let ctx = context();
        let err = call(&ctx, json!({"action": "mint", "caller": OWNER, "amount": 1e20})).unwrap_err();
        assert_eq!(err.kind(), "value_out_of_bounds");
        assert_eq!(ctx.ledger.total_supply(), TokenAmount::new(1000));

        // The same value as a string is exact.
        assert_eq!(
            RawAmount::new("18446744073709551617").decode().unwrap(),
            TokenAmount::new(18_446_744_073_709_551_617)
        );
        assert_eq!(
            RawAmount::new(9_007_199_254_740_992.0).decode().unwrap(),
            TokenAmount::new(9_007_199_254_740_992)
        );
    }

    #[test]
    fn negative_zero_decodes_as_zero_on_every_path() {
        for raw in [json!(-0.0), json!("-0"), json!("-0.00")] {
            assert_eq!(RawAmount(raw).decode().unwrap(), TokenAmount::ZERO);
        }
    }

    #[test]
    fn decode_rejects_non_numeric_as_malformed() {
        for raw in [json!(null), json!(true), json!("ten"), json!([1]), json!({"n": 1})] {
            let err = RawAmount(raw.clone()).decode().unwrap_err();
            assert!(matches!(err, AmountError::Malformed(_)), "{raw} should be malformed");
        }
    }

    #[test]
    fn requests_parse_by_action_tag() {
        let request: RpcRequest = serde_json::from_value(json!({
            "action": "transfer_from",
            "spender": RANDOM,
            "owner": OWNER,
            "to": ANOTHER,
            "amount": "10",
        }))
        .unwrap();
        assert_eq!(request.action(), "transfer_from");
        assert_eq!(
            request,
            RpcRequest::TransferFrom {
                spender: AccountId::new(RANDOM),
                owner: AccountId::new(OWNER),
                to: AccountId::new(ANOTHER),
                amount: RawAmount::new("10"),
            }
        );

        let request: RpcRequest = serde_json::from_value(json!({"action": "total_supply"})).unwrap();
        assert_eq!(request, RpcRequest::TotalSupply);
    }

    #[test]
    fn negative_mint_never_reaches_ledger() {
        let ctx = context();
        let err = call(&ctx, json!({"action": "mint", "caller": OWNER, "amount": -1})).unwrap_err();
        assert_eq!(err.kind(), "value_out_of_bounds");
        assert_eq!(ctx.ledger.total_supply(), TokenAmount::new(1000));
        assert_eq!(ctx.stats.get("mint.rejected"), 1);
    }

    #[test]
    fn mint_then_query_total_supply() {
        let ctx = context();
        let response = call(&ctx, json!({"action": "mint", "caller": OWNER, "amount": 10})).unwrap();
        assert_eq!(response, RpcResponse::Applied {});

        let supply = call(&ctx, json!({"action": "total_supply"})).unwrap();
        assert_eq!(amount_of(supply), "1010");
    }

    #[test]
    fn burn_without_balance_is_ledger_rejection() {
        let ctx = context();
        let err = call(&ctx, json!({"action": "burn", "caller": RANDOM, "amount": 100})).unwrap_err();
        assert!(matches!(
            err,
            RpcError::Ledger(LedgerError::InsufficientBalance { .. })
        ));
        assert_eq!(err.kind(), "insufficient_balance");
    }

    #[test]
    fn delegated_transfer_round_trip() {
        let ctx = context();
        call(
            &ctx,
            json!({"action": "approve", "owner": OWNER, "spender": RANDOM, "amount": 10}),
        )
        .unwrap();
        call(
            &ctx,
            json!({"action": "transfer_from", "spender": RANDOM, "owner": OWNER, "to": ANOTHER, "amount": 10}),
        )
        .unwrap();

        let allowance =
            call(&ctx, json!({"action": "allowance", "owner": OWNER, "spender": RANDOM})).unwrap();
        assert_eq!(amount_of(allowance), "0");
        let balance = call(&ctx, json!({"action": "balance_of", "account": ANOTHER})).unwrap();
        assert_eq!(amount_of(balance), "10");
        let balance = call(&ctx, json!({"action": "balance_of", "account": OWNER})).unwrap();
        assert_eq!(amount_of(balance), "990");
    }

    #[test]
    fn token_info_reports_metadata() {
        let ctx = context();
        match call(&ctx, json!({"action": "token_info"})).unwrap() {
            RpcResponse::TokenInfo(info) => {
                assert_eq!(info.symbol, "BUIDL");
                assert_eq!(info.decimals, 18);
                assert_eq!(info.total_supply, "1000");
                assert_eq!(info.owner, OWNER);
                assert_eq!(info.supply_policy, "open");
                assert_eq!(info.holders, 1);
                assert_eq!(info.events, 0);
            }
            other => panic!("expected token info, got {other:?}"),
        }
    }

    #[test]
    fn stats_count_accepted_and_rejected_mutations() {
        let ctx = context();
        call(&ctx, json!({"action": "transfer", "from": OWNER, "to": RANDOM, "amount": 10})).unwrap();
        call(&ctx, json!({"action": "transfer", "from": OWNER, "to": RANDOM, "amount": 1001}))
            .unwrap_err();
        call(&ctx, json!({"action": "balance_of", "account": RANDOM})).unwrap();

        match call(&ctx, json!({"action": "stats"})).unwrap() {
            RpcResponse::Stats { counters } => {
                assert_eq!(counters["transfer.accepted"], 1);
                assert_eq!(counters["transfer.rejected"], 1);
                assert_eq!(counters["mint.accepted"], 0);
                assert_eq!(counters.len(), 10);
            }
            other => panic!("expected stats, got {other:?}"),
        }
    }

    #[test]
    fn success_envelope_flattens_result() {
        let value = serde_json::to_value(RpcSuccess::from(RpcResponse::amount(TokenAmount::new(5))))
            .unwrap();
        assert_eq!(value, json!({"ok": true, "amount": "5"}));

        let value = serde_json::to_value(RpcSuccess::from(RpcResponse::Applied {})).unwrap();
        assert_eq!(value, json!({"ok": true}));
    }
}
