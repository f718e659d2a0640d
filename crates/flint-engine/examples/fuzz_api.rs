//! Registers a two-callable banking API and drives it with canned byte
//! streams, printing how each outcome is classified. Run with
//! `RUST_LOG=flint=debug` to watch the generation plans.

use std::sync::Arc;

use flint_engine::{Autofuzz, EngineConfig, Fault};
use flint_model::{CallError, Callable, Schema, TypeId, Value};
use flint_provider::ByteStream;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut schema = Schema::new();
    let account = schema.declare_class("Account")?;
    schema.add_constructor(Callable::constructor(
        account,
        vec![TypeId::LONG],
        move |_, args| match args[0] {
            Value::Long(balance) => Ok(Value::object(account, balance.max(0))),
            _ => Err(CallError::shape("expected a long balance")),
        },
    ))?;
    schema.add_method(Callable::method(
        account,
        "withdraw",
        vec![TypeId::LONG],
        Some(TypeId::LONG),
        |receiver, args| {
            let balance = receiver
                .and_then(|r| r.downcast_ref::<i64>())
                .copied()
                .ok_or_else(|| CallError::shape("receiver is not an account"))?;
            match args[0] {
                Value::Long(amount) if amount < 0 => panic!("negative withdrawal: {amount}"),
                Value::Long(amount) if amount > balance => Err(CallError::raised(format!(
                    "insufficient funds: {amount} > {balance}"
                ))),
                Value::Long(amount) => Ok(Value::Long(balance - amount)),
                _ => Err(CallError::shape("expected a long amount")),
            }
        },
    ))?;

    let engine = Autofuzz::with_config(
        Arc::new(schema),
        EngineConfig {
            log_plans: true,
            ..EngineConfig::default()
        },
    );
    let withdraw = engine
        .schema()
        .find_method(account, "withdraw")
        .ok_or_else(|| anyhow::anyhow!("withdraw not registered"))?
        .clone();

    let inputs: &[(&str, Vec<u8>)] = &[
        ("withdraw 40 from 100", canned(40, 100)),
        ("withdraw 40 from 10", canned(40, 10)),
        ("withdraw -1 from 10", canned(-1, 10)),
        ("empty stream", Vec::new()),
    ];
    for (label, bytes) in inputs {
        let mut data = ByteStream::new(bytes);
        match engine.run_callable(&mut data, &withdraw) {
            Ok(value) => println!("{label}: returned {value:?}"),
            Err(Fault::Target(err)) => {
                println!("{label}: finding at `{}`: {}", err.location(), err.cause());
            }
            Err(fault) => println!("{label}: not reachable with this input ({fault})"),
        }
    }
    Ok(())
}

/// The stream is read from the back for integral arguments: the balance
/// (receiver) first, then the amount.
fn canned(amount: i64, balance: i64) -> Vec<u8> {
    let mut bytes = amount.to_le_bytes().to_vec();
    bytes.extend_from_slice(&balance.to_le_bytes());
    bytes
}
