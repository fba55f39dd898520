use super::confirm;
use crate::{TestSpec, Transport};
use alloy_primitives::U256;
use alloy_provider::Provider;
use devnet_primitives::SequencerDevnetParams;
use std::time::Duration;
use tracing::info;

const DEPOSIT_GAS_LIMIT: u64 = 1_000_000;
const DEPOSIT_CONFIRMATIONS: u64 = 2;
const WITHDRAWAL_GAS_LIMIT: u64 = 21_000;
const CREDIT_TIMEOUT: Duration = Duration::from_secs(120);
const FINALIZATION_TIMEOUT: Duration = Duration::from_secs(300);

/// Deposits to L2, withdraws part of it back and finalizes the withdrawal on L1 once the output
/// covering it is past its finalization period.
pub fn simple_withdrawal() -> TestSpec {
    TestSpec::new(
        "simple withdrawal",
        "withdraws part of a deposit back to L1 once its output is final",
        Transport::Http,
        |mut env| async move {
            let ether = U256::from(10).pow(U256::from(18));
            let mint = ether / U256::from(2);
            let amount = ether / U256::from(4);

            let devnet = env.devnet();
            let depositor = devnet.l1_vault().await?.create_account(ether).await?;
            let receipt = devnet.deposit(0, depositor, mint, DEPOSIT_GAS_LIMIT).await?;
            confirm(env.l1(), receipt.transaction_hash, DEPOSIT_CONFIRMATIONS).await?;

            let l2 = env.l2().clone();
            env.within(CREDIT_TIMEOUT, async {
                loop {
                    if l2.get_balance(depositor).await? == mint {
                        return Ok::<_, eyre::Report>(())
                    }
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            })
            .await??;
            info!(target: "devnet::runner", %depositor, %mint, "deposit credited");

            let devnet = env.devnet();
            let initiated = devnet.initiate_withdrawal(0, depositor, amount, WITHDRAWAL_GAS_LIMIT).await?;
            let l2_balance = env.l2().get_balance(depositor).await?;
            eyre::ensure!(
                l2_balance <= mint - amount,
                "L2 balance {l2_balance} not debited by the withdrawal of {amount}"
            );
            let l2_block = initiated
                .block_number
                .ok_or_else(|| eyre::eyre!("withdrawal receipt without block number"))?;

            let output_block =
                devnet.wait_for_finalization_period(0, l2_block, FINALIZATION_TIMEOUT).await?;
            let before = env.l1().get_balance(depositor).await?;
            let finalized = devnet
                .finalize_withdrawal(0, 0, depositor, initiated.transaction_hash, output_block)
                .await?;
            let after = env.l1().get_balance(depositor).await?;

            let fee = U256::from(finalized.gas_used) * U256::from(finalized.effective_gas_price);
            eyre::ensure!(
                after + fee == before + amount,
                "L1 balance went from {before} to {after}, expected {amount} minus a fee of {fee}"
            );
            info!(target: "devnet::runner", %depositor, %amount, output_block, "withdrawal finalized");
            Ok(())
        },
    )
    .with_params(SequencerDevnetParams::new(120, 120, 30))
}
