use crate::contracts::{
    L2ToL1MessagePasser::WithdrawalInitiated, OutputRootProof, WithdrawalTransaction,
    L2_TO_L1_MESSAGE_PASSER,
};
use alloy_primitives::{keccak256, Bytes, Log, B256, U256};
use alloy_sol_types::{SolEvent, SolValue};

impl WithdrawalTransaction {
    /// Returns the hash the message passer records the withdrawal under.
    pub fn hash(&self) -> B256 {
        keccak256(
            (self.nonce, self.sender, self.target, self.value, self.gasLimit, self.data.clone())
                .abi_encode_params(),
        )
    }

    /// Returns the message passer storage slot that marks the withdrawal as sent.
    pub fn storage_slot(&self) -> B256 {
        keccak256((self.hash(), U256::ZERO).abi_encode())
    }
}

impl From<WithdrawalInitiated> for WithdrawalTransaction {
    fn from(event: WithdrawalInitiated) -> Self {
        Self {
            nonce: event.nonce,
            sender: event.sender,
            target: event.target,
            value: event.value,
            gasLimit: event.gasLimit,
            data: event.data,
        }
    }
}

impl OutputRootProof {
    /// Returns the proof of the output of the L2 block with `state_root` and `block_hash`, given
    /// the storage root of the message passer at that block.
    pub const fn new(state_root: B256, message_passer_storage_root: B256, block_hash: B256) -> Self {
        Self {
            version: B256::ZERO,
            stateRoot: state_root,
            withdrawerStorageRoot: message_passer_storage_root,
            latestBlockhash: block_hash,
        }
    }
}

/// Returns the withdrawal initiated by one of `logs`, if any.
pub(crate) fn withdrawal_from_logs<'a>(
    logs: impl IntoIterator<Item = &'a Log>,
) -> Option<WithdrawalTransaction> {
    logs.into_iter()
        .filter(|log| log.address == L2_TO_L1_MESSAGE_PASSER)
        .find_map(|log| WithdrawalInitiated::decode_log_data(&log.data).ok())
        .map(Into::into)
}

/// Returns the first L2 block at or after `l2_block` an output is proposed for, given the output
/// submission interval.
pub(crate) fn next_output_block(l2_block: u64, submission_interval: u64) -> u64 {
    if submission_interval == 0 {
        return l2_block
    }
    l2_block.div_ceil(submission_interval) * submission_interval
}

/// Encodes the storage proof nodes of a withdrawal as the RLP list the portal verifies.
pub(crate) fn encode_withdrawal_proof(nodes: &[Bytes]) -> Bytes {
    let nodes = nodes.iter().map(|node| node.as_ref()).collect::<Vec<&[u8]>>();
    let mut out = Vec::new();
    alloy_rlp::encode_list::<_, [u8]>(&nodes, &mut out);
    out.into()
}
