use alloy_primitives::{address, Address};
use alloy_sol_types::sol;

/// The L2 predeploy withdrawals are initiated through.
pub const L2_TO_L1_MESSAGE_PASSER: Address = address!("0x4200000000000000000000000000000000000016");

sol! {
    /// A withdrawal as recorded on L2 and executed on L1.
    #[derive(Debug, PartialEq, Eq)]
    struct WithdrawalTransaction {
        uint256 nonce;
        address sender;
        address target;
        uint256 value;
        uint256 gasLimit;
        bytes data;
    }

    /// The preimage of an L2 output root.
    #[derive(Debug, PartialEq, Eq)]
    struct OutputRootProof {
        bytes32 version;
        bytes32 stateRoot;
        bytes32 withdrawerStorageRoot;
        bytes32 latestBlockhash;
    }

    /// An L2 output proposed to L1.
    #[derive(Debug, PartialEq, Eq)]
    struct OutputProposal {
        bytes32 outputRoot;
        uint256 timestamp;
    }

    /// The L1 entrypoint of deposits and withdrawals.
    #[derive(Debug)]
    interface OptimismPortal {
        function depositTransaction(
            address _to,
            uint256 _value,
            uint64 _gasLimit,
            bool _isCreation,
            bytes memory _data
        ) external payable;

        function finalizeWithdrawalTransaction(
            WithdrawalTransaction memory _tx,
            uint256 _l2BlockNumber,
            OutputRootProof calldata _outputRootProof,
            bytes calldata _withdrawalProof
        ) external;

        function FINALIZATION_PERIOD_SECONDS() external view returns (uint256);
    }

    /// The L1 contract L2 outputs are proposed to.
    #[derive(Debug)]
    interface L2OutputOracle {
        function SUBMISSION_INTERVAL() external view returns (uint256);

        function latestBlockNumber() external view returns (uint256);

        function getL2Output(uint256 _l2BlockNumber) external view returns (OutputProposal memory);
    }

    /// The L2 predeploy that records withdrawals.
    #[derive(Debug)]
    interface L2ToL1MessagePasser {
        event WithdrawalInitiated(
            uint256 indexed nonce,
            address indexed sender,
            address indexed target,
            uint256 value,
            uint256 gasLimit,
            bytes data
        );

        function initiateWithdrawal(address _target, uint256 _gasLimit, bytes memory _data) external payable;
    }
}
