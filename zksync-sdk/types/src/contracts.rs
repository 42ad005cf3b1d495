//! Solidity interfaces of the L1 and L2 contracts the SDK talks to. Only the
//! functions and events used by the bridging flows are declared.

use alloy_sol_types::sol;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    interface IBridgehub {
        struct L2TransactionRequestDirect {
            uint256 chainId;
            uint256 mintValue;
            address l2Contract;
            uint256 l2Value;
            bytes l2Calldata;
            uint256 l2GasLimit;
            uint256 l2GasPerPubdataByteLimit;
            bytes[] factoryDeps;
            address refundRecipient;
        }

        struct L2TransactionRequestTwoBridgesOuter {
            uint256 chainId;
            uint256 mintValue;
            uint256 l2Value;
            uint256 l2GasLimit;
            uint256 l2GasPerPubdataByteLimit;
            address refundRecipient;
            address secondBridgeAddress;
            uint256 secondBridgeValue;
            bytes secondBridgeCalldata;
        }

        function requestL2TransactionDirect(L2TransactionRequestDirect calldata _request)
            external payable returns (bytes32 canonicalTxHash);

        function requestL2TransactionTwoBridges(L2TransactionRequestTwoBridgesOuter calldata _request)
            external payable returns (bytes32 canonicalTxHash);

        function l2TransactionBaseCost(
            uint256 _chainId,
            uint256 _gasPrice,
            uint256 _l2GasLimit,
            uint256 _l2GasPerPubdataByteLimit
        ) external view returns (uint256);

        function baseToken(uint256 _chainId) external view returns (address);

        function sharedBridge() external view returns (address);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IL1SharedBridge {
        function finalizeWithdrawal(
            uint256 _chainId,
            uint256 _l2BatchNumber,
            uint256 _l2MessageIndex,
            uint16 _l2TxNumberInBatch,
            bytes calldata _message,
            bytes32[] calldata _merkleProof
        ) external;

        function isWithdrawalFinalized(
            uint256 _chainId,
            uint256 _l2BatchNumber,
            uint256 _l2MessageIndex
        ) external view returns (bool);

        function claimFailedDeposit(
            uint256 _chainId,
            address _depositSender,
            address _l1Token,
            uint256 _amount,
            bytes32 _l2TxHash,
            uint256 _l2BatchNumber,
            uint256 _l2MessageIndex,
            uint16 _l2TxNumberInBatch,
            bytes32[] calldata _merkleProof
        ) external;
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IL2SharedBridge {
        function withdraw(address _l1Receiver, address _l2Token, uint256 _amount) external;

        function finalizeDeposit(
            address _l1Sender,
            address _l2Receiver,
            address _l1Token,
            uint256 _amount,
            bytes calldata _data
        ) external payable;

        function l1SharedBridge() external view returns (address);

        function l2TokenAddress(address _l1Token) external view returns (address);

        function l1TokenAddress(address _l2Token) external view returns (address);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IL2BaseToken {
        function withdraw(address _l1Receiver) external payable;
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function transfer(address to, uint256 amount) external returns (bool);
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IZkSyncMainContract {
        struct L2CanonicalTransaction {
            uint256 txType;
            uint256 from;
            uint256 to;
            uint256 gasLimit;
            uint256 gasPerPubdataByteLimit;
            uint256 maxFeePerGas;
            uint256 maxPriorityFeePerGas;
            uint256 paymaster;
            uint256 nonce;
            uint256 value;
            uint256[4] reserved;
            bytes data;
            bytes signature;
            uint256[] factoryDeps;
            bytes paymasterInput;
            bytes reservedDynamic;
        }

        event NewPriorityRequest(
            uint256 txId,
            bytes32 txHash,
            uint64 expirationTimestamp,
            L2CanonicalTransaction transaction,
            bytes[] factoryDeps
        );
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IL1Messenger {
        event L1MessageSent(address indexed _sender, bytes32 indexed _hash, bytes _message);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IPaymasterFlow {
        function general(bytes input) external;
        function approvalBased(address _token, uint256 _minAllowance, bytes _innerInput) external;
    }
}
