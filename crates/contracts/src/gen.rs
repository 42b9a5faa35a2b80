use ethers::contract::abigen;

abigen!(
    EntryPointAPI,
    r#"[
        struct UserOperation {address sender;uint256 nonce;bytes initCode;bytes callData;uint256 callGasLimit;uint256 verificationGasLimit;uint256 preVerificationGas;uint256 maxFeePerGas;uint256 maxPriorityFeePerGas;bytes paymasterAndData;bytes signature;}
        function getSenderAddress(bytes memory initCode) external
        function getUserOpHash(UserOperation calldata userOp) external view returns (bytes32)
        function getNonce(address sender, uint192 key) external view returns (uint256 nonce)
        error FailedOp(uint256 opIndex, string reason)
        error SenderAddressResult(address sender)
    ]"#
);

abigen!(
    SmartWalletAPI,
    r#"[
        struct Transaction {address to;uint256 value;bytes data;uint8 operation;uint256 targetTxGas;}
        struct FeeRefund {uint256 baseGas;uint256 gasPrice;uint256 tokenGasPriceFactor;address gasToken;address refundReceiver;}
        function execTransaction(Transaction memory transaction, uint256 batchId, FeeRefund memory refundInfo, bytes memory signatures) external payable returns (bool success)
        function execFromEntryPoint(address dest, uint256 value, bytes calldata func, uint8 operation, uint256 gasLimit) external returns (bool success)
        function getNonce(uint256 batchId) external view returns (uint256)
        function owner() external view returns (address)
    ]"#
);

abigen!(
    WalletFactoryAPI,
    r#"[
        function deployCounterFactualWallet(address owner, address entryPoint, address handler, uint256 index) external returns (address proxy)
        function getAddressForCounterfactualWallet(address owner, uint256 index) external view returns (address wallet)
        function isWalletExist(address wallet) external view returns (bool)
    ]"#
);

abigen!(
    MultiSendAPI,
    r#"[
        function multiSend(bytes memory transactions) external payable
    ]"#
);

abigen!(
    GasEstimatorAPI,
    r#"[
        function estimate(address to, bytes calldata data) external returns (bool success, bytes memory result, uint256 gas)
    ]"#
);

abigen!(
    TokenAPI,
    r#"[
        function transfer(address to, uint256 amount) external returns (bool)
        function balanceOf(address account) external view returns (uint256)
    ]"#
);
