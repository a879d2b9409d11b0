#![allow(clippy::all)]

use ethers::prelude::abigen;

abigen!(
    SimpleAccountAPI,
    r#"[
        struct Call { address target; uint256 value; bytes data; }
        function execute(address target, uint256 value, bytes data)
        function executeBatch(Call[] calls)
    ]"#
);

abigen!(
    AccountFactoryAPI,
    r#"[
        function createAccount(address owner, uint256 salt) returns (address)
        function getAddress(address owner, uint256 salt) view returns (address)
    ]"#
);
