//! Minimal ERC-20 ABI surface: the three calls payments and balances need.

use crate::ProviderError;
use alloy_primitives::{Address, U256};
use alloy_sol_types::{sol, SolCall};

sol! {
    interface IERC20 {
        function decimals() external view returns (uint8);
        function balanceOf(address owner) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
    }
}

pub fn decimals_calldata() -> Vec<u8> {
    IERC20::decimalsCall {}.abi_encode()
}

pub fn balance_of_calldata(owner: Address) -> Vec<u8> {
    IERC20::balanceOfCall { owner }.abi_encode()
}

pub fn transfer_calldata(to: Address, amount: U256) -> Vec<u8> {
    IERC20::transferCall { to, amount }.abi_encode()
}

pub fn decode_decimals(data: &[u8]) -> Result<u8, ProviderError> {
    IERC20::decimalsCall::abi_decode_returns(data, true)
        .map(|r| r._0)
        .map_err(|e| ProviderError::Decode(format!("decimals(): {e}")))
}

pub fn decode_balance(data: &[u8]) -> Result<U256, ProviderError> {
    IERC20::balanceOfCall::abi_decode_returns(data, true)
        .map(|r| r._0)
        .map_err(|e| ProviderError::Decode(format!("balanceOf(): {e}")))
}
