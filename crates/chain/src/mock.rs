use super::{AddChainParams, ProviderError, TokenContract, TokenReader, TxReceipt, WalletProvider};
use crate::rpc::parse_quantity;
use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

const DEFAULT_DECIMALS: u8 = 18;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockTransfer {
    pub token: Address,
    pub from: Address,
    pub to: Address,
    pub amount: U256,
    pub tx_hash: B256,
}

#[derive(Debug, Default)]
struct MockState {
    account: Option<Address>,
    chain_id: u64,
    known_chains: HashSet<u64>,
    balances: HashMap<(Address, Address), U256>,
    decimals: HashMap<Address, u8>,
    reject_switch: bool,
    reject_transfers: bool,
    revert_transfers: bool,
    fail_reads: bool,
    requests: Vec<String>,
    transfers: Vec<MockTransfer>,
}

/// In-memory wallet and chain. Balances move when transfers are submitted and
/// every transaction confirms on the first receipt poll.
#[derive(Debug, Clone, Default)]
pub struct MockWallet {
    state: Arc<Mutex<MockState>>,
}

impl MockWallet {
    /// Wallet sitting on `chain_id`, with no account connected.
    pub fn new(chain_id: u64) -> Self {
        let state = MockState {
            chain_id,
            known_chains: HashSet::from([chain_id]),
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread must not hide the state from the others.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn with_account(self, account: Address) -> Self {
        self.state().account = Some(account);
        self
    }

    pub fn with_known_chain(self, chain_id: u64) -> Self {
        self.state().known_chains.insert(chain_id);
        self
    }

    pub fn with_balance(self, token: Address, owner: Address, amount: U256) -> Self {
        self.state().balances.insert((token, owner), amount);
        self
    }

    pub fn with_decimals(self, token: Address, decimals: u8) -> Self {
        self.state().decimals.insert(token, decimals);
        self
    }

    pub fn rejecting_switch(self) -> Self {
        self.state().reject_switch = true;
        self
    }

    pub fn rejecting_transfers(self) -> Self {
        self.state().reject_transfers = true;
        self
    }

    pub fn reverting_transfers(self) -> Self {
        self.state().revert_transfers = true;
        self
    }

    pub fn failing_reads(self) -> Self {
        self.state().fail_reads = true;
        self
    }

    /// Names of the wallet requests received so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.state().requests.clone()
    }

    pub fn transfers(&self) -> Vec<MockTransfer> {
        self.state().transfers.clone()
    }

    pub fn current_chain(&self) -> u64 {
        self.state().chain_id
    }

    pub fn balance(&self, token: Address, owner: Address) -> U256 {
        self.state()
            .balances
            .get(&(token, owner))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    fn record(&self, request: &str) {
        self.state().requests.push(request.to_string());
    }

    fn read_decimals(&self, token: Address) -> Result<u8, ProviderError> {
        let st = self.state();
        if st.fail_reads {
            return Err(ProviderError::Transport("mock read failure".to_string()));
        }
        Ok(st.decimals.get(&token).copied().unwrap_or(DEFAULT_DECIMALS))
    }

    fn read_balance(&self, token: Address, owner: Address) -> Result<U256, ProviderError> {
        if self.state().fail_reads {
            return Err(ProviderError::Transport("mock read failure".to_string()));
        }
        Ok(self.balance(token, owner))
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn account(&self) -> Result<Option<Address>, ProviderError> {
        self.record("eth_accounts");
        Ok(self.state().account)
    }

    async fn chain_id(&self) -> Result<u64, ProviderError> {
        self.record("eth_chainId");
        Ok(self.state().chain_id)
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderError> {
        self.record("wallet_switchEthereumChain");
        let mut st = self.state();
        if st.reject_switch {
            return Err(ProviderError::UserRejected);
        }
        if !st.known_chains.contains(&chain_id) {
            return Err(ProviderError::UnrecognizedChain(chain_id));
        }
        st.chain_id = chain_id;
        Ok(())
    }

    async fn add_chain(&self, params: &AddChainParams) -> Result<(), ProviderError> {
        self.record("wallet_addEthereumChain");
        let chain_id = parse_quantity(&params.chain_id)?;
        self.state().known_chains.insert(chain_id);
        Ok(())
    }

    fn token(&self, address: Address, signer: Address) -> Arc<dyn TokenContract> {
        Arc::new(MockToken {
            wallet: self.clone(),
            address,
            signer,
        })
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TxReceipt, ProviderError> {
        self.record("eth_getTransactionReceipt");
        let st = self.state();
        if !st.transfers.iter().any(|t| t.tx_hash == tx_hash) {
            return Err(ProviderError::Rpc {
                code: -32000,
                message: format!("unknown transaction {tx_hash}"),
            });
        }
        Ok(TxReceipt {
            tx_hash,
            block_number: Some(st.transfers.len() as u64),
            success: !st.revert_transfers,
        })
    }
}

#[async_trait]
impl TokenReader for MockWallet {
    async fn decimals(&self, token: Address) -> Result<u8, ProviderError> {
        self.read_decimals(token)
    }

    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256, ProviderError> {
        self.read_balance(token, owner)
    }
}

pub struct MockToken {
    wallet: MockWallet,
    address: Address,
    signer: Address,
}

#[async_trait]
impl TokenContract for MockToken {
    fn address(&self) -> Address {
        self.address
    }

    async fn decimals(&self) -> Result<u8, ProviderError> {
        self.wallet.record("eth_call:decimals");
        self.wallet.read_decimals(self.address)
    }

    async fn balance_of(&self, owner: Address) -> Result<U256, ProviderError> {
        self.wallet.record("eth_call:balanceOf");
        self.wallet.read_balance(self.address, owner)
    }

    async fn transfer(&self, to: Address, amount: U256) -> Result<B256, ProviderError> {
        self.wallet.record("eth_sendTransaction");
        let mut st = self.wallet.state();
        if st.reject_transfers {
            return Err(ProviderError::UserRejected);
        }
        let from_key = (self.address, self.signer);
        let available = st.balances.get(&from_key).copied().unwrap_or(U256::ZERO);
        if available < amount {
            return Err(ProviderError::Rpc {
                code: -32000,
                message: "execution reverted: transfer amount exceeds balance".to_string(),
            });
        }
        let tx_hash = B256::from(rand::random::<[u8; 32]>());
        if !st.revert_transfers {
            st.balances.insert(from_key, available - amount);
            *st.balances.entry((self.address, to)).or_insert(U256::ZERO) += amount;
        }
        st.transfers.push(MockTransfer {
            token: self.address,
            from: self.signer,
            to,
            amount,
            tx_hash,
        });
        Ok(tx_hash)
    }
}
