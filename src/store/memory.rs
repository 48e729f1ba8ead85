//! In-memory store.
//!
//! A test double for [`PgStore`](super::postgres::PgStore) that keeps the
//! same contract:
//!
//! - the same constraints, reported with the same names
//! - row locks: `add_account_balance` (and `create_account`) takes an async
//!   lock on the account row and holds it until commit or rollback, exactly
//!   like `UPDATE` does in Postgres, so a bad lock order really deadlocks
//! - isolation: writes are staged on the [`MemoryTx`] and only become visible
//!   to other units of work on commit
//! - ledger ids come from a counter that is never rolled back, like a sequence
//!
//! It also allows injecting `begin`/`commit` failures to exercise the
//! `Unavailable` paths.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, AtomicI64, Ordering},
    },
};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex as RowLock, OwnedMutexGuard};

use super::{AccountStore, Store, TransactionLogStore, UnitOfWork};
use crate::{
    error::{Constraint, StoreError},
    models::{
        account::{Account, CreateAccountParams, ListAccountsParams},
        transaction::{CreateTransactionParams, Transaction},
    },
};

/// Committed state shared by every unit of work.
#[derive(Default)]
struct State {
    accounts: BTreeMap<i64, Account>,
    transactions: BTreeMap<i64, Transaction>,
    row_locks: HashMap<i64, Arc<RowLock<()>>>,
}

struct Inner {
    state: Mutex<State>,
    next_transaction_id: AtomicI64,
    fail_next_begin: AtomicBool,
    fail_next_commit: AtomicBool,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// In-memory implementation of [`Store`].
///
/// Cloning is cheap and every clone sees the same data.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                next_transaction_id: AtomicI64::new(1),
                fail_next_begin: AtomicBool::new(false),
                fail_next_commit: AtomicBool::new(false),
            }),
        }
    }

    /// Make the next `begin` fail with `Unavailable`.
    pub fn fail_next_begin(&self) {
        self.inner.fail_next_begin.store(true, Ordering::SeqCst);
    }

    /// Make the next `commit` fail with `Unavailable`; its writes are discarded.
    pub fn fail_next_commit(&self) {
        self.inner.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Snapshot of every committed ledger record, ordered by id.
    pub fn committed_transactions(&self) -> Vec<Transaction> {
        self.inner.state().transactions.values().cloned().collect()
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx, StoreError> {
        if self.inner.fail_next_begin.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "could not begin transaction".to_string(),
            ));
        }

        Ok(MemoryTx {
            inner: Arc::clone(&self.inner),
            locks: HashMap::new(),
            balances: HashMap::new(),
            new_accounts: BTreeMap::new(),
            new_transactions: BTreeMap::new(),
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// One open unit of work against a [`MemoryStore`].
///
/// Dropping it releases every row lock and discards staged writes.
pub struct MemoryTx {
    inner: Arc<Inner>,
    locks: HashMap<i64, OwnedMutexGuard<()>>,
    /// Staged balances for rows locked by this unit of work.
    balances: HashMap<i64, i64>,
    new_accounts: BTreeMap<i64, Account>,
    new_transactions: BTreeMap<i64, Transaction>,
}

impl MemoryTx {
    /// Block until this unit of work holds the row lock for `id`.
    async fn lock_row(&mut self, id: i64) {
        if self.locks.contains_key(&id) {
            return;
        }

        let lock = {
            let mut state = self.inner.state();
            Arc::clone(state.row_locks.entry(id).or_default())
        };
        let guard = lock.lock_owned().await;
        self.locks.insert(id, guard);
    }

    /// Row as seen from inside this unit of work.
    fn visible_account(&self, id: i64) -> Option<Account> {
        let mut account = match self.new_accounts.get(&id) {
            Some(account) => account.clone(),
            None => self.inner.state().accounts.get(&id)?.clone(),
        };
        if let Some(balance) = self.balances.get(&id) {
            account.balance = *balance;
        }
        Some(account)
    }
}

#[async_trait]
impl AccountStore for MemoryTx {
    async fn create_account(&mut self, params: CreateAccountParams) -> Result<Account, StoreError> {
        if params.balance < 0 {
            return Err(StoreError::constraint(Constraint::NegativeBalance));
        }

        // A concurrent insert of the same id waits here until the first one
        // commits or rolls back, then sees the duplicate.
        self.lock_row(params.id).await;
        if self.visible_account(params.id).is_some() {
            return Err(StoreError::constraint(Constraint::DuplicateAccount));
        }

        let account = Account {
            id: params.id,
            currency: params.currency,
            balance: params.balance,
            created_at: Utc::now(),
        };
        self.new_accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn get_account(&mut self, id: i64) -> Result<Account, StoreError> {
        self.visible_account(id).ok_or(StoreError::NotFound)
    }

    async fn list_accounts(&mut self, params: ListAccountsParams) -> Result<Vec<Account>, StoreError> {
        if !params.is_valid() {
            return Err(StoreError::constraint(Constraint::InvalidPage));
        }

        let mut merged = self.inner.state().accounts.clone();
        merged.extend(
            self.new_accounts
                .iter()
                .map(|(id, account)| (*id, account.clone())),
        );

        let page = merged
            .into_values()
            .skip(params.offset as usize)
            .take(params.limit as usize)
            .map(|mut account| {
                if let Some(balance) = self.balances.get(&account.id) {
                    account.balance = *balance;
                }
                account
            })
            .collect();
        Ok(page)
    }

    async fn add_account_balance(&mut self, id: i64, delta: i64) -> Result<Account, StoreError> {
        if self.visible_account(id).is_none() {
            return Err(StoreError::NotFound);
        }

        self.lock_row(id).await;

        // Holding the row lock: nobody else can commit a change to this row now.
        let mut account = self.visible_account(id).ok_or(StoreError::NotFound)?;
        let balance = account.balance.checked_add(delta).ok_or_else(|| {
            StoreError::constraint(Constraint::Other("bigint out of range".to_string()))
        })?;
        if balance < 0 {
            return Err(StoreError::constraint(Constraint::NegativeBalance));
        }

        self.balances.insert(id, balance);
        account.balance = balance;
        Ok(account)
    }
}

#[async_trait]
impl TransactionLogStore for MemoryTx {
    async fn create_transaction(
        &mut self,
        params: CreateTransactionParams,
    ) -> Result<Transaction, StoreError> {
        if params.amount <= 0 {
            return Err(StoreError::constraint(Constraint::NonPositiveAmount));
        }
        if params.source_account_id == params.destination_account_id {
            return Err(StoreError::constraint(Constraint::SameAccount));
        }
        if self.visible_account(params.source_account_id).is_none()
            || self.visible_account(params.destination_account_id).is_none()
        {
            return Err(StoreError::NotFound);
        }

        let transaction = Transaction {
            id: self.inner.next_transaction_id.fetch_add(1, Ordering::SeqCst),
            source_account_id: params.source_account_id,
            destination_account_id: params.destination_account_id,
            amount: params.amount,
            created_at: Utc::now(),
        };
        self.new_transactions
            .insert(transaction.id, transaction.clone());
        Ok(transaction)
    }

    async fn get_transaction(&mut self, id: i64) -> Result<Transaction, StoreError> {
        if let Some(transaction) = self.new_transactions.get(&id) {
            return Ok(transaction.clone());
        }
        self.inner
            .state()
            .transactions
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl UnitOfWork for MemoryTx {
    async fn commit(mut self) -> Result<(), StoreError> {
        if self.inner.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "connection lost during commit".to_string(),
            ));
        }

        {
            let mut state = self.inner.state();
            state.accounts.append(&mut self.new_accounts);
            for (id, balance) in self.balances.drain() {
                if let Some(account) = state.accounts.get_mut(&id) {
                    account.balance = balance;
                }
            }
            state.transactions.append(&mut self.new_transactions);
        }

        // Row locks are released only after the writes are visible.
        self.locks.clear();
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        Ok(())
    }
}
