//! Priority queue for tracking account health (min-heap by health factor)

use caldera_engine::Address;
use priority_queue::PriorityQueue;
use std::cmp::Reverse;
use std::collections::HashMap;

/// Account health snapshot
#[derive(Debug, Clone)]
pub struct AccountHealth {
    /// Account identity
    pub account: Address,
    /// Health factor in 18-decimal fixed point
    pub health_factor: u128,
    /// Minted debt
    pub debt: u128,
    /// Collateral value in USD
    pub collateral_value: u128,
    /// Last update timestamp
    pub last_update: u64,
}

impl AccountHealth {
    /// Check if the account sits below the solvency floor
    pub fn needs_liquidation(&self, floor: u128) -> bool {
        self.health_factor < floor
    }
}

/// Health-based priority queue (min-heap: lowest health factor first)
pub struct HealthQueue {
    /// Priority queue (using Reverse for min-heap)
    queue: PriorityQueue<Address, Reverse<u128>>,
    /// Map for O(1) lookups
    map: HashMap<Address, AccountHealth>,
}

impl HealthQueue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self {
            queue: PriorityQueue::new(),
            map: HashMap::new(),
        }
    }

    /// Push or update account health
    pub fn push(&mut self, health: AccountHealth) {
        let account = health.account;
        let factor = health.health_factor;

        self.map.insert(account, health);
        self.queue.push(account, Reverse(factor));
    }

    /// Pop the account with the lowest health factor
    pub fn pop(&mut self) -> Option<AccountHealth> {
        let (account, _priority) = self.queue.pop()?;
        self.map.remove(&account)
    }

    /// Peek at the account with the lowest health factor without removing
    pub fn peek(&self) -> Option<&AccountHealth> {
        let (account, _priority) = self.queue.peek()?;
        self.map.get(account)
    }

    /// Remove an account from the queue
    pub fn remove(&mut self, account: &Address) -> Option<AccountHealth> {
        self.queue.remove(account);
        self.map.remove(account)
    }

    /// Get account health by identity
    pub fn get(&self, account: &Address) -> Option<&AccountHealth> {
        self.map.get(account)
    }

    /// Check if queue contains an account
    pub fn contains(&self, account: &Address) -> bool {
        self.map.contains_key(account)
    }

    /// Number of accounts in the queue
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if queue is empty
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// All accounts below the solvency floor, worst first
    pub fn get_liquidatable(&self, floor: u128) -> Vec<AccountHealth> {
        let mut below: Vec<AccountHealth> = self
            .map
            .values()
            .filter(|h| h.needs_liquidation(floor))
            .cloned()
            .collect();
        below.sort_by_key(|h| h.health_factor);
        below
    }

    /// Clear all entries
    pub fn clear(&mut self) {
        self.queue.clear();
        self.map.clear();
    }
}

impl Default for HealthQueue {
    fn default() -> Self {
        Self::new()
    }
}
