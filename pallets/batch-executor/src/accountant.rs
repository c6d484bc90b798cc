//! Pre-flight settlement accounting over an ordered action list.
//!
//! Positions minted earlier in the same batch do not exist yet when the batch is checked,
//! so the accountant assigns them the ids the processor will hand out, starting at
//! `next_position_id`, and resolves later references against that local map first.

use crate::actions::{Action, ActionParams, BatchError};
use alloc::{collections::btree_map::BTreeMap, collections::btree_set::BTreeSet, vec::Vec};
use primitives::{AssetInspector, AssetKind, Balance, PoolKey, PositionId};

/// Signed per-asset deltas from the initiator's point of view
pub type DeltaMap = BTreeMap<AssetKind, i128>;

pub struct SettlementAccountant<F> {
  resolve: F,
  next_position_id: PositionId,
}

impl<F> SettlementAccountant<F>
where
  F: Fn(PositionId) -> Option<PoolKey>,
{
  pub fn new(next_position_id: PositionId, resolve: F) -> Self {
    Self {
      resolve,
      next_position_id,
    }
  }

  /// Pool of every non-settlement action, `None` for settlement actions.
  fn resolve_pools<AccountId>(
    &self,
    actions: &[Action<AccountId>],
  ) -> Result<Vec<Option<PoolKey>>, BatchError> {
    let mut minted: BTreeMap<PositionId, PoolKey> = BTreeMap::new();
    let mut next_id = self.next_position_id;
    actions
      .iter()
      .map(|action| {
        if action.kind.is_settlement() {
          return Ok(None);
        }
        if let Some(pool) = action.params.pool() {
          minted.insert(next_id, pool);
          next_id = next_id.checked_add(1).ok_or(BatchError::InvalidParameters)?;
          return Ok(Some(pool));
        }
        let position = action.params.position().ok_or(BatchError::InvalidParameters)?;
        minted
          .get(&position)
          .copied()
          .or_else(|| (self.resolve)(position))
          .map(Some)
          .ok_or(BatchError::UnknownPosition)
      })
      .collect()
  }

  /// True iff every currency a non-settlement action touches is closed by a later
  /// settlement action. An unresolvable position makes the batch unclosed.
  pub fn validate_closed<AccountId>(&self, actions: &[Action<AccountId>]) -> bool {
    match self.resolve_pools(actions) {
      Ok(pools) => Self::closed(actions, &pools),
      Err(_) => false,
    }
  }

  /// Like [`Self::validate_closed`] but reports why a batch is rejected.
  pub fn ensure_closed<AccountId>(&self, actions: &[Action<AccountId>]) -> Result<(), BatchError> {
    let pools = self.resolve_pools(actions)?;
    if Self::closed(actions, &pools) {
      Ok(())
    } else {
      Err(BatchError::UnsettledCurrency)
    }
  }

  /// Forwarded native value must be swept or closed after the last action that uses native.
  pub fn ensure_native_returned<AccountId>(
    &self,
    actions: &[Action<AccountId>],
    native_value: Balance,
  ) -> Result<(), BatchError> {
    if native_value == 0 {
      return Ok(());
    }
    let pools = self.resolve_pools(actions)?;
    for (action, pool) in actions.iter().zip(pools.iter()).rev() {
      match (&action.params, pool) {
        (
          ActionParams::Sweep { currency, .. } | ActionParams::CloseCurrency { currency },
          _,
        ) if currency.is_native() => return Ok(()),
        (_, Some(pool)) if pool.currencies().iter().any(|c| c.is_native()) => {
          return Err(BatchError::UnsettledCurrency);
        }
        (params, None) if params.settled_currencies().iter().any(|c| c.is_native()) => {
          return Err(BatchError::UnsettledCurrency);
        }
        _ => {}
      }
    }
    Err(BatchError::UnsettledCurrency)
  }

  fn closed<AccountId>(actions: &[Action<AccountId>], pools: &[Option<PoolKey>]) -> bool {
    let mut settled: BTreeSet<AssetKind> = BTreeSet::new();
    for (action, pool) in actions.iter().zip(pools.iter()).rev() {
      match pool {
        None => settled.extend(action.params.settled_currencies()),
        Some(pool) => {
          if !pool.currencies().iter().all(|c| settled.contains(c)) {
            return false;
          }
        }
      }
    }
    true
  }

  /// Worst-case bound per asset: spends count at their maximum, receipts at their minimum.
  ///
  /// Settlement actions only move already-open balances, so they add nothing.
  pub fn predict_deltas<AccountId>(
    &self,
    actions: &[Action<AccountId>],
  ) -> Result<DeltaMap, BatchError> {
    let pools = self.resolve_pools(actions)?;
    let mut deltas = DeltaMap::new();
    for (action, pool) in actions.iter().zip(pools.into_iter()) {
      let Some(pool) = pool else {
        for currency in action.params.settled_currencies() {
          deltas.entry(currency).or_insert(0);
        }
        continue;
      };
      let (amount0, amount1, outflow) = match &action.params {
        ActionParams::MintPosition {
          amount0_max,
          amount1_max,
          ..
        }
        | ActionParams::MintFromDeltas {
          amount0_max,
          amount1_max,
          ..
        }
        | ActionParams::IncreaseLiquidity {
          amount0_max,
          amount1_max,
          ..
        } => (*amount0_max, *amount1_max, true),
        ActionParams::DecreaseLiquidity {
          amount0_min,
          amount1_min,
          ..
        }
        | ActionParams::BurnPosition {
          amount0_min,
          amount1_min,
          ..
        } => (*amount0_min, *amount1_min, false),
        _ => return Err(BatchError::InvalidParameters),
      };
      add_delta(&mut deltas, pool.currency0, amount0, outflow)?;
      add_delta(&mut deltas, pool.currency1, amount1, outflow)?;
    }
    Ok(deltas)
  }
}

fn add_delta(
  deltas: &mut DeltaMap,
  currency: AssetKind,
  amount: Balance,
  outflow: bool,
) -> Result<(), BatchError> {
  let amount = i128::try_from(amount).map_err(|_| BatchError::InvalidParameters)?;
  let entry = deltas.entry(currency).or_insert(0);
  *entry = if outflow {
    entry.checked_sub(amount)
  } else {
    entry.checked_add(amount)
  }
  .ok_or(BatchError::InvalidParameters)?;
  Ok(())
}

/// Every realized delta must be at least its predicted bound. Assets missing on either side
/// count as zero.
pub fn reconcile(predicted: &DeltaMap, realized: &[(AssetKind, i128)]) -> Result<(), BatchError> {
  let realized: DeltaMap = realized.iter().copied().collect();
  let below_bound = predicted
    .iter()
    .any(|(asset, bound)| realized.get(asset).copied().unwrap_or(0) < *bound)
    || realized
      .iter()
      .any(|(asset, delta)| *delta < predicted.get(asset).copied().unwrap_or(0));
  if below_bound {
    Err(BatchError::InconsistentState)
  } else {
    Ok(())
  }
}
