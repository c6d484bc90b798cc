//! Concentrated-liquidity position primitives.
//!
//! Positions are owned by an external position manager. The pallets in this workspace
//! only ever observe them through [`PositionInspect`].

use crate::{AssetKind, params::{MAX_TICK, MIN_TICK}};
use codec::{Decode, DecodeWithMemTracking, Encode, MaxEncodedLen};
use scale_info::TypeInfo;
use sp_arithmetic::Permill;

/// Identifier the external manager assigns to a position
pub type PositionId = u64;

/// Liquidity units held by a position
pub type Liquidity = u128;

/// Identity of a concentrated-liquidity pool.
///
/// `currency0` must sort strictly before `currency1`.
#[derive(
  Clone,
  Copy,
  Debug,
  Decode,
  DecodeWithMemTracking,
  Encode,
  Eq,
  MaxEncodedLen,
  Ord,
  PartialEq,
  PartialOrd,
  TypeInfo,
)]
pub struct PoolKey {
  pub currency0: AssetKind,
  pub currency1: AssetKind,
  pub fee: Permill,
  pub tick_spacing: i32,
}

impl PoolKey {
  pub fn new(currency_a: AssetKind, currency_b: AssetKind, fee: Permill, tick_spacing: i32) -> Self {
    let (currency0, currency1) = if currency_a <= currency_b {
      (currency_a, currency_b)
    } else {
      (currency_b, currency_a)
    };
    Self {
      currency0,
      currency1,
      fee,
      tick_spacing,
    }
  }

  pub fn is_valid(&self) -> bool {
    self.currency0 < self.currency1 && self.tick_spacing > 0
  }

  pub fn currencies(&self) -> [AssetKind; 2] {
    [self.currency0, self.currency1]
  }
}

/// Tick range of a position inside its pool
#[derive(
  Clone,
  Copy,
  Debug,
  Decode,
  DecodeWithMemTracking,
  Encode,
  Eq,
  MaxEncodedLen,
  PartialEq,
  TypeInfo,
)]
pub struct PositionInfo {
  pub tick_lower: i32,
  pub tick_upper: i32,
}

impl PositionInfo {
  /// Ordered, inside the global tick bounds and aligned to the pool's spacing.
  pub fn is_valid_for(&self, tick_spacing: i32) -> bool {
    if tick_spacing <= 0 {
      return false;
    }
    self.tick_lower < self.tick_upper
      && self.tick_lower >= MIN_TICK
      && self.tick_upper <= MAX_TICK
      && self.tick_lower % tick_spacing == 0
      && self.tick_upper % tick_spacing == 0
  }
}

/// Read-only view of the external position manager.
///
/// Every query returns `None` once the position no longer exists.
pub trait PositionInspect<AccountId> {
  fn owner_of(id: PositionId) -> Option<AccountId>;

  fn pool_and_position(id: PositionId) -> Option<(PoolKey, PositionInfo)>;

  fn position_liquidity(id: PositionId) -> Option<Liquidity>;

  /// Account registered to receive lifecycle notifications for `id`, if any.
  fn subscriber_of(id: PositionId) -> Option<AccountId>;
}

/// No-op `PositionInspect` for configurations without a position manager.
impl<AccountId> PositionInspect<AccountId> for () {
  fn owner_of(_: PositionId) -> Option<AccountId> {
    None
  }

  fn pool_and_position(_: PositionId) -> Option<(PoolKey, PositionInfo)> {
    None
  }

  fn position_liquidity(_: PositionId) -> Option<Liquidity> {
    None
  }

  fn subscriber_of(_: PositionId) -> Option<AccountId> {
    None
  }
}
