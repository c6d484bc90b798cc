#![cfg_attr(rustfmt, rustfmt_skip)]
#![allow(unused_parens)]
#![allow(unused_imports)]
#![allow(missing_docs)]

use core::marker::PhantomData;
use polkadot_sdk::frame_support::{
  traits::Get,
  weights::{constants::RocksDbWeight, Weight},
};

pub trait WeightInfo {
  fn notify_subscribe() -> Weight;
  fn notify_unsubscribe() -> Weight;
  fn notify_modify_liquidity() -> Weight;
  fn notify_burn() -> Weight;
  fn reconcile() -> Weight;
}

pub struct SubstrateWeight<T>(PhantomData<T>);
impl<T: polkadot_sdk::frame_system::Config> WeightInfo for SubstrateWeight<T> {
  // Reads: TrackedPositions, manager owner/pool/liquidity, LiquidityBalances
  fn notify_subscribe() -> Weight {
    Weight::from_parts(18_000_000, 3600)
      .saturating_add(T::DbWeight::get().reads(5))
      .saturating_add(T::DbWeight::get().writes(2))
  }

  fn notify_unsubscribe() -> Weight {
    Weight::from_parts(16_000_000, 3600)
      .saturating_add(T::DbWeight::get().reads(3))
      .saturating_add(T::DbWeight::get().writes(2))
  }

  // Worst case is the re-sync path of an untracked position
  fn notify_modify_liquidity() -> Weight {
    Weight::from_parts(18_000_000, 3600)
      .saturating_add(T::DbWeight::get().reads(5))
      .saturating_add(T::DbWeight::get().writes(2))
  }

  fn notify_burn() -> Weight {
    Weight::from_parts(14_000_000, 3600)
      .saturating_add(T::DbWeight::get().reads(2))
      .saturating_add(T::DbWeight::get().writes(2))
  }

  fn reconcile() -> Weight {
    Weight::from_parts(22_000_000, 3600)
      .saturating_add(T::DbWeight::get().reads(7))
      .saturating_add(T::DbWeight::get().writes(3))
  }
}

impl WeightInfo for () {
  fn notify_subscribe() -> Weight {
    Weight::from_parts(18_000_000, 3600)
      .saturating_add(RocksDbWeight::get().reads(5))
      .saturating_add(RocksDbWeight::get().writes(2))
  }

  fn notify_unsubscribe() -> Weight {
    Weight::from_parts(16_000_000, 3600)
      .saturating_add(RocksDbWeight::get().reads(3))
      .saturating_add(RocksDbWeight::get().writes(2))
  }

  fn notify_modify_liquidity() -> Weight {
    Weight::from_parts(18_000_000, 3600)
      .saturating_add(RocksDbWeight::get().reads(5))
      .saturating_add(RocksDbWeight::get().writes(2))
  }

  fn notify_burn() -> Weight {
    Weight::from_parts(14_000_000, 3600)
      .saturating_add(RocksDbWeight::get().reads(2))
      .saturating_add(RocksDbWeight::get().writes(2))
  }

  fn reconcile() -> Weight {
    Weight::from_parts(22_000_000, 3600)
      .saturating_add(RocksDbWeight::get().reads(7))
      .saturating_add(RocksDbWeight::get().writes(3))
  }
}
