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
  fn execute(n: u32) -> Weight;
  fn reposition() -> Weight;
  fn mint_position() -> Weight;
  fn increase_liquidity() -> Weight;
  fn decrease_liquidity() -> Weight;
  fn burn_position() -> Weight;
}

pub struct SubstrateWeight<T>(PhantomData<T>);
impl<T: polkadot_sdk::frame_system::Config> WeightInfo for SubstrateWeight<T> {
  // Reads: NextBatchId, next position id, one pool lookup per action
  // Writes: NextBatchId
  fn execute(n: u32) -> Weight {
    Weight::from_parts(40_000_000, 6000)
      .saturating_add(Weight::from_parts(9_000_000, 1200).saturating_mul(n.into()))
      .saturating_add(T::DbWeight::get().reads(2))
      .saturating_add(T::DbWeight::get().reads((1_u64).saturating_mul(n.into())))
      .saturating_add(T::DbWeight::get().writes(1))
  }

  // Ownership check plus a three-action batch
  fn reposition() -> Weight {
    Weight::from_parts(78_000_000, 9600)
      .saturating_add(T::DbWeight::get().reads(7))
      .saturating_add(T::DbWeight::get().writes(1))
  }

  fn mint_position() -> Weight {
    Weight::from_parts(66_000_000, 9600)
      .saturating_add(T::DbWeight::get().reads(2))
      .saturating_add(T::DbWeight::get().writes(1))
  }

  fn increase_liquidity() -> Weight {
    Weight::from_parts(64_000_000, 8400)
      .saturating_add(T::DbWeight::get().reads(6))
      .saturating_add(T::DbWeight::get().writes(1))
  }

  fn decrease_liquidity() -> Weight {
    Weight::from_parts(62_000_000, 8400)
      .saturating_add(T::DbWeight::get().reads(6))
      .saturating_add(T::DbWeight::get().writes(1))
  }

  fn burn_position() -> Weight {
    Weight::from_parts(60_000_000, 8400)
      .saturating_add(T::DbWeight::get().reads(6))
      .saturating_add(T::DbWeight::get().writes(1))
  }
}

impl WeightInfo for () {
  fn execute(n: u32) -> Weight {
    Weight::from_parts(40_000_000, 6000)
      .saturating_add(Weight::from_parts(9_000_000, 1200).saturating_mul(n.into()))
      .saturating_add(RocksDbWeight::get().reads(2))
      .saturating_add(RocksDbWeight::get().reads((1_u64).saturating_mul(n.into())))
      .saturating_add(RocksDbWeight::get().writes(1))
  }

  fn reposition() -> Weight {
    Weight::from_parts(78_000_000, 9600)
      .saturating_add(RocksDbWeight::get().reads(7))
      .saturating_add(RocksDbWeight::get().writes(1))
  }

  fn mint_position() -> Weight {
    Weight::from_parts(66_000_000, 9600)
      .saturating_add(RocksDbWeight::get().reads(2))
      .saturating_add(RocksDbWeight::get().writes(1))
  }

  fn increase_liquidity() -> Weight {
    Weight::from_parts(64_000_000, 8400)
      .saturating_add(RocksDbWeight::get().reads(6))
      .saturating_add(RocksDbWeight::get().writes(1))
  }

  fn decrease_liquidity() -> Weight {
    Weight::from_parts(62_000_000, 8400)
      .saturating_add(RocksDbWeight::get().reads(6))
      .saturating_add(RocksDbWeight::get().writes(1))
  }

  fn burn_position() -> Weight {
    Weight::from_parts(60_000_000, 8400)
      .saturating_add(RocksDbWeight::get().reads(6))
      .saturating_add(RocksDbWeight::get().writes(1))
  }
}
