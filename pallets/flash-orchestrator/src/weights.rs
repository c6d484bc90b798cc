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
  fn flash() -> Weight;
  fn execute_operation() -> Weight;
}

// `flash` covers the nested pool callback; pool and receiver costs are charged by the
// runtime's own configuration on top.
pub struct SubstrateWeight<T>(PhantomData<T>);
impl<T: polkadot_sdk::frame_system::Config> WeightInfo for SubstrateWeight<T> {
  fn flash() -> Weight {
    Weight::from_parts(95_000_000, 9000)
      .saturating_add(T::DbWeight::get().reads(10))
      .saturating_add(T::DbWeight::get().writes(9))
  }

  fn execute_operation() -> Weight {
    Weight::from_parts(55_000_000, 6000)
      .saturating_add(T::DbWeight::get().reads(6))
      .saturating_add(T::DbWeight::get().writes(5))
  }
}

impl WeightInfo for () {
  fn flash() -> Weight {
    Weight::from_parts(95_000_000, 9000)
      .saturating_add(RocksDbWeight::get().reads(10))
      .saturating_add(RocksDbWeight::get().writes(9))
  }

  fn execute_operation() -> Weight {
    Weight::from_parts(55_000_000, 6000)
      .saturating_add(RocksDbWeight::get().reads(6))
      .saturating_add(RocksDbWeight::get().writes(5))
  }
}
