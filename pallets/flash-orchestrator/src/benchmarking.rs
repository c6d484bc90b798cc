#![cfg(feature = "runtime-benchmarks")]

extern crate alloc;

use crate::*;
use alloc::vec;
use codec::Encode;
use frame::prelude::*;
use polkadot_sdk::frame_benchmarking::v2::*;
use polkadot_sdk::frame_system::RawOrigin;

const AMOUNT: primitives::Balance = 100_000;

#[benchmarks]
mod benches {
  use super::*;

  #[benchmark]
  fn flash() {
    let caller: T::AccountId = whitelisted_caller();
    let asset = T::BenchmarkHelper::setup_flash_asset(AMOUNT);
    // Covers any pool fee up to the full principal
    T::BenchmarkHelper::fund(asset, &caller, AMOUNT);
    let user_data = BoundedVec::try_from(vec![0u8; T::MaxUserData::get() as usize])
      .unwrap_or_default();
    #[extrinsic_call]
    flash(RawOrigin::Signed(caller), asset, AMOUNT, user_data);
    assert!(ActiveOperation::<T>::get().is_none());
  }

  #[benchmark]
  fn execute_operation() {
    let caller: T::AccountId = whitelisted_caller();
    let asset = T::BenchmarkHelper::setup_flash_asset(AMOUNT);
    let this = Pallet::<T>::account_id();
    T::BenchmarkHelper::fund(asset, &this, AMOUNT);
    ActiveOperation::<T>::put(FlashOperation {
      id: 0,
      caller: caller.clone(),
      asset,
      amount: AMOUNT,
      fee: 0,
      phase: FlashPhase::AwaitingCallback,
    });
    let context = FlashContext::V1 {
      operation_id: 0,
      caller,
      user_data: vec![],
    }
    .encode();
    let context = BoundedVec::try_from(context).unwrap_or_default();
    #[extrinsic_call]
    execute_operation(
      RawOrigin::Signed(T::TrustedPool::get()),
      asset,
      AMOUNT,
      0,
      this,
      context,
    );
    assert_eq!(
      ActiveOperation::<T>::get().map(|op| op.phase),
      Some(FlashPhase::Settled)
    );
  }

  #[cfg(test)]
  use crate::mock::{Test, new_test_ext};
  #[cfg(test)]
  impl_benchmark_test_suite!(Pallet, new_test_ext(), Test);
}
