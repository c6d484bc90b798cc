#![cfg(feature = "runtime-benchmarks")]

use crate::*;
use frame::prelude::*;
use polkadot_sdk::frame_benchmarking::v2::*;
use polkadot_sdk::frame_system::RawOrigin;

const POSITION: primitives::PositionId = 1;
const LIQUIDITY: primitives::Liquidity = 1_000_000;

#[benchmarks]
mod benches {
  use super::*;

  fn seed<T: Config>() -> T::AccountId {
    let owner: T::AccountId = whitelisted_caller();
    T::BenchmarkHelper::create_position(POSITION, &owner, LIQUIDITY);
    owner
  }

  fn seed_tracked<T: Config>() -> T::AccountId {
    let owner = seed::<T>();
    let manager = T::TrustedManager::get();
    assert!(Pallet::<T>::do_subscribe(&manager, POSITION).is_ok());
    owner
  }

  #[benchmark]
  fn notify_subscribe() {
    seed::<T>();
    #[extrinsic_call]
    notify_subscribe(RawOrigin::Signed(T::TrustedManager::get()), POSITION);
    assert!(TrackedPositions::<T>::contains_key(POSITION));
  }

  #[benchmark]
  fn notify_unsubscribe() {
    seed_tracked::<T>();
    #[extrinsic_call]
    notify_unsubscribe(RawOrigin::Signed(T::TrustedManager::get()), POSITION);
    assert!(!TrackedPositions::<T>::contains_key(POSITION));
  }

  #[benchmark]
  fn notify_modify_liquidity() {
    seed::<T>();
    #[extrinsic_call]
    notify_modify_liquidity(
      RawOrigin::Signed(T::TrustedManager::get()),
      POSITION,
      LIQUIDITY as i128,
    );
    assert!(TrackedPositions::<T>::contains_key(POSITION));
  }

  #[benchmark]
  fn notify_burn() {
    let owner = seed_tracked::<T>();
    #[extrinsic_call]
    notify_burn(
      RawOrigin::Signed(T::TrustedManager::get()),
      POSITION,
      owner,
      LIQUIDITY,
    );
    assert!(!TrackedPositions::<T>::contains_key(POSITION));
  }

  #[benchmark]
  fn reconcile() {
    let owner = seed_tracked::<T>();
    #[extrinsic_call]
    reconcile(RawOrigin::Signed(owner), POSITION);
  }

  #[cfg(test)]
  use crate::mock::{Test, new_test_ext};
  #[cfg(test)]
  impl_benchmark_test_suite!(Pallet, new_test_ext(), Test);
}
