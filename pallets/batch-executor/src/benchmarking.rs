#![cfg(feature = "runtime-benchmarks")]

use crate::*;
use alloc::vec::Vec;
use frame::prelude::*;
use polkadot_sdk::frame_benchmarking::v2::*;
use polkadot_sdk::frame_system::RawOrigin;
use primitives::{Balance, Liquidity, PositionInfo, PositionInspect};

const LIQUIDITY: Liquidity = 1_000_000;
const BUDGET: Balance = 10_000_000;

#[benchmarks]
mod benches {
  use super::*;

  fn deadline<T: Config>() -> BlockNumberFor<T> {
    frame_system::Pallet::<T>::block_number()
  }

  fn owner_with_position<T: Config>() -> (T::AccountId, primitives::PositionId) {
    let owner: T::AccountId = whitelisted_caller();
    T::BenchmarkHelper::fund(&owner, BUDGET);
    let id = T::BenchmarkHelper::create_position(&owner, LIQUIDITY);
    (owner, id)
  }

  #[benchmark]
  fn execute(n: Linear<2, { T::MaxActions::get() }>) {
    let (owner, id) = owner_with_position::<T>();
    let pool = T::BenchmarkHelper::pool();
    let mut actions: Vec<Action<T::AccountId>> = (1..n)
      .map(|_| Action {
        kind: ActionKind::DecreaseLiquidity,
        params: ActionParams::DecreaseLiquidity {
          position: id,
          liquidity: 1,
          amount0_min: 0,
          amount1_min: 0,
        },
      })
      .collect();
    actions.push(Action {
      kind: ActionKind::TakePair,
      params: ActionParams::TakePair {
        currency0: pool.currency0,
        currency1: pool.currency1,
        recipient: owner.clone(),
      },
    });
    let actions: BoundedVec<_, T::MaxActions> =
      actions.try_into().expect("n is bounded by MaxActions");

    #[extrinsic_call]
    execute(RawOrigin::Signed(owner), actions, deadline::<T>(), 0);

    assert_eq!(NextBatchId::<T>::get(), 1);
  }

  #[benchmark]
  fn reposition() {
    let (owner, id) = owner_with_position::<T>();
    let spacing = T::BenchmarkHelper::pool().tick_spacing;

    #[extrinsic_call]
    reposition(
      RawOrigin::Signed(owner),
      id,
      -spacing,
      spacing,
      (0, 0),
      (LIQUIDITY, LIQUIDITY),
      deadline::<T>(),
    );

    assert!(T::Processor::owner_of(id).is_none());
  }

  #[benchmark]
  fn mint_position() {
    let owner: T::AccountId = whitelisted_caller();
    T::BenchmarkHelper::fund(&owner, BUDGET);
    let pool = T::BenchmarkHelper::pool();
    let range = PositionInfo {
      tick_lower: -pool.tick_spacing,
      tick_upper: pool.tick_spacing,
    };

    #[extrinsic_call]
    mint_position(
      RawOrigin::Signed(owner),
      pool,
      range.tick_lower,
      range.tick_upper,
      LIQUIDITY,
      (LIQUIDITY, LIQUIDITY),
      deadline::<T>(),
      0,
    );

    assert_eq!(NextBatchId::<T>::get(), 1);
  }

  #[benchmark]
  fn increase_liquidity() {
    let (owner, id) = owner_with_position::<T>();

    #[extrinsic_call]
    increase_liquidity(
      RawOrigin::Signed(owner),
      id,
      LIQUIDITY,
      (LIQUIDITY, LIQUIDITY),
      deadline::<T>(),
      0,
    );

    assert_eq!(T::Processor::position_liquidity(id), Some(LIQUIDITY * 2));
  }

  #[benchmark]
  fn decrease_liquidity() {
    let (owner, id) = owner_with_position::<T>();

    #[extrinsic_call]
    decrease_liquidity(
      RawOrigin::Signed(owner),
      id,
      LIQUIDITY / 2,
      (0, 0),
      deadline::<T>(),
    );

    assert_eq!(T::Processor::position_liquidity(id), Some(LIQUIDITY / 2));
  }

  #[benchmark]
  fn burn_position() {
    let (owner, id) = owner_with_position::<T>();

    #[extrinsic_call]
    burn_position(RawOrigin::Signed(owner), id, (0, 0), deadline::<T>());

    assert!(T::Processor::owner_of(id).is_none());
  }

  impl_benchmark_test_suite!(Pallet, crate::mock::new_test_ext(), crate::mock::Test);
}
