use alloc::vec::Vec;
use codec::{Decode, Encode};
use polkadot_sdk::sp_runtime::DispatchError;
use primitives::{AssetKind, Balance, PositionId, PositionInspect};
use scale_info::TypeInfo;

/// What the processor reports back after running a batch
#[derive(Clone, Debug, Decode, Default, Encode, Eq, PartialEq, TypeInfo)]
pub struct BatchReceipt {
  /// Net per-asset flow to the initiator, positive when the initiator received funds
  pub deltas: Vec<(AssetKind, i128)>,
  /// Positions created by the batch, in mint order
  pub minted: Vec<PositionId>,
}

/// External position manager that executes encoded batches.
///
/// The manager is untrusted: everything it reports is re-checked by the caller.
pub trait BatchProcessor<AccountId, BlockNumber>: PositionInspect<AccountId> {
  /// Id the next minted position will receive
  fn next_position_id() -> PositionId;

  fn execute_batch(
    who: &AccountId,
    encoded_actions: Vec<u8>,
    native_value: Balance,
    deadline: BlockNumber,
  ) -> Result<BatchReceipt, DispatchError>;
}
