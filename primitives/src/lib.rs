#![cfg_attr(not(feature = "std"), no_std)]

pub mod assets;
pub mod ecosystem;
pub mod guard;
pub mod position;

pub use assets::*;
pub use ecosystem::*;
pub use guard::*;
pub use position::*;
