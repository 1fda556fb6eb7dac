//! Usage: `use supercomp::prelude::*;`

pub use crate::operations::*;
pub use crate::{Context, KeySet, Parameters, SuperFixed, SuperInt};

pub use crate::impls as supercomp_impls;
