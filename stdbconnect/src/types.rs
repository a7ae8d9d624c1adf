// The algebraic type system: every value on the wire is described by an
// `AlgebraicType` and carried at runtime by an `AlgebraicValue`.

mod algebraic_type;
mod algebraic_value;

pub use {
    algebraic_type::{AlgebraicType, Column},
    algebraic_value::{AlgebraicValue, Field},
};
